// ABOUTME: Logging configuration and structured logging setup for observability
// ABOUTME: Configures log levels and output formats from environment variables
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Morsel Project

//! Structured logging setup with environment-driven configuration.
//!
//! - `RUST_LOG` selects the filter (default `morsel=info`)
//! - `LOG_FORMAT` selects the output format: `json`, `compact`, or `pretty`

use crate::errors::{AppError, AppResult};
use std::env;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON format for production logging
    Json,
    /// Compact format for space-constrained environments
    Compact,
    /// Pretty format for development
    Pretty,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax)
    pub filter: String,
    /// Output format
    pub format: LogFormat,
}

impl LoggingConfig {
    /// Create logging configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let filter = env::var("RUST_LOG").unwrap_or_else(|_| "morsel=info".into());
        let format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") => LogFormat::Compact,
            _ => LogFormat::Pretty,
        };
        Self { filter, format }
    }

    /// Install the global tracing subscriber for this configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the filter directive cannot be parsed or a global
    /// subscriber is already installed.
    pub fn init(&self) -> AppResult<()> {
        let filter = EnvFilter::try_new(&self.filter)
            .map_err(|e| AppError::config(format!("invalid RUST_LOG directive: {e}")))?;

        let registry = tracing_subscriber::registry().with(filter);
        let result = match self.format {
            LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
            LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
            LogFormat::Pretty => registry.with(fmt::layer()).try_init(),
        };
        result.map_err(|e| AppError::internal(format!("failed to install subscriber: {e}")))
    }
}

/// Initialize logging from environment variables
///
/// # Errors
///
/// Returns an error if subscriber installation fails.
pub fn init_from_env() -> AppResult<()> {
    LoggingConfig::from_env().init()
}
