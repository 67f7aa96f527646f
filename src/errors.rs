// ABOUTME: Unified error handling with error codes for the food-logging assistant
// ABOUTME: Classifies recognition, transport, persistence, and configuration failures
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Morsel Project

//! # Unified Error Handling
//!
//! Centralized error types for the Morsel assistant. Every fallible
//! operation returns [`AppError`], tagged with an [`ErrorCode`] that
//! determines how the failure is handled: recognition failures recover
//! locally in the session, transport failures are fatal to a single reply,
//! persistence failures roll back the in-memory ledger update, and
//! configuration failures are fatal at startup only.
//!
//! User-visible failures are always a short corrective chat message via
//! [`AppError::user_message`], never a stack trace or a raw provider payload.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Recognition (1000-1999)
    #[serde(rename = "RECOGNITION_FAILED")]
    RecognitionFailed = 1000,
    #[serde(rename = "RECOGNITION_TIMEOUT")]
    RecognitionTimeout = 1001,
    #[serde(rename = "NOT_FOOD")]
    NotFood = 1002,

    // Chat transport (2000-2999)
    #[serde(rename = "TRANSPORT_ERROR")]
    TransportError = 2000,

    // Persistence (3000-3999)
    #[serde(rename = "PERSISTENCE_ERROR")]
    PersistenceError = 3000,

    // Configuration (4000-4999)
    #[serde(rename = "CONFIG_MISSING")]
    ConfigMissing = 4000,
    #[serde(rename = "CONFIG_INVALID")]
    ConfigInvalid = 4001,

    // Validation (5000-5999)
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput = 5000,

    // External services (6000-6999)
    #[serde(rename = "EXTERNAL_SERVICE_ERROR")]
    ExternalServiceError = 6000,

    // Internal (9000-9999)
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9000,
}

impl ErrorCode {
    /// Get a short description of this error code
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::RecognitionFailed => "Food recognition failed",
            Self::RecognitionTimeout => "Food recognition timed out",
            Self::NotFood => "The input does not describe food",
            Self::TransportError => "Chat message delivery failed",
            Self::PersistenceError => "Ledger persistence failed",
            Self::ConfigMissing => "Required configuration is missing",
            Self::ConfigInvalid => "Configuration is invalid",
            Self::InvalidInput => "The provided input is invalid",
            Self::ExternalServiceError => "An external service encountered an error",
            Self::InternalError => "An internal error occurred",
        }
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message (for logs, not for chat)
    pub message: String,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new error with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Attach a source error for chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Recognition failure: unparseable or unusable provider output
    pub fn recognition(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RecognitionFailed, message)
    }

    /// Recognition failure: provider call exceeded its bounded timeout
    pub fn recognition_timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RecognitionTimeout, message)
    }

    /// Recognition failure: provider flagged the input as not food
    pub fn not_food(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFood, message)
    }

    /// Chat transport failure (delivery, photo download)
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::TransportError, message)
    }

    /// Ledger persistence failure
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PersistenceError, message)
    }

    /// Configuration error: a required setting is absent
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigMissing, message)
    }

    /// Configuration error: a setting is present but unusable
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigInvalid, message)
    }

    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// External service error
    pub fn external_service(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ExternalServiceError,
            format!("{}: {}", service.into(), message.into()),
        )
    }

    /// Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Whether this error classifies as a recognition failure the session
    /// recovers from locally (timeouts and unreachable providers included)
    #[must_use]
    pub const fn is_recognition_failure(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::RecognitionFailed
                | ErrorCode::RecognitionTimeout
                | ErrorCode::NotFood
                | ErrorCode::ExternalServiceError
        )
    }

    /// Whether this error is a persistence failure
    #[must_use]
    pub const fn is_persistence_failure(&self) -> bool {
        matches!(self.code, ErrorCode::PersistenceError)
    }

    /// Short corrective message suitable for a chat reply
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self.code {
            ErrorCode::RecognitionFailed
            | ErrorCode::NotFood
            | ErrorCode::ExternalServiceError => {
                "🤔 I couldn't recognize that as food. Try rephrasing."
            }
            ErrorCode::RecognitionTimeout => {
                "⏳ The food recognition service took too long. Please try again."
            }
            ErrorCode::PersistenceError => "⚠️ Could not save your entry. Please try again.",
            ErrorCode::TransportError
            | ErrorCode::ConfigMissing
            | ErrorCode::ConfigInvalid
            | ErrorCode::InvalidInput
            | ErrorCode::InternalError => "Something went wrong. Please try again.",
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
