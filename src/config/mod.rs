// ABOUTME: Configuration module for environment-driven process settings
// ABOUTME: Re-exports the environment-based configuration types
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Morsel Project

//! Configuration management. All configuration is environment-only; there
//! are no CLI flags beyond credential/environment settings.

pub mod environment;

pub use environment::{BotConfig, LlmConfig, LlmProviderType, UsdaConfig};
