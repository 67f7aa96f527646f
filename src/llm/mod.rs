// ABOUTME: LLM provider abstraction for pluggable food-recognition backends
// ABOUTME: Defines the completion contract shared by the Gemini and Groq providers
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Morsel Project

//! # LLM Provider Service Provider Interface
//!
//! The contract recognition backends implement to plug into the recognition
//! gateway. Providers are selected per request by capability: photo requests
//! need [`LlmCapabilities::VISION`], text-only requests go to whichever
//! provider is configured as primary.
//!
//! ## Key Concepts
//!
//! - **`LlmCapabilities`**: bitflags describing provider features
//! - **`LlmProvider`**: async trait for a single-turn completion
//! - **`CompletionRequest`**: prompt plus an optional inline image

mod gemini;
mod groq;

pub use gemini::GeminiProvider;
pub use groq::GroqProvider;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::errors::AppResult;

bitflags::bitflags! {
    /// LLM provider capability flags
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct LlmCapabilities: u8 {
        /// Provider accepts inline image input
        const VISION = 0b0000_0001;
        /// Provider supports a strict JSON output mode
        const JSON_MODE = 0b0000_0010;
    }
}

impl LlmCapabilities {
    /// Capabilities of a text-only provider with JSON output
    #[must_use]
    pub const fn text_json() -> Self {
        Self::JSON_MODE
    }

    /// Capabilities of a vision-capable provider
    #[must_use]
    pub const fn vision_json() -> Self {
        Self::VISION.union(Self::JSON_MODE)
    }

    /// Check if image input is supported
    #[must_use]
    pub const fn supports_vision(&self) -> bool {
        self.contains(Self::VISION)
    }
}

/// An image attached inline to a completion request
#[derive(Debug, Clone)]
pub struct InlineImage {
    /// MIME type of the encoded image
    pub mime_type: String,
    /// Raw image bytes; providers encode as their API requires
    pub data: Bytes,
}

impl InlineImage {
    /// Create a JPEG inline image (the shape chat photo downloads arrive in)
    #[must_use]
    pub fn jpeg(data: Bytes) -> Self {
        Self {
            mime_type: "image/jpeg".to_string(),
            data,
        }
    }
}

/// A single-turn completion request
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Prompt text
    pub prompt: String,
    /// Optional inline image for vision-capable providers
    pub image: Option<InlineImage>,
    /// Temperature for response randomness
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    /// Create a new text-only request
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Attach an inline image
    #[must_use]
    pub fn with_image(mut self, image: InlineImage) -> Self {
        self.image = Some(image);
        self
    }

    /// Set the temperature
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum tokens
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Response from a completion
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Generated text content
    pub content: String,
    /// Model used for generation
    pub model: String,
}

/// LLM provider trait for single-turn completion
///
/// Implement this trait to add a new recognition backend. The design
/// follows the async trait pattern for compatibility with the tokio
/// runtime.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Unique provider identifier (e.g., "gemini", "groq")
    fn name(&self) -> &'static str;

    /// Human-readable display name
    fn display_name(&self) -> &'static str;

    /// Provider capabilities
    fn capabilities(&self) -> LlmCapabilities;

    /// Default model used when none is configured
    fn default_model(&self) -> &str;

    /// Perform a completion
    async fn complete(&self, request: &CompletionRequest) -> AppResult<CompletionResponse>;
}
