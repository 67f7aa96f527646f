// ABOUTME: Groq LLM provider implementation using the OpenAI-compatible API
// ABOUTME: Drives text-only food recognition with strict JSON response mode
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Morsel Project

//! # Groq Provider
//!
//! Implementation of the [`LlmProvider`] trait for Groq's LPU-accelerated
//! inference. Text-only; recognition requests run with the OpenAI-style
//! `json_object` response format so the normalization boundary receives
//! machine-readable output.
//!
//! ## Configuration
//!
//! Set the `GROQ_API_KEY` environment variable with your API key from
//! Groq Console: <https://console.groq.com/keys>

use std::env;
use std::fmt::{Debug, Formatter, Result as FmtResult};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::{CompletionRequest, CompletionResponse, LlmCapabilities, LlmProvider};
use crate::errors::{AppError, AppResult};

/// Environment variable for Groq API key
const GROQ_API_KEY_ENV: &str = "GROQ_API_KEY";

/// Default model to use
const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Base URL for the Groq API (OpenAI-compatible)
const API_BASE_URL: &str = "https://api.groq.com/openai/v1";

// ============================================================================
// API Request/Response Types (OpenAI-compatible format)
// ============================================================================

/// Groq API request structure
#[derive(Debug, Serialize)]
struct GroqRequest {
    model: String,
    messages: Vec<GroqMessage>,
    response_format: ResponseFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// Message structure for the Groq API
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GroqMessage {
    role: String,
    content: String,
}

/// Response format selector (JSON mode)
#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

/// Groq API response structure
#[derive(Debug, Deserialize)]
struct GroqResponse {
    choices: Vec<GroqChoice>,
    model: String,
}

/// Choice in a Groq response
#[derive(Debug, Deserialize)]
struct GroqChoice {
    message: GroqResponseMessage,
}

/// Message in a Groq response
#[derive(Debug, Deserialize)]
struct GroqResponseMessage {
    content: Option<String>,
}

/// Groq API error response
#[derive(Debug, Deserialize)]
struct GroqErrorResponse {
    error: GroqErrorDetail,
}

/// Error detail structure
#[derive(Debug, Deserialize)]
struct GroqErrorDetail {
    message: String,
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Groq LLM provider using LPU-accelerated inference
pub struct GroqProvider {
    client: Client,
    api_key: String,
    default_model: String,
}

impl GroqProvider {
    /// Create a new Groq provider with the given API key
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            default_model: DEFAULT_MODEL.to_owned(),
        }
    }

    /// Create a Groq provider from the `GROQ_API_KEY` environment variable
    ///
    /// # Errors
    ///
    /// Returns an error if `GROQ_API_KEY` is not set.
    pub fn from_env() -> AppResult<Self> {
        let api_key = env::var(GROQ_API_KEY_ENV).map_err(|_| {
            AppError::config(format!("{GROQ_API_KEY_ENV} environment variable not set"))
        })?;
        Ok(Self::new(api_key))
    }

    /// Map an API error status to an appropriate error type
    fn map_api_error(status: u16, response_text: &str) -> AppError {
        let message = serde_json::from_str::<GroqErrorResponse>(response_text)
            .map_or_else(|_| response_text.to_owned(), |e| e.error.message);
        AppError::external_service("Groq", format!("HTTP {status}: {message}"))
    }
}

#[async_trait]
impl LlmProvider for GroqProvider {
    fn name(&self) -> &'static str {
        "groq"
    }

    fn display_name(&self) -> &'static str {
        "Groq"
    }

    fn capabilities(&self) -> LlmCapabilities {
        LlmCapabilities::text_json()
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    #[instrument(skip(self, request))]
    async fn complete(&self, request: &CompletionRequest) -> AppResult<CompletionResponse> {
        if request.image.is_some() {
            return Err(AppError::invalid_input(
                "Groq provider does not accept image input",
            ));
        }

        let groq_request = GroqRequest {
            model: self.default_model.clone(),
            messages: vec![GroqMessage {
                role: "user".to_owned(),
                content: request.prompt.clone(),
            }],
            response_format: ResponseFormat {
                format_type: "json_object",
            },
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        debug!("Sending request to Groq API");

        let response = self
            .client
            .post(format!("{API_BASE_URL}/chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&groq_request)
            .send()
            .await
            .map_err(|e| AppError::external_service("Groq", format!("HTTP request failed: {e}")))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| AppError::external_service("Groq", format!("failed to read response: {e}")))?;

        if !status.is_success() {
            error!(status = %status, "Groq API error");
            return Err(Self::map_api_error(status.as_u16(), &response_text));
        }

        let groq_response: GroqResponse = serde_json::from_str(&response_text).map_err(|e| {
            error!(error = %e, "Failed to parse Groq response");
            AppError::external_service("Groq", format!("unparseable response: {e}"))
        })?;

        let content = groq_response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| AppError::external_service("Groq", "no content in response"))?;

        debug!("Successfully received Groq response");

        Ok(CompletionResponse {
            content,
            model: groq_response.model,
        })
    }
}

impl Debug for GroqProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("GroqProvider")
            .field("default_model", &self.default_model)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}
