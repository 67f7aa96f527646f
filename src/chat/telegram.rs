// ABOUTME: Telegram Bot API client: long polling, message sending, photo download
// ABOUTME: Implements the chat gateway trait over HTTPS with reqwest
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Morsel Project

//! # Telegram Client
//!
//! Minimal Telegram Bot API client covering what the assistant needs:
//! `getUpdates` long polling, `sendMessage`, and `getFile` plus the file
//! download endpoint for photo bytes. Photo handles are the `file_id` of
//! the largest [`PhotoSize`] Telegram attaches to a message.
//!
//! # API Reference
//! Telegram Bot API: <https://core.telegram.org/bots/api>

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use async_trait::async_trait;

use crate::constants::chat::POLL_TIMEOUT_SECS;
use crate::errors::{AppError, AppResult};
use crate::models::{PhotoRef, Reply};

use super::ChatGateway;

/// Base URL for the Telegram Bot API
const API_BASE_URL: &str = "https://api.telegram.org";

// ============================================================================
// API Types
// ============================================================================

/// Envelope every Bot API response arrives in
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// One update from `getUpdates`
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    /// Monotonic update identifier, used as the polling offset
    pub update_id: i64,
    /// The message, when the update carries one
    pub message: Option<Message>,
}

/// An inbound chat message
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    /// Originating chat
    pub chat: Chat,
    /// Text content, when present
    pub text: Option<String>,
    /// Photo variants in ascending size order, when present
    pub photo: Option<Vec<PhotoSize>>,
    /// Caption accompanying a photo, when present
    pub caption: Option<String>,
}

/// Chat descriptor; the id doubles as the stable user identifier
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    /// Stable chat identifier
    pub id: i64,
}

/// One resolution variant of an uploaded photo
#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSize {
    /// Opaque file handle for downloads
    pub file_id: String,
    /// Encoded size in bytes, when Telegram reports it
    pub file_size: Option<i64>,
}

/// `getFile` result
#[derive(Debug, Deserialize)]
struct FileInfo {
    file_path: Option<String>,
}

/// `sendMessage` request body
#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

/// `getUpdates` request body
#[derive(Debug, Serialize)]
struct GetUpdates {
    offset: i64,
    timeout: u64,
}

// ============================================================================
// Client
// ============================================================================

/// Telegram Bot API client
pub struct TelegramClient {
    token: String,
    client: reqwest::Client,
}

impl TelegramClient {
    /// Create a client for a bot token
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Build the API URL for a Bot API method
    fn method_url(&self, method: &str) -> String {
        format!("{API_BASE_URL}/bot{}/{method}", self.token)
    }

    /// Unwrap the Bot API envelope or surface its error description
    fn unwrap_response<T>(response: ApiResponse<T>, method: &str) -> AppResult<T> {
        if !response.ok {
            return Err(AppError::transport(format!(
                "{method} rejected: {}",
                response.description.unwrap_or_else(|| "no description".to_owned())
            )));
        }
        response
            .result
            .ok_or_else(|| AppError::transport(format!("{method} returned an empty result")))
    }

    /// Long-poll for the next batch of updates after `offset`
    ///
    /// # Errors
    ///
    /// Returns a transport error on connection or protocol failure.
    #[instrument(skip(self))]
    pub async fn poll_updates(&self, offset: i64) -> AppResult<Vec<Update>> {
        let response = self
            .client
            .post(self.method_url("getUpdates"))
            .json(&GetUpdates {
                offset,
                timeout: POLL_TIMEOUT_SECS,
            })
            .send()
            .await
            .map_err(|e| AppError::transport(format!("getUpdates failed: {e}")))?
            .json::<ApiResponse<Vec<Update>>>()
            .await
            .map_err(|e| AppError::transport(format!("getUpdates unparseable: {e}")))?;

        let updates = Self::unwrap_response(response, "getUpdates")?;
        if !updates.is_empty() {
            debug!(count = updates.len(), "Received updates");
        }
        Ok(updates)
    }
}

#[async_trait]
impl ChatGateway for TelegramClient {
    #[instrument(skip(self, reply), fields(user = %reply.user))]
    async fn send_reply(&self, reply: &Reply) -> AppResult<()> {
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&SendMessage {
                chat_id: reply.user.0,
                text: &reply.text,
            })
            .send()
            .await
            .map_err(|e| AppError::transport(format!("sendMessage failed: {e}")))?
            .json::<ApiResponse<serde_json::Value>>()
            .await
            .map_err(|e| AppError::transport(format!("sendMessage unparseable: {e}")))?;

        Self::unwrap_response(response, "sendMessage").map(|_| ())
    }

    #[instrument(skip(self, photo))]
    async fn fetch_photo(&self, photo: &PhotoRef) -> AppResult<Bytes> {
        let response = self
            .client
            .get(self.method_url("getFile"))
            .query(&[("file_id", photo.as_str())])
            .send()
            .await
            .map_err(|e| AppError::transport(format!("getFile failed: {e}")))?
            .json::<ApiResponse<FileInfo>>()
            .await
            .map_err(|e| AppError::transport(format!("getFile unparseable: {e}")))?;

        let file_path = Self::unwrap_response(response, "getFile")?
            .file_path
            .ok_or_else(|| AppError::transport("getFile returned no file path"))?;

        let bytes = self
            .client
            .get(format!(
                "{API_BASE_URL}/file/bot{}/{file_path}",
                self.token
            ))
            .send()
            .await
            .map_err(|e| AppError::transport(format!("photo download failed: {e}")))?
            .bytes()
            .await
            .map_err(|e| AppError::transport(format!("photo download truncated: {e}")))?;

        debug!(bytes = bytes.len(), "Photo downloaded");
        Ok(bytes)
    }
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}
