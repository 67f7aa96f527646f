// ABOUTME: Chat gateway boundary: outbound reply delivery and photo fetching
// ABOUTME: Defines the transport trait implemented by the Telegram client
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Morsel Project

//! # Chat Gateway
//!
//! The transport boundary. The state machine and dispatcher talk to the
//! messaging service exclusively through [`ChatGateway`], so tests can
//! substitute a mock and the transport can change without touching the
//! core. The concrete implementation is the Telegram Bot API client in
//! [`telegram`].

pub mod telegram;

pub use telegram::TelegramClient;

use async_trait::async_trait;
use bytes::Bytes;

use crate::errors::AppResult;
use crate::models::{PhotoRef, Reply};

/// Outbound chat transport surface
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Deliver one reply to its user
    ///
    /// # Errors
    ///
    /// Returns a transport error on delivery failure; fatal to this reply
    /// only and never retried by the core.
    async fn send_reply(&self, reply: &Reply) -> AppResult<()>;

    /// Resolve an opaque photo handle into image bytes
    ///
    /// # Errors
    ///
    /// Returns a transport error when the photo cannot be downloaded.
    async fn fetch_photo(&self, photo: &PhotoRef) -> AppResult<Bytes>;
}
