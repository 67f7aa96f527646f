// ABOUTME: Main library entry point for the Morsel food-logging assistant
// ABOUTME: Wires chat events through the session machine into the nutrition ledger
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Morsel Project

#![deny(unsafe_code)]

//! # Morsel
//!
//! A conversational food-logging assistant: users send a text description
//! or a photo of a meal, an external recognition provider identifies the
//! food and its nutrition, and per-user, per-day totals accumulate against
//! fixed daily targets in a persistent ledger.
//!
//! ## Architecture
//!
//! - **`chat`**: the transport boundary (Telegram Bot API client)
//! - **`dispatcher`**: routes inbound updates to the state machine
//! - **`session`**: per-user conversational state and the state machine
//! - **`recognition`**: one normalization boundary over the LLM providers
//!   and the composition provider
//! - **`llm`**: Gemini (vision) and Groq (text, JSON mode) providers
//! - **`external`**: USDA FoodData Central composition client
//! - **`ledger`**: durable per-user, per-day totals with windowed averages
//!
//! Events flow chat → dispatcher → state machine (session store,
//! recognition gateway, nutrition ledger) → reply → chat. Each user's
//! events are serialized behind a per-user lock; distinct users are handled
//! concurrently.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use morsel::config::BotConfig;
//! use morsel::errors::AppResult;
//!
//! fn main() -> AppResult<()> {
//!     // Configuration is environment-only; see config::environment
//!     let config = BotConfig::from_env()?;
//!     println!("{}", config.summary());
//!     Ok(())
//! }
//! ```

pub mod chat;
pub mod config;
pub mod constants;
pub mod dispatcher;
pub mod errors;
pub mod external;
pub mod ledger;
pub mod llm;
pub mod logging;
pub mod models;
pub mod recognition;
pub mod session;
