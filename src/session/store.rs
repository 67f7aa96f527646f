// ABOUTME: Sharded concurrent session store with one async lock per user
// ABOUTME: Guarantees at-most-one in-flight state transition per user
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Morsel Project

//! # Session Store
//!
//! In-memory map of `UserId -> Session`, surviving across messages but not
//! across process restarts. The map is sharded so lookups for different
//! users never contend, and each session sits behind its own
//! [`tokio::sync::Mutex`]: holding that lock for the duration of one event
//! serializes transitions per user while leaving other users fully
//! concurrent.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::models::{Session, UserId};

/// Concurrent per-user session map
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<UserId, Arc<Mutex<Session>>>,
}

impl SessionStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The session slot for a user, created lazily at idle on first access
    #[must_use]
    pub fn entry(&self, user: UserId) -> Arc<Mutex<Session>> {
        self.sessions
            .entry(user)
            .or_insert_with(|| Arc::new(Mutex::new(Session::new())))
            .clone()
    }

    /// Number of users with a session slot
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no user has a session slot yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
