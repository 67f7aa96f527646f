// ABOUTME: Application constants organized by domain
// ABOUTME: Daily nutrition target defaults, chat tokens, and service identifiers
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Morsel Project

//! Application constants, grouped by domain.

/// Service identifiers
pub mod service {
    /// Service name used in logs
    pub const NAME: &str = "morsel-bot";
}

/// Default daily nutrition targets (overridable via environment)
pub mod targets {
    /// Daily kilocalorie target
    pub const CALORIES: f64 = 3300.0;
    /// Daily protein target in grams
    pub const PROTEIN: f64 = 175.0;
    /// Daily fat target in grams
    pub const FAT: f64 = 95.0;
    /// Daily carbohydrate target in grams
    pub const CARBS: f64 = 435.0;
}

/// Chat-level tokens and defaults
pub mod chat {
    /// Case-insensitive token accepting the estimated quantity as-is
    pub const CONFIRM_TOKEN: &str = "ok";
    /// Bare phrase treated as a day reset, kept from the original deployment
    pub const RESET_PHRASE: &str = "first meal";
    /// Long-poll timeout for update fetching, in seconds
    pub const POLL_TIMEOUT_SECS: u64 = 30;
}

/// Timing defaults (all overridable via environment)
pub mod timeouts {
    /// Bounded timeout for a single recognition/composition provider call
    pub const PROVIDER_SECS: u64 = 30;
    /// Idle interval after which an abandoned session resets (0 disables)
    pub const SESSION_IDLE_SECS: u64 = 1800;
}
