// ABOUTME: Core domain types for users, nutrition totals, food estimates, and sessions
// ABOUTME: Shared data structures used by the ledger, recognition gateway, and state machine
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Morsel Project

//! # Domain Models
//!
//! Common data structures shared across the Morsel components:
//!
//! - [`UserId`] / [`PhotoRef`]: opaque identifiers supplied by the chat gateway
//! - [`DayTotals`]: accumulated nutrients for one user on one calendar date
//! - [`MacroProfile`]: per-100 g composition used for quantity scaling
//! - [`FoodEstimate`]: normalized recognition result
//! - [`Session`] / [`SessionState`]: live conversational state for one user
//! - [`InboundEvent`] / [`Reply`]: the chat gateway boundary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Atwater general factors: kcal per gram of protein, fat, and carbohydrate.
/// Used to derive per-100 g calories when a provider supplies macros only.
const KCAL_PER_G_PROTEIN: f64 = 4.0;
const KCAL_PER_G_FAT: f64 = 9.0;
const KCAL_PER_G_CARBS: f64 = 4.0;

// ============================================================================
// Identifiers
// ============================================================================

/// Opaque stable user identifier supplied by the chat gateway.
///
/// Primary key for both the session store and the nutrition ledger.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle to an uploaded photo, resolvable only by the chat gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoRef(pub String);

impl PhotoRef {
    /// The raw handle string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Nutrition
// ============================================================================

/// Accumulated nutrient totals for one user on one calendar date.
///
/// All components are non-negative. An absent `(user, date)` ledger entry is
/// equivalent to [`DayTotals::default`] for every reader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DayTotals {
    /// Kilocalories
    pub calories: f64,
    /// Protein in grams
    pub protein: f64,
    /// Fat in grams
    pub fat: f64,
    /// Carbohydrates in grams
    pub carbs: f64,
}

impl DayTotals {
    /// Component-wise addition of a delta
    pub fn add(&mut self, delta: &Self) {
        self.calories += delta.calories;
        self.protein += delta.protein;
        self.fat += delta.fat;
        self.carbs += delta.carbs;
    }

    /// Component-wise division by a positive count (for windowed averages)
    #[must_use]
    pub fn divided_by(&self, count: f64) -> Self {
        Self {
            calories: self.calories / count,
            protein: self.protein / count,
            fat: self.fat / count,
            carbs: self.carbs / count,
        }
    }
}

/// Per-100 g nutrient composition of a food, as returned by the
/// composition provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacroProfile {
    /// Kilocalories per 100 g
    pub calories: f64,
    /// Protein grams per 100 g
    pub protein: f64,
    /// Fat grams per 100 g
    pub fat: f64,
    /// Carbohydrate grams per 100 g
    pub carbs: f64,
}

impl MacroProfile {
    /// Scale this per-100 g profile to a concrete gram quantity
    #[must_use]
    pub fn scaled(&self, grams: f64) -> DayTotals {
        let factor = grams / 100.0;
        DayTotals {
            calories: self.calories * factor,
            protein: self.protein * factor,
            fat: self.fat * factor,
            carbs: self.carbs * factor,
        }
    }
}

/// Normalized food recognition result.
///
/// Produced exclusively by the recognition gateway's normalization boundary;
/// a provider response lacking a parseable name or calorie value never
/// becomes a `FoodEstimate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodEstimate {
    /// Identified food name (non-empty)
    pub name: String,
    /// Estimated calories for the described portion
    pub calories: f64,
    /// Protein grams per 100 g, when the provider supplied it
    pub protein_per_100g: Option<f64>,
    /// Fat grams per 100 g, when the provider supplied it
    pub fat_per_100g: Option<f64>,
    /// Carbohydrate grams per 100 g, when the provider supplied it
    pub carbs_per_100g: Option<f64>,
    /// Estimated portion size in grams, when the provider supplied it
    pub estimated_grams: Option<f64>,
}

impl FoodEstimate {
    /// Build a per-100 g profile from the estimate's own macro fields.
    ///
    /// Calories per 100 g are derived with Atwater factors since providers
    /// report a portion calorie figure, not a per-100 g one. Returns `None`
    /// when the estimate carries no macro information at all.
    #[must_use]
    pub fn macro_profile(&self) -> Option<MacroProfile> {
        if self.protein_per_100g.is_none()
            && self.fat_per_100g.is_none()
            && self.carbs_per_100g.is_none()
        {
            return None;
        }
        let protein = self.protein_per_100g.unwrap_or(0.0);
        let fat = self.fat_per_100g.unwrap_or(0.0);
        let carbs = self.carbs_per_100g.unwrap_or(0.0);
        Some(MacroProfile {
            calories: protein * KCAL_PER_G_PROTEIN
                + fat * KCAL_PER_G_FAT
                + carbs * KCAL_PER_G_CARBS,
            protein,
            fat,
            carbs,
        })
    }

    /// Totals to apply when the estimate is logged directly, without a
    /// quantity confirmation round (the text-only path).
    ///
    /// Calories come from the provider's portion estimate; macros are only
    /// filled in when both per-100 g values and a gram figure are available.
    #[must_use]
    pub fn direct_totals(&self) -> DayTotals {
        let mut totals = DayTotals {
            calories: self.calories,
            ..DayTotals::default()
        };
        if let (Some(profile), Some(grams)) = (self.macro_profile(), self.estimated_grams) {
            let scaled = profile.scaled(grams);
            totals.protein = scaled.protein;
            totals.fat = scaled.fat;
            totals.carbs = scaled.carbs;
        }
        totals
    }
}

/// Configurable daily nutrition targets shown alongside running totals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyTargets {
    /// Daily kilocalorie target
    pub calories: f64,
    /// Daily protein target in grams
    pub protein: f64,
    /// Daily fat target in grams
    pub fat: f64,
    /// Daily carbohydrate target in grams
    pub carbs: f64,
}

// ============================================================================
// Session
// ============================================================================

/// Conversational state of one user's session.
///
/// Pending data lives inside the state variant, so a pending estimate
/// without a matching state cannot exist.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// No exchange in progress
    Idle,
    /// A photo was received; waiting for the user to describe it
    AwaitingDescription {
        /// The pending photo, preserved across failed description attempts
        photo: PhotoRef,
    },
    /// A food was identified; waiting for quantity confirmation
    AwaitingQuantity {
        /// The pending recognition result
        estimate: FoodEstimate,
        /// Per-100 g composition for gram scaling, when available
        composition: Option<MacroProfile>,
    },
}

/// Live session for one user, owned by the session store and mutated only
/// by the state machine.
#[derive(Debug, Clone)]
pub struct Session {
    /// Current conversational state
    pub state: SessionState,
    /// Timestamp of the last event handled for this user
    pub touched_at: DateTime<Utc>,
}

impl Session {
    /// Create a fresh idle session
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            touched_at: Utc::now(),
        }
    }

    /// Reset to idle, discarding any pending data
    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.touched_at = Utc::now();
    }

    /// Record that an event was handled now
    pub fn touch(&mut self) {
        self.touched_at = Utc::now();
    }

    /// Whether the session has been idle longer than `timeout`
    #[must_use]
    pub fn is_stale(&self, timeout: Duration) -> bool {
        let elapsed = Utc::now().signed_duration_since(self.touched_at);
        elapsed.to_std().map_or(false, |e| e > timeout)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Chat boundary
// ============================================================================

/// One inbound chat event, as delivered by the chat gateway
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// The user sent a photo
    Photo {
        /// Sending user
        user: UserId,
        /// Opaque photo handle
        photo: PhotoRef,
    },
    /// The user sent free text
    Text {
        /// Sending user
        user: UserId,
        /// Message text
        text: String,
    },
    /// The user asked to reset today's totals
    Reset {
        /// Sending user
        user: UserId,
    },
    /// The user asked for the weekly summary
    Summary {
        /// Sending user
        user: UserId,
    },
}

impl InboundEvent {
    /// The user this event belongs to
    #[must_use]
    pub const fn user(&self) -> UserId {
        match self {
            Self::Photo { user, .. }
            | Self::Text { user, .. }
            | Self::Reset { user }
            | Self::Summary { user } => *user,
        }
    }
}

/// One outbound chat reply
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// Receiving user
    pub user: UserId,
    /// Reply text
    pub text: String,
}
