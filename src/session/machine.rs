// ABOUTME: Per-user session state machine turning chat events into ledger updates
// ABOUTME: Coordinates photo receipt, description capture, and quantity confirmation
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Morsel Project

//! # Session State Machine
//!
//! Consumes one inbound event for a user, reads and updates that user's
//! session, optionally calls the recognition gateway, optionally writes the
//! nutrition ledger, and produces the outbound reply.
//!
//! Transitions per user (one event at a time, serialized by the session
//! lock; distinct users run concurrently):
//!
//! - `Idle` + photo → `AwaitingDescription`, ask for a description
//! - `Idle` + text → recognize directly, log immediately, stay `Idle`
//! - `AwaitingDescription` + text → recognize `(text, photo)`; success moves
//!   to `AwaitingQuantity`, failure stays put with the photo preserved so a
//!   single garbled description never discards an upload
//! - `AwaitingQuantity` + "ok"/empty or a positive gram figure → scale,
//!   write the ledger, reply with running totals, back to `Idle`; anything
//!   else prompts for a usable quantity and stays put
//! - A new photo in any state overwrites pending data (newest photo wins)
//! - Reset in any state zeroes today's totals *and* clears pending session
//!   data, so a stale confirmation can never apply after a reset
//!
//! Recognition failures never touch the ledger; persistence failures leave
//! the session as it was so the user can simply resend.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, instrument, warn};

use crate::chat::ChatGateway;
use crate::constants::chat::CONFIRM_TOKEN;
use crate::ledger::NutritionLedger;
use crate::llm::InlineImage;
use crate::models::{
    DailyTargets, DayTotals, FoodEstimate, InboundEvent, MacroProfile, PhotoRef, Reply, Session,
    SessionState, UserId,
};
use crate::recognition::Recognizer;
use crate::session::{replies, store::SessionStore};

/// The session state machine and its collaborators
pub struct SessionMachine {
    sessions: SessionStore,
    ledger: Arc<NutritionLedger>,
    recognizer: Arc<dyn Recognizer>,
    chat: Arc<dyn ChatGateway>,
    targets: DailyTargets,
    idle_timeout: Option<Duration>,
}

impl SessionMachine {
    /// Create the machine over its collaborators
    #[must_use]
    pub fn new(
        ledger: Arc<NutritionLedger>,
        recognizer: Arc<dyn Recognizer>,
        chat: Arc<dyn ChatGateway>,
        targets: DailyTargets,
        idle_timeout: Option<Duration>,
    ) -> Self {
        Self {
            sessions: SessionStore::new(),
            ledger,
            recognizer,
            chat,
            targets,
            idle_timeout,
        }
    }

    /// Handle one inbound event and produce the reply.
    ///
    /// Holds the user's session lock for the whole transition, including
    /// any outbound provider calls, so two concurrent messages from the
    /// same user can never race on the session or the day's totals.
    #[instrument(skip(self, event), fields(user = %event.user()))]
    pub async fn handle(&self, event: InboundEvent) -> Reply {
        let user = event.user();
        let slot = self.sessions.entry(user);
        let mut session = slot.lock().await;

        if let Some(timeout) = self.idle_timeout {
            if session.state != SessionState::Idle && session.is_stale(timeout) {
                debug!("Expiring stale session back to idle");
                session.reset();
            }
        }

        let text = match event {
            InboundEvent::Photo { photo, .. } => Self::on_photo(&mut session, photo),
            InboundEvent::Text { text, .. } => self.on_text(&mut session, user, &text).await,
            InboundEvent::Reset { .. } => self.on_reset(&mut session, user).await,
            InboundEvent::Summary { .. } => self.on_summary(user),
        };
        session.touch();

        Reply { user, text }
    }

    /// A new photo always wins over any pending exchange
    fn on_photo(session: &mut Session, photo: PhotoRef) -> String {
        if session.state != SessionState::Idle {
            debug!("Replacing pending exchange with a newer photo");
        }
        session.state = SessionState::AwaitingDescription { photo };
        replies::PHOTO_RECEIVED.to_owned()
    }

    /// Reset clears today's totals and any pending session data
    async fn on_reset(&self, session: &mut Session, user: UserId) -> String {
        session.reset();
        match self.ledger.reset_day(user, today()).await {
            Ok(()) => replies::DAY_RESET.to_owned(),
            Err(e) => {
                warn!(error = %e, "Failed to persist day reset");
                e.user_message().to_owned()
            }
        }
    }

    /// Weekly summary; reads only, never disturbs the session
    fn on_summary(&self, user: UserId) -> String {
        self.ledger
            .windowed_average(user, today(), 7)
            .map_or_else(|| replies::NO_DATA_YET.to_owned(), |avg| replies::weekly_summary(&avg))
    }

    /// Route a text event by the current session state
    async fn on_text(&self, session: &mut Session, user: UserId, text: &str) -> String {
        match session.state.clone() {
            SessionState::Idle => self.log_text_directly(user, text).await,
            SessionState::AwaitingDescription { photo } => {
                self.on_description(session, user, text, &photo).await
            }
            SessionState::AwaitingQuantity {
                estimate,
                composition,
            } => {
                self.on_quantity(session, user, text, &estimate, composition)
                    .await
            }
        }
    }

    /// Idle text: recognize and log in one step, no session carried forward
    async fn log_text_directly(&self, user: UserId, text: &str) -> String {
        let estimate = match self.recognizer.identify(Some(text), None).await {
            Ok(estimate) => estimate,
            Err(e) => {
                debug!(error = %e, "Text recognition failed");
                return e.user_message().to_owned();
            }
        };

        let delta = estimate.direct_totals();
        self.apply_delta(user, &estimate.name, &delta).await
    }

    /// Description for a pending photo: recognize, fetch composition, and
    /// move to quantity confirmation. Failures keep the photo pending.
    async fn on_description(
        &self,
        session: &mut Session,
        user: UserId,
        text: &str,
        photo: &PhotoRef,
    ) -> String {
        let image = match self.chat.fetch_photo(photo).await {
            Ok(bytes) => InlineImage::jpeg(bytes),
            Err(e) => {
                warn!(user = %user, error = %e, "Photo download failed");
                return e.user_message().to_owned();
            }
        };

        let estimate = match self.recognizer.identify(Some(text), Some(image)).await {
            Ok(estimate) => estimate,
            Err(e) => {
                debug!(error = %e, "Photo recognition failed, keeping photo pending");
                return if e.is_recognition_failure() {
                    replies::DESCRIBE_AGAIN.to_owned()
                } else {
                    e.user_message().to_owned()
                };
            }
        };

        let composition = match self.recognizer.lookup_composition(&estimate.name).await {
            Ok(profile) => Some(profile),
            Err(e) => {
                debug!(food = %estimate.name, error = %e, "Composition lookup failed, using estimate macros");
                estimate.macro_profile()
            }
        };

        let prompt = replies::quantity_prompt(&estimate);
        session.state = SessionState::AwaitingQuantity {
            estimate,
            composition,
        };
        prompt
    }

    /// Quantity answer: confirmation token, explicit grams, or a format
    /// correction. The pending estimate survives unusable answers and
    /// persistence failures.
    async fn on_quantity(
        &self,
        session: &mut Session,
        user: UserId,
        text: &str,
        estimate: &FoodEstimate,
        composition: Option<MacroProfile>,
    ) -> String {
        let trimmed = text.trim();
        let confirmed = trimmed.is_empty() || trimmed.eq_ignore_ascii_case(CONFIRM_TOKEN);

        let explicit_grams = if confirmed {
            None
        } else {
            match parse_grams(trimmed) {
                Some(grams) => Some(grams),
                None => return replies::QUANTITY_FORMAT.to_owned(),
            }
        };

        let delta = quantity_delta(estimate, composition.as_ref(), explicit_grams);
        match self.ledger.add(user, today(), &delta).await {
            Ok(totals) => {
                // Only a committed write resolves the exchange
                session.reset();
                replies::logged(&estimate.name, &delta, &totals, &self.targets)
            }
            Err(e) => {
                warn!(user = %user, error = %e, "Ledger write failed, keeping estimate pending");
                e.user_message().to_owned()
            }
        }
    }

    /// Write a delta for today and format the confirmation or failure reply
    async fn apply_delta(&self, user: UserId, food: &str, delta: &DayTotals) -> String {
        match self.ledger.add(user, today(), delta).await {
            Ok(totals) => replies::logged(food, delta, &totals, &self.targets),
            Err(e) => {
                warn!(user = %user, error = %e, "Ledger write failed");
                e.user_message().to_owned()
            }
        }
    }
}

/// Today's calendar date in the process-local timezone
fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Parse an explicit gram quantity, accepting an optional trailing `g`
fn parse_grams(text: &str) -> Option<f64> {
    let body = text
        .strip_suffix(['g', 'G'])
        .map_or(text, str::trim_end);
    let grams: f64 = body.trim().parse().ok()?;
    (grams.is_finite() && grams > 0.0).then_some(grams)
}

/// Compute the ledger delta for a confirmed or explicit quantity.
///
/// With a composition profile the grams (explicit, else estimated, else
/// 100 g) scale the per-100 g values. Without one, the calorie estimate
/// applies; an explicit gram figure can still rescale it linearly when the
/// estimate carried its own gram figure.
fn quantity_delta(
    estimate: &FoodEstimate,
    composition: Option<&MacroProfile>,
    explicit_grams: Option<f64>,
) -> DayTotals {
    if let Some(profile) = composition {
        let grams = explicit_grams
            .or(estimate.estimated_grams)
            .unwrap_or(100.0);
        return profile.scaled(grams);
    }

    let mut delta = DayTotals {
        calories: estimate.calories,
        ..DayTotals::default()
    };
    if let (Some(grams), Some(estimated)) = (explicit_grams, estimate.estimated_grams) {
        delta.calories = estimate.calories * grams / estimated;
    }
    delta
}
