// ABOUTME: Outbound chat reply texts and nutrition total formatting
// ABOUTME: Every user-visible message of the assistant lives in this module
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Morsel Project

//! Reply texts. Centralized so the state machine emits consistent,
//! short corrective messages and totals blocks.

use crate::models::{DailyTargets, DayTotals, FoodEstimate};

/// Usage greeting for `/start` and unknown commands
pub const GREETING: &str = "👋 Send me a meal photo plus a description, or just \
describe what you ate.\n/summary → 7-day average\n/reset → restart today's totals";

/// Acknowledgement after a photo upload
pub const PHOTO_RECEIVED: &str = "📸 Photo received! Now describe what's in it.";

/// Retry prompt when a photo description could not be recognized
pub const DESCRIBE_AGAIN: &str =
    "😵 I couldn't make sense of that. Describe the photo again — no need to resend it.";

/// Correction prompt for an unparseable quantity answer
pub const QUANTITY_FORMAT: &str =
    "Please send the amount in grams (e.g. 150), or 'ok' to accept the estimate.";

/// Confirmation after a day reset
pub const DAY_RESET: &str = "🔄 Fresh day started. Today's totals are back to zero.";

/// Summary reply when no date in the window has an entry
pub const NO_DATA_YET: &str = "No data yet 🙂 Log a meal first.";

/// Running totals against the daily targets
#[must_use]
pub fn totals_block(totals: &DayTotals, targets: &DailyTargets) -> String {
    format!(
        "🔥 {:.0}/{:.0} kcal\n🥩 {:.0}/{:.0} g protein\n🥑 {:.0}/{:.0} g fat\n🍞 {:.0}/{:.0} g carbs",
        totals.calories,
        targets.calories,
        totals.protein,
        targets.protein,
        totals.fat,
        targets.fat,
        totals.carbs,
        targets.carbs,
    )
}

/// Confirmation after a meal was added to the ledger
#[must_use]
pub fn logged(food: &str, delta: &DayTotals, totals: &DayTotals, targets: &DailyTargets) -> String {
    let remaining = targets.calories - totals.calories;
    let budget_line = if remaining >= 0.0 {
        format!("🎯 {remaining:.0} kcal remaining today")
    } else {
        format!("🚨 {:.0} kcal over target", -remaining)
    };
    format!(
        "🍽️ {food} — +{:.0} kcal\n{}\n{budget_line}",
        delta.calories,
        totals_block(totals, targets),
    )
}

/// Quantity confirmation prompt after a successful photo recognition
#[must_use]
pub fn quantity_prompt(estimate: &FoodEstimate) -> String {
    match estimate.estimated_grams {
        Some(grams) => format!(
            "🍽️ {}\n📏 Estimated: {grams:.0} g\nSend the real amount in grams, or 'ok' to accept.",
            estimate.name
        ),
        None => format!(
            "🍽️ {}\nHow many grams was it? Send a number, or 'ok' to log the \
             calorie estimate ({:.0} kcal).",
            estimate.name, estimate.calories
        ),
    }
}

/// Weekly average summary
#[must_use]
pub fn weekly_summary(average: &DayTotals) -> String {
    format!(
        "📊 Last 7 days (daily average)\n🔥 {:.0} kcal\n🥩 {:.0} g protein\n🥑 {:.0} g fat\n🍞 {:.0} g carbs",
        average.calories, average.protein, average.fat, average.carbs,
    )
}
