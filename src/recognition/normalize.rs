// ABOUTME: Normalization boundary mapping raw provider output to food estimates
// ABOUTME: Handles bare JSON, fenced JSON, prose-wrapped JSON, and key:value text
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Morsel Project

//! # Response Normalization
//!
//! The single place where raw LLM output is shaped into a
//! [`FoodEstimate`]. All format guessing lives here: markdown code fences,
//! JSON embedded in narrative prose, and plain `key: value` lines. Anything
//! that cannot be shaped into an estimate with a usable name and calorie
//! value, or that the provider flags as not food, is a recognition failure.
//! No raw provider string leaves this module.

use serde::Deserialize;

use crate::errors::{AppError, AppResult};
use crate::models::FoodEstimate;

/// Lenient wire shape accepted from providers
#[derive(Debug, Default, Deserialize)]
struct WireEstimate {
    #[serde(alias = "name")]
    food: Option<String>,
    #[serde(alias = "kcal", alias = "calories_kcal")]
    calories: Option<f64>,
    #[serde(alias = "protein", alias = "protein_g")]
    protein_per_100g: Option<f64>,
    #[serde(alias = "fat", alias = "fat_g")]
    fat_per_100g: Option<f64>,
    #[serde(alias = "carbs", alias = "carbs_g", alias = "carbohydrates")]
    carbs_per_100g: Option<f64>,
    #[serde(alias = "estimated_grams", alias = "quantity_g")]
    grams: Option<f64>,
    not_food: Option<bool>,
    error: Option<String>,
}

/// Shape raw provider output into a [`FoodEstimate`]
///
/// # Errors
///
/// Returns a recognition failure when the output cannot be parsed, lacks a
/// usable name or calorie value, or is flagged as not food.
pub fn parse_estimate(raw: &str) -> AppResult<FoodEstimate> {
    let wire = match extract_json(raw) {
        Some(json) => serde_json::from_str::<WireEstimate>(&json)
            .map_err(|e| AppError::recognition(format!("estimate JSON has wrong shape: {e}")))?,
        None => parse_key_value(raw)
            .ok_or_else(|| AppError::recognition("no JSON or key:value content in response"))?,
    };
    validate(wire)
}

/// Extract a JSON object from output that might contain extra text
fn extract_json(response: &str) -> Option<String> {
    // First try: the whole response is JSON
    if serde_json::from_str::<serde_json::Value>(response).is_ok() {
        return Some(response.to_owned());
    }

    // Second try: a fenced code block
    if let Some(start) = response.find("```") {
        let body = &response[start + 3..];
        let body = body.strip_prefix("json").unwrap_or(body);
        if let Some(end) = body.find("```") {
            let candidate = body[..end].trim();
            if serde_json::from_str::<serde_json::Value>(candidate).is_ok() {
                return Some(candidate.to_owned());
            }
        }
    }

    // Third try: the outermost brace span within surrounding prose
    if let Some(start) = response.find('{') {
        if let Some(end) = response.rfind('}') {
            if end > start {
                let candidate = &response[start..=end];
                if serde_json::from_str::<serde_json::Value>(candidate).is_ok() {
                    return Some(candidate.to_owned());
                }
            }
        }
    }

    None
}

/// Parse `key: value` lines as a last resort
fn parse_key_value(response: &str) -> Option<WireEstimate> {
    let mut wire = WireEstimate::default();
    let mut matched = false;

    for line in response.lines() {
        let line = line.trim().trim_start_matches(['-', '*', ' ']);
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = value.trim().trim_matches('"');

        match key.as_str() {
            "food" | "name" => {
                wire.food = Some(value.to_owned());
                matched = true;
            }
            "calories" | "kcal" => {
                wire.calories = parse_number(value);
                matched = true;
            }
            "protein" | "protein_per_100g" => wire.protein_per_100g = parse_number(value),
            "fat" | "fat_per_100g" => wire.fat_per_100g = parse_number(value),
            "carbs" | "carbs_per_100g" | "carbohydrates" => {
                wire.carbs_per_100g = parse_number(value);
            }
            "grams" | "quantity" => wire.grams = parse_number(value),
            _ => {}
        }
    }

    matched.then_some(wire)
}

/// Parse a number that may carry a trailing unit ("95 kcal", "150g")
fn parse_number(value: &str) -> Option<f64> {
    let digits: String = value
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    digits.parse().ok()
}

/// Validate the wire shape into a proper estimate
fn validate(wire: WireEstimate) -> AppResult<FoodEstimate> {
    if wire.not_food == Some(true) {
        return Err(AppError::not_food("provider flagged input as not food"));
    }
    if let Some(error) = wire.error {
        return Err(AppError::recognition(format!("provider reported: {error}")));
    }

    let name = wire
        .food
        .map(|n| n.trim().to_owned())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::recognition("estimate has no food name"))?;

    let calories = wire
        .calories
        .filter(|c| c.is_finite() && *c >= 0.0)
        .ok_or_else(|| AppError::recognition("estimate has no usable calorie value"))?;

    Ok(FoodEstimate {
        name,
        calories,
        protein_per_100g: wire.protein_per_100g.filter(|v| v.is_finite() && *v >= 0.0),
        fat_per_100g: wire.fat_per_100g.filter(|v| v.is_finite() && *v >= 0.0),
        carbs_per_100g: wire.carbs_per_100g.filter(|v| v.is_finite() && *v >= 0.0),
        estimated_grams: wire.grams.filter(|v| v.is_finite() && *v > 0.0),
    })
}
