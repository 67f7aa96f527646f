// ABOUTME: USDA FoodData Central API client for per-100g nutrient composition
// ABOUTME: Implements best-match food search with TTL response caching
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Morsel Project

//! USDA `FoodData` Central API Client
//!
//! Composition provider client: converts a food name into a per-100 g
//! calorie/protein/fat/carbohydrate profile using the best-matching search
//! entry. Responses are cached with a TTL (default 24 hours) to minimize
//! API calls; the API is free and requires only an API key.
//!
//! # API Reference
//! USDA `FoodData` Central API: <https://fdc.nal.usda.gov/api-guide.html>

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::config::UsdaConfig;
use crate::errors::{AppError, AppResult};
use crate::models::MacroProfile;

/// USDA API search response
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    foods: Vec<SearchFood>,
}

/// One food entry in a search response
#[derive(Debug, Deserialize)]
struct SearchFood {
    description: String,
    #[serde(rename = "foodNutrients", default)]
    food_nutrients: Vec<SearchNutrient>,
}

/// Nutrient value in a search response (per 100 g)
#[derive(Debug, Deserialize)]
struct SearchNutrient {
    #[serde(rename = "nutrientName")]
    nutrient_name: String,
    #[serde(rename = "unitName", default)]
    unit_name: String,
    value: Option<f64>,
}

/// Cache entry with expiration
#[derive(Debug, Clone)]
struct CacheEntry {
    profile: MacroProfile,
    expires_at: Instant,
}

/// USDA `FoodData` Central API client
pub struct UsdaClient {
    config: UsdaConfig,
    http_client: reqwest::Client,
    cache: RwLock<HashMap<String, CacheEntry>>,
}

impl UsdaClient {
    /// Create a new USDA API client
    #[must_use]
    pub fn new(config: UsdaConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Look up the per-100 g composition for the best match of a food name
    ///
    /// # Errors
    ///
    /// Returns an error when the query is empty, the API request fails, or
    /// no matching entry carries usable nutrient data.
    #[instrument(skip(self))]
    pub async fn lookup(&self, food_name: &str) -> AppResult<MacroProfile> {
        let query = food_name.trim();
        if query.is_empty() {
            return Err(AppError::invalid_input("composition query cannot be empty"));
        }

        let cache_key = query.to_lowercase();
        {
            let cache = self.cache.read().await;
            if let Some(entry) = cache.get(&cache_key) {
                if Instant::now() < entry.expires_at {
                    debug!(food = query, "Composition cache hit");
                    return Ok(entry.profile);
                }
            }
        }

        let url = format!("{}/foods/search", self.config.base_url);
        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("query", query),
                ("pageSize", "1"),
                ("api_key", &self.config.api_key),
            ])
            .send()
            .await
            .map_err(|e| AppError::external_service("USDA API", e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::external_service(
                "USDA API",
                format!(
                    "HTTP {}: {}",
                    response.status(),
                    response.text().await.unwrap_or_default()
                ),
            ));
        }

        let search_response: SearchResponse = response.json().await.map_err(|e| {
            AppError::external_service("USDA API", format!("JSON parse error: {e}"))
        })?;

        let food = search_response
            .foods
            .first()
            .ok_or_else(|| AppError::recognition(format!("no USDA match for \"{query}\"")))?;

        let profile = profile_from_nutrients(&food.food_nutrients).ok_or_else(|| {
            AppError::recognition(format!(
                "USDA entry \"{}\" carries no usable nutrient data",
                food.description
            ))
        })?;

        debug!(food = query, matched = %food.description, "Composition lookup succeeded");

        {
            let mut cache = self.cache.write().await;
            cache.insert(
                cache_key,
                CacheEntry {
                    profile,
                    expires_at: Instant::now() + Duration::from_secs(self.config.cache_ttl_secs),
                },
            );
        }

        Ok(profile)
    }
}

/// Extract a per-100 g profile from search-response nutrients.
///
/// Nutrient rows are matched by name, the way the search endpoint labels
/// them ("Energy", "Protein", "Total lipid (fat)", "Carbohydrate, by
/// difference"). Energy prefers the kcal row over the kJ row; when no kcal
/// energy is present the calories are derived from the macros with Atwater
/// factors.
fn profile_from_nutrients(nutrients: &[SearchNutrient]) -> Option<MacroProfile> {
    let find = |name_part: &str, unit: Option<&str>| -> Option<f64> {
        nutrients.iter().find_map(|n| {
            let name_matches = n.nutrient_name.to_lowercase().contains(name_part);
            let unit_matches = unit.map_or(true, |u| n.unit_name.eq_ignore_ascii_case(u));
            (name_matches && unit_matches).then_some(n.value).flatten()
        })
    };

    let protein = find("protein", None);
    let fat = find("total lipid", None).or_else(|| find("fat", None));
    let carbs = find("carbohydrate", None);
    let calories = find("energy", Some("kcal")).or_else(|| {
        match (protein, fat, carbs) {
            (None, None, None) => None,
            _ => Some(
                protein.unwrap_or(0.0) * 4.0 + fat.unwrap_or(0.0) * 9.0 + carbs.unwrap_or(0.0) * 4.0,
            ),
        }
    });

    calories.map(|calories| MacroProfile {
        calories,
        protein: protein.unwrap_or(0.0),
        fat: fat.unwrap_or(0.0),
        carbs: carbs.unwrap_or(0.0),
    })
}
