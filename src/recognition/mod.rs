// ABOUTME: Recognition gateway normalizing provider calls into one contract
// ABOUTME: Routes identify requests by capability and bounds every call with a timeout
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Morsel Project

//! # Recognition Gateway
//!
//! One contract over the heterogeneous external services:
//!
//! - [`Recognizer::identify`]: free text and/or a photo in, a normalized
//!   [`FoodEstimate`] out, or a recognition failure
//! - [`Recognizer::lookup_composition`]: food name in, per-100 g
//!   [`MacroProfile`] out
//!
//! Photo requests route to a vision-capable provider; text-only requests go
//! to the configured primary. Every outbound call carries a bounded timeout,
//! and a timeout classifies as a recognition failure with no automatic
//! retry; retry is entirely user-driven. Backoff or circuit breaking, if
//! ever needed, belongs behind this boundary so the state machine stays
//! unaware.

pub mod normalize;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::config::{BotConfig, LlmProviderType};
use crate::errors::{AppError, AppResult};
use crate::external::usda::UsdaClient;
use crate::llm::{
    CompletionRequest, GeminiProvider, GroqProvider, InlineImage, LlmProvider,
};
use crate::models::{FoodEstimate, MacroProfile};

/// Low temperature keeps estimates stable across retries of the same text
const ESTIMATE_TEMPERATURE: f32 = 0.2;

/// The JSON shape providers are instructed to answer with
const ANSWER_SHAPE: &str = r#"{"food": "name", "calories": 0, "protein_per_100g": 0, "fat_per_100g": 0, "carbs_per_100g": 0, "grams": 0}"#;

/// Unified recognition contract consumed by the session state machine
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Identify a food from free text and/or a photo.
    ///
    /// At least one of `text`/`photo` must be present.
    ///
    /// # Errors
    ///
    /// Any provider error, timeout, or unparseable response surfaces as a
    /// recognition failure.
    async fn identify(
        &self,
        text: Option<&str>,
        photo: Option<InlineImage>,
    ) -> AppResult<FoodEstimate>;

    /// Look up the per-100 g composition of a food by name
    ///
    /// # Errors
    ///
    /// Returns a recognition failure when no match is found or the
    /// composition provider is unreachable.
    async fn lookup_composition(&self, food_name: &str) -> AppResult<MacroProfile>;
}

/// Gateway over the configured LLM providers and the composition provider
pub struct RecognitionGateway {
    /// Providers in preference order; the first capable one wins
    providers: Vec<Arc<dyn LlmProvider>>,
    composition: UsdaClient,
    call_timeout: Duration,
}

impl RecognitionGateway {
    /// Assemble the gateway from process configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no LLM credential is available.
    pub fn from_config(config: &BotConfig) -> AppResult<Self> {
        let mut providers: Vec<Arc<dyn LlmProvider>> = Vec::new();

        let gemini = config
            .llm
            .gemini_api_key
            .as_ref()
            .map(|key| Arc::new(GeminiProvider::new(key.clone())) as Arc<dyn LlmProvider>);
        let groq = config
            .llm
            .groq_api_key
            .as_ref()
            .map(|key| Arc::new(GroqProvider::new(key.clone())) as Arc<dyn LlmProvider>);

        match config.llm.primary {
            LlmProviderType::Groq => {
                providers.extend(groq);
                providers.extend(gemini);
            }
            LlmProviderType::Gemini => {
                providers.extend(gemini);
                providers.extend(groq);
            }
        }

        if providers.is_empty() {
            return Err(AppError::config("no LLM providers configured"));
        }

        for provider in &providers {
            info!(provider = provider.name(), "Recognition provider registered");
        }

        Ok(Self {
            providers,
            composition: UsdaClient::new(config.usda.clone()),
            call_timeout: config.provider_timeout,
        })
    }

    /// Pick the first provider that satisfies the request
    fn select_provider(&self, needs_vision: bool) -> AppResult<&dyn LlmProvider> {
        self.providers
            .iter()
            .find(|p| !needs_vision || p.capabilities().supports_vision())
            .map(AsRef::as_ref)
            .ok_or_else(|| {
                AppError::recognition("no vision-capable provider configured for photo input")
            })
    }

    /// Build the recognition prompt for a text and/or photo request
    fn build_prompt(text: Option<&str>, has_photo: bool) -> String {
        let subject = match (text, has_photo) {
            (Some(text), true) => format!("the attached meal photo and the description '{text}'"),
            (Some(text), false) => format!("the food described as '{text}'"),
            (None, _) => "the attached meal photo".to_owned(),
        };
        format!(
            "You are an experienced nutritionist. Analyze {subject}. \
             Answer with ONLY one JSON object of the form {ANSWER_SHAPE}, \
             where calories is the estimate for the whole described portion, \
             the *_per_100g values are per 100 grams, and grams is the \
             estimated portion weight. Use null for values you cannot \
             estimate. If the input does not describe food, answer \
             {{\"not_food\": true}}."
        )
    }

    /// Run a future under the gateway's bounded call timeout
    async fn bounded<T>(
        &self,
        what: &str,
        fut: impl std::future::Future<Output = AppResult<T>> + Send,
    ) -> AppResult<T> {
        match tokio::time::timeout(self.call_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(AppError::recognition_timeout(format!(
                "{what} exceeded {}s",
                self.call_timeout.as_secs()
            ))),
        }
    }
}

#[async_trait]
impl Recognizer for RecognitionGateway {
    #[instrument(skip(self, text, photo), fields(has_text = text.is_some(), has_photo = photo.is_some()))]
    async fn identify(
        &self,
        text: Option<&str>,
        photo: Option<InlineImage>,
    ) -> AppResult<FoodEstimate> {
        if text.is_none() && photo.is_none() {
            return Err(AppError::invalid_input(
                "identify requires text or a photo",
            ));
        }

        let provider = self.select_provider(photo.is_some())?;
        debug!(provider = provider.name(), "Dispatching recognition request");

        let mut request = CompletionRequest::new(Self::build_prompt(text, photo.is_some()))
            .with_temperature(ESTIMATE_TEMPERATURE);
        if let Some(image) = photo {
            request = request.with_image(image);
        }

        let response = self
            .bounded("recognition call", provider.complete(&request))
            .await?;

        let estimate = normalize::parse_estimate(&response.content)?;
        debug!(food = %estimate.name, calories = estimate.calories, "Recognition succeeded");
        Ok(estimate)
    }

    #[instrument(skip(self))]
    async fn lookup_composition(&self, food_name: &str) -> AppResult<MacroProfile> {
        self.bounded("composition lookup", self.composition.lookup(food_name))
            .await
    }
}
