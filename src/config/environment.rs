// ABOUTME: Environment-based configuration loading with startup validation
// ABOUTME: Resolves credentials, daily targets, ledger path, and timeout settings
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Morsel Project

//! # Environment Configuration
//!
//! Loads the full process configuration from environment variables and
//! validates required credentials at startup. Missing required credentials
//! produce a [`crate::errors::ErrorCode::ConfigMissing`] error, which the
//! binary reports as a diagnostic before exiting nonzero.
//!
//! | Variable | Required | Default |
//! |---|---|---|
//! | `TELEGRAM_BOT_TOKEN` | yes | (none) |
//! | `GEMINI_API_KEY` | one of the two | (none) |
//! | `GROQ_API_KEY` | one of the two | (none) |
//! | `USDA_API_KEY` | yes | (none) |
//! | `MORSEL_LLM_PROVIDER` | no | `groq` (falls back to the configured key) |
//! | `MORSEL_LEDGER_PATH` | no | `<data_dir>/morsel/ledger.json` |
//! | `MORSEL_DAILY_CALORIES` / `_PROTEIN` / `_FAT` / `_CARBS` | no | 3300 / 175 / 95 / 435 |
//! | `MORSEL_PROVIDER_TIMEOUT_SECS` | no | 30 |
//! | `MORSEL_SESSION_IDLE_SECS` | no | 1800 (`0` disables expiry) |

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{targets, timeouts};
use crate::errors::{AppError, AppResult};
use crate::models::DailyTargets;

/// Environment variable for the Telegram bot token
pub const TELEGRAM_BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";
/// Environment variable for the USDA FoodData Central API key
pub const USDA_API_KEY_ENV: &str = "USDA_API_KEY";
/// Environment variable selecting the primary text LLM provider
pub const LLM_PROVIDER_ENV: &str = "MORSEL_LLM_PROVIDER";

/// Which LLM provider handles text-only recognition requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProviderType {
    /// Groq (fast open-weight models, JSON mode, text only)
    Groq,
    /// Google Gemini (vision-capable)
    Gemini,
}

impl fmt::Display for LlmProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Groq => write!(f, "groq"),
            Self::Gemini => write!(f, "gemini"),
        }
    }
}

/// LLM provider credentials and selection
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Primary provider for text-only requests
    pub primary: LlmProviderType,
    /// Gemini API key, required for the photo flow
    pub gemini_api_key: Option<String>,
    /// Groq API key
    pub groq_api_key: Option<String>,
}

/// USDA FoodData Central client settings
#[derive(Debug, Clone)]
pub struct UsdaConfig {
    /// API key (free from the FoodData Central signup page)
    pub api_key: String,
    /// Base URL for the API
    pub base_url: String,
    /// Cache TTL for composition lookups, in seconds
    pub cache_ttl_secs: u64,
}

impl Default for UsdaConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.nal.usda.gov/fdc/v1".to_string(),
            cache_ttl_secs: 86400, // 24 hours
        }
    }
}

/// Full process configuration
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram bot token
    pub telegram_token: String,
    /// LLM provider settings
    pub llm: LlmConfig,
    /// Composition provider settings
    pub usda: UsdaConfig,
    /// Path of the persisted ledger snapshot
    pub ledger_path: PathBuf,
    /// Daily nutrition targets
    pub targets: DailyTargets,
    /// Bounded timeout for one provider call
    pub provider_timeout: Duration,
    /// Idle interval after which an abandoned session resets; `None` disables
    pub session_idle: Option<Duration>,
}

impl BotConfig {
    /// Load and validate configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a required credential is absent or
    /// a numeric override cannot be parsed.
    pub fn from_env() -> AppResult<Self> {
        let telegram_token = env::var(TELEGRAM_BOT_TOKEN_ENV).map_err(|_| {
            AppError::config(format!("{TELEGRAM_BOT_TOKEN_ENV} environment variable not set"))
        })?;

        let gemini_api_key = env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty());
        let groq_api_key = env::var("GROQ_API_KEY").ok().filter(|k| !k.is_empty());
        if gemini_api_key.is_none() && groq_api_key.is_none() {
            return Err(AppError::config(
                "no LLM credentials: set GEMINI_API_KEY and/or GROQ_API_KEY",
            ));
        }

        let primary = Self::resolve_primary(&gemini_api_key, &groq_api_key)?;

        let usda_api_key = env::var(USDA_API_KEY_ENV).map_err(|_| {
            AppError::config(format!("{USDA_API_KEY_ENV} environment variable not set"))
        })?;

        let usda = UsdaConfig {
            api_key: usda_api_key,
            base_url: env::var("MORSEL_USDA_BASE_URL")
                .unwrap_or_else(|_| UsdaConfig::default().base_url),
            cache_ttl_secs: parse_env_or("MORSEL_USDA_CACHE_TTL_SECS", 86400)?,
        };

        let ledger_path = env::var("MORSEL_LEDGER_PATH").map_or_else(
            |_| default_ledger_path(),
            |p| Ok(PathBuf::from(p)),
        )?;

        let targets = DailyTargets {
            calories: parse_env_or("MORSEL_DAILY_CALORIES", targets::CALORIES)?,
            protein: parse_env_or("MORSEL_DAILY_PROTEIN", targets::PROTEIN)?,
            fat: parse_env_or("MORSEL_DAILY_FAT", targets::FAT)?,
            carbs: parse_env_or("MORSEL_DAILY_CARBS", targets::CARBS)?,
        };

        let provider_timeout = Duration::from_secs(parse_env_or(
            "MORSEL_PROVIDER_TIMEOUT_SECS",
            timeouts::PROVIDER_SECS,
        )?);

        let idle_secs: u64 =
            parse_env_or("MORSEL_SESSION_IDLE_SECS", timeouts::SESSION_IDLE_SECS)?;
        let session_idle = (idle_secs > 0).then(|| Duration::from_secs(idle_secs));

        Ok(Self {
            telegram_token,
            llm: LlmConfig {
                primary,
                gemini_api_key,
                groq_api_key,
            },
            usda,
            ledger_path,
            targets,
            provider_timeout,
            session_idle,
        })
    }

    /// Pick the primary text provider from `MORSEL_LLM_PROVIDER`, falling
    /// back to whichever key is configured
    fn resolve_primary(
        gemini_key: &Option<String>,
        groq_key: &Option<String>,
    ) -> AppResult<LlmProviderType> {
        match env::var(LLM_PROVIDER_ENV).as_deref() {
            Ok("gemini") => {
                if gemini_key.is_none() {
                    return Err(AppError::config(format!(
                        "{LLM_PROVIDER_ENV}=gemini but GEMINI_API_KEY is not set"
                    )));
                }
                Ok(LlmProviderType::Gemini)
            }
            Ok("groq") => {
                if groq_key.is_none() {
                    return Err(AppError::config(format!(
                        "{LLM_PROVIDER_ENV}=groq but GROQ_API_KEY is not set"
                    )));
                }
                Ok(LlmProviderType::Groq)
            }
            Ok(other) => Err(AppError::config_invalid(format!(
                "{LLM_PROVIDER_ENV} must be \"groq\" or \"gemini\", got \"{other}\""
            ))),
            Err(_) => {
                // Default preference: groq when its key exists, gemini otherwise
                if groq_key.is_some() {
                    Ok(LlmProviderType::Groq)
                } else {
                    Ok(LlmProviderType::Gemini)
                }
            }
        }
    }

    /// One-line startup summary with secrets redacted
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Morsel Configuration:\n\
             - Primary LLM: {}\n\
             - Vision (Gemini): {}\n\
             - Composition: USDA FoodData Central\n\
             - Ledger: {}\n\
             - Daily target: {:.0} kcal\n\
             - Provider timeout: {}s\n\
             - Session idle expiry: {}",
            self.llm.primary,
            if self.llm.gemini_api_key.is_some() {
                "configured"
            } else {
                "not configured (photo flow disabled)"
            },
            self.ledger_path.display(),
            self.targets.calories,
            self.provider_timeout.as_secs(),
            self.session_idle
                .map_or_else(|| "disabled".to_string(), |d| format!("{}s", d.as_secs())),
        )
    }
}

/// Default ledger location under the platform data directory
fn default_ledger_path() -> AppResult<PathBuf> {
    let base = dirs::data_dir()
        .ok_or_else(|| AppError::config("could not determine a data directory; set MORSEL_LEDGER_PATH"))?;
    Ok(base.join("morsel").join("ledger.json"))
}

/// Parse an environment override, falling back to a default when unset
fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> AppResult<T> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AppError::config_invalid(format!("{key} has an unparseable value: {raw}"))),
        Err(_) => Ok(default),
    }
}
