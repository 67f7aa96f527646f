// ABOUTME: Shared test utilities: mock recognizer, mock chat gateway, machine harness
// ABOUTME: Provides quiet test logging and a tempfile-backed ledger setup
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Morsel Project
#![allow(dead_code)]

//! Shared test utilities for `morsel`
//!
//! Common setup to reduce duplication across integration tests: scripted
//! mocks for the recognizer and the chat gateway, and a harness wiring a
//! real ledger in a temporary directory to the session state machine.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDate;

use morsel::chat::ChatGateway;
use morsel::errors::{AppError, AppResult};
use morsel::ledger::{snapshot::SnapshotStore, NutritionLedger};
use morsel::llm::InlineImage;
use morsel::models::{DailyTargets, FoodEstimate, MacroProfile, PhotoRef, Reply};
use morsel::recognition::Recognizer;
use morsel::session::SessionMachine;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            Ok("WARN" | "ERROR") | _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Today in the machine's local timezone
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// The default daily targets used across tests
pub fn test_targets() -> DailyTargets {
    DailyTargets {
        calories: 3300.0,
        protein: 175.0,
        fat: 95.0,
        carbs: 435.0,
    }
}

/// A minimal calorie-only estimate
pub fn estimate(name: &str, calories: f64) -> FoodEstimate {
    FoodEstimate {
        name: name.to_owned(),
        calories,
        protein_per_100g: None,
        fat_per_100g: None,
        carbs_per_100g: None,
        estimated_grams: None,
    }
}

/// A per-100 g profile
pub fn profile(calories: f64, protein: f64, fat: f64, carbs: f64) -> MacroProfile {
    MacroProfile {
        calories,
        protein,
        fat,
        carbs,
    }
}

/// Scripted recognizer: results are consumed in order; an exhausted queue
/// answers with a recognition failure
#[derive(Default)]
pub struct MockRecognizer {
    identify_results: Mutex<VecDeque<AppResult<FoodEstimate>>>,
    composition_results: Mutex<VecDeque<AppResult<MacroProfile>>>,
    identify_inputs: Mutex<Vec<(Option<String>, bool)>>,
}

impl MockRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next `identify` result
    pub fn push_identify(&self, result: AppResult<FoodEstimate>) {
        self.identify_results.lock().unwrap().push_back(result);
    }

    /// Queue the next `lookup_composition` result
    pub fn push_composition(&self, result: AppResult<MacroProfile>) {
        self.composition_results.lock().unwrap().push_back(result);
    }

    /// The `(text, had_photo)` inputs `identify` was called with
    pub fn identify_inputs(&self) -> Vec<(Option<String>, bool)> {
        self.identify_inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Recognizer for MockRecognizer {
    async fn identify(
        &self,
        text: Option<&str>,
        photo: Option<InlineImage>,
    ) -> AppResult<FoodEstimate> {
        self.identify_inputs
            .lock()
            .unwrap()
            .push((text.map(str::to_owned), photo.is_some()));
        self.identify_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::recognition("mock exhausted")))
    }

    async fn lookup_composition(&self, _food_name: &str) -> AppResult<MacroProfile> {
        self.composition_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::recognition("mock exhausted")))
    }
}

/// Recording chat gateway serving fixed photo bytes
pub struct MockChatGateway {
    sent: Mutex<Vec<Reply>>,
    fetched: Mutex<Vec<PhotoRef>>,
    fail_fetch: AtomicBool,
}

impl MockChatGateway {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fetched: Mutex::new(Vec::new()),
            fail_fetch: AtomicBool::new(false),
        }
    }

    /// Make subsequent photo downloads fail with a transport error
    pub fn fail_next_fetches(&self) {
        self.fail_fetch.store(true, Ordering::SeqCst);
    }

    /// Photo refs that were fetched, in order
    pub fn fetched(&self) -> Vec<PhotoRef> {
        self.fetched.lock().unwrap().clone()
    }
}

impl Default for MockChatGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatGateway for MockChatGateway {
    async fn send_reply(&self, reply: &Reply) -> AppResult<()> {
        self.sent.lock().unwrap().push(reply.clone());
        Ok(())
    }

    async fn fetch_photo(&self, photo: &PhotoRef) -> AppResult<Bytes> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(AppError::transport("mock download failure"));
        }
        self.fetched.lock().unwrap().push(photo.clone());
        Ok(Bytes::from_static(b"\xff\xd8jpeg-bytes"))
    }
}

/// Full state machine wired to mocks and a tempfile-backed ledger
pub struct Harness {
    pub machine: SessionMachine,
    pub ledger: Arc<NutritionLedger>,
    pub recognizer: Arc<MockRecognizer>,
    pub chat: Arc<MockChatGateway>,
    _dir: tempfile::TempDir,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_idle_timeout(None).await
    }

    pub async fn with_idle_timeout(idle_timeout: Option<Duration>) -> Self {
        init_test_logging();
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SnapshotStore::new(dir.path().join("ledger.json"));
        let ledger = Arc::new(NutritionLedger::open(store).await.expect("open ledger"));
        let recognizer = Arc::new(MockRecognizer::new());
        let chat = Arc::new(MockChatGateway::new());

        let machine = SessionMachine::new(
            Arc::clone(&ledger),
            Arc::clone(&recognizer) as Arc<dyn Recognizer>,
            Arc::clone(&chat) as Arc<dyn ChatGateway>,
            test_targets(),
            idle_timeout,
        );

        Self {
            machine,
            ledger,
            recognizer,
            chat,
            _dir: dir,
        }
    }
}
