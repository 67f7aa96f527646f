// ABOUTME: Integration tests for the per-user session state machine
// ABOUTME: Covers direct logging, photo retry, quantity confirmation, and reset flows
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Morsel Project

mod common;

use std::time::Duration;

use common::{estimate, profile, today, Harness};
use morsel::models::{DayTotals, FoodEstimate, InboundEvent, PhotoRef, UserId};

const USER: UserId = UserId(1001);

fn photo_event(id: &str) -> InboundEvent {
    InboundEvent::Photo {
        user: USER,
        photo: PhotoRef(id.to_owned()),
    }
}

fn text_event(text: &str) -> InboundEvent {
    InboundEvent::Text {
        user: USER,
        text: text.to_owned(),
    }
}

#[tokio::test]
async fn test_idle_text_logs_immediately() {
    let harness = Harness::new().await;
    harness
        .recognizer
        .push_identify(Ok(estimate("apple", 95.0)));

    let reply = harness.machine.handle(text_event("one medium apple")).await;

    assert!(reply.text.contains("apple"));
    assert!(reply.text.contains("+95 kcal"));
    assert!(reply.text.contains("95/3300 kcal"));

    let totals = harness.ledger.totals(USER, today());
    assert!((totals.calories - 95.0).abs() < 1e-9);
    assert_eq!(totals.protein, 0.0);
    assert_eq!(totals.fat, 0.0);
    assert_eq!(totals.carbs, 0.0);

    // No photo was involved
    assert_eq!(harness.recognizer.identify_inputs(), vec![(
        Some("one medium apple".to_owned()),
        false
    )]);
}

#[tokio::test]
async fn test_idle_recognition_failure_leaves_everything_untouched() {
    let harness = Harness::new().await;
    // Queue exhausted -> recognition failure

    let reply = harness.machine.handle(text_event("asdfjkl")).await;

    assert!(reply.text.contains("couldn't recognize"));
    assert_eq!(harness.ledger.totals(USER, today()), DayTotals::default());

    // Still idle: the next text goes through the direct path again
    harness.recognizer.push_identify(Ok(estimate("toast", 120.0)));
    let reply = harness.machine.handle(text_event("two slices of toast")).await;
    assert!(reply.text.contains("toast"));
}

#[tokio::test]
async fn test_failed_description_preserves_the_pending_photo() {
    let harness = Harness::new().await;

    let reply = harness.machine.handle(photo_event("photo-a")).await;
    assert!(reply.text.contains("describe"));

    // Provider cannot make sense of the description
    let reply = harness.machine.handle(text_event("blurry gibberish")).await;
    assert!(reply.text.contains("Describe the photo again"));
    assert_eq!(harness.ledger.totals(USER, today()), DayTotals::default());

    // Retry without resending: the same photo is fetched again
    harness
        .recognizer
        .push_identify(Ok(estimate("lasagna", 450.0)));
    let reply = harness.machine.handle(text_event("a slice of lasagna")).await;
    assert!(reply.text.contains("lasagna"));

    let fetched = harness.chat.fetched();
    assert_eq!(fetched.len(), 2);
    assert!(fetched.iter().all(|p| p.as_str() == "photo-a"));
}

#[tokio::test]
async fn test_confirmation_scales_estimated_grams() {
    let harness = Harness::new().await;

    let mut pasta: FoodEstimate = estimate("pasta", 500.0);
    pasta.estimated_grams = Some(150.0);
    harness.recognizer.push_identify(Ok(pasta));
    harness
        .recognizer
        .push_composition(Ok(profile(130.0, 5.0, 1.1, 25.0)));

    harness.machine.handle(photo_event("photo-b")).await;
    let reply = harness.machine.handle(text_event("bowl of pasta")).await;
    assert!(reply.text.contains("150 g"));

    let reply = harness.machine.handle(text_event("ok")).await;
    assert!(reply.text.contains("pasta"));

    // 150 g of the per-100 g profile
    let totals = harness.ledger.totals(USER, today());
    assert!((totals.calories - 195.0).abs() < 1e-9);
    assert!((totals.protein - 7.5).abs() < 1e-9);
    assert!((totals.carbs - 37.5).abs() < 1e-9);

    // The exchange resolved: a new text goes through the direct path
    harness.recognizer.push_identify(Ok(estimate("tea", 2.0)));
    harness.machine.handle(text_event("green tea")).await;
    assert_eq!(harness.chat.fetched().len(), 1);
}

#[tokio::test]
async fn test_explicit_grams_override_the_estimate() {
    let harness = Harness::new().await;

    let mut rice: FoodEstimate = estimate("rice", 200.0);
    rice.estimated_grams = Some(150.0);
    harness.recognizer.push_identify(Ok(rice));
    harness
        .recognizer
        .push_composition(Ok(profile(130.0, 2.7, 0.3, 28.0)));

    harness.machine.handle(photo_event("photo-c")).await;
    harness.machine.handle(text_event("white rice")).await;
    let reply = harness.machine.handle(text_event("200")).await;
    assert!(reply.text.contains("rice"));

    let totals = harness.ledger.totals(USER, today());
    assert!((totals.calories - 260.0).abs() < 1e-9);
    assert!((totals.carbs - 56.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_unparseable_quantity_keeps_the_pending_estimate() {
    let harness = Harness::new().await;

    let mut soup: FoodEstimate = estimate("soup", 180.0);
    soup.estimated_grams = Some(300.0);
    harness.recognizer.push_identify(Ok(soup));
    harness
        .recognizer
        .push_composition(Ok(profile(60.0, 3.0, 2.0, 7.0)));

    harness.machine.handle(photo_event("photo-d")).await;
    harness.machine.handle(text_event("vegetable soup")).await;

    let reply = harness.machine.handle(text_event("a normal portion")).await;
    assert!(reply.text.contains("grams"));
    assert_eq!(harness.ledger.totals(USER, today()), DayTotals::default());

    // The estimate survived the correction round
    let reply = harness.machine.handle(text_event("ok")).await;
    assert!(reply.text.contains("soup"));
    let totals = harness.ledger.totals(USER, today());
    assert!((totals.calories - 180.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_newest_photo_wins() {
    let harness = Harness::new().await;

    harness.machine.handle(photo_event("photo-old")).await;
    harness.machine.handle(photo_event("photo-new")).await;

    harness.recognizer.push_identify(Ok(estimate("salad", 150.0)));
    harness.machine.handle(text_event("a salad")).await;

    assert_eq!(harness.chat.fetched(), vec![PhotoRef("photo-new".into())]);
}

#[tokio::test]
async fn test_photo_download_failure_keeps_the_session_retryable() {
    let harness = Harness::new().await;

    harness.machine.handle(photo_event("photo-e")).await;
    harness.chat.fail_next_fetches();

    let reply = harness.machine.handle(text_event("some meal")).await;
    assert!(reply.text.contains("try again"));
    assert_eq!(harness.ledger.totals(USER, today()), DayTotals::default());
    // The recognizer was never consulted
    assert!(harness.recognizer.identify_inputs().is_empty());
}

#[tokio::test]
async fn test_reset_clears_totals_and_pending_session() {
    let harness = Harness::new().await;

    // Accumulate something first
    harness.recognizer.push_identify(Ok(estimate("bagel", 280.0)));
    harness.machine.handle(text_event("a bagel")).await;

    // Park the session mid-confirmation
    let mut steak: FoodEstimate = estimate("steak", 600.0);
    steak.estimated_grams = Some(250.0);
    harness.recognizer.push_identify(Ok(steak));
    harness
        .recognizer
        .push_composition(Ok(profile(271.0, 25.0, 19.0, 0.0)));
    harness.machine.handle(photo_event("photo-f")).await;
    harness.machine.handle(text_event("ribeye steak")).await;

    let reply = harness.machine.handle(InboundEvent::Reset { user: USER }).await;
    assert!(reply.text.contains("back to zero"));
    assert_eq!(harness.ledger.totals(USER, today()), DayTotals::default());

    // The stale confirmation must not apply after the reset: "ok" is now an
    // idle text and fails recognition instead of logging the steak
    let reply = harness.machine.handle(text_event("ok")).await;
    assert!(reply.text.contains("couldn't recognize"));
    assert_eq!(harness.ledger.totals(USER, today()), DayTotals::default());
}

#[tokio::test]
async fn test_composition_fallback_uses_estimate_macros() {
    let harness = Harness::new().await;

    let chicken = FoodEstimate {
        name: "grilled chicken".to_owned(),
        calories: 250.0,
        protein_per_100g: Some(31.0),
        fat_per_100g: Some(3.6),
        carbs_per_100g: Some(0.0),
        estimated_grams: Some(100.0),
    };
    harness.recognizer.push_identify(Ok(chicken));
    // Composition lookup queue is empty -> lookup fails -> estimate macros

    harness.machine.handle(photo_event("photo-g")).await;
    harness.machine.handle(text_event("grilled chicken")).await;
    harness.machine.handle(text_event("ok")).await;

    let totals = harness.ledger.totals(USER, today());
    // Atwater-derived calories: 31 * 4 + 3.6 * 9
    assert!((totals.calories - 156.4).abs() < 1e-9);
    assert!((totals.protein - 31.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_summary_reports_no_data_then_averages() {
    let harness = Harness::new().await;

    let reply = harness.machine.handle(InboundEvent::Summary { user: USER }).await;
    assert!(reply.text.contains("No data yet"));

    harness.recognizer.push_identify(Ok(estimate("pizza", 800.0)));
    harness.machine.handle(text_event("pizza")).await;

    let reply = harness.machine.handle(InboundEvent::Summary { user: USER }).await;
    assert!(reply.text.contains("Last 7 days"));
    assert!(reply.text.contains("800 kcal"));
}

#[tokio::test]
async fn test_stale_session_expires_back_to_idle() {
    let harness = Harness::with_idle_timeout(Some(Duration::from_millis(50))).await;

    harness.machine.handle(photo_event("photo-h")).await;
    tokio::time::sleep(Duration::from_millis(120)).await;

    // The abandoned photo exchange expired: text takes the direct path
    harness.recognizer.push_identify(Ok(estimate("banana", 105.0)));
    harness.machine.handle(text_event("a banana")).await;

    assert!(harness.chat.fetched().is_empty());
    assert_eq!(
        harness.recognizer.identify_inputs(),
        vec![(Some("a banana".to_owned()), false)]
    );
}

#[tokio::test]
async fn test_users_are_isolated() {
    let harness = Harness::new().await;
    let other = UserId(2002);

    harness.recognizer.push_identify(Ok(estimate("apple", 95.0)));
    harness.machine.handle(text_event("apple")).await;

    assert_eq!(harness.ledger.totals(other, today()), DayTotals::default());

    // The other user's photo exchange does not disturb USER's idle state
    harness
        .machine
        .handle(InboundEvent::Photo {
            user: other,
            photo: PhotoRef("other-photo".into()),
        })
        .await;
    harness.recognizer.push_identify(Ok(estimate("pear", 60.0)));
    harness.machine.handle(text_event("a pear")).await;
    assert!(harness.chat.fetched().is_empty());
}
