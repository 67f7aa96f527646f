// ABOUTME: Integration tests for windowed averaging over the nutrition ledger
// ABOUTME: Pins the divide-by-present-dates rule and the explicit no-data result
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Morsel Project

mod common;

use chrono::NaiveDate;
use common::init_test_logging;
use morsel::ledger::{snapshot::SnapshotStore, NutritionLedger};
use morsel::models::{DayTotals, UserId};

const USER: UserId = UserId(7);

fn date(s: &str) -> NaiveDate {
    s.parse().expect("valid date")
}

fn meal(calories: f64) -> DayTotals {
    DayTotals {
        calories,
        protein: calories / 20.0,
        fat: calories / 40.0,
        carbs: calories / 10.0,
    }
}

async fn ledger(dir: &tempfile::TempDir) -> NutritionLedger {
    init_test_logging();
    NutritionLedger::open(SnapshotStore::new(dir.path().join("ledger.json")))
        .await
        .expect("open ledger")
}

#[tokio::test]
async fn test_average_of_one_populated_date_is_that_date() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = ledger(&dir).await;
    let end = date("2026-08-07");

    ledger.add(USER, date("2026-08-05"), &meal(2200.0)).await.unwrap();

    let average = ledger.windowed_average(USER, end, 7).unwrap();
    assert!((average.calories - 2200.0).abs() < 1e-9);
    assert!((average.protein - 110.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_average_divides_by_present_dates_only() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = ledger(&dir).await;
    let end = date("2026-08-07");

    // Two populated dates in a 7-day window: divide by 2, not 7
    ledger.add(USER, date("2026-08-01"), &meal(2000.0)).await.unwrap();
    ledger.add(USER, date("2026-08-07"), &meal(3000.0)).await.unwrap();

    let average = ledger.windowed_average(USER, end, 7).unwrap();
    assert!((average.calories - 2500.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_dates_outside_the_window_are_excluded() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = ledger(&dir).await;
    let end = date("2026-08-07");

    ledger.add(USER, date("2026-07-31"), &meal(9000.0)).await.unwrap(); // day before the window
    ledger.add(USER, date("2026-08-01"), &meal(1500.0)).await.unwrap(); // first day inside

    let average = ledger.windowed_average(USER, end, 7).unwrap();
    assert!((average.calories - 1500.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_empty_window_is_no_data_not_zero() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = ledger(&dir).await;

    assert_eq!(ledger.windowed_average(USER, date("2026-08-07"), 7), None);

    // A date far outside the window changes nothing
    ledger.add(USER, date("2026-01-01"), &meal(2000.0)).await.unwrap();
    assert_eq!(ledger.windowed_average(USER, date("2026-08-07"), 7), None);
}

#[tokio::test]
async fn test_reset_day_keeps_the_date_present_at_zero() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = ledger(&dir).await;
    let end = date("2026-08-07");

    ledger.add(USER, end, &meal(2000.0)).await.unwrap();
    ledger.reset_day(USER, end).await.unwrap();

    // An explicitly reset day is a tracked day at zero, distinct from no data
    let average = ledger.windowed_average(USER, end, 7).unwrap();
    assert_eq!(average, DayTotals::default());
}
