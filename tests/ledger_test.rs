// ABOUTME: Integration tests for the nutrition ledger and snapshot persistence
// ABOUTME: Covers additive totals, resets, restart round-trips, and write rollback
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Morsel Project

mod common;

use std::sync::Arc;

use chrono::NaiveDate;
use common::init_test_logging;
use morsel::ledger::{snapshot::SnapshotStore, NutritionLedger};
use morsel::models::{DayTotals, UserId};

fn date(s: &str) -> NaiveDate {
    s.parse().expect("valid date")
}

fn delta(calories: f64, protein: f64, fat: f64, carbs: f64) -> DayTotals {
    DayTotals {
        calories,
        protein,
        fat,
        carbs,
    }
}

async fn open_ledger(dir: &tempfile::TempDir) -> NutritionLedger {
    init_test_logging();
    NutritionLedger::open(SnapshotStore::new(dir.path().join("ledger.json")))
        .await
        .expect("open ledger")
}

#[tokio::test]
async fn test_totals_are_the_component_wise_sum_of_deltas() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = open_ledger(&dir).await;
    let user = UserId(1);
    let day = date("2026-08-01");

    ledger.add(user, day, &delta(95.0, 0.5, 0.3, 25.0)).await.unwrap();
    ledger.add(user, day, &delta(450.0, 20.0, 15.0, 40.0)).await.unwrap();
    ledger.add(user, day, &delta(12.5, 1.0, 0.0, 2.0)).await.unwrap();

    let totals = ledger.totals(user, day);
    assert!((totals.calories - 557.5).abs() < 1e-9);
    assert!((totals.protein - 21.5).abs() < 1e-9);
    assert!((totals.fat - 15.3).abs() < 1e-9);
    assert!((totals.carbs - 67.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_interleaved_additions_across_keys_all_land() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = Arc::new(open_ledger(&dir).await);
    let day = date("2026-08-02");

    let mut handles = Vec::new();
    for user_id in 0..4i64 {
        for _ in 0..5 {
            let ledger = Arc::clone(&ledger);
            handles.push(tokio::spawn(async move {
                ledger
                    .add(UserId(user_id), day, &delta(10.0, 1.0, 0.5, 2.0))
                    .await
                    .unwrap();
            }));
        }
    }
    for handle in handles {
        handle.await.unwrap();
    }

    for user_id in 0..4i64 {
        let totals = ledger.totals(UserId(user_id), day);
        assert!((totals.calories - 50.0).abs() < 1e-9, "user {user_id}");
        assert!((totals.protein - 5.0).abs() < 1e-9);
    }
}

#[tokio::test]
async fn test_absent_entry_reads_as_zero() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = open_ledger(&dir).await;

    assert_eq!(
        ledger.totals(UserId(99), date("2026-01-01")),
        DayTotals::default()
    );
}

#[tokio::test]
async fn test_reset_day_zeroes_any_prior_totals() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = open_ledger(&dir).await;
    let user = UserId(3);
    let day = date("2026-08-03");

    ledger.add(user, day, &delta(1800.0, 90.0, 60.0, 200.0)).await.unwrap();
    ledger.reset_day(user, day).await.unwrap();

    assert_eq!(ledger.totals(user, day), DayTotals::default());

    // Resetting an untouched date stays a no-op: still no entry in a window
    let untouched = UserId(4);
    ledger.reset_day(untouched, day).await.unwrap();
    assert_eq!(ledger.windowed_average(untouched, day, 7), None);
}

#[tokio::test]
async fn test_snapshot_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let user = UserId(5);
    let day = date("2026-08-04");

    {
        let ledger = open_ledger(&dir).await;
        ledger.add(user, day, &delta(345.5, 12.25, 8.5, 40.125)).await.unwrap();
    }

    // A fresh process sees the committed totals
    let reopened = open_ledger(&dir).await;
    let totals = reopened.totals(user, day);
    assert!((totals.calories - 345.5).abs() < 1e-12);
    assert!((totals.protein - 12.25).abs() < 1e-12);
    assert!((totals.carbs - 40.125).abs() < 1e-12);
}

#[tokio::test]
async fn test_failed_snapshot_write_rolls_the_delta_back() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();

    // Open against a not-yet-existing subdirectory, then block its creation
    // with a regular file so the snapshot write fails
    let blocker = dir.path().join("blocker");
    let ledger = NutritionLedger::open(SnapshotStore::new(blocker.join("ledger.json")))
        .await
        .expect("open ledger");
    std::fs::write(&blocker, b"in the way").unwrap();

    let user = UserId(6);
    let day = date("2026-08-05");
    let err = ledger.add(user, day, &delta(100.0, 5.0, 2.0, 10.0)).await.unwrap_err();
    assert!(err.is_persistence_failure());

    // The in-memory delta was rolled back along with the failed write
    assert_eq!(ledger.totals(user, day), DayTotals::default());
    assert_eq!(ledger.windowed_average(user, day, 7), None);
}

#[tokio::test]
async fn test_corrupt_snapshot_fails_loudly_instead_of_wiping() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");
    std::fs::write(&path, b"{ not json").unwrap();

    let err = NutritionLedger::open(SnapshotStore::new(path.clone()))
        .await
        .unwrap_err();
    assert!(err.is_persistence_failure());

    // The corrupt file was not replaced
    assert_eq!(std::fs::read(&path).unwrap(), b"{ not json");
}
