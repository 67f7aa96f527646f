// ABOUTME: Durable per-user, per-day nutrition totals with windowed averages
// ABOUTME: Sharded in-memory map committed through atomic whole-snapshot writes
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Morsel Project

//! # Nutrition Ledger
//!
//! Durable totals keyed by `(UserId, CalendarDate)`.
//!
//! The in-memory map is sharded ([`dashmap`]), so additions on different
//! keys proceed concurrently and reads never block. Snapshot writes are
//! serialized behind a gate; an in-memory mutation commits only if its
//! snapshot write succeeds and is rolled back otherwise, leaving both
//! memory and disk at the prior state.
//!
//! A date with no entry is absent, and every reader treats absence exactly
//! like all-zero totals. The windowed average distinguishes the two: it
//! divides by the number of dates that actually have an entry and returns
//! `None` when none do.

pub mod snapshot;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{info, instrument};

use crate::errors::AppResult;
use crate::models::{DayTotals, UserId};
use snapshot::{LedgerSnapshot, SnapshotStore};

/// Durable per-user, per-day nutrition totals
#[derive(Debug)]
pub struct NutritionLedger {
    days: DashMap<UserId, BTreeMap<NaiveDate, DayTotals>>,
    store: SnapshotStore,
    /// Serializes snapshot writes; map mutations stay per-key concurrent
    write_gate: Mutex<()>,
}

impl NutritionLedger {
    /// Open the ledger, loading any persisted snapshot
    ///
    /// # Errors
    ///
    /// Returns a persistence error when an existing snapshot cannot be
    /// read or parsed.
    pub async fn open(store: SnapshotStore) -> AppResult<Self> {
        let persisted = store.load().await?;
        let days = DashMap::new();
        let mut entries = 0usize;
        for (user, dates) in persisted {
            entries += dates.len();
            days.insert(user, dates);
        }
        info!(
            path = %store.path().display(),
            day_entries = entries,
            "Nutrition ledger opened"
        );
        Ok(Self {
            days,
            store,
            write_gate: Mutex::new(()),
        })
    }

    /// Add a delta to the `(user, date)` entry, creating it if absent.
    ///
    /// Returns the new totals for that entry. The addition is atomic per
    /// key; concurrent additions on other keys are not blocked by the map
    /// update, only by the serialized snapshot write.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when the snapshot write fails; the
    /// in-memory delta is rolled back and the prior on-disk state is kept.
    #[instrument(skip(self, delta), fields(user = %user, date = %date))]
    pub async fn add(
        &self,
        user: UserId,
        date: NaiveDate,
        delta: &DayTotals,
    ) -> AppResult<DayTotals> {
        let (previous, new_totals) = {
            let mut dates = self.days.entry(user).or_default();
            let previous = dates.get(&date).copied();
            let entry = dates.entry(date).or_default();
            entry.add(delta);
            (previous, *entry)
        };

        if let Err(e) = self.persist().await {
            // Roll the delta back so memory matches the surviving snapshot
            let mut dates = self.days.entry(user).or_default();
            match previous {
                Some(prior) => {
                    dates.insert(date, prior);
                }
                None => {
                    dates.remove(&date);
                }
            }
            return Err(e);
        }

        Ok(new_totals)
    }

    /// Current totals for `(user, date)`; zero totals when absent
    #[must_use]
    pub fn totals(&self, user: UserId, date: NaiveDate) -> DayTotals {
        self.days
            .get(&user)
            .and_then(|dates| dates.get(&date).copied())
            .unwrap_or_default()
    }

    /// Zero the `(user, date)` entry.
    ///
    /// An existing entry is overwritten with zero totals and stays present;
    /// when no entry exists there is nothing to overwrite and the date
    /// remains absent.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when the snapshot write fails; the prior
    /// totals are restored in memory.
    #[instrument(skip(self), fields(user = %user, date = %date))]
    pub async fn reset_day(&self, user: UserId, date: NaiveDate) -> AppResult<()> {
        let previous = {
            let mut dates = self.days.entry(user).or_default();
            let prior = dates.get(&date).copied();
            if prior.is_some() {
                dates.insert(date, DayTotals::default());
            }
            prior
        };

        let Some(prior) = previous else {
            return Ok(()); // nothing persisted for this date
        };

        if let Err(e) = self.persist().await {
            let mut dates = self.days.entry(user).or_default();
            dates.insert(date, prior);
            return Err(e);
        }

        Ok(())
    }

    /// Average totals over the `window_days` calendar dates ending at
    /// `end_date` inclusive.
    ///
    /// Divides by the count of dates that have an entry, not by the window
    /// size; returns `None` when no date in the window has an entry, which
    /// is distinct from an all-zero average.
    #[must_use]
    pub fn windowed_average(
        &self,
        user: UserId,
        end_date: NaiveDate,
        window_days: u32,
    ) -> Option<DayTotals> {
        let dates = self.days.get(&user)?;

        let mut sum = DayTotals::default();
        let mut present = 0u32;
        for offset in 0..window_days {
            let date = end_date - chrono::Duration::days(i64::from(offset));
            if let Some(totals) = dates.get(&date) {
                sum.add(totals);
                present += 1;
            }
        }

        (present > 0).then(|| sum.divided_by(f64::from(present)))
    }

    /// Serialize the current map and write it through the snapshot store
    async fn persist(&self) -> AppResult<()> {
        let _gate = self.write_gate.lock().await;
        let snapshot: LedgerSnapshot = self
            .days
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        self.store.persist(&snapshot).await
    }
}
