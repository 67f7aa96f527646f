// ABOUTME: Whole-snapshot JSON persistence for the nutrition ledger
// ABOUTME: Writes to a temporary sibling file and atomically renames it into place
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Morsel Project

//! Snapshot persistence for the ledger.
//!
//! The on-disk format is a single JSON document mapping
//! `UserId -> CalendarDate -> DayTotals`. Every write serializes the whole
//! ledger to a temporary sibling file and renames it over the live file, so
//! a crash mid-write never corrupts previously committed totals.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::debug;

use crate::errors::{AppError, AppResult};
use crate::models::{DayTotals, UserId};

/// Full ledger content, as serialized to disk
pub type LedgerSnapshot = BTreeMap<UserId, BTreeMap<NaiveDate, DayTotals>>;

/// File-backed snapshot store
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Create a store persisting to `path`
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Path of the live snapshot file
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Load the persisted snapshot; a missing file is an empty ledger.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when the file exists but cannot be read
    /// or parsed. A corrupt snapshot fails loudly instead of silently
    /// starting over, so committed totals are never wiped by a rewrite.
    pub async fn load(&self) -> AppResult<LedgerSnapshot> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No ledger snapshot yet, starting empty");
                return Ok(LedgerSnapshot::new());
            }
            Err(e) => {
                return Err(AppError::persistence(format!(
                    "failed to read ledger snapshot {}",
                    self.path.display()
                ))
                .with_source(e))
            }
        };

        serde_json::from_slice(&bytes).map_err(|e| {
            AppError::persistence(format!(
                "ledger snapshot {} is corrupt",
                self.path.display()
            ))
            .with_source(e)
        })
    }

    /// Persist the snapshot with an atomic replace.
    ///
    /// # Errors
    ///
    /// Returns a persistence error on serialization or I/O failure; the
    /// prior on-disk snapshot remains intact in every failure case.
    pub async fn persist(&self, snapshot: &LedgerSnapshot) -> AppResult<()> {
        let json = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| AppError::persistence("failed to serialize ledger").with_source(e))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    AppError::persistence(format!(
                        "failed to create ledger directory {}",
                        parent.display()
                    ))
                    .with_source(e)
                })?;
            }
        }

        let tmp_path = self.tmp_path();
        tokio::fs::write(&tmp_path, &json).await.map_err(|e| {
            AppError::persistence(format!("failed to write {}", tmp_path.display())).with_source(e)
        })?;

        tokio::fs::rename(&tmp_path, &self.path).await.map_err(|e| {
            AppError::persistence(format!(
                "failed to replace {}",
                self.path.display()
            ))
            .with_source(e)
        })?;

        debug!(path = %self.path.display(), bytes = json.len(), "Ledger snapshot persisted");
        Ok(())
    }

    /// Sibling temporary path used for the atomic replace
    fn tmp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}
