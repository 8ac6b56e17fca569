//! Persisted send ledger.
//!
//! Maps offering identity to a bucket of dedupe keys, each with the RFC 3339
//! UTC timestamp of the send it records. The file lives at a fixed relative
//! path, is loaded once per run, mutated in memory, and saved once at the
//! end. `BTreeMap` keeps key ordering deterministic so repeated saves of
//! identical content are byte-identical.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ReminderError, ReminderResult};

/// Days a recorded send stays in the ledger before pruning.
pub const RETENTION_DAYS: i64 = 90;

/// On-disk location, relative to the working directory.
pub const LEDGER_PATH: &str = "data/sent_ledger.json";

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    entries: BTreeMap<String, BTreeMap<String, String>>,
}

impl Ledger {
    /// Load the ledger from disk. A missing file is an empty ledger; a file
    /// that exists but does not parse is fatal, since proceeding with an
    /// empty ledger would re-send every recorded notification.
    pub fn load(path: &Path) -> ReminderResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|e| ReminderError::CorruptLedger(format!("{}: {e}", path.display())))
    }

    /// Persist the full mapping, creating the parent directory first.
    pub fn save(&self, path: &Path) -> ReminderResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ReminderError::Serialization(e.to_string()))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Drop records whose timestamp is unparsable or older than
    /// `now - retention_days`, then drop offering entries left empty.
    /// Idempotent: pruning twice yields the same result as once.
    pub fn prune(&mut self, now: DateTime<Utc>, retention_days: i64) {
        let cutoff = now - Duration::days(retention_days);
        self.entries.retain(|_, bucket| {
            bucket.retain(|_, sent_at| {
                DateTime::parse_from_rfc3339(sent_at)
                    .map(|t| t.with_timezone(&Utc) >= cutoff)
                    .unwrap_or(false)
            });
            !bucket.is_empty()
        });
    }

    pub fn contains(&self, offering_identity: &str, dedupe_key: &str) -> bool {
        self.entries
            .get(offering_identity)
            .is_some_and(|bucket| bucket.contains_key(dedupe_key))
    }

    /// Record a successful send under the offering's bucket.
    pub fn record(&mut self, offering_identity: &str, dedupe_key: &str, sent_at: DateTime<Utc>) {
        self.entries
            .entry(offering_identity.to_string())
            .or_default()
            .insert(dedupe_key.to_string(), sent_at.to_rfc3339());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of recorded sends across all offerings.
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }
}
