//! Fetched record batches.

use anyhow::{Context as _, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ErrorCode;
use crate::model::directory::{Resident, UserAccount};
use crate::model::record::RequestRecord;
use crate::model::request::{DocumentRequest, ingest_records};
use crate::views::Keyed;

/// The records a list currently shows, tagged with a revision that changes
/// whenever the content does.
#[derive(Debug, Clone)]
pub struct Snapshot<R> {
    revision: u64,
    records: Vec<R>,
}

impl<R> Default for Snapshot<R> {
    fn default() -> Self {
        Self {
            revision: 0,
            records: Vec::new(),
        }
    }
}

impl<R> Snapshot<R> {
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub fn records(&self) -> &[R] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub(crate) fn replace_all(&mut self, records: Vec<R>) {
        self.records = records;
        self.revision += 1;
    }
}

impl<R: Keyed> Snapshot<R> {
    #[must_use]
    pub fn find(&self, key: u64) -> Option<&R> {
        self.records.iter().find(|record| record.key() == key)
    }

    pub(crate) fn replace(&mut self, record: R) -> bool {
        let key = record.key();
        let Some(slot) = self.records.iter_mut().find(|r| r.key() == key) else {
            return false;
        };
        *slot = record;
        self.revision += 1;
        true
    }
}

/// On-disk form of a fetched batch, as the backend API returns it.
///
/// Either an object with `requests`, `residents` and `users` arrays (all
/// optional), or a bare array of request records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotFile {
    pub requests: Vec<RequestRecord>,
    pub residents: Vec<Resident>,
    pub users: Vec<UserAccount>,
}

impl SnapshotFile {
    /// Parse snapshot JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is neither snapshot shape. The shape is
    /// picked from the opening bracket, so the error names the line and
    /// column that failed to decode.
    pub fn from_json(json: &str) -> Result<Self> {
        let context = || ErrorCode::SnapshotParseError.message();
        match json.trim_start().chars().next() {
            Some('[') => {
                let requests: Vec<RequestRecord> =
                    serde_json::from_str(json).with_context(context)?;
                Ok(Self {
                    requests,
                    ..Self::default()
                })
            }
            Some('{') => serde_json::from_str(json).with_context(context),
            _ => Err(anyhow!("expected a JSON object or array")).with_context(context),
        }
    }

    /// Requests usable on a timeline; unusable records are skipped.
    #[must_use]
    pub fn document_requests(&self) -> Vec<DocumentRequest> {
        ingest_records(self.requests.clone())
    }
}

/// Read a snapshot file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_snapshot(path: &Path) -> Result<SnapshotFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    SnapshotFile::from_json(&content).with_context(|| {
        format!(
            "{}: failed to parse snapshot {}",
            ErrorCode::SnapshotParseError.code(),
            path.display()
        )
    })
}
