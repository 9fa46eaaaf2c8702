//! Bounded, persisted history of saved reports.
//!
//! The whole history is serialized as one versioned JSON document under
//! [`HISTORY_KEY`] and rewritten on every mutation. A mutation only takes
//! effect in memory once the write succeeded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::{
    error::WeatherError,
    model::{ReportId, SavedReport, WeatherSnapshot},
    storage::KeyValueStore,
};

pub const HISTORY_KEY: &str = "weatherReports";
pub const HISTORY_CAPACITY: usize = 10;
const SCHEMA_VERSION: u32 = 1;

#[derive(Serialize)]
struct HistoryBlobRef<'a> {
    version: u32,
    reports: &'a [SavedReport],
}

#[derive(Deserialize)]
struct HistoryBlob {
    version: u32,
    reports: Vec<SavedReport>,
}

pub struct ReportStore {
    backend: Box<dyn KeyValueStore>,
    reports: Vec<SavedReport>,
    last_id: u64,
}

impl std::fmt::Debug for ReportStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportStore")
            .field("reports", &self.reports.len())
            .field("last_id", &self.last_id)
            .finish_non_exhaustive()
    }
}

impl ReportStore {
    /// Open the store and load whatever history the backend holds.
    pub fn open(backend: impl KeyValueStore + 'static) -> Self {
        let mut store = Self {
            backend: Box::new(backend),
            reports: Vec::new(),
            last_id: 0,
        };
        store.reports = store.load();
        store.last_id = store.reports.iter().map(|r| r.id.0).max().unwrap_or(0);
        store
    }

    /// Read the persisted history. Absent, unreadable or corrupt content
    /// yields an empty history.
    pub fn load(&self) -> Vec<SavedReport> {
        let raw = match self.backend.get(HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(error = %err, "could not read report history, starting empty");
                return Vec::new();
            }
        };

        let blob: HistoryBlob = match serde_json::from_str(&raw) {
            Ok(blob) => blob,
            Err(err) => {
                warn!(error = %err, "report history is corrupt, starting empty");
                return Vec::new();
            }
        };

        if blob.version != SCHEMA_VERSION {
            warn!(version = blob.version, "unsupported report history version, starting empty");
            return Vec::new();
        }

        let mut seen = HashSet::new();
        let reports: Vec<SavedReport> = blob
            .reports
            .into_iter()
            .filter(|r| seen.insert(r.id))
            .take(HISTORY_CAPACITY)
            .collect();

        debug!(count = reports.len(), "loaded report history");
        reports
    }

    /// Saved reports, most recently saved first.
    pub fn history(&self) -> &[SavedReport] {
        &self.reports
    }

    pub fn get(&self, id: ReportId) -> Option<&SavedReport> {
        self.reports.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn insert(&mut self, snapshot: WeatherSnapshot) -> Result<SavedReport, WeatherError> {
        self.insert_at(snapshot, Utc::now())
    }

    /// Save `snapshot` as a new report stamped with `now`.
    pub fn insert_at(
        &mut self,
        snapshot: WeatherSnapshot,
        now: DateTime<Utc>,
    ) -> Result<SavedReport, WeatherError> {
        let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        let floor = self.last_id.checked_add(1).ok_or_else(|| {
            WeatherError::PersistenceFailed(format!("no report id left after {}", self.last_id))
        })?;
        let id = ReportId(millis.max(floor));

        let report = SavedReport {
            id,
            saved_at: now,
            snapshot,
        };

        let mut next = Vec::with_capacity(HISTORY_CAPACITY);
        next.push(report.clone());
        next.extend(self.reports.iter().take(HISTORY_CAPACITY - 1).cloned());

        self.persist(&next)?;

        let evicted = self.reports.len() + 1 - next.len();
        self.reports = next;
        self.last_id = id.0;

        info!(%id, location = %report.snapshot.location.name, evicted, "saved report");
        Ok(report)
    }

    /// Delete a report. Returns `false` if no report had that id.
    pub fn remove(&mut self, id: ReportId) -> Result<bool, WeatherError> {
        if self.get(id).is_none() {
            debug!(%id, "nothing to remove");
            return Ok(false);
        }

        let next: Vec<SavedReport> = self.reports.iter().filter(|r| r.id != id).cloned().collect();
        self.persist(&next)?;
        self.reports = next;

        info!(%id, "removed report");
        Ok(true)
    }

    fn persist(&self, reports: &[SavedReport]) -> Result<(), WeatherError> {
        let blob = HistoryBlobRef {
            version: SCHEMA_VERSION,
            reports,
        };
        let json = serde_json::to_string(&blob)
            .map_err(|e| WeatherError::PersistenceFailed(e.to_string()))?;

        self.backend.set(HISTORY_KEY, &json).map_err(|e| {
            warn!(error = %e, "failed to write report history");
            WeatherError::PersistenceFailed(format!("{e:#}"))
        })
    }
}
