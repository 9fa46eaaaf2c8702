//! Report lifecycle manager.
//!
//! The single object the presentation layer talks to. It owns the weather
//! source and the report store, and exposes the transient view state
//! (`current_snapshot`, `is_loading`, `last_error`) plus the saved history.
//!
//! Fetches may overlap. Each one takes a ticket from a monotonic sequence and
//! its result is applied only if no newer fetch has been applied already.

use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

use crate::{
    error::WeatherError,
    model::{ReportId, SavedReport, WeatherQuery, WeatherSnapshot},
    source::WeatherSource,
    store::ReportStore,
};

/// What happened to the result of a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// A fresh snapshot is now current.
    Applied,
    /// Current conditions are now current, the forecast is empty; see `last_error`.
    Degraded,
    /// The lookup failed; `last_error` is set and the previous snapshot kept.
    Failed,
    /// A newer fetch was applied first, so this result was dropped.
    Discarded,
}

#[derive(Debug, Default)]
struct ViewState {
    current: Option<WeatherSnapshot>,
    last_error: Option<String>,
    in_flight: usize,
    applied_seq: u64,
}

/// Counts one outstanding fetch for as long as it lives. Dropping the fetch
/// future mid-await still releases the count.
struct InFlight<'a>(&'a Mutex<ViewState>);

impl<'a> InFlight<'a> {
    fn enter(state: &'a Mutex<ViewState>) -> Self {
        let mut guard = state.lock();
        guard.in_flight += 1;
        guard.last_error = None;
        Self(state)
    }

    /// Release the count and keep the state locked for applying the result.
    fn finish(self) -> MutexGuard<'a, ViewState> {
        let state = self.0;
        std::mem::forget(self);
        let mut guard = state.lock();
        guard.in_flight = guard.in_flight.saturating_sub(1);
        guard
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut guard = self.0.lock();
        guard.in_flight = guard.in_flight.saturating_sub(1);
    }
}

#[derive(Debug)]
pub struct ReportManager {
    source: WeatherSource,
    store: Mutex<ReportStore>,
    state: Mutex<ViewState>,
    next_seq: AtomicU64,
}

impl ReportManager {
    pub fn new(source: WeatherSource, store: ReportStore) -> Self {
        Self {
            source,
            store: Mutex::new(store),
            state: Mutex::new(ViewState::default()),
            next_seq: AtomicU64::new(0),
        }
    }

    pub fn source(&self) -> &WeatherSource {
        &self.source
    }

    pub fn current_snapshot(&self) -> Option<WeatherSnapshot> {
        self.state.lock().current.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().in_flight > 0
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.lock().last_error.clone()
    }

    /// Saved reports, most recently saved first.
    pub fn history(&self) -> Vec<SavedReport> {
        self.store.lock().history().to_vec()
    }

    pub fn report(&self, id: ReportId) -> Option<SavedReport> {
        self.store.lock().get(id).cloned()
    }

    /// Look up weather and make it the current snapshot. Never returns an
    /// error; failures land in `last_error`.
    pub async fn fetch(&self, query: WeatherQuery) -> FetchStatus {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let in_flight = InFlight::enter(&self.state);

        debug!(seq, ?query, "fetch started");
        let outcome = self.source.resolve(&query).await;

        let mut state = in_flight.finish();

        if seq < state.applied_seq {
            debug!(seq, applied = state.applied_seq, "discarding stale fetch result");
            return FetchStatus::Discarded;
        }
        state.applied_seq = seq;

        match outcome {
            Ok(resolved) => {
                let status = match &resolved.warning {
                    Some(warning) => {
                        state.last_error = Some(warning.to_string());
                        FetchStatus::Degraded
                    }
                    None => {
                        state.last_error = None;
                        FetchStatus::Applied
                    }
                };
                info!(
                    seq,
                    location = %resolved.snapshot.location.name,
                    provider = %resolved.snapshot.provider,
                    "weather updated"
                );
                state.current = Some(resolved.snapshot);
                status
            }
            Err(err) => {
                warn!(seq, error = %err, "fetch failed");
                state.last_error = Some(err.to_string());
                FetchStatus::Failed
            }
        }
    }

    /// Persist the current snapshot as a new report.
    pub fn save(&self) -> Result<SavedReport, WeatherError> {
        let snapshot = self
            .current_snapshot()
            .ok_or(WeatherError::NoActiveSnapshot)?;
        self.store.lock().insert(snapshot)
    }

    /// Remove a saved report. Confirmation is the caller's job.
    pub fn delete_report(&self, id: ReportId) -> Result<bool, WeatherError> {
        self.store.lock().remove(id)
    }

    /// Look the report's location up again. The saved report itself is left
    /// untouched; only the current snapshot changes.
    pub async fn refresh(&self, report: &SavedReport) -> FetchStatus {
        info!(id = %report.id, query = %report.snapshot.query, "refreshing saved report");
        self.fetch(report.snapshot.query.clone().into()).await
    }
}
