//! Shared fetch lifecycle for master and detail coordinators.

use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::RwLockReadGuard;
use std::sync::RwLockWriteGuard;
use std::time::Duration;

use chrono::DateTime;
use chrono::Utc;
use log::debug;
use log::error;
use serde_json::Value;
use tokio::task::JoinHandle;

use super::fingerprint::RequestFingerprint;
use super::fingerprint::RequestTracker;
use super::fingerprint::Scope;
use super::fingerprint::Ticket;
use crate::error::ApiError;
use crate::error::ConfigError;
use crate::error::FetchFailure;
use crate::query::PageRequest;
use crate::source::DataSource;

/// Maps a raw record to a normalized row.
pub type RowMapper<R> = Arc<dyn Fn(Value) -> Result<R, ApiError> + Send + Sync>;

/// Identity mapping for raw JSON rows.
pub fn raw_rows() -> RowMapper<Value> {
    Arc::new(|record: Value| Ok::<Value, ApiError>(record))
}

/// Timing and cancellation behavior of a coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Pause between a parameter change and the network call. Rapid changes
    /// within this window collapse into the last one.
    pub dispatch_delay: Duration,
    /// Drop the in-flight network future once a newer fetch starts. When
    /// disabled, the call runs to completion and its response is ignored.
    pub abort_in_flight: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            dispatch_delay: Duration::from_millis(50),
            abort_in_flight: true,
        }
    }
}

/// Rows and status of one coordinator, as seen by the display.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchState<R> {
    /// Rows of the last applied page.
    pub rows: Vec<R>,
    /// Total rows across all pages, as reported with the last applied page.
    pub total_count: u64,
    /// A current fetch has not finished yet.
    pub loading: bool,
    /// Failure of the last current fetch, cleared by the next success.
    pub error: Option<FetchFailure>,
    /// When rows were last replaced.
    pub updated_at: Option<DateTime<Utc>>,
}

impl<R> Default for FetchState<R> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            total_count: 0,
            loading: false,
            error: None,
            updated_at: None,
        }
    }
}

/// How a dispatched fetch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The page replaced the coordinator's rows.
    Applied {
        /// Rows on the page.
        rows: usize,
        /// Reported total count.
        total_count: u64,
    },
    /// The fetch failed while current; prior rows were kept.
    Failed(FetchFailure),
    /// A newer fetch became current before a response arrived.
    Superseded,
    /// The response arrived after a newer fetch became current and was ignored.
    Discarded,
    /// The tab has no usable relation; rows were emptied without a network call.
    Unconfigured(ConfigError),
    /// The same fingerprint was already in flight.
    Duplicate,
    /// The fetch task was aborted or panicked.
    Aborted,
}

impl FetchOutcome {
    /// Returns `true` if the fetch updated visible rows.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Awaitable handle on a dispatched fetch.
///
/// Dropping the handle does not cancel the fetch.
#[derive(Debug)]
pub struct FetchHandle {
    inner: HandleInner,
}

#[derive(Debug)]
enum HandleInner {
    Ready(FetchOutcome),
    Spawned(JoinHandle<FetchOutcome>),
}

impl FetchHandle {
    pub(crate) fn ready(outcome: FetchOutcome) -> Self {
        Self {
            inner: HandleInner::Ready(outcome),
        }
    }

    fn spawned(handle: JoinHandle<FetchOutcome>) -> Self {
        Self {
            inner: HandleInner::Spawned(handle),
        }
    }

    /// Returns `true` once the outcome is available without waiting.
    pub fn is_finished(&self) -> bool {
        match &self.inner {
            HandleInner::Ready(_) => true,
            HandleInner::Spawned(handle) => handle.is_finished(),
        }
    }

    /// Waits for the fetch to end.
    pub async fn wait(self) -> FetchOutcome {
        match self.inner {
            HandleInner::Ready(outcome) => outcome,
            HandleInner::Spawned(handle) => handle.await.unwrap_or_else(|e| {
                error!("Fetch task did not complete: {}", e);
                FetchOutcome::Aborted
            }),
        }
    }
}

/// Where a fetch should go.
pub(crate) enum Target {
    Endpoint(String),
    Unconfigured(ConfigError),
}

/// Request tracking plus owned state for one coordinator.
pub(crate) struct FetchCore<R> {
    source: Arc<dyn DataSource>,
    mapper: RowMapper<R>,
    options: FetchOptions,
    tracker: RequestTracker,
    state: RwLock<FetchState<R>>,
}

impl<R: Clone + Send + Sync + 'static> FetchCore<R> {
    pub(crate) fn new(source: Arc<dyn DataSource>, mapper: RowMapper<R>, options: FetchOptions) -> Self {
        Self {
            source,
            mapper,
            options,
            tracker: RequestTracker::new(),
            state: RwLock::new(FetchState::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, FetchState<R>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, FetchState<R>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn snapshot(&self) -> FetchState<R> {
        self.read().clone()
    }

    pub(crate) fn current(&self) -> Option<RequestFingerprint> {
        self.tracker.current()
    }

    /// Forgets the current fetch; its response will be ignored.
    pub(crate) fn cancel(&self) {
        self.tracker.invalidate();
        self.write().loading = false;
    }

    /// Marks a new fetch current and runs it on the Tokio runtime.
    ///
    /// Must be called from within a runtime.
    pub(crate) fn dispatch(self: &Arc<Self>, scope: Scope, request: PageRequest, target: Target) -> FetchHandle {
        let Some(ticket) = self.tracker.begin(scope, request.clone()) else {
            return FetchHandle::ready(FetchOutcome::Duplicate);
        };

        let endpoint = match target {
            Target::Endpoint(endpoint) => endpoint,
            Target::Unconfigured(err) => {
                error!("{} [{}]", err, ticket.fingerprint);
                let mut state = self.write();
                state.rows.clear();
                state.total_count = 0;
                state.loading = false;
                state.error = None;
                return FetchHandle::ready(FetchOutcome::Unconfigured(err));
            }
        };

        self.write().loading = true;
        debug!(
            "Starting fetch {} for {}?{}",
            ticket.fingerprint,
            endpoint,
            request.query_string()
        );

        let core = Arc::clone(self);
        FetchHandle::spawned(tokio::spawn(async move {
            core.run(ticket, endpoint, request).await
        }))
    }

    async fn run(&self, ticket: Ticket, endpoint: String, request: PageRequest) -> FetchOutcome {
        if !self.options.dispatch_delay.is_zero() {
            tokio::select! {
                _ = ticket.superseded() => {}
                _ = tokio::time::sleep(self.options.dispatch_delay) => {}
            }
        }

        if !self.tracker.is_current(&ticket) {
            debug!("Request {} cancelled or superseded", ticket.fingerprint);
            return FetchOutcome::Superseded;
        }

        debug!("Making API call to {} [{}]", endpoint, ticket.fingerprint);
        let fetch = self.source.fetch_page(&endpoint, &request);
        let result = if self.options.abort_in_flight {
            tokio::select! {
                _ = ticket.superseded() => {
                    debug!("Aborted in-flight request {}", ticket.fingerprint);
                    return FetchOutcome::Superseded;
                }
                result = fetch => result,
            }
        } else {
            fetch.await
        };

        let mapped = result.and_then(|page| {
            let total_count = page.total_count();
            page.into_records()
                .into_iter()
                .map(|record| (self.mapper)(record))
                .collect::<Result<Vec<R>, ApiError>>()
                .map(|rows| (rows, total_count))
        });

        // Currency is checked under the state lock so a response can never
        // land after a newer fetch has already been applied.
        let mut state = self.write();
        if !self.tracker.is_current(&ticket) {
            debug!("Discarding stale response for {}", ticket.fingerprint);
            return FetchOutcome::Discarded;
        }

        state.loading = false;
        match mapped {
            Ok((rows, total_count)) => {
                debug!(
                    "Applied {} rows (total {}) for {}",
                    rows.len(),
                    total_count,
                    ticket.fingerprint
                );
                let count = rows.len();
                state.rows = rows;
                state.total_count = total_count;
                state.error = None;
                state.updated_at = Some(Utc::now());
                FetchOutcome::Applied {
                    rows: count,
                    total_count,
                }
            }
            Err(err) => {
                error!("Error fetching data for {}: {}", ticket.fingerprint, err);
                let failure = FetchFailure::from(&err);
                state.error = Some(failure.clone());
                FetchOutcome::Failed(failure)
            }
        }
    }
}
