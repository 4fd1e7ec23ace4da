//! Request fingerprints and the last-writer-wins tracker.

use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use tokio_util::sync::CancellationToken;

use crate::model::RowId;
use crate::query::PageRequest;

/// Which table a fetch belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// The master table.
    Master,
    /// A detail tab of an expanded master row.
    Detail {
        /// Expanded master row.
        row_id: RowId,
        /// Tab index.
        tab: usize,
    },
}

/// Identity of one logical fetch attempt.
///
/// `generation` comes from a per-coordinator counter, so two fingerprints
/// from the same coordinator never compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestFingerprint {
    /// Owning table.
    pub scope: Scope,
    /// Requested page and sort.
    pub request: PageRequest,
    /// Monotonic per-coordinator counter value.
    pub generation: u64,
}

impl std::fmt::Display for RequestFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.scope {
            Scope::Master => write!(f, "master-")?,
            Scope::Detail { row_id, tab } => write!(f, "detail-{}-{}-", row_id, tab)?,
        }
        write!(
            f,
            "{}-{}-{}-{}",
            self.request.pagination.page_index,
            self.request.pagination.page_size,
            self.request.sort.key(),
            self.generation
        )
    }
}

/// Handle on a fetch that was marked current.
///
/// The token is cancelled as soon as a newer fetch replaces this one.
#[derive(Debug, Clone)]
pub struct Ticket {
    /// The fingerprint this ticket stands for.
    pub fingerprint: RequestFingerprint,
    cancel: CancellationToken,
}

impl Ticket {
    /// Resolves once the ticket has been superseded.
    pub async fn superseded(&self) {
        self.cancel.cancelled().await
    }

    /// Returns `true` if a newer fetch replaced this one.
    pub fn is_superseded(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Tracks the single current fetch of one coordinator.
#[derive(Debug, Default)]
pub struct RequestTracker {
    counter: AtomicU64,
    current: Mutex<Option<Ticket>>,
}

impl RequestTracker {
    /// Creates a tracker with no current fetch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a new fetch for `scope`/`request` as current.
    ///
    /// Returns `None` if the computed fingerprint is the one already in
    /// flight. The previous ticket, if any, is cancelled.
    pub fn begin(&self, scope: Scope, request: PageRequest) -> Option<Ticket> {
        let generation = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let fingerprint = RequestFingerprint {
            scope,
            request,
            generation,
        };

        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if current.as_ref().is_some_and(|t| t.fingerprint == fingerprint) {
            log::debug!("Skipping duplicate request {}", fingerprint);
            return None;
        }

        let ticket = Ticket {
            fingerprint,
            cancel: CancellationToken::new(),
        };
        if let Some(previous) = current.replace(ticket.clone()) {
            previous.cancel.cancel();
        }
        Some(ticket)
    }

    /// Returns `true` if `ticket` is still the current fetch.
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|t| t.fingerprint.generation == ticket.fingerprint.generation)
    }

    /// Drops the current fetch so its result will be ignored.
    pub fn invalidate(&self) {
        if let Some(previous) = self.current.lock().unwrap_or_else(PoisonError::into_inner).take() {
            previous.cancel.cancel();
        }
    }

    /// Fingerprint of the current fetch.
    pub fn current(&self) -> Option<RequestFingerprint> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|t| t.fingerprint.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::PaginationModel;
    use crate::query::SortModel;

    fn request(page: usize) -> PageRequest {
        PageRequest::new(PaginationModel::new(page, 5), SortModel::none())
    }

    #[test]
    fn test_display() {
        let tracker = RequestTracker::new();
        let ticket = tracker.begin(Scope::Master, request(0)).unwrap();
        assert_eq!(ticket.fingerprint.to_string(), "master-0-5-default-1");

        let detail = tracker
            .begin(
                Scope::Detail {
                    row_id: RowId::new("7"),
                    tab: 1,
                },
                PageRequest::new(PaginationModel::new(2, 10), SortModel::desc("title")),
            )
            .unwrap();
        assert_eq!(detail.fingerprint.to_string(), "detail-7-1-2-10-title-desc-2");
    }

    #[test]
    fn test_newer_ticket_supersedes() {
        let tracker = RequestTracker::new();
        let first = tracker.begin(Scope::Master, request(0)).unwrap();
        assert!(tracker.is_current(&first));

        let second = tracker.begin(Scope::Master, request(1)).unwrap();
        assert!(!tracker.is_current(&first));
        assert!(first.is_superseded());
        assert!(tracker.is_current(&second));
        assert!(!second.is_superseded());
    }

    #[test]
    fn test_identical_parameters_get_new_generation() {
        let tracker = RequestTracker::new();
        let first = tracker.begin(Scope::Master, request(0)).unwrap();
        let second = tracker.begin(Scope::Master, request(0)).unwrap();
        assert_ne!(first.fingerprint, second.fingerprint);
        assert!(tracker.is_current(&second));
    }

    #[test]
    fn test_invalidate() {
        let tracker = RequestTracker::new();
        let ticket = tracker.begin(Scope::Master, request(0)).unwrap();
        tracker.invalidate();
        assert!(!tracker.is_current(&ticket));
        assert!(ticket.is_superseded());
        assert!(tracker.current().is_none());
    }
}
