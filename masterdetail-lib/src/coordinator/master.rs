//! Master table fetch coordinator.

use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;

use super::core::FetchCore;
use super::core::FetchHandle;
use super::core::FetchOptions;
use super::core::FetchState;
use super::core::RowMapper;
use super::core::Target;
use super::fingerprint::RequestFingerprint;
use super::fingerprint::Scope;
use crate::query::PageRequest;
use crate::query::PaginationModel;
use crate::query::SortModel;
use crate::source::DataSource;

/// Owns the master table's pagination, sort and rows.
///
/// Every parameter change dispatches a fetch; only the most recently
/// dispatched fetch may update the rows.
///
/// # Example
///
/// ```ignore
/// let master = MasterCoordinator::new(source, "users", 5, raw_rows(), FetchOptions::default());
/// master.refresh().wait().await;
///
/// if let Some(handle) = master.set_pagination(PaginationModel::new(1, 5)) {
///     handle.wait().await;
/// }
/// println!("{} of {}", master.snapshot().rows.len(), master.snapshot().total_count);
/// ```
pub struct MasterCoordinator<R> {
    core: Arc<FetchCore<R>>,
    endpoint: String,
    request: RwLock<PageRequest>,
}

impl<R: Clone + Send + Sync + 'static> MasterCoordinator<R> {
    /// Creates a coordinator on page 0, unsorted. Nothing is fetched yet.
    pub fn new(
        source: Arc<dyn DataSource>,
        endpoint: impl Into<String>,
        page_size: usize,
        mapper: RowMapper<R>,
        options: FetchOptions,
    ) -> Self {
        Self {
            core: Arc::new(FetchCore::new(source, mapper, options)),
            endpoint: endpoint.into(),
            request: RwLock::new(PageRequest::new(PaginationModel::first(page_size), SortModel::none())),
        }
    }

    /// Master endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Current page and sort.
    pub fn request(&self) -> PageRequest {
        self.request.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Current page.
    pub fn pagination(&self) -> PaginationModel {
        self.request().pagination
    }

    /// Current ordering.
    pub fn sort(&self) -> SortModel {
        self.request().sort
    }

    /// Moves to another page. Returns `None` when nothing changed.
    pub fn set_pagination(&self, pagination: PaginationModel) -> Option<FetchHandle> {
        let mut current = self.request.write().unwrap_or_else(PoisonError::into_inner);
        if current.pagination == pagination {
            return None;
        }
        current.pagination = pagination;
        // Dispatched under the lock so the last write is the current fetch.
        Some(self.dispatch(current.clone()))
    }

    /// Changes the ordering and returns to page 0. Returns `None` when nothing changed.
    pub fn set_sort(&self, sort: SortModel) -> Option<FetchHandle> {
        let mut current = self.request.write().unwrap_or_else(PoisonError::into_inner);
        if current.sort == sort {
            return None;
        }
        current.sort = sort;
        current.pagination = current.pagination.reset();
        Some(self.dispatch(current.clone()))
    }

    /// Fetches the current page again.
    pub fn refresh(&self) -> FetchHandle {
        let current = self.request.read().unwrap_or_else(PoisonError::into_inner);
        self.dispatch(current.clone())
    }

    fn dispatch(&self, request: PageRequest) -> FetchHandle {
        self.core
            .dispatch(Scope::Master, request, Target::Endpoint(self.endpoint.clone()))
    }

    /// Rows and status.
    pub fn snapshot(&self) -> FetchState<R> {
        self.core.snapshot()
    }

    /// Fingerprint of the fetch whose response would be applied.
    pub fn current_request(&self) -> Option<RequestFingerprint> {
        self.core.current()
    }

    /// Ignores whatever fetch is in flight.
    pub fn cancel(&self) {
        self.core.cancel();
    }
}
