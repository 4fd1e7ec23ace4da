//! Detail panel fetch coordinator, one per expanded master row.

use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;

use serde_json::Value;

use super::core::FetchCore;
use super::core::FetchHandle;
use super::core::FetchOptions;
use super::core::FetchState;
use super::core::Target;
use super::core::raw_rows;
use super::fingerprint::RequestFingerprint;
use super::fingerprint::Scope;
use crate::error::ConfigError;
use crate::model::RowId;
use crate::query::PageRequest;
use crate::query::PaginationModel;
use crate::query::SortModel;
use crate::relation::Relation;
use crate::relation::RelationTable;
use crate::source::DataSource;

struct DetailParams {
    tab: usize,
    request: PageRequest,
}

/// Owns one expanded row's active tab, pagination, sort and detail rows.
///
/// The relation table is resolved once, when the row is expanded, and
/// kept for the coordinator's lifetime. Tabs without a usable relation
/// yield an empty table and never touch the network.
pub struct DetailCoordinator {
    row_id: RowId,
    relations: RelationTable,
    page_size: usize,
    core: Arc<FetchCore<Value>>,
    params: RwLock<DetailParams>,
}

impl DetailCoordinator {
    /// Creates a coordinator showing `active_tab`, page 0, unsorted.
    pub fn new(
        source: Arc<dyn DataSource>,
        row_id: RowId,
        relations: RelationTable,
        active_tab: usize,
        page_size: usize,
        options: FetchOptions,
    ) -> Self {
        Self {
            row_id,
            relations,
            page_size,
            core: Arc::new(FetchCore::new(source, raw_rows(), options)),
            params: RwLock::new(DetailParams {
                tab: active_tab,
                request: PageRequest::new(PaginationModel::first(page_size), SortModel::none()),
            }),
        }
    }

    /// The expanded master row.
    pub fn row_id(&self) -> &RowId {
        &self.row_id
    }

    /// Relations resolved for this row.
    pub fn relations(&self) -> &RelationTable {
        &self.relations
    }

    /// Active tab index.
    pub fn active_tab(&self) -> usize {
        self.params.read().unwrap_or_else(PoisonError::into_inner).tab
    }

    /// Relation of the active tab.
    pub fn relation(&self) -> Option<Relation> {
        self.relations.get(self.active_tab()).cloned()
    }

    /// Current page and sort.
    pub fn request(&self) -> PageRequest {
        self.params.read().unwrap_or_else(PoisonError::into_inner).request.clone()
    }

    /// Current page.
    pub fn pagination(&self) -> PaginationModel {
        self.request().pagination
    }

    /// Current ordering.
    pub fn sort(&self) -> SortModel {
        self.request().sort
    }

    /// Switches tabs, starting the new tab on page 0 with no sort.
    ///
    /// Returns `None` if `tab` is already active.
    pub fn set_active_tab(&self, tab: usize) -> Option<FetchHandle> {
        let mut params = self.params.write().unwrap_or_else(PoisonError::into_inner);
        if params.tab == tab {
            return None;
        }
        params.tab = tab;
        params.request = PageRequest::new(PaginationModel::first(self.page_size), SortModel::none());
        Some(self.dispatch(tab, params.request.clone()))
    }

    /// Moves to another page. Returns `None` when nothing changed.
    pub fn set_pagination(&self, pagination: PaginationModel) -> Option<FetchHandle> {
        let mut params = self.params.write().unwrap_or_else(PoisonError::into_inner);
        if params.request.pagination == pagination {
            return None;
        }
        params.request.pagination = pagination;
        Some(self.dispatch(params.tab, params.request.clone()))
    }

    /// Changes the ordering and returns to page 0. Returns `None` when nothing changed.
    pub fn set_sort(&self, sort: SortModel) -> Option<FetchHandle> {
        let mut params = self.params.write().unwrap_or_else(PoisonError::into_inner);
        if params.request.sort == sort {
            return None;
        }
        params.request.sort = sort;
        params.request.pagination = params.request.pagination.reset();
        Some(self.dispatch(params.tab, params.request.clone()))
    }

    /// Fetches the active tab's current page again.
    pub fn refresh(&self) -> FetchHandle {
        let params = self.params.read().unwrap_or_else(PoisonError::into_inner);
        self.dispatch(params.tab, params.request.clone())
    }

    /// Takes a ticket for `request`. Callers hold the params lock, so
    /// tickets are issued in the order parameters were written.
    fn dispatch(&self, tab: usize, request: PageRequest) -> FetchHandle {
        let target = match self.relations.get(tab) {
            None => Target::Unconfigured(ConfigError::MissingRelation { tab }),
            Some(relation) if relation.endpoint.trim().is_empty() => {
                Target::Unconfigured(ConfigError::MissingEndpoint { tab })
            }
            Some(relation) => Target::Endpoint(relation.endpoint.clone()),
        };
        let scope = Scope::Detail {
            row_id: self.row_id.clone(),
            tab,
        };
        self.core.dispatch(scope, request, target)
    }

    /// Detail rows and status.
    pub fn snapshot(&self) -> FetchState<Value> {
        self.core.snapshot()
    }

    /// Id of a detail record, read through the active relation's id field.
    pub fn record_id(&self, record: &Value) -> Option<RowId> {
        self.relation()
            .and_then(|relation| RowId::from_value(record, &relation.id_field))
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

impl std::fmt::Debug for DetailCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetailCoordinator")
            .field("row_id", &self.row_id)
            .field("active_tab", &self.active_tab())
            .field("request", &self.request())
            .finish_non_exhaustive()
    }
}
