//! Master-detail grid controller.
//!
//! [`MasterDetailGrid`] wires one [`MasterCoordinator`] to a keyed table of
//! [`DetailCoordinator`]s, one per expanded row, and owns the expansion
//! flags and per-row active tabs. A display layer feeds it [`GridEvent`]s
//! and renders [`GridView`] / [`DetailView`] snapshots.
//!
//! Event handlers are synchronous: they update state immediately and
//! spawn the resulting fetch on the current Tokio runtime, returning a
//! [`FetchHandle`] the caller may await or drop.

use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::one::Ref;
use futures::future::join_all;
use log::debug;
use log::info;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::client::RestClient;
use crate::compose::DisplayRow;
use crate::compose::compose;
use crate::config::GridConfig;
use crate::coordinator::DetailCoordinator;
use crate::coordinator::FetchHandle;
use crate::coordinator::FetchOptions;
use crate::coordinator::FetchOutcome;
use crate::coordinator::MasterCoordinator;
use crate::coordinator::RowMapper;
use crate::coordinator::raw_rows;
use crate::error::ApiError;
use crate::error::Error;
use crate::error::FetchFailure;
use crate::expansion::ActiveTabs;
use crate::expansion::ExpansionState;
use crate::model::ColumnDef;
use crate::model::ExpandIconPosition;
use crate::model::GridRow;
use crate::model::RowId;
use crate::model::project_columns;
use crate::model::with_expand_column;
use crate::query::PaginationModel;
use crate::query::SortModel;
use crate::relation::RelationMappings;
use crate::source::DataSource;

/// Invoked with the id of a clicked master row.
pub type RowClickCallback = Arc<dyn Fn(&RowId) + Send + Sync>;

/// Invoked with the new tab index and the row whose detail panel changed.
pub type TabChangeCallback = Arc<dyn Fn(usize, &RowId) + Send + Sync>;

/// User interaction reported by the display layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridEvent {
    /// The master pager moved.
    PaginationChange(PaginationModel),
    /// The master ordering changed.
    SortChange(SortModel),
    /// The expand control of a master row was used.
    RowExpandToggle(RowId),
    /// A detail panel switched tabs.
    TabChange { row_id: RowId, tab: usize },
    /// A row was clicked.
    RowClick(RowId),
    /// A detail pager moved.
    DetailPaginationChange {
        row_id: RowId,
        pagination: PaginationModel,
    },
    /// A detail ordering changed.
    DetailSortChange { row_id: RowId, sort: SortModel },
}

/// Everything needed to render the master table.
#[derive(Debug, Clone, PartialEq)]
pub struct GridView<R> {
    pub title: String,
    /// Master columns including the expand column, if any.
    pub columns: Vec<ColumnDef>,
    /// Master rows interleaved with detail markers.
    pub rows: Vec<DisplayRow<R>>,
    pub pagination: PaginationModel,
    pub sort: SortModel,
    pub total_count: u64,
    pub loading: bool,
    pub error: Option<FetchFailure>,
    pub page_size_options: Vec<usize>,
}

/// Everything needed to render one detail panel.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub row_id: RowId,
    pub tab_labels: Vec<String>,
    pub active_tab: usize,
    /// Columns of the active tab.
    pub columns: Vec<ColumnDef>,
    pub rows: Vec<Value>,
    pub total_count: u64,
    pub loading: bool,
    pub error: Option<FetchFailure>,
    pub pagination: PaginationModel,
    pub sort: SortModel,
    /// Field holding each detail record's id.
    pub id_field: String,
}

/// Builder for [`MasterDetailGrid`].
///
/// # Example
///
/// ```ignore
/// let grid = GridBuilder::new(GridConfig::default())
///     .project_master_columns()
///     .on_master_row_click(|id| println!("clicked {}", id))
///     .build()?;
/// grid.load().wait().await;
/// ```
pub struct GridBuilder<R> {
    config: GridConfig,
    source: Option<Arc<dyn DataSource>>,
    mapper: RowMapper<R>,
    relations: Option<RelationMappings>,
    on_master_row_click: Option<RowClickCallback>,
    on_detail_tab_change: Option<TabChangeCallback>,
}

impl GridBuilder<Value> {
    /// Starts a builder that keeps master records as raw JSON.
    ///
    /// When the configured id field is not `id`, its value is also copied
    /// to `id` so the row can be expanded.
    pub fn new(config: GridConfig) -> Self {
        let mapper = match config.id_field.as_str() {
            "id" => raw_rows(),
            field => keyed_rows(field.to_string()),
        };
        Self {
            config,
            source: None,
            mapper,
            relations: None,
            on_master_row_click: None,
            on_detail_tab_change: None,
        }
    }

    /// Flattens each master record onto the configured master columns.
    ///
    /// Nested values are read through each column's `source` path and
    /// missing values become empty strings.
    pub fn project_master_columns(self) -> Self {
        let columns = self.config.master_columns.clone();
        let id_field = self.config.id_field.clone();
        self.map_master_row(move |record| Ok(project_columns(&record, &columns, &id_field)))
    }
}

fn keyed_rows(id_field: String) -> RowMapper<Value> {
    Arc::new(move |mut record: Value| {
        if let Some(id) = record.get(&id_field).cloned()
            && let Some(object) = record.as_object_mut()
        {
            object.insert("id".to_string(), id);
        }
        Ok::<Value, ApiError>(record)
    })
}

impl<R: GridRow> GridBuilder<R> {
    /// Uses `source` instead of a REST client on the configured base URL.
    pub fn source(mut self, source: Arc<dyn DataSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Maps every raw master record through `mapper`.
    ///
    /// A mapping error fails the whole page like a transport error would.
    pub fn map_master_row<T, F>(self, mapper: F) -> GridBuilder<T>
    where
        T: GridRow,
        F: Fn(Value) -> Result<T, ApiError> + Send + Sync + 'static,
    {
        GridBuilder {
            config: self.config,
            source: self.source,
            mapper: Arc::new(mapper),
            relations: self.relations,
            on_master_row_click: self.on_master_row_click,
            on_detail_tab_change: self.on_detail_tab_change,
        }
    }

    /// Deserializes every raw master record into `T`.
    pub fn deserialize_master_rows<T>(self) -> GridBuilder<T>
    where
        T: GridRow + DeserializeOwned,
    {
        self.map_master_row(|record| {
            serde_json::from_value::<T>(record)
                .map_err(|e| ApiError::parse(format!("Invalid master row: {}", e)))
        })
    }

    /// Overrides the relation templates from the configuration.
    pub fn relations(mut self, relations: RelationMappings) -> Self {
        self.relations = Some(relations);
        self
    }

    pub fn on_master_row_click<F>(mut self, callback: F) -> Self
    where
        F: Fn(&RowId) + Send + Sync + 'static,
    {
        self.on_master_row_click = Some(Arc::new(callback));
        self
    }

    pub fn on_detail_tab_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(usize, &RowId) + Send + Sync + 'static,
    {
        self.on_detail_tab_change = Some(Arc::new(callback));
        self
    }

    /// Validates the configuration and builds the grid. Nothing is fetched
    /// until [`MasterDetailGrid::load`].
    pub fn build(self) -> Result<MasterDetailGrid<R>, Error> {
        self.config.validate()?;

        let source = match self.source {
            Some(source) => source,
            None => {
                let mut builder = RestClient::builder().base_url(&self.config.api_base_url);
                if let Some(secs) = self.config.request_timeout_secs {
                    builder = builder.timeout(Duration::from_secs(secs));
                }
                Arc::new(builder.build()?) as Arc<dyn DataSource>
            }
        };

        let options = self.config.fetch_options();
        let relations = self
            .relations
            .unwrap_or_else(|| self.config.relation_mappings());
        let master = MasterCoordinator::new(
            Arc::clone(&source),
            self.config.master_endpoint.clone(),
            self.config.default_page_size,
            self.mapper,
            options,
        );

        info!(
            "Grid ready: {} ({} relation tabs)",
            self.config.master_endpoint,
            self.config.detail_tab_labels.len()
        );

        Ok(MasterDetailGrid {
            config: self.config,
            source,
            options,
            relations,
            master,
            expansion: RwLock::new(ExpansionState::new()),
            active_tabs: RwLock::new(ActiveTabs::new()),
            details: DashMap::new(),
            on_master_row_click: self.on_master_row_click,
            on_detail_tab_change: self.on_detail_tab_change,
        })
    }
}

/// Controller of a master table with expandable, tabbed detail panels.
pub struct MasterDetailGrid<R> {
    config: GridConfig,
    source: Arc<dyn DataSource>,
    options: FetchOptions,
    relations: RelationMappings,
    master: MasterCoordinator<R>,
    expansion: RwLock<ExpansionState>,
    active_tabs: RwLock<ActiveTabs>,
    details: DashMap<RowId, DetailCoordinator>,
    on_master_row_click: Option<RowClickCallback>,
    on_detail_tab_change: Option<TabChangeCallback>,
}

impl MasterDetailGrid<Value> {
    /// Starts a builder.
    pub fn builder(config: GridConfig) -> GridBuilder<Value> {
        GridBuilder::new(config)
    }
}

impl<R: GridRow> MasterDetailGrid<R> {
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// The master coordinator.
    pub fn master(&self) -> &MasterCoordinator<R> {
        &self.master
    }

    /// Detail coordinator of an expanded row.
    pub fn detail(&self, row_id: &RowId) -> Option<Ref<'_, RowId, DetailCoordinator>> {
        self.details.get(row_id)
    }

    pub fn is_expanded(&self, row_id: &RowId) -> bool {
        self.expansion
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_expanded(row_id)
    }

    /// Remembered tab of a row, kept across collapse.
    pub fn active_tab(&self, row_id: &RowId) -> usize {
        self.active_tabs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(row_id)
    }

    /// Fetches the first master page.
    pub fn load(&self) -> FetchHandle {
        self.master.refresh()
    }

    /// Fetches the current master page again.
    pub fn refresh(&self) -> FetchHandle {
        self.master.refresh()
    }

    /// Refetches every open detail panel and waits for all of them.
    pub async fn refresh_all_details(&self) -> Vec<FetchOutcome> {
        let handles: Vec<FetchHandle> = self
            .details
            .iter()
            .map(|entry| entry.value().refresh())
            .collect();
        join_all(handles.into_iter().map(FetchHandle::wait)).await
    }

    pub fn on_pagination_change(&self, pagination: PaginationModel) -> Option<FetchHandle> {
        self.master.set_pagination(pagination)
    }

    /// Changes the master ordering.
    ///
    /// Expanded rows may not be on the re-sorted page, so every row is
    /// collapsed and every detail coordinator dropped.
    pub fn on_sort_change(&self, sort: SortModel) -> Option<FetchHandle> {
        self.expansion
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.close_details();
        self.master.set_sort(sort)
    }

    /// Expands or collapses a master row.
    ///
    /// Expansion resolves the row's relations once and starts a detail
    /// coordinator on the row's remembered tab. Returns its first fetch.
    pub fn on_row_expand_toggle(&self, row_id: &RowId) -> Option<FetchHandle> {
        let expanded = self
            .expansion
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .toggle(row_id);

        if !expanded {
            debug!("Collapsing row {}", row_id);
            if let Some((_, detail)) = self.details.remove(row_id) {
                detail.cancel();
            }
            return None;
        }

        debug!("Expanding row {}", row_id);
        let detail = DetailCoordinator::new(
            Arc::clone(&self.source),
            row_id.clone(),
            self.relations.table_for(row_id),
            self.active_tab(row_id),
            self.config.detail_page_size,
            self.options,
        );
        let handle = detail.refresh();
        if let Some(previous) = self.details.insert(row_id.clone(), detail) {
            previous.cancel();
        }
        Some(handle)
    }

    /// Switches the detail tab of a row.
    ///
    /// The tab is remembered even if the row is not expanded.
    pub fn on_tab_change(&self, row_id: &RowId, tab: usize) -> Option<FetchHandle> {
        self.active_tabs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set(row_id.clone(), tab);
        if let Some(callback) = &self.on_detail_tab_change {
            callback(tab, row_id);
        }
        self.details
            .get(row_id)
            .and_then(|detail| detail.set_active_tab(tab))
    }

    /// Handles a click on a displayed row.
    ///
    /// Clicks on anything but a master row of the current page are
    /// ignored. Without an expand column the click also toggles expansion.
    pub fn on_row_click(&self, row_id: &RowId) -> Option<FetchHandle> {
        let is_master_row = self
            .master
            .snapshot()
            .rows
            .iter()
            .any(|row| row.row_id().as_ref() == Some(row_id));
        if !is_master_row {
            debug!("Ignoring click on {}", row_id);
            return None;
        }

        if let Some(callback) = &self.on_master_row_click {
            callback(row_id);
        }
        match self.config.expand_icon_position {
            ExpandIconPosition::None => self.on_row_expand_toggle(row_id),
            ExpandIconPosition::Start | ExpandIconPosition::End => None,
        }
    }

    pub fn on_detail_pagination_change(
        &self,
        row_id: &RowId,
        pagination: PaginationModel,
    ) -> Option<FetchHandle> {
        self.details
            .get(row_id)
            .and_then(|detail| detail.set_pagination(pagination))
    }

    pub fn on_detail_sort_change(&self, row_id: &RowId, sort: SortModel) -> Option<FetchHandle> {
        self.details
            .get(row_id)
            .and_then(|detail| detail.set_sort(sort))
    }

    /// Routes a display event to its handler.
    pub fn handle(&self, event: GridEvent) -> Option<FetchHandle> {
        match event {
            GridEvent::PaginationChange(pagination) => self.on_pagination_change(pagination),
            GridEvent::SortChange(sort) => self.on_sort_change(sort),
            GridEvent::RowExpandToggle(row_id) => self.on_row_expand_toggle(&row_id),
            GridEvent::TabChange { row_id, tab } => self.on_tab_change(&row_id, tab),
            GridEvent::RowClick(row_id) => self.on_row_click(&row_id),
            GridEvent::DetailPaginationChange { row_id, pagination } => {
                self.on_detail_pagination_change(&row_id, pagination)
            }
            GridEvent::DetailSortChange { row_id, sort } => self.on_detail_sort_change(&row_id, sort),
        }
    }

    /// Snapshot of the master table.
    pub fn view(&self) -> GridView<R> {
        let state = self.master.snapshot();
        let request = self.master.request();
        let rows = {
            let expansion = self.expansion.read().unwrap_or_else(PoisonError::into_inner);
            compose(&state.rows, &expansion)
        };
        GridView {
            title: self.config.title.clone(),
            columns: with_expand_column(&self.config.master_columns, self.config.expand_icon_position),
            rows,
            pagination: request.pagination,
            sort: request.sort,
            total_count: state.total_count,
            loading: state.loading,
            error: state.error,
            page_size_options: self.config.page_size_options.clone(),
        }
    }

    /// Snapshot of an expanded row's detail panel.
    pub fn detail_view(&self, row_id: &RowId) -> Option<DetailView> {
        let detail = self.details.get(row_id)?;
        let state = detail.snapshot();
        let request = detail.request();
        let active_tab = detail.active_tab();
        Some(DetailView {
            row_id: row_id.clone(),
            tab_labels: (0..self.config.detail_tab_labels.len())
                .map(|tab| self.config.tab_label(tab))
                .collect(),
            active_tab,
            columns: self.config.tab_columns(active_tab).to_vec(),
            rows: state.rows,
            total_count: state.total_count,
            loading: state.loading,
            error: state.error,
            pagination: request.pagination,
            sort: request.sort,
            id_field: detail
                .relation()
                .map(|relation| relation.id_field)
                .unwrap_or_else(|| "id".to_string()),
        })
    }

    /// Height of a displayed row.
    pub fn row_height(&self, row: &DisplayRow<R>) -> u16 {
        if row.is_detail() {
            self.config.detail_row_height
        } else {
            self.config.row_height
        }
    }

    fn close_details(&self) {
        for entry in self.details.iter() {
            entry.value().cancel();
        }
        self.details.clear();
    }
}

impl<R> std::fmt::Debug for MasterDetailGrid<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterDetailGrid")
            .field("master_endpoint", &self.config.master_endpoint)
            .field("open_details", &self.details.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::query::Page;
    use crate::query::PageRequest;
    use crate::relation::RelationTemplate;

    struct Fixed;

    #[async_trait]
    impl DataSource for Fixed {
        async fn fetch_page(&self, endpoint: &str, _request: &PageRequest) -> Result<Page<Value>, ApiError> {
            match endpoint {
                "users" => Ok(Page::new(
                    vec![
                        json!({ "id": 1, "name": "Leanne", "company": { "name": "Romaguera" } }),
                        json!({ "id": 2, "name": "Ervin" }),
                    ],
                    10,
                )),
                _ => Ok(Page::new(vec![json!({ "id": 11, "title": "qui est esse" })], 1)),
            }
        }
    }

    fn grid(config: GridConfig) -> MasterDetailGrid<Value> {
        GridBuilder::new(config.with_dispatch_delay(Duration::ZERO))
            .source(Arc::new(Fixed))
            .project_master_columns()
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_view_composes_markers() {
        let grid = grid(GridConfig::default());
        assert!(grid.load().wait().await.is_applied());

        let row = RowId::from(1u64);
        grid.on_row_expand_toggle(&row).unwrap().wait().await;

        let view = grid.view();
        assert_eq!(view.total_count, 10);
        assert_eq!(view.rows.len(), 3);
        assert!(view.rows[1].is_detail());
        assert_eq!(view.columns[0].field, "expand");
        assert_eq!(grid.row_height(&view.rows[1]), 400);
        assert_eq!(grid.row_height(&view.rows[0]), 52);
        assert_eq!(
            view.rows[0].as_master().unwrap()["companyName"],
            json!("Romaguera")
        );
        assert_eq!(view.rows[2].as_master().unwrap()["companyName"], json!(""));

        let detail = grid.detail_view(&row).unwrap();
        assert_eq!(detail.tab_labels, vec!["Posts", "Comments", "Albums"]);
        assert_eq!(detail.rows.len(), 1);
        assert_eq!(detail.columns.len(), 3);
    }

    #[tokio::test]
    async fn test_row_click_toggles_without_expand_column() {
        let clicks = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen = Arc::clone(&clicks);
        let grid = GridBuilder::new(
            GridConfig::default()
                .with_expand_icon_position(ExpandIconPosition::None)
                .with_dispatch_delay(Duration::ZERO),
        )
        .source(Arc::new(Fixed))
        .on_master_row_click(move |id| seen.lock().unwrap().push(id.clone()))
        .build()
        .unwrap();
        grid.load().wait().await;

        let row = RowId::from(2u64);
        grid.on_row_click(&row).unwrap().wait().await;
        assert!(grid.is_expanded(&row));
        assert!(grid.view().columns.iter().all(|c| c.field != "expand"));

        assert!(grid.on_row_click(&RowId::new("detail-2")).is_none());
        assert_eq!(*clicks.lock().unwrap(), vec![row]);
    }

    #[tokio::test]
    async fn test_collapse_remembers_tab() {
        let tabs = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen = Arc::clone(&tabs);
        let grid = GridBuilder::new(GridConfig::default().with_dispatch_delay(Duration::ZERO))
            .source(Arc::new(Fixed))
            .on_detail_tab_change(move |tab, id| seen.lock().unwrap().push((tab, id.clone())))
            .build()
            .unwrap();

        let row = RowId::from(1u64);
        grid.on_row_expand_toggle(&row).unwrap().wait().await;
        grid.on_tab_change(&row, 2).unwrap().wait().await;
        assert!(grid.on_row_expand_toggle(&row).is_none());
        assert!(grid.detail(&row).is_none());

        grid.on_row_expand_toggle(&row).unwrap().wait().await;
        assert_eq!(grid.detail_view(&row).unwrap().active_tab, 2);
        assert_eq!(*tabs.lock().unwrap(), vec![(2, row)]);
    }

    struct Customers;

    #[async_trait]
    impl DataSource for Customers {
        async fn fetch_page(&self, endpoint: &str, _request: &PageRequest) -> Result<Page<Value>, ApiError> {
            match endpoint {
                "customers" => Ok(Page::new(
                    vec![json!({ "customerId": "C-7", "name": "Acme" })],
                    1,
                )),
                _ => Ok(Page::new(vec![json!({ "id": 1 })], 1)),
            }
        }
    }

    #[tokio::test]
    async fn test_custom_id_field() {
        let config = GridConfig::default()
            .with_master_endpoint("customers")
            .with_id_field("customerId")
            .with_relations(vec![RelationTemplate::new(0, "customers/{id}/orders", "id")])
            .with_dispatch_delay(Duration::ZERO);
        let row = RowId::new("C-7");

        let projected = GridBuilder::new(config.clone())
            .source(Arc::new(Customers))
            .project_master_columns()
            .build()
            .unwrap();
        projected.load().wait().await;
        assert_eq!(projected.master().snapshot().rows[0].row_id(), Some(row.clone()));

        let raw = GridBuilder::new(config).source(Arc::new(Customers)).build().unwrap();
        raw.load().wait().await;
        let record = raw.master().snapshot().rows[0].clone();
        assert_eq!(record["customerId"], json!("C-7"));
        assert!(raw.on_row_expand_toggle(&row).unwrap().wait().await.is_applied());
        assert_eq!(raw.detail(&row).unwrap().relation().unwrap().endpoint, "customers/C-7/orders");
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let result = GridBuilder::new(GridConfig::default().with_page_size(0))
            .source(Arc::new(Fixed))
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
