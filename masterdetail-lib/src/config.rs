//! Grid configuration.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::coordinator::FetchOptions;
use crate::error::ConfigError;
use crate::model::ColumnDef;
use crate::model::ExpandIconPosition;
use crate::relation::RelationMappings;
use crate::relation::RelationTemplate;

/// Default REST API.
pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

/// Static configuration of a master-detail grid.
///
/// Every field has a default, so a configuration file only needs to name
/// what it changes. Callbacks are not part of this struct; they are set
/// on [`GridBuilder`](crate::grid::GridBuilder).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Base URL every endpoint is joined to.
    pub api_base_url: String,
    /// Endpoint of the master table.
    pub master_endpoint: String,
    /// Field of a raw master record holding its id.
    pub id_field: String,
    /// Heading shown above the grid.
    pub title: String,
    /// Master table columns (without the expand column).
    pub master_columns: Vec<ColumnDef>,
    /// Initial master page size.
    pub default_page_size: usize,
    /// Page size a detail table starts with, and returns to on tab change.
    pub detail_page_size: usize,
    /// Page sizes offered by the pager.
    pub page_size_options: Vec<usize>,
    /// Detail tab endpoint templates.
    pub relations: Vec<RelationTemplate>,
    /// Detail tab labels, by tab index.
    pub detail_tab_labels: Vec<String>,
    /// Detail columns, by tab index.
    #[serde(with = "tab_keys")]
    pub detail_columns: BTreeMap<usize, Vec<ColumnDef>>,
    /// Placement of the expand/collapse column.
    pub expand_icon_position: ExpandIconPosition,
    /// Height of a detail marker row.
    pub detail_row_height: u16,
    /// Height of a master row.
    pub row_height: u16,
    /// Delay between a parameter change and the network call, in milliseconds.
    pub dispatch_delay_ms: u64,
    /// Drop in-flight requests once they are superseded.
    pub abort_in_flight: bool,
    /// Per-request timeout, in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            master_endpoint: "users".to_string(),
            id_field: "id".to_string(),
            title: "Customer Information".to_string(),
            master_columns: vec![
                ColumnDef::new("name", "Name", 200),
                ColumnDef::new("username", "Username", 130),
                ColumnDef::new("email", "Email", 200),
                ColumnDef::new("companyName", "Company", 200).source("company.name"),
            ],
            default_page_size: 5,
            detail_page_size: 5,
            page_size_options: vec![5, 10, 15],
            relations: vec![
                RelationTemplate::new(0, "users/{id}/posts", "id"),
                RelationTemplate::new(1, "posts/{id}/comments", "id"),
                RelationTemplate::new(2, "users/{id}/albums", "id"),
            ],
            detail_tab_labels: vec!["Posts".to_string(), "Comments".to_string(), "Albums".to_string()],
            detail_columns: default_detail_columns(),
            expand_icon_position: ExpandIconPosition::Start,
            detail_row_height: 400,
            row_height: 52,
            dispatch_delay_ms: 50,
            abort_in_flight: true,
            request_timeout_secs: None,
        }
    }
}

/// Tab-indexed maps with string keys, as TOML tables require.
mod tab_keys {
    use std::collections::BTreeMap;

    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;
    use serde::de::Error as _;

    use crate::model::ColumnDef;

    pub fn serialize<S>(map: &BTreeMap<usize, Vec<ColumnDef>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(map.iter().map(|(tab, columns)| (tab.to_string(), columns)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<usize, Vec<ColumnDef>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        BTreeMap::<String, Vec<ColumnDef>>::deserialize(deserializer)?
            .into_iter()
            .map(|(key, columns)| {
                key.trim()
                    .parse::<usize>()
                    .map(|tab| (tab, columns))
                    .map_err(|_| D::Error::custom(format!("invalid tab index '{}'", key)))
            })
            .collect()
    }
}

fn default_detail_columns() -> BTreeMap<usize, Vec<ColumnDef>> {
    BTreeMap::from([
        (
            0,
            vec![
                ColumnDef::new("id", "ID", 70),
                ColumnDef::new("title", "Title", 300),
                ColumnDef::new("body", "Content", 500),
            ],
        ),
        (
            1,
            vec![
                ColumnDef::new("id", "ID", 70),
                ColumnDef::new("name", "Name", 200),
                ColumnDef::new("email", "Email", 200),
                ColumnDef::new("body", "Comment", 500),
            ],
        ),
        (
            2,
            vec![ColumnDef::new("id", "ID", 70), ColumnDef::new("title", "Title", 500)],
        ),
    ])
}

impl GridConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_master_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.master_endpoint = endpoint.into();
        self
    }

    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_master_columns(mut self, columns: Vec<ColumnDef>) -> Self {
        self.master_columns = columns;
        self
    }

    pub fn with_page_size(mut self, size: usize) -> Self {
        self.default_page_size = size;
        self
    }

    pub fn with_detail_page_size(mut self, size: usize) -> Self {
        self.detail_page_size = size;
        self
    }

    pub fn with_relations(mut self, relations: Vec<RelationTemplate>) -> Self {
        self.relations = relations;
        self
    }

    pub fn with_detail_tab_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.detail_tab_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_detail_columns(mut self, tab: usize, columns: Vec<ColumnDef>) -> Self {
        self.detail_columns.insert(tab, columns);
        self
    }

    pub fn with_expand_icon_position(mut self, position: ExpandIconPosition) -> Self {
        self.expand_icon_position = position;
        self
    }

    pub fn with_dispatch_delay(mut self, delay: Duration) -> Self {
        self.dispatch_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_abort_in_flight(mut self, abort: bool) -> Self {
        self.abort_in_flight = abort;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_secs = Some(timeout.as_secs());
        self
    }

    /// Checks values the grid cannot work without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::MissingValue { name: "api_base_url" });
        }
        if self.master_endpoint.trim().is_empty() {
            return Err(ConfigError::MissingValue {
                name: "master_endpoint",
            });
        }
        if self.id_field.trim().is_empty() {
            return Err(ConfigError::MissingValue { name: "id_field" });
        }
        if self.default_page_size == 0 {
            return Err(ConfigError::InvalidPageSize {
                name: "default_page_size",
            });
        }
        if self.detail_page_size == 0 {
            return Err(ConfigError::InvalidPageSize {
                name: "detail_page_size",
            });
        }
        if self.page_size_options.contains(&0) {
            return Err(ConfigError::InvalidPageSize {
                name: "page_size_options",
            });
        }
        Ok(())
    }

    /// Fetch timing for every coordinator of the grid.
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            dispatch_delay: Duration::from_millis(self.dispatch_delay_ms),
            abort_in_flight: self.abort_in_flight,
        }
    }

    /// Relation mappings built from the configured templates.
    pub fn relation_mappings(&self) -> RelationMappings {
        RelationMappings::Templates(self.relations.clone())
    }

    /// Label of a detail tab, falling back to `Tab {n}`.
    pub fn tab_label(&self, tab: usize) -> String {
        self.detail_tab_labels
            .get(tab)
            .cloned()
            .unwrap_or_else(|| format!("Tab {}", tab + 1))
    }

    /// Columns of a detail tab; empty if none are configured.
    pub fn tab_columns(&self, tab: usize) -> &[ColumnDef] {
        self.detail_columns.get(&tab).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RowId;
    use crate::relation::Relation;

    #[test]
    fn test_defaults() {
        let config = GridConfig::default();
        assert_eq!(config.api_base_url, DEFAULT_BASE_URL);
        assert_eq!(config.default_page_size, 5);
        assert_eq!(config.page_size_options, vec![5, 10, 15]);
        assert_eq!(config.detail_tab_labels, vec!["Posts", "Comments", "Albums"]);
        assert_eq!(config.detail_row_height, 400);
        assert_eq!(config.fetch_options(), FetchOptions::default());
        assert_eq!(config.tab_columns(1).len(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_relations_expand_row_id() {
        let table = GridConfig::default().relation_mappings().table_for(&RowId::new("7"));
        assert_eq!(table.get(0), Some(&Relation::new("users/7/posts", "id")));
        assert_eq!(table.get(1), Some(&Relation::new("posts/7/comments", "id")));
        assert_eq!(table.get(2), Some(&Relation::new("users/7/albums", "id")));
        assert_eq!(table.get(3), None);
    }

    #[test]
    fn test_deserialize_partial() {
        let json = r#"{
            "master_endpoint": "customers",
            "default_page_size": 10,
            "expand_icon_position": "none",
            "relations": [{ "tab": 0, "endpoint": "customers/{id}/orders", "id_field": "orderId" }]
        }"#;
        let config: GridConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.master_endpoint, "customers");
        assert_eq!(config.default_page_size, 10);
        assert_eq!(config.detail_page_size, 5);
        assert_eq!(config.expand_icon_position, ExpandIconPosition::None);
        assert_eq!(config.relations[0].id_field, "orderId");
        assert_eq!(config.api_base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_detail_columns_keys_are_tab_indices() {
        let json = r#"{ "detail_columns": { "1": [{ "field": "id", "header_name": "ID" }] } }"#;
        let config: GridConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.tab_columns(1)[0].header_name, "ID");
        assert!(config.tab_columns(0).is_empty());

        let text = serde_json::to_string(&config).unwrap();
        assert!(text.contains(r#""detail_columns":{"1":["#));
        assert_eq!(serde_json::from_str::<GridConfig>(&text).unwrap(), config);

        let bad = r#"{ "detail_columns": { "first": [] } }"#;
        let err = serde_json::from_str::<GridConfig>(bad).unwrap_err();
        assert!(err.to_string().contains("invalid tab index 'first'"));
    }

    #[test]
    fn test_validate() {
        assert_eq!(
            GridConfig::new().with_page_size(0).validate(),
            Err(ConfigError::InvalidPageSize {
                name: "default_page_size"
            })
        );
        assert_eq!(
            GridConfig::new().with_base_url(" ").validate(),
            Err(ConfigError::MissingValue { name: "api_base_url" })
        );
        assert_eq!(
            GridConfig::new().with_id_field("").validate(),
            Err(ConfigError::MissingValue { name: "id_field" })
        );
        assert_eq!(
            GridConfig::new().with_master_endpoint("").validate(),
            Err(ConfigError::MissingValue {
                name: "master_endpoint"
            })
        );
    }

    #[test]
    fn test_tab_label_fallback() {
        let config = GridConfig::new().with_detail_tab_labels(["Orders"]);
        assert_eq!(config.tab_label(0), "Orders");
        assert_eq!(config.tab_label(2), "Tab 3");
    }
}
