//! Tab index → endpoint resolution for detail panels.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use crate::model::RowId;

/// Placeholder replaced by the master row id in endpoint templates.
pub const ROW_ID_PLACEHOLDER: &str = "{id}";

/// Endpoint and record id field backing one detail tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    /// Endpoint relative to the API base URL (e.g. `users/7/posts`).
    pub endpoint: String,
    /// Field holding each detail record's id.
    #[serde(default = "default_id_field")]
    pub id_field: String,
}

fn default_id_field() -> String {
    "id".to_string()
}

impl Relation {
    /// Creates a relation.
    pub fn new(endpoint: impl Into<String>, id_field: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            id_field: id_field.into(),
        }
    }
}

/// Relations for every tab of one detail panel, keyed by tab index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationTable {
    tabs: BTreeMap<usize, Relation>,
}

impl RelationTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the relation for a tab.
    pub fn with(mut self, tab: usize, relation: Relation) -> Self {
        self.tabs.insert(tab, relation);
        self
    }

    /// Returns the relation for a tab.
    pub fn get(&self, tab: usize) -> Option<&Relation> {
        self.tabs.get(&tab)
    }

    /// Returns `true` if no tab is mapped.
    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    /// Number of mapped tabs.
    pub fn len(&self) -> usize {
        self.tabs.len()
    }
}

impl FromIterator<(usize, Relation)> for RelationTable {
    fn from_iter<I: IntoIterator<Item = (usize, Relation)>>(iter: I) -> Self {
        Self {
            tabs: iter.into_iter().collect(),
        }
    }
}

/// A relation whose endpoint contains `{id}`, expanded per master row.
///
/// This is the form relations take in configuration files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationTemplate {
    /// Tab index this relation backs.
    pub tab: usize,
    /// Endpoint template, e.g. `users/{id}/posts`.
    pub endpoint: String,
    /// Field holding each detail record's id.
    #[serde(default = "default_id_field")]
    pub id_field: String,
}

impl RelationTemplate {
    /// Creates a template.
    pub fn new(tab: usize, endpoint: impl Into<String>, id_field: impl Into<String>) -> Self {
        Self {
            tab,
            endpoint: endpoint.into(),
            id_field: id_field.into(),
        }
    }

    /// Expands the template for one row.
    pub fn expand(&self, row_id: &RowId) -> Relation {
        Relation::new(
            self.endpoint.replace(ROW_ID_PLACEHOLDER, row_id.as_str()),
            self.id_field.clone(),
        )
    }
}

/// Factory producing the relation table for a master row.
pub type RelationFactory = Arc<dyn Fn(&RowId) -> RelationTable + Send + Sync>;

/// How detail tabs map to endpoints.
///
/// Resolved once per row expansion via [`table_for`](Self::table_for); the
/// resulting [`RelationTable`] is owned by that row's detail coordinator.
#[derive(Clone)]
pub enum RelationMappings {
    /// Same table for every row.
    Static(RelationTable),
    /// Table computed from the row id.
    PerRow(RelationFactory),
    /// Endpoint templates with `{id}` placeholders.
    Templates(Vec<RelationTemplate>),
}

impl RelationMappings {
    /// Wraps a per-row factory.
    pub fn per_row<F>(factory: F) -> Self
    where
        F: Fn(&RowId) -> RelationTable + Send + Sync + 'static,
    {
        Self::PerRow(Arc::new(factory))
    }

    /// Produces the relation table for a row.
    ///
    /// Static tables ignore `row_id`; factories are invoked once per call.
    pub fn table_for(&self, row_id: &RowId) -> RelationTable {
        match self {
            Self::Static(table) => table.clone(),
            Self::PerRow(factory) => factory(row_id),
            Self::Templates(templates) => templates
                .iter()
                .map(|t| (t.tab, t.expand(row_id)))
                .collect(),
        }
    }
}

impl Default for RelationMappings {
    fn default() -> Self {
        Self::Static(RelationTable::new())
    }
}

impl std::fmt::Debug for RelationMappings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static(table) => f.debug_tuple("Static").field(table).finish(),
            Self::PerRow(_) => f.write_str("PerRow(..)"),
            Self::Templates(templates) => f.debug_tuple("Templates").field(templates).finish(),
        }
    }
}

/// Resolves the relation for `tab` of the row `row_id`.
///
/// Returns `None` iff no relation is mapped for the tab. Deterministic for a
/// given `(mappings, tab, row_id)`.
pub fn resolve(mappings: &RelationMappings, tab: usize, row_id: &RowId) -> Option<Relation> {
    match mappings {
        RelationMappings::Static(table) => table.get(tab).cloned(),
        _ => mappings.table_for(row_id).get(tab).cloned(),
    }
}
