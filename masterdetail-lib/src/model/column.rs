//! Column definitions and column-driven row mapping.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

/// Field name of the synthetic expand/collapse column.
pub const EXPAND_FIELD: &str = "expand";

/// Width of the synthetic expand/collapse column.
pub const EXPAND_WIDTH: u16 = 50;

/// A column handed to the grid display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Field of the normalized row shown in this column.
    pub field: String,
    /// Header text.
    #[serde(default)]
    pub header_name: String,
    /// Width hint for the display.
    #[serde(default = "default_width")]
    pub width: u16,
    /// Whether the column offers server-side sorting.
    #[serde(default = "default_sortable")]
    pub sortable: bool,
    /// Dotted path into the raw record, when it differs from `field`
    /// (e.g. `company.name` for a `companyName` column).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

fn default_width() -> u16 {
    150
}

fn default_sortable() -> bool {
    true
}

impl ColumnDef {
    /// Creates a sortable column.
    pub fn new(field: impl Into<String>, header_name: impl Into<String>, width: u16) -> Self {
        Self {
            field: field.into(),
            header_name: header_name.into(),
            width,
            sortable: true,
            source: None,
        }
    }

    /// Reads the column value from a nested path in the raw record.
    pub fn source(mut self, path: impl Into<String>) -> Self {
        self.source = Some(path.into());
        self
    }

    /// Disables sorting on this column.
    pub fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    /// The synthetic expand/collapse column.
    pub fn expand() -> Self {
        Self::new(EXPAND_FIELD, "", EXPAND_WIDTH).unsortable()
    }

    /// Path used to look the value up in a raw record.
    pub fn source_path(&self) -> &str {
        self.source.as_deref().unwrap_or(&self.field)
    }
}

/// Where the expand/collapse column is placed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpandIconPosition {
    /// First column.
    #[default]
    Start,
    /// Last column.
    End,
    /// No expand column; clicking a row toggles it instead.
    None,
}

/// Adds the expand column to `columns` according to `position`.
pub fn with_expand_column(columns: &[ColumnDef], position: ExpandIconPosition) -> Vec<ColumnDef> {
    let mut complete = Vec::with_capacity(columns.len() + 1);
    match position {
        ExpandIconPosition::None => complete.extend_from_slice(columns),
        ExpandIconPosition::Start => {
            complete.push(ColumnDef::expand());
            complete.extend_from_slice(columns);
        }
        ExpandIconPosition::End => {
            complete.extend_from_slice(columns);
            complete.push(ColumnDef::expand());
        }
    }
    complete
}

/// Looks up a dotted path (`company.name`) in a JSON value.
pub fn lookup_path<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(record, |current, segment| current.get(segment))
}

/// Projects a raw record onto a flat row with the id and one entry per column.
///
/// Missing values become empty strings so every normalized row carries
/// every column.
pub fn project_columns(record: &Value, columns: &[ColumnDef], id_field: &str) -> Value {
    let mut row = Map::new();
    if let Some(id) = record.get(id_field) {
        row.insert("id".to_string(), id.clone());
    }
    for column in columns {
        let value = lookup_path(record, column.source_path())
            .filter(|v| !v.is_null())
            .cloned()
            .unwrap_or_else(|| Value::String(String::new()));
        row.insert(column.field.clone(), value);
    }
    Value::Object(row)
}
