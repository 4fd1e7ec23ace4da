//! Row identity.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// Stable identifier of a master row.
///
/// Ids arrive as JSON numbers or strings; both are kept in their textual
/// form, which is also what endpoint templates and marker ids use.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(String);

impl RowId {
    /// Creates an id from its textual form.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Reads `field` from a JSON object as an id.
    ///
    /// Returns `None` for missing fields and for values that are neither
    /// strings nor numbers.
    pub fn from_value(record: &Value, field: &str) -> Option<Self> {
        match record.get(field)? {
            Value::String(s) => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RowId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RowId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for RowId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<i64> for RowId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

/// Trait for normalized master rows.
///
/// Implement this for the type produced by the master row mapping. Rows
/// without an id are displayed but can never be expanded.
///
/// # Example
///
/// ```
/// use masterdetail_lib::model::{GridRow, RowId};
///
/// #[derive(Clone)]
/// struct User {
///     id: u64,
///     name: String,
/// }
///
/// impl GridRow for User {
///     fn row_id(&self) -> Option<RowId> {
///         Some(RowId::from(self.id))
///     }
/// }
/// ```
pub trait GridRow: Clone + Send + Sync + 'static {
    /// Returns the row's unique id.
    fn row_id(&self) -> Option<RowId>;
}

impl GridRow for Value {
    fn row_id(&self) -> Option<RowId> {
        RowId::from_value(self, "id")
    }
}
