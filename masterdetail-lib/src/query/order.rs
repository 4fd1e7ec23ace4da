//! Sorting types for server-side ordering.

use serde::Deserialize;
use serde::Serialize;

/// Sort direction for ordering results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Ascending order (A-Z, 0-9).
    Asc,
    /// Descending order (Z-A, 9-0).
    Desc,
}

impl Direction {
    /// Returns the `_order` query value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// Parses `asc`/`desc` (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single sorted field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortField {
    /// Field name sent as `_sort`.
    pub field: String,
    /// Direction sent as `_order`.
    pub direction: Direction,
}

impl SortField {
    /// Creates a sorted field.
    pub fn new(field: impl Into<String>, direction: Direction) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

/// Specifies the ordering of a server-paginated table.
///
/// Only single-column sorting is supported: the model holds at most one
/// field. Building it from a longer list keeps the first entry.
///
/// # Example
///
/// ```
/// use masterdetail_lib::query::{Direction, SortField, SortModel};
///
/// let sort = SortModel::desc("name");
/// assert_eq!(sort.primary().map(|s| s.direction), Some(Direction::Desc));
///
/// let truncated = SortModel::from_fields([
///     SortField::new("name", Direction::Asc),
///     SortField::new("email", Direction::Desc),
/// ]);
/// assert_eq!(truncated, SortModel::asc("name"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortModel {
    field: Option<SortField>,
}

impl SortModel {
    /// No sorting.
    pub fn none() -> Self {
        Self::default()
    }

    /// Ascending order on a field.
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: Some(SortField::new(field, Direction::Asc)),
        }
    }

    /// Descending order on a field.
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: Some(SortField::new(field, Direction::Desc)),
        }
    }

    /// Builds a model from an ordered list of fields, keeping only the first.
    pub fn from_fields(fields: impl IntoIterator<Item = SortField>) -> Self {
        Self {
            field: fields.into_iter().next(),
        }
    }

    /// Returns the sorted field, if any.
    pub fn primary(&self) -> Option<&SortField> {
        self.field.as_ref()
    }

    /// Returns `true` if no field is sorted.
    pub fn is_empty(&self) -> bool {
        self.field.is_none()
    }

    /// Key used inside request fingerprints: `field-direction` or `default`.
    pub fn key(&self) -> String {
        match &self.field {
            Some(s) => format!("{}-{}", s.field, s.direction),
            None => "default".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fields_keeps_first() {
        let sort = SortModel::from_fields(vec![
            SortField::new("title", Direction::Desc),
            SortField::new("id", Direction::Asc),
        ]);
        assert_eq!(sort.primary(), Some(&SortField::new("title", Direction::Desc)));
        assert!(SortModel::from_fields(Vec::new()).is_empty());
    }

    #[test]
    fn test_key() {
        assert_eq!(SortModel::none().key(), "default");
        assert_eq!(SortModel::asc("name").key(), "name-asc");
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!(Direction::parse("DESC"), Some(Direction::Desc));
        assert_eq!(Direction::parse("sideways"), None);
    }
}
