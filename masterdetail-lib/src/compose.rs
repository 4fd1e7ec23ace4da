//! Row composition: master rows interleaved with detail markers.

use crate::expansion::ExpansionState;
use crate::model::GridRow;
use crate::model::RowId;

/// Prefix of detail marker ids.
pub const DETAIL_ID_PREFIX: &str = "detail-";

/// Pseudo-row telling the display to render the detail panel of `parent_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DetailMarker {
    /// `detail-{parent_id}`.
    pub id: String,
    /// The expanded master row.
    pub parent_id: RowId,
}

impl DetailMarker {
    /// Creates the marker for a parent row.
    pub fn new(parent_id: RowId) -> Self {
        Self {
            id: format!("{}{}", DETAIL_ID_PREFIX, parent_id),
            parent_id,
        }
    }
}

/// A row as handed to the grid display.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayRow<R> {
    /// A normalized master row.
    Master(R),
    /// The detail panel of the preceding master row.
    Detail(DetailMarker),
}

impl<R: GridRow> DisplayRow<R> {
    /// Returns `true` for detail markers.
    pub fn is_detail(&self) -> bool {
        matches!(self, Self::Detail(_))
    }

    /// Display id: the row id for master rows, `detail-{parent}` for markers.
    pub fn display_id(&self) -> Option<String> {
        match self {
            Self::Master(row) => row.row_id().map(|id| id.to_string()),
            Self::Detail(marker) => Some(marker.id.clone()),
        }
    }

    /// Returns the master row, if this is one.
    pub fn as_master(&self) -> Option<&R> {
        match self {
            Self::Master(row) => Some(row),
            Self::Detail(_) => None,
        }
    }
}

/// Interleaves master rows with one detail marker after each expanded row.
///
/// Master rows keep their order. Rows without an id are never followed by
/// a marker.
pub fn compose<R: GridRow>(rows: &[R], expansion: &ExpansionState) -> Vec<DisplayRow<R>> {
    let mut display = Vec::with_capacity(rows.len() + expansion.expanded_count());
    for row in rows {
        display.push(DisplayRow::Master(row.clone()));
        if let Some(id) = row.row_id()
            && expansion.is_expanded(&id)
        {
            display.push(DisplayRow::Detail(DetailMarker::new(id)));
        }
    }
    display
}

#[cfg(test)]
mod tests {
    use serde_json::Value;
    use serde_json::json;

    use super::*;

    fn rows() -> Vec<Value> {
        (1..=4).map(|id| json!({ "id": id, "name": format!("user {}", id) })).collect()
    }

    fn marker_parents(display: &[DisplayRow<Value>]) -> Vec<String> {
        display
            .iter()
            .filter_map(|r| match r {
                DisplayRow::Detail(m) => Some(m.parent_id.to_string()),
                DisplayRow::Master(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_no_expansion_is_identity() {
        let display = compose(&rows(), &ExpansionState::new());
        assert_eq!(display.len(), 4);
        assert!(display.iter().all(|r| !r.is_detail()));
    }

    #[test]
    fn test_marker_follows_expanded_row() {
        let expansion: ExpansionState = [RowId::new("2"), RowId::new("4")].into_iter().collect();
        let display = compose(&rows(), &expansion);

        let ids: Vec<_> = display.iter().filter_map(|r| r.display_id()).collect();
        assert_eq!(ids, ["1", "2", "detail-2", "3", "4", "detail-4"]);
        assert_eq!(marker_parents(&display), ["2", "4"]);
    }

    #[test]
    fn test_collapsed_rows_get_no_marker() {
        let mut expansion = ExpansionState::new();
        expansion.set(RowId::new("1"), false);
        expansion.set(RowId::new("3"), true);
        let display = compose(&rows(), &expansion);
        assert_eq!(marker_parents(&display), ["3"]);
    }

    #[test]
    fn test_expanded_id_not_on_page_is_ignored() {
        let expansion: ExpansionState = [RowId::new("99")].into_iter().collect();
        assert_eq!(compose(&rows(), &expansion).len(), 4);
    }

    #[test]
    fn test_row_without_id_never_expands() {
        let rows = vec![json!({ "name": "anonymous" })];
        let expansion: ExpansionState = [RowId::new("")].into_iter().collect();
        assert_eq!(compose(&rows, &expansion).len(), 1);
    }
}
