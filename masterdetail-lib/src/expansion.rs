//! Per-row expansion flags and active detail tabs.

use std::collections::HashMap;
use std::collections::HashSet;

use crate::model::RowId;

/// Which master rows are expanded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    rows: HashSet<RowId>,
}

impl ExpansionState {
    /// Creates an empty state (every row collapsed).
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips a row's flag and returns the new value.
    pub fn toggle(&mut self, row_id: &RowId) -> bool {
        let expanded = !self.is_expanded(row_id);
        self.set(row_id.clone(), expanded);
        expanded
    }

    /// Sets a row's flag. Collapsed rows are not stored.
    pub fn set(&mut self, row_id: RowId, expanded: bool) {
        if expanded {
            self.rows.insert(row_id);
        } else {
            self.rows.remove(&row_id);
        }
    }

    /// Returns `true` if the row is expanded.
    pub fn is_expanded(&self, row_id: &RowId) -> bool {
        self.rows.contains(row_id)
    }

    /// Collapses every row.
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Ids of all expanded rows, in no particular order.
    pub fn expanded_ids(&self) -> impl Iterator<Item = &RowId> {
        self.rows.iter()
    }

    /// Number of expanded rows.
    pub fn expanded_count(&self) -> usize {
        self.rows.len()
    }
}

impl FromIterator<RowId> for ExpansionState {
    fn from_iter<I: IntoIterator<Item = RowId>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

/// Active detail tab per master row.
///
/// Entries survive collapse, so re-expanding a row reopens the tab it was
/// last showing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveTabs {
    tabs: HashMap<RowId, usize>,
}

impl ActiveTabs {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Active tab of a row, 0 if never changed.
    pub fn get(&self, row_id: &RowId) -> usize {
        self.tabs.get(row_id).copied().unwrap_or(0)
    }

    /// Records a row's active tab.
    pub fn set(&mut self, row_id: RowId, tab: usize) {
        self.tabs.insert(row_id, tab);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle() {
        let mut state = ExpansionState::new();
        let row = RowId::new("7");
        assert!(!state.is_expanded(&row));
        assert!(state.toggle(&row));
        assert!(state.is_expanded(&row));
        assert!(!state.toggle(&row));
        assert_eq!(state.expanded_count(), 0);
        assert!(state.rows.is_empty());
    }

    #[test]
    fn test_collapsed_rows_are_not_kept() {
        let mut state = ExpansionState::new();
        for id in 0..100u64 {
            let row = RowId::from(id);
            state.toggle(&row);
            state.toggle(&row);
        }
        state.set(RowId::new("x"), false);
        assert!(state.rows.is_empty());

        state.set(RowId::new("y"), true);
        assert_eq!(state.expanded_ids().collect::<Vec<_>>(), vec![&RowId::new("y")]);
    }

    #[test]
    fn test_clear() {
        let mut state: ExpansionState = [RowId::new("1"), RowId::new("2")].into_iter().collect();
        assert_eq!(state.expanded_count(), 2);
        state.clear();
        assert_eq!(state.expanded_count(), 0);
    }

    #[test]
    fn test_active_tab_defaults_to_zero() {
        let mut tabs = ActiveTabs::new();
        let row = RowId::new("4");
        assert_eq!(tabs.get(&row), 0);
        tabs.set(row.clone(), 2);
        assert_eq!(tabs.get(&row), 2);
    }
}
