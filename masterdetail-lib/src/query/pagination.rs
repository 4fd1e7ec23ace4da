//! Pagination model.

use serde::Deserialize;
use serde::Serialize;

/// Current page of a server-paginated table.
///
/// `page_index` is 0-based as the display layer reports it; the wire
/// format uses [`page_number`](Self::page_number), which is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaginationModel {
    /// 0-based page index.
    pub page_index: usize,
    /// Rows per page. Always positive.
    pub page_size: usize,
}

impl PaginationModel {
    /// Creates a model, clamping a zero page size to one.
    pub fn new(page_index: usize, page_size: usize) -> Self {
        Self {
            page_index,
            page_size: page_size.max(1),
        }
    }

    /// First page with the given size.
    pub fn first(page_size: usize) -> Self {
        Self::new(0, page_size)
    }

    /// 1-based page number sent as `_page`.
    pub fn page_number(&self) -> usize {
        self.page_index + 1
    }

    /// Same page size, back on page 0.
    pub fn reset(&self) -> Self {
        Self::first(self.page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_number_is_one_based() {
        assert_eq!(PaginationModel::new(0, 5).page_number(), 1);
        assert_eq!(PaginationModel::new(3, 5).page_number(), 4);
    }

    #[test]
    fn test_zero_page_size_clamped() {
        assert_eq!(PaginationModel::new(2, 0).page_size, 1);
    }

    #[test]
    fn test_reset_keeps_size() {
        assert_eq!(PaginationModel::new(4, 15).reset(), PaginationModel::new(0, 15));
    }
}
