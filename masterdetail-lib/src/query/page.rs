//! Page type for paginated results.

/// A page of records with the server-reported total row count.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    records: Vec<T>,
    total_count: u64,
}

impl<T> Page<T> {
    /// Creates a page. `total_count` is the count across all pages.
    pub fn new(records: Vec<T>, total_count: u64) -> Self {
        Self {
            records,
            total_count,
        }
    }

    /// Returns a reference to the records in this page.
    pub fn records(&self) -> &[T] {
        &self.records
    }

    /// Consumes the page and returns the records.
    pub fn into_records(self) -> Vec<T> {
        self.records
    }

    /// Total number of rows across all pages (0 when the server did not say).
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// Returns `true` if this page has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the number of records in this page.
    pub fn len(&self) -> usize {
        self.records.len()
    }
}
