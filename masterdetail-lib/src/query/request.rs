//! Request parameters for one page fetch.

use super::PaginationModel;
use super::SortModel;

/// Pagination and sort for a single page request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageRequest {
    /// Requested page.
    pub pagination: PaginationModel,
    /// Requested ordering.
    pub sort: SortModel,
}

impl PageRequest {
    /// Creates a request.
    pub fn new(pagination: PaginationModel, sort: SortModel) -> Self {
        Self { pagination, sort }
    }

    /// Query parameters in wire order: `_page`, `_limit`, then `_sort`/`_order`.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("_page", self.pagination.page_number().to_string()),
            ("_limit", self.pagination.page_size.to_string()),
        ];
        if let Some(sort) = self.sort.primary() {
            pairs.push(("_sort", sort.field.clone()));
            pairs.push(("_order", sort.direction.as_str().to_string()));
        }
        pairs
    }

    /// Renders the query string without a leading `?`.
    pub fn query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query_pairs())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsorted_query() {
        let request = PageRequest::new(PaginationModel::new(0, 5), SortModel::none());
        assert_eq!(request.query_string(), "_page=1&_limit=5");
    }

    #[test]
    fn test_sorted_query() {
        let request = PageRequest::new(PaginationModel::new(2, 10), SortModel::desc("title"));
        assert_eq!(
            request.query_string(),
            "_page=3&_limit=10&_sort=title&_order=desc"
        );
    }

    #[test]
    fn test_field_is_escaped() {
        let request = PageRequest::new(PaginationModel::new(0, 5), SortModel::asc("a b"));
        assert_eq!(request.query_string(), "_page=1&_limit=5&_sort=a+b&_order=asc");
    }
}
