//! Pagination and sorting models for server-side paging.
//!
//! - [`PaginationModel`] - 0-based page index plus page size
//! - [`SortModel`] - at most one sorted field
//! - [`PageRequest`] - the pair above, rendered as `_page`/`_limit`/`_sort`/`_order`
//! - [`Page`] - a page of records with the server-reported total count

mod order;
mod page;
mod pagination;
mod request;

pub use order::Direction;
pub use order::SortField;
pub use order::SortModel;
pub use page::Page;
pub use pagination::PaginationModel;
pub use request::PageRequest;
