//! Master-detail grid coordination library
//!
//! Fetch coordination for a paginated, sortable master table whose rows
//! expand into tabbed, independently paginated detail tables, all backed
//! by a REST API with server-side paging (`_page`, `_limit`, `_sort`,
//! `_order`, `X-Total-Count`).
//!
//! Each table has a coordinator that tracks the one request it still
//! cares about; responses for superseded requests are dropped.

pub mod compose;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod expansion;
pub mod grid;
pub mod model;
pub mod query;
pub mod relation;
pub mod source;

mod client;

pub use client::*;
pub use config::GridConfig;
pub use grid::GridBuilder;
pub use grid::GridEvent;
pub use grid::MasterDetailGrid;
pub use source::DataSource;
