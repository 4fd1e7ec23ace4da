//! Fetch coordinators.
//!
//! A coordinator owns one server-paginated table: its page, its sort, the
//! rows last applied and a loading/error flag. Parameter changes dispatch
//! a fetch through a [`DataSource`](crate::DataSource); the coordinator
//! keeps exactly one fetch current and ignores every other response.
//!
//! - [`MasterCoordinator`] - the master table
//! - [`DetailCoordinator`] - one expanded row's tabbed detail table

mod core;
mod detail;
mod fingerprint;
mod master;

pub use core::FetchHandle;
pub use core::FetchOptions;
pub use core::FetchOutcome;
pub use core::FetchState;
pub use core::RowMapper;
pub use core::raw_rows;
pub use detail::DetailCoordinator;
pub use fingerprint::RequestFingerprint;
pub use fingerprint::RequestTracker;
pub use fingerprint::Scope;
pub use fingerprint::Ticket;
pub use master::MasterCoordinator;
