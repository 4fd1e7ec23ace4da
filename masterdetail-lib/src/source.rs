//! DataSource trait

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ApiError;
use crate::query::Page;
use crate::query::PageRequest;

/// A server that returns one page of records for an endpoint.
///
/// [`RestClient`](crate::RestClient) is the HTTP implementation. Coordinators
/// hold the source as `Arc<dyn DataSource>`, so tests and embedders can
/// substitute their own.
///
/// Implementations must not retry on their own: a failed page is reported
/// once and the coordinator decides what to show.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetches a page of raw records from `endpoint`.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Path relative to the source's base URL (e.g. `users/7/posts`)
    /// * `request` - Page and sort to request
    async fn fetch_page(&self, endpoint: &str, request: &PageRequest) -> Result<Page<Value>, ApiError>;
}
