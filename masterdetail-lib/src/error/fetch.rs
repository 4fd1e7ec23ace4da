//! Fetch failure surfaced through coordinator state

use super::ApiError;

/// Message shown for every failed fetch.
pub const FETCH_FAILED: &str = "Failed to fetch data";

/// A failed fetch as recorded in coordinator state.
///
/// Unlike [`ApiError`] this is cheap to clone, so it can live inside state
/// snapshots handed to the display layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    /// Generic, user-facing message.
    pub message: String,
    /// Underlying error description.
    pub detail: String,
    /// HTTP status, when the server answered.
    pub status: Option<u16>,
}

impl From<&ApiError> for FetchFailure {
    fn from(err: &ApiError) -> Self {
        Self {
            message: FETCH_FAILED.to_string(),
            detail: err.to_string(),
            status: err.status_code(),
        }
    }
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.message, self.detail)
    }
}
