//! Configuration error types

/// Errors caused by grid configuration rather than the network.
///
/// A missing relation or endpoint degrades the affected detail table to an
/// empty result; it is logged but never surfaced as a fetch error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// No relation is configured for the tab.
    #[error("No relation configuration found for tab {tab}")]
    MissingRelation {
        /// Tab index.
        tab: usize,
    },

    /// The relation for the tab has an empty endpoint.
    #[error("No endpoint defined for tab {tab}")]
    MissingEndpoint {
        /// Tab index.
        tab: usize,
    },

    /// A page size of zero was configured.
    #[error("Page size for {name} must be positive")]
    InvalidPageSize {
        /// Name of the offending option.
        name: &'static str,
    },

    /// A required option is empty.
    #[error("Missing value for {name}")]
    MissingValue {
        /// Name of the offending option.
        name: &'static str,
    },
}
