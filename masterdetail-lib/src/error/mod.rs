//! Error types

mod api;
mod config;
mod fetch;

pub use api::*;
pub use config::*;
pub use fetch::*;

/// Top-level error for fallible library operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error talking to the REST data source.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Invalid or incomplete grid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
