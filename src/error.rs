//! Error types for the asset pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while generating or exporting an asset
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to load a template document
    #[error("Failed to load template: {0}")]
    TemplateLoad(String),

    /// A named preview target does not exist
    #[error("Target not found: {0}")]
    TargetMissing(String),

    /// The capture container never appeared within its bounded wait
    #[error("Template container not found")]
    ContainerMissing,

    /// The capture container has zero pixel dimensions
    #[error("Template container not rendered")]
    NotRendered,

    /// Rasterization produced no usable bitmap
    #[error("Rasterization failed: {0}")]
    RasterError(String),

    /// Encoding or delivering an export failed
    #[error("Export failed: {0}")]
    ExportError(String),

    /// An asset could not be fetched
    #[error("Asset error: {0}")]
    AssetError(String),

    /// Operation timed out
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// Another operation is already in flight for this template variant
    #[error("A {0} operation is already in flight")]
    Busy(&'static str),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}
