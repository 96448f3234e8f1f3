//! Error types for wxplot crates.

use thiserror::Error;

/// Result type alias using WxError.
pub type WxResult<T> = Result<T, WxError>;

/// Primary error type for selection, decoding and rendering.
#[derive(Debug, Error)]
pub enum WxError {
    // === Selection Errors ===
    #[error("Dataset access failed: {0}")]
    DatasetAccess(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Unit error: {0}")]
    Units(String),

    // === Catalog Errors ===
    #[error("Catalog initialization failed: {0}")]
    CatalogInit(String),

    #[error("Catalog not found: {0}")]
    CatalogNotFound(String),

    #[error("HTTP error: {0}")]
    Http(String),

    // === Data Errors ===
    #[error("Invalid NetCDF data: {0}")]
    NetCdf(String),

    // === Output Errors ===
    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl WxError {
    /// True for transport failures that a day-partitioned selection treats
    /// as "no datasets that day".
    pub fn is_missing_catalog(&self) -> bool {
        matches!(self, WxError::CatalogNotFound(_) | WxError::Http(_))
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        WxError::InvalidValue(msg.into())
    }

    pub fn access(msg: impl Into<String>) -> Self {
        WxError::DatasetAccess(msg.into())
    }
}

impl From<std::io::Error> for WxError {
    fn from(err: std::io::Error) -> Self {
        WxError::Io(err.to_string())
    }
}

impl From<serde_yaml::Error> for WxError {
    fn from(err: serde_yaml::Error) -> Self {
        WxError::Config(err.to_string())
    }
}
