use std::path::PathBuf;
use thiserror::Error;

use crate::models::Shop;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] rquest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Forbidden - Access denied")]
    Forbidden,

    #[error("Page not found")]
    PageNotFound,

    #[error("Extraction failed for {shop}: {reason}")]
    Extraction { shop: Shop, reason: String },

    #[error("Malformed snapshot {}: {reason}", path.display())]
    Format { path: PathBuf, reason: String },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("No shop produced any listings")]
    NoData,
}

impl Error {
    /// Transient failures worth another attempt; a 404 while walking
    /// pagination or a 403 block is a signal, not a hiccup.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Http(_) | Error::Io(_) | Error::RateLimit)
    }

    pub fn extraction(shop: Shop, reason: impl Into<String>) -> Self {
        Error::Extraction {
            shop,
            reason: reason.into(),
        }
    }

    pub fn format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::Format {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
