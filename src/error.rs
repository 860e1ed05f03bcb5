//! Error taxonomy for the dispatch boundary.
//!
//! Every fault a caller can observe is one of these kinds; extractor
//! internals use `anyhow` and are classified here before leaving the
//! dispatch layer.

use thiserror::Error;

/// Outward-facing extraction errors.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The input could not be parsed as a URL.
    #[error("invalid URL format")]
    InvalidInput,

    /// The normalized host has no registry entry.
    #[error("website '{0}' is not supported yet")]
    UnsupportedSite(String),

    /// Extraction finished but produced no quality links.
    #[error("extraction finished, but no quality links were found")]
    NoQualitiesFound,

    /// Page navigation did not complete within the timeout.
    #[error("navigation timed out after {0}ms")]
    NavigationTimeout(u64),

    /// Catch-all for parsing and interaction faults.
    #[error("extraction failed: {0}")]
    ExtractionFailed(String),
}

impl ExtractError {
    /// HTTP status code this error maps to at the request boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            ExtractError::InvalidInput => 400,
            ExtractError::UnsupportedSite(_) => 404,
            ExtractError::NoQualitiesFound => 404,
            ExtractError::NavigationTimeout(_) => 504,
            ExtractError::ExtractionFailed(_) => 500,
        }
    }
}

impl From<anyhow::Error> for ExtractError {
    fn from(e: anyhow::Error) -> Self {
        // Preserve an already-classified error instead of re-wrapping it.
        match e.downcast::<ExtractError>() {
            Ok(kind) => kind,
            Err(e) => ExtractError::ExtractionFailed(format!("{e:#}")),
        }
    }
}
