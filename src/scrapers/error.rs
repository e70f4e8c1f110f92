use thiserror::Error;

/// Error type for crawl and extraction operations
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Region code with no configured city list; the only error that aborts a crawl
    #[error("unknown region: {0}")]
    UnknownRegion(String),

    /// Transport failure or non-success status for one URL
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Listing page could not be read as a sale listing
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// Artifact write failure
    #[error("persistence error: {0}")]
    Persistence(#[from] std::io::Error),

    /// Artifact serialization failure
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScrapeError {
    pub fn fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}
