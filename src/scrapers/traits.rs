use async_trait::async_trait;

use crate::scrapers::error::ScrapeError;

/// Transport capability the pipeline depends on.
/// City pages, listing pages and images all come through here, which keeps
/// the collectors and the image fetcher testable without a network.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetch the body at `url`, treating any non-success status as an error
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ScrapeError>;
}
