use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::CrawlConfig;
use crate::models::ListingRecord;
use crate::scrapers::traits::Fetch;

/// Mirrors listing pictures into the region's directory tree.
/// A file already on disk counts as done and is never fetched again.
pub struct ImageFetcher {
    fetcher: Arc<dyn Fetch>,
    config: Arc<CrawlConfig>,
}

impl ImageFetcher {
    pub fn new(fetcher: Arc<dyn Fetch>, config: Arc<CrawlConfig>) -> Self {
        Self { fetcher, config }
    }

    /// Download every image referenced by `listings` that is not yet on disk.
    /// Unsold pictures are processed before sold ones. Individual failures
    /// are logged and do not stop the rest.
    pub async fn fetch_images(&self, region: &str, listings: &[ListingRecord]) {
        let mut fetched = 0usize;
        let mut skipped = 0usize;

        for listing in listings {
            let paths = listing.images.unsold.iter().chain(&listing.images.sold);
            for path in paths {
                match self.fetch_one(region, path).await {
                    Ok(true) => fetched += 1,
                    Ok(false) => skipped += 1,
                    Err(e) => warn!(listing = listing.id, image = %path, error = %e, "Image fetch failed"),
                }
            }
        }

        info!(region = %region, fetched = fetched, skipped = skipped, "Image mirroring done");
    }

    /// Returns Ok(true) when the image was downloaded, Ok(false) when it was
    /// already present.
    async fn fetch_one(&self, region: &str, path: &str) -> anyhow::Result<bool> {
        let target = self.config.image_target(region, path);

        if tokio::fs::try_exists(&target).await.unwrap_or(false) {
            debug!(image = %path, "Already mirrored, skipping");
            return Ok(false);
        }

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let url = self.config.image_url(path);
        let bytes = self.fetcher.fetch(&url).await?;
        tokio::fs::write(&target, &bytes).await?;

        debug!(image = %path, bytes = bytes.len(), "Mirrored image");
        Ok(true)
    }
}
