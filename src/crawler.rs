use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{Mutex, Semaphore};
use tracing::{info, warn};

use crate::config::CrawlConfig;
use crate::models::ListingRecord;
use crate::scrapers::city::CityCollector;
use crate::scrapers::error::ScrapeError;
use crate::scrapers::images::ImageFetcher;
use crate::scrapers::listing::ListingScraper;
use crate::scrapers::traits::Fetch;

/// Drives a full region crawl: city pages -> deduplicated listing URLs ->
/// extracted records -> JSON artifact + mirrored images.
pub struct Crawler {
    config: Arc<CrawlConfig>,
    cities: CityCollector,
    listings: ListingScraper,
    images: ImageFetcher,
    limiter: Arc<Semaphore>,
    region_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Crawler {
    pub fn new(fetcher: Arc<dyn Fetch>, config: Arc<CrawlConfig>) -> Self {
        Self {
            cities: CityCollector::new(fetcher.clone(), config.clone()),
            listings: ListingScraper::new(fetcher.clone(), config.clone()),
            images: ImageFetcher::new(fetcher, config.clone()),
            limiter: Arc::new(Semaphore::new(config.max_concurrent_requests.max(1))),
            region_locks: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Crawl one region end to end. Only an unconfigured region aborts;
    /// failed cities and failed listings degrade to smaller results.
    pub async fn run_crawl(&self, region: &str) -> Result<Vec<ListingRecord>, ScrapeError> {
        let region = region.to_lowercase();
        let cities: Vec<String> = self
            .config
            .cities(&region)
            .ok_or_else(|| ScrapeError::UnknownRegion(region.clone()))?
            .to_vec();

        // One crawl per region at a time; concurrent triggers queue up here
        // instead of racing on the artifacts.
        let lock = self.region_lock(&region).await;
        let _guard = lock.lock().await;

        info!(region = %region, cities = cities.len(), "Starting region crawl");

        let urls = self.collect_links(&region, &cities).await;
        info!(region = %region, listings = urls.len(), "Discovered listing URLs");

        let records = self.scrape_listings(&urls).await;
        info!(
            region = %region,
            extracted = records.len(),
            dropped = urls.len() - records.len(),
            "Extraction finished"
        );

        self.persist(&region, &urls, &records).await?;
        self.images.fetch_images(&region, &records).await;

        Ok(records)
    }

    async fn region_lock(&self, region: &str) -> Arc<Mutex<()>> {
        let mut locks = self.region_locks.lock().await;
        locks.entry(region.to_string()).or_default().clone()
    }

    /// Fan out across city pages, then merge in city-list order keeping the
    /// first occurrence of every listing URL. `join_all` returns results at
    /// their input positions, so completion order cannot reshuffle anything.
    async fn collect_links(&self, region: &str, cities: &[String]) -> Vec<String> {
        let results = join_all(cities.iter().map(|city_ref| {
            let limiter = self.limiter.clone();
            async move {
                let _permit = limiter.acquire().await.expect("request limiter closed");
                self.cities.collect(region, city_ref).await
            }
        }))
        .await;

        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for (city_ref, result) in cities.iter().zip(results) {
            match result {
                Ok(city_links) => {
                    for link in city_links {
                        if seen.insert(link.clone()) {
                            links.push(link);
                        }
                    }
                }
                Err(e) => {
                    warn!(city = %city_ref, error = %e, "City page failed, continuing without it")
                }
            }
        }

        links
    }

    /// Fetch and extract every listing concurrently; failures drop out of the
    /// result but keep their log line.
    async fn scrape_listings(&self, urls: &[String]) -> Vec<ListingRecord> {
        let results = join_all(urls.iter().map(|url| {
            let limiter = self.limiter.clone();
            async move {
                let _permit = limiter.acquire().await.expect("request limiter closed");
                self.listings.scrape(url).await
            }
        }))
        .await;

        urls.iter()
            .zip(results)
            .filter_map(|(url, result)| match result {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(url = %url, error = %e, "Dropping listing");
                    None
                }
            })
            .collect()
    }

    /// Overwrite the region's JSON artifact and its sorted link index
    async fn persist(
        &self,
        region: &str,
        urls: &[String],
        records: &[ListingRecord],
    ) -> Result<(), ScrapeError> {
        tokio::fs::create_dir_all(&self.config.data_dir).await?;

        let json = serde_json::to_string_pretty(records)?;
        tokio::fs::write(self.config.region_json(region), json).await?;

        let mut sorted = urls.to_vec();
        sorted.sort();
        tokio::fs::write(self.config.region_links(region), sorted.join("\n")).await?;

        info!(region = %region, records = records.len(), "Wrote region artifacts");
        Ok(())
    }
}
