use std::collections::HashSet;
use std::sync::Arc;

use scraper::{Html, Selector};
use tracing::{debug, info, warn};

use crate::config::CrawlConfig;
use crate::scrapers::error::ScrapeError;
use crate::scrapers::traits::Fetch;
use crate::utils::{absolute_url, city_slug};

/// Collects the listing URLs referenced on one city's sale directory page
pub struct CityCollector {
    fetcher: Arc<dyn Fetch>,
    config: Arc<CrawlConfig>,
}

impl CityCollector {
    pub fn new(fetcher: Arc<dyn Fetch>, config: Arc<CrawlConfig>) -> Self {
        Self { fetcher, config }
    }

    /// Fetch a city page and return its sale links as absolute URLs,
    /// in document order, deduplicated within the page.
    pub async fn collect(&self, region: &str, city_ref: &str) -> Result<Vec<String>, ScrapeError> {
        let url = self.config.city_url(city_ref);
        let slug = city_slug(city_ref);
        info!(city = %slug, "Processing city");

        let body = self.fetcher.fetch(&url).await?;
        let body = String::from_utf8_lossy(&body).into_owned();

        if self.config.cache_city_pages {
            self.cache_page(region, &slug, body.as_bytes()).await;
        }

        let links = Self::links_from_html(&body, &self.config.base_origin);
        debug!(city = %slug, links = links.len(), "Collected sale links");
        Ok(links)
    }

    fn links_from_html(html: &str, origin: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let link_selector = Selector::parse("#MainSaleListWrapper .saleItem .saleLink").unwrap();

        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for element in document.select(&link_selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            match absolute_url(href, origin) {
                Some(link) => {
                    if seen.insert(link.clone()) {
                        links.push(link);
                    }
                }
                None => warn!(href = %href, "Skipping unresolvable sale link"),
            }
        }

        links
    }

    /// Keep a raw copy of the page next to the region artifacts.
    /// Debug aid only; failures must not fail the crawl.
    async fn cache_page(&self, region: &str, slug: &str, body: &[u8]) {
        let dir = self.config.region_dir(region);
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            warn!(city = %slug, error = %e, "Could not create city cache directory");
            return;
        }

        let path = dir.join(format!("{slug}.html"));
        if let Err(e) = tokio::fs::write(&path, body).await {
            warn!(city = %slug, error = %e, "Could not cache city page");
        }
    }
}
