use std::sync::Arc;

use chrono::Utc;
use indexmap::IndexMap;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::config::CrawlConfig;
use crate::models::{Address, DateRange, Images, ListingRecord, Organisation};
use crate::scrapers::error::ScrapeError;
use crate::scrapers::sanitize::sanitize;
use crate::scrapers::traits::Fetch;

/// Fetches a listing page and turns it into a `ListingRecord`
pub struct ListingScraper {
    fetcher: Arc<dyn Fetch>,
    config: Arc<CrawlConfig>,
}

impl ListingScraper {
    pub fn new(fetcher: Arc<dyn Fetch>, config: Arc<CrawlConfig>) -> Self {
        Self { fetcher, config }
    }

    pub async fn scrape(&self, url: &str) -> Result<ListingRecord, ScrapeError> {
        let id = listing_id(url)
            .ok_or_else(|| ScrapeError::Extraction(format!("no numeric listing id in {url}")))?;

        let body = self.fetcher.fetch(url).await?;
        let body = String::from_utf8_lossy(&body);

        debug!(id = id, bytes = body.len(), "Extracting listing");
        extract(id, &body, &self.config.image_origin)
    }
}

/// Numeric listing id from the trailing path segment of a listing URL
pub fn listing_id(url: &str) -> Option<u64> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|segment| segment.parse().ok())
}

/// Build a `ListingRecord` from one listing page's markup.
/// Missing optional fields fall back to their empty forms; the only hard
/// failure is a page without a sale name, which is not a listing page.
pub fn extract(id: u64, html: &str, image_origin: &str) -> Result<ListingRecord, ScrapeError> {
    let document = Html::parse_document(html);

    let name_selector = Selector::parse("#saleName").unwrap();
    let name = document
        .select(&name_selector)
        .next()
        .map(element_text)
        .ok_or_else(|| ScrapeError::Extraction(format!("listing {id}: sale name not found")))?;

    Ok(ListingRecord {
        id,
        name,
        address: extract_address(&document),
        dates: extract_dates(&document),
        description: extract_description(&document),
        images: extract_images(&document, image_origin),
        organisation: extract_organisation(&document),
        scraped_at: Utc::now(),
    })
}

fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn text_in(scope: ElementRef, selector: &Selector) -> String {
    scope.select(selector).next().map(element_text).unwrap_or_default()
}

/// Location microdata block. The city text carries a trailing comma on the
/// page ("Ann Arbor,") which is stripped here.
fn extract_address(document: &Html) -> Address {
    let block_selector = Selector::parse(r#"[itemtype*="PostalAddress"]"#).unwrap();
    let Some(block) = document.select(&block_selector).next() else {
        return Address::default();
    };

    let street = Selector::parse(r#"[itemprop="streetAddress"]"#).unwrap();
    let locality = Selector::parse(r#"[itemprop="addressLocality"]"#).unwrap();
    let region = Selector::parse(r#"[itemprop="addressRegion"]"#).unwrap();
    let postal = Selector::parse(r#"[itemprop="postalCode"]"#).unwrap();

    Address {
        address: text_in(block, &street),
        city: text_in(block, &locality)
            .trim_end_matches(',')
            .trim()
            .to_string(),
        state: text_in(block, &region),
        zip: text_in(block, &postal),
    }
}

/// Sale dates block: one day per line, each line shaped like
/// "Fri 9am - 4pm". Lines that do not fit are skipped, not fatal.
fn extract_dates(document: &Html) -> IndexMap<String, DateRange> {
    let mut dates = IndexMap::new();

    let block_selector = Selector::parse("#saleDates").unwrap();
    let Some(block) = document.select(&block_selector).next() else {
        return dates;
    };

    for line in lines_of(&block.inner_html()) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != 4 || tokens[2] != "-" {
            warn!(line = %line, "Skipping malformed sale date line");
            continue;
        }
        dates.insert(
            tokens[0].to_string(),
            DateRange {
                starts: tokens[1].to_string(),
                ends: tokens[3].to_string(),
            },
        );
    }

    dates
}

/// Treat markup line breaks as record separators, then drop the remaining tags
fn lines_of(inner_html: &str) -> Vec<String> {
    let normalized = inner_html
        .replace("<br />", "\n")
        .replace("<br/>", "\n")
        .replace("<br>", "\n");

    Html::parse_fragment(&normalized)
        .root_element()
        .text()
        .collect::<String>()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Description block scoped to the event microdata container. Absent means
/// absent; present markup never lands on disk unsanitized.
fn extract_description(document: &Html) -> Option<String> {
    let selector = Selector::parse(r#"[itemtype*="Event"] [itemprop="description"]"#).unwrap();
    document
        .select(&selector)
        .next()
        .map(|block| sanitize(&block.inner_html()))
}

/// Sale pictures, partitioned by the sold marker, with the picture host
/// origin stripped so only origin-relative paths are stored.
fn extract_images(document: &Html, image_origin: &str) -> Images {
    let picture_selector = Selector::parse("a.salePicture").unwrap();
    let mut images = Images::default();

    for element in document.select(&picture_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let path = href.strip_prefix(image_origin).unwrap_or(href).to_string();

        if element.value().attr("data-sold").is_some() {
            images.sold.push(path);
        } else {
            images.unsold.push(path);
        }
    }

    images
}

fn extract_organisation(document: &Html) -> Organisation {
    let block_selector = Selector::parse(r#"[itemtype*="Organization"]"#).unwrap();
    let Some(block) = document.select(&block_selector).next() else {
        return Organisation::default();
    };

    let name = Selector::parse(r#"[itemprop="name"]"#).unwrap();
    let telephone = Selector::parse(r#"[itemprop="telephone"]"#).unwrap();
    let url = Selector::parse(r#"[itemprop="url"]"#).unwrap();

    Organisation {
        name: text_in(block, &name),
        telephone: text_in(block, &telephone),
        url: text_in(block, &url),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMAGE_ORIGIN: &str = "http://pictures.estatesales.net";

    const LISTING_PAGE: &str = r##"
        <html><body>
        <div itemscope itemtype="http://schema.org/Event">
            <h1 id="saleName">  Grand Rapids Antique Clearout  </h1>
            <div itemprop="location" itemscope itemtype="http://schema.org/PostalAddress">
                <span itemprop="streetAddress"> 414 Division Ave </span>
                <span itemprop="addressLocality">Grand Rapids,</span>
                <span itemprop="addressRegion"> MI </span>
                <span itemprop="postalCode">49503</span>
            </div>
            <div id="saleDates">
                Fri 9am - 4pm<br>
                Sat 9am - 2pm<br/>
                Sun 10am - 1pm
            </div>
            <div itemprop="description">
                <p>Full house of <strong>oak furniture</strong>.</p>
                <script>alert('x')</script>
            </div>
            <a class="salePicture" href="http://pictures.estatesales.net/img/77/front.jpg">f</a>
            <a class="salePicture" data-sold href="http://pictures.estatesales.net/img/77/clock.jpg">c</a>
            <a class="salePicture" href="/img/77/side.jpg">s</a>
        </div>
        <div itemscope itemtype="http://schema.org/Organization">
            <span itemprop="name">Lakeshore Estate Services</span>
            <span itemprop="telephone">616-555-0142</span>
            <span itemprop="url">http://lakeshore.example</span>
        </div>
        </body></html>
    "##;

    #[test]
    fn test_listing_id() {
        assert_eq!(listing_id("http://www.estatesales.net/ID/1001"), Some(1001));
        assert_eq!(listing_id("http://www.estatesales.net/ID/1001/"), Some(1001));
        assert_eq!(listing_id("http://www.estatesales.net/about"), None);
    }

    #[test]
    fn test_full_extraction() {
        let record = extract(77, LISTING_PAGE, IMAGE_ORIGIN).unwrap();

        assert_eq!(record.id, 77);
        assert_eq!(record.name, "Grand Rapids Antique Clearout");

        assert_eq!(record.address.address, "414 Division Ave");
        assert_eq!(record.address.city, "Grand Rapids");
        assert_eq!(record.address.state, "MI");
        assert_eq!(record.address.zip, "49503");

        let days: Vec<&String> = record.dates.keys().collect();
        assert_eq!(days, ["Fri", "Sat", "Sun"]);
        assert_eq!(
            record.dates["Fri"],
            DateRange {
                starts: "9am".to_string(),
                ends: "4pm".to_string()
            }
        );
        assert_eq!(record.dates["Sun"].ends, "1pm");

        let description = record.description.expect("description present");
        assert!(description.contains("<strong>oak furniture</strong>"));
        assert!(!description.contains("script"));

        assert_eq!(record.images.unsold, ["/img/77/front.jpg", "/img/77/side.jpg"]);
        assert_eq!(record.images.sold, ["/img/77/clock.jpg"]);

        assert_eq!(record.organisation.name, "Lakeshore Estate Services");
        assert_eq!(record.organisation.telephone, "616-555-0142");
        assert_eq!(record.organisation.url, "http://lakeshore.example");
    }

    #[test]
    fn test_missing_name_is_an_error() {
        let err = extract(5, "<html><body><p>gone</p></body></html>", IMAGE_ORIGIN).unwrap_err();
        assert!(matches!(err, ScrapeError::Extraction(_)));
    }

    #[test]
    fn test_missing_optional_blocks_fall_back() {
        let html = r##"<html><body><h1 id="saleName">Bare Sale</h1></body></html>"##;
        let record = extract(9, html, IMAGE_ORIGIN).unwrap();

        assert_eq!(record.name, "Bare Sale");
        assert_eq!(record.address, Address::default());
        assert!(record.dates.is_empty());
        assert_eq!(record.description, None);
        assert!(record.images.sold.is_empty());
        assert!(record.images.unsold.is_empty());
        assert_eq!(record.organisation, Organisation::default());
    }

    #[test]
    fn test_description_absent_not_empty() {
        let html = r##"
            <html><body>
            <div itemscope itemtype="http://schema.org/Event">
                <h1 id="saleName">No Description Sale</h1>
            </div>
            </body></html>
        "##;
        let record = extract(3, html, IMAGE_ORIGIN).unwrap();
        assert_eq!(record.description, None);
    }

    #[test]
    fn test_malformed_date_line_skipped() {
        let html = r##"
            <html><body>
            <h1 id="saleName">Partial Dates Sale</h1>
            <div id="saleDates">
                Fri 9am<br>
                Sat 9am - 2pm
            </div>
            </body></html>
        "##;
        let record = extract(4, html, IMAGE_ORIGIN).unwrap();

        assert_eq!(record.dates.len(), 1);
        assert!(record.dates.contains_key("Sat"));
        assert!(!record.dates.contains_key("Fri"));
    }

    #[test]
    fn test_image_origin_stripped() {
        let html = r##"
            <html><body>
            <h1 id="saleName">Picture Sale</h1>
            <a class="salePicture" href="http://pictures.estatesales.net/img/1/a.jpg">a</a>
            </body></html>
        "##;
        let record = extract(1, html, IMAGE_ORIGIN).unwrap();
        assert_eq!(record.images.unsold, ["/img/1/a.jpg"]);
    }
}
