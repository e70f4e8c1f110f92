use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Crawl configuration: site origins, storage layout and the region table.
/// Built once at startup and shared read-only; the orchestrator never reaches
/// for ambient globals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Origin the city and listing pages live under
    pub base_origin: String,
    /// Path prefix of the sale directory on the base origin
    pub listings_path: String,
    /// Origin the listing pictures are hosted on; stripped from stored paths
    pub image_origin: String,
    /// Root directory for JSON artifacts, link indexes and mirrored images
    pub data_dir: PathBuf,
    /// Keep a raw copy of each fetched city page next to the artifacts
    pub cache_city_pages: bool,
    /// Upper bound on in-flight HTTP requests during a crawl
    pub max_concurrent_requests: usize,
    /// Region code -> ordered city directory pages for that region
    pub regions: HashMap<String, Vec<String>>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        let mut regions = HashMap::new();
        regions.insert(
            "mi".to_string(),
            [
                "MI/Adrian.aspx",
                "MI/Allegan.aspx",
                "MI/Alma.aspx",
                "MI/Alpena.aspx",
                "MI/Ann-Arbor.aspx",
                "MI/Battle-Creek.aspx",
                "MI/Bay-City.aspx",
                "MI/Big-Rapids.aspx",
                "MI/Cadillac.aspx",
                "MI/Coldwater.aspx",
                "MI/Detroit.aspx",
                "MI/Escanaba.aspx",
                "MI/Flint.aspx",
                "MI/Grand-Rapids.aspx",
                "MI/Holland-Grand-Haven.aspx",
                "MI/Houghton.aspx",
                "MI/Jackson.aspx",
                "MI/Kalamazoo-Portage.aspx",
                "MI/Lansing.aspx",
                "MI/Marquette.aspx",
                "MI/Midland.aspx",
                "MI/Monroe.aspx",
                "MI/Mount-Pleasant.aspx",
                "MI/Muskegon-Norton-Shores.aspx",
                "MI/Niles-Benton-Harbor.aspx",
                "MI/Owosso.aspx",
                "MI/Port-Huron.aspx",
                "MI/Saginaw.aspx",
                "MI/Sault-Ste.-Marie.aspx",
                "MI/Sturgis.aspx",
                "MI/Traverse-City.aspx",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        );

        Self {
            base_origin: "http://www.estatesales.net".to_string(),
            listings_path: "/estate-sales/".to_string(),
            image_origin: "http://pictures.estatesales.net".to_string(),
            data_dir: PathBuf::from("static").join("listings"),
            cache_city_pages: true,
            max_concurrent_requests: 5,
            regions,
        }
    }
}

impl CrawlConfig {
    /// City directory pages for a region, or None when the region is not configured
    pub fn cities(&self, region: &str) -> Option<&[String]> {
        self.regions
            .get(region)
            .map(|v| v.as_slice())
            .filter(|v| !v.is_empty())
    }

    /// Absolute URL of a city directory page
    pub fn city_url(&self, city_ref: &str) -> String {
        format!("{}{}{}", self.base_origin, self.listings_path, city_ref)
    }

    /// Absolute URL of a picture from its stored origin-relative path
    pub fn image_url(&self, path: &str) -> String {
        format!("{}{}", self.image_origin, path)
    }

    /// `<data_dir>/<region>.json` — the region's listing artifact
    pub fn region_json(&self, region: &str) -> PathBuf {
        self.data_dir.join(format!("{region}.json"))
    }

    /// `<data_dir>/<region>.txt` — the region's sorted link index
    pub fn region_links(&self, region: &str) -> PathBuf {
        self.data_dir.join(format!("{region}.txt"))
    }

    /// `<data_dir>/<region>/` — cached city pages and mirrored images
    pub fn region_dir(&self, region: &str) -> PathBuf {
        self.data_dir.join(region)
    }

    /// Target file for a mirrored image, leading slash stripped so the
    /// origin-relative path nests under the region directory
    pub fn image_target(&self, region: &str, path: &str) -> PathBuf {
        let relative: PathBuf = Path::new(path.trim_start_matches('/'))
            .components()
            .filter(|c| matches!(c, std::path::Component::Normal(_)))
            .collect();
        self.region_dir(region).join(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_regions() {
        let config = CrawlConfig::default();
        let cities = config.cities("mi").expect("mi should be configured");
        assert_eq!(cities.len(), 31);
        assert_eq!(cities[0], "MI/Adrian.aspx");
        assert!(config.cities("zz").is_none());
    }

    #[test]
    fn test_empty_region_is_unconfigured() {
        let mut config = CrawlConfig::default();
        config.regions.insert("xx".to_string(), vec![]);
        assert!(config.cities("xx").is_none());
    }

    #[test]
    fn test_city_url() {
        let config = CrawlConfig::default();
        assert_eq!(
            config.city_url("MI/Detroit.aspx"),
            "http://www.estatesales.net/estate-sales/MI/Detroit.aspx"
        );
    }

    #[test]
    fn test_image_target_strips_leading_slash() {
        let config = CrawlConfig {
            data_dir: PathBuf::from("data"),
            ..CrawlConfig::default()
        };
        assert_eq!(
            config.image_target("mi", "/img/123/a.jpg"),
            PathBuf::from("data/mi/img/123/a.jpg")
        );
    }

    #[test]
    fn test_image_target_ignores_parent_components() {
        let config = CrawlConfig {
            data_dir: PathBuf::from("data"),
            ..CrawlConfig::default()
        };
        assert_eq!(
            config.image_target("mi", "/../../etc/passwd"),
            PathBuf::from("data/mi/etc/passwd")
        );
    }
}
