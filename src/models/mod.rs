use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Street address of a sale, pulled from the listing's location block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

/// Opening and closing time for one sale day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub starts: String,
    pub ends: String,
}

/// Listing photos, split by whether the pictured item has sold.
/// Paths are relative to the picture host origin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Images {
    pub sold: Vec<String>,
    pub unsold: Vec<String>,
}

/// Company running the sale
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Organisation {
    pub name: String,
    pub telephone: String,
    pub url: String,
}

/// Core listing data model, one per estate-sale page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingRecord {
    pub id: u64,
    pub name: String,
    pub address: Address,
    /// Day label -> opening hours, in the order the page lists them
    pub dates: IndexMap<String, DateRange>,
    /// Sanitized description markup; omitted when the listing has none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub images: Images,
    pub organisation: Organisation,
    pub scraped_at: DateTime<Utc>,
}
