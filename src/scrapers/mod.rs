pub mod city;
pub mod error;
pub mod http;
pub mod images;
pub mod listing;
pub mod sanitize;
pub mod traits;

pub use city::CityCollector;
pub use error::ScrapeError;
pub use http::HttpFetcher;
pub use images::ImageFetcher;
pub use listing::ListingScraper;
pub use traits::Fetch;
