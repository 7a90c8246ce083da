pub mod client;
pub mod crawl;
pub mod error;
pub mod geocode;
pub mod grid;
pub mod normalize;
pub mod retry;
pub mod types;
pub mod walker;

pub use client::SearchClient;
pub use crawl::{CrawlOutcome, Crawler};
pub use error::ScraperError;
pub use geocode::ReverseGeocoder;
pub use grid::partition;
pub use normalize::normalize_item;
pub use retry::RetryPolicy;
pub use types::{decode_item, RawItem, SearchPage};
pub use walker::{PageWalker, MAX_PAGES};
