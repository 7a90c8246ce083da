use std::net::SocketAddr;

use crate::geo::BoundingBox;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Full URL of the upstream location search endpoint.
    pub search_api_url: String,
    pub scraper_request_timeout_secs: u64,
    pub scraper_user_agent: String,
    /// Upper bound on regions walked at the same time.
    pub scraper_max_concurrent_regions: usize,
    pub scraper_page_size: u32,
    /// The crawl grid is `divisions x divisions` cells.
    pub scraper_grid_divisions: u32,
    /// Politeness delay between successive page requests within one region.
    pub scraper_inter_request_delay_ms: u64,
    pub scraper_max_retries: u32,
    pub scraper_retry_backoff_base_ms: u64,
    pub scraper_retry_max_delay_ms: u64,
    /// Extent covered by a full crawl.
    pub crawl_bounds: BoundingBox,
    /// Six-field cron expression for the scheduled crawl.
    pub crawl_cron: String,
    pub geocoder_enabled: bool,
    pub geocoder_url: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("search_api_url", &self.search_api_url)
            .field(
                "scraper_request_timeout_secs",
                &self.scraper_request_timeout_secs,
            )
            .field("scraper_user_agent", &self.scraper_user_agent)
            .field(
                "scraper_max_concurrent_regions",
                &self.scraper_max_concurrent_regions,
            )
            .field("scraper_page_size", &self.scraper_page_size)
            .field("scraper_grid_divisions", &self.scraper_grid_divisions)
            .field(
                "scraper_inter_request_delay_ms",
                &self.scraper_inter_request_delay_ms,
            )
            .field("scraper_max_retries", &self.scraper_max_retries)
            .field(
                "scraper_retry_backoff_base_ms",
                &self.scraper_retry_backoff_base_ms,
            )
            .field(
                "scraper_retry_max_delay_ms",
                &self.scraper_retry_max_delay_ms,
            )
            .field("crawl_bounds", &self.crawl_bounds)
            .field("crawl_cron", &self.crawl_cron)
            .field("geocoder_enabled", &self.geocoder_enabled)
            .field("geocoder_url", &self.geocoder_url)
            .finish()
    }
}
