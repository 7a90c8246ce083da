//! HTTP client for the location search endpoint.

use std::time::Duration;

use campdb_core::{AppConfig, BoundingBox};
use reqwest::{Client, Url};

use crate::error::ScraperError;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::types::SearchPage;

/// Fetches single pages of bbox-filtered search results.
///
/// 429, 5xx and network failures are retried according to the configured
/// [`RetryPolicy`]. Other non-2xx statuses and unparseable bodies fail at once.
#[derive(Debug, Clone)]
pub struct SearchClient {
    client: Client,
    search_url: Url,
    retry: RetryPolicy,
}

impl SearchClient {
    /// Creates a client with the given timeout, `User-Agent` and retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] if `search_url` does not parse, or
    /// [`ScraperError::Http`] if the underlying `reqwest::Client` cannot be built.
    pub fn new(
        search_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        retry: RetryPolicy,
    ) -> Result<Self, ScraperError> {
        let search_url = Url::parse(search_url).map_err(|e| ScraperError::InvalidUrl {
            url: search_url.to_owned(),
            reason: e.to_string(),
        })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            search_url,
            retry,
        })
    }

    /// # Errors
    ///
    /// See [`SearchClient::new`].
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ScraperError> {
        Self::new(
            &config.search_api_url,
            config.scraper_request_timeout_secs,
            &config.scraper_user_agent,
            RetryPolicy::from_app_config(config),
        )
    }

    /// Fetches page `page` (1-based) of results inside `region`.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::RateLimited`]: HTTP 429 after all retries.
    /// - [`ScraperError::UnexpectedStatus`]: any other non-2xx status (5xx retried).
    /// - [`ScraperError::Http`]: network failure after all retries.
    /// - [`ScraperError::Deserialize`]: body is not a search page (not retried).
    pub async fn fetch_page(
        &self,
        region: &BoundingBox,
        page: u32,
        page_size: u32,
    ) -> Result<SearchPage, ScraperError> {
        let url = self.page_url(region, page, page_size);

        retry_with_backoff(self.retry, || {
            let url = url.clone();
            async move {
                tracing::debug!(%url, "requesting search page");
                let response = self
                    .client
                    .get(url.clone())
                    .header(reqwest::header::ACCEPT, "application/json")
                    .send()
                    .await?;
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.trim().parse::<u64>().ok())
                        .unwrap_or(0);
                    return Err(ScraperError::RateLimited {
                        url: url.to_string(),
                        retry_after_secs,
                    });
                }

                if !status.is_success() {
                    return Err(ScraperError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: url.to_string(),
                    });
                }

                let body = response.text().await?;
                serde_json::from_str::<SearchPage>(&body).map_err(|e| ScraperError::Deserialize {
                    context: format!("search page {page} for {region}"),
                    source: e,
                })
            }
        })
        .await
    }

    fn page_url(&self, region: &BoundingBox, page: u32, page_size: u32) -> Url {
        let mut url = self.search_url.clone();
        url.query_pairs_mut()
            .append_pair("filter[search][bbox]", &region.to_bbox_param())
            .append_pair("sort", "recommended")
            .append_pair("page[number]", &page.to_string())
            .append_pair("page[size]", &page_size.to_string());
        url
    }
}
