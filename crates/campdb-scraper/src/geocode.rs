//! Reverse geocoding against a Nominatim-compatible service.
//!
//! Used only as a fallback for records whose name and location fields are
//! all blank. Lookups are serialized and spaced at least
//! `min_interval` apart, since public Nominatim allows one request per second.

use std::time::Duration;

use campdb_core::AppConfig;
use reqwest::{Client, Url};
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::ScraperError;

const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
}

#[derive(Debug)]
pub struct ReverseGeocoder {
    client: Client,
    reverse_url: Url,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl ReverseGeocoder {
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] if `base_url` does not parse, or
    /// [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, ScraperError> {
        let invalid = |reason: String| ScraperError::InvalidUrl {
            url: base_url.to_owned(),
            reason,
        };
        let mut reverse_url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        // Appended as a segment so a base path like `/nominatim` is kept.
        reverse_url
            .path_segments_mut()
            .map_err(|()| invalid("URL cannot be a base".to_owned()))?
            .pop_if_empty()
            .push("reverse");
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            reverse_url,
            min_interval: DEFAULT_MIN_INTERVAL,
            last_request: Mutex::new(None),
        })
    }

    /// # Errors
    ///
    /// See [`ReverseGeocoder::new`].
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ScraperError> {
        Self::new(
            &config.geocoder_url,
            config.scraper_request_timeout_secs,
            &config.scraper_user_agent,
        )
    }

    /// Overrides the spacing between lookups.
    #[must_use]
    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    /// Looks up a display address for the coordinate pair.
    ///
    /// Returns `Ok(None)` when the service has no match.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError`] on network failure, non-2xx status or an
    /// unparseable body.
    pub async fn reverse(&self, latitude: f64, longitude: f64) -> Result<Option<String>, ScraperError> {
        self.wait_turn().await;

        let mut url = self.reverse_url.clone();
        url.query_pairs_mut()
            .append_pair("format", "jsonv2")
            .append_pair("lat", &latitude.to_string())
            .append_pair("lon", &longitude.to_string())
            .append_pair("accept-language", "en");

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let body = response.text().await?;
        let parsed = serde_json::from_str::<ReverseResponse>(&body).map_err(|e| {
            ScraperError::Deserialize {
                context: format!("reverse geocode for {latitude},{longitude}"),
                source: e,
            }
        })?;
        Ok(parsed.display_name.filter(|s| !s.trim().is_empty()))
    }

    async fn wait_turn(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let ready_at = previous + self.min_interval;
            if ready_at > Instant::now() {
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }
}
