//! Nominatim geocoding backend (OpenStreetMap)
//!
//! Uses the public Nominatim API. The usage policy requires an identifying
//! User-Agent and at most one request per second, which is why forward
//! lookups are rate limited upstream of this provider.

use crate::config::GeocoderConfig;
use crate::coord::Position;
use crate::error::Result;
use crate::geo::{GeoProvider, ProviderError, ReversePlace, SearchHit};
use tracing::debug;

/// Nominatim geocoding backend
#[derive(Debug, Clone)]
pub struct NominatimProvider {
    client: reqwest::Client,
    base_url: String,
    country_codes: String,
}

impl NominatimProvider {
    /// Create a new Nominatim provider
    pub fn new(config: &GeocoderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            country_codes: config.country_codes.clone(),
        })
    }

    fn search_url(&self, query: &str) -> String {
        let mut url = format!(
            "{}/search?q={}&format=json&addressdetails=1&limit=1",
            self.base_url,
            urlencoding::encode(query)
        );
        if !self.country_codes.is_empty() {
            url.push_str(&format!(
                "&countrycodes={}",
                urlencoding::encode(&self.country_codes)
            ));
        }
        url
    }

    fn reverse_url(&self, position: Position) -> String {
        format!(
            "{}/reverse?lat={}&lon={}&format=json&addressdetails=1&limit=1",
            self.base_url, position.lat, position.lng
        )
    }

    async fn fetch(&self, url: &str) -> std::result::Result<reqwest::Response, ProviderError> {
        debug!("Nominatim GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        Ok(response)
    }
}

impl GeoProvider for NominatimProvider {
    async fn search(&self, query: &str) -> std::result::Result<Vec<SearchHit>, ProviderError> {
        let response = self.fetch(&self.search_url(query)).await?;

        response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(format!("Failed to parse search response: {}", e)))
    }

    async fn reverse(&self, position: Position) -> std::result::Result<ReversePlace, ProviderError> {
        let response = self.fetch(&self.reverse_url(position)).await?;

        response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(format!("Failed to parse reverse response: {}", e)))
    }
}
