//! Geocoding providers
//!
//! Defines the provider seam used by the lookup client together with the
//! wire types both lookup directions return. The default provider is
//! Nominatim (OpenStreetMap).

pub mod address;
pub mod nominatim;

use crate::config::GeocoderConfig;
use crate::coord::Position;
use crate::error::Result;
use address::AddressDetails;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A raw provider failure, before retry classification
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// The provider answered with a non-2xx status
    #[error("provider returned status {0}")]
    Status(u16),

    /// The request never produced a response
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body could not be understood
    #[error("malformed response: {0}")]
    Decode(String),
}

/// One forward search result
///
/// Coordinates arrive string-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub address: Option<AddressDetails>,
}

impl SearchHit {
    /// Parse the string-encoded coordinates into a validated position
    pub fn position(&self) -> std::result::Result<Position, ProviderError> {
        let lat: f64 = self
            .lat
            .trim()
            .parse()
            .map_err(|_| ProviderError::Decode(format!("Invalid latitude: {}", self.lat)))?;
        let lng: f64 = self
            .lon
            .trim()
            .parse()
            .map_err(|_| ProviderError::Decode(format!("Invalid longitude: {}", self.lon)))?;
        Position::checked(lat, lng).map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

/// A reverse lookup payload
///
/// A missing `display_name` means the provider found nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReversePlace {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub address: Option<AddressDetails>,
}

/// Trait for geocoding backends
pub trait GeoProvider: Send + Sync {
    /// Forward search: free text to candidate positions (empty when nothing matched)
    fn search(
        &self,
        query: &str,
    ) -> impl std::future::Future<Output = std::result::Result<Vec<SearchHit>, ProviderError>> + Send;

    /// Reverse lookup: position to a place description
    fn reverse(
        &self,
        position: Position,
    ) -> impl std::future::Future<Output = std::result::Result<ReversePlace, ProviderError>> + Send;
}

/// Build the default geocoding provider from configuration
pub fn get_provider(config: &GeocoderConfig) -> Result<nominatim::NominatimProvider> {
    nominatim::NominatimProvider::new(config)
}
