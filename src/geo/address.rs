//! Structured address formatting
//!
//! Reverse lookups prefer a short address assembled from structured fields
//! over the provider's long display string.

use serde::{Deserialize, Serialize};

/// Structured address fields as returned with `addressdetails=1`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressDetails {
    #[serde(default)]
    pub road: Option<String>,
    #[serde(default)]
    pub house_number: Option<String>,
    #[serde(default)]
    pub suburb: Option<String>,
    #[serde(default)]
    pub neighbourhood: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub town: Option<String>,
    #[serde(default)]
    pub village: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postcode: Option<String>,
}

impl AddressDetails {
    /// Join the available fields with commas
    ///
    /// Order: road, house number, suburb (or neighbourhood), city (or town,
    /// or village), state, postcode. Returns `None` when no field is usable.
    pub fn format(&self) -> Option<String> {
        let locality = first_present(&[&self.city, &self.town, &self.village]);
        let district = first_present(&[&self.suburb, &self.neighbourhood]);

        let parts: Vec<&str> = [
            present(&self.road),
            present(&self.house_number),
            district,
            locality,
            present(&self.state),
            present(&self.postcode),
        ]
        .into_iter()
        .flatten()
        .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

/// Pick the best address text for a reverse result
///
/// Structured fields win; the raw display string is the fallback.
pub fn formatted_address(details: Option<&AddressDetails>, display_name: &str) -> String {
    details
        .and_then(AddressDetails::format)
        .unwrap_or_else(|| display_name.trim().to_string())
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn first_present<'a>(fields: &[&'a Option<String>]) -> Option<&'a str> {
    fields.iter().find_map(|f| present(*f))
}
