//! Positions and the campus reference point
//!
//! This module handles:
//! - The `Position` value type shared by every lookup
//! - The fixed `ReferencePoint` used as the distance baseline
//! - Great-circle distance (see [`distance`])

pub mod distance;

use crate::constants::geo::{REFERENCE_LAT, REFERENCE_LNG, REFERENCE_NAME};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A geographic position (latitude, longitude)
///
/// Positions are replaced wholesale, never edited field by field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
}

impl Position {
    /// Create a new position
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Create a position, rejecting out-of-range values
    pub fn checked(lat: f64, lng: f64) -> Result<Self> {
        let position = Self::new(lat, lng);
        position.validate()?;
        Ok(position)
    }

    /// Validate that the position is within valid ranges
    ///
    /// Latitude: -90 to 90
    /// Longitude: -180 to 180
    pub fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(Error::InvalidCoordinates(format!(
                "Latitude {} is out of range [-90, 90]",
                self.lat
            )));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(Error::InvalidCoordinates(format!(
                "Longitude {} is out of range [-180, 180]",
                self.lng
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

/// The institution's fixed location, second operand of every distance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencePoint {
    pub name: String,
    pub position: Position,
}

impl ReferencePoint {
    pub fn new(name: impl Into<String>, position: Position) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }

    /// Distance from `position` to this reference point in kilometers
    pub fn distance_km(&self, position: Position) -> f64 {
        distance::distance_km(position, self.position)
    }
}

impl Default for ReferencePoint {
    fn default() -> Self {
        Self::new(REFERENCE_NAME, Position::new(REFERENCE_LAT, REFERENCE_LNG))
    }
}
