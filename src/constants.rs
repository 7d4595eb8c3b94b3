//! Centralized constants for the dorm-locate crate
//!
//! This module consolidates constants that are used across multiple modules
//! to avoid duplication and ensure consistency.

/// Geographic constants
pub mod geo {
    /// Mean Earth radius in kilometers
    pub const EARTH_RADIUS_KM: f64 = 6371.0;

    /// Campus reference point latitude
    pub const REFERENCE_LAT: f64 = -6.371355;

    /// Campus reference point longitude
    pub const REFERENCE_LNG: f64 = 106.824186;

    /// Campus reference point label
    pub const REFERENCE_NAME: &str = "Campus";
}

/// External API endpoints
pub mod api {
    /// OpenStreetMap Nominatim geocoding API
    pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

    /// Country filter applied to forward searches (ISO 3166-1 alpha-2)
    pub const DEFAULT_COUNTRY_CODES: &str = "id";
}

/// Lookup policy
pub mod lookup {
    /// Retries allowed beyond the first attempt
    pub const MAX_RETRIES: u32 = 2;

    /// Timeout of the first attempt in milliseconds
    pub const BASE_TIMEOUT_MS: u64 = 15_000;

    /// Timeout added for each subsequent attempt in milliseconds
    pub const TIMEOUT_STEP_MS: u64 = 5_000;

    /// Linear backoff unit in milliseconds (attempt n waits n * step)
    pub const BACKOFF_STEP_MS: u64 = 2_000;

    /// Minimum spacing between accepted forward lookups in milliseconds
    pub const MIN_INTERVAL_MS: u64 = 2_000;

    /// Loop-guard suppression window in milliseconds
    pub const SUPPRESSION_MS: u64 = 100;

    /// Addresses whose trimmed length is at most this are rejected
    pub const MIN_ADDRESS_LEN: usize = 10;
}
