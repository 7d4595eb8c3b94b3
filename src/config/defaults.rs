//! Default configuration values
//!
//! Named constants for all tunable parameters

pub use crate::constants::api::{DEFAULT_COUNTRY_CODES, NOMINATIM_URL as DEFAULT_BASE_URL};
pub use crate::constants::geo::{
    REFERENCE_LAT as DEFAULT_REFERENCE_LAT, REFERENCE_LNG as DEFAULT_REFERENCE_LNG,
    REFERENCE_NAME as DEFAULT_REFERENCE_NAME,
};
pub use crate::constants::lookup::{
    BACKOFF_STEP_MS as DEFAULT_BACKOFF_STEP_MS, BASE_TIMEOUT_MS as DEFAULT_BASE_TIMEOUT_MS,
    MAX_RETRIES as DEFAULT_MAX_RETRIES, MIN_ADDRESS_LEN as DEFAULT_MIN_ADDRESS_LEN,
    MIN_INTERVAL_MS as DEFAULT_MIN_INTERVAL_MS, SUPPRESSION_MS as DEFAULT_SUPPRESSION_MS,
    TIMEOUT_STEP_MS as DEFAULT_TIMEOUT_STEP_MS,
};

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 7979;

/// Idle picker sessions are dropped after this many seconds
pub const DEFAULT_SESSION_TTL_SECS: u64 = 1800;

/// Drop results of superseded requests by default
pub const DEFAULT_DROP_SUPERSEDED: bool = true;

/// Config file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Application directory name (for XDG paths)
pub const APP_DIR_NAME: &str = "dorm-locate";

/// User-Agent sent to the geocoding provider
pub fn default_user_agent_string() -> String {
    format!("{}/{}", APP_DIR_NAME, env!("CARGO_PKG_VERSION"))
}
