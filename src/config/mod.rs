//! Configuration management
//!
//! Loads and saves configuration from XDG-compliant paths.
//! Config location: ~/.config/dorm-locate/config.toml

pub mod defaults;

use crate::coord::{Position, ReferencePoint};
use crate::error::{Error, Result};
use crate::resolve::LookupPolicy;
use defaults::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Geocoding provider settings
    #[serde(default)]
    pub geocoder: GeocoderConfig,

    /// Retry, timeout and rate-limit policy
    #[serde(default)]
    pub lookup: LookupConfig,

    /// Campus reference point
    #[serde(default)]
    pub reference: ReferenceConfig,

    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Geocoding provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocoderConfig {
    /// Provider root URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Identifying User-Agent (required by the provider's usage policy)
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Comma-separated country filter for forward searches (empty: none)
    #[serde(default = "default_country_codes")]
    pub country_codes: String,
}

/// Lookup policy settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Retries allowed beyond the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Timeout of the first attempt in milliseconds
    #[serde(default = "default_base_timeout_ms")]
    pub base_timeout_ms: u64,

    /// Timeout added per retry in milliseconds
    #[serde(default = "default_timeout_step_ms")]
    pub timeout_step_ms: u64,

    /// Linear backoff unit in milliseconds
    #[serde(default = "default_backoff_step_ms")]
    pub backoff_step_ms: u64,

    /// Minimum spacing between accepted forward lookups in milliseconds
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,

    /// Loop-guard suppression window in milliseconds
    #[serde(default = "default_suppression_ms")]
    pub suppression_ms: u64,

    /// Addresses this short (after trimming) are rejected without a lookup
    #[serde(default = "default_min_address_len")]
    pub min_address_len: usize,

    /// Drop results of requests superseded by a newer one of the same kind
    #[serde(default = "default_drop_superseded")]
    pub drop_superseded: bool,
}

/// Reference point settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceConfig {
    #[serde(default = "default_reference_name")]
    pub name: String,
    #[serde(default = "default_reference_lat")]
    pub lat: f64,
    #[serde(default = "default_reference_lng")]
    pub lng: f64,
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Seconds a picker session may go unused before it is dropped
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

// Default value functions for serde
fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_user_agent() -> String {
    default_user_agent_string()
}
fn default_country_codes() -> String {
    DEFAULT_COUNTRY_CODES.to_string()
}
fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}
fn default_base_timeout_ms() -> u64 {
    DEFAULT_BASE_TIMEOUT_MS
}
fn default_timeout_step_ms() -> u64 {
    DEFAULT_TIMEOUT_STEP_MS
}
fn default_backoff_step_ms() -> u64 {
    DEFAULT_BACKOFF_STEP_MS
}
fn default_min_interval_ms() -> u64 {
    DEFAULT_MIN_INTERVAL_MS
}
fn default_suppression_ms() -> u64 {
    DEFAULT_SUPPRESSION_MS
}
fn default_min_address_len() -> usize {
    DEFAULT_MIN_ADDRESS_LEN
}
fn default_drop_superseded() -> bool {
    DEFAULT_DROP_SUPERSEDED
}
fn default_reference_name() -> String {
    DEFAULT_REFERENCE_NAME.to_string()
}
fn default_reference_lat() -> f64 {
    DEFAULT_REFERENCE_LAT
}
fn default_reference_lng() -> f64 {
    DEFAULT_REFERENCE_LNG
}
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_session_ttl_secs() -> u64 {
    DEFAULT_SESSION_TTL_SECS
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            country_codes: default_country_codes(),
        }
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_timeout_ms: default_base_timeout_ms(),
            timeout_step_ms: default_timeout_step_ms(),
            backoff_step_ms: default_backoff_step_ms(),
            min_interval_ms: default_min_interval_ms(),
            suppression_ms: default_suppression_ms(),
            min_address_len: default_min_address_len(),
            drop_superseded: default_drop_superseded(),
        }
    }
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            name: default_reference_name(),
            lat: default_reference_lat(),
            lng: default_reference_lng(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(APP_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default path
    ///
    /// Creates default config if file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| {
                Error::Config(format!("Failed to read config file: {}", e))
            })?;

            toml::from_str(&content).map_err(|e| {
                Error::Config(format!("Failed to parse config file: {}", e))
            })
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            Error::Config(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(&path, content).map_err(|e| {
            Error::Config(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    /// Get a configuration value by key path
    ///
    /// Key format: "section.key"
    /// Returns the value as a string, or None if not found
    pub fn get(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["geocoder", "base_url"] => Some(self.geocoder.base_url.clone()),
            ["geocoder", "user_agent"] => Some(self.geocoder.user_agent.clone()),
            ["geocoder", "country_codes"] => Some(self.geocoder.country_codes.clone()),

            ["lookup", "max_retries"] => Some(self.lookup.max_retries.to_string()),
            ["lookup", "base_timeout_ms"] => Some(self.lookup.base_timeout_ms.to_string()),
            ["lookup", "timeout_step_ms"] => Some(self.lookup.timeout_step_ms.to_string()),
            ["lookup", "backoff_step_ms"] => Some(self.lookup.backoff_step_ms.to_string()),
            ["lookup", "min_interval_ms"] => Some(self.lookup.min_interval_ms.to_string()),
            ["lookup", "suppression_ms"] => Some(self.lookup.suppression_ms.to_string()),
            ["lookup", "min_address_len"] => Some(self.lookup.min_address_len.to_string()),
            ["lookup", "drop_superseded"] => Some(self.lookup.drop_superseded.to_string()),

            ["reference", "name"] => Some(self.reference.name.clone()),
            ["reference", "lat"] => Some(self.reference.lat.to_string()),
            ["reference", "lng"] => Some(self.reference.lng.to_string()),

            ["server", "host"] => Some(self.server.host.clone()),
            ["server", "port"] => Some(self.server.port.to_string()),
            ["server", "session_ttl_secs"] => Some(self.server.session_ttl_secs.to_string()),

            _ => None,
        }
    }

    /// Set a configuration value by key path
    ///
    /// Key format: "section.key"
    /// Returns error if key is invalid or value type is wrong
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["geocoder", "base_url"] => self.geocoder.base_url = value.to_string(),
            ["geocoder", "user_agent"] => {
                if value.trim().is_empty() {
                    return Err(Error::Config("User agent must not be empty".to_string()));
                }
                self.geocoder.user_agent = value.to_string();
            }
            ["geocoder", "country_codes"] => self.geocoder.country_codes = value.to_string(),

            ["lookup", "max_retries"] => self.lookup.max_retries = parse_value(key, value)?,
            ["lookup", "base_timeout_ms"] => self.lookup.base_timeout_ms = parse_value(key, value)?,
            ["lookup", "timeout_step_ms"] => self.lookup.timeout_step_ms = parse_value(key, value)?,
            ["lookup", "backoff_step_ms"] => self.lookup.backoff_step_ms = parse_value(key, value)?,
            ["lookup", "min_interval_ms"] => self.lookup.min_interval_ms = parse_value(key, value)?,
            ["lookup", "suppression_ms"] => self.lookup.suppression_ms = parse_value(key, value)?,
            ["lookup", "min_address_len"] => self.lookup.min_address_len = parse_value(key, value)?,
            ["lookup", "drop_superseded"] => self.lookup.drop_superseded = parse_value(key, value)?,

            ["reference", "name"] => self.reference.name = value.to_string(),
            ["reference", "lat"] => {
                let lat: f64 = parse_value(key, value)?;
                Position::checked(lat, self.reference.lng)?;
                self.reference.lat = lat;
            }
            ["reference", "lng"] => {
                let lng: f64 = parse_value(key, value)?;
                Position::checked(self.reference.lat, lng)?;
                self.reference.lng = lng;
            }

            ["server", "host"] => self.server.host = value.to_string(),
            ["server", "port"] => self.server.port = parse_value(key, value)?,
            ["server", "session_ttl_secs"] => {
                let secs: u64 = parse_value(key, value)?;
                if secs == 0 {
                    return Err(Error::Config(
                        "server.session_ttl_secs must be positive".to_string(),
                    ));
                }
                self.server.session_ttl_secs = secs;
            }

            _ => {
                return Err(Error::Config(format!("Unknown config key: {}", key)));
            }
        }

        Ok(())
    }

    /// List all available config keys
    pub fn available_keys() -> Vec<&'static str> {
        vec![
            "geocoder.base_url",
            "geocoder.user_agent",
            "geocoder.country_codes",
            "lookup.max_retries",
            "lookup.base_timeout_ms",
            "lookup.timeout_step_ms",
            "lookup.backoff_step_ms",
            "lookup.min_interval_ms",
            "lookup.suppression_ms",
            "lookup.min_address_len",
            "lookup.drop_superseded",
            "reference.name",
            "reference.lat",
            "reference.lng",
            "server.host",
            "server.port",
            "server.session_ttl_secs",
        ]
    }

    /// The campus reference point
    pub fn reference_point(&self) -> Result<ReferencePoint> {
        let position = Position::checked(self.reference.lat, self.reference.lng)?;
        Ok(ReferencePoint::new(self.reference.name.clone(), position))
    }

    /// Retry, timeout and rate-limit policy for the resolution engine
    pub fn lookup_policy(&self) -> LookupPolicy {
        LookupPolicy {
            max_retries: self.lookup.max_retries,
            base_timeout: Duration::from_millis(self.lookup.base_timeout_ms),
            timeout_step: Duration::from_millis(self.lookup.timeout_step_ms),
            backoff_step: Duration::from_millis(self.lookup.backoff_step_ms),
            min_interval: Duration::from_millis(self.lookup.min_interval_ms),
            suppression_window: Duration::from_millis(self.lookup.suppression_ms),
            min_address_len: self.lookup.min_address_len,
            drop_superseded: self.lookup.drop_superseded,
        }
    }

    /// How long an unused picker session is kept
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.server.session_ttl_secs)
    }

    /// Get server address as "host:port"
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("Invalid value for {}: {}", key, value)))
}
