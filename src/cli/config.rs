//! Config command handler
//!
//! View and modify configuration settings.

use crate::config::Config;
use crate::error::{Error, Result};
use clap::Args;

/// Config command arguments
#[derive(Args)]
pub struct ConfigArgs {
    /// Configuration key (e.g., "lookup.max_retries")
    pub key: Option<String>,

    /// Value to set (if not provided, shows current value)
    pub value: Option<String>,

    /// Show config file path
    #[arg(long)]
    pub path: bool,

    /// Reset config to defaults
    #[arg(long)]
    pub reset: bool,
}

/// Run the config command
pub fn run(args: ConfigArgs) -> Result<()> {
    if args.path {
        println!("{}", Config::config_path()?.display());
        return Ok(());
    }

    if args.reset {
        Config::default().save()?;
        println!("Configuration reset to defaults");
        return Ok(());
    }

    let mut config = Config::load()?;

    match (args.key.as_deref(), args.value.as_deref()) {
        (None, None) => show_all_config(&config),

        (Some(key), None) => {
            let value = config.get(key).ok_or_else(|| unknown_key(key))?;
            println!("{}", value);
        }

        (Some(key), Some(value)) => {
            if config.get(key).is_none() {
                return Err(unknown_key(key));
            }
            config.set(key, value)?;
            config.save()?;
            println!("{} = {}", key, value);
        }

        (None, Some(_)) => {
            return Err(Error::Config("Must specify a key to set a value".to_string()));
        }
    }

    Ok(())
}

fn unknown_key(key: &str) -> Error {
    Error::Config(format!(
        "Unknown config key: {}\nAvailable keys:\n  {}",
        key,
        Config::available_keys().join("\n  ")
    ))
}

/// Display all configuration values
fn show_all_config(config: &Config) {
    println!("[geocoder]");
    println!("base_url = \"{}\"", config.geocoder.base_url);
    println!("user_agent = \"{}\"", config.geocoder.user_agent);
    println!("country_codes = \"{}\"", config.geocoder.country_codes);
    println!();

    println!("[lookup]");
    println!("max_retries = {}", config.lookup.max_retries);
    println!("base_timeout_ms = {}", config.lookup.base_timeout_ms);
    println!("timeout_step_ms = {}", config.lookup.timeout_step_ms);
    println!("backoff_step_ms = {}", config.lookup.backoff_step_ms);
    println!("min_interval_ms = {}", config.lookup.min_interval_ms);
    println!("suppression_ms = {}", config.lookup.suppression_ms);
    println!("min_address_len = {}", config.lookup.min_address_len);
    println!("drop_superseded = {}", config.lookup.drop_superseded);
    println!();

    println!("[reference]");
    println!("name = \"{}\"", config.reference.name);
    println!("lat = {}", config.reference.lat);
    println!("lng = {}", config.reference.lng);
    println!();

    println!("[server]");
    println!("host = \"{}\"", config.server.host);
    println!("port = {}", config.server.port);
    println!("session_ttl_secs = {}", config.server.session_ttl_secs);
}
