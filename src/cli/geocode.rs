//! Geocode command handler
//!
//! Runs one forward resolution through the engine and prints the report.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::format::{get_formatter, Report};
use crate::geo::get_provider;
use crate::resolve::engine::SHORT_ADDRESS_NOTICE;
use crate::resolve::{EventLog, ForwardOutcome, Rejection, ResolutionEngine};
use clap::Args;

/// Geocode command arguments
#[derive(Args)]
pub struct GeocodeArgs {
    /// Address to resolve (street, district and city)
    pub address: String,

    /// Output format (json or text)
    #[arg(long, short = 'f', default_value = "text")]
    pub format: String,
}

/// Run the geocode command
pub async fn run(args: GeocodeArgs) -> Result<()> {
    super::init_tracing("warn");

    let config = Config::load()?;
    let formatter = get_formatter(&args.format)
        .ok_or_else(|| Error::Config(format!("Unknown format: {}", args.format)))?;

    let engine = ResolutionEngine::new(
        get_provider(&config.geocoder)?,
        EventLog::new(),
        config.lookup_policy(),
        config.reference_point()?,
    );

    engine.observe_address_change(&args.address).await;
    let failure = match engine.resolve_address_to_position(&args.address, 1).await {
        ForwardOutcome::Resolved(_) | ForwardOutcome::Superseded => None,
        ForwardOutcome::Failed(failure) => Some(failure),
        ForwardOutcome::Rejected(Rejection::TooShort) => {
            return Err(Error::InvalidAddress(SHORT_ADDRESS_NOTICE.to_string()));
        }
        ForwardOutcome::Rejected(rejection) => {
            return Err(Error::InvalidAddress(format!("Lookup not started: {:?}", rejection)));
        }
    };

    let snapshot = engine.snapshot().await;
    let report = Report {
        operation: "geocode".to_string(),
        input: args.address.clone(),
        position: snapshot.position,
        address: None,
        distance_km: snapshot.distance_km,
        reference: engine.reference().clone(),
        failure: failure.clone(),
        events: engine.listener().drain(),
    };

    println!("{}", formatter.format(&report)?);

    match failure {
        Some(failure) => Err(failure.into()),
        None => Ok(()),
    }
}
