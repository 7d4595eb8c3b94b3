//! Reverse command handler
//!
//! Runs one reverse resolution through the engine and prints the report.
//! A failed address lookup still reports the position.

use crate::config::Config;
use crate::coord::Position;
use crate::error::{Error, Result};
use crate::format::{get_formatter, Report};
use crate::geo::get_provider;
use crate::resolve::{EventLog, ResolutionEngine, ReverseOutcome};
use clap::Args;

/// Reverse command arguments
#[derive(Args)]
pub struct ReverseArgs {
    /// Latitude
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    /// Longitude
    #[arg(long, allow_negative_numbers = true)]
    pub lng: f64,

    /// Output format (json or text)
    #[arg(long, short = 'f', default_value = "text")]
    pub format: String,
}

/// Run the reverse command
pub async fn run(args: ReverseArgs) -> Result<()> {
    super::init_tracing("warn");

    let position = Position::checked(args.lat, args.lng)?;
    let config = Config::load()?;
    let formatter = get_formatter(&args.format)
        .ok_or_else(|| Error::Config(format!("Unknown format: {}", args.format)))?;

    let engine = ResolutionEngine::new(
        get_provider(&config.geocoder)?,
        EventLog::new(),
        config.lookup_policy(),
        config.reference_point()?,
    );

    let failure = match engine.resolve_position_to_address(position).await {
        ReverseOutcome::PositionOnly { failure, .. } => Some(failure),
        ReverseOutcome::Resolved(_) | ReverseOutcome::Superseded => None,
    };

    let snapshot = engine.snapshot().await;
    let report = Report {
        operation: "reverse".to_string(),
        input: position.to_string(),
        position: snapshot.position,
        address: Some(snapshot.address).filter(|a| !a.is_empty()),
        distance_km: snapshot.distance_km,
        reference: engine.reference().clone(),
        failure,
        events: engine.listener().drain(),
    };

    println!("{}", formatter.format(&report)?);
    Ok(())
}
