//! Distance command handler

use crate::config::Config;
use crate::coord::distance::distance_km;
use crate::coord::Position;
use crate::error::Result;
use clap::Args;

/// Distance command arguments
#[derive(Args)]
pub struct DistanceArgs {
    /// Latitude
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    /// Longitude
    #[arg(long, allow_negative_numbers = true)]
    pub lng: f64,

    /// Latitude of the other point (default: campus reference point)
    #[arg(long, allow_negative_numbers = true, requires = "to_lng")]
    pub to_lat: Option<f64>,

    /// Longitude of the other point (default: campus reference point)
    #[arg(long, allow_negative_numbers = true, requires = "to_lat")]
    pub to_lng: Option<f64>,
}

/// Run the distance command
pub fn run(args: DistanceArgs) -> Result<()> {
    let from = Position::checked(args.lat, args.lng)?;

    let (label, to) = match (args.to_lat, args.to_lng) {
        (Some(lat), Some(lng)) => {
            let to = Position::checked(lat, lng)?;
            (to.to_string(), to)
        }
        _ => {
            let reference = Config::load()?.reference_point()?;
            (reference.name, reference.position)
        }
    };

    println!("{} -> {}: {:.2} km", from, label, distance_km(from, to));
    Ok(())
}
