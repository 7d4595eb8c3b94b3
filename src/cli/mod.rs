//! CLI command handlers
//!
//! Each subcommand has its own module with handler functions.

pub mod config;
pub mod distance;
pub mod geocode;
pub mod reverse;
pub mod serve;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Address and coordinate resolution for the dormitory portal
#[derive(Parser)]
#[command(name = "dorm-locate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve an address to a position
    Geocode(geocode::GeocodeArgs),

    /// Resolve a position to an address
    Reverse(reverse::ReverseArgs),

    /// Distance from a position to the campus reference point
    Distance(distance::DistanceArgs),

    /// Start web server (foreground)
    Serve(serve::ServeArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

/// Run the CLI
pub async fn run() -> crate::error::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Geocode(args) => geocode::run(args).await,
        Commands::Reverse(args) => reverse::run(args).await,
        Commands::Distance(args) => distance::run(args),
        Commands::Serve(args) => serve::run(args).await,
        Commands::Config(args) => config::run(args),
    }
}

/// Initialize logging, honouring RUST_LOG over `default_level`
pub(crate) fn init_tracing(default_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
