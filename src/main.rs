//! dorm-locate CLI entry point
//!
//! Dormitory coordinate resolution - CLI + web API

use dorm_locate::cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
