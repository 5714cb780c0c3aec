//! Scoring Flow Dashboard Server Binary
//!
//! Run with: `cargo run --bin scoring-flow-server`

use scoring_flow::{run_server, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Tracing is initialized in run_server(); RUST_LOG controls the level:
    //   RUST_LOG=debug cargo run --bin scoring-flow-server
    //   RUST_LOG=scoring_flow::flow=trace cargo run --bin scoring-flow-server

    let defaults = ServerConfig::default();
    let host = std::env::var("HOST").unwrap_or(defaults.host);
    let port = std::env::var("PORT")
        .ok()
        .and_then(|port| port.parse::<u16>().ok())
        .unwrap_or(defaults.port);
    let stats_path = std::env::var_os("STATS_PATH")
        .map(Into::into)
        .unwrap_or(defaults.stats_path);

    let config = ServerConfig::new(host, port, stats_path);

    println!("🏀 Starting Scoring Flow Dashboard...");
    println!("   Host: {}", config.host);
    println!("   Port: {}", config.port);
    println!("   Stats: {}", config.stats_path.display());
    println!();
    println!(
        "Dashboard will be available at: http://{}:{}",
        config.host, config.port
    );
    println!();
    println!("Available endpoints:");
    println!("  GET  /                 - Dashboard page");
    println!("  GET  /health           - Health check");
    println!("  GET  /filters          - Filter widget options");
    println!("  GET  /scoring          - Table and flow from one filter pass");
    println!("  GET  /scoring/table    - Filtered scoring table");
    println!("  GET  /scoring/flow     - Flow diagram data");
    println!();

    run_server(config).await?;

    Ok(())
}
