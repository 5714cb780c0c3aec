//! REST API server backing the scoring dashboard

mod error;
mod handlers;
mod routes;
mod state;

pub use error::ApiError;
pub use handlers::{Slider, HEIGHT_SLIDER, MIN_POINTS_SLIDER, WIDTH_SLIDER};
pub use routes::create_router;
pub use state::AppState;

use crate::stats::StatsTable;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server host address (default: "127.0.0.1")
    pub host: String,
    /// Server port (default: 3000)
    pub port: u16,
    /// Path to the semicolon separated player stats export
    pub stats_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            stats_path: PathBuf::from("2023-2024 NBA Player Stats - Regular.csv"),
        }
    }
}

impl ServerConfig {
    /// Creates a new server configuration
    pub fn new(host: impl Into<String>, port: u16, stats_path: impl Into<PathBuf>) -> Self {
        ServerConfig {
            host: host.into(),
            port,
            stats_path: stats_path.into(),
        }
    }
}

/// Runs the dashboard server
///
/// Loads the stats table once, then serves every filter request from it.
///
/// # Returns
/// Returns an error if the stats file cannot be loaded or the server fails to bind
///
/// # Example
/// ```rust,no_run
/// use scoring_flow::server::{run_server, ServerConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ServerConfig::default();
///     run_server(config).await?;
///     Ok(())
/// }
/// ```
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let table = StatsTable::from_path(&config.stats_path)?;
    tracing::info!(
        players = table.len(),
        teams = table.teams().len(),
        "Loaded stats from {}",
        config.stats_path.display()
    );

    let state = Arc::new(AppState::new(table));
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
