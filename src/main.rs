// ABOUTME: Entry point for the trailquery binary.
// ABOUTME: Parses CLI arguments, initializes tracing, and starts the HTTP server.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use trailquery_server::{AppState, ServerConfig, cors_layer, create_router};

/// Answer natural-language questions about a day of GPS tracks.
#[derive(Debug, Parser)]
#[command(name = "trailquery", version, about)]
struct Cli {
    /// Listen on the alternate port (8001) instead of the configured one.
    #[arg(long)]
    port: bool,

    /// Directory containing tlv_day_locations_person<N>.json files.
    #[arg(long, env = "TRAILQUERY_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("trailquery=info,tower_http=debug")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = ServerConfig::from_env()?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    let addr = config.bind_addr(cli.port);
    let state = Arc::new(AppState::from_config(&config));

    tracing::info!(
        data_dir = %config.data_dir.display(),
        persons = state.store().list_persons().len(),
        model = %config.gemini_model,
        "trailquery starting up"
    );

    let app = create_router(state).layer(cors_layer(&config.allowed_origins));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
