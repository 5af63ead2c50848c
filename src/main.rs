//! infer-relay server binary.

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use infer_relay::config::{Cli, Config};
use infer_relay::server::api::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments.
    let cli = Cli::parse();

    // Initialize tracing/logging.
    let filter = if cli.verbose {
        "infer_relay=debug,tower_http=debug"
    } else {
        "infer_relay=info,tower_http=info"
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| filter.into());

    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }

    info!("infer-relay v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration.
    let config = Config::load(&cli.config)?.with_cli(&cli);

    info!(
        base_url = config.upstream.base_url(),
        model = config.upstream.default_model,
        timeout_secs = config.upstream.timeout_secs,
        index = %config.server.index_path.display(),
        alerts = config.alert.webhook_url.is_some(),
        "Configuration loaded"
    );

    let state = Arc::new(AppState::from_config(&config)?);
    let app = build_router(state);

    let listen_addr = config.server.listen;
    let listener = TcpListener::bind(&listen_addr).await?;
    info!("Listening on {listen_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
