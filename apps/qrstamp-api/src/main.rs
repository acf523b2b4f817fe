use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use qrstamp_api::{router, AppState, Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::parse();

    // Initialize logging
    let level = if config.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            EnvFilter::from_default_env()
                .add_directive(format!("qrstamp_api={}", level).parse()?)
                .add_directive(format!("qr_overlay={}", level).parse()?)
                .add_directive(format!("signature_pages={}", level).parse()?)
                .add_directive(format!("map_render={}", level).parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Initializing qrstamp API...");
    info!("Tile server: {}", config.tile_url);
    info!("Geocoder: {}", config.geocoder_url);
    if !config.disclose_owner_password {
        info!("Owner passwords will not be returned to clients");
    }

    let state = Arc::new(AppState::new(config)?);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
