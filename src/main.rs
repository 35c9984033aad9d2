use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use shortlink::clock::SystemClock;
use shortlink::config::Config;
use shortlink::geo::GeoResolver;
use shortlink::service::RedirectService;
use shortlink::{api, redirect, storage};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    // Initialize storage
    let storage = storage::connect(&config.database).await?;
    info!("Database initialized successfully");

    let geo = GeoResolver::from_config(&config.geo);

    let service = Arc::new(RedirectService::new(
        storage,
        geo,
        Arc::new(SystemClock),
        config.links.clone(),
    ));

    // Create routers
    let api_router = api::create_api_router(Arc::clone(&service), &config.public_base_url);
    let redirect_router =
        redirect::create_redirect_router(Arc::clone(&service), config.trusted_proxy_mode);

    // Start API server
    let api_addr = format!("{}:{}", config.api_server.host, config.api_server.port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr).await?;
    info!("🚀 API server listening on http://{}", api_addr);

    // Start redirect server
    let redirect_addr = format!(
        "{}:{}",
        config.redirect_server.host, config.redirect_server.port
    );
    let redirect_listener = tokio::net::TcpListener::bind(&redirect_addr).await?;
    info!("🚀 Redirect server listening on http://{}", redirect_addr);
    info!("   - Short links published as {}/<code>", config.public_base_url);

    // Run both servers concurrently
    tokio::try_join!(
        axum::serve(api_listener, api_router),
        axum::serve(
            redirect_listener,
            redirect_router.into_make_service_with_connect_info::<SocketAddr>(),
        ),
    )?;

    Ok(())
}
