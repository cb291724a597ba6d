use reel_recommender::{
    api::{create_router, AppState},
    config::Config,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    let address = config.bind_address();

    // Train on the built-in catalog so recommendations work before any upload
    let state = AppState::bootstrap(config).await?;

    // Create the router with all routes
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
