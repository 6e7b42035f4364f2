use anyhow::Result;
use member_profiles::{
    load_fixture, router, verify_schema, AppState, AuthVerifier, PlatformClient, RosterService,
    ServiceConfig,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,member_profiles=debug"));
    fmt().with_env_filter(env_filter).with_target(true).init();

    // Refuse to start with an inconsistent field table
    verify_schema()?;

    let config = ServiceConfig::from_env()?;
    info!("Loaded configuration: {:?}", config);

    let fixture = load_fixture(config.fixture_path.as_deref())?;
    let provider = Arc::new(PlatformClient::new(config.platform.clone()));
    let service = RosterService::new(provider, AuthVerifier::default());

    let app = router(AppState {
        service: Arc::new(service),
        fixture: Arc::new(fixture),
    });

    println!("\nMember profiles starting");
    println!("HTTP: http://{}", config.bind_addr);
    println!("\nConfiguration:");
    println!("- Platform: {}", config.platform.base_url);
    println!("- Fetch timeout: {:?}", config.platform.fetch_timeout);
    match &config.fixture_path {
        Some(path) => println!("- Fixture: {}", path.display()),
        None => println!("- Fixture: built-in"),
    }

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
        }
        info!("Shutdown signal received, stopping server...");
    };

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Clean shutdown complete");

    Ok(())
}
