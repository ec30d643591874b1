use expiry_dashboard::{AppState, Config, Store, router};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    let store = Store::new(&config);
    // Touch both tables up front so a first run leaves the CSV files in place.
    store.load().await.map_err(|err| err.message)?;

    let app = router(AppState::new(store));
    let addr = config.addr();

    info!(
        products = %config.products_path.display(),
        ledger = %config.ledger_path.display(),
        "listening on http://{addr}"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
