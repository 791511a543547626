use dotenvy::dotenv;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use eventsync_server::config::Config;
use eventsync_server::routes::create_routes;
use eventsync_server::services::spawn_status_sweep;
use eventsync_server::state::AppState;

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_tracing();

    let config = Config::from_env();
    let port = config.port;
    let sweep_interval = config.status_sweep_interval;
    let state = AppState::new(config);

    let _sweep = spawn_status_sweep(state.store.clone(), state.hub.clone(), sweep_interval);
    tracing::info!(
        interval_secs = sweep_interval.as_secs(),
        "Status sweep started"
    );

    let app = create_routes(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Server running on port {}", port);

    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server failed");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
