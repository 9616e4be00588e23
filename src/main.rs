use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod auth;
mod model;
mod notices;
mod pages;
mod store;
mod templates;

use store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // -----------------------------
    // Logging
    // -----------------------------
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("🤖 Starting FleetView server...");

    // -----------------------------
    // Shared state / Dependencies
    // -----------------------------
    let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "fleetdb".into());
    let store = Arc::new(Store::new(&data_dir)?);

    if std::env::var("DEMO_FLEET").map(|v| v == "1").unwrap_or(false) {
        let seeded = store.seed_demo_fleet().await?;
        if seeded > 0 {
            tracing::info!(robots = seeded, "seeded demo fleet");
        }
    }

    let state = AppState { store };

    // -----------------------------
    // Sessions
    // -----------------------------
    // Per-login expiry is set at sign-in time; OnSessionEnd is only the
    // default for sessions that never authenticate.
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_expiry(Expiry::OnSessionEnd);

    // -----------------------------
    // Routers
    // -----------------------------
    let app = Router::new()
        .merge(auth::router())
        .merge(pages::router())
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    println!("🌐 HTTP listening on http://{addr}");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
