//! Baby Reveal Back binary entrypoint wiring REST, storage, and background tasks.

use std::{env, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use baby_reveal_back::{
    config::AppConfig,
    dao::draft::{DraftStore, FileSlot},
    routes,
    services::storage_supervisor,
    state::{AppState, SharedState},
};

/// Environment variable overriding where the local draft file lives.
const DRAFT_PATH_ENV: &str = "BABY_REVEAL_DRAFT_PATH";
const DEFAULT_DRAFT_PATH: &str = "data/draft.json";

/// How often idle rate limiter keys are swept.
const LIMITER_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let draft_path =
        env::var(DRAFT_PATH_ENV).unwrap_or_else(|_| DEFAULT_DRAFT_PATH.to_owned());
    let drafts = DraftStore::new(Box::new(FileSlot::new(draft_path)));

    let app_state = AppState::new(config, drafts);

    spawn_storage_supervisor(app_state.clone());
    tokio::spawn(run_limiter_cleanup(app_state.clone()));

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Connect the MongoDB event store in the background, or install the
/// in-memory store when the build has no MongoDB support.
#[cfg(feature = "mongo-store")]
fn spawn_storage_supervisor(state: SharedState) {
    use baby_reveal_back::dao::{
        event_store::{EventStore, mongodb::{MongoConfig, MongoEventStore}},
        storage::StorageError,
    };

    tokio::spawn(storage_supervisor::run(state, || async {
        let config = MongoConfig::from_env().await.map_err(StorageError::from)?;
        let store = MongoEventStore::connect(config)
            .await
            .map_err(StorageError::from)?;
        Ok(Arc::new(store) as Arc<dyn EventStore>)
    }));
}

#[cfg(not(feature = "mongo-store"))]
fn spawn_storage_supervisor(state: SharedState) {
    use baby_reveal_back::dao::event_store::memory::MemoryEventStore;

    tokio::spawn(async move {
        state
            .install_event_store(Arc::new(MemoryEventStore::default()))
            .await;
        info!("installed in-memory event store");
    });
}

/// Periodically drop idle rate limiter keys.
async fn run_limiter_cleanup(state: SharedState) {
    let mut ticker = tokio::time::interval(LIMITER_CLEANUP_INTERVAL);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        state.limiter().cleanup();
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
