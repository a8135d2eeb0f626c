pub mod ai;
pub mod api;
pub mod assessment;
pub mod auth;
pub mod config;
pub mod database;
pub mod pipeline;
pub mod report;
pub mod scoring;
pub mod session;
pub mod survey;

use std::sync::Arc;

use anyhow::Context;
use log::{info, warn};

use crate::ai::ProviderRegistry;
use crate::api::AppState;
use crate::assessment::AssessmentService;
use crate::auth::AuthConfig;
use crate::config::{Settings, StorageBackend};
use crate::database::{AssessmentStore, DatabaseManager, FallbackCache, MemoryStore};
use crate::session::SessionRegistry;

const SESSION_SWEEP_SECS: u64 = 60;

/// Wire up storage, providers and auth from settings.
pub async fn build_state(settings: &Settings) -> anyhow::Result<AppState> {
    let store: Arc<dyn AssessmentStore> = match settings.storage_backend {
        StorageBackend::Postgres => Arc::new(
            DatabaseManager::new(settings)
                .await
                .context("failed to connect to PostgreSQL")?,
        ),
        StorageBackend::Memory => {
            warn!("⚠️ STORAGE_BACKEND=memory: analyses are lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let fallback = match &settings.fallback_cache_path {
        Some(path) => Arc::new(FallbackCache::with_mirror(path)),
        None => Arc::new(FallbackCache::new()),
    };

    let providers = ProviderRegistry::from_settings(settings).context("failed to build AI clients")?;

    Ok(AppState {
        assessments: Arc::new(AssessmentService::new(store, fallback)),
        sessions: Arc::new(SessionRegistry::with_idle_ttl(chrono::Duration::minutes(
            settings.session_idle_minutes.max(1),
        ))),
        providers: Arc::new(providers),
        auth: Arc::new(AuthConfig::from_settings(settings)),
    })
}

pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let state = build_state(&settings).await?;
    spawn_session_sweeper(state.sessions.clone());
    let app = api::router(state);

    let addr = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("🚀 Leadership 4Dx API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Periodically drops abandoned survey sessions.
fn spawn_session_sweeper(sessions: Arc<SessionRegistry>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(SESSION_SWEEP_SECS));
        loop {
            ticker.tick().await;
            sessions.evict_idle(chrono::Utc::now());
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
