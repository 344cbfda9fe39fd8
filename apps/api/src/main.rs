mod analysis;
mod config;
mod errors;
mod ingest;
mod models;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::batch::BatchAnalyzer;
use crate::analysis::dictionary::SkillDictionary;
use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Screener API v{}", env!("CARGO_PKG_VERSION"));

    // A broken vocabulary is fatal: no batch can run without it.
    let dictionary = match &config.skill_vocabulary_path {
        Some(path) => SkillDictionary::from_json_file(path)?,
        None => SkillDictionary::default(),
    };
    info!(
        "Skill vocabulary loaded: {} terms ({})",
        dictionary.len(),
        config
            .skill_vocabulary_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "built-in".to_string())
    );

    let analyzer = BatchAnalyzer::new(Arc::new(dictionary), config.batch_workers)
        .context("failed to start the analysis worker pool")?;
    info!(
        "Batch analyzer ready: {} worker(s), max {} resumes per batch, timeout {}",
        analyzer.workers(),
        config.max_resumes_per_batch,
        config
            .batch_timeout_secs
            .map(|s| format!("{s}s"))
            .unwrap_or_else(|| "none".to_string())
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        analyzer: Arc::new(analyzer),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
