use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use upskill::config::Config;
use upskill::matching::matcher::{SkillMatcher, WeightedSkillMatcher};
use upskill::routes::build_router;
use upskill::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on unreadable or inconsistent engine config)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Upskill API v{}", env!("CARGO_PKG_VERSION"));

    let engine = &config.engine;
    info!(
        "Plan budget: {}h/week × {} weeks, {} synonym overrides, {} gate overrides",
        engine.hours_per_week,
        engine.sprint_weeks,
        engine.skill_synonyms.len(),
        engine.gate_thresholds.len()
    );

    let synonyms = Arc::new(engine.synonym_map());
    let gates = Arc::new(engine.gate_set());

    // Initialize matcher (WeightedSkillMatcher; weights from config)
    let matcher: Arc<dyn SkillMatcher> = Arc::new(WeightedSkillMatcher::new(
        engine.score_weights,
        engine.tier_weights,
    ));
    info!("Skill matcher initialized (backend: {})", matcher.backend());

    // Build app state
    let state = AppState {
        config: config.clone(),
        synonyms,
        gates,
        matcher,
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
