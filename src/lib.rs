// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod analyze;
pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod nutrition;
pub mod product;
pub mod report;
pub mod vision;

// ---- Re-exports for stable public API ----
pub use crate::analyze::build_report;
pub use crate::api::{router, AppState};
pub use crate::config::AdvisorConfig;

use std::sync::Arc;

use axum::Router;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::metrics::Metrics;
use crate::nutrition::{NutritionFetcher, OpenFoodFactsFetcher};
use crate::vision::{build_vision_client, VisionClient};

pub const DEFAULT_LOG_FILTER: &str = "food_adulteration_advisor=info,tower_http=info,warn";

/// Install the global subscriber. `RUST_LOG` wins over the default filter;
/// `ADVISOR_LOG_FORMAT=json` switches to JSON lines. A no-op when the host
/// runtime has already installed one.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var("ADVISOR_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
}

/// Production state: HTTP nutrition fetcher + configured vision client.
pub fn build_state(cfg: &AdvisorConfig) -> anyhow::Result<AppState> {
    let fetcher = OpenFoodFactsFetcher::from_config(cfg)?;
    let vision = build_vision_client(cfg)?;
    Ok(AppState {
        fetcher: Arc::new(fetcher),
        vision,
        max_upload_bytes: cfg.max_upload_bytes,
    })
}

/// Router plus `/metrics` when enabled and the recorder could be installed.
pub fn app_with_state(state: AppState, metrics_enabled: bool) -> Router {
    let app = router(state);
    if !metrics_enabled {
        return app;
    }
    match Metrics::init() {
        Some(m) => app.merge(m.router()),
        None => app,
    }
}

/// Build the full in-process app from config.
pub fn app(cfg: &AdvisorConfig) -> anyhow::Result<Router> {
    let state = build_state(cfg)?;
    info!(
        nutrition = state.fetcher.name(),
        vision = state.vision.provider_name(),
        max_upload_bytes = state.max_upload_bytes,
        metrics = cfg.metrics_enabled,
        "advisor app built"
    );
    Ok(app_with_state(state, cfg.metrics_enabled))
}
