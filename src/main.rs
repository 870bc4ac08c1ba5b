//! Food Adulteration Advisor: binary entrypoint.
//! Boots the Axum HTTP server on the Shuttle runtime.

use anyhow::Context as _;
use shuttle_axum::ShuttleAxum;

use food_adulteration_advisor::{app, init_tracing, AdvisorConfig};

#[shuttle_runtime::main]
async fn axum(#[shuttle_runtime::Secrets] secrets: shuttle_runtime::SecretStore) -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = AdvisorConfig::load()
        .context("loading advisor config")?
        .with_secret_key(secrets.get("GEMINI_API_KEY"));

    let router = app(&cfg).context("building router")?;

    Ok(router.into())
}
