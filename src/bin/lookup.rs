//! Look up one barcode and print the risk report as JSON, without the HTTP server.
//!
//! Usage: `cargo run --bin lookup -- 3017620422003`

use anyhow::Context as _;
use food_adulteration_advisor::{
    api::validate_barcode,
    build_report,
    nutrition::{NutritionFetcher, OpenFoodFactsFetcher},
    AdvisorConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let raw = std::env::args()
        .nth(1)
        .context("usage: lookup <barcode>")?;
    let barcode = validate_barcode(&raw).map_err(|e| anyhow::anyhow!("{e}"))?;

    let cfg = AdvisorConfig::load()?;
    let fetcher = OpenFoodFactsFetcher::from_config(&cfg)?;

    match fetcher.fetch(&barcode).await {
        Some(product) => {
            let report = build_report(&product);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        None => println!("{barcode}: product not found in the nutrition database"),
    }
    Ok(())
}
