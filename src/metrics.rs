use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::warn;

/// Process-wide recorder; a second `install_recorder` would fail.
static HANDLE: OnceCell<Option<PrometheusHandle>> = OnceCell::new();

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder once and describe the advisor series.
    /// Returns `None` when another recorder already owns the process.
    pub fn init() -> Option<Self> {
        HANDLE
            .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
                Ok(handle) => {
                    describe();
                    Some(handle)
                }
                Err(e) => {
                    warn!(error = %e, "prometheus recorder not installed; /metrics disabled");
                    None
                }
            })
            .clone()
            .map(|handle| Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

fn describe() {
    describe_counter!(
        "barcode_lookups_total",
        "Barcode analyses by outcome (found, not_found)."
    );
    describe_counter!(
        "image_analyses_total",
        "Image analyses by result format (structured, plain_text, unavailable)."
    );
    describe_counter!(
        "upload_rejections_total",
        "Rejected image uploads by reason."
    );
    describe_counter!(
        "nutrition_fetch_errors_total",
        "Nutrition database lookups that failed in transport or upstream."
    );
    describe_histogram!(
        "nutrition_fetch_ms",
        "Nutrition database lookup latency in milliseconds."
    );
}
