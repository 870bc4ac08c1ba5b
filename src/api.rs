use std::any::Any;

use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        rejection::JsonRejection,
        DefaultBodyLimit, Multipart, State,
    },
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::analyze::build_report;
use crate::error::{internal_error_response, ApiError};
use crate::nutrition::{DynFetcher, NutritionFetcher};
use crate::report::BarcodeAnalysis;
use crate::vision::{AiFindings, AnalysisFormat, DynVisionClient, VisionClient};

pub const MAX_BARCODE_LEN: usize = 20;

/// Headroom above the upload limit so the handler, not the framework, sees oversize bodies.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub fetcher: DynFetcher,
    pub vision: DynVisionClient,
    pub max_upload_bytes: usize,
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/v1/barcode", post(analyze_barcode))
        .route("/api/v1/barcode/", post(analyze_barcode))
        .route(
            "/api/v1/image",
            post(analyze_image).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route(
            "/api/v1/image/",
            post(analyze_image).layer(DefaultBodyLimit::max(body_limit)),
        )
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(state)
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");
    error!(panic = detail, "handler panicked");
    internal_error_response()
}

// ---------- barcode ----------

#[derive(Deserialize)]
struct BarcodeRequest {
    #[serde(rename = "Barcode", alias = "barcode")]
    barcode: String,
}

#[derive(Serialize)]
struct BarcodeResponse {
    status: &'static str,
    barcode: String,
    analysis: BarcodeAnalysis,
}

/// Trimmed, 1..=20 ASCII digits.
pub fn validate_barcode(raw: &str) -> Result<String, ApiError> {
    let code = raw.trim();
    if code.is_empty() {
        return Err(ApiError::validation("Barcode", "Barcode is required"));
    }
    if code.len() > MAX_BARCODE_LEN {
        return Err(ApiError::validation(
            "Barcode",
            format!("Barcode must be at most {MAX_BARCODE_LEN} digits"),
        ));
    }
    if !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::validation("Barcode", "Barcode must contain digits only"));
    }
    Ok(code.to_string())
}

async fn analyze_barcode(
    State(state): State<AppState>,
    payload: Result<Json<BarcodeRequest>, JsonRejection>,
) -> Result<Json<BarcodeResponse>, ApiError> {
    let Json(req) = payload?;
    let barcode = validate_barcode(&req.barcode)?;

    let (status, analysis) = match state.fetcher.fetch(&barcode).await {
        Some(product) => {
            let report = build_report(&product);
            info!(
                %barcode,
                outcome = "found",
                risk = report.risk_assessment.level.as_str(),
                health_score = report.health_analysis.score,
                "barcode analyzed"
            );
            counter!("barcode_lookups_total", "outcome" => "found").increment(1);
            ("success", BarcodeAnalysis::Success(Box::new(report)))
        }
        None => {
            info!(%barcode, outcome = "not_found", "barcode analyzed");
            counter!("barcode_lookups_total", "outcome" => "not_found").increment(1);
            ("not_found", BarcodeAnalysis::not_found())
        }
    };

    Ok(Json(BarcodeResponse {
        status,
        barcode,
        analysis,
    }))
}

// ---------- image ----------

#[derive(Debug, Serialize)]
struct ImageResponse {
    status: &'static str,
    filename: String,
    file_size: usize,
    content_type: String,
    analysis: String,
    analysis_format: AnalysisFormat,
    sections: AiFindings,
}

struct Upload {
    filename: String,
    content_type: String,
    bytes: Vec<u8>,
}

/// Whole MiB print as integers, other sizes at or above 1 MiB with one decimal,
/// smaller limits in KB rounded up.
fn size_label(bytes: usize) -> String {
    const KIB: usize = 1024;
    const MIB: usize = 1024 * 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else if bytes >= MIB {
        format!("{:.1}MB", bytes as f64 / MIB as f64)
    } else {
        format!("{}KB", bytes.div_ceil(KIB))
    }
}

fn too_large(max: usize) -> ApiError {
    ApiError::validation(
        "image",
        format!("Image too large. Maximum size is {}", size_label(max)),
    )
}

fn rejected(reason: &'static str, err: ApiError) -> ApiError {
    counter!("upload_rejections_total", "reason" => reason).increment(1);
    err
}

fn multipart_error(err: MultipartError, max: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return rejected("too_large", too_large(max));
    }
    rejected(
        "malformed",
        ApiError::validation("image", "Could not read the uploaded form data"),
    )
}

/// Finds the `image` field and streams it in, stopping as soon as the limit is crossed.
async fn read_image_field(multipart: &mut Multipart, max: usize) -> Result<Upload, ApiError> {
    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(e, max))?;
        let Some(field) = field else {
            return Err(rejected(
                "missing_file",
                ApiError::validation("image", "No image file provided"),
            ));
        };
        if field.name() != Some("image") {
            continue;
        }
        return read_upload(field, max).await;
    }
}

async fn read_upload(mut field: Field<'_>, max: usize) -> Result<Upload, ApiError> {
    let content_type = field
        .content_type()
        .map(|c| c.trim().to_ascii_lowercase())
        .unwrap_or_default();
    if !content_type.starts_with("image/") {
        return Err(rejected(
            "not_image",
            ApiError::validation("image", "Only image files are allowed"),
        ));
    }
    let filename = field
        .file_name()
        .map(str::to_string)
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| "upload".to_string());

    let mut bytes = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(e, max))? {
        if bytes.len() + chunk.len() > max {
            return Err(rejected("too_large", too_large(max)));
        }
        bytes.extend_from_slice(&chunk);
    }
    if bytes.is_empty() {
        return Err(rejected(
            "missing_file",
            ApiError::validation("image", "No image file provided"),
        ));
    }

    Ok(Upload {
        filename,
        content_type,
        bytes,
    })
}

/// Short SHA-256 prefix for logs; raw bytes and filenames are never logged.
fn payload_fingerprint(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    use std::fmt::Write as _;
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

async fn analyze_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ImageResponse>, ApiError> {
    let mut multipart = multipart.map_err(|_| {
        rejected(
            "malformed",
            ApiError::validation("image", "Expected a multipart/form-data upload"),
        )
    })?;
    let upload = read_image_field(&mut multipart, state.max_upload_bytes).await?;

    let result = state
        .vision
        .analyze(&upload.bytes, &upload.content_type)
        .await;

    info!(
        sha256 = %payload_fingerprint(&upload.bytes),
        mime = %upload.content_type,
        size = upload.bytes.len(),
        provider = state.vision.provider_name(),
        format = result.format.as_str(),
        "image analyzed"
    );
    counter!("image_analyses_total", "format" => result.format.as_str()).increment(1);

    let status = match result.format {
        AnalysisFormat::Unavailable => "error",
        AnalysisFormat::Structured | AnalysisFormat::PlainText => "success",
    };

    Ok(Json(ImageResponse {
        status,
        filename: upload.filename,
        file_size: upload.bytes.len(),
        content_type: upload.content_type,
        analysis: result.text,
        analysis_format: result.format,
        sections: result.sections,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn barcode_rules() {
        assert_eq!(validate_barcode(" 3017620422003 ").unwrap(), "3017620422003");
        assert!(validate_barcode("   ").is_err());
        assert!(validate_barcode("12345678901234567890").is_ok());
        assert!(validate_barcode("123456789012345678901").is_err());
        assert!(validate_barcode("12-34").is_err());
        assert!(validate_barcode("１２３").is_err());
    }

    #[test]
    fn fingerprint_is_short_hex() {
        let fp = payload_fingerprint(b"abc");
        assert_eq!(fp, "ba7816bf8f01");
    }

    #[test]
    fn too_large_message_reports_megabytes() {
        let err = too_large(10 * 1024 * 1024);
        assert_eq!(err.to_string(), "Image too large. Maximum size is 10MB");
    }

    #[test]
    fn size_label_never_rounds_down_to_zero() {
        assert_eq!(size_label(512 * 1024), "512KB");
        assert_eq!(size_label(1000), "1KB");
        assert_eq!(size_label(1024 * 1024 + 512 * 1024), "1.5MB");
        assert_eq!(size_label(1024 * 1024), "1MB");
        assert_eq!(
            too_large(100 * 1024).to_string(),
            "Image too large. Maximum size is 100KB"
        );
    }
}
