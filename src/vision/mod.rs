//! Image analysis collaborator: provider abstraction + never-failing client.
//!
//! `Provider` does the real remote call and may fail. `VisionClient` is what
//! handlers talk to; it always yields an `ImageAnalysis`, degrading to a fixed
//! user-facing message when the provider is missing or errors out.

pub mod gemini;
pub mod render;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::AdvisorConfig;
pub use crate::vision::gemini::GeminiProvider;
pub use crate::vision::render::AiFindings;
use crate::vision::render::{parse_findings, parse_plain_text, render_sections};

/// Instruction sent with every image.
pub const VISION_PROMPT: &str = "You are a food safety assistant. Examine this food product image for visible signs of adulteration, contamination, spoilage or misleading packaging. \
Respond with strict JSON only, without markdown, using exactly this schema: \
{\"summary\": string, \"riskLevel\": \"Low\" | \"Medium\" | \"High\", \"keyFindings\": [string], \"indicators\": [string], \"recommendations\": [string], \"homeTests\": [string]}. \
If you cannot produce JSON, answer in plain text with the sections Summary, Risk Level, Key Findings, Adulteration Indicators, Recommendations and Home Tests. \
This is informational triage, not a laboratory result; say so when the image is inconclusive.";

pub const NOT_CONFIGURED_MESSAGE: &str =
    "Image analysis is not configured. Set GEMINI_API_KEY to enable AI-powered analysis.";

pub const UNAVAILABLE_MESSAGE: &str =
    "Image analysis is temporarily unavailable. Please try again later, and meanwhile inspect the product visually for unusual colours, textures or foreign particles.";

/// How the analysis text was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisFormat {
    /// Model returned JSON; text is the re-rendered section layout.
    Structured,
    /// Model returned prose; text is passed through unchanged.
    PlainText,
    /// No model output; text is an advisory message.
    Unavailable,
}

impl AnalysisFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisFormat::Structured => "structured",
            AnalysisFormat::PlainText => "plain_text",
            AnalysisFormat::Unavailable => "unavailable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageAnalysis {
    pub text: String,
    pub format: AnalysisFormat,
    pub sections: AiFindings,
}

impl ImageAnalysis {
    pub fn unavailable(message: &str) -> Self {
        Self {
            text: message.to_string(),
            format: AnalysisFormat::Unavailable,
            sections: AiFindings::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    #[error("vision request failed: {0}")]
    Transport(String),
    #[error("vision service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode vision response: {0}")]
    Decode(String),
    #[error("vision response contained no text")]
    Empty,
}

/// Low-level provider: one remote call, may fail. Kept separate so the same
/// degrading wrapper serves production and test doubles.
pub trait Provider: Send + Sync + 'static {
    fn generate<'a>(
        &'a self,
        image: &'a [u8],
        mime_type: &'a str,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, VisionError>> + Send + 'a>>;
    fn name(&self) -> &'static str;
}

/// Handler-facing contract. Never fails.
pub trait VisionClient: Send + Sync {
    fn analyze<'a>(
        &'a self,
        image: &'a [u8],
        mime_type: &'a str,
    ) -> Pin<Box<dyn Future<Output = ImageAnalysis> + Send + 'a>>;
    fn provider_name(&self) -> &'static str;
}

pub type DynVisionClient = Arc<dyn VisionClient>;

/// Wraps a provider with output interpretation and graceful degradation.
pub struct VisionAnalyzer<P: Provider> {
    inner: P,
}

impl<P: Provider> VisionAnalyzer<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    async fn analyze_impl(&self, image: &[u8], mime_type: &str) -> ImageAnalysis {
        match self.inner.generate(image, mime_type, VISION_PROMPT).await {
            Ok(raw) => interpret(&raw),
            Err(e) => {
                warn!(provider = self.inner.name(), error = %e, "image analysis failed");
                ImageAnalysis::unavailable(UNAVAILABLE_MESSAGE)
            }
        }
    }
}

impl<P: Provider> VisionClient for VisionAnalyzer<P> {
    fn analyze<'a>(
        &'a self,
        image: &'a [u8],
        mime_type: &'a str,
    ) -> Pin<Box<dyn Future<Output = ImageAnalysis> + Send + 'a>> {
        Box::pin(self.analyze_impl(image, mime_type))
    }
    fn provider_name(&self) -> &'static str {
        self.inner.name()
    }
}

/// Used when no API key is configured.
pub struct DisabledClient;

impl VisionClient for DisabledClient {
    fn analyze<'a>(
        &'a self,
        _image: &'a [u8],
        _mime_type: &'a str,
    ) -> Pin<Box<dyn Future<Output = ImageAnalysis> + Send + 'a>> {
        Box::pin(async { ImageAnalysis::unavailable(NOT_CONFIGURED_MESSAGE) })
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Structured JSON is re-rendered; anything else passes through untouched.
pub fn interpret(raw: &str) -> ImageAnalysis {
    if raw.trim().is_empty() {
        return ImageAnalysis::unavailable(UNAVAILABLE_MESSAGE);
    }
    match parse_findings(raw) {
        Some(findings) => ImageAnalysis {
            text: render_sections(&findings),
            format: AnalysisFormat::Structured,
            sections: findings,
        },
        None => ImageAnalysis {
            text: raw.to_string(),
            format: AnalysisFormat::PlainText,
            sections: parse_plain_text(raw),
        },
    }
}

/// Factory: Gemini when a key is configured, otherwise the disabled client.
pub fn build_vision_client(cfg: &AdvisorConfig) -> anyhow::Result<DynVisionClient> {
    match cfg.gemini_api_key.as_deref() {
        Some(key) => {
            let provider = GeminiProvider::new(
                key,
                &cfg.gemini_model,
                std::time::Duration::from_secs(cfg.vision_timeout_secs),
            )?
            .with_base_url(&cfg.gemini_base_url);
            info!(
                model = %cfg.gemini_model,
                base_url = %cfg.gemini_base_url,
                "image analysis enabled"
            );
            Ok(Arc::new(VisionAnalyzer::new(provider)))
        }
        None => {
            warn!("GEMINI_API_KEY not set; image analysis disabled");
            Ok(Arc::new(DisabledClient))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<&'static str, ()>);

    impl Provider for Fixed {
        fn generate<'a>(
            &'a self,
            _image: &'a [u8],
            _mime_type: &'a str,
            _prompt: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<String, VisionError>> + Send + 'a>> {
            let out = self
                .0
                .map(str::to_string)
                .map_err(|_| VisionError::Transport("connection refused".into()));
            Box::pin(async move { out })
        }
        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn provider_error_degrades_to_message() {
        let client = VisionAnalyzer::new(Fixed(Err(())));
        let out = client.analyze(b"img", "image/png").await;
        assert_eq!(out.format, AnalysisFormat::Unavailable);
        assert_eq!(out.text, UNAVAILABLE_MESSAGE);
    }

    #[tokio::test]
    async fn prose_passes_through_unchanged() {
        let raw = "  Looks like fresh milk.\nNo obvious issues.  ";
        let client = VisionAnalyzer::new(Fixed(Ok(raw)));
        let out = client.analyze(b"img", "image/jpeg").await;
        assert_eq!(out.format, AnalysisFormat::PlainText);
        assert_eq!(out.text, raw);
    }

    #[tokio::test]
    async fn disabled_client_returns_advisory() {
        let out = DisabledClient.analyze(b"img", "image/png").await;
        assert_eq!(out.text, NOT_CONFIGURED_MESSAGE);
        assert_eq!(DisabledClient.provider_name(), "disabled");
    }

    #[test]
    fn blank_output_is_unavailable() {
        assert_eq!(interpret("  \n ").format, AnalysisFormat::Unavailable);
    }

    #[test]
    fn factory_without_key_is_disabled() {
        let cfg = AdvisorConfig::default();
        let client = build_vision_client(&cfg).unwrap();
        assert_eq!(client.provider_name(), "disabled");
    }

    #[test]
    fn factory_with_key_uses_configured_gemini_root() {
        let mut cfg = AdvisorConfig::default();
        cfg.apply_overrides(|k| match k {
            "GEMINI_API_KEY" => Some("k".to_string()),
            "GEMINI_BASE_URL" => Some("http://127.0.0.1:9/v1beta/".to_string()),
            _ => None,
        });
        assert_eq!(cfg.gemini_base_url, "http://127.0.0.1:9/v1beta");
        let client = build_vision_client(&cfg).unwrap();
        assert_eq!(client.provider_name(), "gemini");
    }
}
