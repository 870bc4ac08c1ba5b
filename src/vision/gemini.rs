// src/vision/gemini.rs
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Provider, VisionError};
use crate::config::DEFAULT_GEMINI_BASE_URL;

#[derive(Debug, Clone)]
pub struct GeminiProvider {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Debug, Deserialize)]
struct PartResponse {
    text: Option<String>,
}

impl GeminiProvider {
    pub fn new(api_key: &str, model: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        })
    }

    /// Point at a different API root, e.g. a proxy or a local stub.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn generate_impl(
        &self,
        image: &[u8],
        mime_type: &str,
        prompt: &str,
    ) -> Result<String, VisionError> {
        let body = GeminiRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text { text: prompt },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type,
                            data: general_purpose::STANDARD.encode(image),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig { temperature: 0.2 },
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| VisionError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(VisionError::Status {
                status: status.as_u16(),
                body: text.chars().take(300).collect(),
            });
        }

        let parsed: GeminiResponse = resp
            .json()
            .await
            .map_err(|e| VisionError::Decode(e.to_string()))?;

        let text = first_candidate_text(parsed).ok_or(VisionError::Empty)?;
        debug!(model = %self.model, chars = text.len(), "gemini reply received");
        Ok(text)
    }
}

fn first_candidate_text(resp: GeminiResponse) -> Option<String> {
    let parts = resp.candidates.into_iter().next()?.content?.parts;
    let text: String = parts.into_iter().filter_map(|p| p.text).collect();
    (!text.trim().is_empty()).then_some(text)
}

impl Provider for GeminiProvider {
    fn generate<'a>(
        &'a self,
        image: &'a [u8],
        mime_type: &'a str,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, VisionError>> + Send + 'a>> {
        Box::pin(self.generate_impl(image, mime_type, prompt))
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_inline_data_shape() {
        let body = GeminiRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text { text: "look" },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/png",
                            data: general_purpose::STANDARD.encode(b"abc"),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig { temperature: 0.2 },
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["contents"][0]["parts"][0]["text"], "look");
        assert_eq!(v["contents"][0]["parts"][1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(v["contents"][0]["parts"][1]["inlineData"]["data"], "YWJj");
        assert!(v["generationConfig"]["temperature"].is_number());
    }

    #[test]
    fn joins_text_parts_of_first_candidate() {
        let resp: GeminiResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"summary\":"},{"text":"\"ok\"}"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(first_candidate_text(resp).as_deref(), Some("{\"summary\":\"ok\"}"));
    }

    #[test]
    fn blocked_or_empty_reply_has_no_text() {
        let resp: GeminiResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert!(first_candidate_text(resp).is_none());
        let resp: GeminiResponse = serde_json::from_str("{}").unwrap();
        assert!(first_candidate_text(resp).is_none());
    }

    #[test]
    fn base_url_override_drops_trailing_slash() {
        let p = GeminiProvider::new("k", "gemini-1.5-flash", Duration::from_secs(1))
            .unwrap()
            .with_base_url("http://localhost:9000/");
        assert_eq!(p.base_url, "http://localhost:9000");
        assert_eq!(p.name(), "gemini");
    }
}
