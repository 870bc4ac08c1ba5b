// src/config/advisor.rs
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

pub const ENV_CONFIG_PATH: &str = "ADVISOR_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/advisor.toml";

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_OFF_BASE_URL: &str = "https://world.openfoodfacts.org";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_NUTRITION_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_VISION_TIMEOUT_SECS: u64 = 30;

/// Runtime settings. Every field is optional in the TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdvisorConfig {
    /// Absent (or blank) disables image analysis.
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    /// Gemini API root, without trailing slash.
    pub gemini_base_url: String,
    /// Nutrition database root, without trailing slash.
    pub off_base_url: String,
    /// Zero falls back to the default; a request never runs unbounded.
    pub nutrition_timeout_secs: u64,
    pub vision_timeout_secs: u64,
    pub max_upload_bytes: usize,
    pub metrics_enabled: bool,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            off_base_url: DEFAULT_OFF_BASE_URL.to_string(),
            nutrition_timeout_secs: DEFAULT_NUTRITION_TIMEOUT_SECS,
            vision_timeout_secs: DEFAULT_VISION_TIMEOUT_SECS,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            metrics_enabled: true,
        }
    }
}

impl AdvisorConfig {
    /// File (explicit path, then `config/advisor.toml`, then defaults) plus env overrides.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match env::var(ENV_CONFIG_PATH) {
            Ok(p) if !p.trim().is_empty() => Self::from_path(PathBuf::from(p.trim()))?,
            _ => {
                let fallback = Path::new(DEFAULT_CONFIG_PATH);
                if fallback.exists() {
                    Self::from_path(fallback)?
                } else {
                    Self::default()
                }
            }
        };
        cfg.apply_overrides(|k| env::var(k).ok());
        Ok(cfg)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read advisor config at {}: {}", path.display(), e)
        })?;
        Self::from_toml_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid advisor config at {}: {}", path.display(), e))
    }

    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let mut cfg: AdvisorConfig = toml::from_str(s)?;
        cfg.normalize();
        Ok(cfg)
    }

    /// Apply `GEMINI_API_KEY`, `GEMINI_MODEL`, `GEMINI_BASE_URL`, `OFF_BASE_URL` and
    /// `ADVISOR_MAX_UPLOAD_BYTES`.
    /// Unparseable numbers are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("GEMINI_API_KEY") {
            self.gemini_api_key = Some(key);
        }
        if let Some(model) = lookup("GEMINI_MODEL").filter(|m| !m.trim().is_empty()) {
            self.gemini_model = model;
        }
        if let Some(url) = lookup("GEMINI_BASE_URL").filter(|u| !u.trim().is_empty()) {
            self.gemini_base_url = url;
        }
        if let Some(url) = lookup("OFF_BASE_URL").filter(|u| !u.trim().is_empty()) {
            self.off_base_url = url;
        }
        if let Some(n) = lookup("ADVISOR_MAX_UPLOAD_BYTES").and_then(|v| v.trim().parse().ok()) {
            self.max_upload_bytes = n;
        }
        self.normalize();
    }

    /// Hosted secret store wins over file and env.
    pub fn with_secret_key(mut self, key: Option<String>) -> Self {
        if key.as_deref().is_some_and(|k| !k.trim().is_empty()) {
            self.gemini_api_key = key;
            self.normalize();
        }
        self
    }

    fn normalize(&mut self) {
        self.gemini_api_key = self
            .gemini_api_key
            .take()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        self.gemini_model = self.gemini_model.trim().to_string();
        if self.gemini_model.is_empty() {
            self.gemini_model = DEFAULT_GEMINI_MODEL.to_string();
        }
        self.gemini_base_url = trimmed_url(&self.gemini_base_url, DEFAULT_GEMINI_BASE_URL);
        self.off_base_url = trimmed_url(&self.off_base_url, DEFAULT_OFF_BASE_URL);
        if self.max_upload_bytes == 0 {
            self.max_upload_bytes = DEFAULT_MAX_UPLOAD_BYTES;
        }
        if self.nutrition_timeout_secs == 0 {
            self.nutrition_timeout_secs = DEFAULT_NUTRITION_TIMEOUT_SECS;
        }
        if self.vision_timeout_secs == 0 {
            self.vision_timeout_secs = DEFAULT_VISION_TIMEOUT_SECS;
        }
    }
}

fn trimmed_url(raw: &str, fallback: &str) -> String {
    let url = raw.trim().trim_end_matches('/');
    if url.is_empty() {
        fallback.to_string()
    } else {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_file_means_defaults() {
        assert_eq!(AdvisorConfig::from_toml_str("").unwrap(), AdvisorConfig::default());
    }

    #[test]
    fn file_values_are_normalized() {
        let cfg = AdvisorConfig::from_toml_str(
            r#"
gemini_api_key = "   "
off_base_url = "http://localhost:8081/"
max_upload_bytes = 0
metrics_enabled = false
"#,
        )
        .unwrap();
        assert_eq!(cfg.gemini_api_key, None);
        assert_eq!(cfg.off_base_url, "http://localhost:8081");
        assert_eq!(cfg.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert!(!cfg.metrics_enabled);
    }

    #[test]
    fn zero_timeouts_fall_back_to_defaults() {
        let cfg = AdvisorConfig::from_toml_str(
            "nutrition_timeout_secs = 0\nvision_timeout_secs = 0",
        )
        .unwrap();
        assert_eq!(cfg.nutrition_timeout_secs, DEFAULT_NUTRITION_TIMEOUT_SECS);
        assert_eq!(cfg.vision_timeout_secs, DEFAULT_VISION_TIMEOUT_SECS);

        let cfg = AdvisorConfig::from_toml_str("vision_timeout_secs = 5").unwrap();
        assert_eq!(cfg.vision_timeout_secs, 5);
    }

    #[test]
    fn gemini_base_url_is_trimmed_or_defaulted() {
        let cfg =
            AdvisorConfig::from_toml_str("gemini_base_url = \"http://127.0.0.1:9000/v1beta/\"")
                .unwrap();
        assert_eq!(cfg.gemini_base_url, "http://127.0.0.1:9000/v1beta");

        let mut cfg = AdvisorConfig::from_toml_str("gemini_base_url = \"  \"").unwrap();
        assert_eq!(cfg.gemini_base_url, DEFAULT_GEMINI_BASE_URL);
        cfg.apply_overrides(|k| (k == "GEMINI_BASE_URL").then(|| "http://mock/".to_string()));
        assert_eq!(cfg.gemini_base_url, "http://mock");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(AdvisorConfig::from_toml_str("gemini_modle = \"x\"").is_err());
    }

    #[test]
    fn overrides_take_precedence_over_file() {
        let env: HashMap<&str, &str> = [
            ("GEMINI_API_KEY", " k-123 "),
            ("GEMINI_MODEL", "gemini-2.0-flash"),
            ("ADVISOR_MAX_UPLOAD_BYTES", "not-a-number"),
        ]
        .into_iter()
        .collect();
        let mut cfg = AdvisorConfig::from_toml_str("gemini_model = \"old\"").unwrap();
        cfg.apply_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.gemini_api_key.as_deref(), Some("k-123"));
        assert_eq!(cfg.gemini_model, "gemini-2.0-flash");
        assert_eq!(cfg.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    }

    #[test]
    fn blank_secret_does_not_clear_existing_key() {
        let cfg = AdvisorConfig {
            gemini_api_key: Some("from-env".into()),
            ..Default::default()
        };
        let cfg = cfg.with_secret_key(Some("  ".into()));
        assert_eq!(cfg.gemini_api_key.as_deref(), Some("from-env"));
        let cfg = cfg.with_secret_key(Some("from-secret".into()));
        assert_eq!(cfg.gemini_api_key.as_deref(), Some("from-secret"));
    }
}
