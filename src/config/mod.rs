// src/config/mod.rs
pub mod advisor;

pub use advisor::{AdvisorConfig, DEFAULT_CONFIG_PATH, DEFAULT_GEMINI_BASE_URL, ENV_CONFIG_PATH};
