//! Environment-driven configuration.
//!
//! Everything has a working default so `cargo run` starts a self-contained
//! demo server. The chat completion API and the detector script are optional
//! capabilities: absent configuration selects the canned-reply and
//! random-fallback paths.

use std::path::PathBuf;
use std::time::Duration;

/// Credentials and endpoint for an OpenAI-compatible chat completion API.
#[derive(Debug, Clone)]
pub struct ChatApiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub chat_api: Option<ChatApiConfig>,
    /// Path to the external detection script. `None` means the scan simulator
    /// always takes its random fallback branch.
    pub detector_script: Option<PathBuf>,
    pub detector_timeout: Duration,
}

impl Config {
    /// Read configuration from the environment.
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(5000);

        let chat_api = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .map(|api_key| ChatApiConfig {
                api_key,
                base_url: std::env::var("OPENAI_BASE_URL")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
                model: std::env::var("OPENAI_MODEL")
                    .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
                timeout: Duration::from_secs(30),
            });

        let detector_script = std::env::var("DETECTOR_SCRIPT")
            .ok()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        Self {
            port,
            chat_api,
            detector_script,
            detector_timeout: Duration::from_secs(10),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            chat_api: None,
            detector_script: None,
            detector_timeout: Duration::from_secs(10),
        }
    }
}
