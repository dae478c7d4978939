//! External directory store configuration.

use serde::{Deserialize, Serialize};

/// Directory store (external portal backend) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Store provider: `"http"` or `"memory"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Base URL of the portal backend directory API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            request_timeout_seconds: default_timeout(),
        }
    }
}

fn default_provider() -> String {
    "http".to_string()
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080/api/directory".to_string()
}

fn default_timeout() -> u64 {
    5
}
