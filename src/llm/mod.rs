pub mod chat;

use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3";

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: Option<String>,
    pub completion_model: Option<String>,
    /// Upper bound for one completion request; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            completion_model: None,
            timeout: Some(Duration::from_secs(60)),
        }
    }
}
