pub mod ollama;

use async_trait::async_trait;
use serde::{ Deserialize, Serialize };
use std::sync::Arc;

use super::LlmConfig;
use self::ollama::OllamaClient;
use crate::error::ChatError;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CompletionResponse {
    pub response: String,
}

/// Turns a rendered transcript into completion text.
///
/// Implementations report connection problems and timeouts as
/// `ChatError::BackendUnavailable` and bad statuses or payloads as
/// `ChatError::BackendError`.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<CompletionResponse, ChatError>;

    fn get_model(&self) -> String;
    fn get_base_url(&self) -> Option<String>;
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatClient>, ChatError> {
    let client = OllamaClient::from_config(config)?;
    Ok(Arc::new(client))
}
