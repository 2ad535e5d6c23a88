use async_trait::async_trait;
use log::debug;
use reqwest::Client as HttpClient;
use serde::{ Deserialize, Serialize };

use super::{ ChatClient, CompletionResponse };
use crate::error::ChatError;
use crate::llm::{ LlmConfig, DEFAULT_BASE_URL, DEFAULT_MODEL };

#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: HttpClient,
    base_url: String,
    completion_model: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
pub struct GenerateResponse {
    pub response: String,
}

fn transport_error(e: reqwest::Error) -> ChatError {
    if e.is_status() {
        ChatError::BackendError(e.to_string())
    } else {
        ChatError::BackendUnavailable(e.to_string())
    }
}

impl OllamaClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, ChatError> {
        let mut builder = HttpClient::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ChatError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = config.base_url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let completion_model = config.completion_model
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            completion_model,
        })
    }

    /// One non-streaming `POST /api/generate` round trip.
    pub async fn generate(&self, prompt: &str) -> Result<GenerateResponse, ChatError> {
        let url = format!("{}/api/generate", self.base_url);
        let req = GenerateRequest {
            model: &self.completion_model,
            prompt,
            stream: false,
        };

        let resp = self.http
            .post(&url)
            .json(&req)
            .send().await
            .map_err(transport_error)?
            .error_for_status()
            .map_err(transport_error)?;
        let body = resp.text().await.map_err(transport_error)?;
        debug!("Generation backend answered with {} bytes", body.len());

        serde_json
            ::from_str::<GenerateResponse>(&body)
            .map_err(|e| ChatError::BackendError(format!("Malformed generation payload: {}", e)))
    }
}

#[async_trait]
impl ChatClient for OllamaClient {
    async fn complete(&self, prompt: &str) -> Result<CompletionResponse, ChatError> {
        let gen_resp = self.generate(prompt).await?;
        Ok(CompletionResponse { response: gen_resp.response })
    }

    fn get_model(&self) -> String {
        self.completion_model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        Some(self.base_url.clone())
    }
}
