#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{ AtomicUsize, Ordering };
use std::sync::{ Arc, Mutex };
use std::time::Duration;

use twin_server::error::ChatError;
use twin_server::llm::chat::{ ChatClient, CompletionResponse };
use twin_server::service::ChatService;
use twin_server::store::MemoryStore;

/// Answers `re: <last user line>` so each reply can be matched to its question.
pub struct EchoClient {
    pub delay: Duration,
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
}

impl EchoClient {
    pub fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self { delay, calls: AtomicUsize::new(0), prompts: Mutex::new(Vec::new()) }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

pub fn last_user_line(prompt: &str) -> &str {
    prompt
        .lines()
        .rev()
        .find_map(|line| line.strip_prefix("User: "))
        .unwrap_or("")
}

#[async_trait]
impl ChatClient for EchoClient {
    async fn complete(&self, prompt: &str) -> Result<CompletionResponse, ChatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(CompletionResponse { response: format!("  re: {}\n", last_user_line(prompt)) })
    }

    fn get_model(&self) -> String {
        "echo".into()
    }

    fn get_base_url(&self) -> Option<String> {
        None
    }
}

pub struct FailingClient {
    pub error: ChatError,
}

#[async_trait]
impl ChatClient for FailingClient {
    async fn complete(&self, _prompt: &str) -> Result<CompletionResponse, ChatError> {
        Err(self.error.clone())
    }

    fn get_model(&self) -> String {
        "failing".into()
    }

    fn get_base_url(&self) -> Option<String> {
        None
    }
}

pub fn service_with(client: Arc<dyn ChatClient>) -> (Arc<MemoryStore>, ChatService) {
    let store = Arc::new(MemoryStore::new());
    let service = ChatService::new(store.clone(), client);
    (store, service)
}
