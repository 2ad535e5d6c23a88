use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::SingleFlight;
use crate::error::ChatError;
use crate::llm::chat::{ ChatClient, CompletionResponse };

/// Generation client that collapses identical concurrent prompts into one
/// backend request and optionally keeps answers for `ttl`.
pub struct CachedChatClient {
    inner: Arc<dyn ChatClient>,
    flights: SingleFlight<String, CompletionResponse, ChatError>,
}

impl CachedChatClient {
    pub fn new(inner: Arc<dyn ChatClient>, ttl: Duration) -> Self {
        Self {
            inner,
            flights: SingleFlight::new(ttl),
        }
    }
}

#[async_trait]
impl ChatClient for CachedChatClient {
    async fn complete(&self, prompt: &str) -> Result<CompletionResponse, ChatError> {
        let inner = self.inner.clone();
        let owned = prompt.to_string();
        self.flights.get_or_try_init(prompt.to_string(), move || async move {
            inner.complete(&owned).await
        }).await
    }

    fn get_model(&self) -> String {
        self.inner.get_model()
    }

    fn get_base_url(&self) -> Option<String> {
        self.inner.get_base_url()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{ AtomicUsize, Ordering };

    struct SlowEcho {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChatClient for SlowEcho {
        async fn complete(&self, prompt: &str) -> Result<CompletionResponse, ChatError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(CompletionResponse { response: format!("echo {}", prompt) })
        }

        fn get_model(&self) -> String {
            "echo".into()
        }

        fn get_base_url(&self) -> Option<String> {
            None
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn identical_prompts_hit_backend_once() {
        let backend = Arc::new(SlowEcho { calls: AtomicUsize::new(0) });
        let cached = Arc::new(CachedChatClient::new(backend.clone(), Duration::ZERO));

        let a = {
            let cached = cached.clone();
            tokio::spawn(async move { cached.complete("User: hi\nAssistant:").await })
        };
        let b = {
            let cached = cached.clone();
            tokio::spawn(async move { cached.complete("User: hi\nAssistant:").await })
        };

        let a = a.await.unwrap().unwrap();
        let b = b.await.unwrap().unwrap();
        assert_eq!(a, b);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cached.get_model(), "echo");
    }

    #[tokio::test]
    async fn different_prompts_are_not_merged() {
        let backend = Arc::new(SlowEcho { calls: AtomicUsize::new(0) });
        let cached = CachedChatClient::new(backend.clone(), Duration::from_secs(30));

        let a = cached.complete("User: a\nAssistant:").await.unwrap();
        let b = cached.complete("User: b\nAssistant:").await.unwrap();
        assert_ne!(a, b);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }
}
