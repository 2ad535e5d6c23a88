use clap::Parser;
use std::time::Duration;

use crate::llm::LlmConfig;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Server Args ---
    /// Host address and port for the HTTP query/mutation endpoint.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:4000")]
    pub server_addr: String,

    /// Port for the optional WebSocket transport. Disabled when unset.
    #[arg(long, env = "WS_PORT")]
    pub ws_port: Option<u16>,

    /// Global limit on accepted WebSocket connections per second.
    #[arg(long, env = "WS_CONNECTIONS_PER_SECOND", default_value = "10")]
    pub ws_connections_per_second: u32,

    // --- Generation Backend Args ---
    /// Base URL of the text-generation backend (e.g., http://localhost:11434 for Ollama)
    #[arg(long, env = "GENERATION_BASE_URL", default_value = "http://localhost:11434")]
    pub generation_base_url: String,

    /// Model name sent with every completion request.
    #[arg(long, env = "GENERATION_MODEL", default_value = "llama3")]
    pub generation_model: String,

    /// Seconds to wait for one completion before replying with the fallback. 0 disables the timeout.
    #[arg(long, env = "GENERATION_TIMEOUT_SECS", default_value = "60")]
    pub generation_timeout_secs: u64,

    // --- Chat Args ---
    /// Name given to chats created without one.
    #[arg(long, env = "DEFAULT_CHAT_NAME", default_value = "New Chat")]
    pub default_chat_name: String,

    /// Number of mock chats to generate at startup, for local client development.
    #[arg(long, env = "SEED_CHATS", default_value = "0")]
    pub seed_chats: usize,

    // --- Caching Args ---
    /// Share one backend request between identical concurrent prompts.
    #[arg(long, env = "ENABLE_CACHE", default_value = "false")]
    pub enable_cache: bool,

    /// Seconds a finished completion stays cached. 0 keeps only in-flight requests.
    #[arg(long, env = "CACHE_TTL_SECS", default_value = "0")]
    pub cache_ttl_secs: u64,

    // --- TLS Args ---
    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,

    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,
}

impl Args {
    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig {
            base_url: Some(self.generation_base_url.clone()),
            completion_model: Some(self.generation_model.clone()),
            timeout: (self.generation_timeout_secs > 0).then(|| {
                Duration::from_secs(self.generation_timeout_secs)
            }),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
