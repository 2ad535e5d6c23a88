pub mod cache;
pub mod cli;
pub mod error;
pub mod llm;
pub mod models;
pub mod server;
pub mod service;
pub mod store;

use cache::CachedChatClient;
use cli::Args;
use llm::chat::{ new_client, ChatClient };
use log::info;
use server::Server;
use service::ChatService;
use std::error::Error;
use std::sync::Arc;

/// Wires the store, generation client and chat service from `args`.
pub fn build_service(args: &Args) -> Result<ChatService, Box<dyn Error + Send + Sync>> {
    let store = store::initialize_store(args.seed_chats);

    let llm_config = args.llm_config();
    let mut chat_client: Arc<dyn ChatClient> = new_client(&llm_config)?;
    info!(
        "Generation client configured: Model={}, BaseURL={}",
        chat_client.get_model(),
        chat_client.get_base_url().as_deref().unwrap_or("adapter default")
    );
    if args.enable_cache {
        chat_client = Arc::new(CachedChatClient::new(chat_client, args.cache_ttl()));
    }

    let mut service = ChatService::new(store, chat_client).with_default_chat_name(
        args.default_chat_name.clone()
    );
    if args.seed_chats > 0 {
        service = service.with_profile(store::fixtures::seeded_profile());
    }
    Ok(service)
}

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("WebSocket Port: {:?}", args.ws_port);
    info!("Generation Base URL: {}", args.generation_base_url);
    info!("Generation Model: {}", args.generation_model);
    info!("Generation Timeout (secs): {}", args.generation_timeout_secs);
    info!("Default Chat Name: {}", args.default_chat_name);
    info!("Seed Chats: {}", args.seed_chats);
    info!("Cache Enabled: {}", args.enable_cache);
    if args.enable_cache {
        info!("Cache TTL (secs): {}", args.cache_ttl_secs);
    }
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let service = Arc::new(build_service(&args)?);
    let server = Server::new(service, args);
    server.run().await?;

    Ok(())
}
