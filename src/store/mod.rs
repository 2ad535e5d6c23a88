pub mod fixtures;
mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use log::info;
use std::sync::Arc;

use crate::error::ChatError;
use crate::models::chat::{ Chat, Message };

/// Source of truth for chats and their ordered messages.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Chats in creation order, sliced to `[offset, offset + limit)`.
    /// Out-of-range offsets yield an empty list.
    async fn list(&self, offset: usize, limit: usize) -> Result<Vec<Chat>, ChatError>;

    async fn get(&self, chat_id: &str) -> Result<Chat, ChatError>;

    /// Whether `chat_id` is stored, without copying its messages.
    async fn exists(&self, chat_id: &str) -> Result<bool, ChatError>;

    /// Stores a new empty chat under a freshly allocated id.
    async fn create(&self, name: &str) -> Result<Chat, ChatError>;

    /// Appends one message and returns the updated chat. Readers never see
    /// a partially applied append.
    async fn append_message(&self, chat_id: &str, message: Message) -> Result<Chat, ChatError>;

    async fn delete(&self, chat_id: &str) -> Result<Chat, ChatError>;
}

/// Builds the in-process store, optionally pre-filled with fixture chats.
pub fn initialize_store(seed_chats: usize) -> Arc<dyn ConversationStore> {
    if seed_chats == 0 {
        info!("Conversation store: in-memory, empty");
        return Arc::new(MemoryStore::new());
    }

    let chats = fixtures::generate_chats(seed_chats, &mut rand::rng());
    info!("Conversation store: in-memory, seeded with {} fixture chats", chats.len());
    Arc::new(MemoryStore::with_chats(chats))
}
