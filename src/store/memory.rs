use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{ AtomicU64, Ordering };
use std::sync::{ PoisonError, RwLock };

use crate::error::ChatError;
use crate::models::chat::{ Chat, Message };
use super::ConversationStore;

#[derive(Default)]
struct Chats {
    order: Vec<String>,
    by_id: HashMap<String, Chat>,
}

/// Process-lifetime store. Every mutation happens under one write lock, so
/// an append is visible either completely or not at all.
pub struct MemoryStore {
    chats: RwLock<Chats>,
    next_id: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            chats: RwLock::new(Chats::default()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Starts from existing chats, keeping their order. Ids handed out by
    /// `create` continue after the highest numeric `chat-<n>` suffix.
    pub fn with_chats(chats: Vec<Chat>) -> Self {
        let mut state = Chats::default();
        let mut highest = 0;
        for chat in chats {
            if let Some(n) = chat.id.strip_prefix("chat-").and_then(|s| s.parse::<u64>().ok()) {
                highest = highest.max(n);
            }
            if state.by_id.contains_key(&chat.id) {
                continue;
            }
            state.order.push(chat.id.clone());
            state.by_id.insert(chat.id.clone(), chat);
        }

        Self {
            chats: RwLock::new(state),
            next_id: AtomicU64::new(highest + 1),
        }
    }

    pub fn len(&self) -> usize {
        self.chats.read().unwrap_or_else(PoisonError::into_inner).order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn list(&self, offset: usize, limit: usize) -> Result<Vec<Chat>, ChatError> {
        let chats = self.chats.read().unwrap_or_else(PoisonError::into_inner);
        Ok(
            chats.order
                .iter()
                .skip(offset)
                .take(limit)
                .filter_map(|id| chats.by_id.get(id))
                .cloned()
                .collect()
        )
    }

    async fn get(&self, chat_id: &str) -> Result<Chat, ChatError> {
        let chats = self.chats.read().unwrap_or_else(PoisonError::into_inner);
        chats.by_id
            .get(chat_id)
            .cloned()
            .ok_or_else(|| ChatError::NotFound(chat_id.to_string()))
    }

    async fn exists(&self, chat_id: &str) -> Result<bool, ChatError> {
        let chats = self.chats.read().unwrap_or_else(PoisonError::into_inner);
        Ok(chats.by_id.contains_key(chat_id))
    }

    async fn create(&self, name: &str) -> Result<Chat, ChatError> {
        let mut chats = self.chats.write().unwrap_or_else(PoisonError::into_inner);
        let id = loop {
            let candidate = format!("chat-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
            if !chats.by_id.contains_key(&candidate) {
                break candidate;
            }
        };

        let chat = Chat {
            id: id.clone(),
            name: name.to_string(),
            created_at: Utc::now(),
            messages: Vec::new(),
        };
        chats.order.push(id.clone());
        chats.by_id.insert(id, chat.clone());
        Ok(chat)
    }

    async fn append_message(
        &self,
        chat_id: &str,
        mut message: Message
    ) -> Result<Chat, ChatError> {
        let mut chats = self.chats.write().unwrap_or_else(PoisonError::into_inner);
        let chat = chats.by_id
            .get_mut(chat_id)
            .ok_or_else(|| ChatError::NotFound(chat_id.to_string()))?;

        // created_at never goes backwards within a chat
        if let Some(last) = chat.messages.last() {
            if message.created_at < last.created_at {
                message.created_at = last.created_at;
            }
        }
        chat.messages.push(message);
        Ok(chat.clone())
    }

    async fn delete(&self, chat_id: &str) -> Result<Chat, ChatError> {
        let mut chats = self.chats.write().unwrap_or_else(PoisonError::into_inner);
        let chat = chats.by_id
            .remove(chat_id)
            .ok_or_else(|| ChatError::NotFound(chat_id.to_string()))?;
        chats.order.retain(|id| id != chat_id);
        Ok(chat)
    }
}
