//! Chat lifecycle and the user/assistant message exchange.

pub mod prompt;

use log::{ debug, info, warn };
use std::collections::HashMap;
use std::sync::{ Arc, Mutex, PoisonError, RwLock };
use tokio::sync::Mutex as AsyncMutex;

use crate::error::ChatError;
use crate::llm::chat::ChatClient;
use crate::models::chat::{ Chat, Message, Role, UpdateProfileInput, UserProfile };
use crate::store::ConversationStore;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const DEFAULT_CHAT_NAME: &str = "New Chat";

/// Assistant text stored when the generation backend fails.
pub const FALLBACK_REPLY: &str = "no response";

pub struct ChatService {
    store: Arc<dyn ConversationStore>,
    chat_client: Arc<dyn ChatClient>,
    exchange_locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    profile: RwLock<UserProfile>,
    default_chat_name: String,
}

impl ChatService {
    pub fn new(store: Arc<dyn ConversationStore>, chat_client: Arc<dyn ChatClient>) -> Self {
        Self {
            store,
            chat_client,
            exchange_locks: Mutex::new(HashMap::new()),
            profile: RwLock::new(UserProfile::default()),
            default_chat_name: DEFAULT_CHAT_NAME.to_string(),
        }
    }

    pub fn with_default_chat_name(mut self, name: impl Into<String>) -> Self {
        self.default_chat_name = name.into();
        self
    }

    pub fn with_profile(self, profile: UserProfile) -> Self {
        *self.profile.write().unwrap_or_else(PoisonError::into_inner) = profile;
        self
    }

    pub async fn list_chats(
        &self,
        first: Option<i64>,
        offset: Option<i64>
    ) -> Result<Vec<Chat>, ChatError> {
        let first = first.unwrap_or(DEFAULT_PAGE_SIZE);
        let offset = offset.unwrap_or(0);
        let limit = usize
            ::try_from(first)
            .map_err(|_| {
                ChatError::InvalidArgument(format!("first must be non-negative, got {}", first))
            })?;
        let offset = usize
            ::try_from(offset)
            .map_err(|_| {
                ChatError::InvalidArgument(format!("offset must be non-negative, got {}", offset))
            })?;

        self.store.list(offset, limit).await
    }

    pub async fn get_chat(&self, chat_id: &str) -> Result<Chat, ChatError> {
        self.store.get(chat_id).await
    }

    /// Creates an empty chat. A missing or empty name falls back to the
    /// configured default; any other name is stored as given.
    pub async fn create_chat(&self, name: Option<&str>) -> Result<Chat, ChatError> {
        let name = name
            .filter(|n| !n.is_empty())
            .unwrap_or(self.default_chat_name.as_str());
        let chat = self.store.create(name).await?;
        info!("Created chat {} ({})", chat.id, chat.name);
        Ok(chat)
    }

    pub async fn delete_chat(&self, chat_id: &str) -> Result<Chat, ChatError> {
        let chat = self.store.delete(chat_id).await?;
        self.exchange_locks.lock().unwrap_or_else(PoisonError::into_inner).remove(chat_id);
        info!("Deleted chat {} with {} messages", chat.id, chat.messages.len());
        Ok(chat)
    }

    /// Appends the user's message, asks the generation backend for a reply
    /// and appends that reply, returning it.
    ///
    /// Exchanges on the same chat run one at a time, so every user message
    /// is directly followed by its reply. Backend failures do not fail the
    /// call: the reply becomes [`FALLBACK_REPLY`] and the user message stays.
    /// Only `InvalidArgument` and `NotFound` are returned as errors.
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<Message, ChatError> {
        if text.is_empty() {
            return Err(ChatError::InvalidArgument("text must not be empty".to_string()));
        }
        if !self.store.exists(chat_id).await? {
            return Err(ChatError::NotFound(chat_id.to_string()));
        }

        let lock = self.exchange_lock(chat_id);
        let _exchange = lock.lock().await;

        let chat = match self.store.append_message(chat_id, Message::new(Role::User, text)).await {
            Ok(chat) => chat,
            Err(e) => {
                self.forget_lock_if_missing(chat_id, &e);
                return Err(e);
            }
        };
        let prompt = prompt::render_prompt(&chat.messages);
        debug!("Prompt for chat {} spans {} messages", chat_id, chat.messages.len());

        let reply_text = match self.chat_client.complete(&prompt).await {
            Ok(completion) => completion.response.trim().to_string(),
            Err(e) => {
                warn!("Generation failed for chat {}: {}. Replying with fallback.", chat_id, e);
                FALLBACK_REPLY.to_string()
            }
        };

        let reply = Message::new(Role::Assistant, reply_text);
        let reply_id = reply.id.clone();
        let chat = match self.store.append_message(chat_id, reply).await {
            Ok(chat) => chat,
            Err(e) => {
                self.forget_lock_if_missing(chat_id, &e);
                return Err(e);
            }
        };
        info!("Chat {} now holds {} messages", chat_id, chat.messages.len());

        chat.messages
            .into_iter()
            .rev()
            .find(|m| m.id == reply_id)
            .ok_or_else(|| ChatError::NotFound(chat_id.to_string()))
    }

    pub fn profile(&self) -> UserProfile {
        self.profile.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Overwrites only the fields present in `input`.
    pub fn update_profile(&self, input: UpdateProfileInput) -> bool {
        let mut profile = self.profile.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(name) = input.name {
            profile.name = Some(name);
        }
        if let Some(bio) = input.bio {
            profile.bio = Some(bio);
        }
        true
    }

    fn exchange_lock(&self, chat_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.exchange_locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(chat_id.to_string()).or_default().clone()
    }

    fn forget_lock_if_missing(&self, chat_id: &str, err: &ChatError) {
        if matches!(err, ChatError::NotFound(_)) {
            self.exchange_locks.lock().unwrap_or_else(PoisonError::into_inner).remove(chat_id);
        }
    }
}
