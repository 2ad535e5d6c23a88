use chrono::{ DateTime, Utc };
use serde::{ Deserialize, Serialize };
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Speaker label used when the transcript is rendered into a prompt.
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

/// One part of a message, encoded as `{"type": ..., "value": ...}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum MessageContent {
    Text(String),
    Image(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub text: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub image_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Builds a text message with a fresh id, stamped now.
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: format!("msg-{}", Uuid::new_v4().simple()),
            text: Some(text.into()),
            role,
            image_urls: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Builds a message from content parts. Text parts are joined with a
    /// newline; image parts keep their order.
    pub fn from_content(
        id: impl Into<String>,
        role: Role,
        parts: Vec<MessageContent>,
        created_at: DateTime<Utc>
    ) -> Self {
        let mut texts = Vec::new();
        let mut image_urls = Vec::new();
        for part in parts {
            match part {
                MessageContent::Text(t) => texts.push(t),
                MessageContent::Image(url) => image_urls.push(url),
            }
        }

        Self {
            id: id.into(),
            text: if texts.is_empty() { None } else { Some(texts.join("\n")) },
            role,
            image_urls,
            created_at,
        }
    }

    pub fn content(&self) -> Vec<MessageContent> {
        self.text
            .iter()
            .cloned()
            .map(MessageContent::Text)
            .chain(self.image_urls.iter().cloned().map(MessageContent::Image))
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: Option<String>,
    pub bio: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileInput {
    pub name: Option<String>,
    pub bio: Option<String>,
}
