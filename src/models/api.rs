//! Wire envelope of the query/mutation protocol.
//!
//! Requests name an operation and carry its variables; responses follow the
//! GraphQL shape `{ data, errors }` so existing GraphQL clients can read them.

use serde::{ Deserialize, Serialize };
use serde_json::{ json, Value };

use crate::error::ChatError;
use crate::models::chat::UpdateProfileInput;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRequest {
    pub operation_name: String,
    #[serde(default)]
    pub variables: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetChatsArgs {
    pub first: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetChatArgs {
    pub id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateChatArgs {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct SendMessageArgs {
    pub chat_id: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct DeleteChatArgs {
    pub chat_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileArgs {}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileArgs {
    pub input: UpdateProfileInput,
}

/// A validated operation with its typed arguments.
#[derive(Debug, Deserialize)]
#[serde(tag = "operationName", content = "variables")]
pub enum Operation {
    #[serde(rename = "getChats")] GetChats(GetChatsArgs),
    #[serde(rename = "getChat")] GetChat(GetChatArgs),
    #[serde(rename = "createChat")] CreateChat(CreateChatArgs),
    #[serde(rename = "sendMessage")] SendMessage(SendMessageArgs),
    #[serde(rename = "deleteChat")] DeleteChat(DeleteChatArgs),
    #[serde(rename = "profile")] Profile(ProfileArgs),
    #[serde(rename = "updateProfile")] UpdateProfile(UpdateProfileArgs),
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::GetChats(_) => "getChats",
            Operation::GetChat(_) => "getChat",
            Operation::CreateChat(_) => "createChat",
            Operation::SendMessage(_) => "sendMessage",
            Operation::DeleteChat(_) => "deleteChat",
            Operation::Profile(_) => "profile",
            Operation::UpdateProfile(_) => "updateProfile",
        }
    }
}

impl OperationRequest {
    /// Checks the operation name and argument shape against the schema.
    pub fn into_operation(self) -> Result<Operation, ChatError> {
        let variables = match self.variables {
            None | Some(Value::Null) => json!({}),
            Some(v) => v,
        };
        let tagged = json!({
            "operationName": self.operation_name,
            "variables": variables,
        });
        serde_json
            ::from_value(tagged)
            .map_err(|e| {
                ChatError::InvalidArgument(format!("{}: {}", self.operation_name, e))
            })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorExtensions {
    pub code: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphError {
    pub message: String,
    pub extensions: ErrorExtensions,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphResponse {
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<GraphError>>,
}

impl GraphResponse {
    pub fn ok(operation: &str, value: Value) -> Self {
        let mut data = serde_json::Map::new();
        data.insert(operation.to_string(), value);
        Self { data: Some(Value::Object(data)), errors: None }
    }

    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self {
            data: None,
            errors: Some(
                vec![GraphError {
                    message: message.into(),
                    extensions: ErrorExtensions { code: code.to_string() },
                }]
            ),
        }
    }

    pub fn is_error(&self) -> bool {
        self.errors.as_ref().is_some_and(|e| !e.is_empty())
    }
}

impl From<&ChatError> for GraphResponse {
    fn from(err: &ChatError) -> Self {
        GraphResponse::error(err.code(), err.to_string())
    }
}
