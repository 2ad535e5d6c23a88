//! Maps protocol operations onto the chat service and its results back onto
//! the response envelope. Shared by the HTTP and WebSocket transports.

use log::{ info, warn };
use serde::Serialize;
use serde_json::Value;

use crate::error::ChatError;
use crate::models::api::{ GraphResponse, Operation, OperationRequest };
use crate::service::ChatService;

fn to_value<T: Serialize>(value: T) -> Result<Value, ChatError> {
    serde_json::to_value(value).map_err(|e| ChatError::Internal(e.to_string()))
}

async fn run(service: &ChatService, operation: Operation) -> Result<Value, ChatError> {
    match operation {
        Operation::GetChats(args) => to_value(service.list_chats(args.first, args.offset).await?),
        Operation::GetChat(args) => to_value(service.get_chat(&args.id).await?),
        Operation::CreateChat(args) => to_value(service.create_chat(args.name.as_deref()).await?),
        Operation::SendMessage(args) =>
            to_value(service.send_message(&args.chat_id, &args.text).await?),
        Operation::DeleteChat(args) => to_value(service.delete_chat(&args.chat_id).await?),
        Operation::Profile(_) => to_value(service.profile()),
        Operation::UpdateProfile(args) => to_value(service.update_profile(args.input)),
    }
}

/// Validates `request` and runs it. Errors never escape: they come back as
/// the `errors` part of the envelope.
pub async fn execute(service: &ChatService, request: OperationRequest) -> GraphResponse {
    let operation = match request.into_operation() {
        Ok(op) => op,
        Err(e) => {
            warn!("Rejected operation: {}", e);
            return GraphResponse::from(&e);
        }
    };

    let name = operation.name();
    info!("Executing {}", name);
    match run(service, operation).await {
        Ok(value) => GraphResponse::ok(name, value),
        Err(e) => {
            warn!("{} failed: {}", name, e);
            GraphResponse::from(&e)
        }
    }
}
