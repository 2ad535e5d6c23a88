use serde::{ Serialize, Deserialize };
use serde_json::Value;

use crate::models::api::{ GraphResponse, OperationRequest };

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "operation", rename_all = "camelCase")] Operation {
        id: String,
        operation_name: String,
        #[serde(default)]
        variables: Option<Value>,
    },
    #[serde(rename = "subscribe")] Subscribe {
        id: String,
    },
}

impl ClientMessage {
    pub fn id(&self) -> &str {
        match self {
            ClientMessage::Operation { id, .. } | ClientMessage::Subscribe { id } => id,
        }
    }

    /// Splits an operation frame into its id and the shared request envelope.
    pub fn into_request(self) -> Option<(String, OperationRequest)> {
        match self {
            ClientMessage::Operation { id, operation_name, variables } =>
                Some((id, OperationRequest { operation_name, variables })),
            ClientMessage::Subscribe { .. } => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "processing")] Processing {
        id: String,
    },
    #[serde(rename = "result")] Result {
        id: String,
        payload: GraphResponse,
    },
    #[serde(rename = "error")] Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn operation_frame_decodes() {
        let frame = json!({
            "type": "operation",
            "id": "7",
            "operationName": "getChat",
            "variables": { "id": "chat-1" }
        });
        let msg: ClientMessage = serde_json::from_value(frame).unwrap();
        match msg {
            ClientMessage::Operation { id, operation_name, variables } => {
                assert_eq!(id, "7");
                assert_eq!(operation_name, "getChat");
                assert_eq!(variables.unwrap()["id"], "chat-1");
            }
            other => panic!("unexpected frame {:?}", other),
        }
    }

    #[test]
    fn server_frames_are_tagged() {
        let processing = serde_json::to_value(ServerMessage::Processing { id: "1".into() }).unwrap();
        assert_eq!(processing, json!({ "type": "processing", "id": "1" }));

        let error = serde_json
            ::to_value(ServerMessage::Error { id: None, message: "bad frame".into() })
            .unwrap();
        assert_eq!(error, json!({ "type": "error", "message": "bad frame" }));
    }
}
