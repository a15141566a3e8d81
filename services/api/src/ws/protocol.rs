//! Defines the WebSocket message protocol between the voice front end and the API server.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Messages sent from the client to the server.
#[derive(Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// A transcribed user utterance.
    UserTurn { text: String },
    /// The user is done; close the conversation.
    EndSession,
}

/// Messages sent from the server to the client.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The conversation is ready; `context` is what the assistant remembers.
    Ready { session_id: Uuid, context: String },
    /// Text for the assistant to speak.
    AgentReply { text: String },
    /// Reports an error to the client.
    Error { message: String },
    /// The conversation has ended.
    SessionEnded,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_client_messages() {
        let turn: ClientMessage =
            serde_json::from_value(json!({ "type": "user_turn", "text": "I feel okay" })).unwrap();
        assert_eq!(
            turn,
            ClientMessage::UserTurn {
                text: "I feel okay".to_string()
            }
        );

        let end: ClientMessage = serde_json::from_value(json!({ "type": "end_session" })).unwrap();
        assert_eq!(end, ClientMessage::EndSession);

        assert!(serde_json::from_value::<ClientMessage>(json!({ "type": "init" })).is_err());
    }

    #[test]
    fn server_messages_are_type_tagged() {
        let reply = serde_json::to_value(ServerMessage::AgentReply {
            text: "Hello".to_string(),
        })
        .unwrap();
        assert_eq!(reply, json!({ "type": "agent_reply", "text": "Hello" }));

        let ended = serde_json::to_value(ServerMessage::SessionEnded).unwrap();
        assert_eq!(ended, json!({ "type": "session_ended" }));
    }
}
