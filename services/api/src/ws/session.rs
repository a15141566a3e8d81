//! Manages the WebSocket connection lifecycle for one conversation.

use super::{
    cycle::run_turn,
    protocol::{ClientMessage, ServerMessage},
};
use crate::{models::ConversationTurn, state::AppState};
use anyhow::Result;
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use rmcp::ServiceExt;
use std::sync::Arc;
use tracing::{Instrument, error, info, instrument, warn};
use uuid::Uuid;

/// Axum handler to upgrade an HTTP connection to a WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Main handler for an individual WebSocket connection.
///
/// Takes the instruction snapshot from the check-in history, announces the
/// session and then runs the conversation until the client leaves.
#[instrument(name = "ws_session", skip_all, fields(session_id))]
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let session_id = Uuid::new_v4();
    tracing::Span::current().record("session_id", tracing::field::display(session_id));
    info!("New WebSocket connection.");

    let (mut socket_tx, socket_rx) = socket.split();

    let (instructions, context) = match state.instructions().await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            error!(error = ?e, "Session initialization failed");
            let _ = send_msg(
                &mut socket_tx,
                ServerMessage::Error {
                    message: "Could not load your check-in history.".to_string(),
                },
            )
            .await;
            return;
        }
    };

    if send_msg(
        &mut socket_tx,
        ServerMessage::Ready {
            session_id,
            context,
        },
    )
    .await
    .is_err()
    {
        error!("Failed to send Ready message to client.");
        return;
    }

    let session_span = tracing::info_span!("agent_runtime", %session_id);
    async move {
        if let Err(e) = run_agent_session(state, socket_tx, socket_rx, instructions).await {
            error!(error = ?e, "Agent session terminated with error.");
        }
        info!("Agent session finished.");
    }
    .instrument(session_span)
    .await;
}

/// The main event loop for an active conversation.
///
/// User turns are handled one at a time, so tools never run concurrently
/// within a conversation.
async fn run_agent_session(
    state: Arc<AppState>,
    mut socket_tx: SplitSink<WebSocket, Message>,
    mut socket_rx: SplitStream<WebSocket>,
    instructions: String,
) -> Result<()> {
    let wellness_service = state.tool_service();
    let (server_transport, client_transport) = tokio::io::duplex(4096);

    // Spawn the agent's tool-handling service.
    let agent_tool_handle = tokio::spawn(async move {
        if let Ok(service) = wellness_service.serve(server_transport).await {
            let _ = service.waiting().await;
        }
    });
    let mcp_client = ().serve(client_transport).await?;

    let mut conversation: Vec<ConversationTurn> = Vec::new();

    while let Some(msg_result) = socket_rx.next().await {
        match msg_result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::UserTurn { text }) => {
                    let reply = match run_turn(
                        &state,
                        &instructions,
                        &mut conversation,
                        &mcp_client,
                        &text,
                    )
                    .await
                    {
                        Ok(reply) => ServerMessage::AgentReply { text: reply },
                        Err(e) => {
                            error!(error = ?e, "Failed to handle user turn");
                            ServerMessage::Error {
                                message: "Sorry, something went wrong. Could you say that again?"
                                    .to_string(),
                            }
                        }
                    };
                    send_msg(&mut socket_tx, reply).await?;
                }
                Ok(ClientMessage::EndSession) => {
                    info!(turns = conversation.len(), "Client ended the session.");
                    send_msg(&mut socket_tx, ServerMessage::SessionEnded).await?;
                    break;
                }
                Err(e) => warn!(error = %e, "Ignoring malformed client message."),
            },
            Ok(Message::Close(_)) => {
                info!("Client sent close frame. Shutting down session.");
                break;
            }
            Ok(Message::Binary(_)) => {
                warn!("Ignoring binary frame; audio is handled by the voice pipeline.")
            }
            Ok(Message::Ping(_) | Message::Pong(_)) => {}
            Err(e) => {
                error!("Error receiving from client WebSocket: {:?}", e);
                break;
            }
        }
    }

    drop(mcp_client);
    agent_tool_handle.abort();
    info!("WebSocket connection closed and agent session terminated.");
    Ok(())
}

/// A helper function to serialize and send a `ServerMessage` to the client.
pub(crate) async fn send_msg(
    socket_tx: &mut SplitSink<WebSocket, Message>,
    msg: ServerMessage,
) -> Result<()> {
    let serialized = serde_json::to_string(&msg)?;
    socket_tx.send(Message::Text(serialized.into())).await?;
    Ok(())
}
