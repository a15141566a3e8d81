//! WebSocket Conversation Sessions
//!
//! The speech pipeline in front of this service transcribes what the user
//! says and speaks whatever comes back; over the socket it is plain text.
//!
//! - `protocol`: Defines the JSON-based message format for client-server communication.
//! - `session`: Manages the WebSocket connection lifecycle, from handshake to termination.
//! - `cycle`: Implements the agent's "ReAct" (Reason-Act) logic for one user turn.

mod cycle;
pub mod protocol;
pub mod session;

pub use session::ws_handler;
