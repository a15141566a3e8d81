//! API Models
//!
//! Request and response bodies for the REST API, documented with `utoipa`,
//! plus the in-memory conversation turns kept for one WebSocket session.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use wellness_core::{
    checkin::CheckInRecord,
    persister::{CheckInReceipt, MirrorStatus},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    User,
    Assistant,
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnRole::User => write!(f, "user"),
            TurnRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// One utterance in a conversation, as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct CheckIn {
    #[schema(example = "2024-01-01T08:30:00.000000")]
    pub date: String,
    #[schema(example = "tired but hopeful")]
    pub mood: String,
    #[schema(example = json!(["go for a walk", "finish the report"]))]
    pub objectives: Vec<String>,
    pub summary: String,
}

impl From<CheckInRecord> for CheckIn {
    fn from(record: CheckInRecord) -> Self {
        Self {
            date: record.date,
            mood: record.mood,
            objectives: record.objectives,
            summary: record.summary,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct CheckInContext {
    #[schema(example = "This is the user's first check-in.")]
    pub context: String,
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct SaveCheckInPayload {
    #[schema(example = "calm")]
    pub mood: String,
    /// Comma-separated list of objectives.
    #[schema(example = "stretch, call Sam")]
    pub objectives: String,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MirrorOutcome {
    Skipped,
    Mirrored,
    Failed,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct SaveCheckInResponse {
    pub record: CheckIn,
    pub mirror: MirrorOutcome,
    /// The confirmation the assistant would speak.
    pub message: String,
}

impl From<CheckInReceipt> for SaveCheckInResponse {
    fn from(receipt: CheckInReceipt) -> Self {
        let message = wellness_core::replies::check_in_saved(&receipt);
        let mirror = match receipt.mirror {
            MirrorStatus::Skipped => MirrorOutcome::Skipped,
            MirrorStatus::Mirrored => MirrorOutcome::Mirrored,
            MirrorStatus::Failed(_) => MirrorOutcome::Failed,
        };
        Self {
            record: receipt.record.into(),
            mirror,
            message,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}
