//! Saves a finished check-in locally and, when configured, to Notion.

use crate::{
    checkin::CheckInRecord,
    history::{HistoryError, HistoryStore},
    notion::{NotionApi, properties},
};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{error, info};

/// What happened to the Notion copy of a check-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum MirrorStatus {
    /// Mirroring is not configured.
    Skipped,
    Mirrored,
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckInReceipt {
    pub record: CheckInRecord,
    /// Objectives exactly as the user phrased them.
    #[serde(skip)]
    pub raw_objectives: String,
    pub mirror: MirrorStatus,
}

#[derive(Clone)]
pub struct CheckInPersister {
    history: HistoryStore,
    mirror: Option<(Arc<dyn NotionApi>, String)>,
}

impl CheckInPersister {
    pub fn new(history: HistoryStore) -> Self {
        Self {
            history,
            mirror: None,
        }
    }

    /// Also copy every check-in into the given Notion database.
    pub fn with_mirror(mut self, api: Arc<dyn NotionApi>, database_id: impl Into<String>) -> Self {
        self.mirror = Some((api, database_id.into()));
        self
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Builds the record, writes it to the local log, then mirrors it.
    ///
    /// A mirror failure never undoes the local write.
    pub async fn save(
        &self,
        mood: &str,
        objectives: &str,
        summary: &str,
    ) -> Result<CheckInReceipt, HistoryError> {
        let record = CheckInRecord::new(mood, objectives, summary);
        self.history.append(&record).await?;

        let mirror = match &self.mirror {
            None => MirrorStatus::Skipped,
            Some((api, database_id)) => match api.create_page(check_in_page(database_id, &record)).await {
                Ok(_) => {
                    info!(date = %record.date, "Saved check-in to Notion");
                    MirrorStatus::Mirrored
                }
                Err(e) => {
                    error!(error = %e, "Error saving check-in to Notion");
                    MirrorStatus::Failed(e.to_string())
                }
            },
        };

        Ok(CheckInReceipt {
            record,
            raw_objectives: objectives.to_string(),
            mirror,
        })
    }
}

fn check_in_page(database_id: &str, record: &CheckInRecord) -> Value {
    json!({
        "parent": { "database_id": database_id },
        "properties": {
            properties::DATE: properties::date(&record.date),
            "Mood": properties::rich_text(&record.mood),
            "Objectives": properties::rich_text(&record.objectives_text()),
            "Summary": properties::rich_text(&record.summary),
        }
    })
}
