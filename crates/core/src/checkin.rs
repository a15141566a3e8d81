use chrono::Local;
use serde::{Deserialize, Serialize};

/// One structured record of a user's daily check-in.
///
/// Records are appended to the history log at the end of a conversation and
/// are never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInRecord {
    /// Local ISO-8601 timestamp of when the check-in was saved.
    pub date: String,
    /// The user's self-reported mood and energy level.
    pub mood: String,
    /// Things the user wants to accomplish, in the order they were given.
    #[serde(default)]
    pub objectives: Vec<String>,
    /// Short recap of the conversation.
    #[serde(default)]
    pub summary: String,
}

impl CheckInRecord {
    /// Builds a record stamped with the current local time.
    pub fn new(mood: impl Into<String>, objectives: &str, summary: impl Into<String>) -> Self {
        Self {
            date: timestamp_now(),
            mood: mood.into(),
            objectives: split_list(objectives),
            summary: summary.into(),
        }
    }

    /// Objectives joined the way they are read back to the user.
    pub fn objectives_text(&self) -> String {
        self.objectives.join(", ")
    }
}

/// Splits a comma-separated list into trimmed items.
///
/// Empty items are kept, so `""` yields `[""]`.
pub fn split_list(input: &str) -> Vec<String> {
    input.split(',').map(|item| item.trim().to_string()).collect()
}

/// Current local time as `YYYY-MM-DDTHH:MM:SS.ffffff`.
pub fn timestamp_now() -> String {
    Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_list_trims_items() {
        assert_eq!(split_list("buy milk, call mom"), vec!["buy milk", "call mom"]);
        assert_eq!(split_list("  rest  ,read"), vec!["rest", "read"]);
    }

    #[test]
    fn split_list_keeps_empty_items() {
        assert_eq!(split_list(""), vec![""]);
        assert_eq!(split_list("walk, , stretch,"), vec!["walk", "", "stretch", ""]);
    }

    #[test]
    fn empty_objectives_are_stored_as_one_empty_item() {
        let record = CheckInRecord::new("fine", "", "");
        assert_eq!(record.objectives, vec![""]);
    }

    #[test]
    fn new_record_parses_objectives() {
        let record = CheckInRecord::new("calm", "walk, journal", "");
        assert_eq!(record.objectives, vec!["walk", "journal"]);
        assert_eq!(record.objectives_text(), "walk, journal");
        assert!(record.date.contains('T'));
    }

    #[test]
    fn missing_optional_fields_default_on_load() {
        let record: CheckInRecord =
            serde_json::from_str(r#"{"date": "2024-01-01T00:00:00", "mood": "ok"}"#).unwrap();
        assert!(record.objectives.is_empty());
        assert_eq!(record.summary, "");
    }
}
