//! Builders and readers for the Notion page properties the assistant uses.
//!
//! The todo database has a `Task` title, a `Status` status and a `Date`
//! date column. The wellness database has a `Date` column and `Mood`,
//! `Objectives` and `Summary` rich-text columns.

use serde_json::{Value, json};

pub const TITLE: &str = "Task";
pub const STATUS: &str = "Status";
pub const DATE: &str = "Date";

pub const STATUS_NOT_STARTED: &str = "Not started";
pub const STATUS_DONE: &str = "Done";

const MISSING_STATUS: &str = "No status";

pub fn title(content: &str) -> Value {
    json!({ "title": [{ "text": { "content": content } }] })
}

pub fn rich_text(content: &str) -> Value {
    json!({ "rich_text": [{ "text": { "content": content } }] })
}

pub fn status(name: &str) -> Value {
    json!({ "status": { "name": name } })
}

pub fn date(start: &str) -> Value {
    json!({ "date": { "start": start } })
}

/// A new row in the todo database.
pub fn new_task_page(database_id: &str, task_title: &str, created: &str) -> Value {
    json!({
        "parent": { "database_id": database_id },
        "properties": {
            TITLE: title(task_title),
            STATUS: status(STATUS_NOT_STARTED),
            DATE: date(created),
        }
    })
}

/// Query for every row whose status is not `Done`, newest first.
pub fn pending_tasks_query() -> Value {
    json!({
        "filter": {
            "property": STATUS,
            "status": { "does_not_equal": STATUS_DONE }
        },
        "sorts": [{ "property": DATE, "direction": "descending" }]
    })
}

/// Unfiltered query, continuing from `cursor` when set.
pub fn all_rows_query(cursor: Option<&str>) -> Value {
    match cursor {
        Some(cursor) => json!({ "start_cursor": cursor }),
        None => json!({}),
    }
}

/// Property patch that touches only the supplied fields.
pub fn task_patch(new_title: Option<&str>, new_status: Option<&str>) -> Value {
    let mut properties = serde_json::Map::new();
    if let Some(t) = new_title {
        properties.insert(TITLE.to_string(), title(t));
    }
    if let Some(s) = new_status {
        properties.insert(STATUS.to_string(), status(s));
    }
    json!({ "properties": properties })
}

pub fn archive_patch() -> Value {
    json!({ "archived": true })
}

/// A todo row as read back from Notion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTask {
    pub id: String,
    pub title: String,
    pub status: String,
    pub created_date: Option<String>,
}

impl RemoteTask {
    /// Reads a task out of a page object. Pages without an id are rejected.
    pub fn from_page(page: &Value) -> Option<Self> {
        let id = page.get("id")?.as_str()?.to_string();
        let text = |pointer: &str| {
            page.pointer(pointer)
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        Some(Self {
            id,
            title: text("/properties/Task/title/0/text/content").unwrap_or_default(),
            status: text("/properties/Status/status/name")
                .unwrap_or_else(|| MISSING_STATUS.to_string()),
            created_date: text("/properties/Date/date/start"),
        })
    }
}

#[cfg(test)]
pub(crate) fn task_page(id: &str, task_title: &str, status_name: &str) -> Value {
    json!({
        "object": "page",
        "id": id,
        "properties": {
            TITLE: title(task_title),
            STATUS: status(status_name),
            DATE: date("2024-01-01T00:00:00"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_page_layout() {
        let page = new_task_page("db-1", "buy milk", "2024-03-01T10:00:00");
        assert_eq!(page["parent"]["database_id"], "db-1");
        assert_eq!(
            page.pointer("/properties/Task/title/0/text/content"),
            Some(&json!("buy milk"))
        );
        assert_eq!(
            page.pointer("/properties/Status/status/name"),
            Some(&json!("Not started"))
        );
        assert_eq!(
            page.pointer("/properties/Date/date/start"),
            Some(&json!("2024-03-01T10:00:00"))
        );
    }

    #[test]
    fn task_patch_only_carries_supplied_fields() {
        let patch = task_patch(None, Some("In progress"));
        let properties = patch["properties"].as_object().unwrap();
        assert_eq!(properties.len(), 1);
        assert_eq!(properties["Status"]["status"]["name"], "In progress");

        let both = task_patch(Some("Buy oat milk"), Some("Done"));
        assert_eq!(both["properties"].as_object().unwrap().len(), 2);
    }

    #[test]
    fn reads_task_from_page() {
        let task = RemoteTask::from_page(&task_page("p1", "Call mom", "In progress")).unwrap();
        assert_eq!(task.id, "p1");
        assert_eq!(task.title, "Call mom");
        assert_eq!(task.status, "In progress");
        assert_eq!(task.created_date.as_deref(), Some("2024-01-01T00:00:00"));
    }

    #[test]
    fn tolerates_empty_title_and_missing_status() {
        let page = json!({ "id": "p2", "properties": { "Task": { "title": [] } } });
        let task = RemoteTask::from_page(&page).unwrap();
        assert_eq!(task.title, "");
        assert_eq!(task.status, "No status");
        assert!(RemoteTask::from_page(&json!({ "properties": {} })).is_none());
    }
}
