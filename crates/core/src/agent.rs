//! Wellness Tool Service
//!
//! Exposes the check-in and todo operations to the language model as MCP
//! tools. Each tool has a typed argument struct whose JSON schema is what the
//! model sees; the handlers delegate to [`CheckInPersister`] and [`TodoList`]
//! and turn their results into spoken replies.

use crate::{
    persister::CheckInPersister,
    replies,
    tasks::{ErrorKind, TaskError, TodoList},
};
use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, tool::Parameters},
    model::{ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{error, info};

// --- Data Structures for Tools ---

#[derive(Deserialize, JsonSchema, Debug)]
pub struct SaveCheckinArgs {
    /// User's self-reported mood and energy level.
    pub mood: String,
    /// Comma-separated list of 1-3 things they want to accomplish.
    pub objectives: String,
    /// Brief summary of the conversation.
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Deserialize, JsonSchema, Debug)]
pub struct CreateTasksArgs {
    /// Comma-separated list of tasks to create.
    pub tasks: String,
}

#[derive(Deserialize, JsonSchema, Debug)]
pub struct TaskNameArgs {
    /// The name, or part of the name, of the task.
    pub task_name: String,
}

#[derive(Deserialize, JsonSchema, Debug)]
pub struct UpdateTaskArgs {
    /// The current name of the task to update.
    pub task_name: String,
    /// The new name for the task.
    #[serde(default)]
    pub new_task_name: Option<String>,
    /// The new status, e.g. "Not started", "In progress" or "Done".
    #[serde(default)]
    pub new_status: Option<String>,
}

// --- Service and Handler Implementation ---

/// MCP tool service for one conversation.
pub struct WellnessService {
    persister: CheckInPersister,
    todo: TodoList,
    tool_router: ToolRouter<Self>,
}

#[tool_handler]
impl ServerHandler for WellnessService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Daily wellness check-ins and a Notion-backed todo list.".to_string(),
            ),
            ..Default::default()
        }
    }
}

/// Spoken text for a todo failure. Informational outcomes are not tool errors.
fn todo_reply(err: TaskError) -> Result<String, String> {
    let text = replies::task_error(&err);
    match err.kind() {
        ErrorKind::Remote => Err(text),
        ErrorKind::Configuration | ErrorKind::Usage | ErrorKind::NotFound => Ok(text),
    }
}

#[tool_router]
impl WellnessService {
    pub fn new(persister: CheckInPersister, todo: TodoList) -> Self {
        Self {
            persister,
            todo,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Save the daily wellness check-in. Call this once, at the end of the conversation, to persist the user's mood, objectives and a short summary."
    )]
    pub async fn save_checkin(&self, args: Parameters<SaveCheckinArgs>) -> Result<String, String> {
        info!(args = ?args.0, "Executing tool 'save_checkin'");
        let SaveCheckinArgs {
            mood,
            objectives,
            summary,
        } = args.0;
        match self
            .persister
            .save(&mood, &objectives, summary.as_deref().unwrap_or_default())
            .await
        {
            Ok(receipt) => Ok(replies::check_in_saved(&receipt)),
            Err(e) => {
                error!(error = %e, "Failed to save check-in");
                Err(replies::check_in_failed())
            }
        }
    }

    #[tool(
        description = "Create tasks in the user's Notion todo list. Use when the user wants to turn goals into tasks or says things like 'add these to my todo list'."
    )]
    pub async fn create_todo_tasks(
        &self,
        args: Parameters<CreateTasksArgs>,
    ) -> Result<String, String> {
        info!(args = ?args.0, "Executing tool 'create_todo_tasks'");
        self.todo
            .create_tasks(&args.0.tasks)
            .await
            .map(|created| replies::tasks_created(&created))
            .or_else(todo_reply)
    }

    #[tool(
        description = "Get pending tasks from the user's Notion todo list. Use when the user asks what they need to do."
    )]
    pub async fn get_todo_tasks(&self) -> Result<String, String> {
        info!("Executing tool 'get_todo_tasks'");
        self.todo
            .list_pending()
            .await
            .map(|tasks| replies::pending_tasks(&tasks))
            .or_else(todo_reply)
    }

    #[tool(
        description = "Mark a task as complete. Use when the user says they finished something."
    )]
    pub async fn complete_todo_task(
        &self,
        args: Parameters<TaskNameArgs>,
    ) -> Result<String, String> {
        info!(args = ?args.0, "Executing tool 'complete_todo_task'");
        self.todo
            .complete(&args.0.task_name)
            .await
            .map(|task| replies::task_completed(&task))
            .or_else(todo_reply)
    }

    #[tool(description = "Rename a task or change its status.")]
    pub async fn update_todo_task(
        &self,
        args: Parameters<UpdateTaskArgs>,
    ) -> Result<String, String> {
        info!(args = ?args.0, "Executing tool 'update_todo_task'");
        let UpdateTaskArgs {
            task_name,
            new_task_name,
            new_status,
        } = args.0;
        self.todo
            .update(&task_name, new_task_name.as_deref(), new_status.as_deref())
            .await
            .map(|update| replies::task_updated(&update))
            .or_else(todo_reply)
    }

    #[tool(description = "Delete a task from the user's todo list.")]
    pub async fn delete_todo_task(
        &self,
        args: Parameters<TaskNameArgs>,
    ) -> Result<String, String> {
        info!(args = ?args.0, "Executing tool 'delete_todo_task'");
        self.todo
            .delete(&args.0.task_name)
            .await
            .map(|task| replies::task_deleted(&task))
            .or_else(todo_reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        history::HistoryStore,
        notion::{MockNotionApi, NotionError, QueryResponse, properties::task_page},
    };
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::{TempDir, tempdir};

    fn service(todo: TodoList) -> (WellnessService, TempDir) {
        let dir = tempdir().unwrap();
        let persister = CheckInPersister::new(HistoryStore::new(dir.path().join("log.json")));
        (WellnessService::new(persister, todo), dir)
    }

    #[test]
    fn registry_declares_every_tool() {
        let (service, _dir) = service(TodoList::disabled());
        let mut names: Vec<String> = service
            .tool_router
            .list_all()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "complete_todo_task",
                "create_todo_tasks",
                "delete_todo_task",
                "get_todo_tasks",
                "save_checkin",
                "update_todo_task",
            ]
        );
    }

    #[tokio::test]
    async fn save_checkin_writes_history() {
        let (service, _dir) = service(TodoList::disabled());
        let reply = service
            .save_checkin(Parameters(SaveCheckinArgs {
                mood: "tired".to_string(),
                objectives: "rest, read".to_string(),
                summary: None,
            }))
            .await
            .unwrap();

        assert_eq!(reply, "Check-in saved! Your mood: tired. Objectives: rest, read");
        let history = service.persister.history().load().await.unwrap();
        assert_eq!(history[0].summary, "");
    }

    #[tokio::test]
    async fn unconfigured_todo_is_informational() {
        let (service, _dir) = service(TodoList::disabled());
        let reply = service.get_todo_tasks().await.unwrap();
        assert!(reply.starts_with("Todo list is not configured"));
    }

    #[tokio::test]
    async fn update_without_fields_is_usage_reply() {
        let mut mock = MockNotionApi::new();
        mock.expect_query_database().never();
        mock.expect_update_page().never();
        let (service, _dir) = service(TodoList::new(Arc::new(mock), "todo-db"));

        let reply = service
            .update_todo_task(Parameters(UpdateTaskArgs {
                task_name: "milk".to_string(),
                new_task_name: None,
                new_status: None,
            }))
            .await
            .unwrap();
        assert_eq!(
            reply,
            "Please specify what you'd like to update - the task name or status."
        );
    }

    #[tokio::test]
    async fn remote_failure_is_tool_error() {
        let mut mock = MockNotionApi::new();
        mock.expect_query_database().returning(|_, _| {
            Ok(QueryResponse {
                results: vec![task_page("p1", "Buy milk", "Not started")],
                ..Default::default()
            })
        });
        mock.expect_update_page().returning(|_, _| {
            Err(NotionError::Status {
                status: 500,
                body: "oops".to_string(),
            })
        });
        let (service, _dir) = service(TodoList::new(Arc::new(mock), "todo-db"));

        let err = service
            .complete_todo_task(Parameters(TaskNameArgs {
                task_name: "milk".to_string(),
            }))
            .await
            .unwrap_err();
        assert_eq!(err, "Sorry, I couldn't complete the task 'milk'.");
    }

    #[tokio::test]
    async fn created_tasks_are_listed_in_reply() {
        let mut mock = MockNotionApi::new();
        mock.expect_create_page()
            .times(2)
            .returning(|_| Ok(json!({ "id": "new" })));
        let (service, _dir) = service(TodoList::new(Arc::new(mock), "todo-db"));

        let reply = service
            .create_todo_tasks(Parameters(CreateTasksArgs {
                tasks: "buy milk, call mom".to_string(),
            }))
            .await
            .unwrap();
        assert_eq!(
            reply,
            "Created 2 task(s) in your Notion todo list: buy milk, call mom"
        );
    }
}
