//! Notion-backed todo list.
//!
//! Every operation re-queries the remote database; nothing is cached. Names
//! spoken by the user are resolved to rows with a case-insensitive substring
//! search because the database has no natural-language lookup.

use crate::{
    checkin::{split_list, timestamp_now},
    notion::{
        NotionApi, NotionError,
        properties::{self, RemoteTask},
    },
};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use std::{fmt, sync::Arc};
use tracing::{debug, error, info, warn};

/// Most pending tasks read back in one answer.
pub const MAX_LISTED_TASKS: usize = 10;

/// Upper bound on query pages fetched while looking a task up.
const MAX_LOOKUP_PAGES: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOp {
    Create,
    List,
    Complete,
    Update,
    Delete,
}

impl fmt::Display for TaskOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskOp::Create => write!(f, "create"),
            TaskOp::List => write!(f, "list"),
            TaskOp::Complete => write!(f, "complete"),
            TaskOp::Update => write!(f, "update"),
            TaskOp::Delete => write!(f, "delete"),
        }
    }
}

/// Broad classes of todo failures, used to decide how loudly to report them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Usage,
    NotFound,
    Remote,
}

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("todo database is not configured")]
    NotConfigured,
    #[error("no task name was given")]
    MissingName,
    #[error("nothing to update: no new title or status given")]
    NothingToUpdate,
    #[error("no task matches '{fragment}'")]
    NotFound {
        fragment: String,
        suggestion: Option<String>,
    },
    #[error("failed to read the todo list: {0}")]
    Lookup(#[source] NotionError),
    #[error("failed to {op} task '{subject}': {source}")]
    Remote {
        op: TaskOp,
        subject: String,
        #[source]
        source: NotionError,
    },
    #[error("none of the tasks could be created")]
    NothingCreated,
}

impl TaskError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TaskError::NotConfigured => ErrorKind::Configuration,
            TaskError::MissingName | TaskError::NothingToUpdate => ErrorKind::Usage,
            TaskError::NotFound { .. } => ErrorKind::NotFound,
            TaskError::Lookup(_) | TaskError::Remote { .. } | TaskError::NothingCreated => {
                ErrorKind::Remote
            }
        }
    }
}

/// Outcome of resolving a loose task name against the current rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskMatch {
    None,
    Unique(RemoteTask),
    Multiple(Vec<RemoteTask>),
}

impl TaskMatch {
    /// Case-insensitive substring search over titles, in remote order.
    pub fn find(tasks: &[RemoteTask], fragment: &str) -> Self {
        let needle = fragment.trim().to_lowercase();
        let mut candidates: Vec<RemoteTask> = tasks
            .iter()
            .filter(|t| t.title.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        match candidates.len() {
            0 => TaskMatch::None,
            1 => TaskMatch::Unique(candidates.remove(0)),
            _ => TaskMatch::Multiple(candidates),
        }
    }

    /// First-match-wins resolution.
    pub fn first(self) -> Option<RemoteTask> {
        match self {
            TaskMatch::None => None,
            TaskMatch::Unique(task) => Some(task),
            TaskMatch::Multiple(candidates) => candidates.into_iter().next(),
        }
    }
}

/// Result of a successful `update`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskUpdate {
    pub task: RemoteTask,
    pub new_title: Option<String>,
    pub new_status: Option<String>,
}

/// The user's todo list in a Notion database.
#[derive(Clone)]
pub struct TodoList {
    backend: Option<(Arc<dyn NotionApi>, String)>,
}

impl TodoList {
    pub fn new(api: Arc<dyn NotionApi>, database_id: impl Into<String>) -> Self {
        Self {
            backend: Some((api, database_id.into())),
        }
    }

    /// A todo list that answers every request with `NotConfigured`.
    pub fn disabled() -> Self {
        Self { backend: None }
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    fn backend(&self) -> Result<(&dyn NotionApi, &str), TaskError> {
        self.backend
            .as_ref()
            .map(|(api, db)| (api.as_ref(), db.as_str()))
            .ok_or(TaskError::NotConfigured)
    }

    /// Creates one row per non-empty comma-separated title, in order.
    ///
    /// Rows that fail are logged and skipped; the titles that were created
    /// are returned.
    pub async fn create_tasks(&self, titles: &str) -> Result<Vec<String>, TaskError> {
        let (api, db) = self.backend()?;
        let mut created = Vec::new();

        for title in split_list(titles).into_iter().filter(|t| !t.is_empty()) {
            let page = properties::new_task_page(db, &title, &timestamp_now());
            match api.create_page(page).await {
                Ok(_) => {
                    info!(task = %title, "Created Notion task");
                    created.push(title);
                }
                Err(e) => error!(task = %title, error = %e, "Failed to create Notion task"),
            }
        }

        if created.is_empty() {
            return Err(TaskError::NothingCreated);
        }
        Ok(created)
    }

    /// Tasks not yet done, newest first, at most [`MAX_LISTED_TASKS`].
    pub async fn list_pending(&self) -> Result<Vec<RemoteTask>, TaskError> {
        let (api, db) = self.backend()?;
        let response = api
            .query_database(db.to_string(), properties::pending_tasks_query())
            .await
            .map_err(|source| {
                error!(error = %source, "Failed to get Notion tasks");
                TaskError::Remote {
                    op: TaskOp::List,
                    subject: String::new(),
                    source,
                }
            })?;

        Ok(response
            .results
            .iter()
            .filter_map(RemoteTask::from_page)
            .take(MAX_LISTED_TASKS)
            .collect())
    }

    /// Marks the first task matching `fragment` as done.
    pub async fn complete(&self, fragment: &str) -> Result<RemoteTask, TaskError> {
        let (api, _) = self.backend()?;
        let task = self.resolve(fragment).await?;
        let patch = properties::task_patch(None, Some(properties::STATUS_DONE));
        Self::patch(api, TaskOp::Complete, fragment, &task, patch)
            .await?;
        info!(task = %task.title, "Completed Notion task");
        Ok(task)
    }

    /// Renames and/or re-statuses the first task matching `fragment`.
    pub async fn update(
        &self,
        fragment: &str,
        new_title: Option<&str>,
        new_status: Option<&str>,
    ) -> Result<TaskUpdate, TaskError> {
        let (api, _) = self.backend()?;
        let new_title = non_blank(new_title);
        let new_status = non_blank(new_status);
        if new_title.is_none() && new_status.is_none() {
            return Err(TaskError::NothingToUpdate);
        }

        let task = self.resolve(fragment).await?;
        let patch = properties::task_patch(new_title, new_status);
        Self::patch(api, TaskOp::Update, fragment, &task, patch)
            .await?;
        info!(task = %task.title, ?new_title, ?new_status, "Updated Notion task");
        Ok(TaskUpdate {
            task,
            new_title: new_title.map(str::to_string),
            new_status: new_status.map(str::to_string),
        })
    }

    /// Archives the first task matching `fragment`. Notion keeps archived
    /// pages restorable, so this is a soft delete.
    pub async fn delete(&self, fragment: &str) -> Result<RemoteTask, TaskError> {
        let (api, _) = self.backend()?;
        let task = self.resolve(fragment).await?;
        Self::patch(
            api,
            TaskOp::Delete,
            fragment,
            &task,
            properties::archive_patch(),
        )
        .await?;
        info!(task = %task.title, "Deleted Notion task");
        Ok(task)
    }

    /// Every row in the database, following pagination.
    async fn all_tasks(&self) -> Result<Vec<RemoteTask>, TaskError> {
        let (api, db) = self.backend()?;
        let mut tasks = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_LOOKUP_PAGES {
            let response = api
                .query_database(db.to_string(), properties::all_rows_query(cursor.as_deref()))
                .await
                .map_err(|e| {
                    error!(error = %e, "Failed to query Notion todo list");
                    TaskError::Lookup(e)
                })?;
            tasks.extend(response.results.iter().filter_map(RemoteTask::from_page));

            match response.next_cursor {
                Some(next) if response.has_more => cursor = Some(next),
                _ => return Ok(tasks),
            }
        }

        warn!(
            pages = MAX_LOOKUP_PAGES,
            "Stopped paging through the todo list"
        );
        Ok(tasks)
    }

    async fn resolve(&self, fragment: &str) -> Result<RemoteTask, TaskError> {
        if fragment.trim().is_empty() {
            return Err(TaskError::MissingName);
        }
        let tasks = self.all_tasks().await?;
        let found = TaskMatch::find(&tasks, fragment);
        if let TaskMatch::Multiple(candidates) = &found {
            let titles: Vec<&str> = candidates.iter().map(|t| t.title.as_str()).collect();
            debug!(fragment, ?titles, "Several tasks match, using the first");
        }
        found.first().ok_or_else(|| {
            debug!(fragment, "No task matches");
            TaskError::NotFound {
                fragment: fragment.to_string(),
                suggestion: suggest(&tasks, fragment),
            }
        })
    }

    async fn patch(
        api: &dyn NotionApi,
        op: TaskOp,
        fragment: &str,
        task: &RemoteTask,
        patch: serde_json::Value,
    ) -> Result<(), TaskError> {
        api.update_page(task.id.clone(), patch)
            .await
            .map(|_| ())
            .map_err(|source| {
                error!(%op, task = %task.title, error = %source, "Notion task update failed");
                TaskError::Remote {
                    op,
                    subject: fragment.to_string(),
                    source,
                }
            })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Closest fuzzy title for a fragment that matched nothing.
fn suggest(tasks: &[RemoteTask], fragment: &str) -> Option<String> {
    let matcher = SkimMatcherV2::default().ignore_case();
    tasks
        .iter()
        .filter_map(|t| {
            matcher
                .fuzzy_match(&t.title, fragment.trim())
                .map(|score| (score, t))
        })
        .max_by_key(|(score, _)| *score)
        .map(|(_, t)| t.title.clone())
}
