//! Natural-language replies read back to the user.
//!
//! Everything below returns the text the assistant speaks; the operations
//! themselves return typed results and only get turned into prose here.

use crate::{
    notion::properties::RemoteTask,
    persister::{CheckInReceipt, MirrorStatus},
    tasks::{TaskError, TaskOp, TaskUpdate},
};

pub fn tasks_created(titles: &[String]) -> String {
    format!(
        "Created {} task(s) in your Notion todo list: {}",
        titles.len(),
        titles.join(", ")
    )
}

pub fn pending_tasks(tasks: &[RemoteTask]) -> String {
    if tasks.is_empty() {
        return "You don't have any pending tasks in your todo list right now.".to_string();
    }
    let lines: Vec<String> = tasks
        .iter()
        .map(|t| format!("- {} ({})", t.title, t.status))
        .collect();
    format!("Here are your tasks:\n{}", lines.join("\n"))
}

pub fn task_completed(task: &RemoteTask) -> String {
    format!("Great! I've marked '{}' as complete.", task.title)
}

pub fn task_updated(update: &TaskUpdate) -> String {
    let mut reply = format!("I've updated the task '{}'", update.task.title);
    if let Some(title) = &update.new_title {
        reply.push_str(&format!(" to '{}'", title));
    }
    if let Some(status) = &update.new_status {
        reply.push_str(&format!(" with status '{}'", status));
    }
    reply.push('.');
    reply
}

pub fn task_deleted(task: &RemoteTask) -> String {
    format!("I've deleted the task '{}' from your todo list.", task.title)
}

pub fn check_in_saved(receipt: &CheckInReceipt) -> String {
    let details = format!(
        "Your mood: {}. Objectives: {}",
        receipt.record.mood, receipt.raw_objectives
    );
    match receipt.mirror {
        MirrorStatus::Mirrored => {
            format!("Check-in saved to both local storage and Notion! {}", details)
        }
        MirrorStatus::Failed(_) => format!("Check-in saved locally! {}", details),
        MirrorStatus::Skipped => format!("Check-in saved! {}", details),
    }
}

pub fn check_in_failed() -> String {
    "Sorry, I couldn't save your check-in right now.".to_string()
}

pub fn task_error(err: &TaskError) -> String {
    match err {
        TaskError::NotConfigured => {
            "Todo list is not configured. Please set up your Notion todo database.".to_string()
        }
        TaskError::MissingName => "Which task do you mean? Please tell me its name.".to_string(),
        TaskError::NothingToUpdate => {
            "Please specify what you'd like to update - the task name or status.".to_string()
        }
        TaskError::NotFound {
            fragment,
            suggestion,
        } => {
            let mut reply = format!(
                "I couldn't find a task matching '{}' in your todo list.",
                fragment
            );
            if let Some(title) = suggestion {
                reply.push_str(&format!(" Did you mean '{}'?", title));
            }
            reply
        }
        TaskError::Lookup(_) => "Sorry, I couldn't access your todo list.".to_string(),
        TaskError::NothingCreated => {
            "Sorry, I couldn't create the tasks. Please try again.".to_string()
        }
        TaskError::Remote { op, subject, .. } => match op {
            TaskOp::Create => "Sorry, I couldn't create the tasks. Please try again.".to_string(),
            TaskOp::List => "Sorry, I couldn't retrieve your tasks.".to_string(),
            TaskOp::Complete => format!("Sorry, I couldn't complete the task '{}'.", subject),
            TaskOp::Update => format!("Sorry, I couldn't update the task '{}'.", subject),
            TaskOp::Delete => format!("Sorry, I couldn't delete the task '{}'.", subject),
        },
    }
}
