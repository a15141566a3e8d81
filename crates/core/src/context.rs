//! Prompt context built from the check-in history.
//!
//! The context is a point-in-time snapshot taken when a conversation starts;
//! check-ins saved later in the same conversation are not reflected until
//! the next one.

use crate::checkin::CheckInRecord;

/// Placeholder in the system prompt template replaced by the history context.
pub const HISTORY_PLACEHOLDER: &str = "{history_context}";

pub const FIRST_CHECK_IN: &str = "This is the user's first check-in.";

/// Summarizes the most recent check-in in one or two sentences.
pub fn summarize(history: &[CheckInRecord]) -> String {
    let Some(last) = history.last() else {
        return FIRST_CHECK_IN.to_string();
    };

    let mut context = format!(
        "Last check-in was on {}. Their mood was: {}.",
        last.date, last.mood
    );
    if !last.objectives.is_empty() {
        context.push_str(&format!(" They wanted to: {}.", last.objectives_text()));
    }
    context
}

/// Injects the history context into the agent's system prompt template.
pub fn render_instructions(template: &str, context: &str) -> String {
    if template.contains(HISTORY_PLACEHOLDER) {
        template.replace(HISTORY_PLACEHOLDER, context)
    } else {
        format!("{}\n\nPrevious context: {}", template.trim_end(), context)
    }
}
