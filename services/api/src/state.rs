//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the shared,
//! clonable resources every request and conversation needs.

use crate::config::Config;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use wellness_core::{
    agent::WellnessService,
    context,
    history::HistoryStore,
    llm_client::LLMClient,
    notion::{NotionApi, NotionClient},
    persister::CheckInPersister,
    tasks::TodoList,
};

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub llm_client: Arc<dyn LLMClient>,
    /// System prompt template with a `{history_context}` placeholder.
    pub prompt_template: Arc<String>,
    pub persister: CheckInPersister,
    pub todo: TodoList,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the history store and the Notion-backed features from the config.
    pub fn new(
        config: Config,
        llm_client: Arc<dyn LLMClient>,
        prompt_template: String,
    ) -> Result<Self> {
        let notion: Option<Arc<dyn NotionApi>> = NotionClient::from_config(&config.notion)
            .context("Failed to build Notion client")?
            .map(|client| Arc::new(client) as Arc<dyn NotionApi>);

        let todo = match (&notion, config.notion.todo_database()) {
            (Some(api), Some(database_id)) => TodoList::new(api.clone(), database_id),
            _ => TodoList::disabled(),
        };

        let mut persister = CheckInPersister::new(HistoryStore::new(&config.history_path));
        if let (Some(api), Some(database_id)) = (&notion, config.notion.wellness_database()) {
            persister = persister.with_mirror(api.clone(), database_id);
        }

        info!(
            todo_enabled = todo.is_configured(),
            mirror_enabled = config.notion.wellness_database().is_some(),
            history = %config.history_path.display(),
            "Application state initialized"
        );

        Ok(Self {
            llm_client,
            prompt_template: Arc::new(prompt_template),
            persister,
            todo,
            config: Arc::new(config),
        })
    }

    /// Snapshot of the agent instructions for a new conversation.
    ///
    /// Returns the rendered instructions and the history context they contain.
    pub async fn instructions(&self) -> Result<(String, String)> {
        let history_context = self
            .persister
            .history()
            .context_summary()
            .await
            .context("Failed to read check-in history")?;
        let instructions = context::render_instructions(&self.prompt_template, &history_context);
        Ok((instructions, history_context))
    }

    /// A fresh tool service for one conversation.
    pub fn tool_service(&self) -> WellnessService {
        WellnessService::new(self.persister.clone(), self.todo.clone())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use anyhow::bail;
    use async_openai::types::{ChatCompletionRequestMessage, ChatCompletionTool};
    use async_trait::async_trait;
    use std::path::Path;
    use wellness_core::llm_client::{LLMAction, LLMStream};

    /// An LLM that must never be called.
    pub struct UnusedLLM;

    #[async_trait]
    impl LLMClient for UnusedLLM {
        async fn decide_action(
            &self,
            _instructions: &str,
            _conversation: Vec<ChatCompletionRequestMessage>,
            _tools: Vec<ChatCompletionTool>,
        ) -> Result<LLMAction> {
            bail!("no LLM in tests")
        }

        async fn stream_after_tools(
            &self,
            _instructions: &str,
            _conversation: Vec<ChatCompletionRequestMessage>,
        ) -> Result<LLMStream> {
            bail!("no LLM in tests")
        }
    }

    pub fn state_with_history(path: &Path) -> AppState {
        let config = Config {
            bind_address: "127.0.0.1:0".parse().unwrap(),
            provider: crate::config::Provider::OpenAI,
            openai_api_key: Some("test".to_string()),
            gemini_api_key: None,
            chat_model: "gpt-4o".to_string(),
            log_level: tracing::Level::INFO,
            prompts_path: "./prompts".into(),
            history_path: path.to_path_buf(),
            notion: Default::default(),
        };
        AppState::new(
            config,
            Arc::new(UnusedLLM),
            "Be warm.\nPrevious context: {history_context}".to_string(),
        )
        .unwrap()
    }
}
