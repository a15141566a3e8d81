//! Chat-completion client used by the conversation loop.
//!
//! The speech side of the assistant is handled elsewhere; this client only
//! sees transcribed user turns and produces the text that gets spoken back.

use anyhow::{Context, Result, anyhow};
use async_openai::{
    Client,
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs, ChatCompletionTool,
        CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
    },
};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::pin::Pin;

/// Represents a tool call requested by the LLM.
pub type ToolCall = async_openai::types::ChatCompletionMessageToolCall;

#[derive(Debug, Clone)]
pub enum LLMStreamEvent {
    TextChunk(String),
}

/// A stream of text chunks from the LLM.
pub type LLMStream = Pin<Box<dyn Stream<Item = Result<LLMStreamEvent, OpenAIError>> + Send>>;

/// Outcome of the model's first look at a user turn.
#[derive(Debug, Clone)]
pub enum LLMAction {
    /// Answer the user directly.
    TextResponse(String),
    /// Run these tools first.
    ToolCall(Vec<ToolCall>),
}

#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Single non-streaming call deciding whether to answer or call tools.
    ///
    /// `conversation` holds the user and assistant turns so far, without the
    /// system prompt.
    async fn decide_action(
        &self,
        instructions: &str,
        conversation: Vec<ChatCompletionRequestMessage>,
        tools: Vec<ChatCompletionTool>,
    ) -> Result<LLMAction>;

    /// Streaming call once tool results have been appended to the conversation.
    async fn stream_after_tools(
        &self,
        instructions: &str,
        conversation_with_tool_results: Vec<ChatCompletionRequestMessage>,
    ) -> Result<LLMStream>;
}

/// Prepends the system instructions to a conversation.
pub fn with_instructions(
    instructions: &str,
    conversation: Vec<ChatCompletionRequestMessage>,
) -> Result<Vec<ChatCompletionRequestMessage>> {
    let mut messages = Vec::with_capacity(conversation.len() + 1);
    messages.push(
        ChatCompletionRequestSystemMessageArgs::default()
            .content(instructions)
            .build()?
            .into(),
    );
    messages.extend(conversation);
    Ok(messages)
}

/// [`LLMClient`] for any OpenAI-compatible chat completions endpoint.
pub struct OpenAICompatibleClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAICompatibleClient {
    pub fn new(config: OpenAIConfig, model: String) -> Self {
        Self {
            client: Client::with_config(config),
            model,
        }
    }
}

#[async_trait]
impl LLMClient for OpenAICompatibleClient {
    async fn decide_action(
        &self,
        instructions: &str,
        conversation: Vec<ChatCompletionRequestMessage>,
        tools: Vec<ChatCompletionTool>,
    ) -> Result<LLMAction> {
        let mut request = CreateChatCompletionRequestArgs::default();
        request
            .model(&self.model)
            .messages(with_instructions(instructions, conversation)?);
        if !tools.is_empty() {
            request.tools(tools).tool_choice("auto");
        }

        let response: CreateChatCompletionResponse =
            self.client.chat().create(request.build()?).await?;
        let choice = response
            .choices
            .first()
            .context("No response choice from LLM")?;

        match (&choice.message.tool_calls, &choice.message.content) {
            (Some(tool_calls), _) if !tool_calls.is_empty() => {
                Ok(LLMAction::ToolCall(tool_calls.clone()))
            }
            (_, Some(content)) => Ok(LLMAction::TextResponse(content.clone())),
            _ => Err(anyhow!(
                "LLM response had neither text content nor tool calls."
            )),
        }
    }

    async fn stream_after_tools(
        &self,
        instructions: &str,
        conversation_with_tool_results: Vec<ChatCompletionRequestMessage>,
    ) -> Result<LLMStream> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(with_instructions(
                instructions,
                conversation_with_tool_results,
            )?)
            .stream(true)
            .build()?;

        let stream = self.client.chat().create_stream(request).await?;

        Ok(Box::pin(stream.filter_map(|result| async move {
            match result {
                Ok(response) => response
                    .choices
                    .first()
                    .and_then(|choice| choice.delta.content.clone())
                    .filter(|content| !content.is_empty())
                    .map(|content| Ok(LLMStreamEvent::TextChunk(content))),
                Err(e) => Some(Err(e)),
            }
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_openai::types::{
        ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessageArgs,
    };

    #[test]
    fn instructions_lead_the_conversation() {
        let conversation = vec![
            ChatCompletionRequestUserMessageArgs::default()
                .content("I slept badly")
                .build()
                .unwrap()
                .into(),
        ];
        let messages = with_instructions("Be supportive.", conversation).unwrap();

        assert_eq!(messages.len(), 2);
        match &messages[0] {
            ChatCompletionRequestMessage::System(system) => match &system.content {
                ChatCompletionRequestSystemMessageContent::Text(text) => {
                    assert_eq!(text, "Be supportive.")
                }
                other => panic!("unexpected content: {other:?}"),
            },
            other => panic!("expected a system message, got {other:?}"),
        }
        assert!(matches!(messages[1], ChatCompletionRequestMessage::User(_)));
    }
}
