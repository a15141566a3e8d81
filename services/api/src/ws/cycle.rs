//! Contains the logic for the agent's "ReAct" (Reason and Act) cycle.

use crate::{
    models::{ConversationTurn, TurnRole},
    state::AppState,
};
use anyhow::{Context, Result};
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolArgs, FunctionObjectArgs,
};
use futures_util::StreamExt;
use rmcp::{
    model::{CallToolRequestParam, JsonObject, RawContent},
    service::{RoleClient, RunningService},
};
use tracing::{info, warn};
use wellness_core::llm_client::{LLMAction, LLMStreamEvent};

/// Handles a single transcribed user turn and returns the reply to speak.
///
/// 1.  Builds the conversation so far on top of the session instructions.
/// 2.  Asks the LLM whether to answer or to call tools.
/// 3.  Runs the requested tools one after another and feeds the results back.
/// 4.  Records both sides of the exchange in the conversation.
pub async fn run_turn(
    state: &AppState,
    instructions: &str,
    conversation: &mut Vec<ConversationTurn>,
    mcp_client: &RunningService<RoleClient, ()>,
    user_text: &str,
) -> Result<String> {
    conversation.push(ConversationTurn::user(user_text));
    let messages = to_request_messages(conversation)?;
    let tools = available_tools(mcp_client).await?;

    let action = state
        .llm_client
        .decide_action(instructions, messages.clone(), tools)
        .await?;

    let reply = match action {
        LLMAction::TextResponse(text) => text,
        LLMAction::ToolCall(tool_calls) => {
            let mut with_tools = messages;
            with_tools.push(
                ChatCompletionRequestAssistantMessageArgs::default()
                    .tool_calls(tool_calls.clone())
                    .build()?
                    .into(),
            );

            for call in &tool_calls {
                info!(tool = %call.function.name, "Model requested tool");
                let result = mcp_client
                    .peer()
                    .call_tool(CallToolRequestParam {
                        name: call.function.name.clone().into(),
                        arguments: parse_arguments(&call.function.arguments)?,
                    })
                    .await?;

                if result.is_error == Some(true) {
                    warn!(tool = %call.function.name, "Tool reported a failure");
                }
                let annotated_content = result
                    .content
                    .context("Tool call returned no content")?
                    .pop()
                    .context("Content list was empty")?;
                let result_text = match annotated_content.raw {
                    RawContent::Text(text_content) => text_content.text,
                    _ => "{\"error\": \"Unexpected content type from tool\"}".to_string(),
                };

                with_tools.push(
                    ChatCompletionRequestToolMessageArgs::default()
                        .tool_call_id(call.id.clone())
                        .content(result_text)
                        .build()?
                        .into(),
                );
            }

            let mut stream = state
                .llm_client
                .stream_after_tools(instructions, with_tools)
                .await?;
            let mut full_response = String::new();
            while let Some(event) = stream.next().await {
                match event {
                    Ok(LLMStreamEvent::TextChunk(chunk)) => full_response.push_str(&chunk),
                    Err(e) => warn!(error = %e, "Error in LLM stream"),
                }
            }
            full_response
        }
    };

    if !reply.is_empty() {
        conversation.push(ConversationTurn::assistant(reply.clone()));
    }
    Ok(reply)
}

/// Converts the stored conversation into chat-completion messages.
fn to_request_messages(
    conversation: &[ConversationTurn],
) -> Result<Vec<ChatCompletionRequestMessage>> {
    conversation
        .iter()
        .map(|turn| {
            Ok(match turn.role {
                TurnRole::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(turn.content.clone())
                    .build()?
                    .into(),
                TurnRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(turn.content.clone())
                    .build()?
                    .into(),
            })
        })
        .collect()
}

/// Lists the registered tools in the shape the chat API expects.
async fn available_tools(
    mcp_client: &RunningService<RoleClient, ()>,
) -> Result<Vec<ChatCompletionTool>> {
    mcp_client
        .list_all_tools()
        .await?
        .into_iter()
        .map(|t| {
            Ok(ChatCompletionToolArgs::default()
                .function(
                    FunctionObjectArgs::default()
                        .name(t.name)
                        .description(t.description.unwrap_or_default())
                        .parameters(serde_json::to_value(&*t.input_schema)?)
                        .build()?,
                )
                .build()?)
        })
        .collect()
}

/// Tool arguments as sent by the model. Tools without parameters may get an
/// empty string.
fn parse_arguments(raw: &str) -> Result<Option<JsonObject>> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    let arguments: JsonObject =
        serde_json::from_str(raw).context("Tool arguments are not a JSON object")?;
    Ok(Some(arguments))
}
