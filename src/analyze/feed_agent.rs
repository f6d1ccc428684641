// src/analyze/feed_agent.rs
//! One-step tool loop: the model may call `analyze_feed_description`, which runs
//! the local heuristic analyzer; its output goes back for a final answer.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::analyze::ai_adapter::{first_message, AiError, ChatMessage, CompletionGateway};
use crate::analyze::heuristics::describe_feed;

pub const TOOL_NAME: &str = "analyze_feed_description";
pub const TOOL_ERROR: &str = "Error: Failed to analyze the feed description";

const SYSTEM_PROMPT: &str = "You are a helpful assistant with access to a tool that can analyze RSS feed descriptions and provide insights. Use the analyze_feed_description tool to research and provide details about RSS feeds that users are interested in.";

#[derive(Debug, Deserialize)]
struct ToolArgs {
    description: String,
}

/// Function-tool definition advertised to the model.
pub fn feed_analysis_tool() -> Value {
    json!({
        "type": "function",
        "function": {
            "name": TOOL_NAME,
            "description": "A tool that analyzes and provides insights about an RSS feed based on its description",
            "parameters": {
                "type": "object",
                "properties": {
                    "description": {
                        "type": "string",
                        "description": "The description text of the RSS feed to analyze"
                    }
                },
                "required": ["description"]
            }
        }
    })
}

fn opening_messages(description: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "I'd like to learn more about this RSS feed with the following description: \"{description}\""
        )),
    ]
}

/// Ask `gateway` about a feed description, executing at most one round of tool calls.
pub async fn analyze_feed_with_ai(
    gateway: &dyn CompletionGateway,
    description: &str,
    model: &str,
) -> Result<Value, AiError> {
    let messages = opening_messages(description);
    let tools = [feed_analysis_tool()];
    let response = gateway
        .complete_with_tools(&messages, &tools, model, false)
        .await?;

    let Some(assistant) = first_message(&response) else {
        return Ok(response);
    };
    let calls = assistant.tool_calls.as_deref().unwrap_or_default();
    if calls.is_empty() {
        return Ok(response);
    }

    let results: Vec<ChatMessage> = calls
        .iter()
        .filter(|c| c.function.name == TOOL_NAME)
        .map(|call| {
            let content = match serde_json::from_str::<ToolArgs>(&call.function.arguments) {
                Ok(args) => describe_feed(&args.description),
                Err(e) => {
                    tracing::warn!(error = %e, call_id = %call.id, "bad tool arguments");
                    TOOL_ERROR.to_string()
                }
            };
            ChatMessage::tool_result(&call.id, TOOL_NAME, content)
        })
        .collect();

    if results.is_empty() {
        tracing::debug!(calls = calls.len(), "no known tool was called");
        return Ok(response);
    }
    tracing::info!(results = results.len(), "sending tool results back to model");

    let mut follow_up = messages;
    follow_up.push(assistant.clone());
    follow_up.extend(results);
    gateway.complete(&follow_up, model).await
}
