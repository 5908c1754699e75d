//! Core type definitions shared across the session and tool layers.
//!
//! These types form the contract between the chat session, the hosted
//! assistant protocol, and the tool registry. They mirror the assistant
//! API's function-calling format so a tool call received from a run event
//! can be executed and answered without re-mapping.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One turn of a chat session. Turns are append-only; a failed run never
/// rolls back turns that were already recorded.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A function invocation requested by the hosted assistant mid-run.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// The answer to a single tool call, submitted back as part of a batch.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToolOutput {
    pub tool_call_id: String,
    pub output: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolMetadata {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}
