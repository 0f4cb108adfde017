//! Wire frames exchanged with the backend agent.
//!
//! Inbound frames mutate the message store; one outbound frame is produced
//! per true resubmission decision on the streaming binding.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::message::ToolInvocation;

/// A frame received from the backend agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum InboundFrame {
    /// Beginning of a new assistant message.
    #[serde(rename = "start")]
    MessageStart {
        #[serde(rename = "messageId")]
        message_id: String,
    },

    /// Incremental text content for the current message.
    TextDelta { delta: String },

    /// Incremental reasoning content for the current message.
    ReasoningDelta { delta: String },

    /// Marks the start of a new round within the current message.
    StepBoundary,

    /// A tool call has started streaming its input.
    ToolInputStart {
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        #[serde(rename = "toolName")]
        tool_name: String,
        #[serde(rename = "providerExecuted", default)]
        provider_executed: bool,
    },

    /// Tool input is complete and ready for execution.
    ToolInputAvailable {
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        #[serde(rename = "toolName")]
        tool_name: String,
        input: Value,
        #[serde(rename = "providerExecuted", default)]
        provider_executed: bool,
    },

    /// The backend asks the user to approve a tool call.
    ToolApprovalRequested {
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        #[serde(rename = "approvalId")]
        approval_id: String,
    },

    /// The backend resolved a tool call with output.
    ToolOutputAvailable {
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        output: Value,
    },

    /// The backend resolved a tool call with an error.
    ToolOutputError {
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        #[serde(rename = "errorText")]
        error_text: String,
    },

    /// Media attached to the current message.
    Media {
        #[serde(rename = "mediaType")]
        media_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<String>,
    },

    /// End of the current message.
    Finish,
}

/// A frame sent to the backend agent over the streaming binding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum OutboundFrame {
    /// Flushes the current round's tool state back to the agent.
    RoundUpdate {
        #[serde(rename = "messageId")]
        message_id: String,
        invocations: Vec<ToolInvocation>,
    },
}
