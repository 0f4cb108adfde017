//! Message and part types for the conversation history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub parts: Vec<Part>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ChatMessage {
    /// Create an empty message.
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
            parts: Vec::new(),
            timestamp: Some(Utc::now()),
        }
    }

    /// Create a user message with a single text part.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: Role::User,
            parts: vec![Part::Text { text: text.into() }],
            timestamp: Some(Utc::now()),
        }
    }

    /// Create an empty assistant message.
    pub fn assistant(id: impl Into<String>) -> Self {
        Self::new(id, Role::Assistant)
    }

    /// Add a part.
    #[must_use]
    pub fn with_part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    /// Whether any part of this message is text content.
    pub fn has_text_part(&self) -> bool {
        self.parts.iter().any(|p| matches!(p, Part::Text { .. }))
    }

    /// Index of the last step boundary, if any.
    pub fn last_boundary_index(&self) -> Option<usize> {
        self.parts
            .iter()
            .rposition(|p| matches!(p, Part::StepBoundary))
    }

    /// All tool invocations in this message, in part order.
    pub fn tool_invocations(&self) -> impl Iterator<Item = &ToolInvocation> {
        self.parts.iter().filter_map(|p| match p {
            Part::ToolInvocation(inv) => Some(inv),
            _ => None,
        })
    }

    /// Mutable lookup of a tool invocation by call id.
    pub fn find_tool_mut(&mut self, tool_call_id: &str) -> Option<&mut ToolInvocation> {
        self.parts.iter_mut().find_map(|p| match p {
            Part::ToolInvocation(inv) if inv.tool_call_id == tool_call_id => Some(inv),
            _ => None,
        })
    }

    /// Mutable lookup of a tool invocation by the id of its approval gate.
    pub fn find_approval_mut(&mut self, approval_id: &str) -> Option<&mut ToolInvocation> {
        self.parts.iter_mut().find_map(|p| match p {
            Part::ToolInvocation(inv)
                if inv.approval.as_ref().is_some_and(|a| a.id == approval_id) =>
            {
                Some(inv)
            }
            _ => None,
        })
    }
}

/// Conversation role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single part of a message.
///
/// Part order within a message is significant: `StepBoundary` partitions the
/// parts into rounds, and only the round after the last boundary is subject
/// to orchestration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Part {
    /// Text content.
    Text { text: String },

    /// Model reasoning content.
    Reasoning { text: String },

    /// Marks the start of a new round within the message.
    StepBoundary,

    /// Media attachment, by URL or inline data.
    Media {
        #[serde(rename = "mediaType")]
        media_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<String>,
    },

    /// A tool call and its evolving state.
    ToolInvocation(ToolInvocation),
}

/// Lifecycle state of a tool invocation.
///
/// Transitions are monotonic along
/// `input-streaming → input-available → [approval-requested →
/// approval-responded] → output-available | output-error`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ToolState {
    InputStreaming,
    InputAvailable,
    ApprovalRequested,
    ApprovalResponded,
    OutputAvailable,
    OutputError,
}

impl ToolState {
    /// Whether this state admits no further progress without new input.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::OutputAvailable | Self::OutputError)
    }

    /// Whether `next` is a legal forward step from this state.
    pub fn can_transition_to(self, next: ToolState) -> bool {
        use ToolState::*;
        match self {
            InputStreaming => matches!(next, InputAvailable),
            InputAvailable => matches!(next, ApprovalRequested | OutputAvailable | OutputError),
            ApprovalRequested => matches!(next, ApprovalResponded),
            ApprovalResponded => matches!(next, OutputAvailable | OutputError),
            OutputAvailable | OutputError => false,
        }
    }
}

/// A tool call requested by the agent, tracked through its lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolInvocation {
    pub tool_call_id: String,
    pub tool_name: String,
    pub state: ToolState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval: Option<ApprovalGate>,
    /// True when the backend runtime resolved this call opaquely; such
    /// invocations need no client-side tracking.
    #[serde(default)]
    pub provider_executed: bool,
}

impl ToolInvocation {
    /// Create an invocation in the `input-streaming` state.
    pub fn new(tool_call_id: impl Into<String>, tool_name: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            state: ToolState::InputStreaming,
            input: None,
            output: None,
            error_text: None,
            approval: None,
            provider_executed: false,
        }
    }

    /// Whether the user has responded to this invocation's approval gate.
    pub fn has_approval_response(&self) -> bool {
        self.approval
            .as_ref()
            .is_some_and(|a| a.response.is_some())
    }

    /// Whether this invocation carries an explicit error.
    pub fn is_error(&self) -> bool {
        self.state == ToolState::OutputError || self.error_text.is_some()
    }
}

/// Result of resolving a tool call on the client.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Output(Value),
    Error(String),
}

/// An approval gate attached to a tool invocation.
///
/// The gate id arrives with the `approval-requested` frame; the response is
/// created by an explicit user action and is immutable once set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApprovalGate {
    pub id: String,
    #[serde(flatten)]
    pub response: Option<ApprovalResponse>,
}

impl ApprovalGate {
    /// Create a pending gate (no response yet).
    pub fn pending(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            response: None,
        }
    }
}

/// The user's verdict on an approval gate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApprovalResponse {
    pub approved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
