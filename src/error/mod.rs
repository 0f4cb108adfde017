//! Error types for Confab.

use thiserror::Error;

use crate::types::ToolState;

/// Primary error type for all Confab operations.
#[derive(Error, Debug)]
pub enum ConfabError {
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown tool call: {0}")]
    UnknownToolCall(String),

    #[error("Unknown approval: {0}")]
    UnknownApproval(String),

    #[error("Approval {0} already responded")]
    ApprovalAlreadyResponded(String),

    #[error("Invalid transition for {tool_call_id}: {from} → {to}")]
    InvalidTransition {
        tool_call_id: String,
        from: ToolState,
        to: ToolState,
    },

    #[error("Tool name mismatch for {tool_call_id}: expected {expected}, got {actual}")]
    ToolNameMismatch {
        tool_call_id: String,
        expected: String,
        actual: String,
    },

    #[error("Transport error ({binding}): {message}")]
    Transport {
        binding: &'static str,
        message: String,
    },

    #[error("No capability handler registered for tool: {0}")]
    CapabilityMissing(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ConfabError>;
