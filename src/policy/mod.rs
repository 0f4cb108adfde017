//! Round completion policies.
//!
//! A round can end in one of two shapes: "approved but not yet executed"
//! (needs further processing by the agent) or "fully executed" (ready to
//! report). Each conversation is configured with exactly one policy.

use serde::{Deserialize, Serialize};

use crate::types::{ToolInvocation, ToolState};

/// Completion policy for a conversation.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CompletionPolicy {
    /// Tools may require human or client-capability confirmation: the round
    /// is complete when at least one invocation has been responded to and
    /// none is still waiting on the user.
    ApprovalGated,
    /// No approval step exists: the round is complete when every invocation
    /// has produced output (or an error).
    CompletionGated,
}

impl CompletionPolicy {
    /// Whether the extracted round satisfies this policy.
    pub fn round_complete(self, round: &[&ToolInvocation]) -> bool {
        if round.is_empty() {
            return false;
        }
        match self {
            Self::ApprovalGated => {
                let any_responded = round
                    .iter()
                    .any(|inv| inv.state == ToolState::ApprovalResponded);
                any_responded
                    && round.iter().all(|inv| match inv.state {
                        ToolState::OutputAvailable
                        | ToolState::OutputError
                        | ToolState::ApprovalResponded => true,
                        ToolState::InputStreaming
                        | ToolState::InputAvailable
                        | ToolState::ApprovalRequested => false,
                    })
            }
            Self::CompletionGated => round.iter().all(|inv| match inv.state {
                ToolState::OutputAvailable | ToolState::OutputError => true,
                ToolState::InputStreaming
                | ToolState::InputAvailable
                | ToolState::ApprovalRequested
                | ToolState::ApprovalResponded => false,
            }),
        }
    }
}
