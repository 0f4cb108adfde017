//! Ordered conversation history and the mutations that drive it.
//!
//! The store is mutated from two directions: inbound frames from the backend
//! agent ([`MessageStore::apply`]) and presentation-layer actions
//! ([`MessageStore::record_approval`], [`MessageStore::record_output`]).
//! Tool-state transitions are validated against the monotonic state machine;
//! backward moves are rejected.

use tracing::{debug, warn};

use crate::error::{ConfabError, Result};
use crate::types::{
    ApprovalGate, ApprovalResponse, ChatMessage, InboundFrame, Part, Role, ToolInvocation,
    ToolOutcome, ToolState,
};

/// Ordered conversation history.
#[derive(Debug, Clone, Default)]
pub struct MessageStore {
    messages: Vec<ChatMessage>,
    /// Whether an assistant message is currently streaming, between
    /// `MessageStart` and `Finish`.
    open: bool,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append a message (user send, or a fully-formed assistant message).
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Apply one inbound frame to the history.
    pub fn apply(&mut self, frame: InboundFrame) -> Result<()> {
        match frame {
            InboundFrame::MessageStart { message_id } => {
                debug!(message_id = %message_id, "message start");
                self.messages.push(ChatMessage::assistant(message_id));
                self.open = true;
                Ok(())
            }
            InboundFrame::TextDelta { delta } => {
                let msg = self.streaming_message("text-delta")?;
                if let Some(Part::Text { text }) = msg.parts.last_mut() {
                    text.push_str(&delta);
                } else {
                    msg.parts.push(Part::Text { text: delta });
                }
                Ok(())
            }
            InboundFrame::ReasoningDelta { delta } => {
                let msg = self.streaming_message("reasoning-delta")?;
                if let Some(Part::Reasoning { text }) = msg.parts.last_mut() {
                    text.push_str(&delta);
                } else {
                    msg.parts.push(Part::Reasoning { text: delta });
                }
                Ok(())
            }
            InboundFrame::StepBoundary => {
                let msg = self.streaming_message("step-boundary")?;
                msg.parts.push(Part::StepBoundary);
                Ok(())
            }
            InboundFrame::ToolInputStart {
                tool_call_id,
                tool_name,
                provider_executed,
            } => {
                let msg = self.streaming_message("tool-input-start")?;
                if msg.find_tool_mut(&tool_call_id).is_some() {
                    return Err(ConfabError::MalformedFrame(format!(
                        "duplicate toolCallId {tool_call_id}"
                    )));
                }
                let mut inv = ToolInvocation::new(tool_call_id, tool_name);
                inv.provider_executed = provider_executed;
                msg.parts.push(Part::ToolInvocation(inv));
                Ok(())
            }
            InboundFrame::ToolInputAvailable {
                tool_call_id,
                tool_name,
                input,
                provider_executed,
            } => {
                let msg = self.streaming_message("tool-input-available")?;
                if let Some(inv) = msg.find_tool_mut(&tool_call_id) {
                    transition(inv, ToolState::InputAvailable)?;
                    inv.input = Some(input);
                    return Ok(());
                }
                // Input streaming may be elided; materialize directly.
                let mut inv = ToolInvocation::new(tool_call_id, tool_name);
                inv.state = ToolState::InputAvailable;
                inv.input = Some(input);
                inv.provider_executed = provider_executed;
                msg.parts.push(Part::ToolInvocation(inv));
                Ok(())
            }
            InboundFrame::ToolApprovalRequested {
                tool_call_id,
                approval_id,
            } => {
                let msg = self.streaming_message("tool-approval-requested")?;
                let inv = msg
                    .find_tool_mut(&tool_call_id)
                    .ok_or_else(|| ConfabError::UnknownToolCall(tool_call_id.clone()))?;
                transition(inv, ToolState::ApprovalRequested)?;
                inv.approval = Some(ApprovalGate::pending(approval_id));
                Ok(())
            }
            InboundFrame::ToolOutputAvailable {
                tool_call_id,
                output,
            } => {
                let msg = self.streaming_message("tool-output-available")?;
                let inv = msg
                    .find_tool_mut(&tool_call_id)
                    .ok_or_else(|| ConfabError::UnknownToolCall(tool_call_id.clone()))?;
                transition(inv, ToolState::OutputAvailable)?;
                inv.output = Some(output);
                Ok(())
            }
            InboundFrame::ToolOutputError {
                tool_call_id,
                error_text,
            } => {
                let msg = self.streaming_message("tool-output-error")?;
                let inv = msg
                    .find_tool_mut(&tool_call_id)
                    .ok_or_else(|| ConfabError::UnknownToolCall(tool_call_id.clone()))?;
                transition(inv, ToolState::OutputError)?;
                inv.error_text = Some(error_text);
                Ok(())
            }
            InboundFrame::Media {
                media_type,
                url,
                data,
            } => {
                let msg = self.streaming_message("media")?;
                msg.parts.push(Part::Media {
                    media_type,
                    url,
                    data,
                });
                Ok(())
            }
            InboundFrame::Finish => {
                let msg = self.streaming_message("finish")?;
                debug!(message_id = %msg.id, "message finished");
                self.open = false;
                Ok(())
            }
        }
    }

    /// Record the user's verdict on a pending approval gate.
    ///
    /// The matching invocation moves to `approval-responded`. A gate accepts
    /// exactly one response.
    pub fn record_approval(
        &mut self,
        approval_id: &str,
        approved: bool,
        reason: Option<String>,
    ) -> Result<()> {
        let msg = self.last_assistant_mut("approval response")?;
        let inv = msg
            .find_approval_mut(approval_id)
            .ok_or_else(|| ConfabError::UnknownApproval(approval_id.to_string()))?;
        if inv.has_approval_response() {
            return Err(ConfabError::ApprovalAlreadyResponded(
                approval_id.to_string(),
            ));
        }
        transition(inv, ToolState::ApprovalResponded)?;
        if let Some(gate) = inv.approval.as_mut() {
            gate.response = Some(ApprovalResponse { approved, reason });
        }
        debug!(approval_id, approved, "approval recorded");
        Ok(())
    }

    /// Record the result of resolving a tool call on the client.
    pub fn record_output(
        &mut self,
        tool_call_id: &str,
        tool_name: &str,
        outcome: ToolOutcome,
    ) -> Result<()> {
        let msg = self.last_assistant_mut("tool output")?;
        let inv = msg
            .find_tool_mut(tool_call_id)
            .ok_or_else(|| ConfabError::UnknownToolCall(tool_call_id.to_string()))?;
        if inv.tool_name != tool_name {
            return Err(ConfabError::ToolNameMismatch {
                tool_call_id: tool_call_id.to_string(),
                expected: inv.tool_name.clone(),
                actual: tool_name.to_string(),
            });
        }
        match outcome {
            ToolOutcome::Output(output) => {
                transition(inv, ToolState::OutputAvailable)?;
                inv.output = Some(output);
            }
            ToolOutcome::Error(error_text) => {
                transition(inv, ToolState::OutputError)?;
                inv.error_text = Some(error_text);
            }
        }
        debug!(tool_call_id, state = %inv.state, "tool output recorded");
        Ok(())
    }

    /// The message currently being streamed, which must be the last one,
    /// from the assistant, and not yet finished.
    fn streaming_message(&mut self, context: &str) -> Result<&mut ChatMessage> {
        if !self.open {
            return Err(ConfabError::MalformedFrame(format!(
                "{context} without an open assistant message"
            )));
        }
        self.last_assistant_mut(context)
    }

    /// The most recent assistant message. Unlike [`Self::streaming_message`]
    /// this does not require the stream to be open: approvals and tool
    /// outputs arrive from the user after the turn finished streaming.
    fn last_assistant_mut(&mut self, context: &str) -> Result<&mut ChatMessage> {
        match self.messages.last_mut() {
            Some(msg) if msg.role == Role::Assistant => Ok(msg),
            _ => Err(ConfabError::MalformedFrame(format!(
                "{context} without an assistant message"
            ))),
        }
    }
}

/// Advance an invocation's state, rejecting non-monotonic moves.
fn transition(inv: &mut ToolInvocation, next: ToolState) -> Result<()> {
    if !inv.state.can_transition_to(next) {
        warn!(
            tool_call_id = %inv.tool_call_id,
            from = %inv.state,
            to = %next,
            "rejected tool state transition"
        );
        return Err(ConfabError::InvalidTransition {
            tool_call_id: inv.tool_call_id.clone(),
            from: inv.state,
            to: next,
        });
    }
    inv.state = next;
    Ok(())
}
