//! Round extraction.
//!
//! Multi-round reasoning can contain several tool-call rounds within one
//! assistant message; only the round after the last step boundary is subject
//! to orchestration, and invocations the backend executed opaquely need no
//! client action.

use crate::types::{ChatMessage, Part, Role, ToolInvocation};

/// Tool invocations of the current round.
///
/// Empty when the history is empty or the last message is not from the
/// assistant. Otherwise: every `ToolInvocation` part after the last
/// `StepBoundary` whose `provider_executed` flag is false.
pub fn current_round(messages: &[ChatMessage]) -> Vec<&ToolInvocation> {
    let Some(last) = messages.last() else {
        return Vec::new();
    };
    if last.role != Role::Assistant {
        return Vec::new();
    }
    let start = last.last_boundary_index().map_or(0, |i| i + 1);
    last.parts[start..]
        .iter()
        .filter_map(|p| match p {
            Part::ToolInvocation(inv) if !inv.provider_executed => Some(inv),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::ToolState;

    fn invocation(id: &str, state: ToolState) -> ToolInvocation {
        let mut inv = ToolInvocation::new(id, "exec");
        inv.state = state;
        inv.input = Some(json!({}));
        inv
    }

    #[test]
    fn empty_history_yields_empty_round() {
        assert!(current_round(&[]).is_empty());
    }

    #[test]
    fn user_last_message_yields_empty_round() {
        let messages = vec![ChatMessage::user("hi")];
        assert!(current_round(&messages).is_empty());
    }

    #[test]
    fn only_parts_after_last_boundary_count() {
        let msg = ChatMessage::assistant("m1")
            .with_part(Part::ToolInvocation(invocation(
                "old",
                ToolState::OutputAvailable,
            )))
            .with_part(Part::StepBoundary)
            .with_part(Part::ToolInvocation(invocation(
                "current",
                ToolState::InputAvailable,
            )));
        let messages = vec![ChatMessage::user("hi"), msg];
        let round = current_round(&messages);
        assert_eq!(round.len(), 1);
        assert_eq!(round[0].tool_call_id, "current");
    }

    #[test]
    fn no_boundary_means_whole_message_is_the_round() {
        let msg = ChatMessage::assistant("m1")
            .with_part(Part::Text { text: "ok".into() })
            .with_part(Part::ToolInvocation(invocation(
                "c1",
                ToolState::InputAvailable,
            )))
            .with_part(Part::ToolInvocation(invocation(
                "c2",
                ToolState::InputStreaming,
            )));
        let messages = [msg];
        let round = current_round(&messages);
        assert_eq!(round.len(), 2);
    }

    #[test]
    fn provider_executed_invocations_are_excluded() {
        let mut opaque = invocation("srv", ToolState::OutputAvailable);
        opaque.provider_executed = true;
        let msg = ChatMessage::assistant("m1")
            .with_part(Part::ToolInvocation(opaque))
            .with_part(Part::ToolInvocation(invocation(
                "c1",
                ToolState::InputAvailable,
            )));
        let messages = [msg];
        let round = current_round(&messages);
        assert_eq!(round.len(), 1);
        assert_eq!(round[0].tool_call_id, "c1");
    }
}
