//! Conversation session: store + cache + decision glue.
//!
//! The session is synchronous and single-threaded; it is invoked inside
//! whatever reactive recomputation cycle the host uses, on frame arrival or
//! on a user action. Only the deferred-flush helper and the stateless pump
//! touch the async runtime, and neither runs inside the decision path.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::capability::CapabilityRegistry;
use crate::config::SessionConfig;
use crate::deferred::Deferred;
use crate::engine::{decide, FingerprintCache};
use crate::error::{ConfabError, Result};
use crate::round::current_round;
use crate::store::MessageStore;
use crate::transport::{ResubmitAction, StatelessBinding, StreamingBinding};
use crate::types::{InboundFrame, ToolState};

/// One conversation session.
pub struct ChatSession {
    config: SessionConfig,
    store: MessageStore,
    cache: FingerprintCache,
    /// True decisions per message, for the runaway-loop guard.
    triggers: HashMap<String, usize>,
}

impl ChatSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            store: MessageStore::new(),
            cache: FingerprintCache::new(),
            triggers: HashMap::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut MessageStore {
        &mut self.store
    }

    /// Apply one inbound frame.
    pub fn apply_frame(&mut self, frame: InboundFrame) -> Result<()> {
        self.store.apply(frame)
    }

    /// Parse and apply one raw inbound frame.
    ///
    /// This is the fail-safe boundary: a malformed frame is logged and
    /// rejected without touching the history, so a later [`Self::evaluate`]
    /// sees the last consistent snapshot and never resubmits on uncertainty.
    pub fn apply_json(&mut self, raw: &str) -> Result<()> {
        let frame: InboundFrame = serde_json::from_str(raw).map_err(|err| {
            warn!(error = %err, "dropping malformed frame");
            ConfabError::MalformedFrame(err.to_string())
        })?;
        self.store.apply(frame)
    }

    /// Record the user's verdict on a pending approval.
    pub fn record_approval(
        &mut self,
        approval_id: &str,
        approved: bool,
        reason: Option<String>,
    ) -> Result<()> {
        self.store.record_approval(approval_id, approved, reason)
    }

    /// Record a client-side tool result.
    pub fn record_output(
        &mut self,
        tool_call_id: &str,
        tool_name: &str,
        outcome: crate::types::ToolOutcome,
    ) -> Result<()> {
        self.store.record_output(tool_call_id, tool_name, outcome)
    }

    /// Run the capability handler for an approved invocation and funnel its
    /// result back into the store.
    pub async fn run_capability(
        &mut self,
        registry: &CapabilityRegistry,
        tool_call_id: &str,
    ) -> Result<()> {
        let (tool_name, input) = {
            let inv = self
                .store
                .last()
                .and_then(|msg| {
                    msg.tool_invocations()
                        .find(|inv| inv.tool_call_id == tool_call_id)
                })
                .ok_or_else(|| ConfabError::UnknownToolCall(tool_call_id.to_string()))?;
            if inv.state != ToolState::ApprovalResponded
                && inv.state != ToolState::InputAvailable
            {
                return Err(ConfabError::InvalidState(format!(
                    "capability for {tool_call_id} in state {}",
                    inv.state
                )));
            }
            (
                inv.tool_name.clone(),
                inv.input.clone().unwrap_or(serde_json::Value::Null),
            )
        };
        let outcome = registry.resolve(&tool_name, input).await?;
        self.store
            .record_output(tool_call_id, &tool_name, outcome.into())
    }

    /// Evaluate the current snapshot; true means resubmit now.
    ///
    /// Idempotent for unchanged input: the fingerprint cache absorbs
    /// repeated evaluation, and the per-message trigger bound refuses
    /// runaway loops even for distinct states.
    pub fn evaluate(&mut self) -> bool {
        let verdict = decide(self.store.messages(), self.config.policy, &mut self.cache);
        if !verdict {
            return false;
        }
        let message_id = match self.store.last() {
            Some(msg) => msg.id.clone(),
            None => return false,
        };
        let count = self.triggers.entry(message_id.clone()).or_insert(0);
        *count += 1;
        if *count > self.config.max_rounds_per_message {
            warn!(
                message_id = %message_id,
                count,
                "trigger bound exceeded; suppressing resubmission"
            );
            return false;
        }
        debug!(message_id = %message_id, count, "resubmission decided");
        true
    }

    /// Evaluate and, on a true decision, snapshot the payload for a binding.
    pub fn take_action(&mut self) -> Option<ResubmitAction> {
        if !self.evaluate() {
            return None;
        }
        let messages = self.store.messages().to_vec();
        let message_id = messages.last().map(|m| m.id.clone())?;
        let round = current_round(self.store.messages())
            .into_iter()
            .cloned()
            .collect();
        Some(ResubmitAction {
            messages,
            message_id,
            round,
        })
    }

    /// Drive one evaluation through the stateless binding.
    pub async fn pump_stateless(&mut self, binding: &StatelessBinding) -> Result<bool> {
        match self.take_action() {
            Some(action) => binding.dispatch(&action).await.map(|()| true),
            None => Ok(false),
        }
    }

    /// Drive one evaluation through the streaming binding.
    pub fn pump_streaming(&mut self, binding: &StreamingBinding) -> Result<bool> {
        match self.take_action() {
            Some(action) => binding.dispatch(&action).map(|()| true),
            None => Ok(false),
        }
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("config", &self.config)
            .field("messages", &self.store.messages().len())
            .finish()
    }
}

/// A session shared with the async runtime.
pub type SharedSession = Arc<Mutex<ChatSession>>;

/// Schedule a deferred flush after an approval was recorded.
///
/// The host library's recomputation cycle must settle before the round is
/// flushed, so the evaluation runs as a cancellable deferred action with the
/// session's configured delay. `on_action` receives the payload of a true
/// decision, if any.
pub fn schedule_flush<F>(session: &SharedSession, on_action: F) -> Deferred
where
    F: Fn(ResubmitAction) + Send + Sync + 'static,
{
    let delay = session.lock().unwrap().config.resubmit_delay;
    let session = Arc::clone(session);
    Deferred::spawn(delay, move || {
        let action = session.lock().unwrap().take_action();
        if let Some(action) = action {
            on_action(action);
        }
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::policy::CompletionPolicy;
    use crate::types::ToolOutcome;

    fn approval_session() -> ChatSession {
        let mut session = ChatSession::new(SessionConfig::default());
        session
            .store_mut()
            .push(crate::types::ChatMessage::user("run the tool"));
        session
            .apply_frame(InboundFrame::MessageStart {
                message_id: "m1".into(),
            })
            .unwrap();
        session
            .apply_frame(InboundFrame::ToolInputAvailable {
                tool_call_id: "c1".into(),
                tool_name: "exec".into(),
                input: json!({"cmd": "ls"}),
                provider_executed: false,
            })
            .unwrap();
        session
            .apply_frame(InboundFrame::ToolApprovalRequested {
                tool_call_id: "c1".into(),
                approval_id: "a1".into(),
            })
            .unwrap();
        session
    }

    #[test]
    fn approval_flow_triggers_once() {
        let mut session = approval_session();
        assert!(!session.evaluate());

        session.record_approval("a1", true, None).unwrap();
        let action = session.take_action().expect("decision after approval");
        assert_eq!(action.message_id, "m1");
        assert_eq!(action.round.len(), 1);
        assert_eq!(action.round[0].state, ToolState::ApprovalResponded);

        // Unrelated recomputation: no second action for the same state.
        assert!(session.take_action().is_none());
    }

    #[test]
    fn text_closes_the_round() {
        let mut session = approval_session();
        session.record_approval("a1", true, None).unwrap();
        assert!(session.evaluate());

        session
            .apply_frame(InboundFrame::TextDelta {
                delta: "done".into(),
            })
            .unwrap();
        assert!(!session.evaluate());
    }

    #[test]
    fn malformed_json_is_rejected_and_harmless() {
        let mut session = approval_session();
        assert!(matches!(
            session.apply_json("{\"type\": \"mystery\"}"),
            Err(ConfabError::MalformedFrame(_)),
        ));
        // Snapshot unchanged; evaluation still sound.
        assert!(!session.evaluate());
    }

    #[test]
    fn trigger_bound_suppresses_runaway_loops() {
        let config = SessionConfig::default().with_max_rounds_per_message(1);
        let mut session = ChatSession::new(config);
        session
            .apply_frame(InboundFrame::MessageStart {
                message_id: "m1".into(),
            })
            .unwrap();
        session
            .apply_frame(InboundFrame::ToolInputAvailable {
                tool_call_id: "c1".into(),
                tool_name: "exec".into(),
                input: json!({}),
                provider_executed: false,
            })
            .unwrap();
        session
            .apply_frame(InboundFrame::ToolApprovalRequested {
                tool_call_id: "c1".into(),
                approval_id: "a1".into(),
            })
            .unwrap();
        session.record_approval("a1", true, None).unwrap();
        assert!(session.evaluate());

        // A second, distinct state in the same message: bound exceeded.
        session
            .record_output("c1", "exec", ToolOutcome::Output(json!({"ok": true})))
            .unwrap();
        session.apply_frame(InboundFrame::StepBoundary).unwrap();
        session
            .apply_frame(InboundFrame::ToolInputAvailable {
                tool_call_id: "c2".into(),
                tool_name: "exec".into(),
                input: json!({}),
                provider_executed: false,
            })
            .unwrap();
        session
            .apply_frame(InboundFrame::ToolApprovalRequested {
                tool_call_id: "c2".into(),
                approval_id: "a2".into(),
            })
            .unwrap();
        session.record_approval("a2", true, None).unwrap();
        assert!(!session.evaluate());
    }

    #[tokio::test]
    async fn capability_result_funnels_into_the_store() {
        let mut session = approval_session();
        session.record_approval("a1", true, None).unwrap();

        let mut registry = crate::capability::CapabilityRegistry::new();
        registry.register_fn("exec", |_input| async move {
            crate::capability::CapabilityOutcome::Success(json!({"stdout": "ok"}))
        });

        session.run_capability(&registry, "c1").await.unwrap();
        let inv = session
            .store()
            .last()
            .unwrap()
            .tool_invocations()
            .next()
            .unwrap();
        assert_eq!(inv.state, ToolState::OutputAvailable);
        assert_eq!(inv.output, Some(json!({"stdout": "ok"})));
    }

    #[tokio::test(start_paused = true)]
    async fn deferred_flush_delivers_the_action() {
        let session = Arc::new(Mutex::new(approval_session()));
        session
            .lock()
            .unwrap()
            .record_approval("a1", true, None)
            .unwrap();

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let _handle = schedule_flush(&session, move |action| {
            let _ = tx.send(action);
        });

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let action = rx.try_recv().expect("flush delivered");
        assert_eq!(action.message_id, "m1");
    }

    #[test]
    fn completion_gated_session_ignores_approvals() {
        let config = SessionConfig::new(CompletionPolicy::CompletionGated);
        let mut session = ChatSession::new(config);
        session
            .apply_frame(InboundFrame::MessageStart {
                message_id: "m1".into(),
            })
            .unwrap();
        session
            .apply_frame(InboundFrame::ToolInputAvailable {
                tool_call_id: "c1".into(),
                tool_name: "lookup".into(),
                input: json!({}),
                provider_executed: false,
            })
            .unwrap();
        assert!(!session.evaluate());

        session
            .record_output("c1", "lookup", ToolOutcome::Output(json!(42)))
            .unwrap();
        assert!(session.evaluate());
        assert!(!session.evaluate());
    }
}
