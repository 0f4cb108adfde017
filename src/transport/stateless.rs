//! One-shot request/response binding.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::Result;
use crate::transport::{RequestAdapter, ResubmitAction};

/// Binding for transports where each logical exchange opens a fresh channel.
///
/// The remote agent behind this binding may request approval for several
/// tools simultaneously within one round; idempotency rests entirely on the
/// fingerprint cache, since the decision function can be re-evaluated many
/// times per second for unrelated state changes.
pub struct StatelessBinding {
    adapter: Arc<dyn RequestAdapter>,
}

impl StatelessBinding {
    pub fn new(adapter: Arc<dyn RequestAdapter>) -> Self {
        Self { adapter }
    }

    /// Turn one true decision into exactly one outbound request.
    ///
    /// A send failure is returned to the caller; the binding does not retry
    /// and the recorded fingerprint stays in place.
    pub async fn dispatch(&self, action: &ResubmitAction) -> Result<()> {
        debug!(
            message_id = %action.message_id,
            round = action.round.len(),
            "stateless resubmit"
        );
        self.adapter.submit(&action.messages).await.map_err(|err| {
            warn!(message_id = %action.message_id, error = %err, "stateless send failed");
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::error::ConfabError;
    use crate::types::{ChatMessage, ToolInvocation};

    struct CountingAdapter {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl RequestAdapter for CountingAdapter {
        async fn submit(&self, _messages: &[ChatMessage]) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ConfabError::Transport {
                    binding: "stateless",
                    message: "boom".into(),
                });
            }
            Ok(())
        }
    }

    fn action() -> ResubmitAction {
        ResubmitAction {
            messages: vec![ChatMessage::user("hi")],
            message_id: "m1".into(),
            round: vec![ToolInvocation::new("c1", "exec")],
        }
    }

    #[tokio::test]
    async fn one_decision_is_one_request() {
        let adapter = Arc::new(CountingAdapter {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let binding = StatelessBinding::new(adapter.clone());
        binding.dispatch(&action()).await.unwrap();
        assert_eq!(adapter.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn send_failure_is_surfaced_without_retry() {
        let adapter = Arc::new(CountingAdapter {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let binding = StatelessBinding::new(adapter.clone());
        assert!(binding.dispatch(&action()).await.is_err());
        assert_eq!(adapter.calls.load(Ordering::SeqCst), 1);
    }
}
