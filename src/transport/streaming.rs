//! Persistent duplex binding.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::Result;
use crate::transport::{FrameSink, ResubmitAction};
use crate::types::OutboundFrame;

/// Binding for transports that reuse an already-open duplex channel.
///
/// The remote agent behind this binding generates tool-call rounds
/// sequentially — at most one pending approval at a time — so the extracted
/// round is typically a singleton. Batching approvals beyond the round the
/// binding was handed is not supported.
pub struct StreamingBinding {
    sink: Arc<dyn FrameSink>,
}

impl StreamingBinding {
    pub fn new(sink: Arc<dyn FrameSink>) -> Self {
        Self { sink }
    }

    /// Turn one true decision into exactly one outbound frame.
    ///
    /// A send failure is returned to the caller; no retry, and the recorded
    /// fingerprint stays in place.
    pub fn dispatch(&self, action: &ResubmitAction) -> Result<()> {
        if action.round.len() > 1 {
            warn!(
                message_id = %action.message_id,
                round = action.round.len(),
                "streaming agent is expected to gate one tool at a time"
            );
        }
        debug!(message_id = %action.message_id, "streaming resubmit");
        let frame = OutboundFrame::RoundUpdate {
            message_id: action.message_id.clone(),
            invocations: action.round.clone(),
        };
        self.sink.send_frame(&frame).map_err(|err| {
            warn!(message_id = %action.message_id, error = %err, "streaming send failed");
            err
        })
    }
}
