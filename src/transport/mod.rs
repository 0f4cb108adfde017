//! Transport bindings.
//!
//! A true resubmission decision becomes exactly one outbound exchange. The
//! two bindings differ in channel shape, not in decision logic: the
//! stateless binding replays the full message list over a one-shot
//! request/response channel; the streaming binding serializes one frame onto
//! an already-open duplex channel. Neither retries a failed send, and a
//! failed send never unwinds the fingerprint that was just recorded — a
//! fresh user action is the only way to re-trigger.

pub mod stateless;
pub mod streaming;

pub use stateless::StatelessBinding;
pub use streaming::StreamingBinding;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{ConfabError, Result};
use crate::types::{ChatMessage, OutboundFrame, ToolInvocation};

/// The payload of one true resubmission decision.
#[derive(Debug, Clone, PartialEq)]
pub struct ResubmitAction {
    /// Snapshot of the full message list at decision time.
    pub messages: Vec<ChatMessage>,
    /// Id of the message whose round triggered the decision.
    pub message_id: String,
    /// The round's invocations at decision time.
    pub round: Vec<ToolInvocation>,
}

/// Physical sender for the stateless binding; implemented externally.
#[async_trait]
pub trait RequestAdapter: Send + Sync {
    /// Perform one logical request carrying the full message list.
    async fn submit(&self, messages: &[ChatMessage]) -> Result<()>;
}

/// Physical sender for the streaming binding; implemented externally.
pub trait FrameSink: Send + Sync {
    /// Put one frame on the open duplex channel.
    fn send_frame(&self, frame: &OutboundFrame) -> Result<()>;
}

/// A tokio channel doubles as a frame sink, which is also how the tests
/// observe outbound traffic.
impl FrameSink for mpsc::UnboundedSender<OutboundFrame> {
    fn send_frame(&self, frame: &OutboundFrame) -> Result<()> {
        self.send(frame.clone()).map_err(|_| ConfabError::Transport {
            binding: "streaming",
            message: "duplex channel closed".to_string(),
        })
    }
}
