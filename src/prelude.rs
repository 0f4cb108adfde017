//! Convenience re-exports for common use.

pub use crate::capability::{CapabilityHandler, CapabilityOutcome, CapabilityRegistry};
pub use crate::config::SessionConfig;
pub use crate::engine::FingerprintCache;
pub use crate::error::{ConfabError, Result};
pub use crate::policy::CompletionPolicy;
pub use crate::session::ChatSession;
pub use crate::store::MessageStore;
pub use crate::transport::{
    FrameSink, RequestAdapter, ResubmitAction, StatelessBinding, StreamingBinding,
};
pub use crate::types::{
    ApprovalGate, ApprovalResponse, ChatMessage, InboundFrame, OutboundFrame, Part, Role,
    ToolInvocation, ToolOutcome, ToolState,
};
