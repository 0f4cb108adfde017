//! Capability handler registry.
//!
//! A capability handler resolves a tool the backend cannot execute itself
//! (e.g. one that needs local device access). The presentation layer runs
//! the handler and funnels its result through
//! [`MessageStore::record_output`](crate::store::MessageStore::record_output);
//! the decision engine itself never awaits anything.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;
use tracing::debug;

use crate::error::{ConfabError, Result};
use crate::types::ToolOutcome;

/// Result of running a capability handler.
#[derive(Debug, Clone, PartialEq)]
pub enum CapabilityOutcome {
    Success(Value),
    Failure(String),
}

impl From<CapabilityOutcome> for ToolOutcome {
    fn from(outcome: CapabilityOutcome) -> Self {
        match outcome {
            CapabilityOutcome::Success(output) => ToolOutcome::Output(output),
            CapabilityOutcome::Failure(error) => ToolOutcome::Error(error),
        }
    }
}

/// Async capability handler callback.
pub type CapabilityHandler =
    Arc<dyn Fn(Value) -> BoxFuture<'static, CapabilityOutcome> + Send + Sync>;

/// Registry mapping tool names to their client-side handlers.
#[derive(Default, Clone)]
pub struct CapabilityRegistry {
    handlers: HashMap<String, CapabilityHandler>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a tool name, replacing any previous one.
    pub fn register(&mut self, tool_name: impl Into<String>, handler: CapabilityHandler) {
        self.handlers.insert(tool_name.into(), handler);
    }

    /// Register from an async closure.
    pub fn register_fn<F, Fut>(&mut self, tool_name: impl Into<String>, f: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = CapabilityOutcome> + Send + 'static,
    {
        let handler: CapabilityHandler = Arc::new(move |input| Box::pin(f(input)));
        self.handlers.insert(tool_name.into(), handler);
    }

    pub fn contains(&self, tool_name: &str) -> bool {
        self.handlers.contains_key(tool_name)
    }

    /// Run the handler for a tool.
    pub async fn resolve(&self, tool_name: &str, input: Value) -> Result<CapabilityOutcome> {
        let handler = self
            .handlers
            .get(tool_name)
            .ok_or_else(|| ConfabError::CapabilityMissing(tool_name.to_string()))?;
        debug!(tool_name, "resolving capability");
        Ok(handler(input).await)
    }
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("tools", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
