//! Approval-state fingerprints and the session-scoped dedupe cache.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::policy::CompletionPolicy;
use crate::types::ToolInvocation;

/// A cache key uniquely identifying one approval-state snapshot of a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    message_id: String,
    key: String,
}

impl Fingerprint {
    /// Derive the fingerprint for the current round of a message.
    ///
    /// Membership depends on the policy: under approval gating the ids of
    /// invocations with a recorded approval response (a denial is a response
    /// the backend must see); under completion gating, where no approvals
    /// exist, the ids of invocations with terminal output stand in, so
    /// multi-round messages dedupe per round rather than per message.
    pub fn of(message_id: &str, policy: CompletionPolicy, round: &[&ToolInvocation]) -> Self {
        let mut ids: Vec<&str> = round
            .iter()
            .filter(|inv| match policy {
                CompletionPolicy::ApprovalGated => inv.has_approval_response(),
                CompletionPolicy::CompletionGated => inv.state.is_terminal(),
            })
            .map(|inv| inv.tool_call_id.as_str())
            .collect();
        ids.sort_unstable();
        Self {
            message_id: message_id.to_string(),
            key: ids.join(","),
        }
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.message_id, self.key)
    }
}

/// Session-scoped set of previously-triggered approval-state fingerprints.
///
/// Entries are added only on a true resubmission decision and removed when
/// the owning message acquires text content. Lifecycle is bound to one
/// conversation session.
#[derive(Debug, Default)]
pub struct FingerprintCache {
    entries: HashMap<String, HashSet<String>>,
}

impl FingerprintCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether this exact state has already triggered a resubmission.
    pub fn contains(&self, fp: &Fingerprint) -> bool {
        self.entries
            .get(&fp.message_id)
            .is_some_and(|keys| keys.contains(&fp.key))
    }

    /// Mark a fingerprint as triggered. Returns false if it was already
    /// present (check-then-set in one call).
    pub fn record(&mut self, fp: Fingerprint) -> bool {
        self.entries.entry(fp.message_id).or_default().insert(fp.key)
    }

    /// Drop every fingerprint recorded for a message. A no-op for unknown
    /// messages.
    pub fn clear_for_message(&mut self, message_id: &str) {
        self.entries.remove(message_id);
    }

    /// Drop everything (session teardown).
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
