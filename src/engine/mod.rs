//! Resubmission decision engine.
//!
//! The decision function is evaluated on every state recomputation, so it
//! must be idempotent for unchanged input and must never trigger twice for
//! the same approval state. Two failure modes shaped this logic: resubmitting
//! a round the backend had already answered (request storms, infinite loops)
//! and never resubmitting a completed round (stuck conversations).

mod fingerprint;

pub use fingerprint::{Fingerprint, FingerprintCache};

use tracing::debug;

use crate::policy::CompletionPolicy;
use crate::round::current_round;
use crate::types::{ChatMessage, Role, ToolState};

/// Decide whether the current round must be flushed back to the agent.
///
/// Pure apart from the cache mutation on a true decision; safe to call on
/// every recomputation. The checks short-circuit in strict order:
///
/// 1. backend already replied with text → purge the message's cache entries,
///    false;
/// 2. (approval-gated only) nothing carries an approval gate → false;
/// 3. an approval is still pending → false;
/// 4. any invocation errored → the backend already processed the round,
///    false;
/// 5. this exact approval state already triggered → false;
/// 6. the policy reports the round complete → record the fingerprint, true.
pub fn decide(
    messages: &[ChatMessage],
    policy: CompletionPolicy,
    cache: &mut FingerprintCache,
) -> bool {
    let Some(last) = messages.last() else {
        return false;
    };
    if last.role != Role::Assistant {
        return false;
    }

    if last.has_text_part() {
        debug!(message_id = %last.id, "round closed by text; purging fingerprints");
        cache.clear_for_message(&last.id);
        return false;
    }

    let round = current_round(messages);

    if policy == CompletionPolicy::ApprovalGated
        && !round.iter().any(|inv| inv.approval.is_some())
    {
        return false;
    }

    if round
        .iter()
        .any(|inv| inv.state == ToolState::ApprovalRequested)
    {
        debug!(message_id = %last.id, "approval still pending");
        return false;
    }

    if round.iter().any(|inv| inv.is_error()) {
        debug!(message_id = %last.id, "round contains an error; not resubmitting");
        return false;
    }

    let fp = Fingerprint::of(&last.id, policy, &round);
    if cache.contains(&fp) {
        debug!(fingerprint = %fp, "already triggered for this state");
        return false;
    }

    if policy.round_complete(&round) {
        cache.record(fp.clone());
        debug!(fingerprint = %fp, "round complete; resubmitting");
        return true;
    }

    false
}
