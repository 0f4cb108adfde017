//! Cancellable deferred actions.
//!
//! Recording an approval must not flush the round from inside the same
//! recomputation cycle that mutated it; the session instead schedules a
//! deferred re-evaluation. Contract: the closure fires exactly once, no
//! earlier than the given delay (a zero delay means the next scheduler
//! tick); [`Deferred::cancel`] before firing suppresses the run; dropping
//! the handle does not cancel.

use tokio::sync::oneshot;
use tokio::time::{self, Duration};
use tracing::debug;

/// Handle to a scheduled action.
#[derive(Debug)]
pub struct Deferred {
    cancel_tx: oneshot::Sender<()>,
}

impl Deferred {
    /// Schedule `action` to run after at least `delay`.
    pub fn spawn<F>(delay: Duration, action: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let sleep = time::sleep(delay);
            tokio::pin!(sleep);
            let mut action = Some(action);
            tokio::select! {
                res = &mut cancel_rx => {
                    if res.is_ok() {
                        debug!("deferred action cancelled");
                        return;
                    }
                    // Handle dropped without cancelling; still honor the delay.
                    (&mut sleep).await;
                    if let Some(f) = action.take() {
                        f();
                    }
                }
                _ = &mut sleep => {
                    if let Some(f) = action.take() {
                        f();
                    }
                }
            }
        });
        Self { cancel_tx }
    }

    /// Cancel the action. Returns true when the signal arrived before the
    /// action fired.
    pub fn cancel(self) -> bool {
        self.cancel_tx.send(()).is_ok()
    }
}
