//! Deadline timers polled by the connection task.
//!
//! A timer is just an optional deadline. Starting it again moves the
//! deadline; stopping it clears it. Nothing runs outside the owner's
//! `select!` loop, so a stopped timer can never fire later.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Timer {
    deadline: Option<Instant>,
}

impl Timer {
    /// Arms the timer `after` from now, replacing any earlier deadline.
    pub(crate) fn start(&mut self, after: Duration) {
        self.deadline = Some(Instant::now() + after);
    }

    pub(crate) fn stop(&mut self) {
        self.deadline = None;
    }

    pub(crate) fn is_active(&self) -> bool {
        self.deadline.is_some()
    }

    pub(crate) fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

/// Completes at `deadline`, or never when there is none.
pub(crate) async fn expired(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
