//! Bounded reconnect policy and heartbeat bookkeeping.

/// Consecutive automatic reconnect attempts within one outage.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RetryCounter {
    attempts: u32,
    limit: u32,
}

impl RetryCounter {
    pub(crate) fn new(limit: u32) -> Self {
        Self { attempts: 0, limit }
    }

    /// Counts one more attempt and returns the attempt number (1-based).
    pub(crate) fn bump(&mut self) -> u32 {
        self.attempts = self.attempts.saturating_add(1).min(self.limit);
        self.attempts
    }

    /// `true` once every allowed attempt has been spent.
    pub(crate) fn exhausted(&self) -> bool {
        self.attempts >= self.limit
    }

    pub(crate) fn reset(&mut self) {
        self.attempts = 0;
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.attempts
    }
}

/// Ping state while connected. At most one ping is outstanding.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Heartbeat {
    last_ping_id: Option<u64>,
    outstanding: bool,
}

impl Heartbeat {
    pub(crate) fn sent(&mut self, id: u64) {
        self.last_ping_id = Some(id);
        self.outstanding = true;
    }

    /// Marks the outstanding ping answered. Returns whether one was pending.
    pub(crate) fn answered(&mut self) -> bool {
        std::mem::replace(&mut self.outstanding, false)
    }

    pub(crate) fn is_outstanding(&self) -> bool {
        self.outstanding
    }

    pub(crate) fn last_ping_id(&self) -> Option<u64> {
        self.last_ping_id
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}
