//! Request id allocation and response correlation.

use std::collections::HashMap;

use crate::constants::{FIRST_COMMAND_ID, GET_STATES_ID, SUBSCRIBE_ID};

/// What an outstanding request was sent for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPurpose {
    GetStates,
    Subscribe,
    Command { entity_id: String, service: String },
    Ping,
}

/// Monotonic request id counter plus the set of requests still awaiting a
/// `result`/`pong`.
///
/// Ids 2 and 3 are reserved for the discovery and subscription calls; every
/// other request draws from a counter that starts at [`FIRST_COMMAND_ID`]
/// and is reset at the start of each connection attempt.
#[derive(Debug, Clone)]
pub struct RequestTracker {
    next_id: u64,
    pending: HashMap<u64, RequestPurpose>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self {
            next_id: FIRST_COMMAND_ID,
            pending: HashMap::new(),
        }
    }

    /// Forgets all outstanding requests and restarts the counter.
    pub fn reset(&mut self) {
        self.next_id = FIRST_COMMAND_ID;
        self.pending.clear();
    }

    /// Records a request sent on one of the reserved ids.
    pub fn track_reserved(&mut self, purpose: RequestPurpose) -> u64 {
        let id = match purpose {
            RequestPurpose::Subscribe => SUBSCRIBE_ID,
            _ => GET_STATES_ID,
        };
        self.pending.insert(id, purpose);
        id
    }

    /// Hands out the next id and records what it is for.
    pub fn allocate(&mut self, purpose: RequestPurpose) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.insert(id, purpose);
        id
    }

    /// Removes and returns the purpose of an answered request.
    ///
    /// Subscription events keep arriving on [`SUBSCRIBE_ID`]; only the
    /// first (the ack) resolves it.
    pub fn resolve(&mut self, id: u64) -> Option<RequestPurpose> {
        self.pending.remove(&id)
    }

    /// Number of requests still awaiting an answer.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

impl Default for RequestTracker {
    fn default() -> Self {
        Self::new()
    }
}
