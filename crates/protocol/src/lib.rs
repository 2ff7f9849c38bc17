//! Wire protocol for the hub's WebSocket API.
//!
//! Single-line JSON frames: [`ClientFrame`] going out, [`HubFrame`] coming
//! in, plus the request id bookkeeping shared by both directions.

pub mod constants;
pub mod envelope;
pub mod requests;
pub mod types;

pub use constants::FrameType;
pub use envelope::{
    ClientFrame, CodecError, HubError, HubFrame, SkippedState, StateList, decode, encode,
};
pub use requests::{RequestPurpose, RequestTracker};
pub use types::{EntityState, EventPayload, ServiceCall, StateChangedData, entity_domain};
