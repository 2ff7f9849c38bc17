//! Normalized device model and the pure translations between it and the
//! hub's entity representation.
//!
//! - [`features`]: `supported_features` bitmask → capability set.
//! - [`inbound`]: entity state → attribute writes.
//! - [`outbound`]: normalized command → hub service call.

pub mod features;
pub mod inbound;
pub mod model;
pub mod outbound;

pub use features::capabilities;
pub use inbound::{apply_state, convert_brightness, convert_volume, invert_position};
pub use model::{
    Attribute, AttributeUpdates, AttributeValue, Capability, CapabilitySet, Category, Command,
    Device, DeviceState, Param, RemoteCode, Rgb, hub_entity_id, is_backed_by,
};
pub use outbound::{param_from_value, to_service_call};
