use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entry of a `get_states` result, or the `new_state` of a
/// `state_changed` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub entity_id: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl EntityState {
    /// Human readable name, falling back to the entity id.
    pub fn friendly_name(&self) -> &str {
        self.attributes
            .get("friendly_name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.entity_id)
    }

    /// The hub's `supported_features` bitmask, `0` when absent.
    pub fn supported_features(&self) -> u32 {
        self.attributes
            .get("supported_features")
            .and_then(Value::as_u64)
            .and_then(|bits| u32::try_from(bits).ok())
            .unwrap_or(0)
    }

    /// The domain part of the entity id (`"light"` for `"light.kitchen"`).
    pub fn domain(&self) -> &str {
        entity_domain(&self.entity_id)
    }
}

/// Returns the part of an entity id before the first `.`.
pub fn entity_domain(entity_id: &str) -> &str {
    entity_id.split('.').next().unwrap_or(entity_id)
}

/// Payload of a pushed `event` frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    pub data: StateChangedData,
}

/// Data of a `state_changed` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChangedData {
    pub entity_id: String,
    /// `None` when the entity was removed.
    #[serde(default)]
    pub new_state: Option<EntityState>,
}

/// A hub service invocation, e.g. `light.turn_on` for `light.kitchen`.
///
/// `data` holds the extra service arguments; `entity_id` is inserted into
/// `service_data` when the call is framed.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceCall {
    pub domain: String,
    pub service: String,
    pub entity_id: String,
    pub data: Map<String, Value>,
}

impl ServiceCall {
    /// Creates a call without extra arguments.
    pub fn new(
        domain: impl Into<String>,
        service: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            service: service.into(),
            entity_id: entity_id.into(),
            data: Map::new(),
        }
    }

    /// Adds one service argument.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }
}
