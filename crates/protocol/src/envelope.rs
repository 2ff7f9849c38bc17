use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::constants::{
    FrameType, GET_STATES_ID, STATE_CHANGED_EVENT, SUBSCRIBE_ID, WS_MAX_MESSAGE_SIZE,
};
use crate::types::{EntityState, EventPayload, ServiceCall, StateChangedData};

/// Errors produced while encoding or decoding frames.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("frame too large ({0} bytes)")]
    TooLarge(usize),
}

/// Decoded `get_states` result.
#[derive(Debug, Default)]
pub struct StateList {
    pub states: Vec<EntityState>,
    pub skipped: Vec<SkippedState>,
}

/// A state list entry that could not be decoded.
#[derive(Debug)]
pub struct SkippedState {
    pub entity_id: Option<String>,
    pub error: serde_json::Error,
}

/// Client-to-hub frame.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    Auth {
        access_token: String,
    },
    GetStates {
        id: u64,
    },
    SubscribeEvents {
        id: u64,
        event_type: String,
    },
    CallService {
        id: u64,
        domain: String,
        service: String,
        service_data: Map<String, Value>,
    },
    Ping {
        id: u64,
    },
}

impl std::fmt::Debug for ClientFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auth { .. } => f.write_str("Auth { access_token: <redacted> }"),
            Self::GetStates { id } => f.debug_struct("GetStates").field("id", id).finish(),
            Self::SubscribeEvents { id, event_type } => f
                .debug_struct("SubscribeEvents")
                .field("id", id)
                .field("event_type", event_type)
                .finish(),
            Self::CallService {
                id,
                domain,
                service,
                service_data,
            } => f
                .debug_struct("CallService")
                .field("id", id)
                .field("domain", domain)
                .field("service", service)
                .field("service_data", service_data)
                .finish(),
            Self::Ping { id } => f.debug_struct("Ping").field("id", id).finish(),
        }
    }
}

impl ClientFrame {
    /// Authentication frame answering `auth_required`.
    pub fn auth(token: impl Into<String>) -> Self {
        Self::Auth {
            access_token: token.into(),
        }
    }

    /// Request for the full state list, on the reserved id.
    pub fn get_states() -> Self {
        Self::GetStates { id: GET_STATES_ID }
    }

    /// Subscription to `state_changed` events, on the reserved id.
    pub fn subscribe_state_changed() -> Self {
        Self::SubscribeEvents {
            id: SUBSCRIBE_ID,
            event_type: STATE_CHANGED_EVENT.to_string(),
        }
    }

    /// Frames a service call under the given request id.
    pub fn call_service(id: u64, call: ServiceCall) -> Self {
        let mut service_data = call.data;
        service_data.insert("entity_id".into(), Value::String(call.entity_id));
        Self::CallService {
            id,
            domain: call.domain,
            service: call.service,
            service_data,
        }
    }

    /// Liveness check.
    pub fn ping(id: u64) -> Self {
        Self::Ping { id }
    }

    /// Request id carried by this frame. `auth` has none.
    pub fn id(&self) -> Option<u64> {
        match self {
            Self::Auth { .. } => None,
            Self::GetStates { id }
            | Self::SubscribeEvents { id, .. }
            | Self::CallService { id, .. }
            | Self::Ping { id } => Some(*id),
        }
    }

    /// Recovers the service call from a `call_service` frame.
    pub fn as_service_call(&self) -> Option<ServiceCall> {
        match self {
            Self::CallService {
                domain,
                service,
                service_data,
                ..
            } => {
                let mut data = service_data.clone();
                let entity_id = match data.remove("entity_id") {
                    Some(Value::String(id)) => id,
                    _ => return None,
                };
                Some(ServiceCall {
                    domain: domain.clone(),
                    service: service.clone(),
                    entity_id,
                    data,
                })
            }
            _ => None,
        }
    }
}

/// Hub-level error attached to a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<Value>,
    #[serde(default)]
    pub message: String,
}

/// Hub-to-client frame.
///
/// `result` and `event` use `serde_json::value::RawValue` so the (possibly
/// large) state list is only deserialized by the handler that needs it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubFrame {
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, rename = "type")]
    pub frame_type: FrameType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Box<serde_json::value::RawValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<Box<serde_json::value::RawValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<HubError>,
}

impl HubFrame {
    /// Deserializes the `result` payload into the given type.
    pub fn parse_result<T: for<'de> Deserialize<'de>>(&self) -> Result<Option<T>, CodecError> {
        match &self.result {
            Some(raw) => Ok(Some(serde_json::from_str(raw.get())?)),
            None => Ok(None),
        }
    }

    /// The state list of a `get_states` response. A missing or `null`
    /// result yields an empty list. Entries are decoded one by one; those
    /// that fail land in [`StateList::skipped`].
    pub fn states(&self) -> Result<StateList, CodecError> {
        let entries = self
            .parse_result::<Option<Vec<Value>>>()?
            .flatten()
            .unwrap_or_default();

        let mut list = StateList::default();
        for entry in entries {
            let entity_id = entry
                .get("entity_id")
                .and_then(Value::as_str)
                .map(str::to_string);
            match serde_json::from_value::<EntityState>(entry) {
                Ok(state) => list.states.push(state),
                Err(error) => list.skipped.push(SkippedState { entity_id, error }),
            }
        }
        Ok(list)
    }

    /// The `state_changed` data of an `event` frame.
    pub fn state_change(&self) -> Result<Option<StateChangedData>, CodecError> {
        match &self.event {
            Some(raw) => {
                let payload: EventPayload = serde_json::from_str(raw.get())?;
                Ok(Some(payload.data))
            }
            None => Ok(None),
        }
    }

    /// The hub error message, if the frame carries a non-empty one.
    pub fn error_message(&self) -> Option<&str> {
        self.error
            .as_ref()
            .map(|e| e.message.as_str())
            .filter(|m| !m.is_empty())
    }

    /// `true` when this frame answers (or pushes on) the given request id.
    pub fn is_for(&self, id: u64) -> bool {
        self.id == Some(id)
    }
}

/// Accepts ids as JSON numbers or numeric strings.
fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    Ok(match Option::<RawId>::deserialize(deserializer)? {
        Some(RawId::Number(n)) => Some(n),
        Some(RawId::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

/// Serializes a client frame into a single-line JSON text frame.
pub fn encode(frame: &ClientFrame) -> Result<String, CodecError> {
    Ok(serde_json::to_string(frame)?)
}

/// Parses one text frame received from the hub.
pub fn decode(text: &str) -> Result<HubFrame, CodecError> {
    if text.len() > WS_MAX_MESSAGE_SIZE {
        return Err(CodecError::TooLarge(text.len()));
    }
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_auth() {
        let json = encode(&ClientFrame::auth("secret")).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value, serde_json::json!({"type": "auth", "access_token": "secret"}));
        assert!(!json.contains('\n'));
    }

    #[test]
    fn auth_debug_redacts_token() {
        let dbg = format!("{:?}", ClientFrame::auth("secret"));
        assert!(!dbg.contains("secret"));
    }

    #[test]
    fn encode_reserved_requests() {
        let v: Value = serde_json::from_str(&encode(&ClientFrame::get_states()).unwrap()).unwrap();
        assert_eq!(v, serde_json::json!({"id": 2, "type": "get_states"}));

        let v: Value =
            serde_json::from_str(&encode(&ClientFrame::subscribe_state_changed()).unwrap()).unwrap();
        assert_eq!(
            v,
            serde_json::json!({"id": 3, "type": "subscribe_events", "event_type": "state_changed"})
        );
    }

    #[test]
    fn encode_ping() {
        let v: Value = serde_json::from_str(&encode(&ClientFrame::ping(9)).unwrap()).unwrap();
        assert_eq!(v, serde_json::json!({"id": 9, "type": "ping"}));
    }

    #[test]
    fn call_service_inserts_entity_id() {
        let call = ServiceCall::new("cover", "set_cover_position", "cover.patio").with("position", 30);
        let frame = ClientFrame::call_service(7, call);
        let v: Value = serde_json::from_str(&encode(&frame).unwrap()).unwrap();
        assert_eq!(
            v,
            serde_json::json!({
                "id": 7,
                "type": "call_service",
                "domain": "cover",
                "service": "set_cover_position",
                "service_data": {"entity_id": "cover.patio", "position": 30}
            })
        );
    }

    #[test]
    fn service_call_survives_encode_decode() {
        let call = ServiceCall::new("light", "turn_on", "light.kitchen")
            .with("rgb_color", serde_json::json!([255, 128, 0]));
        let json = encode(&ClientFrame::call_service(12, call.clone())).unwrap();
        let decoded: ClientFrame = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.id(), Some(12));
        assert_eq!(decoded.as_service_call(), Some(call));
    }

    #[test]
    fn decode_auth_frames() {
        assert_eq!(
            decode(r#"{"type":"auth_required","ha_version":"2024.1.0"}"#).unwrap().frame_type,
            FrameType::AuthRequired
        );
        assert_eq!(decode(r#"{"type":"auth_ok"}"#).unwrap().frame_type, FrameType::AuthOk);
        let invalid = decode(r#"{"type":"auth_invalid","message":"bad token"}"#).unwrap();
        assert_eq!(invalid.frame_type, FrameType::AuthInvalid);
        assert!(invalid.id.is_none());
    }

    #[test]
    fn decode_state_list() {
        let frame = decode(
            r#"{"id":2,"type":"result","success":true,"result":[
                {"entity_id":"light.kitchen","state":"on","attributes":{"brightness":255}},
                {"entity_id":"cover.patio","state":"open","attributes":{}}
            ]}"#,
        )
        .unwrap();
        assert!(frame.is_for(GET_STATES_ID));
        let list = frame.states().unwrap();
        assert_eq!(list.states.len(), 2);
        assert_eq!(list.states[1].entity_id, "cover.patio");
        assert!(list.skipped.is_empty());
    }

    #[test]
    fn bad_state_entries_do_not_hide_the_rest() {
        let frame = decode(
            r#"{"id":2,"type":"result","success":true,"result":[
                {"entity_id":"light.kitchen","state":"on","attributes":{"brightness":255}},
                {"entity_id":"sensor.outside","state":null},
                {"entity_id":"switch.fan","state":"off","attributes":"none"},
                {"state":"on","attributes":{}},
                {"entity_id":"cover.patio","state":"open"}
            ]}"#,
        )
        .unwrap();
        let list = frame.states().unwrap();

        let ids: Vec<_> = list.states.iter().map(|s| s.entity_id.as_str()).collect();
        assert_eq!(ids, ["light.kitchen", "cover.patio"]);
        assert_eq!(list.states[0].attributes["brightness"], 255);

        let skipped: Vec<_> = list.skipped.iter().map(|s| s.entity_id.as_deref()).collect();
        assert_eq!(skipped, [Some("sensor.outside"), Some("switch.fan"), None]);
    }

    #[test]
    fn decode_subscribe_ack_has_no_states() {
        let frame = decode(r#"{"id":3,"type":"result","success":true,"result":null}"#).unwrap();
        assert!(frame.is_for(SUBSCRIBE_ID));
        let list = frame.states().unwrap();
        assert!(list.states.is_empty());
        assert!(list.skipped.is_empty());
    }

    #[test]
    fn decode_state_changed_event() {
        let frame = decode(
            r#"{"id":3,"type":"event","event":{"event_type":"state_changed","data":{
                "entity_id":"switch.fan",
                "old_state":{"entity_id":"switch.fan","state":"off"},
                "new_state":{"entity_id":"switch.fan","state":"on","attributes":{}}
            }}}"#,
        )
        .unwrap();
        let change = frame.state_change().unwrap().unwrap();
        assert_eq!(change.entity_id, "switch.fan");
        assert_eq!(change.new_state.unwrap().state, "on");
    }

    #[test]
    fn decode_string_id() {
        let frame = decode(r#"{"id":"5","type":"pong"}"#).unwrap();
        assert_eq!(frame.id, Some(5));
        assert_eq!(frame.frame_type, FrameType::Pong);
    }

    #[test]
    fn decode_error_message() {
        let frame = decode(
            r#"{"id":4,"type":"result","success":false,"error":{"code":"not_found","message":"Service not found."}}"#,
        )
        .unwrap();
        assert_eq!(frame.success, Some(false));
        assert_eq!(frame.error_message(), Some("Service not found."));
    }

    #[test]
    fn decode_unknown_type() {
        let frame = decode(r#"{"id":1,"type":"something_new"}"#).unwrap();
        assert_eq!(frame.frame_type, FrameType::Unknown);
    }

    #[test]
    fn decode_rejects_malformed_json() {
        assert!(matches!(decode("not valid json {{{"), Err(CodecError::Json(_))));
        assert!(matches!(decode("[1,2,3]"), Err(CodecError::Json(_))));
    }

    #[test]
    fn decode_bare_error_frame() {
        let frame = decode(r#"{"error":{"message":"Unauthorized"}}"#).unwrap();
        assert_eq!(frame.frame_type, FrameType::Unknown);
        assert_eq!(frame.error_message(), Some("Unauthorized"));
    }

    #[test]
    fn decode_rejects_oversized_frame() {
        let huge = "x".repeat(WS_MAX_MESSAGE_SIZE + 1);
        assert!(matches!(decode(&huge), Err(CodecError::TooLarge(_))));
    }
}
