fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use hublink_devices::{
        Attribute, AttributeUpdates, AttributeValue, Capability, Category, Command, DeviceState,
        Param, RemoteCode, apply_state, capabilities, to_service_call,
    };
    use hublink_protocol::{ClientFrame, EntityState, FrameType, HubFrame, decode, encode};

    const BASE_URL: &str = "http://10.0.0.5:8123";

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    fn read_fixture(name: &str) -> String {
        let path = fixtures_dir().join(name);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        serde_json::from_str(&read_fixture(name))
            .unwrap_or_else(|e| panic!("failed to parse fixture {name}: {e}"))
    }

    /// Decodes a captured hub frame the same way the connection does.
    fn decode_fixture(name: &str) -> HubFrame {
        decode(&read_fixture(name)).unwrap_or_else(|e| panic!("failed to decode {name}: {e}"))
    }

    /// Normalizes JSON values so that integer-valued floats compare equal.
    ///
    /// The hub writes `80` where `f64` serializes as `80.0`.
    fn normalize_value(v: &serde_json::Value) -> serde_json::Value {
        match v {
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => serde_json::json!(f),
                None => v.clone(),
            },
            serde_json::Value::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), normalize_value(v)))
                    .collect(),
            ),
            serde_json::Value::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(normalize_value).collect())
            }
            _ => v.clone(),
        }
    }

    /// Asserts that an encoded client frame matches a fixture
    /// (order-independent, float-normalized comparison).
    fn assert_encodes_as(frame: &ClientFrame, name: &str) {
        let fixture = load_fixture(name);
        let encoded: serde_json::Value = serde_json::from_str(&encode(frame).unwrap()).unwrap();
        assert_eq!(
            normalize_value(&fixture),
            normalize_value(&encoded),
            "encode mismatch for {name}:\n  hub:  {fixture}\n  ours: {encoded}"
        );
    }

    fn states() -> Vec<EntityState> {
        decode_fixture("get_states_result.json").states().unwrap().states
    }

    fn translate(state: &EntityState) -> (Category, AttributeUpdates) {
        let category = Category::from_entity_id(&state.entity_id);
        let caps = capabilities(&category, state.supported_features());
        let updates = apply_state(&category, &caps, state, BASE_URL);
        (category, updates)
    }

    fn find<'a>(states: &'a [EntityState], id: &str) -> &'a EntityState {
        states
            .iter()
            .find(|s| s.entity_id == id)
            .unwrap_or_else(|| panic!("{id} missing from fixture"))
    }

    // --- Handshake frames ---

    #[test]
    fn fixture_auth_frames() {
        assert_eq!(
            decode_fixture("auth_required.json").frame_type,
            FrameType::AuthRequired
        );
        let invalid = decode_fixture("auth_invalid.json");
        assert_eq!(invalid.frame_type, FrameType::AuthInvalid);
        assert_eq!(invalid.id, None);
    }

    #[test]
    fn fixture_subscribe_events() {
        assert_encodes_as(&ClientFrame::subscribe_state_changed(), "subscribe_events.json");

        let parsed: ClientFrame = serde_json::from_value(load_fixture("subscribe_events.json")).unwrap();
        assert_eq!(parsed.id(), Some(3));
    }

    // --- State list ---

    #[test]
    fn fixture_get_states_result() {
        let frame = decode_fixture("get_states_result.json");
        assert_eq!(frame.frame_type, FrameType::Result);
        assert!(frame.is_for(2));
        assert_eq!(frame.success, Some(true));

        let list = frame.states().unwrap();
        assert!(list.skipped.is_empty());
        let states = list.states;
        assert_eq!(states.len(), 7);
        assert_eq!(find(&states, "light.kitchen").friendly_name(), "Kitchen");
        assert_eq!(find(&states, "input_boolean.guest_mode").supported_features(), 0);
    }

    #[test]
    fn fixture_light_translation() {
        let states = states();
        let (category, updates) = translate(find(&states, "light.kitchen"));
        assert_eq!(category, Category::Light);
        assert_eq!(updates[&Attribute::State], AttributeValue::State(DeviceState::On));
        assert_eq!(updates[&Attribute::Brightness], AttributeValue::Percent(80));
        assert_eq!(updates[&Attribute::Color], AttributeValue::Text("#FF9329".into()));
    }

    #[test]
    fn fixture_cover_translation() {
        let states = states();
        let (category, updates) = translate(find(&states, "cover.patio"));
        assert_eq!(category, Category::Blind);
        assert_eq!(updates[&Attribute::State], AttributeValue::State(DeviceState::Open));
        assert_eq!(updates[&Attribute::Position], AttributeValue::Percent(70));
    }

    #[test]
    fn fixture_climate_translation() {
        let states = states();
        let (_, updates) = translate(find(&states, "climate.hallway"));
        assert_eq!(updates[&Attribute::State], AttributeValue::State(DeviceState::Heat));
        assert_eq!(updates[&Attribute::Temperature], AttributeValue::Number(20.5));
        assert_eq!(updates[&Attribute::TargetTemperature], AttributeValue::Number(21.0));
        // No range bit: min/max are not surfaced.
        assert!(!updates.contains_key(&Attribute::TemperatureMin));
    }

    #[test]
    fn fixture_media_player_translation() {
        let states = states();
        let state = find(&states, "media_player.living_room");
        let caps = capabilities(&Category::MediaPlayer, state.supported_features());
        assert!(caps.contains(&Capability::VolumeSet));
        assert!(!caps.contains(&Capability::Source));

        let (_, updates) = translate(state);
        assert_eq!(updates[&Attribute::State], AttributeValue::State(DeviceState::Playing));
        assert_eq!(updates[&Attribute::Volume], AttributeValue::Percent(35));
        assert_eq!(updates[&Attribute::MediaTitle], AttributeValue::Text("Blue in Green".into()));
        assert_eq!(updates[&Attribute::AppName], AttributeValue::Text("Spotify".into()));
        assert_eq!(
            updates[&Attribute::MediaImage],
            AttributeValue::Text(format!(
                "{BASE_URL}/api/media_player_proxy/media_player.living_room?token=abc&cache=9f2"
            ))
        );
        assert!(!updates.contains_key(&Attribute::Source));
    }

    #[test]
    fn fixture_switch_remote_and_unknown_domains() {
        let states = states();

        let (category, updates) = translate(find(&states, "input_boolean.guest_mode"));
        assert_eq!(category, Category::Switch);
        assert_eq!(updates[&Attribute::State], AttributeValue::State(DeviceState::Off));

        let (category, updates) = translate(find(&states, "remote.tv"));
        assert_eq!(category, Category::Remote);
        assert!(updates.is_empty());

        let (category, updates) = translate(find(&states, "sensor.outdoor_temperature"));
        assert_eq!(category, Category::Other("sensor".into()));
        assert!(updates.is_empty());
    }

    // --- Events ---

    #[test]
    fn fixture_state_changed_event() {
        let frame = decode_fixture("state_changed_event.json");
        assert_eq!(frame.frame_type, FrameType::Event);
        assert!(frame.is_for(3));

        let change = frame.state_change().unwrap().unwrap();
        assert_eq!(change.entity_id, "cover.patio");
        let new_state = change.new_state.unwrap();
        let (_, updates) = translate(&new_state);
        assert_eq!(updates[&Attribute::State], AttributeValue::State(DeviceState::Closed));
        assert_eq!(updates[&Attribute::Position], AttributeValue::Percent(100));
    }

    #[test]
    fn fixture_entity_removed_event() {
        let change = decode_fixture("entity_removed_event.json")
            .state_change()
            .unwrap()
            .unwrap();
        assert_eq!(change.entity_id, "light.porch");
        assert!(change.new_state.is_none());
    }

    // --- Results and liveness ---

    #[test]
    fn fixture_command_error_result() {
        let frame = decode_fixture("command_error_result.json");
        assert_eq!(frame.id, Some(7));
        assert_eq!(frame.success, Some(false));
        assert_eq!(frame.error_message(), Some("Service light.turn_onn not found."));
    }

    #[test]
    fn fixture_pong() {
        let frame = decode_fixture("pong.json");
        assert_eq!(frame.frame_type, FrameType::Pong);
        assert!(frame.is_for(12));
    }

    // --- Outbound service calls ---

    #[test]
    fn fixture_call_service_brightness() {
        let call = to_service_call(
            &Category::Light,
            "light.kitchen",
            &Command::Brightness,
            &Param::Number(80.0),
            &[],
        )
        .unwrap();
        assert_encodes_as(&ClientFrame::call_service(4, call), "call_service_brightness.json");
    }

    #[test]
    fn fixture_call_service_remote() {
        let table = [RemoteCode {
            button: "VOLUME_UP".into(),
            code: "VolumeUp,VolumeUp".into(),
            device: Some("Living Room TV".into()),
        }];
        let call = to_service_call(
            &Category::Remote,
            "remote.tv",
            &Command::Button("VOLUME_UP".into()),
            &Param::None,
            &table,
        )
        .unwrap();
        let frame = ClientFrame::call_service(9, call);
        assert_encodes_as(&frame, "call_service_remote.json");

        let parsed: ClientFrame = serde_json::from_value(load_fixture("call_service_remote.json")).unwrap();
        assert_eq!(parsed.as_service_call(), frame.as_service_call());
    }
}
