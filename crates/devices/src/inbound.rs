//! Hub state payload → normalized attribute writes.

use hublink_protocol::EntityState;
use serde_json::Value;

use crate::model::{
    Attribute, AttributeUpdates, AttributeValue, Capability, CapabilitySet, Category, DeviceState,
    Rgb,
};

/// Hub brightness (0–255) as a percentage.
pub fn convert_brightness(value: f64) -> u8 {
    percent((value / 255.0) * 100.0)
}

/// Hub volume (0.0–1.0) as a percentage.
pub fn convert_volume(level: f64) -> u8 {
    percent(level * 100.0)
}

/// Flips a blind position between the hub's and the normalized sense.
/// Applying it twice gives the input back for any value in 0–100.
pub fn invert_position(position: f64) -> u8 {
    percent(100.0 - position.clamp(0.0, 100.0))
}

fn percent(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}

/// Makes a hub-relative image path absolute against `base_url`.
pub fn resolve_image_url(url: &str, base_url: &str) -> String {
    if url.contains("http") {
        url.to_string()
    } else {
        format!("{base_url}{url}")
    }
}

/// Translates one entity state into attribute writes for a device of
/// `category` with the given capabilities.
///
/// Keys absent from the payload produce no write, so the device keeps its
/// previous value. State strings the category does not know are skipped.
pub fn apply_state(
    category: &Category,
    capabilities: &CapabilitySet,
    state: &EntityState,
    base_url: &str,
) -> AttributeUpdates {
    let mut out = AttributeUpdates::new();
    let view = View {
        caps: capabilities,
        state,
    };

    match category {
        Category::Light => {
            let device_state = map_state(&state.state, &[("on", DeviceState::On), ("off", DeviceState::Off)]);
            if let Some(s) = device_state {
                out.insert(Attribute::State, AttributeValue::State(s));
            }
            if view.has(Capability::Brightness) {
                match view.number("brightness") {
                    Some(b) => {
                        out.insert(Attribute::Brightness, AttributeValue::Percent(convert_brightness(b)));
                    }
                    None if device_state == Some(DeviceState::On) => {
                        out.insert(Attribute::Brightness, AttributeValue::Percent(0));
                    }
                    None => {}
                }
            }
            if view.has(Capability::Color)
                && let Some(rgb) = view.rgb("rgb_color")
            {
                out.insert(Attribute::Color, AttributeValue::Text(rgb.to_hex()));
            }
        }
        Category::Blind => {
            if let Some(s) = map_state(
                &state.state,
                &[("open", DeviceState::Open), ("closed", DeviceState::Closed)],
            ) {
                out.insert(Attribute::State, AttributeValue::State(s));
            }
            if view.has(Capability::Position)
                && let Some(p) = view.number("current_position")
            {
                out.insert(Attribute::Position, AttributeValue::Percent(invert_position(p)));
            }
        }
        Category::MediaPlayer => {
            if let Some(s) = map_state(
                &state.state,
                &[
                    ("off", DeviceState::Off),
                    ("on", DeviceState::On),
                    ("idle", DeviceState::Idle),
                    ("playing", DeviceState::Playing),
                ],
            ) {
                out.insert(Attribute::State, AttributeValue::State(s));
            }
            if view.has(Capability::VolumeSet)
                && let Some(v) = view.number("volume_level")
            {
                out.insert(Attribute::Volume, AttributeValue::Percent(convert_volume(v)));
            }
            if view.has(Capability::MediaImage)
                && let Some(url) = view.text("entity_picture")
            {
                out.insert(
                    Attribute::MediaImage,
                    AttributeValue::Text(resolve_image_url(url, base_url)),
                );
            }
            for (cap, key, attr) in [
                (Capability::Source, "source", Attribute::Source),
                (Capability::MediaType, "media_content_type", Attribute::MediaType),
                (Capability::MediaTitle, "media_title", Attribute::MediaTitle),
                (Capability::MediaArtist, "media_artist", Attribute::MediaArtist),
                (Capability::MediaAlbum, "media_album_name", Attribute::MediaAlbum),
                (Capability::AppName, "app_name", Attribute::AppName),
            ] {
                if view.has(cap)
                    && let Some(text) = view.text(key)
                {
                    out.insert(attr, AttributeValue::Text(text.to_string()));
                }
            }
        }
        Category::Climate => {
            if let Some(s) = map_state(
                &state.state,
                &[
                    ("off", DeviceState::Off),
                    ("heat", DeviceState::Heat),
                    ("cool", DeviceState::Cool),
                ],
            ) {
                out.insert(Attribute::State, AttributeValue::State(s));
            }
            for (cap, key, attr) in [
                (Capability::Temperature, "current_temperature", Attribute::Temperature),
                (Capability::TargetTemperature, "temperature", Attribute::TargetTemperature),
                (Capability::TemperatureMax, "max_temp", Attribute::TemperatureMax),
                (Capability::TemperatureMin, "min_temp", Attribute::TemperatureMin),
            ] {
                if view.has(cap)
                    && let Some(n) = view.number(key)
                {
                    out.insert(attr, AttributeValue::Number(n));
                }
            }
        }
        Category::Switch => {
            if let Some(s) = map_state(&state.state, &[("on", DeviceState::On), ("off", DeviceState::Off)]) {
                out.insert(Attribute::State, AttributeValue::State(s));
            }
        }
        Category::Remote | Category::Other(_) => {}
    }

    out
}

fn map_state(raw: &str, table: &[(&str, DeviceState)]) -> Option<DeviceState> {
    table
        .iter()
        .find(|(name, _)| *name == raw)
        .map(|(_, state)| *state)
}

struct View<'a> {
    caps: &'a CapabilitySet,
    state: &'a EntityState,
}

impl View<'_> {
    fn has(&self, cap: Capability) -> bool {
        self.caps.contains(&cap)
    }

    fn number(&self, key: &str) -> Option<f64> {
        self.state.attributes.get(key).and_then(Value::as_f64)
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.state.attributes.get(key).and_then(Value::as_str)
    }

    fn rgb(&self, key: &str) -> Option<Rgb> {
        let list = self.state.attributes.get(key)?.as_array()?;
        if list.len() != 3 {
            return None;
        }
        let channel = |v: &Value| v.as_f64().map(|c| c.round().clamp(0.0, 255.0) as u8);
        Some(Rgb::new(channel(&list[0])?, channel(&list[1])?, channel(&list[2])?))
    }
}
