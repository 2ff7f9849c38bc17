//! Normalized command → hub service call.

use hublink_protocol::{ServiceCall, entity_domain};
use serde_json::Value;

use crate::model::{Category, Command, Param, RemoteCode, Rgb, hub_entity_id};

/// Translates `command` for the device `device_id` into a hub service call.
///
/// Returns `None` when the category has no mapping for the command, when a
/// required parameter is missing, or when a remote button has no codes.
pub fn to_service_call(
    category: &Category,
    device_id: &str,
    command: &Command,
    param: &Param,
    remote_codes: &[RemoteCode],
) -> Option<ServiceCall> {
    let entity = hub_entity_id(device_id);
    let call = |domain: &str, service: &str| Some(ServiceCall::new(domain, service, entity));

    match category {
        Category::Light => match command {
            Command::Toggle => call("light", "toggle"),
            Command::On => call("light", "turn_on"),
            Command::Off => call("light", "turn_off"),
            Command::Brightness => {
                let pct = param.as_number()?.round().clamp(0.0, 100.0) as u64;
                call("light", "turn_on").map(|c| c.with("brightness_pct", pct))
            }
            Command::Color => {
                let rgb = param.as_rgb()?;
                call("light", "turn_on").map(|c| c.with("rgb_color", vec![rgb.r, rgb.g, rgb.b]))
            }
            _ => None,
        },
        Category::Blind => match command {
            Command::Open => call("cover", "open_cover"),
            Command::Close => call("cover", "close_cover"),
            Command::Stop => call("cover", "stop_cover"),
            Command::Position => {
                let position = param.as_number()?.round().clamp(0.0, 100.0) as u64;
                call("cover", "set_cover_position").map(|c| c.with("position", position))
            }
            _ => None,
        },
        Category::MediaPlayer => match command {
            Command::VolumeSet => {
                let level = param.as_number()?.clamp(0.0, 100.0) / 100.0;
                call("media_player", "volume_set").map(|c| c.with("volume_level", level))
            }
            Command::Play | Command::Pause => call("media_player", "media_play_pause"),
            Command::Previous => call("media_player", "media_previous_track"),
            Command::Next => call("media_player", "media_next_track"),
            Command::On => call("media_player", "turn_on"),
            Command::Off => call("media_player", "turn_off"),
            _ => None,
        },
        Category::Climate => match command {
            Command::On => call("climate", "turn_on"),
            Command::Off => call("climate", "turn_off"),
            Command::TargetTemperature => {
                let temperature = param.as_number()?;
                call("climate", "set_temperature").map(|c| c.with("temperature", temperature))
            }
            Command::HeatMode => call("climate", "set_hvac_mode").map(|c| c.with("hvac_mode", "heat")),
            Command::CoolMode => call("climate", "set_hvac_mode").map(|c| c.with("hvac_mode", "cool")),
            _ => None,
        },
        Category::Switch => {
            let domain = entity_domain(entity);
            match command {
                Command::On => call(domain, "turn_on"),
                Command::Off => call(domain, "turn_off"),
                _ => None,
            }
        }
        Category::Remote => match command {
            Command::Button(button) => {
                let codes = find_remote_codes(button, remote_codes);
                if codes.is_empty() {
                    return None;
                }
                let mut c = ServiceCall::new("remote", "send_command", entity).with("command", codes);
                if let Some(device) = find_remote_device(button, remote_codes) {
                    c = c.with("device", device);
                }
                Some(c)
            }
            _ => None,
        },
        Category::Other(_) => None,
    }
}

/// Every code bound to `button`, comma lists flattened.
pub fn find_remote_codes(button: &str, table: &[RemoteCode]) -> Vec<String> {
    table
        .iter()
        .filter(|row| row.button == button)
        .flat_map(|row| row.code.split(','))
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .collect()
}

/// Target device of the first row bound to `button` that names one.
pub fn find_remote_device<'a>(button: &str, table: &'a [RemoteCode]) -> Option<&'a str> {
    table
        .iter()
        .filter(|row| row.button == button)
        .filter_map(|row| row.device.as_deref())
        .find(|device| !device.is_empty())
}

/// Reads a loosely typed host parameter: numbers, numeric strings, or
/// `#RRGGBB` colors.
pub fn param_from_value(value: &Value) -> Param {
    match value {
        Value::Number(n) => n.as_f64().map(Param::Number).unwrap_or_default(),
        Value::String(s) if s.starts_with('#') => Rgb::from_hex(s).map(Param::Rgb).unwrap_or_default(),
        Value::String(s) => s.trim().parse::<f64>().map(Param::Number).unwrap_or_default(),
        _ => Param::None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn remote_table() -> Vec<RemoteCode> {
        vec![
            RemoteCode {
                button: "VOLUME_UP".into(),
                code: "VolumeUp, VolumeUp".into(),
                device: Some("Living Room TV".into()),
            },
            RemoteCode {
                button: "POWER".into(),
                code: "0x0C".into(),
                device: None,
            },
        ]
    }

    fn translate(category: Category, id: &str, command: Command, param: Param) -> Option<ServiceCall> {
        to_service_call(&category, id, &command, &param, &[])
    }

    #[test]
    fn light_brightness() {
        let call = translate(Category::Light, "light.kitchen", Command::Brightness, Param::Number(42.4)).unwrap();
        assert_eq!((call.domain.as_str(), call.service.as_str()), ("light", "turn_on"));
        assert_eq!(call.data["brightness_pct"], json!(42));
    }

    #[test]
    fn light_color_is_rgb_list() {
        let call = translate(
            Category::Light,
            "light.kitchen",
            Command::Color,
            Param::Rgb(Rgb::new(255, 8, 0)),
        )
        .unwrap();
        assert_eq!(call.data["rgb_color"], json!([255, 8, 0]));
    }

    #[test]
    fn missing_parameter_emits_nothing() {
        assert!(translate(Category::Light, "light.kitchen", Command::Brightness, Param::None).is_none());
        assert!(translate(Category::Light, "light.kitchen", Command::Color, Param::Number(3.0)).is_none());
        assert!(translate(Category::Blind, "cover.patio", Command::Position, Param::None).is_none());
    }

    #[test]
    fn alias_suffix_is_stripped_from_entity_id() {
        let call = translate(Category::Light, "light.kitchen+ambient", Command::Toggle, Param::None).unwrap();
        assert_eq!(call.entity_id, "light.kitchen");
        assert_eq!(call.service, "toggle");
    }

    #[test]
    fn blind_uses_cover_domain() {
        let call = translate(Category::Blind, "cover.patio", Command::Position, Param::Number(30.0)).unwrap();
        assert_eq!(call.domain, "cover");
        assert_eq!(call.service, "set_cover_position");
        assert_eq!(call.data["position"], json!(30));

        let stop = translate(Category::Blind, "cover.patio", Command::Stop, Param::None).unwrap();
        assert_eq!(stop.service, "stop_cover");
    }

    #[test]
    fn media_player_volume_is_fraction() {
        let call = translate(
            Category::MediaPlayer,
            "media_player.tv",
            Command::VolumeSet,
            Param::Number(40.0),
        )
        .unwrap();
        assert_eq!(call.data["volume_level"], json!(0.4));

        let play = translate(Category::MediaPlayer, "media_player.tv", Command::Play, Param::None).unwrap();
        let pause = translate(Category::MediaPlayer, "media_player.tv", Command::Pause, Param::None).unwrap();
        assert_eq!(play.service, "media_play_pause");
        assert_eq!(play, pause);
    }

    #[test]
    fn climate_modes() {
        let heat = translate(Category::Climate, "climate.hall", Command::HeatMode, Param::None).unwrap();
        assert_eq!(heat.service, "set_hvac_mode");
        assert_eq!(heat.data["hvac_mode"], json!("heat"));

        let target = translate(
            Category::Climate,
            "climate.hall",
            Command::TargetTemperature,
            Param::Number(21.5),
        )
        .unwrap();
        assert_eq!(target.data["temperature"], json!(21.5));
    }

    #[test]
    fn switch_domain_comes_from_id_prefix() {
        let call = translate(Category::Switch, "input_boolean.guest", Command::On, Param::None).unwrap();
        assert_eq!(call.domain, "input_boolean");
        assert_eq!(call.service, "turn_on");

        let call = translate(Category::Switch, "switch.fan", Command::Off, Param::None).unwrap();
        assert_eq!(call.domain, "switch");
    }

    #[test]
    fn unmapped_command_is_ignored() {
        assert!(translate(Category::Switch, "switch.fan", Command::Toggle, Param::None).is_none());
        assert!(translate(Category::Blind, "cover.patio", Command::Play, Param::None).is_none());
        assert!(translate(Category::Other("sensor".into()), "sensor.x", Command::On, Param::None).is_none());
    }

    #[test]
    fn remote_button_collects_codes_and_device() {
        let table = remote_table();
        let call = to_service_call(
            &Category::Remote,
            "remote.tv",
            &Command::Button("VOLUME_UP".into()),
            &Param::None,
            &table,
        )
        .unwrap();
        assert_eq!((call.domain.as_str(), call.service.as_str()), ("remote", "send_command"));
        assert_eq!(call.data["command"], json!(["VolumeUp", "VolumeUp"]));
        assert_eq!(call.data["device"], json!("Living Room TV"));

        let power = to_service_call(
            &Category::Remote,
            "remote.tv",
            &Command::Button("POWER".into()),
            &Param::None,
            &table,
        )
        .unwrap();
        assert!(!power.data.contains_key("device"));
    }

    #[test]
    fn remote_button_without_codes_emits_nothing() {
        let call = to_service_call(
            &Category::Remote,
            "remote.tv",
            &Command::Button("MUTE".into()),
            &Param::None,
            &remote_table(),
        );
        assert!(call.is_none());
    }

    #[test]
    fn param_from_json_value() {
        assert_eq!(param_from_value(&json!(12)), Param::Number(12.0));
        assert_eq!(param_from_value(&json!("55")), Param::Number(55.0));
        assert_eq!(param_from_value(&json!("#00FF10")), Param::Rgb(Rgb::new(0, 255, 16)));
        assert_eq!(param_from_value(&json!(null)), Param::None);
    }
}
