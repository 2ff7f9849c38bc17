use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Category & capability
// ---------------------------------------------------------------------------

/// Normalized device kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Light,
    Blind,
    Climate,
    MediaPlayer,
    Switch,
    Remote,
    /// Any hub domain without a normalized counterpart, kept verbatim.
    Other(String),
}

impl Category {
    /// Maps a hub domain to its normalized category. The hub calls blinds
    /// `cover` and exposes virtual switches as `input_boolean`.
    pub fn from_hub_domain(domain: &str) -> Self {
        match domain {
            "cover" => Self::Blind,
            "input_boolean" => Self::Switch,
            other => Self::from(other.to_string()),
        }
    }

    /// Category of a hub entity id (`"cover.patio"` → [`Category::Blind`]).
    pub fn from_entity_id(entity_id: &str) -> Self {
        Self::from_hub_domain(hublink_protocol::entity_domain(entity_id))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Light => "light",
            Self::Blind => "blind",
            Self::Climate => "climate",
            Self::MediaPlayer => "media_player",
            Self::Switch => "switch",
            Self::Remote => "remote",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for Category {
    fn from(name: String) -> Self {
        match name.as_str() {
            "light" => Self::Light,
            "blind" => Self::Blind,
            "climate" => Self::Climate,
            "media_player" => Self::MediaPlayer,
            "switch" => Self::Switch,
            "remote" => Self::Remote,
            _ => Self::Other(name),
        }
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional feature a device instance supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Capability {
    // light
    Brightness,
    Color,
    #[serde(rename = "COLORTEMP")]
    ColorTemp,
    // blind
    Open,
    Close,
    Stop,
    Position,
    // climate
    Temperature,
    TargetTemperature,
    TemperatureMin,
    TemperatureMax,
    // media player
    AppName,
    MediaAlbum,
    MediaArtist,
    MediaImage,
    MediaTitle,
    MediaType,
    MediaDuration,
    MediaPosition,
    MediaProgress,
    Pause,
    Play,
    Seek,
    VolumeSet,
    VolumeUp,
    VolumeDown,
    Mute,
    Previous,
    Next,
    TurnOn,
    TurnOff,
    Source,
    Shuffle,
}

pub type CapabilitySet = BTreeSet<Capability>;

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

/// Normalized device state value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceState {
    On,
    Off,
    Open,
    Closed,
    Idle,
    Playing,
    Heat,
    Cool,
}

/// Normalized attribute key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    State,
    Brightness,
    Color,
    Position,
    Volume,
    Source,
    MediaType,
    MediaImage,
    MediaTitle,
    MediaArtist,
    MediaAlbum,
    AppName,
    Temperature,
    TargetTemperature,
    TemperatureMin,
    TemperatureMax,
}

/// Normalized attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    State(DeviceState),
    /// 0–100.
    Percent(u8),
    Number(f64),
    Text(String),
}

/// Attribute writes produced by one translation; applied as point writes.
pub type AttributeUpdates = BTreeMap<Attribute, AttributeValue>;

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// An RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `#RRGGBB`, uppercase and zero padded.
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Parses `#RRGGBB` (the `#` is optional).
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

/// Normalized command issued by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Toggle,
    On,
    Off,
    Brightness,
    Color,
    Open,
    Close,
    Stop,
    Position,
    VolumeSet,
    Play,
    Pause,
    Previous,
    Next,
    TargetTemperature,
    HeatMode,
    CoolMode,
    /// A remote button, resolved through the remote's code table.
    Button(String),
}

/// Argument of a command.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Param {
    #[default]
    None,
    Number(f64),
    Rgb(Rgb),
}

impl Param {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    pub fn as_rgb(&self) -> Option<Rgb> {
        match self {
            Self::Rgb(c) => Some(*c),
            _ => None,
        }
    }
}

/// One row of a remote's command table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCode {
    #[serde(alias = "button_map")]
    pub button: String,
    /// One or more comma-separated codes.
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

// ---------------------------------------------------------------------------
// Device
// ---------------------------------------------------------------------------

/// Registry view of a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub category: Category,
    pub owner: String,
    pub friendly_name: String,
    #[serde(default)]
    pub capabilities: CapabilitySet,
    #[serde(default)]
    pub attributes: AttributeUpdates,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remote_codes: Vec<RemoteCode>,
}

impl Device {
    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// The id the hub knows this device by.
    pub fn hub_entity_id(&self) -> &str {
        hub_entity_id(&self.id)
    }

    /// Last-write-wins merge of translated attributes.
    pub fn apply(&mut self, updates: &AttributeUpdates) {
        for (key, value) in updates {
            self.attributes.insert(*key, value.clone());
        }
    }
}

/// Strips a `+alias` suffix: `"light.kitchen+ambient"` → `"light.kitchen"`.
pub fn hub_entity_id(device_id: &str) -> &str {
    device_id.split('+').next().unwrap_or(device_id)
}

/// `true` when `device_id` is backed by the hub entity `entity_id`.
pub fn is_backed_by(device_id: &str, entity_id: &str) -> bool {
    match device_id.strip_prefix(entity_id) {
        Some(rest) => rest.is_empty() || rest.starts_with('+'),
        None => false,
    }
}
