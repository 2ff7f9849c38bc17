//! Hub `supported_features` bitmask → normalized capability set.

use crate::model::{Capability, CapabilitySet, Category};

/// Light feature bits.
pub mod light {
    pub const BRIGHTNESS: u32 = 1;
    pub const COLOR_TEMP: u32 = 2;
    pub const EFFECT: u32 = 4;
    pub const FLASH: u32 = 8;
    pub const COLOR: u32 = 16;
    pub const TRANSITION: u32 = 32;
    pub const WHITE_VALUE: u32 = 128;
}

/// Cover feature bits.
pub mod blind {
    pub const OPEN: u32 = 1;
    pub const CLOSE: u32 = 2;
    pub const SET_POSITION: u32 = 4;
    pub const STOP: u32 = 8;
    pub const OPEN_TILT: u32 = 16;
    pub const CLOSE_TILT: u32 = 32;
    pub const STOP_TILT: u32 = 64;
    pub const SET_TILT_POSITION: u32 = 128;
}

/// Climate feature bits.
pub mod climate {
    pub const TARGET_TEMPERATURE: u32 = 1;
    pub const TARGET_TEMPERATURE_RANGE: u32 = 2;
    pub const TARGET_HUMIDITY: u32 = 4;
    pub const FAN_MODE: u32 = 8;
    pub const PRESET_MODE: u32 = 16;
    pub const SWING_MODE: u32 = 32;
    pub const AUX_HEAT: u32 = 64;
}

/// Media player feature bits.
pub mod media_player {
    pub const PAUSE: u32 = 1;
    pub const SEEK: u32 = 2;
    pub const VOLUME_SET: u32 = 4;
    pub const VOLUME_MUTE: u32 = 8;
    pub const PREVIOUS_TRACK: u32 = 16;
    pub const NEXT_TRACK: u32 = 32;
    pub const TURN_ON: u32 = 128;
    pub const TURN_OFF: u32 = 256;
    pub const PLAY_MEDIA: u32 = 512;
    pub const VOLUME_STEP: u32 = 1024;
    pub const SELECT_SOURCE: u32 = 2048;
    pub const STOP: u32 = 4096;
    pub const CLEAR_PLAYLIST: u32 = 8192;
    pub const PLAY: u32 = 16384;
    pub const SHUFFLE_SET: u32 = 32768;
    pub const SELECT_SOUND_MODE: u32 = 65536;
}

type BitTable = &'static [(u32, &'static [Capability])];

const LIGHT: BitTable = &[
    (light::BRIGHTNESS, &[Capability::Brightness]),
    (light::COLOR_TEMP, &[Capability::ColorTemp]),
    (light::COLOR, &[Capability::Color]),
];

const BLIND: BitTable = &[
    (blind::OPEN, &[Capability::Open]),
    (blind::CLOSE, &[Capability::Close]),
    (blind::SET_POSITION, &[Capability::Position]),
    (blind::STOP, &[Capability::Stop]),
];

const CLIMATE: BitTable = &[
    (climate::TARGET_TEMPERATURE, &[Capability::TargetTemperature]),
    (
        climate::TARGET_TEMPERATURE_RANGE,
        &[Capability::TemperatureMin, Capability::TemperatureMax],
    ),
];

const MEDIA_PLAYER: BitTable = &[
    (media_player::PAUSE, &[Capability::Pause]),
    (
        media_player::SEEK,
        &[
            Capability::Seek,
            Capability::MediaDuration,
            Capability::MediaPosition,
            Capability::MediaProgress,
        ],
    ),
    (media_player::VOLUME_SET, &[Capability::VolumeSet]),
    (media_player::VOLUME_MUTE, &[Capability::Mute]),
    (media_player::PREVIOUS_TRACK, &[Capability::Previous]),
    (media_player::NEXT_TRACK, &[Capability::Next]),
    (media_player::TURN_ON, &[Capability::TurnOn]),
    (media_player::TURN_OFF, &[Capability::TurnOff]),
    (
        media_player::VOLUME_STEP,
        &[Capability::VolumeUp, Capability::VolumeDown],
    ),
    (media_player::SELECT_SOURCE, &[Capability::Source]),
    (media_player::STOP, &[Capability::Stop]),
    (media_player::PLAY, &[Capability::Play]),
    (media_player::SHUFFLE_SET, &[Capability::Shuffle]),
];

const CLIMATE_BASELINE: &[Capability] = &[Capability::Temperature];

const MEDIA_PLAYER_BASELINE: &[Capability] = &[
    Capability::AppName,
    Capability::MediaAlbum,
    Capability::MediaArtist,
    Capability::MediaImage,
    Capability::MediaTitle,
    Capability::MediaType,
];

/// Capability set of a device of `category` advertising `bits`.
///
/// Categories without a table (switch, remote, anything unrecognised)
/// yield an empty set.
pub fn capabilities(category: &Category, bits: u32) -> CapabilitySet {
    let (baseline, table): (&[Capability], BitTable) = match category {
        Category::Light => (&[], LIGHT),
        Category::Blind => (&[], BLIND),
        Category::Climate => (CLIMATE_BASELINE, CLIMATE),
        Category::MediaPlayer => (MEDIA_PLAYER_BASELINE, MEDIA_PLAYER),
        Category::Switch | Category::Remote | Category::Other(_) => (&[], &[]),
    };

    let mut set: CapabilitySet = baseline.iter().copied().collect();
    for (bit, caps) in table {
        if bits & bit != 0 {
            set.extend(caps.iter().copied());
        }
    }
    set
}
