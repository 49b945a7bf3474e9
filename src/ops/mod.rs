//! Audio State Machine
//!
//! Instantiates the combinator factory for [`AudioState`] and registers the
//! named audio operations on it. A unit built on an unavailable
//! [`AudioContext`] yields disabled wrappers, so every chain on it is a
//! silent no-op.

mod buffers;
mod playback;
mod spatial;

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::combinator::{Lifted, Mode, Reply, Unit, Wrapper};
use crate::engine::AudioContext;
use crate::state::{AudioState, BufferMap};

pub use spatial::DEFAULT_VOLUME;

/// Registered operation names
pub mod names {
    pub const SET_AUDIO_BUFFERS: &str = "set_audio_buffers";
    pub const GET_AUDIO_BUFFERS: &str = "get_audio_buffers";
    pub const ADD_SOUND: &str = "add_sound";
    pub const SOUNDS: &str = "sounds";
    pub const REMOVE_SOUND: &str = "remove_sound";
    pub const MASTER_GAIN: &str = "master_gain";
    pub const LOCATE: &str = "locate";
    pub const REMOVE_LOCATION: &str = "remove_location";
    pub const LISTEN_AT: &str = "listen_at";
    pub const ORIENT: &str = "orient";
    pub const CONE: &str = "cone";
    pub const PLAY: &str = "play";
}

pub type AudioUnit = Unit<AudioState, AudioContext, Arg, BufferMap>;
pub type AudioWrapper = Wrapper<AudioState, AudioContext, Arg, BufferMap>;
pub type AudioReply = Reply<AudioState, AudioContext, Arg, BufferMap>;
type AudioLifted = Lifted<AudioState, AudioContext, Arg, BufferMap>;

/// Build the audio unit for `context` with every operation registered
pub fn audio_unit(context: AudioContext) -> AudioUnit {
    let unit = AudioUnit::with_customize(context, |ctx, _| {
        if ctx.is_available() {
            Mode::Active
        } else {
            Mode::Disabled
        }
    });

    buffers::register(&unit);
    spatial::register(&unit);
    playback::register(&unit);

    unit
}

/// Wrap an initial state; an absent state yields a disabled chain
pub fn start(unit: &AudioUnit, initial: Option<AudioState>) -> AudioWrapper {
    unit.wrap_or_disable(initial)
}

/// A positional call argument
///
/// Operations read arguments by position and fall back to their defaults
/// when one is missing or of the wrong kind.
#[derive(Debug, Clone)]
pub enum Arg {
    Number(f64),
    Text(String),
    /// Sound id to encoded payload
    Sounds(BTreeMap<String, String>),
    Buffers(BufferMap),
    /// Named panner options
    Options(Map<String, Value>),
}

impl From<f64> for Arg {
    fn from(v: f64) -> Self {
        Arg::Number(v)
    }
}

impl From<f32> for Arg {
    fn from(v: f32) -> Self {
        Arg::Number(v as f64)
    }
}

impl From<i32> for Arg {
    fn from(v: i32) -> Self {
        Arg::Number(v as f64)
    }
}

impl From<&str> for Arg {
    fn from(v: &str) -> Self {
        Arg::Text(v.to_string())
    }
}

impl From<String> for Arg {
    fn from(v: String) -> Self {
        Arg::Text(v)
    }
}

impl From<BTreeMap<String, String>> for Arg {
    fn from(v: BTreeMap<String, String>) -> Self {
        Arg::Sounds(v)
    }
}

impl From<BufferMap> for Arg {
    fn from(v: BufferMap) -> Self {
        Arg::Buffers(v)
    }
}

impl From<Map<String, Value>> for Arg {
    fn from(v: Map<String, Value>) -> Self {
        Arg::Options(v)
    }
}

fn text(args: &[Arg], index: usize) -> Option<&str> {
    match args.get(index) {
        Some(Arg::Text(s)) => Some(s.as_str()),
        _ => None,
    }
}

fn number(args: &[Arg], index: usize, default: f64) -> f64 {
    match args.get(index) {
        Some(Arg::Number(n)) => *n,
        _ => default,
    }
}

fn options(args: &[Arg], index: usize) -> Option<&Map<String, Value>> {
    match args.get(index) {
        Some(Arg::Options(o)) => Some(o),
        _ => None,
    }
}

fn sounds(args: &[Arg], index: usize) -> Option<&BTreeMap<String, String>> {
    match args.get(index) {
        Some(Arg::Sounds(s)) => Some(s),
        _ => None,
    }
}

fn buffer_map(args: &[Arg], index: usize) -> Option<&BufferMap> {
    match args.get(index) {
        Some(Arg::Buffers(b)) => Some(b),
        _ => None,
    }
}
