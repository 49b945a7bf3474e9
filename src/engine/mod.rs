//! Audio Engine Module
//!
//! The capability boundary the state layer drives:
//! - Node traits for gain, panner and buffer-source handles
//! - The [`AudioEngine`] trait (node creation, routing, decoding, listener)
//! - [`AudioContext`], the process-wide handle to one engine or none
//! - [`SoftwareEngine`], an in-process engine that records its graph

pub mod buffer;
pub mod io;
pub mod software;

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::error::Result;

pub use buffer::{BufferHandle, DecodedBuffer};
pub use io::{decode_wav, encode_wav, generate_test_tone};
pub use software::{GraphEvent, SoftwareEngine};

/// Engine-assigned node identifier
pub type NodeId = u64;

/// Where a node's output goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Node(NodeId),
    /// The engine's final output
    Destination,
}

/// Anything that lives in the audio graph
pub trait AudioNode: fmt::Debug {
    fn node_id(&self) -> NodeId;
}

/// A volume control
pub trait GainNode: AudioNode {
    fn set_gain(&self, value: f32);
    fn gain(&self) -> f32;
}

/// A 3-D spatialisation node
pub trait PannerNode: AudioNode {
    fn set_position(&self, x: f64, y: f64, z: f64);
    fn position(&self) -> [f64; 3];
    fn set_orientation(&self, x: f64, y: f64, z: f64);
    fn orientation(&self) -> [f64; 3];
    fn set_cone(&self, inner_angle: f64, outer_angle: f64, outer_gain: f64);

    /// Apply a named option (`refDistance`, `panningModel`, ...)
    ///
    /// Returns `false` when the name or value type is not understood; the
    /// panner is left untouched in that case.
    fn set_option(&self, name: &str, value: &Value) -> bool;
    fn option(&self, name: &str) -> Option<Value>;
}

/// A one-shot player for a decoded buffer
pub trait SourceNode: AudioNode {
    fn set_buffer(&self, buffer: BufferHandle);
    /// Start playback `when` seconds from now
    fn start(&self, when: f64);
}

pub type GainHandle = Rc<dyn GainNode>;
pub type PannerHandle = Rc<dyn PannerNode>;
pub type SourceHandle = Rc<dyn SourceNode>;

/// Completion callback for [`AudioEngine::decode_audio_data`]
pub type DecodeCallback = Box<dyn FnOnce(Result<BufferHandle>)>;

/// The audio engine capability
///
/// Implementations are single-threaded. Decoding is asynchronous: the
/// callback runs at some later point chosen by the engine, never inside
/// `decode_audio_data` itself.
pub trait AudioEngine {
    fn create_gain(&self) -> GainHandle;
    fn create_panner(&self) -> PannerHandle;
    fn create_buffer_source(&self) -> SourceHandle;

    /// Route the output of `from` into `to`
    fn connect(&self, from: NodeId, to: Endpoint);

    /// Schedule decoding of encoded audio bytes
    fn decode_audio_data(&self, bytes: Vec<u8>, on_done: DecodeCallback);

    /// Move the single listener
    fn set_listener_position(&self, x: f64, y: f64, z: f64);
}

/// Process-wide handle to the audio capability
///
/// Created once at startup and passed explicitly to the state layer.
/// Cloning shares the same engine.
#[derive(Clone, Default)]
pub struct AudioContext {
    engine: Option<Rc<dyn AudioEngine>>,
}

impl AudioContext {
    /// Open a context backed by `engine`
    pub fn open(engine: Rc<dyn AudioEngine>) -> Self {
        log::info!("Audio context opened");
        Self {
            engine: Some(engine),
        }
    }

    /// A context with no engine; every chain built on it is a no-op
    pub fn unavailable() -> Self {
        Self { engine: None }
    }

    /// Release the engine
    ///
    /// Units already built on a clone of this context keep their own handle.
    pub fn close(&mut self) {
        if self.engine.take().is_some() {
            log::info!("Audio context closed");
        }
    }

    pub fn engine(&self) -> Option<&Rc<dyn AudioEngine>> {
        self.engine.as_ref()
    }

    pub fn is_available(&self) -> bool {
        self.engine.is_some()
    }
}

impl fmt::Debug for AudioContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioContext")
            .field("available", &self.is_available())
            .finish()
    }
}
