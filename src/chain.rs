//! Typed chaining over the audio wrapper
//!
//! [`AudioChain`] gives each registered audio operation a method with a
//! concrete signature. Every method still dispatches by name through the
//! unit's registry, so re-registering an operation changes what the method
//! does.
//!
//! # Example
//! ```
//! use std::rc::Rc;
//! use aural::{audio_unit, AudioChain, AudioContext, AudioState, SoftwareEngine};
//!
//! let engine = Rc::new(SoftwareEngine::new());
//! let unit = audio_unit(AudioContext::open(engine.clone()));
//!
//! let chain = unit
//!     .wrap(AudioState::new())
//!     .master_gain(Some(0.8))
//!     .locate("door", [2.0, 0.0, -1.0], None)
//!     .listen_at([0.0, 0.0, 0.0]);
//!
//! assert!(chain.value().location("door").is_some());
//! ```

use std::collections::BTreeMap;

use log::error;
use serde_json::{Map, Value};

use crate::combinator::Reply;
use crate::ops::{names, Arg, AudioWrapper};
use crate::state::BufferMap;

/// Named audio operations as methods
pub trait AudioChain: Sized {
    fn set_audio_buffers(&self, buffers: BufferMap) -> Self;

    /// Copy of the current buffer table (empty on a disabled chain)
    fn audio_buffers(&self) -> BufferMap;

    fn add_sound(&self, id: &str, payload: &str) -> Self;
    fn sounds(&self, sounds: BTreeMap<String, String>) -> Self;
    fn remove_sound(&self, id: &str) -> Self;

    /// `None` means the default level of 1.0
    fn master_gain(&self, volume: Option<f32>) -> Self;

    fn locate(&self, id: &str, position: [f64; 3], options: Option<Map<String, Value>>) -> Self;
    fn remove_location(&self, id: &str) -> Self;
    fn listen_at(&self, position: [f64; 3]) -> Self;
    fn orient(&self, id: &str, direction: [f64; 3]) -> Self;
    fn cone(&self, id: &str, inner_angle: f64, outer_angle: f64, outer_gain: f64) -> Self;

    fn play(&self, id: &str, location: Option<&str>) -> Self;
}

impl AudioChain for AudioWrapper {
    fn set_audio_buffers(&self, buffers: BufferMap) -> Self {
        then(self, names::SET_AUDIO_BUFFERS, vec![buffers.into()])
    }

    fn audio_buffers(&self) -> BufferMap {
        match self.call(names::GET_AUDIO_BUFFERS, &[]) {
            Ok(Reply::Value(buffers)) => buffers,
            Ok(Reply::Wrapped(_)) => BufferMap::new(),
            Err(e) => {
                error!("{}", e);
                BufferMap::new()
            }
        }
    }

    fn add_sound(&self, id: &str, payload: &str) -> Self {
        then(self, names::ADD_SOUND, vec![id.into(), payload.into()])
    }

    fn sounds(&self, sounds: BTreeMap<String, String>) -> Self {
        then(self, names::SOUNDS, vec![sounds.into()])
    }

    fn remove_sound(&self, id: &str) -> Self {
        then(self, names::REMOVE_SOUND, vec![id.into()])
    }

    fn master_gain(&self, volume: Option<f32>) -> Self {
        then(self, names::MASTER_GAIN, volume.map(Arg::from).into_iter().collect())
    }

    fn locate(&self, id: &str, position: [f64; 3], options: Option<Map<String, Value>>) -> Self {
        let mut args: Vec<Arg> = vec![id.into()];
        args.extend(position.map(Arg::from));
        args.extend(options.map(Arg::from));
        then(self, names::LOCATE, args)
    }

    fn remove_location(&self, id: &str) -> Self {
        then(self, names::REMOVE_LOCATION, vec![id.into()])
    }

    fn listen_at(&self, position: [f64; 3]) -> Self {
        then(self, names::LISTEN_AT, position.map(Arg::from).to_vec())
    }

    fn orient(&self, id: &str, direction: [f64; 3]) -> Self {
        let mut args: Vec<Arg> = vec![id.into()];
        args.extend(direction.map(Arg::from));
        then(self, names::ORIENT, args)
    }

    fn cone(&self, id: &str, inner_angle: f64, outer_angle: f64, outer_gain: f64) -> Self {
        then(
            self,
            names::CONE,
            vec![id.into(), inner_angle.into(), outer_angle.into(), outer_gain.into()],
        )
    }

    fn play(&self, id: &str, location: Option<&str>) -> Self {
        let mut args: Vec<Arg> = vec![id.into()];
        args.extend(location.map(Arg::from));
        then(self, names::PLAY, args)
    }
}

/// Call `name` and keep chaining
///
/// Operations that answer with a raw value, and unregistered names, leave
/// the chain where it was.
fn then(wrapper: &AudioWrapper, name: &str, args: Vec<Arg>) -> AudioWrapper {
    match wrapper.call(name, &args) {
        Ok(Reply::Wrapped(next)) => next,
        Ok(Reply::Value(_)) => wrapper.clone(),
        Err(e) => {
            error!("{}", e);
            wrapper.clone()
        }
    }
}
