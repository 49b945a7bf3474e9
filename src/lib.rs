//! Aural - Functional Positional Audio
//!
//! Aural wraps a positional audio engine behind chains of immutable states.
//! Every operation takes the current [`AudioState`] and hands back a new one,
//! so earlier states stay valid and can be branched from.
//!
//! # Architecture
//!
//! - `combinator`: generic wrapper/registry machinery, no audio knowledge
//! - `engine`: the audio capability ([`AudioEngine`]) and a software backend
//! - `state`: copy-on-write audio state and the shared buffer table
//! - `ops`: the named audio operations registered on the combinator
//! - `chain`: typed methods over the named operations
//!
//! Sounds are decoded asynchronously. A buffer entry reads `Pending` until the
//! engine reports back, then flips to `Ready` or `Failed` in every state that
//! shares the same buffer table.

pub mod bank;
pub mod chain;
pub mod cli;
pub mod codec;
pub mod combinator;
pub mod config;
pub mod engine;
pub mod error;
pub mod ops;
pub mod state;

pub use chain::AudioChain;
pub use config::AudioConfig;
pub use engine::{AudioContext, AudioEngine, BufferHandle, DecodedBuffer, SoftwareEngine};
pub use error::{AuralError, Result};
pub use ops::{audio_unit, start, Arg, AudioUnit, AudioWrapper};
pub use state::{AudioState, BufferMap, BufferStatus};
