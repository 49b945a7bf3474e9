//! State Module
//!
//! The copy-on-write audio state threaded through operation chains, and the
//! buffer table that asynchronous decodes write into.

pub mod audio_state;
pub mod buffers;

pub use audio_state::AudioState;
pub use buffers::{BufferMap, BufferStatus, BufferTable};
