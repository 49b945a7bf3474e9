//! Buffer lifecycle operations
//!
//! Per sound id: absent -> pending -> ready | failed. Each call that
//! schedules decodes forks the state once and binds every callback of the
//! batch to that fork's table.

use log::{debug, warn};

use super::{buffer_map, sounds, text, Arg, AudioLifted, AudioUnit};
use crate::codec::payload_bytes;
use crate::combinator::Lifted;
use crate::engine::{AudioContext, BufferHandle};
use crate::error::Result;
use crate::state::{AudioState, BufferStatus, BufferTable};

use super::names::{ADD_SOUND, GET_AUDIO_BUFFERS, REMOVE_SOUND, SET_AUDIO_BUFFERS, SOUNDS};

pub(super) fn register(unit: &AudioUnit) {
    unit.lift(SET_AUDIO_BUFFERS, set_audio_buffers)
        .lift_value(GET_AUDIO_BUFFERS, |state, _, _| {
            state
                .audio_buffers()
                .map(BufferTable::snapshot)
                .unwrap_or_default()
        })
        .lift(ADD_SOUND, add_sound)
        .lift(SOUNDS, add_sounds)
        .lift(REMOVE_SOUND, remove_sound);
}

/// Replace the buffer table wholesale; nothing is decoded
fn set_audio_buffers(state: &AudioState, _ctx: &AudioContext, args: &[Arg]) -> AudioLifted {
    let mut next = state.fork();
    let map = buffer_map(args, 0).cloned().unwrap_or_default();
    next.set_audio_buffers(BufferTable::from_map(map));
    Lifted::State(next)
}

/// `add_sound(id, payload)`
fn add_sound(state: &AudioState, ctx: &AudioContext, args: &[Arg]) -> AudioLifted {
    let Some(id) = text(args, 0) else {
        return Lifted::Unchanged;
    };

    let mut next = state.fork();
    let table = next.audio_buffers_or_default().clone();
    schedule_decode(ctx, &table, id, text(args, 1));
    Lifted::State(next)
}

/// `sounds({id: payload, ...})`
fn add_sounds(state: &AudioState, ctx: &AudioContext, args: &[Arg]) -> AudioLifted {
    let Some(batch) = sounds(args, 0) else {
        return Lifted::Unchanged;
    };

    let mut next = state.fork();
    let table = next.audio_buffers_or_default().clone();
    for (id, payload) in batch {
        schedule_decode(ctx, &table, id, Some(payload));
    }
    Lifted::State(next)
}

fn remove_sound(state: &AudioState, _ctx: &AudioContext, args: &[Arg]) -> AudioLifted {
    let Some(id) = text(args, 0) else {
        return Lifted::Unchanged;
    };

    let next = state.fork();
    if let Some(table) = next.audio_buffers() {
        table.remove(id);
    }
    Lifted::State(next)
}

/// Mark `id` pending in `table` and start decoding its payload
///
/// The callback keeps an alias of `table`, so the outcome lands in this
/// exact table whenever the engine gets round to it.
fn schedule_decode(ctx: &AudioContext, table: &BufferTable, id: &str, payload: Option<&str>) {
    table.set(id, BufferStatus::Pending);

    let Some(engine) = ctx.engine() else {
        warn!("No audio engine to decode sound '{}'", id);
        table.set(id, BufferStatus::Failed);
        return;
    };

    let bytes = match payload.map(payload_bytes) {
        Some(Ok(bytes)) => bytes,
        Some(Err(e)) => {
            warn!("Sound '{}' rejected: {}", id, e);
            table.set(id, BufferStatus::Failed);
            return;
        }
        None => {
            warn!("Sound '{}' has no payload", id);
            table.set(id, BufferStatus::Failed);
            return;
        }
    };

    let target = table.clone();
    let id = id.to_string();
    engine.decode_audio_data(
        bytes,
        Box::new(move |result: Result<BufferHandle>| match result {
            Ok(buffer) => {
                debug!("Decoded sound '{}' ({} frames)", id, buffer.num_frames());
                target.set(id, BufferStatus::Ready(buffer));
            }
            Err(e) => {
                warn!("Failed to decode sound '{}': {}", id, e);
                target.set(id, BufferStatus::Failed);
            }
        }),
    );
}
