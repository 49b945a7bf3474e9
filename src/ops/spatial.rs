//! Spatial graph operations: master gain, panner locations, listener

use std::rc::Rc;

use log::{info, warn};
use serde_json::{Map, Value};

use super::{number, options, text, Arg, AudioLifted, AudioReply, AudioUnit, AudioWrapper};
use crate::combinator::{Lifted, Reply};
use crate::engine::{AudioContext, AudioEngine, Endpoint, GainHandle, PannerHandle};
use crate::state::AudioState;

use super::names::{CONE, LISTEN_AT, LOCATE, MASTER_GAIN, ORIENT, REMOVE_LOCATION};

/// Master gain level when none is given
pub const DEFAULT_VOLUME: f32 = 1.0;

pub(super) fn register(unit: &AudioUnit) {
    unit.lift(MASTER_GAIN, master_gain)
        .lift(LOCATE, locate)
        .lift(REMOVE_LOCATION, remove_location)
        .method(LISTEN_AT, listen_at)
        .lift(ORIENT, orient)
        .lift(CONE, cone);
}

/// Create a gain node at `volume` and route it to the output
pub(super) fn create_master_gain(engine: &dyn AudioEngine, volume: f32) -> GainHandle {
    let gain = engine.create_gain();
    gain.set_gain(volume);
    engine.connect(gain.node_id(), Endpoint::Destination);
    info!("Master gain {} connected at {:.2}", gain.node_id(), volume);
    gain
}

/// `master_gain(volume = 1.0)`
///
/// Always creates a fresh gain node. Earlier states keep theirs at its own
/// level.
fn master_gain(state: &AudioState, ctx: &AudioContext, args: &[Arg]) -> AudioLifted {
    let Some(engine) = ctx.engine() else {
        return Lifted::Unchanged;
    };
    let volume = number(args, 0, DEFAULT_VOLUME as f64) as f32;

    let mut next = state.fork();
    next.set_master_gain(create_master_gain(&**engine, volume));
    Lifted::State(next)
}

/// `locate(id, x = 0, y = 0, z = 0, options?)`
fn locate(state: &AudioState, ctx: &AudioContext, args: &[Arg]) -> AudioLifted {
    let Some(engine) = ctx.engine() else {
        return Lifted::Unchanged;
    };
    let Some(id) = text(args, 0) else {
        return Lifted::Unchanged;
    };

    let mut next = state.fork();
    let panner = match next.location(id) {
        Some(existing) => Rc::clone(existing),
        None => {
            let created = engine.create_panner();
            next.locations_mut().insert(id.to_string(), Rc::clone(&created));
            created
        }
    };

    panner.set_position(number(args, 1, 0.0), number(args, 2, 0.0), number(args, 3, 0.0));
    if let Some(overrides) = options(args, 4) {
        apply_options(&panner, overrides);
    }
    Lifted::State(next)
}

/// Apply named overrides; names the panner rejects are logged and skipped
pub(super) fn apply_options(panner: &PannerHandle, overrides: &Map<String, Value>) {
    for (name, value) in overrides {
        if !panner.set_option(name, value) {
            warn!("Ignoring panner option {}={}", name, value);
        }
    }
}

fn remove_location(state: &AudioState, _ctx: &AudioContext, args: &[Arg]) -> AudioLifted {
    let Some(id) = text(args, 0) else {
        return Lifted::Unchanged;
    };

    let mut next = state.fork();
    next.remove_location(id);
    Lifted::State(next)
}

/// `listen_at(x = 0, y = 0, z = 0)`
///
/// Moves the engine's single listener. The listener lives in the shared
/// context, not in the state, so the same wrapper is returned.
fn listen_at(wrapper: &AudioWrapper, args: &[Arg]) -> AudioReply {
    let _ = wrapper.bind(
        |_, ctx, args| {
            if let Some(engine) = ctx.engine() {
                engine.set_listener_position(
                    number(args, 0, 0.0),
                    number(args, 1, 0.0),
                    number(args, 2, 0.0),
                );
            }
        },
        args,
    );
    Reply::Wrapped(wrapper.clone())
}

// `orient` and `cone` look panners up in the `panners` field, which no
// operation fills in. They are kept as read-only lookups and in practice
// never find a panner.

/// `orient(id, x = 0, y = 0, z = 0)`
fn orient(state: &AudioState, _ctx: &AudioContext, args: &[Arg]) -> AudioLifted {
    if let Some(panner) = text(args, 0).and_then(|id| state.panner(id)) {
        panner.set_orientation(number(args, 1, 0.0), number(args, 2, 0.0), number(args, 3, 0.0));
    }
    Lifted::Unchanged
}

/// `cone(id, inner = 360, outer = 360, outer_gain = 0)`
fn cone(state: &AudioState, _ctx: &AudioContext, args: &[Arg]) -> AudioLifted {
    if let Some(panner) = text(args, 0).and_then(|id| state.panner(id)) {
        panner.set_cone(
            number(args, 1, 360.0),
            number(args, 2, 360.0),
            number(args, 3, 0.0),
        );
    }
    Lifted::Unchanged
}
