//! Playback: one-shot buffer sources routed through the master gain

use std::rc::Rc;

use log::debug;

use super::spatial::{create_master_gain, DEFAULT_VOLUME};
use super::{text, Arg, AudioLifted, AudioUnit};
use crate::combinator::Lifted;
use crate::engine::{AudioContext, AudioEngine, BufferHandle, Endpoint, GainHandle, PannerHandle};
use crate::state::{AudioState, BufferStatus};

use super::names::PLAY;

pub(super) fn register(unit: &AudioUnit) {
    unit.lift(PLAY, play);
}

/// `play(id, location?)`
///
/// Creates the master gain first if the state has none. A sound that is
/// absent, pending or failed is skipped silently.
fn play(state: &AudioState, ctx: &AudioContext, args: &[Arg]) -> AudioLifted {
    let Some(engine) = ctx.engine() else {
        return Lifted::Unchanged;
    };

    let (next, gain) = match state.master_gain() {
        Some(gain) => (None, Rc::clone(gain)),
        None => {
            let mut fork = state.fork();
            let gain = create_master_gain(&**engine, DEFAULT_VOLUME);
            fork.set_master_gain(Rc::clone(&gain));
            (Some(fork), gain)
        }
    };

    let id = text(args, 0).unwrap_or_default();
    match state.buffer_status(id) {
        Some(BufferStatus::Ready(buffer)) => {
            let panner = text(args, 1).and_then(|loc| state.location(loc));
            start_source(&**engine, &buffer, &gain, panner);
        }
        Some(status) => debug!("Not playing '{}': {}", id, status.label()),
        None => debug!("Not playing '{}': no such sound", id),
    }

    match next {
        Some(fork) => Lifted::State(fork),
        None => Lifted::Unchanged,
    }
}

/// source -> [panner ->] gain, then start immediately
fn start_source(
    engine: &dyn AudioEngine,
    buffer: &BufferHandle,
    gain: &GainHandle,
    panner: Option<&PannerHandle>,
) {
    let source = engine.create_buffer_source();
    source.set_buffer(Rc::clone(buffer));

    match panner {
        Some(panner) => {
            engine.connect(source.node_id(), Endpoint::Node(panner.node_id()));
            engine.connect(panner.node_id(), Endpoint::Node(gain.node_id()));
        }
        None => engine.connect(source.node_id(), Endpoint::Node(gain.node_id())),
    }

    debug!("Starting source {} ({} frames)", source.node_id(), buffer.num_frames());
    source.start(0.0);
}

#[cfg(test)]
mod tests {
    use super::super::{audio_unit, names, AudioWrapper};
    use super::*;
    use crate::engine::{DecodedBuffer, GraphEvent, SoftwareEngine};
    use crate::state::BufferMap;

    fn session() -> (Rc<SoftwareEngine>, AudioWrapper) {
        let engine = Rc::new(SoftwareEngine::new());
        let unit = audio_unit(AudioContext::open(engine.clone()));
        (engine, unit.wrap(AudioState::new()))
    }

    fn next(w: &AudioWrapper, name: &str, args: Vec<Arg>) -> AudioWrapper {
        w.call(name, &args).unwrap().into_wrapper().unwrap()
    }

    fn with_buffers(start: &AudioWrapper, entries: Vec<(&str, BufferStatus)>) -> AudioWrapper {
        let map: BufferMap = entries
            .into_iter()
            .map(|(id, status)| (id.to_string(), status))
            .collect();
        next(start, names::SET_AUDIO_BUFFERS, vec![map.into()])
    }

    fn handle() -> BufferHandle {
        Rc::new(DecodedBuffer::new(8000, vec![vec![0.1; 32]]))
    }

    #[test]
    fn test_play_routes_to_master_gain() {
        let (engine, start) = session();
        let h = handle();
        let ready = with_buffers(&start, vec![("ping", BufferStatus::Ready(Rc::clone(&h)))]);

        let played = next(&ready, PLAY, vec!["ping".into()]);
        let gain = played.value().master_gain().unwrap().node_id();

        let playbacks = engine.playbacks();
        assert_eq!(playbacks.len(), 1);
        assert!(Rc::ptr_eq(&playbacks[0].buffer, &h));
        assert_eq!(playbacks[0].when, 0.0);
        assert!(engine
            .connections()
            .contains(&(playbacks[0].source, Endpoint::Node(gain))));
        assert!(ready.value().master_gain().is_none());
    }

    #[test]
    fn test_play_through_panner() {
        let (engine, start) = session();
        let ready = with_buffers(&start, vec![("ping", BufferStatus::Ready(handle()))]);
        let located = next(&ready, names::LOCATE, vec!["left".into(), (-2.0).into()]);

        let played = next(&located, PLAY, vec!["ping".into(), "left".into()]);
        let gain = played.value().master_gain().unwrap().node_id();
        let panner = played.value().location("left").unwrap().node_id();
        let source = engine.playbacks()[0].source;

        let connections = engine.connections();
        assert!(connections.contains(&(source, Endpoint::Node(panner))));
        assert!(connections.contains(&(panner, Endpoint::Node(gain))));
        assert!(!connections.contains(&(source, Endpoint::Node(gain))));
    }

    #[test]
    fn test_unknown_location_falls_back_to_gain() {
        let (engine, start) = session();
        let ready = with_buffers(&start, vec![("ping", BufferStatus::Ready(handle()))]);
        let played = next(&ready, PLAY, vec!["ping".into(), "nowhere".into()]);

        let gain = played.value().master_gain().unwrap().node_id();
        let source = engine.playbacks()[0].source;
        assert!(engine.connections().contains(&(source, Endpoint::Node(gain))));
    }

    #[test]
    fn test_unplayable_sounds_are_skipped() {
        let (engine, start) = session();
        let state = with_buffers(
            &start,
            vec![("wait", BufferStatus::Pending), ("broken", BufferStatus::Failed)],
        );

        let after = next(&state, PLAY, vec!["wait".into()]);
        let after = next(&after, PLAY, vec!["broken".into()]);
        let after = next(&after, PLAY, vec!["missing".into()]);

        assert!(after.value().master_gain().is_some());
        assert!(engine.playbacks().is_empty());
        assert_eq!(
            engine.count_events(|e| matches!(e, GraphEvent::SourceCreated { .. })),
            0
        );
    }

    #[test]
    fn test_gain_created_once_per_chain() {
        let (engine, start) = session();
        let ready = with_buffers(&start, vec![("ping", BufferStatus::Ready(handle()))]);

        let first = next(&ready, PLAY, vec!["ping".into()]);
        let second = next(&first, PLAY, vec!["ping".into()]);

        assert!(second.shares_value(&first));
        assert_eq!(
            engine.count_events(|e| matches!(e, GraphEvent::GainCreated { .. })),
            1
        );
        assert_eq!(
            engine
                .connections()
                .iter()
                .filter(|(_, to)| *to == Endpoint::Destination)
                .count(),
            1
        );
        assert_eq!(engine.playbacks().len(), 2);
    }
}
