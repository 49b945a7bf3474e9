//! Integration Tests
//!
//! End-to-end chains against the software engine, through the public API.

use std::collections::BTreeMap;
use std::rc::Rc;

use approx::assert_relative_eq;

use aural::codec::wav_data_uri;
use aural::engine::{generate_test_tone, Endpoint, GraphEvent};
use aural::{
    audio_unit, start, AudioChain, AudioContext, AudioState, AudioWrapper, BufferStatus,
    DecodedBuffer, SoftwareEngine,
};

fn session() -> (Rc<SoftwareEngine>, AudioWrapper) {
    let engine = Rc::new(SoftwareEngine::new());
    let unit = audio_unit(AudioContext::open(engine.clone()));
    (engine, unit.wrap(AudioState::new()))
}

// === End-to-End ===

#[test]
fn test_add_decode_play() {
    let (engine, state) = session();

    let added = state.add_sound("ping", "data:audio/wav;base64,AAAA");
    assert_eq!(added.audio_buffers().get("ping"), Some(&BufferStatus::Pending));

    let h = Rc::new(DecodedBuffer::new(44100, vec![vec![0.25; 128]]));
    assert!(engine.resolve_next(Ok(Rc::clone(&h))));

    let table = added.value().audio_buffers().unwrap();
    match table.get("ping") {
        Some(BufferStatus::Ready(buffer)) => assert!(Rc::ptr_eq(&buffer, &h)),
        other => panic!("expected ready buffer, got {:?}", other),
    }

    let played = added.play("ping", None);
    let gain = played.value().master_gain().unwrap();

    let playbacks = engine.playbacks();
    assert_eq!(playbacks.len(), 1);
    assert!(Rc::ptr_eq(&playbacks[0].buffer, &h));
    assert_eq!(playbacks[0].when, 0.0);

    let connections = engine.connections();
    assert!(connections.contains(&(gain.node_id(), Endpoint::Destination)));
    assert!(connections.contains(&(playbacks[0].source, Endpoint::Node(gain.node_id()))));
}

#[test]
fn test_decode_failure_marks_failed() {
    let (engine, state) = session();
    let added = state.add_sound("x", "data:audio/wav;base64,AAAA");

    assert!(engine.resolve_next(Err(aural::AuralError::DecodeFailed {
        reason: "corrupt".into()
    })));
    assert_eq!(added.audio_buffers().get("x"), Some(&BufferStatus::Failed));

    added.play("x", None);
    assert!(engine.playbacks().is_empty());
}

#[test]
fn test_real_wav_roundtrip_through_engine() {
    let (engine, state) = session();
    let tone = generate_test_tone(440.0, 0.1, 8000);
    let added = state.add_sound("tone", &wav_data_uri(&tone).unwrap());

    assert_eq!(engine.pump(), 1);
    let status = added.value().buffer_status("tone").unwrap();
    let decoded = status.handle().unwrap();

    assert_eq!(decoded.sample_rate(), 8000);
    assert_eq!(decoded.num_frames(), tone.num_frames());
    assert_relative_eq!(decoded.channel(0)[10], tone.channel(0)[10], epsilon = 1e-3);
}

// === Immutability ===

#[test]
fn test_earlier_states_are_untouched() {
    let (engine, state) = session();
    let tone = wav_data_uri(&generate_test_tone(330.0, 0.05, 8000)).unwrap();

    let s1 = state.add_sound("a", &tone);
    engine.pump();
    let s2 = s1.master_gain(Some(0.5));
    let s3 = s2.locate("left", [-1.0, 0.0, 0.0], None);
    let s4 = s3.remove_sound("a").remove_location("left");
    let louder = s2.master_gain(Some(0.9));

    assert!(state.value().audio_buffers().is_none());
    assert!(s1.value().master_gain().is_none());
    assert!(s2.value().locations().is_none());
    assert!(s3.value().location("left").is_some());
    assert!(s3.value().buffer_status("a").is_some());

    assert!(s4.value().buffer_status("a").is_none());
    assert!(s4.value().location("left").is_none());
    assert!(!s4.audio_buffers().contains_key("a"));

    assert_relative_eq!(s2.value().master_gain().unwrap().gain(), 0.5);
    assert_relative_eq!(louder.value().master_gain().unwrap().gain(), 0.9);
}

#[test]
fn test_get_audio_buffers_returns_fresh_copies() {
    let (_, state) = session();
    let added = state.add_sound("a", "data:audio/wav;base64,AAAA");

    let mut first = added.audio_buffers();
    let second = added.audio_buffers();
    assert_eq!(first, second);

    first.clear();
    assert_eq!(added.audio_buffers().len(), 1);
}

// === Spatial ===

#[test]
fn test_positional_playback() {
    let (engine, state) = session();
    let tone = wav_data_uri(&generate_test_tone(500.0, 0.05, 8000)).unwrap();

    let loaded = state.sounds(BTreeMap::from([("blip".to_string(), tone)]));
    engine.pump();

    let scene = loaded
        .master_gain(Some(0.8))
        .locate("door", [2.0, 0.0, -1.0], None)
        .locate("door", [3.0, 0.0, -1.0], None)
        .listen_at([0.0, 1.0, 0.0])
        .play("blip", Some("door"));

    let gain = scene.value().master_gain().unwrap();
    let panner = scene.value().location("door").unwrap();
    assert_relative_eq!(gain.gain(), 0.8);
    assert_eq!(panner.position(), [3.0, 0.0, -1.0]);
    assert_eq!(engine.listener_position(), [0.0, 1.0, 0.0]);
    assert_eq!(
        engine.count_events(|e| matches!(e, GraphEvent::PannerCreated { .. })),
        1
    );

    let source = engine.playbacks()[0].source;
    let connections = engine.connections();
    assert!(connections.contains(&(source, Endpoint::Node(panner.node_id()))));
    assert!(connections.contains(&(panner.node_id(), Endpoint::Node(gain.node_id()))));
}

// === Degradation ===

#[test]
fn test_unavailable_context_disables_everything() {
    let unit = audio_unit(AudioContext::unavailable());
    let state = unit.wrap(AudioState::new());

    let after = state
        .add_sound("a", "data:audio/wav;base64,AAAA")
        .master_gain(None)
        .locate("x", [1.0, 1.0, 1.0], None)
        .play("a", None);

    assert!(!after.is_active());
    assert!(after.shares_value(&state));
    assert!(after.audio_buffers().is_empty());
}

#[test]
fn test_closed_context_disables_new_chains() {
    let engine = Rc::new(SoftwareEngine::new());
    let mut ctx = AudioContext::open(engine.clone());
    ctx.close();

    let unit = audio_unit(ctx);
    let after = unit.wrap(AudioState::new()).master_gain(None);
    assert!(!after.is_active());
    assert!(engine.events().is_empty());
}

#[test]
fn test_absent_initial_state_disables_chain() {
    let engine = Rc::new(SoftwareEngine::new());
    let unit = audio_unit(AudioContext::open(engine.clone()));

    let chain = start(&unit, None).master_gain(None);
    assert!(!chain.is_active());
    assert!(engine.events().is_empty());
}
