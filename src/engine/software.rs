//! Software Audio Engine
//!
//! An in-process [`AudioEngine`] that builds the graph in memory and records
//! every event instead of driving a sound card. Decoding is real (WAV via
//! `hound`) but deferred: jobs queue up until [`SoftwareEngine::pump`] or
//! [`SoftwareEngine::resolve_next`] is called, which plays the role of the
//! event loop turning over.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use log::{debug, warn};
use serde_json::{Map, Value};

use super::{
    AudioEngine, AudioNode, BufferHandle, DecodeCallback, Endpoint, GainHandle, GainNode, NodeId,
    PannerHandle, PannerNode, SourceHandle, SourceNode,
};
use crate::engine::io::decode_wav;
use crate::error::Result;

/// Something that happened to the graph
#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    GainCreated { id: NodeId },
    PannerCreated { id: NodeId },
    SourceCreated { id: NodeId },
    Connected { from: NodeId, to: Endpoint },
    GainChanged { id: NodeId, value: f32 },
    SourceStarted { id: NodeId, when: f64, frames: usize },
    ListenerMoved { position: [f64; 3] },
    DecodeScheduled { job: usize, bytes: usize },
    DecodeFinished { job: usize, ok: bool },
}

/// A buffer handed to a started source
#[derive(Debug, Clone)]
pub struct Playback {
    pub source: NodeId,
    pub buffer: BufferHandle,
    pub when: f64,
}

type EventLog = Rc<RefCell<Vec<GraphEvent>>>;

struct PendingDecode {
    job: usize,
    bytes: Vec<u8>,
    on_done: DecodeCallback,
}

/// Recording, single-threaded engine
pub struct SoftwareEngine {
    next_id: Cell<NodeId>,
    next_job: Cell<usize>,
    events: EventLog,
    playbacks: Rc<RefCell<Vec<Playback>>>,
    decodes: RefCell<VecDeque<PendingDecode>>,
    listener: Cell<[f64; 3]>,
}

impl Default for SoftwareEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftwareEngine {
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(1),
            next_job: Cell::new(0),
            events: Rc::new(RefCell::new(Vec::new())),
            playbacks: Rc::new(RefCell::new(Vec::new())),
            decodes: RefCell::new(VecDeque::new()),
            listener: Cell::new([0.0; 3]),
        }
    }

    fn allocate_id(&self) -> NodeId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    fn record(&self, event: GraphEvent) {
        self.events.borrow_mut().push(event);
    }

    // ========================================================================
    // Decode queue
    // ========================================================================

    /// Number of decodes waiting to complete
    pub fn pending_decodes(&self) -> usize {
        self.decodes.borrow().len()
    }

    /// Run every queued decode, oldest first
    ///
    /// Returns the number of decodes completed.
    pub fn pump(&self) -> usize {
        let mut completed = 0;
        while let Some(job) = self.take_next() {
            let result = decode_wav(&job.bytes).map(Rc::new);
            self.finish(job, result);
            completed += 1;
        }
        completed
    }

    /// Complete the oldest queued decode with a given result
    ///
    /// Returns `false` if nothing was queued.
    pub fn resolve_next(&self, result: Result<BufferHandle>) -> bool {
        match self.take_next() {
            Some(job) => {
                self.finish(job, result);
                true
            }
            None => false,
        }
    }

    fn take_next(&self) -> Option<PendingDecode> {
        // Borrow released before the callback runs; callbacks may schedule more work
        self.decodes.borrow_mut().pop_front()
    }

    fn finish(&self, job: PendingDecode, result: Result<BufferHandle>) {
        if let Err(e) = &result {
            warn!("Decode job {} failed: {}", job.job, e);
        }
        self.record(GraphEvent::DecodeFinished {
            job: job.job,
            ok: result.is_ok(),
        });
        (job.on_done)(result);
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Every event recorded so far, in order
    pub fn events(&self) -> Vec<GraphEvent> {
        self.events.borrow().clone()
    }

    /// Distinct connections, in the order first made
    pub fn connections(&self) -> Vec<(NodeId, Endpoint)> {
        let mut seen = Vec::new();
        for event in self.events.borrow().iter() {
            if let GraphEvent::Connected { from, to } = event {
                if !seen.contains(&(*from, *to)) {
                    seen.push((*from, *to));
                }
            }
        }
        seen
    }

    /// Count events matching a predicate
    pub fn count_events(&self, pred: impl Fn(&GraphEvent) -> bool) -> usize {
        self.events.borrow().iter().filter(|e| pred(e)).count()
    }

    /// Every buffer started so far
    pub fn playbacks(&self) -> Vec<Playback> {
        self.playbacks.borrow().clone()
    }

    pub fn listener_position(&self) -> [f64; 3] {
        self.listener.get()
    }
}

impl AudioEngine for SoftwareEngine {
    fn create_gain(&self) -> GainHandle {
        let id = self.allocate_id();
        debug!("Created gain node {}", id);
        self.record(GraphEvent::GainCreated { id });
        Rc::new(SoftwareGain {
            id,
            gain: Cell::new(1.0),
            events: Rc::clone(&self.events),
        })
    }

    fn create_panner(&self) -> PannerHandle {
        let id = self.allocate_id();
        debug!("Created panner node {}", id);
        self.record(GraphEvent::PannerCreated { id });
        Rc::new(SoftwarePanner::new(id))
    }

    fn create_buffer_source(&self) -> SourceHandle {
        let id = self.allocate_id();
        debug!("Created buffer source {}", id);
        self.record(GraphEvent::SourceCreated { id });
        Rc::new(SoftwareSource {
            id,
            buffer: RefCell::new(None),
            started: Cell::new(false),
            events: Rc::clone(&self.events),
            playbacks: Rc::clone(&self.playbacks),
        })
    }

    fn connect(&self, from: NodeId, to: Endpoint) {
        debug!("Connected {} -> {:?}", from, to);
        self.record(GraphEvent::Connected { from, to });
    }

    fn decode_audio_data(&self, bytes: Vec<u8>, on_done: DecodeCallback) {
        let job = self.next_job.get();
        self.next_job.set(job + 1);
        self.record(GraphEvent::DecodeScheduled {
            job,
            bytes: bytes.len(),
        });
        self.decodes.borrow_mut().push_back(PendingDecode {
            job,
            bytes,
            on_done,
        });
    }

    fn set_listener_position(&self, x: f64, y: f64, z: f64) {
        self.listener.set([x, y, z]);
        self.record(GraphEvent::ListenerMoved {
            position: [x, y, z],
        });
    }
}

// ============================================================================
// Nodes
// ============================================================================

#[derive(Debug)]
struct SoftwareGain {
    id: NodeId,
    gain: Cell<f32>,
    events: EventLog,
}

impl AudioNode for SoftwareGain {
    fn node_id(&self) -> NodeId {
        self.id
    }
}

impl GainNode for SoftwareGain {
    fn set_gain(&self, value: f32) {
        self.gain.set(value);
        self.events.borrow_mut().push(GraphEvent::GainChanged { id: self.id, value });
    }

    fn gain(&self) -> f32 {
        self.gain.get()
    }
}

/// Panner options understood by [`SoftwarePanner::set_option`]
const NUMERIC_OPTIONS: &[&str] = &[
    "refDistance",
    "maxDistance",
    "rolloffFactor",
    "coneInnerAngle",
    "coneOuterAngle",
    "coneOuterGain",
];
const PANNING_MODELS: &[&str] = &["equalpower", "HRTF"];
const DISTANCE_MODELS: &[&str] = &["linear", "inverse", "exponential"];

#[derive(Debug)]
pub struct SoftwarePanner {
    id: NodeId,
    position: Cell<[f64; 3]>,
    orientation: Cell<[f64; 3]>,
    options: RefCell<Map<String, Value>>,
}

impl SoftwarePanner {
    fn new(id: NodeId) -> Self {
        let mut options = Map::new();
        options.insert("panningModel".into(), Value::from("equalpower"));
        options.insert("distanceModel".into(), Value::from("inverse"));
        options.insert("refDistance".into(), Value::from(1.0));
        options.insert("maxDistance".into(), Value::from(10000.0));
        options.insert("rolloffFactor".into(), Value::from(1.0));
        options.insert("coneInnerAngle".into(), Value::from(360.0));
        options.insert("coneOuterAngle".into(), Value::from(360.0));
        options.insert("coneOuterGain".into(), Value::from(0.0));

        Self {
            id,
            position: Cell::new([0.0; 3]),
            orientation: Cell::new([1.0, 0.0, 0.0]),
            options: RefCell::new(options),
        }
    }
}

impl AudioNode for SoftwarePanner {
    fn node_id(&self) -> NodeId {
        self.id
    }
}

impl PannerNode for SoftwarePanner {
    fn set_position(&self, x: f64, y: f64, z: f64) {
        self.position.set([x, y, z]);
    }

    fn position(&self) -> [f64; 3] {
        self.position.get()
    }

    fn set_orientation(&self, x: f64, y: f64, z: f64) {
        self.orientation.set([x, y, z]);
    }

    fn orientation(&self) -> [f64; 3] {
        self.orientation.get()
    }

    fn set_cone(&self, inner_angle: f64, outer_angle: f64, outer_gain: f64) {
        let mut options = self.options.borrow_mut();
        options.insert("coneInnerAngle".into(), Value::from(inner_angle));
        options.insert("coneOuterAngle".into(), Value::from(outer_angle));
        options.insert("coneOuterGain".into(), Value::from(outer_gain));
    }

    fn set_option(&self, name: &str, value: &Value) -> bool {
        let accepted = match name {
            n if NUMERIC_OPTIONS.contains(&n) => value.as_f64().is_some_and(f64::is_finite),
            "panningModel" => value.as_str().is_some_and(|v| PANNING_MODELS.contains(&v)),
            "distanceModel" => value.as_str().is_some_and(|v| DISTANCE_MODELS.contains(&v)),
            _ => false,
        };

        if accepted {
            self.options.borrow_mut().insert(name.to_string(), value.clone());
        }
        accepted
    }

    fn option(&self, name: &str) -> Option<Value> {
        self.options.borrow().get(name).cloned()
    }
}

#[derive(Debug)]
struct SoftwareSource {
    id: NodeId,
    buffer: RefCell<Option<BufferHandle>>,
    started: Cell<bool>,
    events: EventLog,
    playbacks: Rc<RefCell<Vec<Playback>>>,
}

impl AudioNode for SoftwareSource {
    fn node_id(&self) -> NodeId {
        self.id
    }
}

impl SourceNode for SoftwareSource {
    fn set_buffer(&self, buffer: BufferHandle) {
        *self.buffer.borrow_mut() = Some(buffer);
    }

    fn start(&self, when: f64) {
        if self.started.replace(true) {
            warn!("Buffer source {} started twice; ignoring", self.id);
            return;
        }

        let buffer = self.buffer.borrow().clone();
        let frames = buffer.as_ref().map_or(0, |b| b.num_frames());
        self.events.borrow_mut().push(GraphEvent::SourceStarted {
            id: self.id,
            when,
            frames,
        });

        if let Some(buffer) = buffer {
            self.playbacks.borrow_mut().push(Playback {
                source: self.id,
                buffer,
                when,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{encode_wav, generate_test_tone, DecodedBuffer};
    use crate::error::AuralError;

    #[test]
    fn test_decodes_wait_for_pump() {
        let engine = SoftwareEngine::new();
        let result = Rc::new(RefCell::new(None));

        let slot = Rc::clone(&result);
        let bytes = encode_wav(&generate_test_tone(440.0, 0.05, 8000), 16).unwrap();
        engine.decode_audio_data(bytes, Box::new(move |r: Result<BufferHandle>| {
            *slot.borrow_mut() = Some(r.is_ok())
        }));

        assert_eq!(engine.pending_decodes(), 1);
        assert!(result.borrow().is_none());

        assert_eq!(engine.pump(), 1);
        assert_eq!(*result.borrow(), Some(true));
        assert_eq!(engine.pending_decodes(), 0);
    }

    #[test]
    fn test_pump_reports_failures() {
        let engine = SoftwareEngine::new();
        let result = Rc::new(Cell::new(None));

        let slot = Rc::clone(&result);
        engine.decode_audio_data(
            vec![1, 2, 3],
            Box::new(move |r: Result<BufferHandle>| slot.set(Some(r.is_ok()))),
        );
        engine.pump();

        assert_eq!(result.get(), Some(false));
        assert_eq!(
            engine.count_events(|e| matches!(e, GraphEvent::DecodeFinished { ok: false, .. })),
            1
        );
    }

    #[test]
    fn test_resolve_next_injects_result() {
        let engine = SoftwareEngine::new();
        assert!(!engine.resolve_next(Err(AuralError::DecodeFailed {
            reason: "nothing queued".into()
        })));

        let handle = Rc::new(DecodedBuffer::new(8000, vec![vec![0.0; 8]]));
        let received = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&received);
        engine.decode_audio_data(Vec::new(), Box::new(move |r: Result<BufferHandle>| {
            *slot.borrow_mut() = r.ok()
        }));

        assert!(engine.resolve_next(Ok(Rc::clone(&handle))));
        assert!(Rc::ptr_eq(received.borrow().as_ref().unwrap(), &handle));
    }

    #[test]
    fn test_connections_are_deduplicated() {
        let engine = SoftwareEngine::new();
        let gain = engine.create_gain();
        engine.connect(gain.node_id(), Endpoint::Destination);
        engine.connect(gain.node_id(), Endpoint::Destination);
        assert_eq!(engine.connections(), vec![(gain.node_id(), Endpoint::Destination)]);
    }

    #[test]
    fn test_panner_options() {
        let panner = SoftwarePanner::new(7);
        assert!(panner.set_option("refDistance", &Value::from(2.5)));
        assert!(panner.set_option("panningModel", &Value::from("HRTF")));
        assert!(!panner.set_option("panningModel", &Value::from("surround")));
        assert!(!panner.set_option("color", &Value::from("blue")));

        assert_eq!(panner.option("refDistance"), Some(Value::from(2.5)));
        assert_eq!(panner.option("panningModel"), Some(Value::from("HRTF")));
        assert_eq!(panner.option("color"), None);

        panner.set_cone(90.0, 180.0, 0.25);
        assert_eq!(panner.option("coneOuterGain"), Some(Value::from(0.25)));
    }

    #[test]
    fn test_source_starts_once() {
        let engine = SoftwareEngine::new();
        let source = engine.create_buffer_source();
        source.set_buffer(Rc::new(DecodedBuffer::new(8000, vec![vec![0.1; 4]])));
        source.start(0.0);
        source.start(0.0);

        assert_eq!(engine.playbacks().len(), 1);
        assert_eq!(
            engine.count_events(|e| matches!(e, GraphEvent::SourceStarted { frames: 4, .. })),
            1
        );
    }

    #[test]
    fn test_listener_position() {
        let engine = SoftwareEngine::new();
        engine.set_listener_position(1.0, 2.0, 3.0);
        assert_eq!(engine.listener_position(), [1.0, 2.0, 3.0]);
    }
}
