//! CLI Command Implementations
//!
//! Every command runs against a fresh [`SoftwareEngine`], drains its decode
//! queue, and prints what ended up in the buffer table and the graph.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::{info, warn};
use serde_json::{Map, Value};

use crate::bank::scan_dir;
use crate::chain::AudioChain;
use crate::codec::file_data_uri;
use crate::config::AudioConfig;
use crate::engine::{AudioContext, GraphEvent, SoftwareEngine};
use crate::error::Result;
use crate::ops::{audio_unit, AudioWrapper};
use crate::state::{AudioState, BufferStatus};

/// Location id used by `play --at`
const EMITTER: &str = "emitter";

/// A software engine plus a chain started on it
struct Session {
    engine: Rc<SoftwareEngine>,
    chain: AudioWrapper,
}

impl Session {
    fn open() -> Self {
        let engine = Rc::new(SoftwareEngine::new());
        let unit = audio_unit(AudioContext::open(engine.clone()));
        let chain = unit.wrap(AudioState::new());
        Self { engine, chain }
    }

    /// Load sounds and wait for every decode to finish
    fn load(&mut self, sounds: BTreeMap<String, String>) {
        self.chain = self.chain.sounds(sounds);
        let decoded = self.engine.pump();
        info!("Completed {} decode(s)", decoded);
    }

    fn report(&self) {
        print_buffers(&self.chain);
        print_graph(&self.engine);
    }
}

/// Load files as sounds and play each one.
///
/// With `at`, every sound plays through one panner placed there.
pub fn play(
    files: &[PathBuf],
    at: Option<[f64; 3]>,
    listener: Option<[f64; 3]>,
    volume: f32,
) -> Result<()> {
    play_session(files, at, listener, volume)?.report();
    Ok(())
}

fn play_session(
    files: &[PathBuf],
    at: Option<[f64; 3]>,
    listener: Option<[f64; 3]>,
    volume: f32,
) -> Result<Session> {
    let mut sounds = BTreeMap::new();
    for file in files {
        let id = sound_id(file);
        if sounds.contains_key(&id) {
            warn!("Skipping {}: sound '{}' already loaded", file.display(), id);
            continue;
        }
        info!("Loading '{}' from {}", id, file.display());
        sounds.insert(id, file_data_uri(file)?);
    }

    let mut session = Session::open();
    let ids: Vec<String> = sounds.keys().cloned().collect();
    session.load(sounds);

    let mut chain = session.chain.master_gain(Some(volume));
    if let Some(position) = listener {
        chain = chain.listen_at(position);
    }
    if let Some(position) = at {
        chain = chain.locate(EMITTER, position, None);
    }

    for id in &ids {
        chain = chain.play(id, at.map(|_| EMITTER));
    }

    session.chain = chain;
    Ok(session)
}

/// Scan a directory and report the decode status of every sound.
pub fn bank(dir: &Path) -> Result<()> {
    info!("Scanning {}", dir.display());

    let sounds = scan_dir(dir)?;
    if sounds.is_empty() {
        warn!("No WAV files found in {}", dir.display());
    }

    let mut session = Session::open();
    session.load(sounds);

    print_buffers(&session.chain);
    Ok(())
}

/// Validate a config file, or write the default one with `init`.
pub fn config(path: &Path, init: bool) -> Result<()> {
    if init {
        AudioConfig::default().save(path)?;
        println!("Config written: {}", path.display());
        return Ok(());
    }

    let config = AudioConfig::load(path)?;
    println!("Config OK: {}", path.display());
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// Build a session from a config file and play every ready sound once.
pub fn run(path: &Path) -> Result<()> {
    let config = AudioConfig::load(path)?;
    run_session(&config)?.report();
    Ok(())
}

fn run_session(config: &AudioConfig) -> Result<Session> {
    let mut session = Session::open();
    session.load(config.sound_payloads()?);

    let mut chain = session
        .chain
        .master_gain(Some(config.master_volume))
        .listen_at(config.listener);

    for (id, position) in &config.locations {
        chain = chain.locate(id, *position, panner_options(&config.panner_defaults));
    }

    for id in config.sounds.keys() {
        let location = config.locations.contains_key(id).then_some(id.as_str());
        chain = chain.play(id, location);
    }

    session.chain = chain;
    Ok(session)
}

/// Sound id for a file: its stem
fn sound_id(file: &Path) -> String {
    file.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("sound")
        .to_string()
}

fn panner_options(defaults: &Map<String, Value>) -> Option<Map<String, Value>> {
    (!defaults.is_empty()).then(|| defaults.clone())
}

fn print_buffers(chain: &AudioWrapper) {
    let buffers = chain.audio_buffers();
    let mut ids: Vec<&String> = buffers.keys().collect();
    ids.sort();

    println!("Sounds ({}):", ids.len());
    for id in ids {
        match &buffers[id] {
            BufferStatus::Ready(buffer) => println!(
                "  {:<20} ready   {:.2}s  {} ch  {} Hz  peak {:.1} dB",
                id,
                buffer.duration_secs(),
                buffer.num_channels(),
                buffer.sample_rate(),
                buffer.peak_db()
            ),
            status => println!("  {:<20} {}", id, status.label()),
        }
    }
}

fn print_graph(engine: &SoftwareEngine) {
    let connections = engine.connections();
    println!("Connections ({}):", connections.len());
    for (from, to) in connections {
        println!("  {} -> {:?}", from, to);
    }

    let started = engine.count_events(|e| matches!(e, GraphEvent::SourceStarted { .. }));
    println!("Sources started: {}", started);
    println!("Listener at: {:?}", engine.listener_position());
}
