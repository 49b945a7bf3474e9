//! Audio State
//!
//! One snapshot in an operation chain. Operations never mutate a state they
//! are given; they [`fork`](AudioState::fork) it and change the fork.
//! Node handles are shared between forks, the mappings holding them are not.

use std::collections::HashMap;

use crate::engine::{GainHandle, PannerHandle, SourceHandle};
use crate::state::buffers::{BufferStatus, BufferTable};

/// Immutable snapshot of buffers, locations and gain routing
#[derive(Debug, Default)]
pub struct AudioState {
    audio_buffers: Option<BufferTable>,
    locations: Option<HashMap<String, PannerHandle>>,
    master_gain: Option<GainHandle>,
    /// Read by `orient` and `cone`; no operation populates it
    panners: Option<HashMap<String, PannerHandle>>,
    /// Never read or populated by any operation
    sources: Option<HashMap<String, SourceHandle>>,
}

impl AudioState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shallow copy: every mapping is copied into a new allocation, the
    /// handles inside are shared.
    pub fn fork(&self) -> Self {
        Self {
            audio_buffers: self.audio_buffers.as_ref().map(BufferTable::fork),
            locations: self.locations.clone(),
            master_gain: self.master_gain.clone(),
            panners: self.panners.clone(),
            sources: self.sources.clone(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The live buffer table, if any sound was ever set or added
    pub fn audio_buffers(&self) -> Option<&BufferTable> {
        self.audio_buffers.as_ref()
    }

    pub fn buffer_status(&self, id: &str) -> Option<BufferStatus> {
        self.audio_buffers.as_ref().and_then(|table| table.get(id))
    }

    pub fn locations(&self) -> Option<&HashMap<String, PannerHandle>> {
        self.locations.as_ref()
    }

    pub fn location(&self, id: &str) -> Option<&PannerHandle> {
        self.locations.as_ref().and_then(|l| l.get(id))
    }

    pub fn master_gain(&self) -> Option<&GainHandle> {
        self.master_gain.as_ref()
    }

    pub fn panner(&self, id: &str) -> Option<&PannerHandle> {
        self.panners.as_ref().and_then(|p| p.get(id))
    }

    pub fn sources(&self) -> Option<&HashMap<String, SourceHandle>> {
        self.sources.as_ref()
    }

    // ========================================================================
    // Mutation of a fresh fork (crate-internal)
    // ========================================================================

    pub(crate) fn set_audio_buffers(&mut self, table: BufferTable) {
        self.audio_buffers = Some(table);
    }

    /// The buffer table, created empty if absent
    pub(crate) fn audio_buffers_or_default(&mut self) -> &BufferTable {
        self.audio_buffers.get_or_insert_with(BufferTable::new)
    }

    pub(crate) fn locations_mut(&mut self) -> &mut HashMap<String, PannerHandle> {
        self.locations.get_or_insert_with(HashMap::new)
    }

    pub(crate) fn remove_location(&mut self, id: &str) -> Option<PannerHandle> {
        self.locations.as_mut().and_then(|l| l.remove(id))
    }

    pub(crate) fn set_master_gain(&mut self, gain: GainHandle) {
        self.master_gain = Some(gain);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{AudioEngine, SoftwareEngine};
    use std::rc::Rc;

    #[test]
    fn test_fork_of_empty_state() {
        let state = AudioState::new();
        let fork = state.fork();
        assert!(fork.audio_buffers().is_none());
        assert!(fork.locations().is_none());
        assert!(fork.master_gain().is_none());
    }

    #[test]
    fn test_fork_copies_mappings_and_shares_handles() {
        let engine = SoftwareEngine::new();
        let mut state = AudioState::new();
        state.audio_buffers_or_default().set("a", BufferStatus::Pending);
        state.locations_mut().insert("left".into(), engine.create_panner());
        state.set_master_gain(engine.create_gain());

        let mut fork = state.fork();
        assert!(!fork.audio_buffers().unwrap().is_same(state.audio_buffers().unwrap()));
        assert!(Rc::ptr_eq(
            fork.location("left").unwrap(),
            state.location("left").unwrap()
        ));
        assert!(Rc::ptr_eq(fork.master_gain().unwrap(), state.master_gain().unwrap()));

        fork.locations_mut().remove("left");
        fork.audio_buffers_or_default().remove("a");
        assert!(state.location("left").is_some());
        assert_eq!(state.buffer_status("a"), Some(BufferStatus::Pending));
    }

    #[test]
    fn test_legacy_fields_start_empty() {
        let state = AudioState::new();
        assert!(state.panner("anything").is_none());
        assert!(state.sources().is_none());
    }
}
