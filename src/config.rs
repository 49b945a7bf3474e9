//! Session configuration
//!
//! A JSON file describing the sounds to load and how the scene is laid out:
//!
//! ```json
//! {
//!   "master_volume": 0.8,
//!   "listener": [0.0, 0.0, 0.0],
//!   "panner_defaults": { "panningModel": "HRTF", "rolloffFactor": 0.5 },
//!   "sounds": { "door": "sfx/door.wav" },
//!   "locations": { "door": [2.0, 0.0, -1.0] }
//! }
//! ```
//!
//! Relative sound paths resolve against the directory of the config file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::codec::file_data_uri;
use crate::error::{AuralError, Result};
use crate::ops::DEFAULT_VOLUME;

/// Configuration for an audio session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Master gain level
    pub master_volume: f32,
    /// Listener position
    pub listener: [f64; 3],
    /// Options applied to every panner the session creates
    pub panner_defaults: Map<String, Value>,
    /// Sound id to WAV file
    pub sounds: BTreeMap<String, PathBuf>,
    /// Sound id to emitter position; sounds without one play unpanned
    pub locations: BTreeMap<String, [f64; 3]>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            master_volume: DEFAULT_VOLUME,
            listener: [0.0; 3],
            panner_defaults: Map::new(),
            sounds: BTreeMap::new(),
            locations: BTreeMap::new(),
        }
    }
}

impl AudioConfig {
    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AuralError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let json = fs::read_to_string(path)?;
        let mut config: AudioConfig = serde_json::from_str(&json)?;
        config.validate()?;

        if let Some(base) = path.parent() {
            for file in config.sounds.values_mut() {
                if file.is_relative() {
                    *file = base.join(&*file);
                }
            }
        }

        info!(
            "Loaded config {} ({} sounds)",
            path.display(),
            config.sounds.len()
        );
        Ok(config)
    }

    /// Write the config as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if !self.master_volume.is_finite() || self.master_volume < 0.0 {
            return Err(AuralError::InvalidConfig {
                reason: format!("master_volume must be >= 0, got {}", self.master_volume),
            });
        }

        if self.listener.iter().any(|v| !v.is_finite()) {
            return Err(AuralError::InvalidConfig {
                reason: "listener position must be finite".to_string(),
            });
        }

        if self.sounds.keys().any(|id| id.trim().is_empty()) {
            return Err(AuralError::InvalidConfig {
                reason: "sound ids must not be empty".to_string(),
            });
        }

        if let Some(id) = self.locations.keys().find(|id| !self.sounds.contains_key(*id)) {
            return Err(AuralError::InvalidConfig {
                reason: format!("location given for unknown sound '{}'", id),
            });
        }

        Ok(())
    }

    /// Read every configured sound file into a payload
    pub fn sound_payloads(&self) -> Result<BTreeMap<String, String>> {
        self.sounds
            .iter()
            .map(|(id, path)| Ok((id.clone(), file_data_uri(path)?)))
            .collect()
    }
}
