//! Engine configuration (`audio.toml`)
//!
//! Every field has a default, so an empty file or a file with only some keys
//! is valid:
//!
//! ```toml
//! enabled = true
//! backend = "cpal"
//! sample_rate = 44100
//! master_volume = 0.8
//! max_concurrent_effects = 8
//! worker_threads = 2
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AudioError;
use crate::output::{AudioDevice, CpalDevice, NullDevice};

/// Which output device the engine opens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputBackend {
    /// Host default output through cpal
    #[default]
    Cpal,
    /// Accept everything, play nothing
    Null,
}

/// Audio engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// When false the engine runs against the null backend (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Output backend (default: cpal)
    #[serde(default)]
    pub backend: OutputBackend,
    /// Generation rate until the device reports its own (default: 44100)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Master volume level (default: 0.8, range: 0.0-1.0)
    #[serde(default = "default_volume")]
    pub master_volume: f32,
    /// Effect sequences allowed to overlap, 0 for no limit (default: 8)
    #[serde(default = "default_max_concurrent_effects")]
    pub max_concurrent_effects: usize,
    /// Threads in the engine's scheduling runtime (default: 2)
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
}

fn default_true() -> bool {
    true
}
fn default_sample_rate() -> u32 {
    44_100
}
fn default_volume() -> f32 {
    0.8
}
fn default_max_concurrent_effects() -> usize {
    8
}
fn default_worker_threads() -> usize {
    2
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            backend: OutputBackend::default(),
            sample_rate: default_sample_rate(),
            master_volume: default_volume(),
            max_concurrent_effects: default_max_concurrent_effects(),
            worker_threads: default_worker_threads(),
        }
    }
}

impl AudioConfig {
    /// Parse a config from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, AudioError> {
        Ok(toml::from_str::<Self>(content)?.sanitized())
    }

    /// Load a config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be read or isn't valid TOML.
    pub fn load(path: &Path) -> Result<Self, AudioError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load a config file, falling back to defaults if it's missing or broken
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(AudioError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No audio config at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                warn!("Ignoring audio config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// The backend actually used once `enabled` is taken into account
    pub fn effective_backend(&self) -> OutputBackend {
        if self.enabled {
            self.backend
        } else {
            OutputBackend::Null
        }
    }

    /// Create the configured output device. No stream is opened yet.
    pub fn open_device(&self) -> Box<dyn AudioDevice> {
        match self.effective_backend() {
            OutputBackend::Cpal => Box::new(CpalDevice::new(self.sample_rate, self.master_volume)),
            OutputBackend::Null => Box::new(NullDevice::new(self.sample_rate)),
        }
    }

    /// Pull out-of-range values back to something usable
    fn sanitized(mut self) -> Self {
        if !(0.0..=1.0).contains(&self.master_volume) {
            let clamped = if self.master_volume.is_nan() {
                default_volume()
            } else {
                self.master_volume.clamp(0.0, 1.0)
            };
            warn!("master_volume {} out of range; using {}", self.master_volume, clamped);
            self.master_volume = clamped;
        }
        if self.sample_rate == 0 {
            warn!("sample_rate can't be 0; using {}", default_sample_rate());
            self.sample_rate = default_sample_rate();
        }
        if self.worker_threads == 0 {
            self.worker_threads = 1;
        }
        self
    }
}
