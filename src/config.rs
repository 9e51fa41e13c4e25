//! Runtime configuration
//!
//! Capacities and the pull interval are deployment knobs, not architecture;
//! they load from a JSON file when one is provided and fall back to the
//! defaults otherwise.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::store::StoreLimits;

/// Identity of one phone/slot, fixed for the life of its trackers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneConfig {
    pub sim_slot_index: i32,
    #[serde(default)]
    pub is_multi_sim: bool,
    #[serde(default)]
    pub is_esim: bool,
}

impl Default for PhoneConfig {
    fn default() -> Self {
        Self {
            sim_slot_index: 0,
            is_multi_sim: false,
            is_esim: false,
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("radiometrics_atoms.json")
}

fn default_max_voice_call_sessions() -> usize {
    50
}

fn default_max_service_states() -> usize {
    50
}

fn default_max_data_service_switches() -> usize {
    50
}

fn default_min_pull_interval_millis() -> u64 {
    5 * 60 * 1_000
}

/// Top-level configuration for the metrics engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Backing file for the persisted atom aggregate
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    #[serde(default = "default_max_voice_call_sessions")]
    pub max_voice_call_sessions: usize,

    #[serde(default = "default_max_service_states")]
    pub max_service_states: usize,

    #[serde(default = "default_max_data_service_switches")]
    pub max_data_service_switches: usize,

    /// Minimum spacing the collector enforces between pulls of one atom type
    #[serde(default = "default_min_pull_interval_millis")]
    pub min_pull_interval_millis: u64,

    /// One entry per phone/slot the engine should track
    #[serde(default)]
    pub phones: Vec<PhoneConfig>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            max_voice_call_sessions: default_max_voice_call_sessions(),
            max_service_states: default_max_service_states(),
            max_data_service_switches: default_max_data_service_switches(),
            min_pull_interval_millis: default_min_pull_interval_millis(),
            phones: vec![PhoneConfig::default()],
        }
    }
}

impl MetricsConfig {
    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Load configuration, falling back to defaults on any failure
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.as_ref().display(), error = %e, "using default metrics config");
                Self::default()
            }
        }
    }

    /// Capacity bounds for the store's evicting collections
    pub fn store_limits(&self) -> StoreLimits {
        StoreLimits {
            max_voice_call_sessions: self.max_voice_call_sessions,
            max_service_states: self.max_service_states,
            max_data_service_switches: self.max_data_service_switches,
        }
    }
}
