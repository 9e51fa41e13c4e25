//! Durable, bounded, rate-limited atom store
//!
//! One file on disk holds the serialized aggregate of every atom collection
//! plus a last-pull timestamp per collection. The whole aggregate is
//! rewritten atomically (temp file + rename) on every mutating call, so a
//! successful `add` means the record is durable before the caller resumes.
//!
//! All operations take one coarse lock for the in-memory mutation plus the
//! synchronous write. A failed write is logged and swallowed; the in-memory
//! copy stays authoritative until the next successful write.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::atoms::{
    CellularDataServiceSwitch, CellularServiceState, RawVoiceCallRatUsage, VoiceCallSession,
};
use crate::clock::Clock;

/// Errors surfaced by the persistence layer
///
/// These never cross the store's public API: load failures reset to the
/// empty aggregate and write failures are logged, not returned.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store file format invalid: {0}")]
    Format(#[from] serde_json::Error),
}

/// Capacity bounds for the append-with-eviction collections
#[derive(Debug, Clone)]
pub struct StoreLimits {
    pub max_voice_call_sessions: usize,
    pub max_service_states: usize,
    pub max_data_service_switches: usize,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            max_voice_call_sessions: 50,
            max_service_states: 50,
            max_data_service_switches: 50,
        }
    }
}

/// Last successful pull time per collection, persisted with the aggregate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
struct PullTimestamps {
    voice_call_sessions: u64,
    rat_usage: u64,
    service_states: u64,
    data_service_switches: u64,
}

impl PullTimestamps {
    fn all(now_millis: u64) -> Self {
        Self {
            voice_call_sessions: now_millis,
            rat_usage: now_millis,
            service_states: now_millis,
            data_service_switches: now_millis,
        }
    }
}

/// The serialized aggregate: every atom collection plus pull timestamps
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    #[serde(default)]
    voice_call_sessions: Vec<VoiceCallSession>,
    #[serde(default)]
    rat_usage: Vec<RawVoiceCallRatUsage>,
    #[serde(default)]
    service_states: Vec<CellularServiceState>,
    #[serde(default)]
    data_service_switches: Vec<CellularDataServiceSwitch>,
    #[serde(default)]
    last_pull_millis: PullTimestamps,
}

/// Per-collection record counts, for inspection tooling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreSummary {
    pub voice_call_sessions: usize,
    pub rat_usage: usize,
    pub service_states: usize,
    pub data_service_switches: usize,
}

struct Inner {
    data: StoreData,
    rng: StdRng,
}

/// Durable atom container shared by every phone's trackers
///
/// Construction never fails: an absent, unreadable, empty, or unparsable
/// backing file yields an empty store. Pull timestamps of a freshly
/// initialized store default to "now" so a restart does not immediately
/// satisfy a caller's rate limit.
pub struct AtomStore {
    path: PathBuf,
    clock: Arc<dyn Clock>,
    limits: StoreLimits,
    inner: Mutex<Inner>,
}

impl AtomStore {
    /// Open a store backed by `path`, loading any previously persisted state
    pub fn open(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self::with_rng(path, clock, StoreLimits::default(), StdRng::from_entropy())
    }

    /// Open with explicit capacity limits
    pub fn with_limits(path: impl Into<PathBuf>, clock: Arc<dyn Clock>, limits: StoreLimits) -> Self {
        Self::with_rng(path, clock, limits, StdRng::from_entropy())
    }

    /// Open with an injected eviction RNG, for deterministic eviction tests
    pub fn with_rng(
        path: impl Into<PathBuf>,
        clock: Arc<dyn Clock>,
        limits: StoreLimits,
        rng: StdRng,
    ) -> Self {
        let path = path.into();
        let data = Self::load_or_empty(&path, clock.now_millis());
        Self {
            path,
            clock,
            limits,
            inner: Mutex::new(Inner { data, rng }),
        }
    }

    /// Load the persisted aggregate, falling back to empty on any failure
    fn load_or_empty(path: &Path, now_millis: u64) -> StoreData {
        match fs::read(path) {
            Ok(bytes) => match serde_json::from_slice::<StoreData>(&bytes) {
                Ok(data) => {
                    debug!(path = %path.display(), "loaded persisted atom store");
                    data
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "atom store file unparsable, starting empty");
                    Self::empty(now_millis)
                }
            },
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no persisted atom store, starting empty");
                Self::empty(now_millis)
            }
        }
    }

    fn empty(now_millis: u64) -> StoreData {
        StoreData {
            last_pull_millis: PullTimestamps::all(now_millis),
            ..StoreData::default()
        }
    }

    /// Append a completed call session, evicting a uniformly random existing
    /// entry once capacity is reached
    pub fn add_voice_call_session(&self, session: VoiceCallSession) {
        let mut inner = self.lock();
        let limit = self.limits.max_voice_call_sessions;
        let Inner { data, rng } = &mut *inner;
        bounded_insert(&mut data.voice_call_sessions, limit, rng, session);
        self.persist(data);
    }

    /// Merge a RAT usage delta: matching (carrier, rat) keys sum duration
    /// and call count, new keys append
    pub fn add_rat_usage(&self, usage: RawVoiceCallRatUsage) {
        let mut inner = self.lock();
        let key = inner
            .data
            .rat_usage
            .iter()
            .position(|u| u.carrier_id == usage.carrier_id && u.rat == usage.rat);
        match key {
            Some(i) => {
                let u = &mut inner.data.rat_usage[i];
                u.total_duration_millis += usage.total_duration_millis;
                u.call_count += usage.call_count;
            }
            None => inner.data.rat_usage.push(usage),
        }
        self.persist(&inner.data);
    }

    /// Append a service-state duration record, evicting at capacity
    pub fn add_service_state(&self, state: CellularServiceState) {
        let mut inner = self.lock();
        let limit = self.limits.max_service_states;
        let Inner { data, rng } = &mut *inner;
        bounded_insert(&mut data.service_states, limit, rng, state);
        self.persist(data);
    }

    /// Record a data-RAT switch, coalescing with a matching (from, to,
    /// carrier, slot) entry if one is already pending
    pub fn add_data_service_switch(&self, switch: CellularDataServiceSwitch) {
        let mut inner = self.lock();
        let key = inner.data.data_service_switches.iter().position(|s| {
            s.rat_from == switch.rat_from
                && s.rat_to == switch.rat_to
                && s.carrier_id == switch.carrier_id
                && s.sim_slot_index == switch.sim_slot_index
        });
        match key {
            Some(i) => inner.data.data_service_switches[i].switch_count += switch.switch_count,
            None => {
                let limit = self.limits.max_data_service_switches;
                let Inner { data, rng } = &mut *inner;
                bounded_insert(&mut data.data_service_switches, limit, rng, switch);
            }
        }
        self.persist(&inner.data);
    }

    /// Pull completed call sessions; `None` means the pull was rate-limited
    pub fn pull_voice_call_sessions(
        &self,
        min_interval_millis: u64,
    ) -> Option<Vec<VoiceCallSession>> {
        let now = self.clock.now_millis();
        let mut inner = self.lock();
        if now.saturating_sub(inner.data.last_pull_millis.voice_call_sessions) < min_interval_millis
        {
            return None;
        }
        inner.data.last_pull_millis.voice_call_sessions = now;
        let pulled = std::mem::take(&mut inner.data.voice_call_sessions);
        self.persist(&inner.data);
        Some(pulled)
    }

    /// Pull the accumulated RAT usage aggregate; `None` means rate-limited
    pub fn pull_rat_usage(&self, min_interval_millis: u64) -> Option<Vec<RawVoiceCallRatUsage>> {
        let now = self.clock.now_millis();
        let mut inner = self.lock();
        if now.saturating_sub(inner.data.last_pull_millis.rat_usage) < min_interval_millis {
            return None;
        }
        inner.data.last_pull_millis.rat_usage = now;
        let pulled = std::mem::take(&mut inner.data.rat_usage);
        self.persist(&inner.data);
        Some(pulled)
    }

    /// Pull service-state duration records; `None` means rate-limited
    pub fn pull_service_states(
        &self,
        min_interval_millis: u64,
    ) -> Option<Vec<CellularServiceState>> {
        let now = self.clock.now_millis();
        let mut inner = self.lock();
        if now.saturating_sub(inner.data.last_pull_millis.service_states) < min_interval_millis {
            return None;
        }
        inner.data.last_pull_millis.service_states = now;
        let pulled = std::mem::take(&mut inner.data.service_states);
        self.persist(&inner.data);
        Some(pulled)
    }

    /// Pull pending data-RAT switches; `None` means rate-limited. Pulling
    /// resets the coalesced switch counters.
    pub fn pull_data_service_switches(
        &self,
        min_interval_millis: u64,
    ) -> Option<Vec<CellularDataServiceSwitch>> {
        let now = self.clock.now_millis();
        let mut inner = self.lock();
        if now.saturating_sub(inner.data.last_pull_millis.data_service_switches)
            < min_interval_millis
        {
            return None;
        }
        inner.data.last_pull_millis.data_service_switches = now;
        let pulled = std::mem::take(&mut inner.data.data_service_switches);
        self.persist(&inner.data);
        Some(pulled)
    }

    /// Current record counts per collection
    pub fn summary(&self) -> StoreSummary {
        let inner = self.lock();
        StoreSummary {
            voice_call_sessions: inner.data.voice_call_sessions.len(),
            rat_usage: inner.data.rat_usage.len(),
            service_states: inner.data.service_states.len(),
            data_service_switches: inner.data.data_service_switches.len(),
        }
    }

    /// Pretty-printed JSON of the current aggregate, without mutating it
    pub fn to_pretty_json(&self) -> String {
        let inner = self.lock();
        serde_json::to_string_pretty(&inner.data).unwrap_or_else(|_| "{}".to_string())
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock means another caller panicked mid-mutation; the
        // aggregate itself is still coherent record-wise, so keep serving.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Synchronously persist the aggregate; failure is logged, not returned
    fn persist(&self, data: &StoreData) {
        if let Err(e) = self.write_file(data) {
            warn!(path = %self.path.display(), error = %e, "failed to persist atom store");
        }
    }

    /// Serialize and atomically overwrite the backing file
    fn write_file(&self, data: &StoreData) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(data)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Insert into a capacity-bounded collection, evicting one uniformly random
/// existing entry first when full. Random (not LRU/FIFO) eviction keeps the
/// retained sample free of systematic bias.
fn bounded_insert<T>(vec: &mut Vec<T>, capacity: usize, rng: &mut StdRng, item: T) {
    if capacity == 0 {
        return;
    }
    if vec.len() >= capacity {
        let victim = rng.gen_range(0..vec.len());
        vec.swap_remove(victim);
    }
    vec.push(item);
}
