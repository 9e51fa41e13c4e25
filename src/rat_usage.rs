//! Per-phone voice usage windows keyed by (carrier, RAT)
//!
//! At most one window is open per phone. A window closes when the active RAT
//! (or carrier) changes or when the live-call count crosses zero - never
//! merely because one of several concurrent calls ends. Closed windows merge
//! into a (carrier, RAT)-keyed pending aggregate that `flush` drains toward
//! the store, so the sum of window durations equals the wall-clock span the
//! phone spent with any call live on that RAT, with no double counting.

use std::sync::Arc;

use fnv::{FnvHashMap, FnvHashSet};
use tracing::debug;

use crate::atoms::RawVoiceCallRatUsage;
use crate::clock::Clock;
use crate::types::{CallId, CarrierId, Rat, CARRIER_ID_UNKNOWN};

/// One open usage window
///
/// The distinct-call set is seeded with the calls live at open and only ever
/// appended to, so its size is monotonically non-decreasing for the life of
/// the window. Re-entry of an already-counted call does not increment it.
#[derive(Debug)]
struct OpenWindow {
    carrier_id: CarrierId,
    rat: Rat,
    start_millis: u64,
    calls: FnvHashSet<CallId>,
}

#[derive(Debug, Default, Clone, Copy)]
struct PendingUsage {
    duration_millis: u64,
    call_count: u32,
}

/// Accumulates (carrier, RAT, time) usage for one phone
pub struct RatUsageAggregator {
    clock: Arc<dyn Clock>,
    active: Option<(Rat, CarrierId)>,
    live_calls: FnvHashSet<CallId>,
    window: Option<OpenWindow>,
    pending: FnvHashMap<(CarrierId, Rat), PendingUsage>,
}

impl RatUsageAggregator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            active: None,
            live_calls: FnvHashSet::default(),
            window: None,
            pending: FnvHashMap::default(),
        }
    }

    /// Record the phone's active voice RAT and carrier
    ///
    /// A change while calls are live closes the open window and opens a new
    /// one at the same instant, keeping windows contiguous and non-overlapping.
    pub fn note_active_rat(&mut self, rat: Rat, carrier_id: CarrierId) {
        if self.active == Some((rat, carrier_id)) {
            return;
        }
        self.active = Some((rat, carrier_id));
        if self.window.is_some() {
            let now = self.clock.now_millis();
            self.close_window(now);
            self.open_window(now);
        }
    }

    /// A call became live on this phone
    ///
    /// The first live call opens a window; later calls join the open
    /// window's distinct-call set.
    pub fn note_call_became_live(&mut self, call_id: CallId) {
        self.live_calls.insert(call_id);
        match self.window.as_mut() {
            Some(window) => {
                window.calls.insert(call_id);
            }
            None => self.open_window(self.clock.now_millis()),
        }
    }

    /// A call ended; the last live call closes the window
    pub fn note_call_ended(&mut self, call_id: CallId) {
        self.live_calls.remove(&call_id);
        if self.live_calls.is_empty() {
            let now = self.clock.now_millis();
            self.close_window(now);
        }
    }

    /// Drain the deltas of every window closed since the last flush
    ///
    /// The open window, if any, is left running: its duration and call set
    /// are only reportable once it closes. Idempotent - a second flush with
    /// no newly closed windows returns nothing.
    pub fn flush(&mut self) -> Vec<RawVoiceCallRatUsage> {
        self.pending
            .drain()
            .filter(|(_, usage)| usage.duration_millis > 0 || usage.call_count > 0)
            .map(|((carrier_id, rat), usage)| RawVoiceCallRatUsage {
                carrier_id,
                rat,
                total_duration_millis: usage.duration_millis,
                call_count: usage.call_count,
            })
            .collect()
    }

    fn open_window(&mut self, now_millis: u64) {
        if self.live_calls.is_empty() {
            return;
        }
        let (rat, carrier_id) = self.active.unwrap_or((Rat::Unknown, CARRIER_ID_UNKNOWN));
        self.window = Some(OpenWindow {
            carrier_id,
            rat,
            start_millis: now_millis,
            calls: self.live_calls.clone(),
        });
    }

    fn close_window(&mut self, now_millis: u64) {
        let Some(window) = self.window.take() else {
            return;
        };
        let duration = now_millis.saturating_sub(window.start_millis);
        let entry = self
            .pending
            .entry((window.carrier_id, window.rat))
            .or_default();
        entry.duration_millis += duration;
        entry.call_count += window.calls.len() as u32;
        debug!(
            carrier_id = window.carrier_id,
            rat = ?window.rat,
            duration_millis = duration,
            call_count = window.calls.len(),
            "closed voice RAT usage window"
        );
    }
}
