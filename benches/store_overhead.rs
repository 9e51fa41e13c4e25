//! Atom store hot-path benchmark
//!
//! Every `add` serializes the whole aggregate and rewrites the backing file
//! before returning; that synchronous write is the price of crash-safe
//! durability, and this benchmark keeps it honest.
//!
//! # Run Instructions
//!
//! ```bash
//! cargo bench --bench store_overhead
//! ```

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use radiometrics::atoms::{RawVoiceCallRatUsage, VoiceCallSession};
use radiometrics::clock::SystemClock;
use radiometrics::store::AtomStore;
use radiometrics::types::{Bearer, CallDirection, Rat, SetupDuration};

fn bench_session(carrier_id: i32) -> VoiceCallSession {
    VoiceCallSession {
        direction: CallDirection::Outgoing,
        bearer_at_start: Bearer::Ims,
        bearer_at_end: Bearer::Ims,
        setup_duration: SetupDuration::Normal,
        setup_failed: false,
        disconnect_reason_code: 16,
        disconnect_extra_code: 0,
        disconnect_extra_message: String::new(),
        rat_at_start: Rat::Lte,
        rat_at_end: Rat::Lte,
        rat_switch_count: 0,
        codec_bitmask: 0,
        concurrent_call_count_at_start: 0,
        concurrent_call_count_at_end: 0,
        sim_slot_index: 0,
        is_multi_sim: false,
        is_esim: false,
        carrier_id,
        srvcc_completed: false,
        srvcc_failure_count: 0,
        srvcc_cancellation_count: 0,
        rtt_enabled: false,
        is_emergency: false,
        is_roaming: false,
    }
}

/// Benchmark: session append with synchronous persistence
fn bench_add_voice_call_session(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let store = AtomStore::open(dir.path().join("atoms.json"), Arc::new(SystemClock));

    c.bench_function("store_add_voice_call_session", |b| {
        let mut i = 0;
        b.iter(|| {
            store.add_voice_call_session(black_box(bench_session(i)));
            i += 1;
        });
    });
}

/// Benchmark: RAT usage key-merge (steady-state, single key)
fn bench_add_rat_usage(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let store = AtomStore::open(dir.path().join("atoms.json"), Arc::new(SystemClock));

    c.bench_function("store_merge_rat_usage", |b| {
        b.iter(|| {
            store.add_rat_usage(black_box(RawVoiceCallRatUsage {
                carrier_id: 1839,
                rat: Rat::Lte,
                total_duration_millis: 1_000,
                call_count: 1,
            }));
        });
    });
}

criterion_group!(benches, bench_add_voice_call_session, bench_add_rat_usage);
criterion_main!(benches);
