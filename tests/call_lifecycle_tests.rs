//! End-to-end call lifecycle coverage through the event entry point
//!
//! Exercises the exactly-once terminal emission guarantee under interleaved
//! call lifetimes, SRVCC handovers, and late/duplicate upstream events.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use radiometrics::clock::ManualClock;
use radiometrics::config::PhoneConfig;
use radiometrics::events::TelephonyEvent;
use radiometrics::phone::PhoneMetrics;
use radiometrics::store::{AtomStore, StoreLimits};
use radiometrics::types::{AudioCodec, Bearer, CallDirection, CallState, Rat, SrvccState};

fn setup() -> (Arc<ManualClock>, Arc<AtomStore>, PhoneMetrics, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(1_000));
    let store = Arc::new(AtomStore::with_rng(
        dir.path().join("atoms.json"),
        clock.clone(),
        StoreLimits::default(),
        StdRng::seed_from_u64(99),
    ));
    let phone = PhoneMetrics::new(PhoneConfig::default(), clock.clone(), store.clone());
    (clock, store, phone, dir)
}

fn start_event(call_id: u32) -> TelephonyEvent {
    TelephonyEvent::CallStart {
        call_id,
        direction: CallDirection::Outgoing,
        rat: Rat::Lte,
        carrier_id: 1839,
        is_emergency: false,
        is_roaming: false,
    }
}

fn terminate_event(call_id: u32) -> TelephonyEvent {
    TelephonyEvent::CallTerminated {
        call_id,
        reason_code: 16,
        extra_code: 0,
        extra_message: None,
    }
}

#[test]
fn test_interleaved_calls_emit_one_record_each() {
    let (clock, store, mut phone, _dir) = setup();

    phone.handle(start_event(1));
    clock.advance(2_000);
    phone.handle(start_event(2));
    clock.advance(2_000);
    phone.handle(start_event(3));
    clock.advance(2_000);
    // Terminate out of start order.
    phone.handle(terminate_event(2));
    phone.handle(terminate_event(1));
    clock.advance(2_000);
    phone.handle(terminate_event(3));

    let sessions = store.pull_voice_call_sessions(0).unwrap();
    assert_eq!(sessions.len(), 3);
}

#[test]
fn test_late_events_after_teardown_are_harmless() {
    let (clock, store, mut phone, _dir) = setup();

    phone.handle(start_event(1));
    clock.advance(1_000);
    phone.handle(terminate_event(1));

    // Events racing call teardown reference a dead id.
    phone.handle(TelephonyEvent::AudioCodecChanged {
        call_id: 1,
        codec: AudioCodec::Evs,
    });
    phone.handle(TelephonyEvent::CallStateChanged {
        call_id: 1,
        state: CallState::Active,
    });
    phone.handle(terminate_event(1));

    let sessions = store.pull_voice_call_sessions(0).unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].codec_bitmask, 0);
}

#[test]
fn test_mid_call_handover_and_codec_history() {
    let (clock, store, mut phone, _dir) = setup();

    phone.handle(start_event(1));
    phone.handle(TelephonyEvent::AudioCodecChanged {
        call_id: 1,
        codec: AudioCodec::Evs,
    });
    clock.advance(1_200);
    phone.handle(TelephonyEvent::CallStateChanged {
        call_id: 1,
        state: CallState::Active,
    });
    clock.advance(30_000);

    // SRVCC moves the call from the IMS bearer to CS; the RAT follows.
    phone.handle(TelephonyEvent::SrvccStateChanged {
        state: SrvccState::Started,
    });
    phone.handle(TelephonyEvent::SrvccStateChanged {
        state: SrvccState::Completed,
    });
    phone.handle(TelephonyEvent::RatChanged {
        rat: Rat::Umts,
        carrier_id: 1839,
    });
    phone.handle(TelephonyEvent::AudioCodecChanged {
        call_id: 1,
        codec: AudioCodec::AmrWb,
    });
    clock.advance(10_000);
    phone.handle(terminate_event(1));

    let sessions = store.pull_voice_call_sessions(0).unwrap();
    let session = &sessions[0];
    assert_eq!(session.bearer_at_start, Bearer::Ims);
    assert_eq!(session.bearer_at_end, Bearer::CircuitSwitched);
    assert!(session.srvcc_completed);
    assert_eq!(session.rat_at_start, Rat::Lte);
    assert_eq!(session.rat_at_end, Rat::Umts);
    assert_eq!(session.rat_switch_count, 1);
    assert_eq!(
        session.codec_bitmask,
        AudioCodec::Evs.bit() | AudioCodec::AmrWb.bit()
    );
    assert!(!session.setup_failed);
}

#[test]
fn test_failed_srvcc_keeps_ims_bearer() {
    let (clock, store, mut phone, _dir) = setup();

    phone.handle(start_event(1));
    clock.advance(1_000);
    phone.handle(TelephonyEvent::SrvccStateChanged {
        state: SrvccState::Started,
    });
    phone.handle(TelephonyEvent::SrvccStateChanged {
        state: SrvccState::Failed,
    });
    phone.handle(TelephonyEvent::SrvccStateChanged {
        state: SrvccState::Canceled,
    });
    phone.handle(terminate_event(1));

    let sessions = store.pull_voice_call_sessions(0).unwrap();
    assert_eq!(sessions[0].bearer_at_end, Bearer::Ims);
    assert_eq!(sessions[0].srvcc_failure_count, 1);
    assert_eq!(sessions[0].srvcc_cancellation_count, 1);
}

#[test]
fn test_disconnect_message_sanitized_through_pipeline() {
    let (clock, store, mut phone, _dir) = setup();

    phone.handle(start_event(1));
    clock.advance(500);
    phone.handle(TelephonyEvent::CallTerminated {
        call_id: 1,
        reason_code: 3,
        extra_code: 12,
        extra_message: Some("y".repeat(300)),
    });

    let sessions = store.pull_voice_call_sessions(0).unwrap();
    let message = &sessions[0].disconnect_extra_message;
    assert_eq!(message.chars().count(), 128);
    assert!("y".repeat(300).starts_with(message.as_str()));
    assert_eq!(sessions[0].disconnect_reason_code, 3);
    assert_eq!(sessions[0].disconnect_extra_code, 12);
}

#[test]
fn test_rtt_is_sticky_for_the_session() {
    let (clock, store, mut phone, _dir) = setup();

    phone.handle(start_event(1));
    phone.handle(TelephonyEvent::RttStarted { call_id: 1 });
    clock.advance(5_000);
    phone.handle(terminate_event(1));

    let sessions = store.pull_voice_call_sessions(0).unwrap();
    assert!(sessions[0].rtt_enabled);
}

#[test]
fn test_terminal_records_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("atoms.json");
    let clock = Arc::new(ManualClock::new(1_000));

    {
        let store = Arc::new(AtomStore::open(&path, clock.clone()));
        let mut phone = PhoneMetrics::new(PhoneConfig::default(), clock.clone(), store);
        phone.handle(start_event(1));
        clock.advance(3_000);
        phone.handle(terminate_event(1));
        // Tracker and store dropped here; the add already persisted.
    }

    let reloaded = AtomStore::open(&path, clock);
    assert_eq!(reloaded.summary().voice_call_sessions, 1);
    assert_eq!(reloaded.summary().rat_usage, 1);
}
