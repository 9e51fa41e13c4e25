//! Integration tests for the inspection binary

use std::sync::Arc;

use assert_cmd::Command;
use predicates::prelude::*;

use radiometrics::clock::ManualClock;
use radiometrics::config::PhoneConfig;
use radiometrics::events::TelephonyEvent;
use radiometrics::phone::PhoneMetrics;
use radiometrics::store::AtomStore;
use radiometrics::types::{CallDirection, Rat};

fn populated_store(path: &std::path::Path) {
    let clock = Arc::new(ManualClock::new(1_000));
    let store = Arc::new(AtomStore::open(path, clock.clone()));
    let mut phone = PhoneMetrics::new(PhoneConfig::default(), clock.clone(), store);
    phone.handle(TelephonyEvent::CallStart {
        call_id: 1,
        direction: CallDirection::Outgoing,
        rat: Rat::Lte,
        carrier_id: 1839,
        is_emergency: false,
        is_roaming: false,
    });
    clock.advance(5_000);
    phone.handle(TelephonyEvent::CallTerminated {
        call_id: 1,
        reason_code: 16,
        extra_code: 0,
        extra_message: None,
    });
}

#[test]
fn test_inspect_missing_file_reports_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("radiometrics")
        .unwrap()
        .arg("inspect")
        .arg(dir.path().join("missing.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("0 voice call sessions"));
}

#[test]
fn test_inspect_garbage_file_reports_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("atoms.json");
    std::fs::write(&path, b"%%% not an atom store %%%").unwrap();

    Command::cargo_bin("radiometrics")
        .unwrap()
        .arg("inspect")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("0 voice call sessions"));
}

#[test]
fn test_inspect_reports_persisted_counts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("atoms.json");
    populated_store(&path);

    Command::cargo_bin("radiometrics")
        .unwrap()
        .arg("inspect")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 voice call sessions"))
        .stdout(predicate::str::contains("1 RAT usage aggregates"));
}

#[test]
fn test_inspect_json_dumps_aggregate() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("atoms.json");
    populated_store(&path);

    Command::cargo_bin("radiometrics")
        .unwrap()
        .arg("inspect")
        .arg("--json")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("voice_call_sessions"))
        .stdout(predicate::str::contains("rat_usage"));
}

#[test]
fn test_missing_subcommand_fails_with_usage() {
    Command::cargo_bin("radiometrics")
        .unwrap()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}
