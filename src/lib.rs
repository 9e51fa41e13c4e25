//! Radiometrics - cellular voice call and service state metrics aggregation
//!
//! This library collects per-call and per-service-state telemetry on a
//! cellular device and persists it as bounded, rate-limited atoms for later
//! batched export. The aggregation engine attributes durations and counts to
//! the right (carrier, RAT) bucket while calls overlap, the radio technology
//! changes mid-call, and SRVCC handovers move calls between bearers, with
//! exactly-once emission per logical call and crash-safe persistence.

pub mod atoms;
pub mod call_session;
pub mod call_tracker;
pub mod cli;
pub mod clock;
pub mod collector;
pub mod config;
pub mod events;
pub mod phone;
pub mod rat_usage;
pub mod service_state;
pub mod store;
pub mod types;
