use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use radiometrics::cli::{Cli, Command};
use radiometrics::clock::SystemClock;
use radiometrics::store::AtomStore;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Print a persisted atom store's contents
///
/// Opens through the same tolerant load path as the metrics engine, so a
/// missing or corrupt file reports an empty store instead of failing.
fn inspect(path: &Path, json: bool) -> Result<()> {
    let store = AtomStore::open(path, Arc::new(SystemClock));
    if json {
        println!("{}", store.to_pretty_json());
        return Ok(());
    }

    let summary = store.summary();
    println!("atom store: {}", path.display());
    println!("{:>6} voice call sessions", summary.voice_call_sessions);
    println!("{:>6} RAT usage aggregates", summary.rat_usage);
    println!("{:>6} service state records", summary.service_states);
    println!("{:>6} data service switches", summary.data_service_switches);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match cli.command {
        Command::Inspect { store, json } => inspect(&store, json),
    }
}
