//! CLI argument parsing for the radiometrics inspection binary

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "radiometrics")]
#[command(version)]
#[command(about = "Inspect persisted cellular metrics atom stores", long_about = None)]
pub struct Cli {
    /// Enable debug logging to stderr
    #[arg(long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print a summary of a persisted atom store file
    Inspect {
        /// Path to the store file
        store: PathBuf,

        /// Dump the full aggregate as pretty-printed JSON
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_inspect() {
        let cli = Cli::parse_from(["radiometrics", "inspect", "atoms.json"]);
        match cli.command {
            Command::Inspect { store, json } => {
                assert_eq!(store, PathBuf::from("atoms.json"));
                assert!(!json);
            }
        }
    }

    #[test]
    fn test_cli_inspect_json_flag() {
        let cli = Cli::parse_from(["radiometrics", "inspect", "--json", "atoms.json"]);
        match cli.command {
            Command::Inspect { json, .. } => assert!(json),
        }
    }

    #[test]
    fn test_cli_debug_default_false() {
        let cli = Cli::parse_from(["radiometrics", "inspect", "atoms.json"]);
        assert!(!cli.debug);
    }

    #[test]
    fn test_cli_debug_flag() {
        let cli = Cli::parse_from(["radiometrics", "--debug", "inspect", "atoms.json"]);
        assert!(cli.debug);
    }
}
