//! CLI Module
//!
//! Command-line front end that drives the pedalboard node outside a host.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// DJZ Pedalboard - preset-driven audio effect chains
#[derive(Parser, Debug)]
#[command(name = "pedalboard-cli")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the preset folder and the log file
    #[arg(short, long, global = true)]
    pub base_dir: Option<PathBuf>,

    /// JSON configuration file (overrides --base-dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the presets in the preset folder
    #[command(name = "list-presets")]
    ListPresets,

    /// Print the node descriptor and its input declaration
    #[command(name = "describe")]
    Describe,

    /// Parse and evaluate a preset without processing audio
    #[command(name = "check-preset")]
    CheckPreset {
        /// Preset file name, extension included
        name: String,

        /// Print the report as JSON, with each effect's instance id
        #[arg(long)]
        json: bool,
    },

    /// Run a preset over a WAV file
    #[command(name = "process")]
    Process {
        /// Input WAV file
        #[arg(short, long)]
        input: PathBuf,

        /// Preset file name, extension included
        #[arg(short, long)]
        preset: String,

        /// Output WAV file
        #[arg(short, long)]
        output: PathBuf,

        /// Output bit depth (16, 24 or 32)
        #[arg(long, default_value_t = 16)]
        bit_depth: u16,
    },

    /// Run a preset over an audio dictionary stored as JSON
    #[command(name = "process-json")]
    ProcessJson {
        /// JSON file with `waveform` and optional `sample_rate`
        #[arg(short, long)]
        input: PathBuf,

        /// Preset file name, extension included
        #[arg(short, long)]
        preset: String,

        /// Where to write the output dictionary (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_process() {
        let cli = Cli::try_parse_from([
            "pedalboard-cli",
            "--base-dir",
            "/tmp/nodes",
            "process",
            "-i",
            "in.wav",
            "-p",
            "warm.pdl",
            "-o",
            "out.wav",
        ])
        .unwrap();
        assert_eq!(cli.base_dir, Some(PathBuf::from("/tmp/nodes")));
        match cli.command {
            Some(Commands::Process {
                preset, bit_depth, ..
            }) => {
                assert_eq!(preset, "warm.pdl");
                assert_eq!(bit_depth, 16);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_check_preset() {
        let cli = Cli::try_parse_from(["pedalboard-cli", "check-preset", "space.pdl", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Some(Commands::CheckPreset { name, json: false }) if name == "space.pdl"
        ));

        let cli =
            Cli::try_parse_from(["pedalboard-cli", "check-preset", "space.pdl", "--json"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::CheckPreset { json: true, .. })));
    }
}
