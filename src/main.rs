//! DJZ Pedalboard CLI
//!
//! Command-line front end for the pedalboard node.

use std::env;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use pedalboard_node::cli::commands;
use pedalboard_node::cli::{Cli, Commands};
use pedalboard_node::logging::init_tracing;
use pedalboard_node::{NodeConfig, PedalboardNode};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    info!("DJZ Pedalboard v{}", env!("CARGO_PKG_VERSION"));

    let config = match (&cli.config, &cli.base_dir) {
        (Some(path), _) => NodeConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        (None, Some(dir)) => NodeConfig::with_base_dir(dir),
        (None, None) => NodeConfig::with_base_dir(
            env::current_dir().context("resolving current directory")?,
        ),
    };
    let node = PedalboardNode::new(config).context("initializing node")?;

    match cli.command {
        Some(cmd) => handle_command(&node, cmd),
        None => {
            println!("DJZ Pedalboard v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

/// Print the error's recovery hint before handing it to anyhow
fn hinted<T>(result: pedalboard_node::Result<T>) -> pedalboard_node::Result<T> {
    result.map_err(|err| {
        eprintln!("{}", commands::failure_hint(&err));
        err
    })
}

fn handle_command(node: &PedalboardNode, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::ListPresets => hinted(commands::list_presets(node))?,
        Commands::Describe => hinted(commands::describe(node))?,
        Commands::CheckPreset { name, json } => hinted(commands::check_preset(node, &name, json))
            .with_context(|| format!("checking preset {}", name))?,
        Commands::Process {
            input,
            preset,
            output,
            bit_depth,
        } => hinted(commands::process_wav(node, &input, &preset, &output, bit_depth))
            .with_context(|| format!("processing {}", input.display()))?,
        Commands::ProcessJson {
            input,
            preset,
            output,
        } => hinted(commands::process_json(node, &input, &preset, output.as_deref()))
            .with_context(|| format!("processing {}", input.display()))?,
    }
    Ok(())
}
