//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::fs;
use std::path::Path;

use log::{info, warn};
use serde_json::{json, Value};

use crate::audio::{export_wav, import_wav, Waveform};
use crate::error::{PedalboardError, Result};
use crate::node::{AudioInput, PedalboardNode, PresetReport};

/// Line printed under a failed command
pub fn failure_hint(err: &PedalboardError) -> String {
    format!("Hint: {}", err.recovery_hint())
}

/// Print every preset the node would offer in its dropdown.
pub fn list_presets(node: &PedalboardNode) -> Result<()> {
    info!("Listing presets in: {}", node.library().dir().display());

    let presets = node.library().list();
    if presets.is_empty() {
        println!("No presets found in {}", node.library().dir().display());
        return Ok(());
    }

    for name in presets {
        println!("{}", name);
    }

    Ok(())
}

/// Print the node descriptor and input declaration as JSON.
pub fn describe(node: &PedalboardNode) -> Result<()> {
    let value = json!({
        "descriptor": node.descriptor(),
        "input_types": node.input_types(),
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

/// JSON form of a preset report
pub fn report_json(report: &PresetReport) -> Value {
    json!({
        "preset": report.preset.name,
        "path": report.preset.path,
        "sha256": report.preset.digest(),
        "output_name": report.literal.output_name,
        "chain": report.chain.to_json(),
    })
}

/// Parse and evaluate a preset, then print what it builds.
pub fn check_preset(node: &PedalboardNode, name: &str, as_json: bool) -> Result<()> {
    info!("Checking preset: {}", name);

    let report = node.inspect_preset(name)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report_json(&report))?);
        return Ok(());
    }

    println!("Preset: {}", report.preset.name);
    println!("Path: {}", report.preset.path.display());
    println!("SHA-256: {}", report.preset.digest());
    println!("Output name: {}", report.literal.output_name);
    println!("{:-<60}", "");

    if report.chain.is_empty() {
        println!("Empty chain (audio passes through)");
    }
    for (i, effect) in report.chain.iter().enumerate() {
        println!("{:>3}. {}", i + 1, effect.describe());
    }

    Ok(())
}

/// Run a preset over a WAV file and write the normalized result.
pub fn process_wav(
    node: &PedalboardNode,
    input: &Path,
    preset: &str,
    output: &Path,
    bit_depth: u16,
) -> Result<()> {
    info!("Processing {} with preset {}", input.display(), preset);

    let source = import_wav(input)?;
    let audio = AudioInput::new(Waveform::from_audio_buffer(&source)?, source.sample_rate);

    let result = node.process(&audio, preset)?;
    let buffer = result.to_audio_buffer()?;
    if !buffer.is_finite() {
        warn!("Processed audio contains non-finite samples");
    }
    export_wav(&buffer, output, bit_depth)?;

    println!("Written: {}", output.display());
    println!(
        "Channels: {}  Duration: {:.2}s  Peak: {:.2} dB",
        buffer.num_channels(),
        buffer.duration_secs(),
        buffer.peak_db()
    );

    Ok(())
}

/// Run a preset over an audio dictionary stored as JSON.
pub fn process_json(
    node: &PedalboardNode,
    input: &Path,
    preset: &str,
    output: Option<&Path>,
) -> Result<()> {
    info!("Processing {} with preset {}", input.display(), preset);

    let text = fs::read_to_string(input)?;
    let audio: Value = serde_json::from_str(&text)?;

    let result = node.process_value(&audio, preset)?;
    let rendered = serde_json::to_string(&result.to_value())?;

    match output {
        Some(path) => {
            fs::write(path, rendered)?;
            println!("Written: {}", path.display());
        }
        None => println!("{}", rendered),
    }

    Ok(())
}
