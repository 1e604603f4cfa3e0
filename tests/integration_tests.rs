//! Integration Tests
//!
//! End-to-end tests for the pedalboard node: preset folder on disk, audio
//! in, normalized audio out.

use std::f32::consts::PI;
use std::fs;

use approx::assert_relative_eq;
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;
use test_case::test_case;

use pedalboard_node::preset::ALLOWED_EFFECTS;
use pedalboard_node::{AudioInput, NodeConfig, PedalboardNode, Waveform};

const SAMPLE_RATE: u32 = 44100;

/// Node rooted in a fresh temp dir, with the given presets written to disk
fn node_with_presets(presets: &[(&str, &str)]) -> (TempDir, PedalboardNode) {
    let dir = TempDir::new().unwrap();
    let config = NodeConfig::with_base_dir(dir.path());
    fs::create_dir_all(config.preset_dir()).unwrap();
    for (name, text) in presets {
        fs::write(config.preset_dir().join(name), text).unwrap();
    }
    let node = PedalboardNode::new(config).unwrap();
    (dir, node)
}

/// Channel-major sine: shape (channels, samples)
fn sine(channels: usize, samples: usize, amplitude: f32) -> Waveform {
    let mut data = Vec::with_capacity(channels * samples);
    for ch in 0..channels {
        let freq = 220.0 * (ch + 1) as f32;
        data.extend((0..samples).map(|i| {
            amplitude * (2.0 * PI * freq * i as f32 / SAMPLE_RATE as f32).sin()
        }));
    }
    Waveform::new(vec![channels, samples], data).unwrap()
}

fn peak(data: &[f32]) -> f32 {
    data.iter().fold(0.0f32, |m, s| m.max(s.abs()))
}

fn read_log(node: &PedalboardNode) -> String {
    fs::read_to_string(node.log().path()).unwrap_or_default()
}

// === Full Pipeline Tests ===

#[test]
fn test_process_stereo_returns_host_layout() {
    let (_dir, node) = node_with_presets(&[(
        "warm.pdl",
        r#"[LowpassFilter(cutoff_frequency_hz=4000), Reverb(room_size=0.6)], "warm.wav""#,
    )]);
    let input = AudioInput::new(sine(2, 4096, 0.3), SAMPLE_RATE);

    let output = node.process(&input, "warm.pdl").unwrap();

    assert_eq!(output.waveform.shape(), &[1, 2, 4096]);
    assert_eq!(output.sample_rate, SAMPLE_RATE);
    assert_eq!(output.path, None);
    assert!(peak(output.waveform.data()) <= 1.0);
}

#[test]
fn test_one_dimensional_input_becomes_mono() {
    let (_dir, node) = node_with_presets(&[("gain.pdl", r#"[Compressor()], "out.wav""#)]);
    let samples: Vec<f32> = (0..1000).map(|i| (i as f32 * 0.01).sin() * 0.25).collect();
    let input = AudioInput::new(Waveform::new(vec![1000], samples).unwrap(), SAMPLE_RATE);

    let output = node.process(&input, "gain.pdl").unwrap();

    assert_eq!(output.waveform.shape(), &[1, 1, 1000]);
}

#[test]
fn test_frame_major_input_is_transposed() {
    let (_dir, node) = node_with_presets(&[("empty.pdl", r#"[], "out.wav""#)]);
    // (samples, channels): left ramps up, right is constant
    let mut data = Vec::new();
    for i in 0..500 {
        data.push(i as f32 / 1000.0);
        data.push(-0.25);
    }
    let input = AudioInput::new(Waveform::new(vec![500, 2], data).unwrap(), SAMPLE_RATE);

    let output = node.process(&input, "empty.pdl").unwrap();

    assert_eq!(output.waveform.shape(), &[1, 2, 500]);
    let out = output.waveform.data();
    assert_relative_eq!(out[499], 0.499, epsilon = 1e-6);
    assert_relative_eq!(out[500], -0.25, epsilon = 1e-6);
}

#[test]
fn test_empty_chain_passes_quiet_audio_through() {
    let (_dir, node) = node_with_presets(&[("empty.pdl", r#"[], "out.wav""#)]);
    let input = AudioInput::new(sine(1, 2048, 0.5), SAMPLE_RATE);

    let output = node.process(&input, "empty.pdl").unwrap();

    let original = input.waveform.as_ref().unwrap().data();
    for (out, inp) in output.waveform.data().iter().zip(original) {
        assert_relative_eq!(*out, *inp, epsilon = 1e-6);
    }
}

#[test]
fn test_clipping_audio_is_scaled_by_its_peak() {
    let (_dir, node) = node_with_presets(&[("empty.pdl", r#"[], "out.wav""#)]);
    let input = AudioInput::new(sine(2, 2048, 4.0), SAMPLE_RATE);

    let output = node.process(&input, "empty.pdl").unwrap();

    let original = input.waveform.as_ref().unwrap().data();
    let original_peak = peak(original);
    for (out, inp) in output.waveform.data().iter().zip(original) {
        assert_relative_eq!(*out, inp / original_peak, epsilon = 1e-6);
    }
    assert_relative_eq!(peak(output.waveform.data()), 1.0, epsilon = 1e-6);
}

#[test]
fn test_loud_chain_never_exceeds_unit_peak() {
    let (_dir, node) = node_with_presets(&[(
        "fuzz.pdl",
        r#"[Distortion(drive_db=40), Delay(0.01, feedback=0.9, mix=1.0)], "fuzz.wav""#,
    )]);
    let input = AudioInput::new(sine(2, 8192, 4.0), SAMPLE_RATE);

    let output = node.process(&input, "fuzz.pdl").unwrap();

    let out_peak = peak(output.waveform.data());
    assert!(out_peak <= 1.0, "peak {} above unity", out_peak);
}

#[test]
fn test_silent_input_stays_silent() {
    let (_dir, node) = node_with_presets(&[("empty.pdl", r#"[], "out.wav""#)]);
    let input = AudioInput::new(Waveform::new(vec![1, 1, 64], vec![0.0; 64]).unwrap(), SAMPLE_RATE);

    let output = node.process(&input, "empty.pdl").unwrap();

    assert!(output.waveform.data().iter().all(|s| *s == 0.0));
}

#[test]
fn test_missing_sample_rate_uses_default() {
    let (_dir, node) = node_with_presets(&[("empty.pdl", r#"[], "out.wav""#)]);
    let input = AudioInput {
        waveform: Some(sine(1, 256, 0.5)),
        sample_rate: None,
    };

    let output = node.process(&input, "empty.pdl").unwrap();

    assert_eq!(output.sample_rate, node.config().default_sample_rate);
}

// === Preset Tests ===

#[test]
fn test_keyword_and_positional_presets_match() {
    let (_dir, node) = node_with_presets(&[
        ("kw.pdl", r#"[Chorus(rate_hz=2.0, depth=0.4), Limiter(threshold_db=-6)], "a.wav""#),
        ("pos.pdl", r#"[Chorus(2.0, 0.4), Limiter(-6)], "b.wav""#),
    ]);
    let input = AudioInput::new(sine(2, 4096, 0.8), SAMPLE_RATE);

    let kw = node.process(&input, "kw.pdl").unwrap();
    let pos = node.process(&input, "pos.pdl").unwrap();

    for (a, b) in kw.waveform.data().iter().zip(pos.waveform.data()) {
        assert_relative_eq!(*a, *b, epsilon = 1e-6);
    }
}

#[test_case("Chorus()" ; "chorus")]
#[test_case("Compressor(threshold_db=-20, ratio=4)" ; "compressor")]
#[test_case("Delay(0.05, 0.5, 0.5)" ; "delay")]
#[test_case("Distortion(30)" ; "distortion")]
#[test_case("HighpassFilter(200)" ; "highpass")]
#[test_case("LowpassFilter(800)" ; "lowpass")]
#[test_case("Phaser(rate_hz=0.5, feedback=0.5)" ; "phaser")]
#[test_case("Reverb(room_size=0.9, freeze_mode=1.0)" ; "reverb frozen")]
#[test_case("PitchShift(semitones=-5)" ; "pitch shift")]
#[test_case("Limiter(-3, 50)" ; "limiter")]
#[test_case("LadderFilter(LadderFilter.Mode.BPF24, cutoff_hz=1000, resonance=0.9, drive=3)" ; "ladder")]
fn test_every_effect_produces_finite_output(call: &str) {
    let text = format!("[{}], \"out.wav\"", call);
    let (_dir, node) = node_with_presets(&[("fx.pdl", text.as_str())]);
    let input = AudioInput::new(sine(2, 4096, 0.7), SAMPLE_RATE);

    let output = node.process(&input, "fx.pdl").unwrap();

    assert_eq!(output.waveform.shape(), &[1, 2, 4096]);
    assert!(output.waveform.data().iter().all(|s| s.is_finite() && s.abs() <= 1.0));
}

#[test]
fn test_all_allow_listed_names_in_one_preset() {
    let chain = ALLOWED_EFFECTS
        .iter()
        .map(|name| format!("{}()", name))
        .collect::<Vec<_>>()
        .join(", ");
    let text = format!("[{}], \"all.wav\"", chain);
    let (_dir, node) = node_with_presets(&[("all.pdl", text.as_str())]);

    let report = node.inspect_preset("all.pdl").unwrap();

    assert_eq!(report.chain.effect_types(), ALLOWED_EFFECTS.to_vec());
    assert_eq!(report.literal.output_name, "all.wav");
}

#[test_case(r#"[__import__("os").system("true")], "x.wav""# ; "import")]
#[test_case(r#"[Reverb(), open("secrets")], "x.wav""# ; "open")]
#[test_case(r#"[Gain(6)], "x.wav""# ; "unknown effect")]
fn test_names_outside_allow_list_are_rejected(text: &str) {
    let (_dir, node) = node_with_presets(&[("bad.pdl", text)]);
    let input = AudioInput::new(sine(1, 128, 0.5), SAMPLE_RATE);

    let err = node.process(&input, "bad.pdl").unwrap_err();

    assert_eq!(err.error_code(), "EVALUATION_FAILED");
    assert!(read_log(&node).contains("Error evaluating effect chain:"));
}

#[test]
fn test_invalid_format_is_reported() {
    let (_dir, node) = node_with_presets(&[("bad.pdl", "Reverb()")]);
    let input = AudioInput::new(sine(1, 128, 0.5), SAMPLE_RATE);

    let err = node.process(&input, "bad.pdl").unwrap_err();

    assert_eq!(err.error_code(), "INVALID_PRESET_FORMAT");
    assert!(read_log(&node).contains("Expected format: [effects_chain], \"output.wav\""));
}

#[test]
fn test_missing_preset_fails_before_processing() {
    let (_dir, node) = node_with_presets(&[]);
    let input = AudioInput::new(sine(1, 128, 0.5), SAMPLE_RATE);

    let err = node.process(&input, "nowhere.pdl").unwrap_err();

    assert_eq!(err.error_code(), "PRESET_NOT_FOUND");
    assert_eq!(err.to_string(), "Preset file nowhere.pdl not found");
    let log = read_log(&node);
    assert!(log.contains("does not exist"));
    assert!(!log.contains("Extracted effect chain"));
}

#[test]
fn test_unreadable_preset_is_reported() {
    let (_dir, node) = node_with_presets(&[]);
    fs::write(
        node.library().dir().join("latin1.pdl"),
        b"[Reverb()], \"caf\xe9.wav\"",
    )
    .unwrap();
    let input = AudioInput::new(sine(1, 128, 0.5), SAMPLE_RATE);

    let err = node.process(&input, "latin1.pdl").unwrap_err();

    assert_eq!(err.error_code(), "PRESET_READ");
    let log = read_log(&node);
    assert!(log.contains("Error reading preset file:"));
    assert!(!log.contains("Extracted effect chain"));
}

#[test]
fn test_non_finite_output_fails_processing() {
    let (_dir, node) = node_with_presets(&[("drive.pdl", r#"[Distortion()], "drive.wav""#)]);
    let mut data = vec![0.25_f32; 256];
    data[100] = f32::NAN;
    let input = AudioInput::new(Waveform::new(vec![1, 1, 256], data).unwrap(), SAMPLE_RATE);

    let err = node.process(&input, "drive.pdl").unwrap_err();

    assert_eq!(err.error_code(), "PROCESSING_FAILED");
    let log = read_log(&node);
    assert!(log.contains("Error processing audio through Pedalboard:"));
    assert!(!log.contains("Maximum absolute value before normalization"));
}

// === Host Dictionary Tests ===

#[test]
fn test_process_value_round_trips_dictionary() {
    let (_dir, node) = node_with_presets(&[("empty.pdl", r#"[], "out.wav""#)]);
    let audio = json!({
        "waveform": [[[0.1, -0.2, 0.4], [0.0, 0.2, -0.1]]],
        "sample_rate": 22050,
    });

    let output = node.process_value(&audio, "empty.pdl").unwrap().to_value();

    assert_eq!(output["sample_rate"], json!(22050));
    assert_eq!(output["path"], json!(null));
    let waveform = output["waveform"].as_array().unwrap();
    assert_eq!(waveform.len(), 1);
    assert_eq!(waveform[0].as_array().unwrap().len(), 2);
    assert_relative_eq!(waveform[0][0][2].as_f64().unwrap(), 0.4, epsilon = 1e-6);
}

#[test_case(json!("audio"), "INPUT_NOT_OBJECT", "Error: Input audio is not a dictionary" ; "not object")]
#[test_case(json!({"sample_rate": 44100}), "MISSING_WAVEFORM", "Error: Input audio missing 'waveform' key" ; "no waveform")]
#[test_case(json!({"waveform": null}), "NULL_WAVEFORM", "Error: Input audio waveform is None" ; "null waveform")]
fn test_bad_dictionaries_are_logged(audio: serde_json::Value, code: &str, line: &str) {
    let (_dir, node) = node_with_presets(&[("empty.pdl", r#"[], "out.wav""#)]);

    let err = node.process_value(&audio, "empty.pdl").unwrap_err();

    assert_eq!(err.error_code(), code);
    assert!(read_log(&node).contains(line));
}

#[test]
fn test_log_records_each_step_in_order() {
    let (_dir, node) = node_with_presets(&[("verb.pdl", r#"[Reverb()], "verb.wav""#)]);
    let input = AudioInput::new(sine(2, 512, 0.5), SAMPLE_RATE);

    node.process(&input, "verb.pdl").unwrap();

    let log = read_log(&node);
    let steps = [
        "Starting DJZ_Pedalboard processing...",
        "Using sample rate: 44100",
        "Audio data shape after conversion for processing: (512, 2)",
        "Extracted effect chain: [Reverb()]",
        "Evaluated effects list:",
        "Maximum absolute value before normalization:",
        "Converted processed audio to tensor with shape [1, 2, 512]",
        "DJZ_Pedalboard processing complete. Returning final output.",
    ];
    let mut from = 0;
    for step in steps {
        let at = log[from..]
            .find(step)
            .unwrap_or_else(|| panic!("missing log step {:?} in:\n{}", step, log));
        from += at + step.len();
    }
}

#[test]
fn test_input_types_lists_presets() {
    let (_dir, node) = node_with_presets(&[
        ("b.pdl", r#"[], "b.wav""#),
        ("a.pdl", r#"[], "a.wav""#),
        ("notes.txt", "not a preset"),
    ]);

    let types = node.input_types();

    assert_eq!(types["required"]["audio"], json!(["AUDIO"]));
    assert_eq!(types["required"]["effect_presets"], json!([["a.pdl", "b.pdl"]]));
}
