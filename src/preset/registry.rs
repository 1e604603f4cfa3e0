//! Effect registry
//!
//! The only names a preset may mention. Each entry carries its constructor
//! signature (parameter order and defaults) and a builder. Arguments are
//! bound the way keyword-capable constructors bind them: positionals fill
//! parameters in order, keywords fill by name, the rest take defaults.

use crate::dsp::{
    Chorus, ChorusParams, Compressor, CompressorParams, Delay, Distortion, Effect, EffectChain,
    HighpassFilter, LadderFilter, LadderMode, LadderParams, Limiter, LowpassFilter, Phaser,
    PhaserParams, PitchShift, Reverb, ReverbParams,
};
use crate::error::{PedalboardError, Result};
use crate::preset::expr::{parse_effect_list, Arg, EffectCall, Literal};

/// Effect names a preset may reference
pub const ALLOWED_EFFECTS: [&str; 11] = [
    "Chorus",
    "Compressor",
    "Delay",
    "Distortion",
    "HighpassFilter",
    "LowpassFilter",
    "Phaser",
    "Reverb",
    "PitchShift",
    "Limiter",
    "LadderFilter",
];

/// A bound argument value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Float(f32),
    Mode(LadderMode),
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Mode(mode) => write!(f, "LadderFilter.Mode.{}", mode),
        }
    }
}

/// One constructor parameter
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub default: ParamValue,
}

const fn float(name: &'static str, default: f32) -> ParamSpec {
    ParamSpec {
        name,
        default: ParamValue::Float(default),
    }
}

type Builder = fn(&[ParamValue]) -> Result<Box<dyn Effect>>;

/// Constructor signature plus builder for one allow-listed effect
pub struct EffectSignature {
    pub name: &'static str,
    pub params: &'static [ParamSpec],
    build: Builder,
}

impl std::fmt::Debug for EffectSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectSignature")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}

impl std::fmt::Display for EffectSignature {
    /// `Delay(delay_seconds=0.5, feedback=0, mix=0.5)`
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| format!("{}={}", p.name, p.default))
            .collect();
        write!(f, "{}({})", self.name, params.join(", "))
    }
}

// ============================================================================
// Signature table
// ============================================================================

static SIGNATURES: [EffectSignature; 11] = [
    EffectSignature {
        name: "Chorus",
        params: &[
            float("rate_hz", 1.0),
            float("depth", 0.25),
            float("centre_delay_ms", 7.0),
            float("feedback", 0.0),
            float("mix", 0.5),
        ],
        build: build_chorus,
    },
    EffectSignature {
        name: "Compressor",
        params: &[
            float("threshold_db", 0.0),
            float("ratio", 1.0),
            float("attack_ms", 1.0),
            float("release_ms", 100.0),
        ],
        build: build_compressor,
    },
    EffectSignature {
        name: "Delay",
        params: &[
            float("delay_seconds", 0.5),
            float("feedback", 0.0),
            float("mix", 0.5),
        ],
        build: build_delay,
    },
    EffectSignature {
        name: "Distortion",
        params: &[float("drive_db", 25.0)],
        build: build_distortion,
    },
    EffectSignature {
        name: "HighpassFilter",
        params: &[float("cutoff_frequency_hz", 50.0)],
        build: build_highpass,
    },
    EffectSignature {
        name: "LowpassFilter",
        params: &[float("cutoff_frequency_hz", 50.0)],
        build: build_lowpass,
    },
    EffectSignature {
        name: "Phaser",
        params: &[
            float("rate_hz", 1.0),
            float("depth", 0.5),
            float("centre_frequency_hz", 1300.0),
            float("feedback", 0.0),
            float("mix", 0.5),
        ],
        build: build_phaser,
    },
    EffectSignature {
        name: "Reverb",
        params: &[
            float("room_size", 0.5),
            float("damping", 0.5),
            float("wet_level", 0.33),
            float("dry_level", 0.4),
            float("width", 1.0),
            float("freeze_mode", 0.0),
        ],
        build: build_reverb,
    },
    EffectSignature {
        name: "PitchShift",
        params: &[float("semitones", 0.0)],
        build: build_pitch_shift,
    },
    EffectSignature {
        name: "Limiter",
        params: &[float("threshold_db", -10.0), float("release_ms", 100.0)],
        build: build_limiter,
    },
    EffectSignature {
        name: "LadderFilter",
        params: &[
            ParamSpec {
                name: "mode",
                default: ParamValue::Mode(LadderMode::Lpf12),
            },
            float("cutoff_hz", 200.0),
            float("resonance", 0.0),
            float("drive", 1.0),
        ],
        build: build_ladder,
    },
];

/// Every allow-listed signature, in allow-list order
pub fn signatures() -> &'static [EffectSignature] {
    &SIGNATURES
}

/// Signature for an allow-listed name
pub fn lookup(name: &str) -> Option<&'static EffectSignature> {
    SIGNATURES.iter().find(|sig| sig.name == name)
}

// ============================================================================
// Builders
// ============================================================================

fn f(args: &[ParamValue], index: usize) -> Result<f32> {
    match args.get(index) {
        Some(ParamValue::Float(v)) => Ok(*v),
        other => Err(PedalboardError::evaluation(format!(
            "expected a number for argument {}, got {:?}",
            index, other
        ))),
    }
}

fn build_chorus(args: &[ParamValue]) -> Result<Box<dyn Effect>> {
    Ok(Box::new(Chorus::with_params(ChorusParams {
        rate_hz: f(args, 0)?,
        depth: f(args, 1)?,
        centre_delay_ms: f(args, 2)?,
        feedback: f(args, 3)?,
        mix: f(args, 4)?,
    })?))
}

fn build_compressor(args: &[ParamValue]) -> Result<Box<dyn Effect>> {
    Ok(Box::new(Compressor::with_params(CompressorParams {
        threshold_db: f(args, 0)?,
        ratio: f(args, 1)?,
        attack_ms: f(args, 2)?,
        release_ms: f(args, 3)?,
    })?))
}

fn build_delay(args: &[ParamValue]) -> Result<Box<dyn Effect>> {
    Ok(Box::new(Delay::new(f(args, 0)?, f(args, 1)?, f(args, 2)?)?))
}

fn build_distortion(args: &[ParamValue]) -> Result<Box<dyn Effect>> {
    Ok(Box::new(Distortion::new(f(args, 0)?)?))
}

fn build_highpass(args: &[ParamValue]) -> Result<Box<dyn Effect>> {
    Ok(Box::new(HighpassFilter::new(f(args, 0)?)?))
}

fn build_lowpass(args: &[ParamValue]) -> Result<Box<dyn Effect>> {
    Ok(Box::new(LowpassFilter::new(f(args, 0)?)?))
}

fn build_phaser(args: &[ParamValue]) -> Result<Box<dyn Effect>> {
    Ok(Box::new(Phaser::with_params(PhaserParams {
        rate_hz: f(args, 0)?,
        depth: f(args, 1)?,
        centre_frequency_hz: f(args, 2)?,
        feedback: f(args, 3)?,
        mix: f(args, 4)?,
    })?))
}

fn build_reverb(args: &[ParamValue]) -> Result<Box<dyn Effect>> {
    Ok(Box::new(Reverb::with_params(ReverbParams {
        room_size: f(args, 0)?,
        damping: f(args, 1)?,
        wet_level: f(args, 2)?,
        dry_level: f(args, 3)?,
        width: f(args, 4)?,
        freeze_mode: f(args, 5)?,
    })?))
}

fn build_pitch_shift(args: &[ParamValue]) -> Result<Box<dyn Effect>> {
    Ok(Box::new(PitchShift::new(f(args, 0)?)?))
}

fn build_limiter(args: &[ParamValue]) -> Result<Box<dyn Effect>> {
    Ok(Box::new(Limiter::new(f(args, 0)?, f(args, 1)?)?))
}

fn build_ladder(args: &[ParamValue]) -> Result<Box<dyn Effect>> {
    let mode = match args.first() {
        Some(ParamValue::Mode(mode)) => *mode,
        other => {
            return Err(PedalboardError::evaluation(format!(
                "expected a LadderFilter.Mode, got {:?}",
                other
            )))
        }
    };
    Ok(Box::new(LadderFilter::with_params(LadderParams {
        mode,
        cutoff_hz: f(args, 1)?,
        resonance: f(args, 2)?,
        drive: f(args, 3)?,
    })?))
}

// ============================================================================
// Binding
// ============================================================================

fn not_defined(name: &str) -> PedalboardError {
    PedalboardError::evaluation(format!("name '{}' is not defined", name))
}

/// Convert a literal to the kind the parameter's default has
fn coerce(sig: &EffectSignature, spec: &ParamSpec, value: &Literal) -> Result<ParamValue> {
    // Any dotted name must start from an allow-listed root
    if let Literal::Path(parts) = value {
        let root = parts.first().map(String::as_str).unwrap_or_default();
        if lookup(root).is_none() {
            return Err(not_defined(root));
        }
    }

    let type_error = |expected: &str| {
        PedalboardError::evaluation(format!(
            "{}() argument '{}' must be {}, not {}",
            sig.name, spec.name, expected, value
        ))
    };

    match (spec.default, value) {
        (ParamValue::Float(_), Literal::Number(n)) => Ok(ParamValue::Float(*n as f32)),
        // Booleans are integers in the source language of presets
        (ParamValue::Float(_), Literal::Bool(b)) => {
            Ok(ParamValue::Float(if *b { 1.0 } else { 0.0 }))
        }
        (ParamValue::Float(_), _) => Err(type_error("a number")),
        (ParamValue::Mode(_), Literal::Path(parts)) => match parts.as_slice() {
            [root, mode_attr, member] if root == "LadderFilter" && mode_attr == "Mode" => {
                LadderMode::from_name(member).map(ParamValue::Mode).ok_or_else(|| {
                    PedalboardError::evaluation(format!(
                        "type object 'LadderFilter.Mode' has no attribute '{}'",
                        member
                    ))
                })
            }
            _ => Err(type_error("LadderFilter.Mode")),
        },
        (ParamValue::Mode(_), _) => Err(type_error("LadderFilter.Mode")),
    }
}

/// Bind call arguments against a signature, filling defaults
pub fn bind_arguments(sig: &EffectSignature, args: &[Arg]) -> Result<Vec<ParamValue>> {
    let mut bound: Vec<Option<ParamValue>> = vec![None; sig.params.len()];
    let mut positional = 0usize;

    for arg in args {
        let (index, value) = match arg {
            Arg::Positional(value) => {
                if positional >= sig.params.len() {
                    let given = args
                        .iter()
                        .filter(|a| matches!(a, Arg::Positional(_)))
                        .count();
                    return Err(PedalboardError::evaluation(format!(
                        "{}() takes at most {} positional arguments ({} given)",
                        sig.name,
                        sig.params.len(),
                        given
                    )));
                }
                positional += 1;
                (positional - 1, value)
            }
            Arg::Keyword { name, value } => {
                let index = sig
                    .params
                    .iter()
                    .position(|p| p.name == name)
                    .ok_or_else(|| {
                        PedalboardError::evaluation(format!(
                            "{}() got an unexpected keyword argument '{}'",
                            sig.name, name
                        ))
                    })?;
                (index, value)
            }
        };

        let spec = &sig.params[index];
        if bound[index].is_some() {
            return Err(PedalboardError::evaluation(format!(
                "{}() got multiple values for argument '{}'",
                sig.name, spec.name
            )));
        }
        bound[index] = Some(coerce(sig, spec, value)?);
    }

    Ok(bound
        .into_iter()
        .zip(sig.params)
        .map(|(value, spec)| value.unwrap_or(spec.default))
        .collect())
}

/// Resolve, bind and construct one call
pub fn build_effect(call: &EffectCall) -> Result<Box<dyn Effect>> {
    let sig = lookup(&call.name).ok_or_else(|| not_defined(&call.name))?;
    let args = bind_arguments(sig, &call.args)?;
    (sig.build)(&args).map_err(|e| match e {
        PedalboardError::EvaluationFailed { .. } => e,
        other => PedalboardError::evaluation(other.to_string()),
    })
}

/// Parse an effect-list literal and build the chain it describes
///
/// # Errors
/// `EvaluationFailed` for syntax errors, names outside the allow-list and
/// arguments the constructors reject.
pub fn evaluate_chain(source: &str) -> Result<EffectChain> {
    let calls = parse_effect_list(source)?;
    let effects = calls
        .iter()
        .map(build_effect)
        .collect::<Result<Vec<_>>>()?;
    Ok(EffectChain::from_effects(effects))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn reason(source: &str) -> String {
        match evaluate_chain(source) {
            Err(PedalboardError::EvaluationFailed { reason }) => reason,
            other => panic!("expected evaluation failure, got {:?}", other.map(|c| c.to_string())),
        }
    }

    #[test]
    fn test_table_matches_allow_list() {
        let names: Vec<&str> = signatures().iter().map(|s| s.name).collect();
        assert_eq!(names, ALLOWED_EFFECTS.to_vec());
    }

    #[test]
    fn test_every_effect_builds_with_defaults() {
        let source = format!(
            "[{}]",
            ALLOWED_EFFECTS
                .iter()
                .map(|name| format!("{}()", name))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let chain = evaluate_chain(&source).unwrap();
        assert_eq!(chain.effect_types(), ALLOWED_EFFECTS.to_vec());
    }

    #[test]
    fn test_positional_and_keyword_bind_identically() {
        let positional = evaluate_chain("[Delay(0.25, 0.3, 0.4)]").unwrap();
        let keyword = evaluate_chain("[Delay(mix=0.4, delay_seconds=0.25, feedback=0.3)]").unwrap();
        let mixed = evaluate_chain("[Delay(0.25, mix=0.4, feedback=0.3)]").unwrap();
        let params = |chain: &EffectChain| chain.iter().next().unwrap().get_params();
        assert_eq!(params(&positional), params(&keyword));
        assert_eq!(params(&positional), params(&mixed));
    }

    #[test]
    fn test_defaults_fill_missing() {
        let chain = evaluate_chain("[Reverb(wet_level=0.5)]").unwrap();
        let params = chain.iter().next().unwrap().get_params();
        assert_eq!(params["room_size"], serde_json::json!(0.5));
        assert_eq!(params["wet_level"], serde_json::json!(0.5));
        assert_eq!(params["freeze_mode"], serde_json::json!(0.0));
    }

    #[test]
    fn test_ladder_mode_path() {
        let chain =
            evaluate_chain("[LadderFilter(LadderFilter.Mode.HPF24, cutoff_hz=900, drive=2)]").unwrap();
        let params = chain.iter().next().unwrap().get_params();
        assert_eq!(params["mode"], serde_json::json!("HPF24"));
        assert_eq!(params["cutoff_hz"], serde_json::json!(900.0));
    }

    #[test]
    fn test_commented_multiline_chain() {
        let chain =
            evaluate_chain("[\n  Reverb(room_size=0.5),  # big room\n  Delay(0.25)\n]").unwrap();
        assert_eq!(chain.effect_types(), vec!["Reverb", "Delay"]);
    }

    #[test]
    fn test_empty_list_is_empty_chain() {
        assert!(evaluate_chain("[]").unwrap().is_empty());
    }

    #[test_case("[Gain(6)]", "name 'Gain' is not defined" ; "unknown effect")]
    #[test_case("[open('x')]", "name 'open' is not defined" ; "builtin")]
    #[test_case("[LadderFilter(mode=os.Mode.LPF12)]", "name 'os' is not defined" ; "foreign path root")]
    #[test_case("[Reverb(room_size=secret)]", "name 'secret' is not defined" ; "bare foreign name")]
    fn test_rejects_names_outside_allow_list(source: &str, expected: &str) {
        assert_eq!(reason(source), expected);
    }

    #[test_case("[Distortion(1, 2)]", "at most 1 positional" ; "too many positionals")]
    #[test_case("[Delay(time=1)]", "unexpected keyword argument 'time'" ; "unknown keyword")]
    #[test_case("[Delay(0.2, delay_seconds=0.3)]", "multiple values for argument 'delay_seconds'" ; "duplicate")]
    #[test_case("[Delay('long')]", "must be a number" ; "string for number")]
    #[test_case("[LadderFilter(mode=3)]", "must be LadderFilter.Mode" ; "number for mode")]
    #[test_case("[LadderFilter(LadderFilter.Mode.NOTCH)]", "no attribute 'NOTCH'" ; "unknown mode")]
    #[test_case("[PitchShift(96)]", "semitones" ; "out of range")]
    #[test_case("[Reverb(", "invalid syntax" ; "syntax")]
    fn test_rejects_bad_arguments(source: &str, fragment: &str) {
        let reason = reason(source);
        assert!(reason.contains(fragment), "{:?} lacks {:?}", reason, fragment);
    }

    #[test]
    fn test_bool_coerces_to_number() {
        let chain = evaluate_chain("[Reverb(freeze_mode=True)]").unwrap();
        let params = chain.iter().next().unwrap().get_params();
        assert_eq!(params["freeze_mode"], serde_json::json!(1.0));
    }

    #[test]
    fn test_signature_display() {
        assert_eq!(
            lookup("Limiter").unwrap().to_string(),
            "Limiter(threshold_db=-10, release_ms=100)"
        );
        assert_eq!(
            lookup("LadderFilter").unwrap().to_string(),
            "LadderFilter(mode=LadderFilter.Mode.LPF12, cutoff_hz=200, resonance=0, drive=1)"
        );
    }
}
