//! Preset handling
//!
//! Lookup in the preset folder, extraction of the chain literal, and
//! restricted evaluation of that literal into an `EffectChain`.

pub mod expr;
pub mod extract;
pub mod library;
pub mod registry;

pub use expr::{parse_effect_list, Arg, EffectCall, ExprError, Literal};
pub use extract::{ChainExtractor, ChainLiteral};
pub use library::{Preset, PresetLibrary};
pub use registry::{
    bind_arguments, build_effect, evaluate_chain, lookup, signatures, EffectSignature, ParamSpec,
    ParamValue, ALLOWED_EFFECTS,
};
