//! Texturing configuration for the tile compiler.
//!
//! One RON document describes, per generator, the candidate materials for
//! each size slot and the tuning options. It is loaded once per compile and
//! treated as immutable afterwards.

mod config;
mod error;

pub use config::{
    Algorithm, CONFIG_FILE, DebugConfig, GenOptions, GeneratorConfig, MaterialEntry,
    MaterialSpec, OptionOverrides, TexturingConfig, default_weights,
};
pub use error::ConfigError;
