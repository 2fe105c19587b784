//! Maqam and jins transposition search over microtonal pitch tables, and
//! classification of every realizable transposition by 12-tone chromatic set.
//!
//! The engine itself is total: missing notes, short templates and empty tables
//! produce empty results rather than errors. [`Error`] covers only the I/O
//! surfaces ([`catalog`] and [`config`]).

pub mod catalog;
pub mod chromatic;
pub mod classify;
pub mod config;
pub mod family;
pub mod interval;
pub mod octave;
pub mod pitch;
pub mod ratio;
pub mod search;
pub mod transpose;
pub mod tuning;
pub mod types;
pub mod validate;

#[cfg(test)]
mod test_support;

use std::path::PathBuf;

pub use catalog::Catalog;
pub use chromatic::{build_own_set, build_twelve_tone_set, is_compatible, ChromaticSet, Incompatibility};
pub use classify::{
    classify, classify_by_own_pitch_classes, partition, realize_all, Classification, ClassificationSet,
    ClassifyOptions, IncompatibleInstance, InstanceKey, PitchClassSetBuilder,
};
pub use config::AnalysisConfig;
pub use family::{classify_families, classify_family, FamilyClassification, JinsSource, MaqamFamily};
pub use interval::Interval;
pub use pitch::{LetterClass, PitchClass, ValueType};
pub use ratio::{Fraction, ParseFractionError};
pub use search::{find_pattern, Direction, MatchMode};
pub use transpose::{jins_transpositions, maqam_transpositions, transpose_sayr, TranspositionOptions};
pub use tuning::{TuningSystem, TuningSystemData};
pub use types::{JinsRealization, JinsTemplate, MaqamRealization, MaqamTemplate, Sayr};
pub use validate::{is_jins_transposable_to, is_transposable_to};

/// Cents tolerance used when a caller has no opinion.
pub const DEFAULT_CENTS_TOLERANCE: f64 = 5.0;

/// Errors from loading catalogs and configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("invalid value for {name}: {value}")]
    Env { name: String, value: String },

    #[error("unknown tuning system: {0}")]
    UnknownTuningSystem(String),

    #[error("unknown maqam: {0}")]
    UnknownMaqam(String),

    #[error("unknown jins: {0}")]
    UnknownJins(String),
}

pub type Result<T> = std::result::Result<T, Error>;
