use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ratio::{self, Fraction};

/// Which representation of a tuning system's pitches was supplied by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Fraction,
    Cents,
    DecimalRatio,
    StringLength,
}

impl ValueType {
    /// Rational sources are matched by exact ratio equality.
    pub fn is_rational(&self) -> bool {
        matches!(self, ValueType::Fraction | ValueType::DecimalRatio)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Fraction => write!(f, "fraction"),
            ValueType::Cents => write!(f, "cents"),
            ValueType::DecimalRatio => write!(f, "decimal_ratio"),
            ValueType::StringLength => write!(f, "string_length"),
        }
    }
}

/// One of the twelve chromatic reference letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LetterClass {
    #[serde(rename = "C")]
    C,
    #[serde(rename = "C#")]
    CSharp,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "D#")]
    DSharp,
    #[serde(rename = "E")]
    E,
    #[serde(rename = "F")]
    F,
    #[serde(rename = "F#")]
    FSharp,
    #[serde(rename = "G")]
    G,
    #[serde(rename = "G#")]
    GSharp,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "A#")]
    ASharp,
    #[serde(rename = "B")]
    B,
}

const LETTER_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

impl LetterClass {
    /// Chromatic order starting at C.
    pub const ALL: [LetterClass; 12] = [
        LetterClass::C,
        LetterClass::CSharp,
        LetterClass::D,
        LetterClass::DSharp,
        LetterClass::E,
        LetterClass::F,
        LetterClass::FSharp,
        LetterClass::G,
        LetterClass::GSharp,
        LetterClass::A,
        LetterClass::ASharp,
        LetterClass::B,
    ];

    /// Semitone position, C = 0.
    pub fn semitone(&self) -> u8 {
        *self as u8
    }

    pub fn from_semitone(semitone: i64) -> LetterClass {
        Self::ALL[semitone.rem_euclid(12) as usize]
    }

    /// Nearest letter to a fractional MIDI note number.
    pub fn nearest_to_midi(midi_note_decimal: f64) -> LetterClass {
        Self::from_semitone(midi_note_decimal.round() as i64)
    }

    /// Next letter upward, wrapping B to C.
    pub fn next(&self) -> LetterClass {
        Self::from_semitone(self.semitone() as i64 + 1)
    }

    /// The twelve letters in chromatic order beginning at `self`.
    pub fn chromatic_walk(&self) -> impl Iterator<Item = LetterClass> {
        let start = self.semitone() as i64;
        (0..12).map(move |step| LetterClass::from_semitone(start + step))
    }

    pub fn name(&self) -> &'static str {
        LETTER_NAMES[self.semitone() as usize]
    }
}

impl fmt::Display for LetterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error parsing a letter class.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown letter class: {0:?}")]
pub struct ParseLetterClassError(pub String);

impl FromStr for LetterClass {
    type Err = ParseLetterClassError;

    /// Accepts sharp or flat spellings: `"C#"`, `"Db"`, `"B"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseLetterClassError(s.to_string());
        let mut chars = s.trim().chars();
        let base = match chars.next().map(|c| c.to_ascii_uppercase()) {
            Some('C') => 0,
            Some('D') => 2,
            Some('E') => 4,
            Some('F') => 5,
            Some('G') => 7,
            Some('A') => 9,
            Some('B') => 11,
            _ => return Err(err()),
        };
        let offset = match chars.as_str() {
            "" => 0,
            "#" => 1,
            "b" => -1,
            _ => return Err(err()),
        };
        Ok(LetterClass::from_semitone(base + offset))
    }
}

/// A tuned position in a realized tuning system.
///
/// Every numeric field describes the same physical pitch. `original_value`
/// holds the user-supplied form named by `original_value_type`; the rest are
/// derived from it. `(index, octave)` is the position key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitchClass {
    pub note_name: String,
    pub index: usize,
    pub octave: i32,
    #[serde(with = "ratio::text")]
    pub fraction: Fraction,
    pub cents: f64,
    pub decimal_ratio: f64,
    pub string_length: f64,
    /// Hz
    pub frequency: f64,
    pub midi_note_decimal: f64,
    /// Cents away from the nearest 12-EDO pitch
    pub cents_deviation: f64,
    pub original_value: String,
    pub original_value_type: ValueType,
    pub reference_letter: LetterClass,
}

impl PitchClass {
    pub fn same_position(&self, other: &PitchClass) -> bool {
        self.index == other.index && self.octave == other.octave
    }

    /// Cents folded into `[0, 1200)`.
    pub fn normalized_cents(&self) -> f64 {
        normalize_cents(self.cents)
    }
}

/// Fold a cents value into a single octave, `[0, 1200)`.
pub fn normalize_cents(cents: f64) -> f64 {
    cents.rem_euclid(1200.0)
}

/// Shortest distance between two cents values on the octave circle.
pub fn wrapped_cents_distance(a: f64, b: f64) -> f64 {
    let diff = (normalize_cents(a) - normalize_cents(b)).abs();
    diff.min(1200.0 - diff)
}
