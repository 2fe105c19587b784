//! Tuning systems and the 4-octave pitch tables generated from them.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::pitch::{LetterClass, PitchClass, ValueType};
use crate::ratio::{self, Fraction};

/// Octaves generated for every pitch table (0 through 3).
pub const TABLE_OCTAVES: i32 = 4;

/// Name prefix for pitches one octave above octave 1.
pub const OCTAVE_UP_MARKER: &str = "jawāb ";
/// Name prefix for pitches one octave below octave 1.
pub const OCTAVE_DOWN_MARKER: &str = "qarār ";

const A4_FREQUENCY: f64 = 440.0;
const A4_MIDI: f64 = 69.0;

/// Source of an ordered pitch table.
///
/// Implementations return every pitch class across at least four octaves,
/// sorted by ascending pitch, with a uniform `original_value_type`. An unknown
/// or unusable system yields an empty table.
pub trait TuningSystem {
    fn id(&self) -> &str;

    fn pitch_table(&self, starting_note: &str) -> Vec<PitchClass>;
}

/// A tuning system described by one octave of pitch values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuningSystemData {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// One octave of values: fractions (`"9/8"`), cents, decimal ratios or
    /// string lengths.
    pub pitch_class_values: Vec<String>,
    /// Octave-one note names, one set per available starting note.
    pub note_name_sets: Vec<Vec<String>>,
    /// Detected from the values when absent.
    #[serde(default)]
    pub value_type: Option<ValueType>,
    #[serde(default = "default_string_length")]
    pub string_length: f64,
    /// Frequency of the `1/1` position in octave one.
    #[serde(default = "default_reference_frequency")]
    pub reference_frequency: f64,
    /// Letter classes per position; derived from the nearest 12-EDO pitch
    /// when empty.
    #[serde(default)]
    pub reference_letters: Vec<LetterClass>,
}

fn default_string_length() -> f64 {
    1000.0
}

fn default_reference_frequency() -> f64 {
    261.6256
}

impl TuningSystemData {
    pub fn new(id: impl Into<String>, values: &[&str], note_names: &[&str]) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            pitch_class_values: values.iter().map(|v| v.to_string()).collect(),
            note_name_sets: vec![note_names.iter().map(|n| n.to_string()).collect()],
            value_type: None,
            string_length: default_string_length(),
            reference_frequency: default_reference_frequency(),
            reference_letters: Vec::new(),
        }
    }

    pub fn with_reference_letters(mut self, letters: Vec<LetterClass>) -> Self {
        self.reference_letters = letters;
        self
    }

    pub fn with_reference_frequency(mut self, frequency: f64) -> Self {
        self.reference_frequency = frequency;
        self
    }

    /// Starting notes this system can be laid out from.
    pub fn starting_notes(&self) -> Vec<&str> {
        self.note_name_sets
            .iter()
            .filter_map(|set| set.first().map(String::as_str))
            .collect()
    }

    fn resolved_value_type(&self) -> Option<ValueType> {
        self.value_type
            .or_else(|| detect_value_type(&self.pitch_class_values))
    }
}

/// Guess the representation of a list of pitch values.
///
/// All-fraction lists are fractions; a list starting at zero is cents;
/// values within one octave ratio are decimal ratios; a decreasing list is
/// string lengths.
pub fn detect_value_type(values: &[String]) -> Option<ValueType> {
    if values.is_empty() {
        return None;
    }
    if values.iter().all(|v| v.contains('/') || v.contains(':')) {
        return Some(ValueType::Fraction);
    }
    let numbers: Vec<f64> = values
        .iter()
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()?;
    if numbers[0] == 0.0 {
        return Some(ValueType::Cents);
    }
    if numbers.iter().all(|n| (1.0..=2.0).contains(n)) {
        return Some(ValueType::DecimalRatio);
    }
    if numbers.windows(2).all(|w| w[0] > w[1]) {
        return Some(ValueType::StringLength);
    }
    Some(ValueType::Cents)
}

/// Decimal ratio, exact fraction and display text for one value shifted by
/// `octaves`.
fn shifted_value(
    value: &str,
    value_type: ValueType,
    octaves: i32,
    string_length: f64,
) -> Option<(f64, Fraction, String)> {
    let factor = 2f64.powi(octaves);
    match value_type {
        ValueType::Fraction => {
            let fraction = ratio::shift_octaves(&ratio::parse(value).ok()?, octaves)?;
            Some((ratio::to_f64(&fraction), fraction, ratio::to_text(&fraction)))
        }
        ValueType::Cents => {
            let cents = value.trim().parse::<f64>().ok()? + 1200.0 * octaves as f64;
            let decimal = 2f64.powf(cents / 1200.0);
            Some((decimal, ratio::approximate(decimal), format!("{cents}")))
        }
        ValueType::DecimalRatio => {
            let decimal = value.trim().parse::<f64>().ok()? * factor;
            (decimal > 0.0).then(|| (decimal, ratio::approximate(decimal), format!("{decimal}")))
        }
        ValueType::StringLength => {
            let length = value.trim().parse::<f64>().ok()? / factor;
            if length <= 0.0 {
                return None;
            }
            let decimal = string_length / length;
            Some((decimal, ratio::approximate(decimal), format!("{length}")))
        }
    }
}

/// Note name of an octave-one name placed in `octave`.
pub fn octave_note_name(name: &str, octave: i32) -> String {
    match octave {
        o if o < 1 => format!("{}{}", OCTAVE_DOWN_MARKER.repeat((1 - o) as usize), name),
        1 => name.to_string(),
        o => format!("{}{}", OCTAVE_UP_MARKER.repeat((o - 1) as usize), name),
    }
}

/// Fractional MIDI note number of a frequency.
pub fn frequency_to_midi(frequency: f64) -> f64 {
    A4_MIDI + 12.0 * (frequency / A4_FREQUENCY).log2()
}

impl TuningSystem for TuningSystemData {
    fn id(&self) -> &str {
        &self.id
    }

    fn pitch_table(&self, starting_note: &str) -> Vec<PitchClass> {
        let Some(value_type) = self.resolved_value_type() else {
            warn!(tuning = %self.id, "cannot detect pitch value type");
            return Vec::new();
        };
        let Some(note_names) = self
            .note_name_sets
            .iter()
            .find(|set| set.first().map(String::as_str) == Some(starting_note))
            .or_else(|| self.note_name_sets.first())
        else {
            return Vec::new();
        };

        let mut table = Vec::with_capacity(self.pitch_class_values.len() * TABLE_OCTAVES as usize);
        for octave in 0..TABLE_OCTAVES {
            for (index, value) in self.pitch_class_values.iter().enumerate() {
                let Some((decimal, fraction, original_value)) =
                    shifted_value(value, value_type, octave - 1, self.string_length)
                else {
                    warn!(tuning = %self.id, value = %value, "unparseable pitch value");
                    return Vec::new();
                };
                let frequency = self.reference_frequency * decimal;
                let midi_note_decimal = frequency_to_midi(frequency);
                let reference_letter = self
                    .reference_letters
                    .get(index)
                    .copied()
                    .unwrap_or_else(|| LetterClass::nearest_to_midi(midi_note_decimal));
                let base_name = note_names
                    .get(index)
                    .map(String::as_str)
                    .unwrap_or("none");

                table.push(PitchClass {
                    note_name: octave_note_name(base_name, octave),
                    index,
                    octave,
                    fraction,
                    cents: 1200.0 * decimal.log2(),
                    decimal_ratio: decimal,
                    string_length: self.string_length / decimal,
                    frequency,
                    midi_note_decimal,
                    cents_deviation: (midi_note_decimal - midi_note_decimal.round()) * 100.0,
                    original_value,
                    original_value_type: value_type,
                    reference_letter,
                });
            }
        }
        table
    }
}
