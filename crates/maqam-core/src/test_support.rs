//! Small tuning tables shared by unit tests.

use crate::pitch::{LetterClass, PitchClass, ValueType};
use crate::tuning::{TuningSystem, TuningSystemData};

pub fn fraction_table(values: &[&str], names: &[&str]) -> Vec<PitchClass> {
    TuningSystemData::new("test", values, names).pitch_table(names[0])
}

pub fn cents_table(values: &[f64], names: &[&str]) -> Vec<PitchClass> {
    let values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    let values: Vec<&str> = values.iter().map(String::as_str).collect();
    let mut system = TuningSystemData::new("test-cents", &values, names);
    system.value_type = Some(ValueType::Cents);
    system.pitch_table(names[0])
}

pub const WESTERN_NAMES: [&str; 12] = [
    "c", "c#", "d", "eb", "e", "f", "f#", "g", "ab", "a", "bb", "b",
];

/// Pythagorean chromatic scale on C.
pub fn pythagorean() -> TuningSystemData {
    TuningSystemData::new(
        "pythagorean",
        &[
            "1/1", "256/243", "9/8", "32/27", "81/64", "4/3", "729/512", "3/2", "128/81", "27/16",
            "16/9", "243/128",
        ],
        &WESTERN_NAMES,
    )
}

/// Twelve-tone equal temperament on C, in cents.
pub fn equal_tempered() -> TuningSystemData {
    let values: Vec<String> = (0..12).map(|step| (step * 100).to_string()).collect();
    let values: Vec<&str> = values.iter().map(String::as_str).collect();
    TuningSystemData::new("12-edo", &values, &WESTERN_NAMES)
        .with_reference_letters(LetterClass::ALL.to_vec())
}
