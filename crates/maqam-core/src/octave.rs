//! Octave transposition of single pitch classes.

use crate::pitch::{PitchClass, ValueType};
use crate::ratio;
use crate::tuning::{OCTAVE_DOWN_MARKER, OCTAVE_UP_MARKER};

/// Number of table entries sharing the first entry's octave.
pub fn pitches_per_octave(table: &[PitchClass]) -> usize {
    match table.first() {
        Some(first) => table.iter().filter(|pc| pc.octave == first.octave).count(),
        None => 0,
    }
}

/// Shift `pitch_class` by `octaves` whole octaves.
///
/// Uses the table entry at the same index `octaves` rows away when the table
/// has one; otherwise every representation is recomputed directly.
pub fn shift_by_octaves(table: &[PitchClass], pitch_class: &PitchClass, octaves: i32) -> PitchClass {
    if octaves == 0 {
        return pitch_class.clone();
    }
    let per_octave = pitches_per_octave(table) as i64;
    if per_octave > 0 {
        if let Some(position) = table.iter().position(|pc| pc.same_position(pitch_class)) {
            let target = position as i64 + octaves as i64 * per_octave;
            if (0..table.len() as i64).contains(&target) {
                return table[target as usize].clone();
            }
        }
    }
    recompute_shifted(pitch_class, octaves)
}

fn recompute_shifted(pitch_class: &PitchClass, octaves: i32) -> PitchClass {
    let factor = 2f64.powi(octaves);
    let decimal_ratio = pitch_class.decimal_ratio * factor;
    let fraction = ratio::shift_octaves(&pitch_class.fraction, octaves)
        .unwrap_or_else(|| ratio::approximate(decimal_ratio));
    let cents = pitch_class.cents + 1200.0 * octaves as f64;
    let string_length = pitch_class.string_length / factor;

    let original_value = match pitch_class.original_value_type {
        ValueType::Fraction => ratio::to_text(&fraction),
        ValueType::Cents => format!("{cents}"),
        ValueType::DecimalRatio => format!("{decimal_ratio}"),
        ValueType::StringLength => format!("{string_length}"),
    };

    PitchClass {
        note_name: relabel(&pitch_class.note_name, octaves),
        index: pitch_class.index,
        octave: pitch_class.octave + octaves,
        fraction,
        cents,
        decimal_ratio,
        string_length,
        frequency: pitch_class.frequency * factor,
        midi_note_decimal: pitch_class.midi_note_decimal + 12.0 * octaves as f64,
        cents_deviation: pitch_class.cents_deviation,
        original_value,
        original_value_type: pitch_class.original_value_type,
        reference_letter: pitch_class.reference_letter,
    }
}

/// Move a note name `octaves` octaves, cancelling an opposite marker before
/// adding a new one.
fn relabel(name: &str, octaves: i32) -> String {
    let mut name = name.to_string();
    let (cancel, add) = if octaves > 0 {
        (OCTAVE_DOWN_MARKER, OCTAVE_UP_MARKER)
    } else {
        (OCTAVE_UP_MARKER, OCTAVE_DOWN_MARKER)
    };
    for _ in 0..octaves.unsigned_abs() {
        name = match name.strip_prefix(cancel) {
            Some(rest) => rest.to_string(),
            None => format!("{add}{name}"),
        };
    }
    name
}
