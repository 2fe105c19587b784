use serde::{Deserialize, Serialize};

use crate::pitch::{PitchClass, ValueType};
use crate::ratio::{self, Fraction};

/// The distance between two pitch classes in every representation.
///
/// Never stored on its own; always derived from an ordered pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    #[serde(with = "ratio::text")]
    pub fraction: Fraction,
    pub cents: f64,
    pub decimal_ratio: f64,
    pub string_length: f64,
    pub index: i64,
    pub original_value_type: ValueType,
}

impl Interval {
    /// Interval from `first` up (or down) to `second`.
    ///
    /// The ratio is computed by exact rational division, never by subtracting
    /// floats.
    pub fn between(first: &PitchClass, second: &PitchClass) -> Interval {
        let fraction = ratio::interval(&first.fraction, &second.fraction).unwrap_or(ratio::UNISON);
        Interval {
            fraction,
            cents: second.cents - first.cents,
            decimal_ratio: ratio::to_f64(&fraction),
            string_length: second.string_length - first.string_length,
            index: (second.index as i64) * (second.octave as i64)
                - (first.index as i64) * (first.octave as i64),
            original_value_type: second.original_value_type,
        }
    }

    /// Type-dispatched equivalence: exact ratio for rational sources,
    /// `|Δcents| <= cents_tolerance` otherwise.
    pub fn matches(&self, other: &Interval, cents_tolerance: f64) -> bool {
        if self.original_value_type.is_rational() {
            self.fraction == other.fraction
        } else {
            self.matches_within(other, cents_tolerance)
        }
    }

    /// Cents-only equivalence, whatever the source type.
    pub fn matches_within(&self, other: &Interval, cents_tolerance: f64) -> bool {
        (self.cents - other.cents).abs() <= cents_tolerance
    }
}

/// Intervals between consecutive pitch classes.
pub fn intervals_of(pitch_classes: &[PitchClass]) -> Vec<Interval> {
    pitch_classes
        .windows(2)
        .map(|pair| Interval::between(&pair[0], &pair[1]))
        .collect()
}

/// Pairwise [`Interval::matches`] over two equally long lists.
pub fn interval_lists_match(first: &[Interval], second: &[Interval], cents_tolerance: f64) -> bool {
    first.len() == second.len()
        && first
            .iter()
            .zip(second)
            .all(|(a, b)| a.matches(b, cents_tolerance))
}

/// Pairwise [`Interval::matches_within`] over two equally long lists.
pub fn interval_lists_match_within(
    first: &[Interval],
    second: &[Interval],
    cents_tolerance: f64,
) -> bool {
    first.len() == second.len()
        && first
            .iter()
            .zip(second)
            .all(|(a, b)| a.matches_within(b, cents_tolerance))
}
