//! Greedy interval-pattern search over an ordered pitch table.

use std::borrow::Borrow;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::interval::Interval;
use crate::pitch::{PitchClass, ValueType};

/// Octaves a sequence may start (ascending) or end (descending) in.
pub const BOUNDARY_OCTAVES: RangeInclusive<i32> = 0..=3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Ascending,
    Descending,
}

/// How a computed interval is compared with a target interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Reduced fractions must be identical.
    Exact,
    /// Cents may differ by up to the tolerance.
    Tolerance,
}

impl MatchMode {
    pub fn for_value_type(value_type: ValueType) -> MatchMode {
        if value_type.is_rational() {
            MatchMode::Exact
        } else {
            MatchMode::Tolerance
        }
    }

    /// Mode for a whole table, read from its first entry.
    pub fn for_table(table: &[PitchClass]) -> MatchMode {
        table
            .first()
            .map(|pc| Self::for_value_type(pc.original_value_type))
            .unwrap_or(MatchMode::Tolerance)
    }
}

/// When an exact-mode candidate counts as past the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Overshoot {
    /// Beyond the target in the search direction.
    Directional(Direction),
    /// Larger than the target, whatever the direction.
    Upward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Matched,
    Overshot,
    Continue,
}

/// Single-step comparison rule shared by the search and the validator.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StepRule {
    pub mode: MatchMode,
    pub overshoot: Overshoot,
    pub cents_tolerance: f64,
}

impl StepRule {
    pub fn compare(&self, computed: &Interval, target: &Interval) -> Step {
        match self.mode {
            MatchMode::Exact => {
                if computed.fraction == target.fraction {
                    return Step::Matched;
                }
                let past = match self.overshoot {
                    Overshoot::Directional(Direction::Descending) => computed.fraction < target.fraction,
                    Overshoot::Directional(Direction::Ascending) | Overshoot::Upward => {
                        computed.fraction > target.fraction
                    }
                };
                if past {
                    Step::Overshot
                } else {
                    Step::Continue
                }
            }
            MatchMode::Tolerance => {
                if (computed.cents - target.cents).abs() <= self.cents_tolerance {
                    Step::Matched
                } else if target.cents.abs() + self.cents_tolerance < computed.cents.abs() {
                    Step::Overshot
                } else {
                    Step::Continue
                }
            }
        }
    }

    /// Grow one sequence from `ordered[start]`, committing to the first
    /// matching candidate at every step.
    ///
    /// Returns the positions of the completed sequence, or `None` when a step
    /// overshoots or runs out of candidates.
    pub fn grow<P: Borrow<PitchClass>>(
        &self,
        ordered: &[P],
        start: usize,
        pattern: &[Interval],
    ) -> Option<Vec<usize>> {
        let mut positions = Vec::with_capacity(pattern.len() + 1);
        positions.push(start);
        let mut tail = start;
        for target in pattern {
            let mut matched = None;
            for (candidate, pitch_class) in ordered.iter().enumerate().skip(tail + 1) {
                let computed = Interval::between(ordered[tail].borrow(), pitch_class.borrow());
                match self.compare(&computed, target) {
                    Step::Matched => {
                        matched = Some(candidate);
                        break;
                    }
                    Step::Overshot => return None,
                    Step::Continue => {}
                }
            }
            tail = matched?;
            positions.push(tail);
        }
        Some(positions)
    }
}

/// Every sequence in `table` that rebuilds `pattern` in `direction`.
///
/// The table is walked in direction order and each position is tried as a
/// start. Sequences whose boundary octave (first note ascending, last note
/// descending) is outside [`BOUNDARY_OCTAVES`] are dropped. Descending
/// sequences are returned in descending order.
pub fn find_pattern(
    table: &[PitchClass],
    pattern: &[Interval],
    direction: Direction,
    mode: MatchMode,
    cents_tolerance: f64,
) -> Vec<Vec<PitchClass>> {
    let ordered: Vec<&PitchClass> = match direction {
        Direction::Ascending => table.iter().collect(),
        Direction::Descending => table.iter().rev().collect(),
    };
    let rule = StepRule {
        mode,
        overshoot: Overshoot::Directional(direction),
        cents_tolerance,
    };

    let sequences: Vec<Vec<PitchClass>> = (0..ordered.len())
        .filter_map(|start| rule.grow(&ordered, start, pattern))
        .map(|positions| positions.into_iter().map(|p| ordered[p].clone()).collect::<Vec<_>>())
        .filter(|sequence| {
            let boundary = match direction {
                Direction::Ascending => sequence.first(),
                Direction::Descending => sequence.last(),
            };
            boundary.is_some_and(|pc| BOUNDARY_OCTAVES.contains(&pc.octave))
        })
        .collect();

    debug!(
        ?direction,
        ?mode,
        pattern_len = pattern.len(),
        found = sequences.len(),
        "pattern search"
    );
    sequences
}

/// Pair each ascending sequence with the first descending sequence ending on
/// its first note. Unpaired ascending sequences are dropped.
pub fn pair_sequences(
    ascending: Vec<Vec<PitchClass>>,
    descending: &[Vec<PitchClass>],
) -> Vec<(Vec<PitchClass>, Vec<PitchClass>)> {
    ascending
        .into_iter()
        .filter_map(|asc| {
            let tonic = asc.first()?.note_name.clone();
            let desc = descending
                .iter()
                .find(|desc| desc.last().is_some_and(|pc| pc.note_name == tonic))?;
            Some((asc, desc.clone()))
        })
        .collect()
}
