//! Yes/no transposability checks for a single target note.

use tracing::debug;

use crate::interval::Interval;
use crate::pitch::PitchClass;
use crate::search::{MatchMode, Overshoot, StepRule};
use crate::transpose::{jins_transpositions, maqam_transpositions, TranspositionOptions};
use crate::tuning::TuningSystem;
use crate::types::{JinsTemplate, MaqamTemplate};

/// Whether `maqam`'s canonical ascent can be rebuilt starting on
/// `target_note` in `tuning` laid out from `starting_note`.
pub fn is_transposable_to(
    tuning: &dyn TuningSystem,
    starting_note: &str,
    maqam: &MaqamTemplate,
    target_note: &str,
    cents_tolerance: f64,
) -> bool {
    if maqam.ascending.len() < 2 {
        return false;
    }
    let table = tuning.pitch_table(starting_note);
    let options = TranspositionOptions::default().with_cents_tolerance(cents_tolerance);
    let Some(tahlil) = maqam_transpositions(&table, &[], maqam, &options)
        .into_iter()
        .find(|r| !r.transposition)
    else {
        return false;
    };
    let result = rebuild_from(&table, &tahlil.ascending_intervals, target_note, cents_tolerance);
    debug!(maqam = %maqam.name, target_note, result, "maqam transposability");
    result
}

/// Jins counterpart of [`is_transposable_to`].
pub fn is_jins_transposable_to(
    tuning: &dyn TuningSystem,
    starting_note: &str,
    jins: &JinsTemplate,
    target_note: &str,
    cents_tolerance: f64,
) -> bool {
    if jins.note_names.len() < 2 {
        return false;
    }
    let table = tuning.pitch_table(starting_note);
    let options = TranspositionOptions::default().with_cents_tolerance(cents_tolerance);
    let Some(tahlil) = jins_transpositions(&table, jins, &options)
        .into_iter()
        .find(|r| !r.transposition)
    else {
        return false;
    };
    let result = rebuild_from(&table, &tahlil.intervals, target_note, cents_tolerance);
    debug!(jins = %jins.name, target_note, result, "jins transposability");
    result
}

/// Single-path rebuild of `pattern` from the first entry named `target_note`.
///
/// Exact mode treats any ratio above the target as an overshoot, without
/// regard to direction.
fn rebuild_from(table: &[PitchClass], pattern: &[Interval], target_note: &str, cents_tolerance: f64) -> bool {
    let Some(start) = table.iter().position(|pc| pc.note_name == target_note) else {
        return false;
    };
    let rule = StepRule {
        mode: MatchMode::for_table(table),
        overshoot: Overshoot::Upward,
        cents_tolerance,
    };
    rule.grow(table, start, pattern).is_some()
}
