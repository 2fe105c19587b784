//! Realizing maqām and jins templates at every position of a pitch table.
//!
//! A template's note names pick its reference positions out of the table.
//! The intervals between those positions form the pattern that
//! [`find_pattern`] rebuilds elsewhere. The result starting on the
//! template's own first note is the canonical form (tahlīl); every other
//! result is a transposition (taṣwīr).

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::interval::{interval_lists_match_within, intervals_of, Interval};
use crate::octave::shift_by_octaves;
use crate::pitch::PitchClass;
use crate::search::{find_pattern, pair_sequences, Direction, MatchMode};
use crate::types::{EmbeddedJins, JinsRealization, JinsTemplate, MaqamRealization, MaqamTemplate, Sayr, SayrStop};
use crate::DEFAULT_CENTS_TOLERANCE;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranspositionOptions {
    /// Keep the canonical form, placed first.
    pub include_tahlil: bool,
    pub cents_tolerance: f64,
    /// Only keep results whose first note lies in octave one.
    pub only_octave_one: bool,
}

impl Default for TranspositionOptions {
    fn default() -> Self {
        Self {
            include_tahlil: true,
            cents_tolerance: DEFAULT_CENTS_TOLERANCE,
            only_octave_one: false,
        }
    }
}

impl TranspositionOptions {
    pub fn with_cents_tolerance(mut self, cents_tolerance: f64) -> Self {
        self.cents_tolerance = cents_tolerance;
        self
    }

    pub fn octave_one(mut self) -> Self {
        self.only_octave_one = true;
        self
    }

    pub fn without_tahlil(mut self) -> Self {
        self.include_tahlil = false;
        self
    }
}

/// Table entries named by `names`, in table order.
pub fn reference_positions(table: &[PitchClass], names: &[String]) -> Vec<PitchClass> {
    table
        .iter()
        .filter(|pc| names.contains(&pc.note_name))
        .cloned()
        .collect()
}

/// A jins's interval pattern, taken from its reference positions.
struct JinsPattern<'a> {
    jins: &'a JinsTemplate,
    intervals: Vec<Interval>,
}

fn jins_patterns<'a>(table: &[PitchClass], ajnas: &'a [JinsTemplate]) -> Vec<JinsPattern<'a>> {
    ajnas
        .iter()
        .filter_map(|jins| {
            let positions = reference_positions(table, &jins.note_names);
            (positions.len() == jins.note_names.len() && positions.len() >= 2).then(|| JinsPattern {
                jins,
                intervals: intervals_of(&positions),
            })
        })
        .collect()
}

/// First position copied an octave up when extending `sequence`.
///
/// When some note lies strictly below half the top note's frequency, copying
/// starts two places after the last such note, since the note after it is
/// already doubled inside the sequence. Otherwise the whole sequence is
/// copied, so a scale closing on its octave repeats that octave as a unison.
fn extension_start(sequence: &[PitchClass]) -> usize {
    let Some(last) = sequence.last() else {
        return 0;
    };
    let ceiling = last.frequency * (1.0 - 1e-9);
    sequence
        .iter()
        .rposition(|pc| pc.frequency * 2.0 < ceiling)
        .map_or(0, |i| i + 2)
}

fn extend_by_octave(table: &[PitchClass], sequence: &[PitchClass], start: usize) -> Vec<PitchClass> {
    let copied = sequence.get(start..).unwrap_or_default();
    sequence
        .iter()
        .cloned()
        .chain(copied.iter().map(|pc| shift_by_octaves(table, pc, 1)))
        .collect()
}

/// Slide over `extended` and record the first jins starting at each of the
/// first `positions` notes.
fn recognize_ajnas(
    extended: &[PitchClass],
    positions: usize,
    patterns: &[JinsPattern<'_>],
    cents_tolerance: f64,
) -> Vec<Option<EmbeddedJins>> {
    if patterns.is_empty() {
        return Vec::new();
    }
    let intervals = intervals_of(extended);
    let mut recognized = Vec::with_capacity(positions);
    for offset in 0..intervals.len() {
        let found = patterns.iter().find_map(|pattern| {
            let len = pattern.intervals.len();
            let window = intervals.get(offset..offset + len)?;
            if !interval_lists_match_within(window, &pattern.intervals, cents_tolerance) {
                return None;
            }
            let first = &extended[offset];
            Some(EmbeddedJins {
                jins_id: pattern.jins.id.clone(),
                name: format!("{} al-{}", pattern.jins.name, first.note_name),
                transposition: pattern.jins.first_note() != Some(first.note_name.as_str()),
                pitch_classes: extended[offset..=offset + len].to_vec(),
                intervals: window.to_vec(),
            })
        });
        recognized.push(found);
        if recognized.len() == positions {
            break;
        }
    }
    recognized
}

/// Move the canonical result to the front (or drop it) and flag the rest as
/// transpositions.
fn order_canonical_first<T>(
    mut results: Vec<T>,
    is_canonical: impl Fn(&T) -> bool,
    mut set_transposition: impl FnMut(&mut T, bool),
    include_tahlil: bool,
) -> Vec<T> {
    for result in &mut results {
        set_transposition(result, true);
    }
    if let Some(index) = results.iter().position(|r| is_canonical(r)) {
        let mut tahlil = results.remove(index);
        if include_tahlil {
            set_transposition(&mut tahlil, false);
            results.insert(0, tahlil);
        }
    }
    results
}

/// Every realization of `maqam` in `table`, canonical form first.
///
/// Each realization carries its embedded ajnās, recognized against `ajnas`
/// on an octave-extended copy of each direction. Templates with fewer than
/// two notes per direction, or whose notes are missing from the table, give
/// no results.
pub fn maqam_transpositions(
    table: &[PitchClass],
    ajnas: &[JinsTemplate],
    maqam: &MaqamTemplate,
    options: &TranspositionOptions,
) -> Vec<MaqamRealization> {
    if table.is_empty() || maqam.ascending.len() < 2 || maqam.descending.len() < 2 {
        return Vec::new();
    }
    let ascending_reference = reference_positions(table, &maqam.ascending);
    let mut descending_reference = reference_positions(table, &maqam.descending);
    descending_reference.reverse();
    if ascending_reference.len() < 2 || descending_reference.len() < 2 {
        return Vec::new();
    }

    let mode = MatchMode::for_table(table);
    let tolerance = options.cents_tolerance;
    let ascending_pattern = intervals_of(&ascending_reference);
    let descending_pattern = intervals_of(&descending_reference);

    let ascending: Vec<Vec<PitchClass>> =
        find_pattern(table, &ascending_pattern, Direction::Ascending, mode, tolerance)
            .into_iter()
            .filter(|seq| !options.only_octave_one || seq.first().is_some_and(|pc| pc.octave == 1))
            .collect();
    let descending = find_pattern(table, &descending_pattern, Direction::Descending, mode, tolerance);
    let patterns = jins_patterns(table, ajnas);

    let realizations: Vec<MaqamRealization> = pair_sequences(ascending, &descending)
        .into_iter()
        .map(|(ascending, descending)| realize_pair(table, maqam, &patterns, ascending, descending, tolerance))
        .collect();

    debug!(
        maqam = %maqam.name,
        realizations = realizations.len(),
        "maqam transpositions"
    );

    order_canonical_first(
        realizations,
        |r| r.ascending.first().map(|pc| pc.note_name.as_str()) == maqam.first_note(),
        |r, flag| r.transposition = flag,
        options.include_tahlil,
    )
}

fn realize_pair(
    table: &[PitchClass],
    maqam: &MaqamTemplate,
    patterns: &[JinsPattern<'_>],
    ascending: Vec<PitchClass>,
    descending: Vec<PitchClass>,
    cents_tolerance: f64,
) -> MaqamRealization {
    let start = extension_start(&ascending);

    let extended_ascending = extend_by_octave(table, &ascending, start);
    let ascending_ajnas = recognize_ajnas(&extended_ascending, ascending.len(), patterns, cents_tolerance);

    let mut rising_descent = descending.clone();
    rising_descent.reverse();
    let extended_descending = extend_by_octave(table, &rising_descent, start);
    let mut descending_ajnas =
        recognize_ajnas(&extended_descending, rising_descent.len(), patterns, cents_tolerance);
    descending_ajnas.reverse();

    let tonic = ascending
        .first()
        .map(|pc| pc.note_name.as_str())
        .unwrap_or_default();

    MaqamRealization {
        maqam_id: maqam.id.clone(),
        name: format!("{} al-{}", maqam.name, tonic),
        transposition: true,
        ascending_intervals: intervals_of(&ascending),
        ascending,
        ascending_ajnas,
        descending_intervals: intervals_of(&descending),
        descending,
        descending_ajnas,
    }
}

/// Every realization of `jins` in `table`, canonical form first.
pub fn jins_transpositions(
    table: &[PitchClass],
    jins: &JinsTemplate,
    options: &TranspositionOptions,
) -> Vec<JinsRealization> {
    if table.is_empty() || jins.note_names.len() < 2 {
        return Vec::new();
    }
    let reference = reference_positions(table, &jins.note_names);
    if reference.len() < 2 {
        return Vec::new();
    }
    let pattern = intervals_of(&reference);
    let mode = MatchMode::for_table(table);

    let realizations: Vec<JinsRealization> =
        find_pattern(table, &pattern, Direction::Ascending, mode, options.cents_tolerance)
            .into_iter()
            .filter(|seq| !options.only_octave_one || seq.first().is_some_and(|pc| pc.octave == 1))
            .map(|pitch_classes| JinsRealization {
                jins_id: jins.id.clone(),
                name: format!("{} al-{}", jins.name, pitch_classes[0].note_name),
                transposition: true,
                intervals: intervals_of(&pitch_classes),
                pitch_classes,
            })
            .collect();

    debug!(jins = %jins.name, realizations = realizations.len(), "jins transpositions");

    order_canonical_first(
        realizations,
        |r| r.first_note() == jins.first_note(),
        |r, flag| r.transposition = flag,
        options.include_tahlil,
    )
}

/// A sayr moved to a transposed realization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SayrTransposition {
    pub sayr: Sayr,
    /// Some note fell outside the table and was left unchanged.
    pub has_out_of_bounds_notes: bool,
}

/// Shift every note reference in `sayr` by the table distance between the
/// template's first note and the realization's first note.
///
/// Names missing from the table are kept as they are.
pub fn transpose_sayr(
    sayr: &Sayr,
    table: &[PitchClass],
    maqam: &MaqamTemplate,
    realization: &MaqamRealization,
) -> SayrTransposition {
    let position = |name: &str| table.iter().position(|pc| pc.note_name == name);
    let shift = match (
        maqam.first_note().and_then(position),
        realization.tonic().and_then(|pc| position(&pc.note_name)),
    ) {
        (Some(from), Some(to)) => to as i64 - from as i64,
        _ => 0,
    };

    let mut out_of_bounds = false;
    let mut shift_name = |name: &str| -> String {
        let Some(index) = position(name) else {
            return name.to_string();
        };
        let target = index as i64 + shift;
        if target < 0 || target >= table.len() as i64 {
            out_of_bounds = true;
            return name.to_string();
        }
        table[target as usize].note_name.clone()
    };

    let stops = sayr
        .stops
        .iter()
        .map(|stop| match stop {
            SayrStop::Note { value } => SayrStop::Note {
                value: shift_name(value),
            },
            SayrStop::Jins { value, starting_note } => SayrStop::Jins {
                value: value.clone(),
                starting_note: starting_note.as_deref().map(&mut shift_name),
            },
            SayrStop::Maqam { value, starting_note } => SayrStop::Maqam {
                value: value.clone(),
                starting_note: starting_note.as_deref().map(&mut shift_name),
            },
            SayrStop::Direction { value } => SayrStop::Direction { value: *value },
        })
        .collect();

    SayrTransposition {
        sayr: Sayr {
            stops,
            ..sayr.clone()
        },
        has_out_of_bounds_notes: out_of_bounds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::interval_lists_match;
    use crate::test_support::{fraction_table, pythagorean};
    use crate::tuning::TuningSystem;
    use crate::types::SayrDirection;
    use pretty_assertions::assert_eq;

    fn major() -> MaqamTemplate {
        MaqamTemplate::symmetric("major", "major", &["c", "d", "e", "f", "g", "a", "b", "jawāb c"])
    }

    fn ajam() -> JinsTemplate {
        JinsTemplate::new("ajam", "ajam", &["c", "d", "e", "f"])
    }

    #[test]
    fn two_note_jins_in_octave_one() {
        let table = fraction_table(&["1/1", "9/8", "3/2"], &["n1", "n2", "n3"]);
        let jins = JinsTemplate::new("j", "step", &["n1", "n2"]);

        let found = jins_transpositions(&table, &jins, &TranspositionOptions::default().octave_one());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].first_note(), Some("n1"));
        assert!(!found[0].transposition);

        let everywhere = jins_transpositions(&table, &jins, &TranspositionOptions::default());
        assert_eq!(everywhere.len(), 4);
        assert_eq!(everywhere[0].name, "step al-n1");
        assert!(!everywhere[0].transposition);
        assert!(everywhere[1..].iter().all(|r| r.transposition));
    }

    #[test]
    fn missing_notes_give_nothing() {
        let table = fraction_table(&["1/1", "9/8", "3/2"], &["n1", "n2", "n3"]);
        let jins = JinsTemplate::new("j", "ghost", &["x", "y"]);
        assert!(jins_transpositions(&table, &jins, &TranspositionOptions::default()).is_empty());
        let maqam = MaqamTemplate::symmetric("m", "ghost", &["x", "y", "z"]);
        assert!(maqam_transpositions(&table, &[], &maqam, &TranspositionOptions::default()).is_empty());
        assert!(maqam_transpositions(&[], &[], &major(), &TranspositionOptions::default()).is_empty());
    }

    #[test]
    fn tahlil_can_be_dropped() {
        let table = fraction_table(&["1/1", "9/8", "3/2"], &["n1", "n2", "n3"]);
        let jins = JinsTemplate::new("j", "step", &["n1", "n2"]);
        let found = jins_transpositions(&table, &jins, &TranspositionOptions::default().without_tahlil());
        assert_eq!(found.len(), 3);
        assert!(found.iter().all(|r| r.transposition && r.first_note() != Some("n1")));
    }

    #[test]
    fn major_transposes_around_the_circle_of_fifths() {
        let table = pythagorean().pitch_table("c");
        let found = maqam_transpositions(&table, &[], &major(), &TranspositionOptions::default().octave_one());
        let names: Vec<_> = found.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["major al-c", "major al-eb", "major al-f", "major al-g", "major al-ab", "major al-bb"]
        );
        assert!(!found[0].transposition);
        assert!(found[1..].iter().all(|r| r.transposition));
        assert!(found.iter().all(|r| r.ascending_ajnas.is_empty()));
    }

    #[test]
    fn realized_intervals_match_template() {
        let table = pythagorean().pitch_table("c");
        let maqam = major();
        let pattern = intervals_of(&reference_positions(&table, &maqam.ascending));
        for realization in maqam_transpositions(&table, &[], &maqam, &TranspositionOptions::default()) {
            assert!(interval_lists_match(&realization.ascending_intervals, &pattern, 5.0));
            assert_eq!(realization.descending.len(), 8);
            assert!(realization.descending_intervals.iter().all(|i| i.cents < 0.0));
            assert_eq!(
                realization.descending.last().map(|pc| &pc.note_name),
                realization.ascending.first().map(|pc| &pc.note_name)
            );
        }
    }

    #[test]
    fn embedded_ajnas_follow_the_scale() {
        let table = pythagorean().pitch_table("c");
        let found = maqam_transpositions(&table, &[ajam()], &major(), &TranspositionOptions::default().octave_one());
        let tahlil = &found[0];
        assert_eq!(tahlil.ascending_ajnas.len(), tahlil.ascending.len());

        let names: Vec<Option<&str>> = tahlil
            .ascending_ajnas
            .iter()
            .map(|j| j.as_ref().map(|j| j.name.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![
                Some("ajam al-c"),
                None,
                None,
                None,
                Some("ajam al-g"),
                None,
                None,
                None,
            ]
        );
        let first = tahlil.ascending_ajnas[0].as_ref().unwrap();
        assert!(!first.transposition);
        assert_eq!(first.pitch_classes.len(), 4);
        assert!(tahlil.ascending_ajnas[4].as_ref().unwrap().transposition);

        assert!(tahlil.descending_ajnas[0].is_none());
        assert_eq!(
            tahlil.descending_ajnas[3].as_ref().map(|j| j.name.as_str()),
            Some("ajam al-g")
        );
        assert_eq!(
            tahlil.descending_ajnas[7].as_ref().map(|j| j.name.as_str()),
            Some("ajam al-c")
        );
    }

    #[test]
    fn octave_scale_is_copied_whole() {
        let table = pythagorean().pitch_table("c");
        let scale = reference_positions(&table, &major().ascending);
        assert_eq!(extension_start(&scale), 0);
        assert_eq!(extension_start(&scale[..5]), 0);
        let extended = extend_by_octave(&table, &scale, 0);
        assert_eq!(extended.len(), 16);
        assert_eq!(extended[7].note_name, "jawāb c");
        assert_eq!(extended[8].note_name, "jawāb c");
        assert_eq!(extended[15].note_name, "jawāb jawāb c");
    }

    #[test]
    fn extension_skips_notes_already_doubled() {
        let table = pythagorean().pitch_table("c");
        let names: Vec<String> = ["c", "d", "e", "f", "g", "a", "b", "jawāb c", "jawāb d", "jawāb e"]
            .iter()
            .map(|n| n.to_string())
            .collect();
        let scale = reference_positions(&table, &names);
        assert_eq!(scale.len(), 10);
        assert_eq!(extension_start(&scale), 3);
        let extended = extend_by_octave(&table, &scale, 3);
        assert_eq!(extended.len(), 17);
        assert_eq!(extended[9].note_name, "jawāb e");
        assert_eq!(extended[10].note_name, "jawāb f");
        assert_eq!(extended[16].note_name, "jawāb jawāb e");
        assert_eq!(extend_by_octave(&table, &scale[..2], 3).len(), 2);
    }

    #[test]
    fn sayr_follows_the_transposition() {
        let table = pythagorean().pitch_table("c");
        let maqam = major();
        let found = maqam_transpositions(&table, &[], &maqam, &TranspositionOptions::default().octave_one());
        let on_g = found.iter().find(|r| r.name == "major al-g").unwrap();

        let sayr = Sayr {
            id: "s".into(),
            creator: String::new(),
            source_id: String::new(),
            page: String::new(),
            comments: String::new(),
            stops: vec![
                SayrStop::Note { value: "c".into() },
                SayrStop::Jins {
                    value: "ajam".into(),
                    starting_note: Some("g".into()),
                },
                SayrStop::Direction {
                    value: SayrDirection::Ascending,
                },
                SayrStop::Note {
                    value: "jawāb jawāb b".into(),
                },
                SayrStop::Note { value: "nowhere".into() },
            ],
        };
        let moved = transpose_sayr(&sayr, &table, &maqam, on_g);
        assert!(moved.has_out_of_bounds_notes);
        assert_eq!(
            moved.sayr.stops,
            vec![
                SayrStop::Note { value: "g".into() },
                SayrStop::Jins {
                    value: "ajam".into(),
                    starting_note: Some("jawāb d".into()),
                },
                SayrStop::Direction {
                    value: SayrDirection::Ascending,
                },
                SayrStop::Note {
                    value: "jawāb jawāb b".into(),
                },
                SayrStop::Note { value: "nowhere".into() },
            ]
        );
    }
}
