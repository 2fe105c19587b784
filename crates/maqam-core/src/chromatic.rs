//! Reduction of realized maqāmāt to tables keyed by chromatic letter class.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::octave::shift_by_octaves;
use crate::pitch::{wrapped_cents_distance, LetterClass, PitchClass};
use crate::types::MaqamRealization;

/// Where a chromatic set entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrySource {
    Instance,
    Baseline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChromaticEntry {
    pub letter: LetterClass,
    pub pitch_class: PitchClass,
    pub source: EntrySource,
}

/// At most one pitch class per letter class, in chromatic order from the
/// tonic's letter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChromaticSet {
    pub tonic: LetterClass,
    pub entries: Vec<ChromaticEntry>,
}

impl ChromaticSet {
    pub fn get(&self, letter: LetterClass) -> Option<&ChromaticEntry> {
        self.entries.iter().find(|e| e.letter == letter)
    }

    pub fn letters(&self) -> impl Iterator<Item = LetterClass> + '_ {
        self.entries.iter().map(|e| e.letter)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One entry for each of the twelve letters.
    pub fn is_complete(&self) -> bool {
        self.entries.len() == LetterClass::ALL.len()
    }

    /// Same letters, with octave-folded cents within `cents_tolerance`.
    pub fn equivalent(&self, other: &ChromaticSet, cents_tolerance: f64) -> bool {
        self.entries.len() == other.entries.len()
            && self.entries.iter().all(|entry| {
                other.get(entry.letter).is_some_and(|theirs| {
                    wrapped_cents_distance(entry.pitch_class.cents, theirs.pitch_class.cents)
                        <= cents_tolerance
                })
            })
    }

    /// Whether cents rise along the walk, allowing a single octave wrap.
    pub fn rises_from_tonic(&self) -> bool {
        let descents = self
            .entries
            .windows(2)
            .filter(|pair| pair[1].pitch_class.cents <= pair[0].pitch_class.cents)
            .count();
        descents <= 1
    }
}

/// Why a realization cannot be reduced to a chromatic set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Incompatibility {
    #[error("letter class {letter} is used for {first_cents:.2} and {second_cents:.2} cents")]
    ConflictingLetterClass {
        letter: LetterClass,
        first_cents: f64,
        second_cents: f64,
    },
    #[error("no pitch class available for letter class {letter}")]
    IncompleteBaseline { letter: LetterClass },
    #[error("realization has no pitch classes")]
    EmptyRealization,
}

impl Incompatibility {
    pub fn code(&self) -> &'static str {
        match self {
            Incompatibility::ConflictingLetterClass { .. } => "conflicting_letter_class",
            Incompatibility::IncompleteBaseline { .. } => "incomplete_baseline",
            Incompatibility::EmptyRealization => "empty_realization",
        }
    }
}

/// Pitch classes grouped by letter, in iteration order.
fn group_by_letter<'a>(
    pitch_classes: impl Iterator<Item = &'a PitchClass>,
) -> BTreeMap<LetterClass, Vec<&'a PitchClass>> {
    let mut groups: BTreeMap<LetterClass, Vec<&PitchClass>> = BTreeMap::new();
    for pc in pitch_classes {
        groups.entry(pc.reference_letter).or_default().push(pc);
    }
    groups
}

fn check_conflicts(
    groups: &BTreeMap<LetterClass, Vec<&PitchClass>>,
    cents_tolerance: f64,
) -> Result<(), Incompatibility> {
    for (letter, pitch_classes) in groups {
        for (i, first) in pitch_classes.iter().enumerate() {
            for second in &pitch_classes[i + 1..] {
                if wrapped_cents_distance(first.cents, second.cents) > cents_tolerance {
                    return Err(Incompatibility::ConflictingLetterClass {
                        letter: *letter,
                        first_cents: first.cents,
                        second_cents: second.cents,
                    });
                }
            }
        }
    }
    Ok(())
}

/// Baseline entry standing in for `letter`: the lowest one inside the
/// realization's octave range, else the one nearest its middle octave.
fn baseline_choice<'a>(
    baseline: &'a [PitchClass],
    letter: LetterClass,
    octave_range: (i32, i32),
) -> Option<&'a PitchClass> {
    let (low, high) = octave_range;
    let candidates = || baseline.iter().filter(move |pc| pc.reference_letter == letter);
    let in_range = candidates()
        .filter(|pc| (low..=high).contains(&pc.octave))
        .min_by(|a, b| a.octave.cmp(&b.octave).then(a.cents.total_cmp(&b.cents)));
    in_range.or_else(|| {
        let middle = f64::from(low + high) / 2.0;
        candidates().min_by(|a, b| {
            (f64::from(a.octave) - middle)
                .abs()
                .total_cmp(&(f64::from(b.octave) - middle).abs())
                .then(a.cents.total_cmp(&b.cents))
        })
    })
}

fn lowest_above<'a>(candidates: impl Iterator<Item = &'a PitchClass>, floor: f64) -> Option<&'a PitchClass> {
    candidates
        .filter(|pc| pc.cents > floor)
        .min_by(|a, b| a.cents.total_cmp(&b.cents))
}

/// Twelve-entry set for `realization`, filled from `baseline` where the
/// realization has no pitch of a letter.
///
/// `baseline` must be laid out from the same starting note as the
/// realization's table. Entries are placed by walking the letters upward
/// from the tonic: each takes the lowest candidate above the previous entry,
/// trying the realization's own pitches (and their octave copies) before the
/// baseline, and the baseline's preferred entry as a last resort. A letter
/// the realization uses in both directions is taken from the ascending side.
/// An empty realization gives [`Incompatibility::EmptyRealization`].
pub fn build_twelve_tone_set(
    realization: &MaqamRealization,
    baseline: &[PitchClass],
    cents_tolerance: f64,
) -> Result<ChromaticSet, Incompatibility> {
    let Some(tonic) = realization.tonic() else {
        return Err(Incompatibility::EmptyRealization);
    };
    let groups = group_by_letter(realization.all_pitch_classes());
    check_conflicts(&groups, cents_tolerance)?;
    let ascending = group_by_letter(realization.ascending.iter());
    let octave_range = realization.octave_range().unwrap_or((tonic.octave, tonic.octave));

    let mut entries = Vec::with_capacity(LetterClass::ALL.len());
    entries.push(ChromaticEntry {
        letter: tonic.reference_letter,
        pitch_class: tonic.clone(),
        source: EntrySource::Instance,
    });
    let mut previous = tonic.cents;

    for letter in tonic.reference_letter.chromatic_walk().skip(1) {
        let entry = match groups.get(&letter) {
            Some(own) => {
                let own = ascending.get(&letter).unwrap_or(own);
                let copies: Vec<PitchClass> = own
                    .iter()
                    .flat_map(|pc| (0..=2).map(move |n| shift_by_octaves(&[], pc, n)))
                    .collect();
                let pitch_class = lowest_above(copies.iter(), previous)
                    .cloned()
                    .unwrap_or_else(|| own[0].clone());
                ChromaticEntry {
                    letter,
                    pitch_class,
                    source: EntrySource::Instance,
                }
            }
            None => {
                let fallback = baseline_choice(baseline, letter, octave_range)
                    .ok_or(Incompatibility::IncompleteBaseline { letter })?;
                let same_letter = baseline.iter().filter(|pc| pc.reference_letter == letter);
                let pitch_class = lowest_above(same_letter, previous).unwrap_or(fallback);
                ChromaticEntry {
                    letter,
                    pitch_class: pitch_class.clone(),
                    source: EntrySource::Baseline,
                }
            }
        };
        previous = entry.pitch_class.cents;
        entries.push(entry);
    }

    Ok(ChromaticSet {
        tonic: tonic.reference_letter,
        entries,
    })
}

/// Set made only of the realization's own letters, using the first pitch
/// class seen for each (ascending before descending).
pub fn build_own_set(
    realization: &MaqamRealization,
    cents_tolerance: f64,
) -> Result<ChromaticSet, Incompatibility> {
    let groups = group_by_letter(realization.all_pitch_classes());
    check_conflicts(&groups, cents_tolerance)?;
    let tonic = realization
        .tonic()
        .map(|pc| pc.reference_letter)
        .unwrap_or(LetterClass::C);
    let entries = tonic
        .chromatic_walk()
        .filter_map(|letter| {
            let first = groups.get(&letter)?.first()?;
            Some(ChromaticEntry {
                letter,
                pitch_class: (*first).clone(),
                source: EntrySource::Instance,
            })
        })
        .collect();
    Ok(ChromaticSet { tonic, entries })
}

/// Whether every pitch class of `realization` has a letter in `set` within
/// `cents_tolerance`, octave folded.
pub fn is_compatible(realization: &MaqamRealization, set: &ChromaticSet, cents_tolerance: f64) -> bool {
    realization.all_pitch_classes().all(|pc| {
        set.get(pc.reference_letter).is_some_and(|entry| {
            wrapped_cents_distance(pc.cents, entry.pitch_class.cents) <= cents_tolerance
        })
    })
}
