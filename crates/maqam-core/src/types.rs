use serde::{Deserialize, Serialize};

use crate::interval::Interval;
use crate::pitch::PitchClass;

/// Abstract jins: an ordered list of note names with no pitch information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JinsTemplate {
    pub id: String,
    pub name: String,
    pub note_names: Vec<String>,
}

impl JinsTemplate {
    pub fn new(id: impl Into<String>, name: impl Into<String>, note_names: &[&str]) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            note_names: note_names.iter().map(|n| n.to_string()).collect(),
        }
    }

    pub fn first_note(&self) -> Option<&str> {
        self.note_names.first().map(String::as_str)
    }
}

/// Abstract maqam with separate ascending and descending note lists.
///
/// `descending` is written from the top note down to the tonic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaqamTemplate {
    pub id: String,
    pub name: String,
    pub ascending: Vec<String>,
    pub descending: Vec<String>,
    #[serde(default)]
    pub suyur: Vec<Sayr>,
}

impl MaqamTemplate {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        ascending: &[&str],
        descending: &[&str],
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ascending: ascending.iter().map(|n| n.to_string()).collect(),
            descending: descending.iter().map(|n| n.to_string()).collect(),
            suyur: Vec::new(),
        }
    }

    /// Template whose descent retraces the ascent.
    pub fn symmetric(id: impl Into<String>, name: impl Into<String>, ascending: &[&str]) -> Self {
        let descending: Vec<&str> = ascending.iter().rev().copied().collect();
        Self::new(id, name, ascending, &descending)
    }

    pub fn first_note(&self) -> Option<&str> {
        self.ascending.first().map(String::as_str)
    }
}

/// A documented melodic pathway through a maqam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sayr {
    pub id: String,
    #[serde(default)]
    pub creator: String,
    #[serde(default)]
    pub source_id: String,
    #[serde(default)]
    pub page: String,
    #[serde(default)]
    pub comments: String,
    pub stops: Vec<SayrStop>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SayrDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SayrStop {
    Note {
        value: String,
    },
    Jins {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        starting_note: Option<String>,
    },
    Maqam {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        starting_note: Option<String>,
    },
    Direction {
        value: SayrDirection,
    },
}

/// A jins mapped onto concrete pitch classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JinsRealization {
    pub jins_id: String,
    /// `"<jins> al-<first note>"`
    pub name: String,
    /// false only for the canonical form (tahlīl)
    pub transposition: bool,
    pub pitch_classes: Vec<PitchClass>,
    pub intervals: Vec<Interval>,
}

impl JinsRealization {
    pub fn first_note(&self) -> Option<&str> {
        self.pitch_classes.first().map(|pc| pc.note_name.as_str())
    }
}

/// A jins recognized inside a maqam realization.
pub type EmbeddedJins = JinsRealization;

/// A maqam mapped onto concrete pitch classes.
///
/// `descending` runs from the top note down to the tonic, and
/// `descending_intervals` are therefore negative. Each ajnās list is parallel
/// to its pitch-class list; `None` marks a position where no jins starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaqamRealization {
    pub maqam_id: String,
    /// `"<maqam> al-<tonic>"`
    pub name: String,
    /// false only for the canonical form (tahlīl)
    pub transposition: bool,
    pub ascending: Vec<PitchClass>,
    pub ascending_intervals: Vec<Interval>,
    pub ascending_ajnas: Vec<Option<EmbeddedJins>>,
    pub descending: Vec<PitchClass>,
    pub descending_intervals: Vec<Interval>,
    pub descending_ajnas: Vec<Option<EmbeddedJins>>,
}

impl MaqamRealization {
    pub fn tonic(&self) -> Option<&PitchClass> {
        self.ascending.first()
    }

    /// Ascending pitch classes followed by descending ones.
    pub fn all_pitch_classes(&self) -> impl Iterator<Item = &PitchClass> {
        self.ascending.iter().chain(self.descending.iter())
    }

    /// Octave span of the realization's own pitches.
    pub fn octave_range(&self) -> Option<(i32, i32)> {
        let octaves = self.all_pitch_classes().map(|pc| pc.octave);
        let (min, max) = octaves.fold((i32::MAX, i32::MIN), |(lo, hi), o| (lo.min(o), hi.max(o)));
        (min <= max).then_some((min, max))
    }
}
