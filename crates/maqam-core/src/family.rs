//! Maqām families, named after the jins on the first scale degree.
//!
//! A family is read from the canonical form (tahlīl): the jins starting on
//! the tonic of the ascending side, or failing that the one ending the
//! descending side on the tonic. Every transposition of a maqām belongs to
//! the family of its canonical form.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::pitch::PitchClass;
use crate::transpose::{maqam_transpositions, TranspositionOptions};
use crate::types::{EmbeddedJins, JinsTemplate, MaqamRealization, MaqamTemplate};

/// Family name given when no jins sits on the first degree.
pub const NO_JINS: &str = "no jins";

/// Compound names kept apart from the jins their first word names.
const COMPOUND_FAMILIES: [(&str, &[&str], &str); 3] = [
    ("ṣabā", &["zamzam"], "ṣabā zamzam"),
    ("athar", &["kurd"], "athar kurd"),
    ("awj", &["ʾārāʾ", "araa"], "awj ʾārāʾ"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FamilyMethod {
    FirstJins,
}

/// Which side of the realization supplied the first-degree jins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JinsSource {
    Ascending,
    Descending,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyClassification {
    pub method: FamilyMethod,
    /// Base jins name such as `"rast"`, or [`NO_JINS`]
    pub family_name: String,
    /// `"<jins> al-<note>"` of the first-degree jins
    pub full_jins_name: Option<String>,
    pub scale_degree: u32,
    pub source: JinsSource,
}

/// Family of one maqām, as listed by [`classify_families`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaqamFamily {
    pub maqam_id: String,
    pub maqam_name: String,
    #[serde(flatten)]
    pub classification: FamilyClassification,
}

/// Drop a leading `"Jins "` (any case) or `"جنس "`.
fn strip_jins_prefix(name: &str) -> &str {
    for prefix in ["jins", "جنس"] {
        let Some(head) = name.get(..prefix.len()) else {
            continue;
        };
        if head.eq_ignore_ascii_case(prefix) {
            let rest = &name[prefix.len()..];
            let trimmed = rest.trim_start();
            if trimmed.len() < rest.len() {
                return trimmed;
            }
        }
    }
    name
}

/// Base family name of a jins name such as `"Jins Rast al-rast"` (`"rast"`).
///
/// The `" al-<note>"` suffix and the `"Jins "` prefix are removed and the
/// first word is kept, except for the compound families ṣabā zamzam, athar
/// kurd and awj ʾārāʾ. Blank input gives [`NO_JINS`].
pub fn base_jins_name(name: &str) -> String {
    let base = name.find(" al-").map_or(name, |at| &name[..at]);
    let base = strip_jins_prefix(base).trim();
    if base.is_empty() {
        return NO_JINS.to_string();
    }

    let lower = base.to_lowercase();
    for (root, markers, compound) in COMPOUND_FAMILIES {
        if lower.contains(root) {
            return if markers.iter().any(|m| lower.contains(m)) {
                compound.to_string()
            } else {
                root.to_string()
            };
        }
    }

    base.split_whitespace()
        .next()
        .map_or_else(|| NO_JINS.to_string(), str::to_string)
}

/// The jins on the first scale degree and the side it came from.
///
/// `descending_ajnas` runs from the top note down, so its tonic entry is
/// the last one.
pub fn first_degree_jins(realization: &MaqamRealization) -> Option<(&EmbeddedJins, JinsSource)> {
    let ascending = realization.ascending_ajnas.first().and_then(Option::as_ref);
    let descending = || realization.descending_ajnas.last().and_then(Option::as_ref);
    ascending
        .filter(|jins| !jins.name.is_empty())
        .map(|jins| (jins, JinsSource::Ascending))
        .or_else(|| {
            descending()
                .filter(|jins| !jins.name.is_empty())
                .map(|jins| (jins, JinsSource::Descending))
        })
}

/// Family of `realization` by its first-degree jins.
///
/// Call it on the canonical form; transpositions inherit the result.
pub fn classify_family(realization: &MaqamRealization) -> FamilyClassification {
    match first_degree_jins(realization) {
        Some((jins, source)) => FamilyClassification {
            method: FamilyMethod::FirstJins,
            family_name: base_jins_name(&jins.name),
            full_jins_name: Some(jins.name.clone()),
            scale_degree: 1,
            source,
        },
        None => FamilyClassification {
            method: FamilyMethod::FirstJins,
            family_name: NO_JINS.to_string(),
            full_jins_name: None,
            scale_degree: 1,
            source: JinsSource::None,
        },
    }
}

/// Family of every maqām in `maqamat` whose canonical form exists in
/// `table`. Maqāmāt that cannot be realized there are left out.
pub fn classify_families(
    table: &[PitchClass],
    maqamat: &[MaqamTemplate],
    ajnas: &[JinsTemplate],
    cents_tolerance: f64,
) -> Vec<MaqamFamily> {
    let options = TranspositionOptions::default().with_cents_tolerance(cents_tolerance);
    maqamat
        .iter()
        .filter_map(|maqam| {
            let found = maqam_transpositions(table, ajnas, maqam, &options);
            let Some(tahlil) = found.iter().find(|r| !r.transposition) else {
                debug!(maqam = %maqam.name, "no canonical form, family skipped");
                return None;
            };
            Some(MaqamFamily {
                maqam_id: maqam.id.clone(),
                maqam_name: maqam.name.clone(),
                classification: classify_family(tahlil),
            })
        })
        .collect()
}
