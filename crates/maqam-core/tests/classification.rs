//! End-to-end checks against the JSON fixture catalog.

use std::collections::HashSet;
use std::path::PathBuf;

use maqam_core::interval::interval_lists_match;
use maqam_core::octave::shift_by_octaves;
use maqam_core::search::BOUNDARY_OCTAVES;
use maqam_core::{
    classify, classify_families, is_transposable_to, jins_transpositions, maqam_transpositions, transpose_sayr, Catalog,
    ClassifyOptions, JinsSource, TranspositionOptions, TuningSystem, DEFAULT_CENTS_TOLERANCE,
};
use pretty_assertions::assert_eq;

fn fixture_catalog() -> Catalog {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/catalog.json");
    Catalog::from_path(&path).expect("fixture catalog should load")
}

#[test]
fn catalog_fixture_loads() {
    let catalog = fixture_catalog();
    assert_eq!(catalog.tuning_systems.len(), 2);
    assert_eq!(catalog.ajnas.len(), 2);
    let major = catalog.maqam("major").unwrap();
    assert_eq!(major.suyur.len(), 1);
    assert_eq!(major.suyur[0].stops.len(), 5);
}

#[test]
fn major_in_pythagorean_tuning() {
    let catalog = fixture_catalog();
    let tuning = catalog.tuning_system("pythagorean").unwrap();
    let table = tuning.pitch_table("c");
    let major = catalog.maqam("major").unwrap();

    let options = TranspositionOptions::default().octave_one();
    let found = maqam_transpositions(&table, &catalog.ajnas, major, &options);
    let names: Vec<_> = found.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["major al-c", "major al-eb", "major al-f", "major al-g", "major al-ab", "major al-bb"]
    );

    assert!(!found[0].transposition);
    assert!(found[1..].iter().all(|r| r.transposition));
    assert_eq!(found[0].ascending[0].note_name, "c");

    for realization in &found {
        assert!(interval_lists_match(
            &realization.ascending_intervals,
            &found[0].ascending_intervals,
            DEFAULT_CENTS_TOLERANCE
        ));
        assert_eq!(realization.ascending_ajnas.len(), realization.ascending.len());
        assert_eq!(realization.descending_ajnas.len(), realization.descending.len());
    }
}

#[test]
fn every_result_starts_inside_the_table_octaves() {
    let catalog = fixture_catalog();
    let table = catalog.tuning_system("12-edo").unwrap().pitch_table("c");
    let ajam = catalog.jins("ajam").unwrap();

    let found = jins_transpositions(&table, ajam, &TranspositionOptions::default());
    assert!(!found.is_empty());
    assert!(found
        .iter()
        .all(|r| BOUNDARY_OCTAVES.contains(&r.pitch_classes[0].octave)));
    assert_eq!(found.iter().filter(|r| !r.transposition).count(), 1);
}

#[test]
fn octave_shift_round_trips() {
    let catalog = fixture_catalog();
    let table = catalog.tuning_system("12-edo").unwrap().pitch_table("c");

    for pitch_class in table.iter().filter(|pc| pc.octave == 1) {
        for octaves in [1, 2, 5] {
            let up = shift_by_octaves(&table, pitch_class, octaves);
            let back = shift_by_octaves(&table, &up, -octaves);
            assert!((back.cents - pitch_class.cents).abs() < 1e-6);
            assert!((back.frequency / pitch_class.frequency - 1.0).abs() < 1e-9);
        }
    }
}

#[test]
fn transposability_matches_the_circle_of_fifths() {
    let catalog = fixture_catalog();
    let major = catalog.maqam("major").unwrap();
    let pythagorean = catalog.tuning_system("pythagorean").unwrap();
    let edo = catalog.tuning_system("12-edo").unwrap();

    assert!(is_transposable_to(pythagorean, "c", major, "f", DEFAULT_CENTS_TOLERANCE));
    assert!(!is_transposable_to(pythagorean, "c", major, "a", DEFAULT_CENTS_TOLERANCE));
    assert!(is_transposable_to(edo, "c", major, "a", DEFAULT_CENTS_TOLERANCE));
}

#[test]
fn sayr_moves_with_the_tonic() {
    let catalog = fixture_catalog();
    let table = catalog.tuning_system("pythagorean").unwrap().pitch_table("c");
    let major = catalog.maqam("major").unwrap();

    let found = maqam_transpositions(&table, &[], major, &TranspositionOptions::default().octave_one());
    let on_g = found.iter().find(|r| r.name == "major al-g").unwrap();
    let moved = transpose_sayr(&major.suyur[0], &table, major, on_g);

    assert!(!moved.has_out_of_bounds_notes);
    let json = serde_json::to_value(&moved.sayr.stops).unwrap();
    assert_eq!(json[0]["value"], "g");
    assert_eq!(json[1]["starting_note"], "g");
    assert_eq!(json[2]["value"], "ascending");
    assert_eq!(json[3]["value"], "jawāb d");
    assert_eq!(json[4]["starting_note"], "jawāb d");
}

#[test]
fn pythagorean_classification_against_equal_temperament() {
    let catalog = fixture_catalog();
    let tuning = catalog.tuning_system("pythagorean").unwrap();
    let baseline = catalog.tuning_system("12-edo").unwrap();
    let result = classify(
        &catalog.maqamat,
        tuning,
        "c",
        baseline,
        "c",
        &catalog.ajnas,
        &ClassifyOptions::default(),
    );

    assert!(result.converged);
    assert!(result.incompatible.is_empty());
    assert_eq!(result.sets.len(), 5);
    assert_eq!(result.sets[0].name, "major al-c set");

    let mut seen = HashSet::new();
    for set in &result.sets {
        assert!(set.chromatic_set.is_complete());
        assert!(set.chromatic_set.rises_from_tonic());
        assert_eq!(set.members[0].key(), set.source);
        for member in &set.members {
            assert!(seen.insert(member.key()), "{:?} placed twice", member.key());
        }
    }
}

#[test]
fn own_tuning_as_baseline_gives_one_set() {
    let catalog = fixture_catalog();
    let tuning = catalog.tuning_system("pythagorean").unwrap();
    let result = classify(
        &catalog.maqamat,
        tuning,
        "c",
        tuning,
        "c",
        &[],
        &ClassifyOptions::default(),
    );

    assert_eq!(result.sets.len(), 1);
    assert_eq!(result.sets[0].id, "maqam_major_set");
    assert!(result.incompatible.is_empty());
}

#[test]
fn equal_temperament_classification_is_total() {
    let catalog = fixture_catalog();
    let edo = catalog.tuning_system("12-edo").unwrap();
    let baseline = catalog.tuning_system("pythagorean").unwrap();
    let table = edo.pitch_table("c");
    let major = catalog.maqam("major").unwrap();
    let instances = maqam_transpositions(&table, &catalog.ajnas, major, &TranspositionOptions::default());

    let result = classify(
        &catalog.maqamat,
        edo,
        "c",
        baseline,
        "c",
        &catalog.ajnas,
        &ClassifyOptions::default(),
    );

    assert!(result.converged);
    assert!(result.incompatible.is_empty());
    let placed: usize = result.sets.iter().map(|s| s.members.len()).sum();
    assert_eq!(placed, instances.len());
}

#[test]
fn major_belongs_to_the_ajam_family() {
    let catalog = fixture_catalog();
    let table = catalog.tuning_system("12-edo").unwrap().pitch_table("c");
    let families = classify_families(&table, &catalog.maqamat, &catalog.ajnas, DEFAULT_CENTS_TOLERANCE);

    assert_eq!(families.len(), 1);
    let major = &families[0].classification;
    assert_eq!(major.family_name, "ajam");
    assert_eq!(major.full_jins_name.as_deref(), Some("ajam al-c"));
    assert_eq!(major.source, JinsSource::Ascending);
}

#[test]
fn octave_top_starts_no_jins() {
    let catalog = fixture_catalog();
    let table = catalog.tuning_system("pythagorean").unwrap().pitch_table("c");
    let major = catalog.maqam("major").unwrap();
    let found = maqam_transpositions(&table, &catalog.ajnas, major, &TranspositionOptions::default().octave_one());

    for realization in &found {
        assert!(realization.ascending_ajnas[0].is_some(), "{}", realization.name);
        assert!(realization.ascending_ajnas[7].is_none(), "{}", realization.name);
        assert!(realization.descending_ajnas[0].is_none(), "{}", realization.name);
    }
}
