//! CLI command implementations

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use maqam_core::classify::{classify_by_own_pitch_classes, ClassifyOptions};
use maqam_core::{
    classify as classify_twelve_tone, classify_families, is_jins_transposable_to, is_transposable_to,
    jins_transpositions, maqam_transpositions, AnalysisConfig, Catalog, TranspositionOptions, TuningSystem,
};

pub enum Template {
    Maqam(String),
    Jins(String),
}

#[derive(Debug, Clone, Copy)]
pub struct Listing {
    pub octave_one: bool,
    pub no_tahlil: bool,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let output = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", output);
    Ok(())
}

/// Print every realization as JSON
pub fn transpositions(
    catalog: &Catalog,
    config: &AnalysisConfig,
    tuning: &str,
    starting_note: &str,
    template: &Template,
    listing: Listing,
) -> Result<()> {
    let tuning = catalog.tuning_system(tuning)?;
    let table = tuning.pitch_table(starting_note);

    let mut options = TranspositionOptions::default().with_cents_tolerance(config.cents_tolerance);
    if listing.octave_one {
        options = options.octave_one();
    }
    if listing.no_tahlil {
        options = options.without_tahlil();
    }

    match template {
        Template::Maqam(id) => {
            let maqam = catalog.maqam(id)?;
            let found = maqam_transpositions(&table, &catalog.ajnas, maqam, &options);
            info!(maqam = %maqam.name, count = found.len(), "transpositions");
            print_json(&found)
        }
        Template::Jins(id) => {
            let jins = catalog.jins(id)?;
            let found = jins_transpositions(&table, jins, &options);
            info!(jins = %jins.name, count = found.len(), "transpositions");
            print_json(&found)
        }
    }
}

#[derive(Serialize)]
struct TransposabilityReport<'a> {
    tuning_system: &'a str,
    starting_note: &'a str,
    template: &'a str,
    target: &'a str,
    transposable: bool,
}

/// Print whether the template can start on `target`
pub fn can_transpose(
    catalog: &Catalog,
    config: &AnalysisConfig,
    tuning: &str,
    starting_note: &str,
    template: &Template,
    target: &str,
) -> Result<()> {
    let system = catalog.tuning_system(tuning)?;
    let (name, transposable) = match template {
        Template::Maqam(id) => {
            let maqam = catalog.maqam(id)?;
            let ok = is_transposable_to(system, starting_note, maqam, target, config.cents_tolerance);
            (maqam.id.as_str(), ok)
        }
        Template::Jins(id) => {
            let jins = catalog.jins(id)?;
            let ok = is_jins_transposable_to(system, starting_note, jins, target, config.cents_tolerance);
            (jins.id.as_str(), ok)
        }
    };

    print_json(&TransposabilityReport {
        tuning_system: system.id(),
        starting_note,
        template: name,
        target,
        transposable,
    })
}

/// Classify every maqam in the catalog and print the partition
pub fn classify(
    catalog: &Catalog,
    config: &AnalysisConfig,
    tuning: &str,
    starting_note: &str,
    own_sets: bool,
) -> Result<()> {
    let system = catalog.tuning_system(tuning)?;
    let options: ClassifyOptions = config.classify_options();

    let classification = if own_sets {
        classify_by_own_pitch_classes(&catalog.maqamat, system, starting_note, &catalog.ajnas, &options)
    } else {
        let baseline = catalog
            .tuning_system(&config.baseline.tuning_system)
            .context("Baseline tuning system must be in the catalog (set baseline.tuning_system or --baseline)")?;
        classify_twelve_tone(
            &catalog.maqamat,
            system,
            starting_note,
            baseline,
            &config.baseline.starting_note,
            &catalog.ajnas,
            &options,
        )
    };

    print_json(&classification)
}

/// Print the first-jins family of every maqam, or of `maqam` alone
pub fn family(
    catalog: &Catalog,
    config: &AnalysisConfig,
    tuning: &str,
    starting_note: &str,
    maqam: Option<&str>,
) -> Result<()> {
    let table = catalog.tuning_system(tuning)?.pitch_table(starting_note);
    let selected = match maqam {
        Some(id) => std::slice::from_ref(catalog.maqam(id)?),
        None => catalog.maqamat.as_slice(),
    };

    let families = classify_families(&table, selected, &catalog.ajnas, config.cents_tolerance);
    info!(count = families.len(), "maqam families");
    print_json(&families)
}
