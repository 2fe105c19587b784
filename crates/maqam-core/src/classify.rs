//! Partitioning every realization of a collection of maqāmāt into classes
//! that share one chromatic set.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::chromatic::{build_own_set, build_twelve_tone_set, is_compatible, ChromaticSet, Incompatibility};
use crate::pitch::PitchClass;
use crate::transpose::{maqam_transpositions, TranspositionOptions};
use crate::tuning::TuningSystem;
use crate::types::{JinsTemplate, MaqamRealization, MaqamTemplate};
use crate::DEFAULT_CENTS_TOLERANCE;

/// Default bound on partitioning sweeps.
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// Reduces a realization to the chromatic set its class is keyed by.
pub trait PitchClassSetBuilder {
    fn build(&self, realization: &MaqamRealization, cents_tolerance: f64) -> Result<ChromaticSet, Incompatibility>;
}

/// Full twelve-letter sets, completed from a baseline tuning.
#[derive(Debug, Clone)]
pub struct TwelveToneBuilder {
    baseline: Vec<PitchClass>,
}

impl TwelveToneBuilder {
    pub fn new(baseline: Vec<PitchClass>) -> Self {
        Self { baseline }
    }

    pub fn from_tuning(baseline: &dyn TuningSystem, starting_note: &str) -> Self {
        Self::new(baseline.pitch_table(starting_note))
    }
}

impl PitchClassSetBuilder for TwelveToneBuilder {
    fn build(&self, realization: &MaqamRealization, cents_tolerance: f64) -> Result<ChromaticSet, Incompatibility> {
        build_twelve_tone_set(realization, &self.baseline, cents_tolerance)
    }
}

/// Sets made only of the realization's own letters.
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnPitchClassBuilder;

impl PitchClassSetBuilder for OwnPitchClassBuilder {
    fn build(&self, realization: &MaqamRealization, cents_tolerance: f64) -> Result<ChromaticSet, Incompatibility> {
        build_own_set(realization, cents_tolerance)
    }
}

/// Sweep priority: every canonical form, across all templates, is examined
/// before any transposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepPass {
    Canonical,
    Transposed,
}

impl SweepPass {
    pub const ORDER: [SweepPass; 2] = [SweepPass::Canonical, SweepPass::Transposed];

    pub fn admits(&self, realization: &MaqamRealization) -> bool {
        match self {
            SweepPass::Canonical => !realization.transposition,
            SweepPass::Transposed => realization.transposition,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyOptions {
    pub cents_tolerance: f64,
    pub max_iterations: usize,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            cents_tolerance: DEFAULT_CENTS_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// Identity of one realization within a classification run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceKey {
    pub maqam_id: String,
    pub transposition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedInstance {
    pub maqam_id: String,
    pub maqam_name: String,
    pub realization: MaqamRealization,
}

impl ClassifiedInstance {
    pub fn key(&self) -> InstanceKey {
        InstanceKey {
            maqam_id: self.maqam_id.clone(),
            transposition: self.realization.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationSet {
    pub id: String,
    /// `"<source transposition> set"`
    pub name: String,
    pub source: InstanceKey,
    pub chromatic_set: ChromaticSet,
    /// Source first, then members in the order they joined.
    pub members: Vec<ClassifiedInstance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncompatibleInstance {
    pub instance: ClassifiedInstance,
    pub reason: Incompatibility,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub sets: Vec<ClassificationSet>,
    pub incompatible: Vec<IncompatibleInstance>,
    pub iterations: usize,
    /// False when the sweep limit stopped the run with instances left over.
    pub converged: bool,
}

impl Classification {
    /// Set containing the instance, if any.
    pub fn set_of(&self, key: &InstanceKey) -> Option<&ClassificationSet> {
        self.sets
            .iter()
            .find(|set| set.members.iter().any(|m| &m.key() == key))
    }
}

/// Every realization of every maqam in `table`, canonical forms included.
pub fn realize_all(
    table: &[PitchClass],
    maqamat: &[MaqamTemplate],
    ajnas: &[JinsTemplate],
    cents_tolerance: f64,
) -> Vec<ClassifiedInstance> {
    let options = TranspositionOptions::default().with_cents_tolerance(cents_tolerance);
    maqamat
        .iter()
        .flat_map(|maqam| {
            maqam_transpositions(table, ajnas, maqam, &options)
                .into_iter()
                .map(|realization| ClassifiedInstance {
                    maqam_id: maqam.id.clone(),
                    maqam_name: maqam.name.clone(),
                    realization,
                })
        })
        .collect()
}

/// Group every realization of `maqamat` in `tuning` by twelve-tone chromatic
/// set, completing sets from `baseline`.
pub fn classify(
    maqamat: &[MaqamTemplate],
    tuning: &dyn TuningSystem,
    starting_note: &str,
    baseline: &dyn TuningSystem,
    baseline_starting_note: &str,
    ajnas: &[JinsTemplate],
    options: &ClassifyOptions,
) -> Classification {
    let table = tuning.pitch_table(starting_note);
    let instances = realize_all(&table, maqamat, ajnas, options.cents_tolerance);
    let builder = TwelveToneBuilder::from_tuning(baseline, baseline_starting_note);
    partition(instances, &builder, options)
}

/// Group every realization of `maqamat` by the letters it uses itself.
pub fn classify_by_own_pitch_classes(
    maqamat: &[MaqamTemplate],
    tuning: &dyn TuningSystem,
    starting_note: &str,
    ajnas: &[JinsTemplate],
    options: &ClassifyOptions,
) -> Classification {
    let table = tuning.pitch_table(starting_note);
    let instances = realize_all(&table, maqamat, ajnas, options.cents_tolerance);
    partition(instances, &OwnPitchClassBuilder, options)
}

/// Assign every instance to exactly one set or to the incompatible list.
///
/// Each sweep takes the first unprocessed instance in [`SweepPass`] order.
/// An instance whose set equals an existing one joins it; otherwise it seeds
/// a new set that immediately absorbs every compatible unprocessed instance.
/// Either way the sweep restarts. Stops when a sweep makes no progress or
/// after `max_iterations` sweeps.
pub fn partition(
    instances: Vec<ClassifiedInstance>,
    builder: &dyn PitchClassSetBuilder,
    options: &ClassifyOptions,
) -> Classification {
    let mut partitioner = Partitioner {
        instances,
        builder,
        cents_tolerance: options.cents_tolerance,
        processed: HashSet::new(),
        sets: Vec::new(),
        incompatible: Vec::new(),
    };

    let mut iterations = 0;
    while iterations < options.max_iterations {
        iterations += 1;
        if !partitioner.sweep() {
            break;
        }
    }

    let converged = partitioner
        .instances
        .iter()
        .all(|instance| partitioner.processed.contains(&instance.key()));
    if !converged {
        warn!(
            iterations,
            unprocessed = partitioner.instances.len().saturating_sub(partitioner.processed.len()),
            "classification stopped at iteration limit"
        );
    }
    info!(
        instances = partitioner.instances.len(),
        sets = partitioner.sets.len(),
        incompatible = partitioner.incompatible.len(),
        iterations,
        "classification finished"
    );

    Classification {
        sets: partitioner.sets,
        incompatible: partitioner.incompatible,
        iterations,
        converged,
    }
}

struct Partitioner<'a> {
    instances: Vec<ClassifiedInstance>,
    builder: &'a dyn PitchClassSetBuilder,
    cents_tolerance: f64,
    processed: HashSet<InstanceKey>,
    sets: Vec<ClassificationSet>,
    incompatible: Vec<IncompatibleInstance>,
}

impl Partitioner<'_> {
    /// One sweep. Returns true when a set was created or joined.
    fn sweep(&mut self) -> bool {
        for pass in SweepPass::ORDER {
            for index in 0..self.instances.len() {
                let instance = &self.instances[index];
                if !pass.admits(&instance.realization) {
                    continue;
                }
                let key = instance.key();
                if self.processed.contains(&key) {
                    continue;
                }
                match self.builder.build(&instance.realization, self.cents_tolerance) {
                    Err(reason) => {
                        debug!(instance = %key.transposition, reason = reason.code(), "incompatible");
                        self.incompatible.push(IncompatibleInstance {
                            instance: instance.clone(),
                            reason,
                        });
                        self.processed.insert(key);
                    }
                    Ok(chromatic_set) => {
                        self.place(index, key, chromatic_set);
                        return true;
                    }
                }
            }
        }
        false
    }

    fn place(&mut self, index: usize, key: InstanceKey, chromatic_set: ChromaticSet) {
        let tolerance = self.cents_tolerance;
        let instance = self.instances[index].clone();

        if let Some(existing) = self
            .sets
            .iter_mut()
            .find(|set| set.chromatic_set.equivalent(&chromatic_set, tolerance))
        {
            debug!(instance = %key.transposition, set = %existing.name, "joined equal set");
            existing.members.push(instance);
            self.processed.insert(key);
            return;
        }

        self.processed.insert(key.clone());
        let mut members = vec![instance];
        for other in &self.instances {
            let other_key = other.key();
            if self.processed.contains(&other_key) {
                continue;
            }
            if is_compatible(&other.realization, &chromatic_set, tolerance) {
                members.push(other.clone());
                self.processed.insert(other_key);
            }
        }

        let id = self.next_set_id(&key.maqam_id);
        let name = format!("{} set", key.transposition);
        debug!(set = %name, members = members.len(), "new set");
        self.sets.push(ClassificationSet {
            id,
            name,
            source: key,
            chromatic_set,
            members,
        });
    }

    fn next_set_id(&self, maqam_id: &str) -> String {
        let base = format!("maqam_{maqam_id}_set");
        let taken = self.sets.iter().filter(|set| set.source.maqam_id == maqam_id).count();
        if taken == 0 {
            base
        } else {
            format!("{base}_{}", taken + 1)
        }
    }
}
