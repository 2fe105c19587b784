//! JSON catalog of tuning systems, ajnās and maqāmāt.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::tuning::TuningSystemData;
use crate::types::{JinsTemplate, MaqamTemplate};
use crate::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub tuning_systems: Vec<TuningSystemData>,
    #[serde(default)]
    pub ajnas: Vec<JinsTemplate>,
    #[serde(default)]
    pub maqamat: Vec<MaqamTemplate>,
}

impl Catalog {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json(&contents)?;
        info!(
            path = %path.display(),
            tuning_systems = catalog.tuning_systems.len(),
            ajnas = catalog.ajnas.len(),
            maqamat = catalog.maqamat.len(),
            "loaded catalog"
        );
        Ok(catalog)
    }

    pub fn tuning_system(&self, id: &str) -> Result<&TuningSystemData> {
        self.tuning_systems
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::UnknownTuningSystem(id.to_string()))
    }

    pub fn maqam(&self, id: &str) -> Result<&MaqamTemplate> {
        self.maqamat
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| Error::UnknownMaqam(id.to_string()))
    }

    pub fn jins(&self, id: &str) -> Result<&JinsTemplate> {
        self.ajnas
            .iter()
            .find(|j| j.id == id)
            .ok_or_else(|| Error::UnknownJins(id.to_string()))
    }
}
