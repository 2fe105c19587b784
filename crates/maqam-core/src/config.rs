//! Analysis configuration with file discovery and environment overrides.
//!
//! Load order, later wins:
//! 1. Compiled defaults
//! 2. `~/.config/maqam/config.toml`
//! 3. `./maqam.toml`, or an explicit path in its place
//! 4. Environment variables:
//!    - `MAQAM_CENTS_TOLERANCE`
//!    - `MAQAM_MAX_ITERATIONS`
//!    - `MAQAM_LOG_LEVEL`

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classify::{ClassifyOptions, DEFAULT_MAX_ITERATIONS};
use crate::{Error, Result, DEFAULT_CENTS_TOLERANCE};

pub const ENV_CENTS_TOLERANCE: &str = "MAQAM_CENTS_TOLERANCE";
pub const ENV_MAX_ITERATIONS: &str = "MAQAM_MAX_ITERATIONS";
pub const ENV_LOG_LEVEL: &str = "MAQAM_LOG_LEVEL";

const LOCAL_CONFIG: &str = "maqam.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub cents_tolerance: f64,
    pub max_iterations: usize,
    pub baseline: BaselineConfig,
    /// Default tracing directive when `RUST_LOG` is unset.
    pub log_level: String,
}

/// Tuning system that fills letters a realization does not use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    pub tuning_system: String,
    pub starting_note: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            cents_tolerance: DEFAULT_CENTS_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            baseline: BaselineConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            tuning_system: "al-Kindi-(874)".to_string(),
            starting_note: "ʿushayrān".to_string(),
        }
    }
}

/// One file's worth of settings. Absent keys leave earlier values alone.
#[derive(Debug, Default, Deserialize)]
struct ConfigLayer {
    cents_tolerance: Option<f64>,
    max_iterations: Option<usize>,
    log_level: Option<String>,
    #[serde(default)]
    baseline: BaselineLayer,
}

#[derive(Debug, Default, Deserialize)]
struct BaselineLayer {
    tuning_system: Option<String>,
    starting_note: Option<String>,
}

/// Where the loaded values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    pub files: Vec<PathBuf>,
    pub env_overrides: Vec<String>,
}

impl AnalysisConfig {
    /// Load from the standard locations, then apply the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Like [`AnalysisConfig::load`], with `config_path` replacing `./maqam.toml`.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    pub fn load_with_sources_from(config_path: Option<&Path>) -> Result<(Self, ConfigSources)> {
        let mut sources = ConfigSources::default();
        let mut config = AnalysisConfig::default();

        if let Some(path) = config_path {
            if !path.exists() {
                return Err(Error::Read {
                    path: path.to_path_buf(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "config file not found"),
                });
            }
        }

        for path in discover_config_files(config_path) {
            config.merge_file(&path)?;
            sources.files.push(path);
        }

        sources.env_overrides = config.apply_env_with(|name| env::var(name).ok())?;
        debug!(files = ?sources.files, env = ?sources.env_overrides, "loaded analysis config");
        Ok((config, sources))
    }

    /// Overlay the keys present in one TOML file.
    pub fn merge_file(&mut self, path: &Path) -> Result<()> {
        let contents = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.merge_toml(&contents, path)
    }

    fn merge_toml(&mut self, contents: &str, path: &Path) -> Result<()> {
        let layer: ConfigLayer = toml::from_str(contents).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        if let Some(v) = layer.cents_tolerance {
            self.cents_tolerance = v;
        }
        if let Some(v) = layer.max_iterations {
            self.max_iterations = v;
        }
        if let Some(v) = layer.log_level {
            self.log_level = v;
        }
        if let Some(v) = layer.baseline.tuning_system {
            self.baseline.tuning_system = v;
        }
        if let Some(v) = layer.baseline.starting_note {
            self.baseline.starting_note = v;
        }
        Ok(())
    }

    /// Apply overrides read through `lookup`; returns the names that applied.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Vec<String>> {
        let mut applied = Vec::new();

        if let Some(value) = lookup(ENV_CENTS_TOLERANCE) {
            self.cents_tolerance = parse_env(ENV_CENTS_TOLERANCE, &value)?;
            applied.push(ENV_CENTS_TOLERANCE.to_string());
        }
        if let Some(value) = lookup(ENV_MAX_ITERATIONS) {
            self.max_iterations = parse_env(ENV_MAX_ITERATIONS, &value)?;
            applied.push(ENV_MAX_ITERATIONS.to_string());
        }
        if let Some(value) = lookup(ENV_LOG_LEVEL) {
            self.log_level = value;
            applied.push(ENV_LOG_LEVEL.to_string());
        }

        Ok(applied)
    }

    pub fn classify_options(&self) -> ClassifyOptions {
        ClassifyOptions {
            cents_tolerance: self.cents_tolerance,
            max_iterations: self.max_iterations,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| Error::Env {
        name: name.to_string(),
        value: value.to_string(),
    })
}

/// Config files that exist, in load order.
///
/// An explicit `cli_path` takes the place of the local `./maqam.toml`.
pub fn discover_config_files(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("maqam/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
        }
        return files;
    }

    let local = PathBuf::from(LOCAL_CONFIG);
    if local.exists() {
        files.push(local);
    }

    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.cents_tolerance, 5.0);
        assert_eq!(config.max_iterations, 1000);
        assert_eq!(config.baseline.tuning_system, "al-Kindi-(874)");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn file_overlays_only_present_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
cents_tolerance = 3.5

[baseline]
starting_note = "rāst"
"#
        )
        .unwrap();

        let mut config = AnalysisConfig::default();
        config.merge_file(file.path()).unwrap();
        assert_eq!(config.cents_tolerance, 3.5);
        assert_eq!(config.max_iterations, 1000);
        assert_eq!(config.baseline.tuning_system, "al-Kindi-(874)");
        assert_eq!(config.baseline.starting_note, "rāst");
    }

    #[test]
    fn malformed_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "cents_tolerance = \"wide\"").unwrap();

        let err = AnalysisConfig::default().merge_file(file.path()).unwrap_err();
        match err {
            Error::Config { path, .. } => assert_eq!(path, file.path()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn explicit_path_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis.toml");
        std::fs::write(&path, "max_iterations = 7\n").unwrap();

        let (config, sources) = AnalysisConfig::load_with_sources_from(Some(&path)).unwrap();
        assert_eq!(config.max_iterations, 7);
        assert!(sources.files.contains(&path));
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(matches!(
            AnalysisConfig::load_from(Some(&path)),
            Err(Error::Read { .. })
        ));
    }

    #[test]
    fn env_overrides_win() {
        let vars: HashMap<&str, &str> = [(ENV_CENTS_TOLERANCE, "1.5"), (ENV_LOG_LEVEL, "debug")].into();
        let mut config = AnalysisConfig::default();
        let applied = config
            .apply_env_with(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.cents_tolerance, 1.5);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.max_iterations, 1000);
        assert_eq!(applied, vec![ENV_CENTS_TOLERANCE, ENV_LOG_LEVEL]);
    }

    #[test]
    fn unparsable_env_value_is_rejected() {
        let mut config = AnalysisConfig::default();
        let err = config
            .apply_env_with(|name| (name == ENV_MAX_ITERATIONS).then(|| "many".to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::Env { .. }));
    }

    #[test]
    fn classify_options_follow_config() {
        let config = AnalysisConfig {
            cents_tolerance: 2.0,
            max_iterations: 10,
            ..Default::default()
        };
        let options = config.classify_options();
        assert_eq!(options.cents_tolerance, 2.0);
        assert_eq!(options.max_iterations, 10);
    }
}
