use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::dataset::{ACCESS_TIMES_FILE, CONFIGS_FILE, TraceSource};
use crate::error::ConfigError;

/// Top level configuration of one design space study.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Study {
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default, rename = "sweep")]
    pub sweeps: Vec<Sweep>,
}

/// Location and shape of the simulation results.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetConfig {
    pub root: PathBuf,
    pub traces: Vec<String>,
    pub runs: usize,
    /// One name per configuration column, e.g. `C`, `B`, `S`, `P`, `T`, `M`.
    pub parameters: Vec<String>,
    #[serde(default = "default_access_times_file")]
    pub access_times_file: String,
    #[serde(default = "default_configs_file")]
    pub configs_file: String,
    #[serde(default)]
    pub validate_alignment: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_top")]
    pub top: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            top: default_top(),
        }
    }
}

/// Varies one parameter over `start..end`.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Sweep {
    pub parameter: String,
    pub start: u32,
    pub end: u32,
}

impl Sweep {
    pub fn values(&self) -> Vec<u32> {
        (self.start..self.end).collect()
    }
}

fn default_access_times_file() -> String {
    ACCESS_TIMES_FILE.to_string()
}

fn default_configs_file() -> String {
    CONFIGS_FILE.to_string()
}

fn default_output_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_top() -> usize {
    10
}

impl Study {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let study: Study = toml::from_str(text)?;
        study.validate()?;
        Ok(study)
    }

    /// Index of a parameter by name.
    pub fn parameter_index(&self, name: &str) -> Result<usize, ConfigError> {
        self.dataset
            .parameters
            .iter()
            .position(|parameter| parameter == name)
            .ok_or_else(|| ConfigError::UnknownParameter(name.to_string()))
    }

    pub fn trace_sources(&self) -> Vec<TraceSource> {
        self.dataset
            .traces
            .iter()
            .map(|trace| {
                TraceSource::with_file_names(
                    &self.dataset.root,
                    trace,
                    &self.dataset.access_times_file,
                    &self.dataset.configs_file,
                )
            })
            .collect()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.dataset.traces.is_empty() {
            return Err(ConfigError::Invalid("no traces given".to_string()));
        }
        if self.dataset.parameters.is_empty() {
            return Err(ConfigError::Invalid("no parameters given".to_string()));
        }

        let mut seen = HashSet::new();
        for parameter in &self.dataset.parameters {
            if !seen.insert(parameter) {
                return Err(ConfigError::Invalid(format!(
                    "parameter '{parameter}' given multiple times"
                )));
            }
        }

        for sweep in &self.sweeps {
            self.parameter_index(&sweep.parameter)?;
            if sweep.start >= sweep.end {
                return Err(ConfigError::Invalid(format!(
                    "sweep over '{}' has an empty range {}..{}",
                    sweep.parameter, sweep.start, sweep.end
                )));
            }
        }

        Ok(())
    }

    fn resolve_paths(&mut self, base: &Path) {
        if self.dataset.root.is_relative() {
            self.dataset.root = base.join(&self.dataset.root);
        }
        if self.output.directory.is_relative() {
            self.output.directory = base.join(&self.output.directory);
        }
    }
}

/// Reads a study file. Relative paths inside it resolve against its directory.
pub fn read_config(path: impl AsRef<Path>) -> Result<Study, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut study = Study::from_toml(&text)?;
    study.resolve_paths(path.parent().unwrap_or_else(|| Path::new(".")));
    Ok(study)
}

#[cfg(test)]
mod test {
    use super::*;

    const STUDY: &str = r#"
        [dataset]
        root = "data_first_pass"
        traces = ["gcc", "leela"]
        runs = 56
        parameters = ["C", "B", "S", "P", "T", "M"]

        [[sweep]]
        parameter = "C"
        start = 9
        end = 16

        [[sweep]]
        parameter = "B"
        start = 4
        end = 8
    "#;

    #[test]
    fn defaults() {
        let study = Study::from_toml(STUDY).unwrap();
        assert_eq!(study.output.top, 10);
        assert_eq!(study.output.directory, PathBuf::from("."));
        assert_eq!(study.dataset.access_times_file, "access_times.txt");
        assert!(!study.dataset.validate_alignment);
        assert_eq!(study.sweeps[0].values(), (9..16).collect::<Vec<_>>());
        assert_eq!(study.parameter_index("B").unwrap(), 1);
    }

    #[test]
    fn trace_sources_follow_layout() {
        let study = Study::from_toml(STUDY).unwrap();
        let sources = study.trace_sources();
        assert_eq!(sources[1].name, "leela");
        assert_eq!(
            sources[1].configurations,
            PathBuf::from("data_first_pass/leela/configs.txt")
        );
    }

    #[test]
    fn unknown_sweep_parameter() {
        let text = STUDY.replace("parameter = \"B\"", "parameter = \"X\"");
        assert!(matches!(
            Study::from_toml(&text),
            Err(ConfigError::UnknownParameter(name)) if name == "X"
        ));
    }

    #[test]
    fn empty_sweep_range() {
        let text = STUDY.replace("end = 8", "end = 4");
        assert!(matches!(Study::from_toml(&text), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn duplicate_parameter() {
        let text = STUDY.replace("\"M\"]", "\"C\"]");
        assert!(matches!(Study::from_toml(&text), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn relative_paths_resolve_against_study_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("study.toml");
        std::fs::write(&path, STUDY).unwrap();

        let study = read_config(&path).unwrap();
        assert_eq!(study.dataset.root, dir.path().join("data_first_pass"));
        assert_eq!(study.output.directory, dir.path().join("."));
    }
}
