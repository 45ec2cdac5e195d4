use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{RankError, Result};
use crate::parse::{parse_access_times_into, parse_configs_into, read_input};
use crate::ranking::Configuration;

pub const ACCESS_TIMES_FILE: &str = "access_times.txt";
pub const CONFIGS_FILE: &str = "configs.txt";

/// Where the measurement and configuration files of one trace live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceSource {
    pub name: String,
    pub access_times: PathBuf,
    pub configurations: PathBuf,
}

impl TraceSource {
    /// `<root>/<name>/access_times.txt` and `<root>/<name>/configs.txt`
    pub fn in_directory(root: impl AsRef<Path>, name: impl Into<String>) -> Self {
        Self::with_file_names(root, name, ACCESS_TIMES_FILE, CONFIGS_FILE)
    }

    pub fn with_file_names(
        root: impl AsRef<Path>,
        name: impl Into<String>,
        access_times_file: &str,
        configs_file: &str,
    ) -> Self {
        let name = name.into();
        let dir = root.as_ref().join(&name);
        Self {
            access_times: dir.join(access_times_file),
            configurations: dir.join(configs_file),
            name,
        }
    }
}

/// Access times and configurations of every run of every trace in one experiment pass.
///
/// Both buffers are trace-major. Run `i` is expected to denote the same configuration
/// for every trace; [`Dataset::validate_alignment`] checks this on request.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    traces: Vec<String>,
    num_runs: usize,
    num_params: usize,
    access_times: Vec<f64>,
    configurations: Vec<u32>,
}

impl Dataset {
    /// Reads the measurement and configuration file of every trace.
    ///
    /// Precondition: configurations are positionally aligned across traces. This is not
    /// checked here; call [`Dataset::validate_alignment`] to verify it.
    pub fn load(sources: &[TraceSource], num_runs: usize, num_params: usize) -> Result<Self> {
        let mut builder = DatasetBuilder::new(sources.len(), num_runs, num_params);
        for source in sources {
            debug!(
                trace = %source.name,
                path = %source.access_times.display(),
                "reading access times"
            );
            let access_times = read_input(&source.access_times)?;
            debug!(
                trace = %source.name,
                path = %source.configurations.display(),
                "reading configurations"
            );
            let configurations = read_input(&source.configurations)?;

            builder.push_trace(
                &source.name,
                (&source.access_times.display().to_string(), &access_times),
                (&source.configurations.display().to_string(), &configurations),
            )?;
        }

        builder.finish()
    }

    /// Builds a dataset from in-memory rows: `access_times[trace][run]` and
    /// `configurations[trace][run][param]`.
    pub fn from_rows(
        traces: Vec<String>,
        access_times: Vec<Vec<f64>>,
        configurations: Vec<Vec<Vec<u32>>>,
    ) -> Result<Self> {
        if traces.len() != access_times.len() || traces.len() != configurations.len() {
            return Err(RankError::Shape(format!(
                "{} traces, {} access time rows, {} configuration rows",
                traces.len(),
                access_times.len(),
                configurations.len()
            )));
        }

        let num_runs = access_times.first().map_or(0, Vec::len);
        let num_params = configurations
            .first()
            .and_then(|runs| runs.first())
            .map_or(0, Vec::len);

        let mut builder = DatasetBuilder::new(traces.len(), num_runs, num_params);
        for ((name, times), configs) in traces.into_iter().zip(access_times).zip(configurations) {
            if times.len() != num_runs || configs.len() != num_runs {
                return Err(RankError::Shape(format!(
                    "trace '{name}' has {} access times and {} configurations, expected {num_runs}",
                    times.len(),
                    configs.len()
                )));
            }
            if let Some(config) = configs.iter().find(|config| config.len() != num_params) {
                return Err(RankError::Shape(format!(
                    "trace '{name}' has a configuration with {} parameters, expected {num_params}",
                    config.len()
                )));
            }

            builder.traces.push(name);
            builder.access_times.extend(times);
            builder.configurations.extend(configs.into_iter().flatten());
        }

        builder.finish()
    }

    pub fn traces(&self) -> &[String] {
        &self.traces
    }

    pub fn num_traces(&self) -> usize {
        self.traces.len()
    }

    pub fn num_runs(&self) -> usize {
        self.num_runs
    }

    pub fn num_params(&self) -> usize {
        self.num_params
    }

    /// Access times of every run of one trace.
    pub fn access_times(&self, trace: usize) -> &[f64] {
        let start = trace * self.num_runs;
        &self.access_times[start..start + self.num_runs]
    }

    pub fn configuration(&self, trace: usize, run: usize) -> &[u32] {
        let start = (trace * self.num_runs + run) * self.num_params;
        &self.configurations[start..start + self.num_params]
    }

    /// Iterates `(access time, configuration)` over every run of every trace.
    pub fn runs(&self) -> impl Iterator<Item = (f64, &[u32])> + '_ {
        (0..self.access_times.len()).map(move |idx| {
            let start = idx * self.num_params;
            (
                self.access_times[idx],
                &self.configurations[start..start + self.num_params],
            )
        })
    }

    /// Checks that every trace has the same configuration at every run index as the
    /// first trace.
    pub fn validate_alignment(&self) -> Result<()> {
        for trace in 1..self.num_traces() {
            for run in 0..self.num_runs {
                let expected = self.configuration(0, run);
                let found = self.configuration(trace, run);
                if found != expected {
                    return Err(RankError::Misaligned {
                        trace: self.traces[trace].clone(),
                        reference: self.traces[0].clone(),
                        run,
                        found: Configuration::from(found).to_string(),
                        expected: Configuration::from(expected).to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Fills the trace-major buffers of a [`Dataset`] one trace at a time, reserving room
/// for each trace once its file contents are known.
#[derive(Debug)]
pub struct DatasetBuilder {
    num_runs: usize,
    num_params: usize,
    traces: Vec<String>,
    access_times: Vec<f64>,
    configurations: Vec<u32>,
}

impl DatasetBuilder {
    pub fn new(num_traces: usize, num_runs: usize, num_params: usize) -> Self {
        Self {
            num_runs,
            num_params,
            traces: Vec::with_capacity(num_traces),
            access_times: Vec::new(),
            configurations: Vec::new(),
        }
    }

    /// Parses one trace's measurement and configuration file contents, each given as
    /// `(origin, text)`.
    pub fn push_trace(
        &mut self,
        name: &str,
        (times_origin, times_text): (&str, &str),
        (configs_origin, configs_text): (&str, &str),
    ) -> Result<&mut Self> {
        // a run needs a line and a parameter needs a character, so the file sizes bound
        // what a wrong run count can make us allocate
        let runs = self.num_runs.min(times_text.lines().count());
        self.access_times.reserve(runs);
        self.configurations
            .reserve(runs.saturating_mul(self.num_params).min(configs_text.len()));

        parse_access_times_into(times_origin, times_text, self.num_runs, &mut self.access_times)?;
        parse_configs_into(
            configs_origin,
            configs_text,
            self.num_runs,
            self.num_params,
            &mut self.configurations,
        )?;
        self.traces.push(name.to_string());

        Ok(self)
    }

    pub fn finish(self) -> Result<Dataset> {
        if self.traces.is_empty() {
            return Err(RankError::EmptyDataset);
        }

        debug_assert_eq!(self.access_times.len(), self.traces.len() * self.num_runs);
        debug_assert_eq!(
            self.configurations.len(),
            self.traces.len() * self.num_runs * self.num_params
        );

        Ok(Dataset {
            traces: self.traces,
            num_runs: self.num_runs,
            num_params: self.num_params,
            access_times: self.access_times,
            configurations: self.configurations,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn dataset() -> Dataset {
        Dataset::from_rows(
            vec!["a".into(), "b".into()],
            vec![vec![5.0, 1.0, 3.0], vec![7.0, 3.0, 1.0]],
            vec![
                vec![vec![10, 1], vec![20, 2], vec![30, 3]],
                vec![vec![10, 1], vec![20, 2], vec![30, 3]],
            ],
        )
        .unwrap()
    }

    #[test]
    fn shape_and_accessors() {
        let dataset = dataset();
        assert_eq!(dataset.num_traces(), 2);
        assert_eq!(dataset.num_runs(), 3);
        assert_eq!(dataset.num_params(), 2);
        assert_eq!(dataset.access_times(1), &[7.0, 3.0, 1.0]);
        assert_eq!(dataset.configuration(1, 2), &[30, 3]);
        assert_eq!(dataset.runs().count(), 6);
        assert!(dataset.validate_alignment().is_ok());
    }

    #[test]
    fn builder_parses_text() {
        let mut builder = DatasetBuilder::new(1, 2, 2);
        builder
            .push_trace("gcc", ("times", "1.0\n2.0\n"), ("configs", "9 4\n10 5\n"))
            .unwrap();
        let dataset = builder.finish().unwrap();
        assert_eq!(dataset.traces(), &["gcc".to_string()]);
        assert_eq!(dataset.configuration(0, 1), &[10, 5]);
    }

    #[test]
    fn misalignment_is_reported() {
        let dataset = Dataset::from_rows(
            vec!["a".into(), "b".into()],
            vec![vec![1.0, 2.0], vec![1.0, 2.0]],
            vec![vec![vec![1], vec![2]], vec![vec![1], vec![3]]],
        )
        .unwrap();

        match dataset.validate_alignment().unwrap_err() {
            RankError::Misaligned { trace, run, found, expected, .. } => {
                assert_eq!(trace, "b");
                assert_eq!(run, 1);
                assert_eq!(found, "3");
                assert_eq!(expected, "2");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn no_traces() {
        assert!(matches!(
            Dataset::from_rows(vec![], vec![], vec![]),
            Err(RankError::EmptyDataset)
        ));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = Dataset::from_rows(
            vec!["a".into()],
            vec![vec![1.0, 2.0]],
            vec![vec![vec![1, 2], vec![3]]],
        )
        .unwrap_err();
        assert!(matches!(err, RankError::Shape(_)));
    }

    #[test]
    fn huge_run_count_is_a_line_count_error() {
        let dir = tempfile::tempdir().unwrap();
        let trace_dir = dir.path().join("gcc");
        std::fs::create_dir_all(&trace_dir).unwrap();
        std::fs::write(trace_dir.join(ACCESS_TIMES_FILE), "1.0\n").unwrap();
        std::fs::write(trace_dir.join(CONFIGS_FILE), "12 6 0 10 3 10\n").unwrap();
        let source = TraceSource::in_directory(dir.path(), "gcc");

        for num_runs in [usize::MAX / 4, usize::MAX] {
            match Dataset::load(std::slice::from_ref(&source), num_runs, 6) {
                Err(RankError::MalformedInput { line, .. }) => assert_eq!(line, 2),
                other => panic!("unexpected result: {other:?}"),
            }
        }
    }

    #[test]
    fn missing_file() {
        let source = TraceSource::in_directory("/nonexistent/amat_rank", "gcc");
        assert!(matches!(
            Dataset::load(&[source], 1, 1),
            Err(RankError::NotFound { .. })
        ));
    }
}
