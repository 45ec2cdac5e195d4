use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::Study;
use crate::dataset::Dataset;
use crate::error::{RankError, Result};
use crate::plot::{Plot, file_safe};
use crate::ranking::{ConfigRanker, RankedResult};
use crate::report::{format_top, write_configs};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Analysis {
    /// Mean access time per value of each swept parameter.
    Sweep,
    /// Configurations ranked by their mean over all traces.
    Mean,
    /// Configurations ranked separately for every trace.
    PerTrace,
    /// Like `Mean`, over the entire configuration space, with one scatter plot per parameter.
    EntireSpace,
}

impl Analysis {
    pub fn name(&self) -> &'static str {
        match self {
            Analysis::Sweep => "sweep",
            Analysis::Mean => "mean",
            Analysis::PerTrace => "per_trace",
            Analysis::EntireSpace => "entire_space",
        }
    }
}

#[derive(Debug, Default)]
pub struct AnalysisOutput {
    /// Console summaries, one per ranking.
    pub summaries: Vec<String>,
    /// Top-K configuration files that were written.
    pub written: Vec<PathBuf>,
    pub plots: Vec<Plot>,
}

impl AnalysisOutput {
    /// Writes every plot as `<analysis>_<title>.dat` into `directory`. Titles that map to
    /// the same file name get `_2`, `_3`, ... appended.
    pub fn write_plot_data(&self, analysis: Analysis, directory: &Path) -> Result<Vec<PathBuf>> {
        create_output_directory(directory)?;
        let mut taken = HashSet::new();
        self.plots
            .iter()
            .map(|plot| {
                let stem = unique(&mut taken, plot.file_stem());
                let path = directory.join(format!("{}_{stem}.dat", analysis.name()));
                plot.write_data(&path)?;
                Ok(path)
            })
            .collect()
    }
}

/// Loads the dataset a study describes, checking alignment if the study asks for it.
pub fn load_study(study: &Study) -> Result<Dataset> {
    let dataset = Dataset::load(
        &study.trace_sources(),
        study.dataset.runs,
        study.dataset.parameters.len(),
    )?;
    info!(
        traces = dataset.num_traces(),
        runs = dataset.num_runs(),
        params = dataset.num_params(),
        "loaded dataset"
    );

    if study.dataset.validate_alignment {
        dataset.validate_alignment()?;
    } else if dataset.num_traces() > 1 {
        warn!("configurations are assumed to be aligned across traces by run index");
    }

    Ok(dataset)
}

pub fn run(study: &Study, dataset: &Dataset, analysis: Analysis) -> Result<AnalysisOutput> {
    let parameters = &study.dataset.parameters;
    if parameters.len() != dataset.num_params() {
        return Err(RankError::Shape(format!(
            "study names {} parameters, dataset has {}",
            parameters.len(),
            dataset.num_params()
        )));
    }

    let ranker = ConfigRanker::new(dataset);
    match analysis {
        Analysis::Sweep => sweep(study, &ranker),
        Analysis::Mean => {
            let ranked = ranker.rank_mean();
            let mut output = top_k(study, &ranked, "top_{k}_configs.txt", "")?;
            output.plots.push(Plot::trajectories(
                format!("Varying {}", parameters.concat()),
                &ranked,
                parameters,
            ));
            Ok(output)
        }
        Analysis::EntireSpace => {
            let ranked = ranker.rank_mean();
            let mut output = top_k(study, &ranked, "top_{k}_configs_entire_space.txt", "")?;
            output.plots = Plot::scatter_per_parameter(&ranked, parameters);
            Ok(output)
        }
        Analysis::PerTrace => {
            let mut output = AnalysisOutput::default();
            let mut taken = HashSet::new();
            for ranking in ranker.rank_per_trace() {
                let trace = unique(&mut taken, file_safe(ranking.trace, "trace"));
                let file_name = format!("top_{{k}}_configs_{trace}.txt");
                let heading = format!(" for {}", ranking.trace);
                let trace_output = top_k(study, &ranking.ranked, &file_name, &heading)?;

                output.summaries.extend(trace_output.summaries);
                output.written.extend(trace_output.written);
                output.plots.push(Plot::trajectories(
                    format!("Ranked Configurations on Trace {}", ranking.trace),
                    &ranking.ranked,
                    parameters,
                ));
            }
            Ok(output)
        }
    }
}

fn sweep(study: &Study, ranker: &ConfigRanker<'_>) -> Result<AnalysisOutput> {
    let mut swept = Vec::with_capacity(study.sweeps.len());
    for sweep in &study.sweeps {
        let param_index = study.parameter_index(&sweep.parameter)?;
        let means = ranker.aggregate_by_parameter(param_index, &sweep.values())?;
        swept.push((sweep.parameter.as_str(), means));
    }

    let title = format!(
        "Varying {}",
        swept.iter().map(|(name, _)| *name).collect::<String>()
    );
    let summaries = swept
        .iter()
        .map(|(name, means)| {
            let mut lines = vec![format!("Mean AMAT by {name}")];
            lines.extend(means.iter().map(|mean| {
                format!(
                    "{name}={}: {} ({} runs)",
                    mean.value, mean.mean_access_time, mean.runs
                )
            }));
            lines.join("\n")
        })
        .collect();

    let plot = Plot::sweep(
        title,
        swept.iter().map(|(name, means)| (*name, means.as_slice())),
    );

    Ok(AnalysisOutput {
        summaries,
        written: Vec::new(),
        plots: vec![plot],
    })
}

/// Writes the top `study.output.top` entries of `ranked` to `file_pattern`, where `{k}`
/// stands for the number of entries asked for.
fn top_k(
    study: &Study,
    ranked: &RankedResult,
    file_pattern: &str,
    heading_suffix: &str,
) -> Result<AnalysisOutput> {
    let k = study.output.top;
    let directory = &study.output.directory;
    create_output_directory(directory)?;

    let top = ranked.top_k(k);
    let path = directory.join(file_pattern.replace("{k}", &k.to_string()));
    write_configs(&path, top.iter().map(|entry| &entry.configuration))?;

    Ok(AnalysisOutput {
        summaries: vec![format_top(&format!("Top {k} Configurations{heading_suffix}"), top)],
        written: vec![path],
        plots: Vec::new(),
    })
}

/// `name`, or `name_2`, `name_3`, ... if it was handed out before.
fn unique(taken: &mut HashSet<String>, name: String) -> String {
    let mut candidate = name.clone();
    let mut suffix = 1;
    while !taken.insert(candidate.clone()) {
        suffix += 1;
        candidate = format!("{name}_{suffix}");
    }
    candidate
}

fn create_output_directory(directory: &Path) -> Result<()> {
    std::fs::create_dir_all(directory).map_err(|source| RankError::Io {
        path: directory.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    fn study(directory: &Path) -> Study {
        let mut study = Study::from_toml(
            r#"
            [dataset]
            root = "unused"
            traces = ["a", "b"]
            runs = 3
            parameters = ["C", "B"]

            [output]
            top = 2

            [[sweep]]
            parameter = "C"
            start = 9
            end = 11
            "#,
        )
        .unwrap();
        study.output.directory = directory.to_path_buf();
        study
    }

    fn dataset() -> Dataset {
        Dataset::from_rows(
            vec!["a".into(), "b".into()],
            vec![vec![5.0, 1.0, 3.0], vec![7.0, 3.0, 1.0]],
            vec![vec![vec![9, 4], vec![10, 5], vec![10, 4]]; 2],
        )
        .unwrap()
    }

    #[test]
    fn mean_writes_top_configs() {
        let dir = tempfile::tempdir().unwrap();
        let output = run(&study(dir.path()), &dataset(), Analysis::Mean).unwrap();

        assert_eq!(output.written, vec![dir.path().join("top_2_configs.txt")]);
        assert_eq!(std::fs::read_to_string(&output.written[0]).unwrap(), "10 5\n10 4\n");
        assert!(output.summaries[0].starts_with("Top 2 Configurations\nAAT: 2\nCONF: 10 5"));
        assert_eq!(output.plots[0].title, "Varying CB");
    }

    #[test]
    fn per_trace_writes_one_file_per_trace() {
        let dir = tempfile::tempdir().unwrap();
        let output = run(&study(dir.path()), &dataset(), Analysis::PerTrace).unwrap();

        assert_eq!(output.written.len(), 2);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("top_2_configs_b.txt")).unwrap(),
            "10 4\n10 5\n"
        );
        assert!(output.summaries[1].starts_with("Top 2 Configurations for b"));
        assert_eq!(output.plots.len(), 2);
    }

    #[test]
    fn entire_space_scatters_every_parameter() {
        let dir = tempfile::tempdir().unwrap();
        let output = run(&study(dir.path()), &dataset(), Analysis::EntireSpace).unwrap();

        assert!(dir.path().join("top_2_configs_entire_space.txt").exists());
        assert_eq!(output.plots.len(), 2);

        let written = output.write_plot_data(Analysis::EntireSpace, dir.path()).unwrap();
        assert_eq!(written[0], dir.path().join("entire_space_c.dat"));
    }

    #[test]
    fn colliding_plot_titles_get_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut study = study(dir.path());
        study.dataset.parameters = vec!["C+".into(), "C-".into()];
        let output = run(&study, &dataset(), Analysis::EntireSpace).unwrap();

        let written = output.write_plot_data(Analysis::EntireSpace, dir.path()).unwrap();
        assert_eq!(
            written,
            vec![dir.path().join("entire_space_c.dat"), dir.path().join("entire_space_c_2.dat")]
        );
        let first = std::fs::read_to_string(&written[0]).unwrap();
        let second = std::fs::read_to_string(&written[1]).unwrap();
        assert!(first.starts_with("# C+\n"));
        assert!(second.starts_with("# C-\n"));
    }

    #[test]
    fn trace_names_are_made_file_safe() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = Dataset::from_rows(
            vec!["x/a".into(), "x_a".into()],
            vec![vec![5.0, 1.0, 3.0], vec![7.0, 3.0, 1.0]],
            vec![vec![vec![9, 4], vec![10, 5], vec![10, 4]]; 2],
        )
        .unwrap();
        let output = run(&study(dir.path()), &dataset, Analysis::PerTrace).unwrap();

        assert_eq!(
            output.written,
            vec![
                dir.path().join("top_2_configs_x_a.txt"),
                dir.path().join("top_2_configs_x_a_2.txt"),
            ]
        );
        assert_eq!(std::fs::read_to_string(&output.written[0]).unwrap(), "10 5\n10 4\n");
        assert_eq!(std::fs::read_to_string(&output.written[1]).unwrap(), "10 4\n10 5\n");
        assert!(output.summaries[0].starts_with("Top 2 Configurations for x/a"));

        let plots = output.write_plot_data(Analysis::PerTrace, dir.path()).unwrap();
        assert_eq!(plots[1], dir.path().join("per_trace_ranked_configurations_on_trace_x_a_2.dat"));
    }

    #[test]
    fn sweep_means_per_value() {
        let dir = tempfile::tempdir().unwrap();
        let output = run(&study(dir.path()), &dataset(), Analysis::Sweep).unwrap();

        assert!(output.written.is_empty());
        let series = &output.plots[0].series[0];
        assert_eq!(series.x, vec![9.0, 10.0]);
        assert_eq!(series.y, vec![6.0, 2.0]);
    }

    #[test]
    fn parameter_count_must_match() {
        let dir = tempfile::tempdir().unwrap();
        let dataset =
            Dataset::from_rows(vec!["a".into()], vec![vec![1.0]], vec![vec![vec![1]]]).unwrap();
        assert!(matches!(
            run(&study(dir.path()), &dataset, Analysis::Mean),
            Err(RankError::Shape(_))
        ));
    }
}
