//! Numeric series handed to an external plotting tool.
//!
//! Nothing here ranks or aggregates; the builders only reshape ranked results and
//! sweep means into `x y` series. Rendering is left to e.g. gnuplot, which reads the
//! data files produced by [`Plot::write_data`] with `index`.

use std::path::Path;

use crate::error::{RankError, Result};
use crate::ranking::{ParameterMean, RankedResult};

pub const SIZE_AXIS: &str = "log2(size)";
pub const AMAT_AXIS: &str = "AMAT";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PlotKind {
    Line,
    Scatter,
}

impl std::fmt::Display for PlotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlotKind::Line => f.write_str("lines"),
            PlotKind::Scatter => f.write_str("points"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Plot {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub kind: PlotKind,
    pub series: Vec<Series>,
}

impl Plot {
    /// Every parameter's value along the ranked order, against the ranked access time.
    pub fn trajectories(
        title: impl Into<String>,
        ranked: &RankedResult,
        parameters: &[String],
    ) -> Self {
        Self {
            title: title.into(),
            x_label: AMAT_AXIS.to_string(),
            y_label: SIZE_AXIS.to_string(),
            kind: PlotKind::Line,
            series: parameters
                .iter()
                .enumerate()
                .map(|(param_index, label)| trajectory(label, param_index, ranked))
                .collect(),
        }
    }

    /// One scatter plot per parameter, titled by the parameter name.
    pub fn scatter_per_parameter(ranked: &RankedResult, parameters: &[String]) -> Vec<Self> {
        parameters
            .iter()
            .enumerate()
            .map(|(param_index, label)| Self {
                title: label.clone(),
                x_label: AMAT_AXIS.to_string(),
                y_label: SIZE_AXIS.to_string(),
                kind: PlotKind::Scatter,
                series: vec![trajectory(label, param_index, ranked)],
            })
            .collect()
    }

    /// Mean access time per swept parameter value, one series per swept parameter.
    pub fn sweep<'a>(
        title: impl Into<String>,
        sweeps: impl IntoIterator<Item = (&'a str, &'a [ParameterMean])>,
    ) -> Self {
        Self {
            title: title.into(),
            x_label: SIZE_AXIS.to_string(),
            y_label: AMAT_AXIS.to_string(),
            kind: PlotKind::Line,
            series: sweeps
                .into_iter()
                .map(|(label, means)| Series {
                    label: label.to_string(),
                    x: means.iter().map(|m| f64::from(m.value)).collect(),
                    y: means.iter().map(|m| m.mean_access_time).collect(),
                })
                .collect(),
        }
    }

    /// File name friendly, lowercased version of the title. Distinct titles can share
    /// a stem.
    pub fn file_stem(&self) -> String {
        file_safe(&self.title, "plot").to_ascii_lowercase()
    }

    pub fn format_data(&self) -> String {
        let mut result = vec![
            format!("# {}", self.title),
            format!("# x: {}, y: {}, style: {}", self.x_label, self.y_label, self.kind),
        ];

        let blocks: Vec<String> = self
            .series
            .iter()
            .map(|series| {
                let mut block = vec![format!("# {}", series.label)];
                block.extend(series.x.iter().zip(&series.y).map(|(x, y)| format!("{x} {y}")));
                block.join("\n")
            })
            .collect();
        result.push(blocks.join("\n\n\n"));

        let mut data = result.join("\n");
        data.push('\n');
        data
    }

    pub fn write_data(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.format_data()).map_err(|source| RankError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Keeps ASCII alphanumerics and turns every other run of characters into one `_`,
/// so the result is a single path component.
pub fn file_safe(name: &str, fallback: &str) -> String {
    let mut safe = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            safe.push(c);
        } else if !safe.ends_with('_') {
            safe.push('_');
        }
    }

    let safe = safe.trim_matches('_');
    if safe.is_empty() {
        fallback.to_string()
    } else {
        safe.to_string()
    }
}

fn trajectory(label: &str, param_index: usize, ranked: &RankedResult) -> Series {
    Series {
        label: label.to_string(),
        x: ranked.access_times().collect(),
        y: ranked
            .configurations()
            .map(|config| config.get(param_index).map_or(f64::NAN, f64::from))
            .collect(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dataset::Dataset;
    use crate::ranking::ConfigRanker;

    fn ranked() -> RankedResult {
        let dataset = Dataset::from_rows(
            vec!["gcc".into()],
            vec![vec![3.0, 1.0]],
            vec![vec![vec![12, 6], vec![13, 5]]],
        )
        .unwrap();
        ConfigRanker::new(&dataset).rank_mean()
    }

    #[test]
    fn trajectories_follow_ranked_order() {
        let parameters = ["C".to_string(), "B".to_string()];
        let plot = Plot::trajectories("Varying CB", &ranked(), &parameters);
        assert_eq!(plot.series.len(), 2);
        assert_eq!(plot.series[0].x, vec![1.0, 3.0]);
        assert_eq!(plot.series[0].y, vec![13.0, 12.0]);
        assert_eq!(plot.series[1].y, vec![5.0, 6.0]);
    }

    #[test]
    fn scatter_plots_per_parameter() {
        let plots = Plot::scatter_per_parameter(&ranked(), &["C".to_string(), "B".to_string()]);
        assert_eq!(plots.len(), 2);
        assert_eq!(plots[1].title, "B");
        assert_eq!(plots[1].kind, PlotKind::Scatter);
    }

    #[test]
    fn data_file_layout() {
        let means = [
            ParameterMean { value: 9, mean_access_time: 4.0, runs: 2 },
            ParameterMean { value: 10, mean_access_time: 3.5, runs: 2 },
        ];
        let plot = Plot::sweep("Varying C", [("C", &means[..]), ("B", &means[..1])]);

        assert_eq!(
            plot.format_data(),
            "# Varying C\n# x: log2(size), y: AMAT, style: lines\n# C\n9 4\n10 3.5\n\n\n# B\n9 4\n"
        );
        assert_eq!(plot.file_stem(), "varying_c");
    }

    #[test]
    fn file_safe_names() {
        assert_eq!(file_safe("x/a", "trace"), "x_a");
        assert_eq!(file_safe("../gcc", "trace"), "gcc");
        assert_eq!(file_safe("C+", "plot"), "C");
        assert_eq!(file_safe("//", "trace"), "trace");
    }
}
