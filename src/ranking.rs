use tracing::info;

use crate::dataset::Dataset;
use crate::error::{RankError, Result};

/// One tuple of parameter settings, e.g. `C B S P T M` as log2 sizes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Configuration(Vec<u32>);

impl Configuration {
    pub fn new(values: Vec<u32>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[u32] {
        &self.0
    }

    pub fn get(&self, param_index: usize) -> Option<u32> {
        self.0.get(param_index).copied()
    }
}

impl From<&[u32]> for Configuration {
    fn from(values: &[u32]) -> Self {
        Self(values.to_vec())
    }
}

impl std::fmt::Display for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut values = self.0.iter();
        if let Some(first) = values.next() {
            write!(f, "{first}")?;
        }
        for value in values {
            write!(f, " {value}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    /// Index of the run in the input files.
    pub run: usize,
    pub configuration: Configuration,
    pub access_time: f64,
}

/// Configurations sorted by ascending access time, ties kept in run order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RankedResult {
    entries: Vec<RankedEntry>,
}

impl RankedResult {
    pub fn entries(&self) -> &[RankedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn best(&self) -> Option<&RankedEntry> {
        self.entries.first()
    }

    /// The first `k` entries, or all of them if there are fewer.
    pub fn top_k(&self, k: usize) -> &[RankedEntry] {
        &self.entries[..k.min(self.entries.len())]
    }

    pub fn configurations(&self) -> impl Iterator<Item = &Configuration> {
        self.entries.iter().map(|entry| &entry.configuration)
    }

    pub fn access_times(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|entry| entry.access_time)
    }
}

impl<'a> IntoIterator for &'a RankedResult {
    type Item = &'a RankedEntry;
    type IntoIter = std::slice::Iter<'a, RankedEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraceRanking<'a> {
    pub trace: &'a str,
    pub ranked: RankedResult,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterMean {
    pub value: u32,
    pub mean_access_time: f64,
    pub runs: usize,
}

/// Ranks the configurations of a [`Dataset`] by average memory access time.
#[derive(Debug, Clone, Copy)]
pub struct ConfigRanker<'a> {
    dataset: &'a Dataset,
}

impl<'a> ConfigRanker<'a> {
    pub fn new(dataset: &'a Dataset) -> Self {
        Self { dataset }
    }

    /// Mean access time of every run across all traces.
    pub fn mean_access_times(&self) -> Vec<f64> {
        let traces = self.dataset.num_traces();
        let mut sums = vec![0.0; self.dataset.num_runs()];
        for trace in 0..traces {
            for (sum, time) in sums.iter_mut().zip(self.dataset.access_times(trace)) {
                *sum += time;
            }
        }

        sums.into_iter().map(|sum| sum / traces as f64).collect()
    }

    /// Ranks runs by their mean access time across traces. Configurations are taken
    /// from the first trace.
    pub fn rank_mean(&self) -> RankedResult {
        let means = self.mean_access_times();
        let ranked = rank(&means, |run| self.dataset.configuration(0, run));
        if let Some(best) = ranked.best() {
            info!(
                runs = ranked.len(),
                best_run = best.run,
                best_access_time = best.access_time,
                "ranked configurations by mean access time"
            );
        }
        ranked
    }

    /// Ranks each trace's runs by that trace's own access times, in trace order.
    pub fn rank_per_trace(&self) -> Vec<TraceRanking<'a>> {
        let dataset = self.dataset;
        dataset
            .traces()
            .iter()
            .enumerate()
            .map(|(trace, name)| {
                let ranked = rank(dataset.access_times(trace), |run| {
                    dataset.configuration(trace, run)
                });
                info!(trace = %name, runs = ranked.len(), "ranked configurations");
                TraceRanking {
                    trace: name.as_str(),
                    ranked,
                }
            })
            .collect()
    }

    /// Mean access time over every run of every trace whose parameter `param_index`
    /// equals each of `values`, returned in the order of `values`.
    pub fn aggregate_by_parameter(
        &self,
        param_index: usize,
        values: &[u32],
    ) -> Result<Vec<ParameterMean>> {
        let num_params = self.dataset.num_params();
        if param_index >= num_params {
            return Err(RankError::ParameterIndex {
                param_index,
                num_params,
            });
        }

        let mut buckets = vec![(0.0, 0usize); values.len()];
        for (time, config) in self.dataset.runs() {
            let value = config[param_index];
            for (bucket, _) in buckets
                .iter_mut()
                .zip(values)
                .filter(|(_, wanted)| **wanted == value)
            {
                bucket.0 += time;
                bucket.1 += 1;
            }
        }

        values
            .iter()
            .zip(buckets)
            .map(|(&value, (sum, runs))| {
                if runs == 0 {
                    return Err(RankError::EmptyBucket { param_index, value });
                }
                Ok(ParameterMean {
                    value,
                    mean_access_time: sum / runs as f64,
                    runs,
                })
            })
            .collect()
    }
}

fn rank<'d>(access_times: &[f64], configuration: impl Fn(usize) -> &'d [u32]) -> RankedResult {
    let mut order: Vec<usize> = (0..access_times.len()).collect();
    // stable: equal times keep ascending run order
    order.sort_by(|&a, &b| sort_key(access_times[a]).total_cmp(&sort_key(access_times[b])));

    RankedResult {
        entries: order
            .into_iter()
            .map(|run| RankedEntry {
                run,
                configuration: Configuration::from(configuration(run)),
                access_time: access_times[run],
            })
            .collect(),
    }
}

/// `-0.0` and `0.0` compare equal, so they tie and fall back to run order.
fn sort_key(access_time: f64) -> f64 {
    if access_time == 0.0 { 0.0 } else { access_time }
}
