pub mod analysis;
pub mod config;
pub mod dataset;
pub mod error;
pub mod parse;
pub mod plot;
pub mod ranking;
pub mod report;

pub use dataset::{Dataset, TraceSource};
pub use error::{RankError, Result};
pub use ranking::{ConfigRanker, Configuration, RankedResult};

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
use wasm_bindgen::prelude::*;

/// Ranks in-memory measurement and configuration files by mean access time and
/// returns the top `k` summary, or the error message.
#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
#[wasm_bindgen]
pub fn rank_traces(
    access_times: Vec<String>,
    configs: Vec<String>,
    num_params: usize,
    k: usize,
) -> String {
    use dataset::DatasetBuilder;

    if access_times.len() != configs.len() {
        return format!(
            "{} measurement files but {} configuration files",
            access_times.len(),
            configs.len()
        );
    }

    // every trace has the same number of runs as the first one
    let num_runs = access_times.first().map_or(0, |text| text.lines().count());
    let mut builder = DatasetBuilder::new(access_times.len(), num_runs, num_params);
    for (i, (times, configs)) in access_times.iter().zip(&configs).enumerate() {
        let name = format!("trace {i}");
        let pushed = builder.push_trace(
            &name,
            (&format!("{name} access times"), times),
            (&format!("{name} configurations"), configs),
        );
        if let Err(e) = pushed {
            return e.to_string();
        }
    }

    match builder.finish() {
        Ok(dataset) => {
            let ranked = ConfigRanker::new(&dataset).rank_mean();
            report::format_top(&format!("Top {k} Configurations"), ranked.top_k(k))
        }
        Err(e) => e.to_string(),
    }
}
