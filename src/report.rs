use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::error::{RankError, Result};
use crate::ranking::{Configuration, RankedEntry};

/// Writes one configuration per line as space separated integers, replacing `path`.
pub fn write_configs<'a>(
    path: impl AsRef<Path>,
    configs: impl IntoIterator<Item = &'a Configuration>,
) -> Result<()> {
    let path = path.as_ref();
    let io_error = |source: std::io::Error| RankError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = BufWriter::new(File::create(path).map_err(io_error)?);
    let mut count = 0;
    for config in configs {
        writeln!(writer, "{config}").map_err(io_error)?;
        count += 1;
    }
    writer.flush().map_err(io_error)?;

    info!(path = %path.display(), configurations = count, "wrote configurations");
    Ok(())
}

/// Console summary of ranked entries, best first.
pub fn format_top(heading: &str, entries: &[RankedEntry]) -> String {
    let mut result = vec![heading.to_string()];
    for entry in entries {
        result.push(format!("AAT: {}", entry.access_time));
        result.push(format!("CONF: {}", entry.configuration));
    }

    result.join("\n")
}
