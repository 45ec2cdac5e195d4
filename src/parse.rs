use std::path::Path;

use winnow::ascii::{dec_uint, float};
use winnow::combinator::{delimited, separated};
use winnow::error::StrContext;
use winnow::token::{take_till, take_while};
use winnow::{ModalResult, Parser};

use crate::error::{RankError, Result};
use crate::ranking::Configuration;

/// Parses a measurement file: exactly `num_runs` lines holding one access time each.
///
/// Values are appended to `out`, so a caller can hand in a buffer sized for all traces.
pub fn parse_access_times_into(
    origin: &str,
    text: &str,
    num_runs: usize,
    out: &mut Vec<f64>,
) -> Result<()> {
    let mut lines = 0;
    for (idx, line) in text.lines().enumerate() {
        lines += 1;
        if idx >= num_runs {
            continue;
        }

        let fields = line_fields(origin, idx + 1, line, 1)?;
        let value = access_time.parse(fields[0]).map_err(|_| RankError::Parse {
            origin: origin.to_string(),
            line: idx + 1,
            field: 1,
            text: fields[0].to_string(),
            expected: "floating-point access time",
        })?;
        out.push(value);
    }

    check_line_count(origin, num_runs, lines)
}

/// Parses a configuration file: exactly `num_runs` lines of `num_params` integers.
pub fn parse_configs_into(
    origin: &str,
    text: &str,
    num_runs: usize,
    num_params: usize,
    out: &mut Vec<u32>,
) -> Result<()> {
    let mut lines = 0;
    for (idx, line) in text.lines().enumerate() {
        lines += 1;
        if idx >= num_runs {
            continue;
        }

        parse_config_line(origin, idx + 1, line, num_params, out)?;
    }

    check_line_count(origin, num_runs, lines)
}

/// Parses every line of `text` as a configuration with `num_params` values.
pub fn parse_config_lines(
    origin: &str,
    text: &str,
    num_params: usize,
) -> Result<Vec<Configuration>> {
    text.lines()
        .enumerate()
        .map(|(idx, line)| {
            let mut values = Vec::with_capacity(num_params.min(line.len()));
            parse_config_line(origin, idx + 1, line, num_params, &mut values)?;
            Ok(Configuration::new(values))
        })
        .collect()
}

/// Reads back a configuration file, e.g. one produced by [`crate::report::write_configs`].
pub fn read_configs(path: impl AsRef<Path>, num_params: usize) -> Result<Vec<Configuration>> {
    let path = path.as_ref();
    let text = read_input(path)?;
    parse_config_lines(&path.display().to_string(), &text, num_params)
}

pub(crate) fn read_input(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => RankError::NotFound {
            path: path.to_path_buf(),
        },
        _ => RankError::Io {
            path: path.to_path_buf(),
            source,
        },
    })
}

fn parse_config_line(
    origin: &str,
    line_no: usize,
    line: &str,
    num_params: usize,
    out: &mut Vec<u32>,
) -> Result<()> {
    let fields = line_fields(origin, line_no, line, num_params)?;
    for (idx, text) in fields.into_iter().enumerate() {
        let value = parameter.parse(text).map_err(|_| RankError::Parse {
            origin: origin.to_string(),
            line: line_no,
            field: idx + 1,
            text: text.to_string(),
            expected: "non-negative integer parameter",
        })?;
        out.push(value);
    }

    Ok(())
}

fn line_fields<'a>(
    origin: &str,
    line_no: usize,
    line: &'a str,
    expected: usize,
) -> Result<Vec<&'a str>> {
    let found = fields.parse(line).map_err(|e| RankError::MalformedInput {
        origin: origin.to_string(),
        line: line_no,
        reason: format!("unable to split line into fields: {e}"),
    })?;

    if found.len() != expected {
        return Err(RankError::MalformedInput {
            origin: origin.to_string(),
            line: line_no,
            reason: format!("expected {expected} fields, found {}", found.len()),
        });
    }

    Ok(found)
}

fn check_line_count(origin: &str, num_runs: usize, lines: usize) -> Result<()> {
    if lines == num_runs {
        return Ok(());
    }

    let (line, reason) = if lines < num_runs {
        (
            lines + 1,
            format!("expected {num_runs} runs, file ends after {lines} lines"),
        )
    } else {
        (
            num_runs.saturating_add(1),
            format!("expected {num_runs} runs, found {lines} lines"),
        )
    };

    Err(RankError::MalformedInput {
        origin: origin.to_string(),
        line,
        reason,
    })
}

/// Splits on any whitespace, including a `\r` left over from a missing final `\n`.
fn fields<'a>(input: &mut &'a str) -> ModalResult<Vec<&'a str>> {
    delimited(
        take_while(0.., char::is_whitespace),
        separated(
            0..,
            take_till(1.., char::is_whitespace),
            take_while(1.., char::is_whitespace),
        ),
        take_while(0.., char::is_whitespace),
    )
    .context(StrContext::Label("whitespace separated fields"))
    .parse_next(input)
}

fn access_time(input: &mut &str) -> ModalResult<f64> {
    float
        .context(StrContext::Label("access time"))
        .parse_next(input)
}

fn parameter(input: &mut &str) -> ModalResult<u32> {
    dec_uint
        .context(StrContext::Label("parameter"))
        .parse_next(input)
}
