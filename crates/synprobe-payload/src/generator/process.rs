//! Shared plumbing for out-of-process generator backends.

use crate::error::{PayloadError, PayloadResult};
use std::ffi::OsString;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use synprobe_types::{ArrayKey, CoveringArray};
use tokio::process::Command;
use tracing::debug;

pub(crate) struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Run `program` to completion, capturing both output streams.
pub(crate) async fn run(
    program: &Path,
    args: Vec<OsString>,
    key: &ArrayKey,
) -> PayloadResult<ProcessOutput> {
    debug!(program = %program.display(), ?args, key = %key, "invoking generator");
    let output = Command::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| {
            PayloadError::generation(key, format!("failed to run {}: {}", program.display(), e))
        })?;

    Ok(ProcessOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Translate a generator's native output into canonical rows.
///
/// Comment lines (`#`) are dropped, as is a leading header line (the first
/// remaining line if it is not numeric). `separator` is replaced by commas
/// and surrounding whitespace, including CR line endings, is trimmed. Every
/// other non-empty line must be a row of `key.columns()` values within the
/// key's cardinalities, and at least one row must exist.
pub(crate) fn parse_generator_output(
    text: &str,
    separator: char,
    key: &ArrayKey,
) -> PayloadResult<CoveringArray> {
    let mut lines = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.replace(separator, ","))
        .peekable();

    if let Some(first) = lines.peek() {
        if CoveringArray::parse_row(first, 0).is_err() {
            debug!(header = %first, "dropping generator header line");
            lines.next();
        }
    }

    let rows = lines
        .enumerate()
        .map(|(index, line)| CoveringArray::parse_row(&line, index))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| PayloadError::generation(key, format!("unparseable output: {}", e)))?;

    let array = CoveringArray::new(key.columns(), rows)
        .map_err(|e| PayloadError::generation(key, e.to_string()))?;
    if array.is_empty() {
        return Err(PayloadError::generation(key, "generator produced no rows"));
    }
    if !array.fits(key.cardinalities()) {
        return Err(PayloadError::generation(
            key,
            "generator produced values outside the cardinalities",
        ));
    }
    Ok(array)
}

/// First run of ASCII digits in `text`.
pub(crate) fn first_integer(text: &str) -> Option<usize> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// Comma-joined `0..n` value list.
pub(crate) fn value_list(cardinality: usize, separator: &str) -> String {
    (0..cardinality)
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}
