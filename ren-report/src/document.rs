//! Report document loading and row projection.
//!
//! The report is a JSON document whose only relevant part is
//! `project.children[]`. Each child is projected onto its `name` and
//! `origResult` fields; everything else is ignored. A missing or non-array
//! `project.children` yields no rows rather than an error.

use std::io::{ErrorKind, Read};
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::ReportError;
use crate::tally::ResultRow;

/// Read the report at `path` with a bounded read and project its rows.
///
/// # Errors
///
/// - [`ReportError::MissingFile`] if the file does not exist.
/// - [`ReportError::Io`] if it cannot be read.
/// - [`ReportError::ReportTooLarge`] if it exceeds `max_bytes`.
/// - [`ReportError::Parse`] if the content is not valid UTF-8 JSON.
pub fn load_rows(path: &Path, max_bytes: u64) -> Result<Vec<ResultRow>, ReportError> {
    let bytes = read_bounded(path, max_bytes)?;
    let document: Value = serde_json::from_slice(&bytes).map_err(|source| ReportError::Parse {
        path: path.to_owned(),
        source,
    })?;
    Ok(rows_from_document(&document))
}

/// Project `project.children[]` of an already parsed document.
#[must_use]
pub fn rows_from_document(document: &Value) -> Vec<ResultRow> {
    let Some(children) = document
        .get("project")
        .and_then(|p| p.get("children"))
        .and_then(Value::as_array)
    else {
        debug!("report has no project.children array");
        return Vec::new();
    };

    children
        .iter()
        .enumerate()
        .filter_map(|(idx, child)| {
            if !child.is_object() {
                debug!("skipping non-object child #{idx}");
                return None;
            }
            Some(ResultRow {
                name: string_field(child, "name"),
                outcome: string_field(child, "origResult"),
            })
        })
        .collect()
}

fn string_field(child: &Value, key: &str) -> Option<String> {
    child.get(key).and_then(Value::as_str).map(str::to_owned)
}

/// Read at most `max_bytes + 1` bytes so oversized reports are detected
/// without loading them whole.
fn read_bounded(path: &Path, max_bytes: u64) -> Result<Vec<u8>, ReportError> {
    let file = std::fs::File::open(path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            ReportError::MissingFile {
                path: path.to_owned(),
            }
        } else {
            ReportError::Io {
                path: path.to_owned(),
                source,
            }
        }
    })?;

    let mut buffer = Vec::new();
    file.take(max_bytes.saturating_add(1))
        .read_to_end(&mut buffer)
        .map_err(|source| ReportError::Io {
            path: path.to_owned(),
            source,
        })?;

    if buffer.len() as u64 > max_bytes {
        return Err(ReportError::ReportTooLarge {
            path: path.to_owned(),
            limit: max_bytes,
        });
    }
    Ok(buffer)
}
