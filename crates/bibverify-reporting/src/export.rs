use std::path::{Path, PathBuf};

use bibverify_core::VerificationResult;
use chrono::NaiveDateTime;
use thiserror::Error;

use crate::text::render_text_report;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub(crate) fn write_file(path: &Path, contents: &str) -> Result<(), ReportError> {
    std::fs::write(path, contents).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Pretty-printed JSON array of results, in input order.
pub fn export_json(results: &[VerificationResult]) -> Result<String, ReportError> {
    Ok(serde_json::to_string_pretty(results)?)
}

/// Sibling of the text report with a `.json` extension.
pub fn json_path_for(report: &Path) -> PathBuf {
    report.with_extension("json")
}

/// Where the report files ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub text: PathBuf,
    pub json: Option<PathBuf>,
}

/// Write the text report to `output` and, when `with_json` is set, the JSON
/// dump next to it.
pub fn write_report_files(
    results: &[VerificationResult],
    output: &Path,
    with_json: bool,
    generated_at: NaiveDateTime,
) -> Result<ReportPaths, ReportError> {
    write_file(output, &render_text_report(results, generated_at))?;

    let json = if with_json {
        let path = json_path_for(output);
        write_file(&path, &export_json(results)?)?;
        Some(path)
    } else {
        None
    };

    Ok(ReportPaths {
        text: output.to_path_buf(),
        json,
    })
}
