pub mod alternatives;
pub mod export;
pub mod text;

pub use alternatives::{render_alternatives_bib, write_alternatives_file};
pub use export::{ReportError, ReportPaths, export_json, json_path_for, write_report_files};
pub use text::render_text_report;

/// Timestamp format used in every generated header.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
