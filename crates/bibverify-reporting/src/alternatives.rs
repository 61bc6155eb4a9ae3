//! BibTeX file of suggested replacements for invalid references.

use std::path::Path;

use bibverify_core::AlternativeSet;
use bibverify_core::identifiers::truncate_chars;
use chrono::NaiveDateTime;

use crate::TIMESTAMP_FORMAT;
use crate::export::{ReportError, write_file};

const BANNER: &str = "% ========================================";

/// Render the alternatives bibliography. Every line outside the entries is a
/// `%` comment, so the file can be fed to BibTeX as is. Sets without
/// candidates contribute nothing.
pub fn render_alternatives_bib(sets: &[AlternativeSet], generated_at: NaiveDateTime) -> String {
    let mut lines = vec![
        "% Alternative references for potentially invalid citations".to_string(),
        format!("% Generated: {}", generated_at.format(TIMESTAMP_FORMAT)),
        "% Please review these suggestions and decide which to use".to_string(),
    ];

    for set in sets.iter().filter(|s| !s.candidates.is_empty()) {
        let original = &set.original;
        lines.push(String::new());
        lines.push(BANNER.to_string());
        lines.push(format!("% Original (INVALID): {}", original.key));
        if let Some(title) = &original.title {
            lines.push(format!("% Original title: {}", truncate_chars(title, 80)));
        }
        if let Some(doi) = &original.doi {
            lines.push(format!("% Original DOI: {doi} (NOT FOUND)"));
        }
        lines.push(format!("% Found {} similar articles:", set.candidates.len()));
        lines.push(BANNER.to_string());
        lines.push(String::new());

        for candidate in &set.candidates {
            let work = &candidate.work;
            lines.push(format!(
                "% Alternative {} for {}:",
                candidate.rank, original.key
            ));
            lines.push(format!(
                "% Title: {}",
                truncate_chars(work.title.as_deref().unwrap_or_default(), 100)
            ));
            lines.push(format!(
                "% Journal: {}",
                truncate_chars(work.container_title.as_deref().unwrap_or_default(), 80)
            ));
            lines.push(format!("% Year: {}", work.year.as_deref().unwrap_or_default()));
            lines.push(format!("% DOI: {}", work.doi.as_deref().unwrap_or_default()));
            lines.push("% Source: Crossref API search".to_string());
            lines.push(candidate.to_bibtex());
            lines.push(String::new());
        }
    }

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// Render and write the alternatives file.
pub fn write_alternatives_file(
    sets: &[AlternativeSet],
    path: &Path,
    generated_at: NaiveDateTime,
) -> Result<(), ReportError> {
    write_file(path, &render_alternatives_bib(sets, generated_at))
}
