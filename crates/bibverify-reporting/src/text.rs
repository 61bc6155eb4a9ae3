//! Plain-text verification report.

use bibverify_core::identifiers::truncate_chars;
use bibverify_core::{CheckStats, Source, Status, VerificationResult};
use chrono::NaiveDateTime;

use crate::TIMESTAMP_FORMAT;

const RULE_WIDTH: usize = 80;

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Render the full report: summary, per-reference details, then the list of
/// references that failed verification.
pub fn render_text_report(results: &[VerificationResult], generated_at: NaiveDateTime) -> String {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);
    let stats = CheckStats::from_results(results);
    let mut lines = vec![
        heavy.clone(),
        "BIBLIOGRAPHY VERIFICATION REPORT".to_string(),
        format!("Generated: {}", generated_at.format(TIMESTAMP_FORMAT)),
        heavy.clone(),
        String::new(),
        "SUMMARY".to_string(),
        light.clone(),
        format!("Total references: {}", stats.total),
        format!(
            "Valid: {} ({:.1}%)",
            stats.valid,
            percent(stats.valid, stats.total)
        ),
        format!(
            "Invalid: {} ({:.1}%)",
            stats.invalid,
            percent(stats.invalid, stats.total)
        ),
        format!(
            "No identifier: {} ({:.1}%)",
            stats.no_identifier,
            percent(stats.no_identifier, stats.total)
        ),
        String::new(),
        "DETAILED RESULTS".to_string(),
        light,
    ];

    for (idx, result) in results.iter().enumerate() {
        push_details(&mut lines, idx + 1, result);
    }

    let invalid: Vec<&VerificationResult> = results
        .iter()
        .filter(|r| r.status() == Status::Invalid)
        .collect();
    if !invalid.is_empty() {
        lines.push(format!("\n{heavy}"));
        lines.push("POTENTIALLY FAKE REFERENCES".to_string());
        lines.push(heavy);
        for result in invalid {
            let reference = result.reference();
            lines.push(format!("\n⚠ {}", reference.key));
            if let Some(title) = &reference.title {
                lines.push(format!("  Title: {title}"));
            }
            if let Some(doi) = &reference.doi {
                lines.push(format!("  DOI: {doi}"));
                if let Some(o) = result.outcome(Source::Crossref) {
                    lines.push(format!("  Issue: {}", o.message));
                }
                if let Some(o) = result.outcome(Source::DoiResolve) {
                    lines.push(format!("  Resolve: {}", o.message));
                }
            }
            if let Some(arxiv) = &reference.arxiv_id {
                lines.push(format!("  arXiv: {arxiv}"));
                if let Some(o) = result.outcome(Source::Arxiv) {
                    lines.push(format!("  Issue: {}", o.message));
                }
            }
        }
    }

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

fn push_details(lines: &mut Vec<String>, index: usize, result: &VerificationResult) {
    let reference = result.reference();
    lines.push(format!("\n[{index}] {}", reference.key));
    lines.push(format!(
        "    Type: {}",
        if reference.entry_type.is_empty() {
            "N/A"
        } else {
            reference.entry_type.as_str()
        }
    ));
    lines.push(format!("    Status: {}", result.status()));

    for (label, value) in [
        ("Title", &reference.title),
        ("Year", &reference.year),
        ("Journal", &reference.journal),
    ] {
        if let Some(value) = value {
            lines.push(format!("    {label}: {value}"));
        }
    }

    if let Some(doi) = &reference.doi {
        lines.push(format!("    DOI: {doi}"));
        if let Some(o) = result.outcome(Source::Crossref) {
            lines.push(format!("        → {}", o.message));
        }
        if let Some(o) = result.outcome(Source::DoiResolve) {
            lines.push(format!(
                "        → Resolve: {} (HTTP {})",
                o.message, o.status_code
            ));
        }
        if let Some(snapshot) = result.crossref() {
            if !snapshot.title.is_empty() {
                lines.push(format!(
                    "        → Crossref title: {}",
                    truncate_chars(&snapshot.title, 80)
                ));
            }
            if !snapshot.journal.is_empty() {
                lines.push(format!(
                    "        → Crossref journal: {}",
                    truncate_chars(&snapshot.journal, 80)
                ));
            }
            if !snapshot.year.is_empty() {
                lines.push(format!("        → Crossref year: {}", snapshot.year));
            }
        }
    }

    if let Some(arxiv) = &reference.arxiv_id {
        lines.push(format!("    arXiv: {arxiv}"));
        if let Some(o) = result.outcome(Source::Arxiv) {
            lines.push(format!("        → {}", o.message));
        }
    }

    if let Some(text) = result.abstract_text() {
        lines.push(format!("    Abstract: {}", truncate_chars(text, 160)));
    }
}
