//! Alternative discovery for references that failed verification.
//!
//! Each INVALID reference gets one Crossref bibliographic search built from
//! whatever descriptive metadata it still has; the ranked hits are kept as
//! candidates and can be rendered as BibTeX entries.

use serde::Serialize;

use crate::checker::Verifier;
use crate::identifiers::truncate_chars;
use crate::observer::Observer;
use crate::resolve::crossref::CrossrefWork;
use crate::result::VerificationResult;
use crate::{Reference, Status};

const QUERY_TITLE_CHARS: usize = 100;
const QUERY_JOURNAL_CHARS: usize = 50;

/// Title, journal and year joined by single spaces. `None` when the
/// reference has none of them.
pub fn build_query(reference: &Reference) -> Option<String> {
    let parts: Vec<String> = [
        reference
            .title
            .as_deref()
            .map(|t| truncate_chars(t.trim(), QUERY_TITLE_CHARS)),
        reference
            .journal
            .as_deref()
            .map(|j| truncate_chars(j.trim(), QUERY_JOURNAL_CHARS)),
        reference.year.as_deref().map(|y| y.trim().to_string()),
    ]
    .into_iter()
    .flatten()
    .filter(|part| !part.is_empty())
    .collect();

    (!parts.is_empty()).then(|| parts.join(" "))
}

/// Crossref type tag to BibTeX entry type.
pub fn map_entry_type(work_type: Option<&str>) -> &str {
    match work_type {
        None | Some("") | Some("journal-article") => "article",
        Some("proceedings-article") | Some("conference-paper") => "inproceedings",
        Some(other) => other,
    }
}

/// `<firstAuthorFamily><year><firstTitleWord>` for works with no key to
/// derive from.
pub fn derived_cite_key(work: &CrossrefWork) -> String {
    let author = work
        .authors
        .first()
        .and_then(|a| a.family.as_deref())
        .unwrap_or("Unknown");
    let year = work.year.as_deref().unwrap_or("YEAR");
    let word = work
        .title
        .as_deref()
        .and_then(|t| t.split_whitespace().next())
        .unwrap_or("Title");
    format!("{author}{year}{word}")
}

/// Render a Crossref work as a BibTeX entry under `cite_key`. Fields are
/// emitted only when Crossref supplied them.
pub fn work_to_bibtex(work: &CrossrefWork, cite_key: &str) -> String {
    let authors = work
        .authors
        .iter()
        .filter_map(|a| a.display_name())
        .collect::<Vec<_>>()
        .join(" and ");

    let fields: [(&str, Option<&str>); 9] = [
        ("title", work.title.as_deref()),
        ("author", Some(authors.as_str()).filter(|a| !a.is_empty())),
        ("journal", work.container_title.as_deref()),
        ("year", work.year.as_deref()),
        ("volume", work.volume.as_deref()),
        ("number", work.issue.as_deref()),
        ("pages", work.page.as_deref()),
        ("doi", work.doi.as_deref()),
        ("url", work.url.as_deref()),
    ];

    let mut lines = vec![format!(
        "@{}{{{},",
        map_entry_type(work.work_type.as_deref()),
        cite_key
    )];
    for (name, value) in fields {
        if let Some(value) = value {
            lines.push(format!("  {name} = {{{value}}},"));
        }
    }
    lines.push("}".to_string());
    lines.join("\n")
}

/// One ranked search hit proposed in place of an invalid reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub source_key: String,
    /// 1-based position in the search results.
    pub rank: usize,
    pub work: CrossrefWork,
}

impl Candidate {
    pub fn cite_key(&self) -> String {
        if self.source_key.is_empty() {
            format!("{}_alt{}", derived_cite_key(&self.work), self.rank)
        } else {
            format!("{}_alt{}", self.source_key, self.rank)
        }
    }

    pub fn to_bibtex(&self) -> String {
        work_to_bibtex(&self.work, &self.cite_key())
    }
}

/// Candidates found for one invalid reference, with the query that found them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlternativeSet {
    pub original: Reference,
    pub query: String,
    pub candidates: Vec<Candidate>,
}

impl Verifier {
    /// Search Crossref for replacements of every INVALID result.
    ///
    /// Returns one set per search issued; references with nothing to search
    /// on are skipped. A failed search yields a set without candidates.
    pub async fn discover_alternatives(
        &self,
        results: &[VerificationResult],
        observer: &dyn Observer,
    ) -> Vec<AlternativeSet> {
        let invalid: Vec<&VerificationResult> = results
            .iter()
            .filter(|r| r.status() == Status::Invalid)
            .collect();
        if invalid.is_empty() {
            observer.on_log("No invalid references found, skipping alternative search");
            return Vec::new();
        }
        observer.on_log(&format!(
            "Searching for alternatives to {} invalid references...",
            invalid.len()
        ));

        let rows = self.config.alternative_rows;
        let mut sets = Vec::new();
        for result in invalid {
            let original = result.reference();
            observer.on_log(&format!("  Searching alternatives for: {}", original.key));
            let Some(query) = build_query(original) else {
                observer.on_log("    No searchable metadata, skipping");
                continue;
            };

            observer.on_log(&format!(
                "    Searching Crossref for similar articles: {}",
                truncate_chars(&query, 80)
            ));
            let works = match self.crossref.search(&query, rows).await {
                Ok(works) => works,
                Err(e) => {
                    observer.on_log(&format!("    Search failed: {e}"));
                    log::warn!("alternative search for {} failed: {e}", original.key);
                    Vec::new()
                }
            };
            self.pacer.pause().await;

            if works.is_empty() {
                observer.on_log("    No alternatives found");
            }
            let candidates = works
                .into_iter()
                .enumerate()
                .map(|(i, work)| {
                    observer.on_log(&format!(
                        "    Alternative {}: {} ({})",
                        i + 1,
                        truncate_chars(work.title.as_deref().unwrap_or_default(), 60),
                        work.year.as_deref().unwrap_or_default()
                    ));
                    Candidate {
                        source_key: original.key.clone(),
                        rank: i + 1,
                        work,
                    }
                })
                .collect();

            sets.push(AlternativeSet {
                original: original.clone(),
                query,
                candidates,
            });
        }
        sets
    }
}
