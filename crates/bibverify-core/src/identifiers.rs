//! Canonical forms for DOI and arXiv identifiers.
//!
//! An empty return value means "no identifier": callers must not issue a
//! network request for it.

const DOI_PREFIXES: &[&str] = &[
    "https://doi.org/",
    "http://doi.org/",
    "https://dx.doi.org/",
    "http://dx.doi.org/",
    "doi:",
];

const ARXIV_PREFIXES: &[&str] = &["https://arxiv.org/abs/", "http://arxiv.org/abs/", "arxiv:"];

/// Canonicalize a DOI for lookup: strip resolver prefixes, trim, lower-case.
pub fn normalize_doi(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };
    strip_prefixes(raw.trim(), DOI_PREFIXES).trim().to_lowercase()
}

/// Canonicalize an arXiv ID. Case is preserved.
pub fn normalize_arxiv(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };
    strip_prefixes(raw.trim(), ARXIV_PREFIXES).trim().to_string()
}

/// Strip any of `prefixes` (ASCII case-insensitive), repeatedly, so that
/// `doi:https://doi.org/...` also collapses.
fn strip_prefixes<'a>(mut value: &'a str, prefixes: &[&str]) -> &'a str {
    loop {
        let stripped = prefixes.iter().find_map(|prefix| {
            let head = value.get(..prefix.len())?;
            head.eq_ignore_ascii_case(prefix)
                .then(|| value[prefix.len()..].trim_start())
        });
        match stripped {
            Some(rest) => value = rest,
            None => return value,
        }
    }
}

/// Percent-encode a normalized DOI for use as a URL path. Each `/`-separated
/// segment is escaped on its own so `#`, `?` and `%` stay part of the DOI.
pub fn doi_url_path(doi: &str) -> String {
    doi.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

/// Truncate to at most `max` characters without splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
