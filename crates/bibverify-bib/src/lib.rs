//! Lightweight BibTeX reader.
//!
//! This is a field scraper rather than a full BibTeX grammar: each entry is
//! located with a regex, and a handful of brace-delimited fields are pulled
//! out of its body. Anything it cannot read is simply left unset.

use std::path::Path;

use bibverify_core::Reference;
use bibverify_core::identifiers::truncate_chars;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

const TITLE_MAX_CHARS: usize = 100;
const JOURNAL_MAX_CHARS: usize = 80;
const RAW_MAX_CHARS: usize = 200;

/// Resolver prefixes removed from DOI fields at ingestion.
const DOI_URL_PREFIXES: &[&str] = &["https://doi.org/", "http://dx.doi.org/"];

static ENTRY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@(\w+)\{([^@]+)").unwrap());
static KEY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([^,]+),").unwrap());
static ARXIV_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)arXiv[:\s]+(\d+\.\d+)").unwrap());

static DOI_RE: Lazy<Regex> = Lazy::new(|| field_regex("doi"));
static URL_RE: Lazy<Regex> = Lazy::new(|| field_regex("url"));
static TITLE_RE: Lazy<Regex> = Lazy::new(|| field_regex("title"));
static YEAR_RE: Lazy<Regex> = Lazy::new(|| field_regex("year"));
static JOURNAL_RE: Lazy<Regex> = Lazy::new(|| field_regex("journal"));

/// `name = {value}`, case-insensitive. The word boundary keeps `booktitle`
/// from matching `title`.
fn field_regex(name: &str) -> Regex {
    Regex::new(&format!(r"(?i)\b{name}\s*=\s*\{{([^}}]+)\}}")).unwrap()
}

#[derive(Error, Debug)]
pub enum BibError {
    #[error("cannot read bibliography: {0}")]
    Io(#[from] std::io::Error),
}

/// Read and parse a `.bib` file.
pub fn parse_bib_file(path: impl AsRef<Path>) -> Result<Vec<Reference>, BibError> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let references = parse_bib(&content);
    log::debug!(
        "parsed {} entries from {}",
        references.len(),
        path.as_ref().display()
    );
    Ok(references)
}

/// Parse every `@type{...}` entry in `content`, in file order.
pub fn parse_bib(content: &str) -> Vec<Reference> {
    ENTRY_RE
        .captures_iter(content)
        .map(|caps| parse_entry(&caps[1], &caps[2]))
        .collect()
}

fn parse_entry(entry_type: &str, body: &str) -> Reference {
    let key = KEY_RE
        .captures(body)
        .map(|c| c[1].trim().to_string())
        .filter(|k| !k.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());

    let doi = field(&DOI_RE, body).map(|doi| {
        DOI_URL_PREFIXES
            .iter()
            .fold(doi, |d, prefix| d.replace(*prefix, ""))
    });

    Reference {
        entry_type: entry_type.to_string(),
        key,
        doi,
        url: field(&URL_RE, body),
        arxiv_id: ARXIV_RE.captures(body).map(|c| c[1].to_string()),
        title: field(&TITLE_RE, body).map(|t| truncate_chars(&t, TITLE_MAX_CHARS)),
        year: field(&YEAR_RE, body),
        journal: field(&JOURNAL_RE, body).map(|j| truncate_chars(&j, JOURNAL_MAX_CHARS)),
        raw: truncate_chars(body, RAW_MAX_CHARS),
    }
}

/// First match of a field, trimmed of whitespace and of the stray opening
/// brace a double-braced value (`{{Title}}`) leaves behind.
fn field(re: &Regex, body: &str) -> Option<String> {
    let caps = re.captures(body)?;
    let value = caps[1].trim().trim_start_matches('{').trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const SAMPLE: &str = r#"
@article{smith2020,
  title = {Deep Learning for Everything},
  author = {Smith, John and Doe, Jane},
  journal = {Journal of Machine Learning},
  year = {2020},
  doi = {https://doi.org/10.1234/jml.2020.001}
}

@inproceedings{lee2021,
  booktitle = {Proceedings of Something},
  title = {{Attention Variants}},
  year = {2021},
  note = {arXiv: 2101.01234}
}

@misc{nokey
}
"#;

    #[test]
    fn parses_entries_in_order() {
        let refs = parse_bib(SAMPLE);
        assert_eq!(refs.len(), 3);
        assert_eq!(refs[0].key, "smith2020");
        assert_eq!(refs[0].entry_type, "article");
        assert_eq!(refs[1].key, "lee2021");
        assert_eq!(refs[1].entry_type, "inproceedings");
    }

    #[test]
    fn extracts_fields() {
        let refs = parse_bib(SAMPLE);
        let smith = &refs[0];
        assert_eq!(smith.title.as_deref(), Some("Deep Learning for Everything"));
        assert_eq!(smith.journal.as_deref(), Some("Journal of Machine Learning"));
        assert_eq!(smith.year.as_deref(), Some("2020"));
        assert_eq!(smith.doi.as_deref(), Some("10.1234/jml.2020.001"));
        assert_eq!(smith.arxiv_id, None);
        assert!(smith.raw.starts_with("smith2020,"));
    }

    #[test]
    fn booktitle_is_not_title() {
        let lee = &parse_bib(SAMPLE)[1];
        assert_eq!(lee.title.as_deref(), Some("Attention Variants"));
        assert_eq!(lee.journal, None);
        assert_eq!(lee.arxiv_id.as_deref(), Some("2101.01234"));
    }

    #[test]
    fn entry_without_key_is_unknown() {
        let misc = &parse_bib(SAMPLE)[2];
        assert_eq!(misc.key, "Unknown");
        assert_eq!(misc.doi, None);
        assert_eq!(misc.title, None);
    }

    #[test]
    fn long_fields_are_truncated() {
        let content = format!(
            "@article{{k,\n title = {{{}}},\n journal = {{{}}}\n}}",
            "t".repeat(150),
            "j".repeat(120)
        );
        let r = &parse_bib(&content)[0];
        assert_eq!(r.title.as_deref().map(str::len), Some(100));
        assert_eq!(r.journal.as_deref().map(str::len), Some(80));
        assert!(r.raw.chars().count() <= 200);
    }

    #[test]
    fn field_names_are_case_insensitive() {
        let r = &parse_bib("@Article{K1, TITLE = {Upper}, DOI = {10.5/ABC}}")[0];
        assert_eq!(r.entry_type, "Article");
        assert_eq!(r.title.as_deref(), Some("Upper"));
        assert_eq!(r.doi.as_deref(), Some("10.5/ABC"));
    }

    #[test]
    fn empty_input_has_no_entries() {
        assert!(parse_bib("").is_empty());
        assert!(parse_bib("% just a comment\n").is_empty());
    }

    #[test]
    fn reads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let refs = parse_bib_file(file.path()).unwrap();
        assert_eq!(refs.len(), 3);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = parse_bib_file("/definitely/not/here.bib").unwrap_err();
        assert!(matches!(err, BibError::Io(_)));
    }
}
