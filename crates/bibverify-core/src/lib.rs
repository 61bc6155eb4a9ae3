use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub mod abstracts;
pub mod alternatives;
pub mod checker;
pub mod http;
pub mod identifiers;
pub mod observer;
pub mod pacing;
pub mod resolve;
pub mod result;
pub mod retry;

pub use abstracts::{
    AbstractFetcher, EnrichOptions, PageAbstractFetcher, abstract_target_url, extract_abstract,
    strip_html,
};
pub use alternatives::{AlternativeSet, Candidate, build_query, map_entry_type, work_to_bibtex};
pub use checker::Verifier;
pub use http::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport, TransportError};
pub use observer::{ChannelObserver, FnObserver, NoopObserver, Observer, ObserverEvent};
pub use pacing::{FixedUserAgent, NoPacing, Pacer, RandomPacer, RotatingUserAgents, UserAgentPool};
pub use resolve::crossref::{CrossrefAuthor, CrossrefWork};
pub use result::{CrossrefSnapshot, ResultBuilder, VerificationResult, derive_status};
pub use retry::{RetryPolicy, Retrying};

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("configuration error: {0}")]
    Config(String),
}

/// One parsed bibliography entry, as handed to the pipeline by a parser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "type")]
    pub entry_type: String,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "arxiv", skip_serializing_if = "Option::is_none")]
    pub arxiv_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,
    /// Leading slice of the raw entry text, kept for provenance only.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub raw: String,
}

/// The verification status of a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Valid,
    Invalid,
    NoIdentifier,
}

impl Status {
    pub fn label(&self) -> &'static str {
        match self {
            Status::Valid => "VALID",
            Status::Invalid => "INVALID",
            Status::NoIdentifier => "NO_IDENTIFIER",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The registry an [`Outcome`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    DoiResolve,
    Crossref,
    Arxiv,
}

impl Source {
    pub fn label(&self) -> &'static str {
        match self {
            Source::DoiResolve => "DOI resolve",
            Source::Crossref => "Crossref",
            Source::Arxiv => "arXiv",
        }
    }
}

/// Classification of a single identifier check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeKind {
    Ok,
    NotFound,
    Forbidden,
    TransportTimeout,
    TransportError,
    UpstreamError,
}

/// Result of checking one identifier against one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub source: Source,
    pub valid: bool,
    pub kind: OutcomeKind,
    pub message: String,
    /// Transport status code, or 0 when no response was obtained.
    pub status_code: u16,
}

impl Outcome {
    pub fn new(source: Source, kind: OutcomeKind, message: impl Into<String>, status_code: u16) -> Self {
        Self {
            source,
            valid: kind == OutcomeKind::Ok,
            kind,
            message: message.into(),
            status_code,
        }
    }
}

/// Summary statistics for a complete check run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckStats {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub no_identifier: usize,
}

impl CheckStats {
    pub fn from_results(results: &[VerificationResult]) -> Self {
        let mut stats = CheckStats {
            total: results.len(),
            ..Default::default()
        };
        for result in results {
            match result.status() {
                Status::Valid => stats.valid += 1,
                Status::Invalid => stats.invalid += 1,
                Status::NoIdentifier => stats.no_identifier += 1,
            }
        }
        stats
    }
}

/// Ordered results of a batch plus their summary.
#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    pub results: Vec<VerificationResult>,
    pub stats: CheckStats,
}

/// Configuration for the verifier.
#[derive(Debug, Clone)]
pub struct Config {
    pub timeout_secs: u64,
    pub delay_min_secs: f64,
    pub delay_max_secs: f64,
    pub max_retries: u32,
    /// Number of Crossref candidates requested per invalid reference.
    pub alternative_rows: usize,
    pub crossref_mailto: Option<String>,
    pub browser_timeout_ms: u64,
    pub headless: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            delay_min_secs: 1.0,
            delay_max_secs: 3.0,
            max_retries: 3,
            alternative_rows: 3,
            crossref_mailto: None,
            browser_timeout_ms: 20_000,
            headless: true,
        }
    }
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.timeout_secs == 0 {
            return Err(CoreError::Config("timeout must be positive".into()));
        }
        if !self.delay_min_secs.is_finite() || !self.delay_max_secs.is_finite() {
            return Err(CoreError::Config("delays must be finite".into()));
        }
        if self.delay_min_secs < 0.0 || self.delay_max_secs < 0.0 {
            return Err(CoreError::Config("delays must not be negative".into()));
        }
        let ceiling = pacing::MAX_DELAY.as_secs_f64();
        if self.delay_max_secs > ceiling {
            return Err(CoreError::Config(format!(
                "maximum delay {}s exceeds the {ceiling}s limit",
                self.delay_max_secs
            )));
        }
        if self.delay_min_secs > self.delay_max_secs {
            return Err(CoreError::Config(format!(
                "minimum delay {}s exceeds maximum delay {}s",
                self.delay_min_secs, self.delay_max_secs
            )));
        }
        if self.alternative_rows == 0 {
            return Err(CoreError::Config(
                "alternative rows must be at least 1".into(),
            ));
        }
        if self.browser_timeout_ms == 0 {
            return Err(CoreError::Config("browser timeout must be positive".into()));
        }
        Ok(())
    }
}

/// Check a list of references against the identifier registries.
///
/// Builds a production [`Verifier`] (shared HTTP client, retrying transport,
/// randomized pacing) and runs every reference through it in order. Progress
/// and log notifications go to `observer`. Cancelling `cancel` stops the batch
/// between references; already finished results are returned.
pub async fn check_references(
    refs: &[Reference],
    config: Config,
    observer: &dyn Observer,
    cancel: &CancellationToken,
) -> Result<CheckReport, CoreError> {
    config.validate()?;
    let verifier = Verifier::new(config)?;
    Ok(verifier.check_references(refs, observer, cancel).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn config_rejects_zero_timeout() {
        let config = Config {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));
    }

    #[test]
    fn config_rejects_inverted_delay_range() {
        let config = Config {
            delay_min_secs: 4.0,
            delay_max_secs: 2.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_rejects_unbounded_delay() {
        let config = Config {
            delay_max_secs: 1e30,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));

        let at_limit = Config {
            delay_max_secs: 3600.0,
            ..Default::default()
        };
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn outcome_validity_follows_kind() {
        let ok = Outcome::new(Source::Arxiv, OutcomeKind::Ok, "Valid arXiv ID", 200);
        let missing = Outcome::new(Source::Arxiv, OutcomeKind::NotFound, "gone", 404);
        assert!(ok.valid);
        assert!(!missing.valid);
    }

    #[test]
    fn serialized_labels_match_taxonomy() {
        assert_eq!(serde_json::to_string(&Status::NoIdentifier).unwrap(), "\"NO_IDENTIFIER\"");
        assert_eq!(serde_json::to_string(&Source::DoiResolve).unwrap(), "\"doi-resolve\"");
        assert_eq!(
            serde_json::to_string(&OutcomeKind::TransportTimeout).unwrap(),
            "\"TRANSPORT_TIMEOUT\""
        );
    }
}
