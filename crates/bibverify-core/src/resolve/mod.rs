//! Identifier-resolution clients: DOI resolver, Crossref registry, arXiv.
//!
//! Every client turns whatever happens on the wire into an [`Outcome`]; no
//! check ever returns an error to the caller.

pub mod arxiv;
pub mod crossref;
pub mod doi;

use crate::http::TransportError;
use crate::identifiers::truncate_chars;
use crate::{Outcome, OutcomeKind, Source};

/// Maximum length of a fault description carried in an outcome message.
pub const DIAGNOSTIC_MAX_CHARS: usize = 50;

/// Outcome for a call that produced no response. Timeouts and connection
/// failures get distinct messages so they are never mistaken for "not found".
pub(crate) fn transport_failure(source: Source, err: &TransportError) -> Outcome {
    let label = source.label();
    let (kind, message) = match err {
        TransportError::Timeout => (OutcomeKind::TransportTimeout, format!("{label} timeout")),
        TransportError::Connect(_) => (
            OutcomeKind::TransportError,
            format!("{label} connection error"),
        ),
        TransportError::Other(detail) => (
            OutcomeKind::TransportError,
            format!("{label} error: {}", truncate_chars(detail, DIAGNOSTIC_MAX_CHARS)),
        ),
    };
    log::debug!("{label}: {err}");
    Outcome::new(source, kind, message, 0)
}

/// Outcome for an identifier that normalized to nothing.
pub(crate) fn missing_identifier(source: Source) -> Outcome {
    let what = match source {
        Source::Arxiv => "arXiv ID",
        Source::DoiResolve | Source::Crossref => "DOI",
    };
    Outcome::new(source, OutcomeKind::NotFound, format!("No {what} provided"), 0)
}
