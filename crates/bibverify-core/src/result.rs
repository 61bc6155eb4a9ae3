use serde::Serialize;

use crate::identifiers::truncate_chars;
use crate::resolve::crossref::CrossrefWork;
use crate::{Outcome, Reference, Source, Status};

/// Descriptive metadata Crossref returned for a looked-up DOI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrossrefSnapshot {
    pub doi: String,
    pub title: String,
    pub journal: String,
    pub year: String,
}

impl CrossrefSnapshot {
    pub fn from_work(work: &CrossrefWork) -> Self {
        Self {
            doi: work.doi.clone().unwrap_or_default(),
            title: truncate_chars(work.title.as_deref().unwrap_or_default(), 200),
            journal: truncate_chars(work.container_title.as_deref().unwrap_or_default(), 120),
            year: work.year.clone().unwrap_or_default(),
        }
    }
}

/// A reference together with every outcome gathered for it and the derived status.
///
/// Built once by [`ResultBuilder`]; the only later change is
/// [`with_abstract`](Self::with_abstract), which returns a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    #[serde(flatten)]
    reference: Reference,
    status: Status,
    outcomes: Vec<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    crossref: Option<CrossrefSnapshot>,
    #[serde(rename = "abstract", skip_serializing_if = "Option::is_none")]
    abstract_text: Option<String>,
}

impl VerificationResult {
    pub fn reference(&self) -> &Reference {
        &self.reference
    }

    pub fn key(&self) -> &str {
        &self.reference.key
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Outcomes in the order the checks ran.
    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn outcome(&self, source: Source) -> Option<&Outcome> {
        self.outcomes.iter().find(|o| o.source == source)
    }

    pub fn crossref(&self) -> Option<&CrossrefSnapshot> {
        self.crossref.as_ref()
    }

    pub fn abstract_text(&self) -> Option<&str> {
        self.abstract_text.as_deref()
    }

    /// Copy of this result carrying `text` as its abstract.
    pub fn with_abstract(&self, text: impl Into<String>) -> Self {
        Self {
            abstract_text: Some(text.into()),
            ..self.clone()
        }
    }
}

/// Accumulates outcomes for one reference; outcomes are append-only.
#[derive(Debug, Clone)]
pub struct ResultBuilder {
    reference: Reference,
    outcomes: Vec<Outcome>,
    crossref: Option<CrossrefSnapshot>,
    abstract_text: Option<String>,
}

impl ResultBuilder {
    pub fn new(reference: Reference) -> Self {
        Self {
            reference,
            outcomes: Vec::new(),
            crossref: None,
            abstract_text: None,
        }
    }

    /// Record an outcome. A second outcome for the same source is ignored.
    pub fn push_outcome(&mut self, outcome: Outcome) -> &mut Self {
        if self.outcomes.iter().all(|o| o.source != outcome.source) {
            self.outcomes.push(outcome);
        }
        self
    }

    pub fn crossref(&mut self, snapshot: CrossrefSnapshot) -> &mut Self {
        self.crossref = Some(snapshot);
        self
    }

    /// Set the abstract unless one is already present.
    pub fn abstract_text(&mut self, text: impl Into<String>) -> &mut Self {
        if self.abstract_text.is_none() {
            self.abstract_text = Some(text.into());
        }
        self
    }

    pub fn build(self) -> VerificationResult {
        VerificationResult {
            status: derive_status(&self.outcomes),
            reference: self.reference,
            outcomes: self.outcomes,
            crossref: self.crossref,
            abstract_text: self.abstract_text,
        }
    }
}

/// Fixed two-level priority: Crossref decides when present, otherwise arXiv,
/// otherwise there is nothing to decide on. DOI-resolve is advisory only.
pub fn derive_status(outcomes: &[Outcome]) -> Status {
    let decisive = outcomes
        .iter()
        .find(|o| o.source == Source::Crossref)
        .or_else(|| outcomes.iter().find(|o| o.source == Source::Arxiv));
    match decisive {
        Some(outcome) if outcome.valid => Status::Valid,
        Some(_) => Status::Invalid,
        None => Status::NoIdentifier,
    }
}
