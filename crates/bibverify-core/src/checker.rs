//! Verification orchestrator: runs each reference through the registry checks
//! in a fixed order and derives its status.
//!
//! References are processed strictly one after another. A failing source never
//! aborts the record or the batch; it is captured as a negative [`Outcome`].
//! Cancellation is only observed between references, so every emitted result
//! is complete.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::abstracts::strip_html;
use crate::http::{ReqwestTransport, Transport};
use crate::identifiers::{normalize_arxiv, normalize_doi, truncate_chars};
use crate::observer::Observer;
use crate::pacing::{Pacer, RandomPacer, RotatingUserAgents, UserAgentPool};
use crate::resolve::arxiv::ArxivClient;
use crate::resolve::crossref::CrossrefClient;
use crate::resolve::doi::DoiResolveClient;
use crate::result::{CrossrefSnapshot, ResultBuilder, VerificationResult};
use crate::retry::{RetryPolicy, Retrying};
use crate::{CheckReport, CheckStats, Config, CoreError, Reference};

/// Owns the registry clients plus the pacing and identity strategies.
pub struct Verifier {
    pub(crate) config: Config,
    pub(crate) pacer: Arc<dyn Pacer>,
    pub(crate) doi: DoiResolveClient,
    pub(crate) crossref: CrossrefClient,
    pub(crate) arxiv: ArxivClient,
}

impl Verifier {
    /// Production verifier: one pooled reqwest client with retry/backoff,
    /// random pacing from the configured delay range, rotating user agents.
    pub fn new(config: Config) -> Result<Self, CoreError> {
        let transport = Retrying::new(
            ReqwestTransport::with_timeout(config.timeout())?,
            RetryPolicy::with_max_retries(config.max_retries),
        );
        let pacer = RandomPacer::from_secs_f64(config.delay_min_secs, config.delay_max_secs);
        Ok(Self::with_strategies(
            config,
            Arc::new(transport),
            Arc::new(pacer),
            Arc::new(RotatingUserAgents::default()),
        ))
    }

    /// Assemble a verifier from explicit strategies (e.g. a scripted transport
    /// and [`NoPacing`](crate::pacing::NoPacing) in tests).
    pub fn with_strategies(
        config: Config,
        transport: Arc<dyn Transport>,
        pacer: Arc<dyn Pacer>,
        agents: Arc<dyn UserAgentPool>,
    ) -> Self {
        let doi = DoiResolveClient::new(transport.clone(), agents.clone());
        let crossref = CrossrefClient::new(transport.clone(), agents.clone())
            .with_mailto(config.crossref_mailto.clone());
        let arxiv = ArxivClient::new(transport, agents);
        Self {
            config,
            pacer,
            doi,
            crossref,
            arxiv,
        }
    }

    /// Verify every reference in order.
    pub async fn check_references(
        &self,
        refs: &[Reference],
        observer: &dyn Observer,
        cancel: &CancellationToken,
    ) -> CheckReport {
        let total = refs.len();
        let mut results = Vec::with_capacity(total);

        for (i, reference) in refs.iter().enumerate() {
            if cancel.is_cancelled() {
                observer.on_log(&format!(
                    "Cancelled after {} of {} references",
                    results.len(),
                    total
                ));
                log::info!("verification cancelled after {}/{}", results.len(), total);
                break;
            }

            let index = i + 1;
            observer.on_progress(index, total, &reference.key);
            observer.on_log(&format!("\n[{index}/{total}] Verifying: {}", reference.key));
            results.push(self.check_reference(reference, observer).await);
        }

        let stats = CheckStats::from_results(&results);
        log::info!(
            "verified {} references: {} valid, {} invalid, {} without identifier",
            stats.total,
            stats.valid,
            stats.invalid,
            stats.no_identifier
        );
        CheckReport { results, stats }
    }

    /// Verify one reference: DOI-resolve and Crossref if it has a DOI, then
    /// arXiv if it has an arXiv ID, pacing after every network step.
    pub async fn check_reference(
        &self,
        reference: &Reference,
        observer: &dyn Observer,
    ) -> VerificationResult {
        let mut builder = ResultBuilder::new(reference.clone());

        if let Some(title) = &reference.title {
            observer.on_log(&format!("  Title: {}", truncate_chars(title, 80)));
        }

        let doi = normalize_doi(reference.doi.as_deref());
        if !doi.is_empty() {
            observer.on_log(&format!("  Checking DOI: {doi}"));
            let resolved = self.doi.check(&doi).await;
            observer.on_log(&format!("    DOI resolve: {}", resolved.message));
            builder.push_outcome(resolved);
            self.pacer.pause().await;

            observer.on_log(&format!("  Verifying DOI via Crossref: {doi}"));
            let (registered, work) = self.crossref.check(&doi).await;
            observer.on_log(&format!("    Crossref: {}", registered.message));
            builder.push_outcome(registered);
            if let Some(work) = work {
                builder.crossref(CrossrefSnapshot::from_work(&work));
                let abstract_text = work
                    .abstract_text
                    .as_deref()
                    .map(strip_html)
                    .filter(|text| !text.is_empty());
                if let Some(text) = abstract_text {
                    builder.abstract_text(text);
                }
            }
            self.pacer.pause().await;
        }

        let arxiv_id = normalize_arxiv(reference.arxiv_id.as_deref());
        if !arxiv_id.is_empty() {
            observer.on_log(&format!("  Checking arXiv: {arxiv_id}"));
            let outcome = self.arxiv.check(&arxiv_id).await;
            observer.on_log(&format!("    arXiv: {}", outcome.message));
            builder.push_outcome(outcome);
            self.pacer.pause().await;
        }

        let result = builder.build();
        observer.on_log(&format!("  Status: {}", result.status()));
        log::debug!("{}: {}", reference.key, result.status());
        result
    }
}
