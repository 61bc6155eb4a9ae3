//! arXiv existence probe against the abstract page.

use std::sync::Arc;

use crate::http::{HttpRequest, Transport};
use crate::pacing::UserAgentPool;
use crate::{Outcome, OutcomeKind, Source};

use super::{missing_identifier, transport_failure};

pub const ARXIV_ABS_URL: &str = "https://arxiv.org/abs";

pub struct ArxivClient {
    transport: Arc<dyn Transport>,
    agents: Arc<dyn UserAgentPool>,
}

impl ArxivClient {
    pub fn new(transport: Arc<dyn Transport>, agents: Arc<dyn UserAgentPool>) -> Self {
        Self { transport, agents }
    }

    /// HEAD the abstract page; any non-2xx counts as not found.
    pub async fn check(&self, arxiv_id: &str) -> Outcome {
        if arxiv_id.is_empty() {
            return missing_identifier(Source::Arxiv);
        }

        let request = HttpRequest::head(format!("{ARXIV_ABS_URL}/{arxiv_id}"))
            .header("User-Agent", self.agents.user_agent());
        match self.transport.send(request).await {
            Ok(response) if response.is_success() => Outcome::new(
                Source::Arxiv,
                OutcomeKind::Ok,
                "Valid arXiv ID",
                response.status,
            ),
            Ok(response) => Outcome::new(
                Source::Arxiv,
                OutcomeKind::NotFound,
                format!("arXiv ID not found ({})", response.status),
                response.status,
            ),
            Err(e) => transport_failure(Source::Arxiv, &e),
        }
    }
}
