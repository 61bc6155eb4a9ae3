//! DOI resolution check against the doi.org resolvers.

use std::sync::Arc;

use crate::http::{HttpRequest, Transport};
use crate::identifiers::{doi_url_path, truncate_chars};
use crate::pacing::UserAgentPool;
use crate::{Outcome, OutcomeKind, Source};

use super::{missing_identifier, transport_failure};

/// Resolver hosts, tried in order.
pub const RESOLVER_HOSTS: &[&str] = &["https://doi.org", "https://dx.doi.org"];

const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Checks that a DOI resolves through the public resolver.
///
/// Sends HEAD (redirects followed) to each host in turn and stops at the first
/// conclusive answer (200 or 404). A 403 is retried once on the same host with
/// GET, since some publishers reject HEAD from non-browsers.
pub struct DoiResolveClient {
    transport: Arc<dyn Transport>,
    agents: Arc<dyn UserAgentPool>,
    hosts: &'static [&'static str],
}

impl DoiResolveClient {
    pub fn new(transport: Arc<dyn Transport>, agents: Arc<dyn UserAgentPool>) -> Self {
        Self {
            transport,
            agents,
            hosts: RESOLVER_HOSTS,
        }
    }

    fn request(&self, url: &str, get: bool) -> HttpRequest {
        let request = if get {
            HttpRequest::get(url)
        } else {
            HttpRequest::head(url)
        };
        request
            .header("User-Agent", self.agents.user_agent())
            .header("Accept", BROWSER_ACCEPT)
    }

    /// `doi` must already be normalized.
    pub async fn check(&self, doi: &str) -> Outcome {
        if doi.is_empty() {
            return missing_identifier(Source::DoiResolve);
        }

        let mut forbidden = false;
        let mut last_status = 0;

        let path = doi_url_path(doi);
        for host in self.hosts {
            let url = format!("{host}/{path}");
            let response = match self.transport.send(self.request(&url, false)).await {
                Ok(r) => r,
                Err(e) => return transport_failure(Source::DoiResolve, &e),
            };
            last_status = response.status;

            match response.status {
                200 => {
                    let target = if response.final_url.is_empty() {
                        url.as_str()
                    } else {
                        response.final_url.as_str()
                    };
                    return Outcome::new(
                        Source::DoiResolve,
                        OutcomeKind::Ok,
                        format!("Valid (resolved to {})", truncate_chars(target, 80)),
                        200,
                    );
                }
                404 => {
                    return Outcome::new(
                        Source::DoiResolve,
                        OutcomeKind::NotFound,
                        "DOI not found (404)",
                        404,
                    );
                }
                403 => {
                    log::debug!("{url}: HEAD forbidden, retrying with GET");
                    let retry = match self.transport.send(self.request(&url, true)).await {
                        Ok(r) => r,
                        Err(e) => return transport_failure(Source::DoiResolve, &e),
                    };
                    match retry.status {
                        200 => {
                            return Outcome::new(
                                Source::DoiResolve,
                                OutcomeKind::Ok,
                                "Valid (resolved with GET)",
                                200,
                            );
                        }
                        404 => {
                            return Outcome::new(
                                Source::DoiResolve,
                                OutcomeKind::NotFound,
                                "DOI not found (404)",
                                404,
                            );
                        }
                        status => {
                            log::debug!("{url}: GET fallback returned {status}");
                            forbidden = true;
                        }
                    }
                }
                status => log::debug!("{url}: inconclusive status {status}"),
            }
        }

        if forbidden {
            Outcome::new(
                Source::DoiResolve,
                OutcomeKind::Forbidden,
                "Access forbidden (403)",
                403,
            )
        } else {
            Outcome::new(
                Source::DoiResolve,
                OutcomeKind::UpstreamError,
                "Could not verify",
                last_status,
            )
        }
    }
}
