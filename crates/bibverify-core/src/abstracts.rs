//! Abstract enrichment.
//!
//! Crossref abstracts are attached during verification. For everything else a
//! page fetcher may be plugged in; enrichment is best effort and never changes
//! a result's status.

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use crate::checker::Verifier;
use crate::http::{BoxFuture, HttpRequest, ReqwestTransport, Transport};
use crate::identifiers::{doi_url_path, normalize_doi};
use crate::observer::Observer;
use crate::pacing::{RotatingUserAgents, UserAgentPool};
use crate::result::VerificationResult;
use crate::{Config, CoreError, Reference};

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Meta tags carrying an abstract, in priority order.
const META_SELECTORS: &[&str] = &[
    "meta[name='citation_abstract']",
    "meta[name='dc.Description']",
    "meta[name='description']",
    "meta[property='og:description']",
];

const CONTAINER_SELECTOR: &str = "article, main, #main, .content, .article";
const ABSTRACT_SELECTORS: &[&str] = &[".abstract", "#abstract", "section.abstract", "div.abstract"];

/// In-page abstracts shorter than this are taken to be headings or teasers.
const MIN_BODY_ABSTRACT_CHARS: usize = 40;

/// Replace tags with spaces, decode entities, collapse whitespace.
pub fn strip_html(html: &str) -> String {
    let without_tags = TAG_RE.replace_all(html, " ");
    let decoded = html_escape::decode_html_entities(&without_tags);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Retrieves an abstract from a landing page.
///
/// Implementations never fail: `None` means nothing usable was found, for
/// whatever reason.
pub trait AbstractFetcher: Send + Sync {
    fn fetch_abstract<'a>(
        &'a self,
        url: &'a str,
        timeout: Duration,
        headless: bool,
    ) -> BoxFuture<'a, Option<String>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrichOptions {
    pub timeout: Duration,
    pub headless: bool,
}

impl EnrichOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout: Duration::from_millis(config.browser_timeout_ms),
            headless: config.headless,
        }
    }
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Landing page for a reference: the DOI resolver URL, else the entry's URL.
pub fn abstract_target_url(reference: &Reference) -> Option<String> {
    let doi = normalize_doi(reference.doi.as_deref());
    if !doi.is_empty() {
        return Some(format!("https://doi.org/{}", doi_url_path(&doi)));
    }
    reference
        .url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
}

impl Verifier {
    /// Fill in missing abstracts through `fetcher`, returning new results in
    /// the same order. Results that already carry an abstract, or have no
    /// landing page, pass through untouched. Without a fetcher nothing is
    /// fetched at all.
    pub async fn enrich_abstracts(
        &self,
        results: Vec<VerificationResult>,
        fetcher: Option<&dyn AbstractFetcher>,
        options: &EnrichOptions,
        observer: &dyn Observer,
    ) -> Vec<VerificationResult> {
        let Some(fetcher) = fetcher else {
            observer.on_log("No abstract fetcher configured; keeping Crossref abstracts only");
            return results;
        };

        let total = results.len();
        let mut enriched = Vec::with_capacity(total);
        for (i, result) in results.into_iter().enumerate() {
            if result.abstract_text().is_some() {
                enriched.push(result);
                continue;
            }
            let Some(url) = abstract_target_url(result.reference()) else {
                enriched.push(result);
                continue;
            };

            observer.on_log(&format!("[Abstract {}/{}] {}", i + 1, total, result.key()));
            let fetched = fetcher
                .fetch_abstract(&url, options.timeout, options.headless)
                .await
                .filter(|text| !text.is_empty());
            self.pacer.pause().await;

            match fetched {
                Some(text) => {
                    observer.on_log("  Abstract found");
                    enriched.push(result.with_abstract(text));
                }
                None => {
                    observer.on_log("  No abstract found");
                    enriched.push(result);
                }
            }
        }
        enriched
    }
}

/// Fetches the landing page over plain HTTP and scrapes the abstract out of
/// its meta tags or body. `headless` has no meaning here and is ignored.
pub struct PageAbstractFetcher {
    transport: Arc<dyn Transport>,
    agents: Arc<dyn UserAgentPool>,
}

impl PageAbstractFetcher {
    pub fn new(transport: Arc<dyn Transport>, agents: Arc<dyn UserAgentPool>) -> Self {
        Self { transport, agents }
    }

    /// Dedicated client whose own timeout is the page timeout, so slow
    /// publisher pages do not hit the shorter registry timeout.
    pub fn from_config(config: &Config) -> Result<Self, CoreError> {
        let transport =
            ReqwestTransport::with_timeout(Duration::from_millis(config.browser_timeout_ms))?;
        Ok(Self::new(
            Arc::new(transport),
            Arc::new(RotatingUserAgents::default()),
        ))
    }
}

impl AbstractFetcher for PageAbstractFetcher {
    fn fetch_abstract<'a>(
        &'a self,
        url: &'a str,
        timeout: Duration,
        _headless: bool,
    ) -> BoxFuture<'a, Option<String>> {
        Box::pin(async move {
            let request = HttpRequest::get(url)
                .header("User-Agent", self.agents.user_agent())
                .header("Accept", "text/html,application/xhtml+xml");
            let response = match tokio::time::timeout(timeout, self.transport.send(request)).await {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => {
                    log::debug!("abstract fetch {url}: {e}");
                    return None;
                }
                Err(_) => {
                    log::debug!("abstract fetch {url}: timed out after {timeout:?}");
                    return None;
                }
            };
            if !response.is_success() {
                log::debug!("abstract fetch {url}: HTTP {}", response.status);
                return None;
            }
            extract_abstract(&response.body)
        })
    }
}

/// Meta tags first, then an abstract element inside the main content.
pub fn extract_abstract(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    for selector in META_SELECTORS.iter().filter_map(|s| Selector::parse(s).ok()) {
        let content = document
            .select(&selector)
            .next()
            .and_then(|el| el.value().attr("content"));
        if let Some(content) = content {
            let text = strip_html(content);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }

    let containers = Selector::parse(CONTAINER_SELECTOR).ok()?;
    let inner: Vec<Selector> = ABSTRACT_SELECTORS
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .collect();
    for root in document.select(&containers) {
        for selector in &inner {
            if let Some(element) = root.select(selector).next() {
                let text = strip_html(&element.text().collect::<Vec<_>>().join(" "));
                if text.chars().count() >= MIN_BODY_ABSTRACT_CHARS {
                    return Some(text);
                }
            }
        }
    }
    None
}
