//! Crossref work lookup and bibliographic search.
//!
//! API: https://api.crossref.org/works/{doi} and
//! https://api.crossref.org/works?query.bibliographic=...
//!
//! Payloads are read leniently from `serde_json::Value`: a field with an
//! unexpected shape is treated as absent rather than failing the whole parse.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::http::{HttpRequest, Transport, TransportError};
use crate::identifiers::doi_url_path;
use crate::pacing::UserAgentPool;
use crate::{Outcome, OutcomeKind, Source};

use super::{missing_identifier, transport_failure};

pub const CROSSREF_WORKS_URL: &str = "https://api.crossref.org/works";

/// Date fields consulted for the publication year, in priority order.
const YEAR_FIELDS: &[&str] = &["published-print", "published-online", "issued"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrossrefAuthor {
    pub given: Option<String>,
    pub family: Option<String>,
}

impl CrossrefAuthor {
    /// "given family", or `None` when there is no family name.
    pub fn display_name(&self) -> Option<String> {
        let family = self.family.as_deref()?;
        let given = self.given.as_deref().unwrap_or_default();
        Some(format!("{given} {family}").trim().to_string())
    }
}

/// Bibliographic metadata of one Crossref work.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrossrefWork {
    pub doi: Option<String>,
    /// Crossref type tag, e.g. `journal-article`.
    pub work_type: Option<String>,
    pub title: Option<String>,
    pub container_title: Option<String>,
    pub year: Option<String>,
    pub authors: Vec<CrossrefAuthor>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub page: Option<String>,
    pub url: Option<String>,
    /// Raw abstract as delivered (usually JATS markup).
    pub abstract_text: Option<String>,
}

impl CrossrefWork {
    /// Read a work from the `message` object of a lookup response, or from one
    /// element of `message.items` of a search response.
    pub fn from_message(message: &Value) -> Self {
        let authors = message
            .get("author")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .map(|a| CrossrefAuthor {
                        given: text_field(a, "given"),
                        family: text_field(a, "family"),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            doi: text_field(message, "DOI"),
            work_type: text_field(message, "type"),
            title: first_text(message, "title"),
            container_title: first_text(message, "container-title"),
            year: extract_year(message),
            authors,
            volume: text_field(message, "volume"),
            issue: text_field(message, "issue"),
            page: text_field(message, "page"),
            url: text_field(message, "URL"),
            abstract_text: text_field(message, "abstract"),
        }
    }

    /// Parse a full lookup response body (`{"message": {...}}`).
    pub fn from_response_body(body: &str) -> Option<Self> {
        let payload: Value = serde_json::from_str(body).ok()?;
        let message = payload.get("message")?;
        message.is_object().then(|| Self::from_message(message))
    }
}

/// Parse the items of a search response body. Malformed bodies yield nothing.
pub fn parse_search_items(body: &str) -> Vec<CrossrefWork> {
    let Ok(payload) = serde_json::from_str::<Value>(body) else {
        return Vec::new();
    };
    payload
        .pointer("/message/items")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(CrossrefWork::from_message).collect())
        .unwrap_or_default()
}

/// Non-empty string or number under `key`.
fn text_field(value: &Value, key: &str) -> Option<String> {
    scalar_text(value.get(key)?)
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Array-or-string field; the first element of an array wins.
fn first_text(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::Array(items) => items.first().and_then(scalar_text),
        other => scalar_text(other),
    }
}

/// First available `date-parts[0][0]` across [`YEAR_FIELDS`].
pub fn extract_year(message: &Value) -> Option<String> {
    YEAR_FIELDS.iter().find_map(|field| {
        let first = message
            .get(*field)?
            .get("date-parts")?
            .as_array()?
            .first()?
            .as_array()?
            .first()?;
        scalar_text(first)
    })
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("search failed with status {0}")]
    Status(u16),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Client for Crossref's work lookup and free-text search.
pub struct CrossrefClient {
    transport: Arc<dyn Transport>,
    agents: Arc<dyn UserAgentPool>,
    mailto: Option<String>,
}

impl CrossrefClient {
    pub fn new(transport: Arc<dyn Transport>, agents: Arc<dyn UserAgentPool>) -> Self {
        Self {
            transport,
            agents,
            mailto: None,
        }
    }

    /// Identify ourselves for Crossref's polite pool.
    pub fn with_mailto(mut self, mailto: Option<String>) -> Self {
        self.mailto = mailto.filter(|m| !m.trim().is_empty());
        self
    }

    fn request(&self, url: String) -> HttpRequest {
        HttpRequest::get(url)
            .header("User-Agent", self.agents.user_agent())
            .header("Accept", "application/json")
    }

    pub fn lookup_url(&self, doi: &str) -> String {
        let mut url = format!(
            "{CROSSREF_WORKS_URL}/{}",
            doi_url_path(&doi.to_lowercase())
        );
        if let Some(mailto) = &self.mailto {
            url.push_str(&format!("?mailto={}", urlencoding::encode(mailto)));
        }
        url
    }

    pub fn search_url(&self, query: &str, rows: usize) -> String {
        let mut url = format!(
            "{CROSSREF_WORKS_URL}?query.bibliographic={}&rows={}",
            urlencoding::encode(query),
            rows
        );
        if let Some(mailto) = &self.mailto {
            url.push_str(&format!("&mailto={}", urlencoding::encode(mailto)));
        }
        url
    }

    /// Look up a normalized DOI. A 200 response makes the DOI valid; its
    /// metadata is returned when the body parses.
    pub async fn check(&self, doi: &str) -> (Outcome, Option<CrossrefWork>) {
        if doi.is_empty() {
            return (missing_identifier(Source::Crossref), None);
        }

        let response = match self.transport.send(self.request(self.lookup_url(doi))).await {
            Ok(r) => r,
            Err(e) => return (transport_failure(Source::Crossref, &e), None),
        };

        match response.status {
            200 => {
                let work = CrossrefWork::from_response_body(&response.body);
                if work.is_none() {
                    log::warn!("Crossref: unreadable payload for {doi}");
                }
                (
                    Outcome::new(Source::Crossref, OutcomeKind::Ok, "Valid (Crossref)", 200),
                    work,
                )
            }
            404 => (
                Outcome::new(
                    Source::Crossref,
                    OutcomeKind::NotFound,
                    "DOI not found in Crossref (404)",
                    404,
                ),
                None,
            ),
            status => (
                Outcome::new(
                    Source::Crossref,
                    OutcomeKind::UpstreamError,
                    format!("Crossref error (HTTP {status})"),
                    status,
                ),
                None,
            ),
        }
    }

    /// Free-text bibliographic search returning up to `rows` ranked works.
    pub async fn search(&self, query: &str, rows: usize) -> Result<Vec<CrossrefWork>, SearchError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let response = self
            .transport
            .send(self.request(self.search_url(query, rows)))
            .await?;
        if response.status != 200 {
            return Err(SearchError::Status(response.status));
        }
        let mut items = parse_search_items(&response.body);
        items.truncate(rows);
        Ok(items)
    }
}
