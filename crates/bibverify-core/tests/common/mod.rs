#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use bibverify_core::http::BoxFuture;
use bibverify_core::{
    Config, FixedUserAgent, HttpRequest, HttpResponse, Method, NoPacing, Observer, Reference,
    Transport, TransportError, Verifier,
};

type Reply = Result<HttpResponse, TransportError>;

struct Route {
    method: Method,
    prefix: String,
    replies: VecDeque<Reply>,
}

/// Transport that answers from scripted routes instead of the network.
///
/// A route matches on method plus URL prefix; the longest matching prefix
/// wins. Replies are consumed in order and the last one repeats. Requests with
/// no route fail with a transport error.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<(Method, String)>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn route(&self, method: Method, prefix: &str, replies: Vec<Reply>) -> &Self {
        self.routes.lock().unwrap().push(Route {
            method,
            prefix: prefix.to_string(),
            replies: replies.into(),
        });
        self
    }

    pub fn respond(&self, method: Method, prefix: &str, response: HttpResponse) -> &Self {
        self.route(method, prefix, vec![Ok(response)])
    }

    pub fn fail(&self, method: Method, prefix: &str, err: TransportError) -> &Self {
        self.route(method, prefix, vec![Err(err)])
    }

    pub fn calls(&self) -> Vec<(Method, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|(_, url)| url.starts_with(prefix))
            .count()
    }

    fn reply(&self, request: &HttpRequest) -> Reply {
        let mut routes = self.routes.lock().unwrap();
        let route = routes
            .iter_mut()
            .filter(|r| r.method == request.method && request.url.starts_with(&r.prefix))
            .max_by_key(|r| r.prefix.len());
        match route {
            Some(route) if route.replies.len() > 1 => route.replies.pop_front().unwrap(),
            Some(route) => route
                .replies
                .front()
                .cloned()
                .unwrap_or_else(|| Err(TransportError::Other("empty script".into()))),
            None => Err(TransportError::Other(format!(
                "no route for {} {}",
                request.method.as_str(),
                request.url
            ))),
        }
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, TransportError>> {
        self.calls
            .lock()
            .unwrap()
            .push((request.method, request.url.clone()));
        let reply = self.reply(&request);
        Box::pin(async move { reply })
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    pub progress: Mutex<Vec<(usize, usize, String)>>,
    pub logs: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn progress(&self) -> Vec<(usize, usize, String)> {
        self.progress.lock().unwrap().clone()
    }

    pub fn logs(&self) -> Vec<String> {
        self.logs.lock().unwrap().clone()
    }
}

impl Observer for RecordingObserver {
    fn on_progress(&self, index: usize, total: usize, key: &str) {
        self.progress
            .lock()
            .unwrap()
            .push((index, total, key.to_string()));
    }

    fn on_log(&self, message: &str) {
        self.logs.lock().unwrap().push(message.to_string());
    }
}

pub fn verifier(transport: Arc<ScriptedTransport>) -> Verifier {
    verifier_with(transport, Config::default())
}

pub fn verifier_with(transport: Arc<ScriptedTransport>, config: Config) -> Verifier {
    Verifier::with_strategies(
        config,
        transport,
        Arc::new(NoPacing),
        Arc::new(FixedUserAgent::default()),
    )
}

pub fn reference(key: &str) -> Reference {
    Reference {
        entry_type: "article".into(),
        key: key.into(),
        ..Default::default()
    }
}

pub const CROSSREF_FOO: &str = r#"{
  "status": "ok",
  "message": {
    "DOI": "10.1/x",
    "type": "journal-article",
    "title": ["Foo"],
    "container-title": ["Journal of Foo"],
    "author": [{"given": "A", "family": "Bee"}],
    "issued": {"date-parts": [[2020]]},
    "abstract": "<jats:p>We study &amp; foo.</jats:p>"
  }
}"#;

pub const SEARCH_TWO: &str = r#"{
  "message": {
    "items": [
      {"DOI": "10.9/alt1", "type": "journal-article", "title": ["Alt One"],
       "author": [{"given": "C", "family": "Dee"}], "issued": {"date-parts": [[2019]]}},
      {"DOI": "10.9/alt2", "type": "proceedings-article", "title": ["Alt Two"]}
    ]
  }
}"#;
