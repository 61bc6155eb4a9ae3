mod common;

use std::sync::Arc;

use bibverify_core::resolve::arxiv::ArxivClient;
use bibverify_core::resolve::crossref::{CrossrefClient, SearchError};
use bibverify_core::resolve::doi::DoiResolveClient;
use bibverify_core::{FixedUserAgent, HttpResponse, Method, OutcomeKind, TransportError};

use common::{CROSSREF_FOO, SEARCH_TWO, ScriptedTransport};

fn doi_client(transport: &Arc<ScriptedTransport>) -> DoiResolveClient {
    DoiResolveClient::new(transport.clone(), Arc::new(FixedUserAgent::default()))
}

fn crossref_client(transport: &Arc<ScriptedTransport>) -> CrossrefClient {
    CrossrefClient::new(transport.clone(), Arc::new(FixedUserAgent::default()))
}

#[tokio::test]
async fn doi_not_found_and_timeout_are_distinguishable() {
    let missing = ScriptedTransport::new();
    missing.respond(Method::Head, "https://doi.org/", HttpResponse::new(404));
    let slow = ScriptedTransport::new();
    slow.fail(Method::Head, "https://doi.org/", TransportError::Timeout);

    let not_found = doi_client(&missing).check("10.1/x").await;
    let timed_out = doi_client(&slow).check("10.1/x").await;

    assert_eq!(not_found.kind, OutcomeKind::NotFound);
    assert_eq!(not_found.message, "DOI not found (404)");
    assert_eq!(not_found.status_code, 404);
    assert_eq!(timed_out.kind, OutcomeKind::TransportTimeout);
    assert_eq!(timed_out.message, "DOI resolve timeout");
    assert_eq!(timed_out.status_code, 0);
    assert_ne!(not_found.message, timed_out.message);
    // a transport fault ends the check without trying the second host
    assert_eq!(slow.calls().len(), 1);
}

#[tokio::test]
async fn forbidden_head_falls_back_to_get() {
    let transport = ScriptedTransport::new();
    transport
        .respond(Method::Head, "https://doi.org/", HttpResponse::new(403))
        .respond(Method::Get, "https://doi.org/", HttpResponse::new(200));

    let outcome = doi_client(&transport).check("10.1/x").await;

    assert!(outcome.valid);
    assert_eq!(outcome.message, "Valid (resolved with GET)");
    assert_eq!(
        transport.calls(),
        vec![
            (Method::Head, "https://doi.org/10.1/x".to_string()),
            (Method::Get, "https://doi.org/10.1/x".to_string()),
        ]
    );
}

#[tokio::test]
async fn forbidden_everywhere_reports_forbidden() {
    let transport = ScriptedTransport::new();
    transport
        .respond(Method::Head, "https://", HttpResponse::new(403))
        .respond(Method::Get, "https://", HttpResponse::new(403));

    let outcome = doi_client(&transport).check("10.1/x").await;

    assert_eq!(outcome.kind, OutcomeKind::Forbidden);
    assert_eq!(outcome.message, "Access forbidden (403)");
    assert_eq!(outcome.status_code, 403);
    assert_eq!(transport.calls().len(), 4);
    assert_eq!(transport.calls_to("https://dx.doi.org/"), 2);
}

#[tokio::test]
async fn inconclusive_primary_host_tries_mirror() {
    let transport = ScriptedTransport::new();
    transport
        .respond(Method::Head, "https://doi.org/", HttpResponse::new(500))
        .respond(
            Method::Head,
            "https://dx.doi.org/",
            HttpResponse::new(200).with_final_url("https://dx.example/landing"),
        );

    let outcome = doi_client(&transport).check("10.1/x").await;

    assert!(outcome.valid);
    assert_eq!(outcome.message, "Valid (resolved to https://dx.example/landing)");
}

#[tokio::test]
async fn unresolvable_without_forbidden_is_upstream_error() {
    let transport = ScriptedTransport::new();
    transport.respond(Method::Head, "https://", HttpResponse::new(502));

    let outcome = doi_client(&transport).check("10.1/x").await;

    assert_eq!(outcome.kind, OutcomeKind::UpstreamError);
    assert_eq!(outcome.message, "Could not verify");
    assert_eq!(outcome.status_code, 502);
}

#[tokio::test]
async fn redirect_target_is_truncated() {
    let long = format!("https://publisher.example/{}", "p".repeat(200));
    let transport = ScriptedTransport::new();
    transport.respond(
        Method::Head,
        "https://doi.org/",
        HttpResponse::new(200).with_final_url(long.clone()),
    );

    let outcome = doi_client(&transport).check("10.1/x").await;

    let expected: String = long.chars().take(80).collect();
    assert_eq!(outcome.message, format!("Valid (resolved to {expected})"));
}

#[tokio::test]
async fn empty_identifiers_issue_no_requests() {
    let transport = ScriptedTransport::new();
    let agents = Arc::new(FixedUserAgent::default());

    let doi = doi_client(&transport).check("").await;
    let (crossref, work) = crossref_client(&transport).check("").await;
    let arxiv = ArxivClient::new(transport.clone(), agents).check("").await;

    assert_eq!(doi.message, "No DOI provided");
    assert_eq!(crossref.message, "No DOI provided");
    assert!(work.is_none());
    assert_eq!(arxiv.message, "No arXiv ID provided");
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn crossref_lookup_outcomes() {
    let transport = ScriptedTransport::new();
    transport
        .respond(
            Method::Get,
            "https://api.crossref.org/works/10.1/x",
            HttpResponse::new(200).with_body(CROSSREF_FOO),
        )
        .respond(
            Method::Get,
            "https://api.crossref.org/works/10.1/garbled",
            HttpResponse::new(200).with_body("<html>maintenance</html>"),
        )
        .respond(
            Method::Get,
            "https://api.crossref.org/works/10.1/flaky",
            HttpResponse::new(500),
        );
    let client = crossref_client(&transport);

    let (ok, work) = client.check("10.1/X").await;
    assert_eq!(ok.message, "Valid (Crossref)");
    let work = work.unwrap();
    assert_eq!(work.title.as_deref(), Some("Foo"));
    assert_eq!(work.year.as_deref(), Some("2020"));

    let (garbled, none) = client.check("10.1/garbled").await;
    assert!(garbled.valid);
    assert!(none.is_none());

    let (flaky, _) = client.check("10.1/flaky").await;
    assert_eq!(flaky.kind, OutcomeKind::UpstreamError);
    assert_eq!(flaky.message, "Crossref error (HTTP 500)");
    assert_eq!(flaky.status_code, 500);
}

#[tokio::test]
async fn crossref_requests_carry_mailto() {
    let transport = ScriptedTransport::new();
    transport.respond(
        Method::Get,
        "https://api.crossref.org/works",
        HttpResponse::new(200).with_body(SEARCH_TWO),
    );
    let client = crossref_client(&transport).with_mailto(Some("me@example.org".into()));

    let items = client.search("deep learning", 1).await.unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(
        transport.calls()[0].1,
        "https://api.crossref.org/works?query.bibliographic=deep%20learning&rows=1&mailto=me%40example.org"
    );
}

#[tokio::test]
async fn reserved_characters_stay_inside_the_doi() {
    let transport = ScriptedTransport::new();
    transport
        .respond(Method::Head, "https://doi.org/", HttpResponse::new(200))
        .respond(
            Method::Get,
            "https://api.crossref.org/works/",
            HttpResponse::new(200).with_body(CROSSREF_FOO),
        );
    let crossref = crossref_client(&transport).with_mailto(Some("me@example.org".into()));

    doi_client(&transport).check("10.1000/abc#def").await;
    crossref.check("10.1000/a?b=c").await;

    assert_eq!(
        transport.calls(),
        vec![
            (Method::Head, "https://doi.org/10.1000/abc%23def".to_string()),
            (
                Method::Get,
                "https://api.crossref.org/works/10.1000/a%3Fb%3Dc?mailto=me%40example.org"
                    .to_string()
            ),
        ]
    );
    let url = reqwest::Url::parse(&crossref.lookup_url("10.1000/abc#def")).unwrap();
    assert_eq!(url.path(), "/works/10.1000/abc%23def");
    assert_eq!(url.query(), Some("mailto=me%40example.org"));
    assert_eq!(url.fragment(), None);
}

#[tokio::test]
async fn search_failures_are_reported() {
    let transport = ScriptedTransport::new();
    transport.respond(Method::Get, "https://api.crossref.org/works?", HttpResponse::new(503));

    let err = crossref_client(&transport).search("x", 3).await.unwrap_err();

    assert_eq!(err, SearchError::Status(503));
}

#[tokio::test]
async fn arxiv_outcomes() {
    let transport = ScriptedTransport::new();
    transport
        .respond(Method::Head, "https://arxiv.org/abs/2101.00001", HttpResponse::new(200))
        .respond(Method::Head, "https://arxiv.org/abs/0000.00000", HttpResponse::new(301))
        .fail(
            Method::Head,
            "https://arxiv.org/abs/1111.11111",
            TransportError::Connect("reset".into()),
        );
    let client = ArxivClient::new(transport.clone(), Arc::new(FixedUserAgent::default()));

    assert_eq!(client.check("2101.00001").await.message, "Valid arXiv ID");

    let moved = client.check("0000.00000").await;
    assert_eq!(moved.kind, OutcomeKind::NotFound);
    assert_eq!(moved.message, "arXiv ID not found (301)");

    let offline = client.check("1111.11111").await;
    assert_eq!(offline.kind, OutcomeKind::TransportError);
    assert_eq!(offline.message, "arXiv connection error");
}
