// biovalidate-providers/tests/http_provider_integration.rs
// ============================================================================
// Module: HTTP Provider Integration Tests
// Description: End-to-end request/response tests against local mock servers.
// Purpose: Exercise the primary and secondary clients' wire handling without
//          depending on the real NCBI/Ensembl endpoints.
// ============================================================================

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::thread;

use biovalidate_core::IdentifierKind;
use biovalidate_providers::client::IdentifierLookupClient;
use biovalidate_providers::client::ProviderAnswer;
use biovalidate_providers::primary::NcbiGeneProvider;
use biovalidate_providers::primary::PrimaryProviderConfig;
use biovalidate_providers::secondary::EnsemblGeneProvider;
use biovalidate_providers::secondary::SecondaryProviderConfig;
use tiny_http::Response;
use tiny_http::Server;

#[tokio::test]
async fn primary_provider_parses_a_mixed_batch_response() {
    let server = Server::http("127.0.0.1:0").expect("bind mock server");
    let addr = server.server_addr().to_ip().expect("ip addr");
    let base_url = format!("http://{addr}");

    let handle = thread::spawn(move || {
        if let Ok(request) = server.recv() {
            let body = r#"{"results":[
                {"found":true,"ambiguous":false,"canonical_name":"TP53"},
                {"found":false,"ambiguous":false},
                {"found":false,"ambiguous":true,"candidate_count":3}
            ]}"#;
            let response = Response::from_string(body)
                .with_header(tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap());
            let _ = request.respond(response);
        }
    });

    let config = PrimaryProviderConfig { base_url, ..PrimaryProviderConfig::default() };
    let provider = NcbiGeneProvider::new(config).expect("client builds");
    let identifiers = vec!["TP53".to_string(), "BOGUS1".to_string(), "FAM1".to_string()];
    let answers =
        provider.resolve("human", IdentifierKind::Gene, &identifiers).await.expect("resolve succeeds");

    assert_eq!(answers.len(), 3);
    assert_eq!(answers[0], ProviderAnswer::Found { canonical_name: Some("TP53".to_string()) });
    assert_eq!(answers[1], ProviderAnswer::NotFound);
    assert_eq!(answers[2], ProviderAnswer::Ambiguous { candidate_count: 3 });

    handle.join().expect("server thread completes");
}

#[tokio::test]
async fn primary_provider_maps_429_to_rate_limited_and_exhausts_retries() {
    let server = Server::http("127.0.0.1:0").expect("bind mock server");
    let addr = server.server_addr().to_ip().expect("ip addr");
    let base_url = format!("http://{addr}");

    let handle = thread::spawn(move || {
        for _ in 0..2 {
            if let Ok(request) = server.recv() {
                let _ = request.respond(Response::empty(429));
            }
        }
    });

    let config = PrimaryProviderConfig {
        base_url,
        backoff: biovalidate_providers::retry::BackoffPolicy {
            max_attempts: 2,
            base_delay: std::time::Duration::from_millis(1),
            max_delay: std::time::Duration::from_millis(2),
        },
        ..PrimaryProviderConfig::default()
    };
    let provider = NcbiGeneProvider::new(config).expect("client builds");
    let result = provider.resolve("human", IdentifierKind::Gene, &["TP53".to_string()]).await;
    assert!(result.is_err());

    handle.join().expect("server thread completes");
}

#[tokio::test]
async fn secondary_provider_resolves_identifiers_one_request_at_a_time() {
    let server = Server::http("127.0.0.1:0").expect("bind mock server");
    let addr = server.server_addr().to_ip().expect("ip addr");
    let base_url = format!("http://{addr}");

    let handle = thread::spawn(move || {
        for _ in 0..2 {
            if let Ok(request) = server.recv() {
                let body = r#"{"found":true,"ambiguous":false,"canonical_name":"TP53"}"#;
                let _ = request.respond(Response::from_string(body));
            }
        }
    });

    let config = SecondaryProviderConfig { base_url, ..SecondaryProviderConfig::default() };
    let provider = EnsemblGeneProvider::new(config).expect("client builds");
    let identifiers = vec!["TP53".to_string(), "TP53B".to_string()];
    let answers =
        provider.resolve("human", IdentifierKind::Gene, &identifiers).await.expect("resolve succeeds");

    assert_eq!(answers.len(), 2);
    assert!(answers.iter().all(|answer| matches!(answer, ProviderAnswer::Found { .. })));

    handle.join().expect("server thread completes");
}

#[tokio::test]
async fn secondary_provider_maps_404_to_not_found_without_retrying() {
    let server = Server::http("127.0.0.1:0").expect("bind mock server");
    let addr = server.server_addr().to_ip().expect("ip addr");
    let base_url = format!("http://{addr}");

    let handle = thread::spawn(move || {
        if let Ok(request) = server.recv() {
            let _ = request.respond(Response::empty(404));
        }
    });

    let config = SecondaryProviderConfig { base_url, ..SecondaryProviderConfig::default() };
    let provider = EnsemblGeneProvider::new(config).expect("client builds");
    let answers = provider
        .resolve("human", IdentifierKind::Gene, &["MISSING1".to_string()])
        .await
        .expect("resolve succeeds");

    assert_eq!(answers, vec![ProviderAnswer::NotFound]);

    handle.join().expect("server thread completes");
}
