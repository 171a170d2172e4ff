//! Engine scenarios against a mocked lookup service

use crate::common::{test_config, test_engine, PAYLOAD};
use bridge_resolver::identifier::Identifier;
use bridge_resolver::resolver::LookupError;
use bridge_resolver::Strategy;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ids(values: &[&str]) -> Vec<Identifier> {
    values.iter().map(|v| Identifier::parse(v).unwrap()).collect()
}

#[tokio::test]
async fn test_case_variants_resolve_once() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/transactions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<script>id=job-a;</script>"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .and(query_param("id", "job-a"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAYLOAD))
        .expect(1)
        .mount(&server)
        .await;

    let engine = test_engine(test_config(&server.uri(), "unused.csv"));
    let backend = engine.backend_for(Strategy::Http).unwrap();

    let result = engine.resolve(ids(&["0xabc", "0XABC"]), &backend).await;

    assert_eq!(result.records.len(), 1);
    assert_eq!(result.records[0].query_id, "0xabc");
    assert_eq!(result.records[0].receiver_tx_hash.as_deref(), Some("0xrecv"));
    assert_eq!(result.summary.submitted, 1);
    assert_eq!(result.summary.resolved, 1);
}

#[tokio::test]
async fn test_transient_submit_failure_is_retried() {
    let server = MockServer::start().await;

    // Registered first, so it answers the first request only
    Mock::given(method("GET"))
        .and(path("/transactions"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/transactions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("id=job-b;"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .and(query_param("id", "job-b"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAYLOAD))
        .expect(1)
        .mount(&server)
        .await;

    let engine = test_engine(test_config(&server.uri(), "unused.csv"));
    let backend = engine.backend_for(Strategy::Http).unwrap();

    let result = engine.resolve(ids(&["0xB0B"]), &backend).await;

    assert_eq!(result.summary.resolved, 1);
    assert_eq!(result.summary.failed, 0);
    let record = &result.records[0];
    assert_eq!(record.query_id, "0xb0b");
    assert_eq!(record.job_token.as_deref(), Some("job-b"));
    assert_eq!(record.sender_chain.as_deref(), Some("ethereum"));
}

#[tokio::test]
async fn test_missing_token_is_unresolved_without_status_call() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/transactions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>no results</html>"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAYLOAD))
        .expect(0)
        .mount(&server)
        .await;

    let engine = test_engine(test_config(&server.uri(), "unused.csv"));
    let backend = engine.backend_for(Strategy::Http).unwrap();

    let result = engine.resolve(ids(&["0xc0ffee"]), &backend).await;

    assert!(result.records.is_empty());
    assert_eq!(result.summary.unresolved, 1);
    assert_eq!(result.summary.failed, 0);
}

#[tokio::test]
async fn test_persistent_server_error_fails_after_five_attempts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/transactions"))
        .respond_with(ResponseTemplate::new(500))
        .expect(5)
        .mount(&server)
        .await;

    let engine = test_engine(test_config(&server.uri(), "unused.csv"));
    let backend = engine.backend_for(Strategy::Http).unwrap();

    let result = engine.resolve(ids(&["0xdead"]), &backend).await;

    assert!(result.records.is_empty());
    assert_eq!(result.summary.failed, 1);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].attempts, 5);
    assert_eq!(
        result.failures[0].error,
        LookupError::Status {
            stage: "/transactions",
            status: 500
        }
    );
}

#[tokio::test]
async fn test_one_failure_does_not_abort_batch() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/transactions"))
        .and(query_param("s", "0xbad"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/transactions"))
        .and(query_param("s", "0xnone"))
        .respond_with(ResponseTemplate::new(200).set_body_string("empty"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/transactions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("id=job-ok;"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAYLOAD))
        .mount(&server)
        .await;

    let engine = test_engine(test_config(&server.uri(), "unused.csv"));
    let backend = engine.backend_for(Strategy::Http).unwrap();

    let input = ids(&["0x01", "0xbad", "0x02", "0xnone", "0x03"]);
    let result = engine.resolve(input, &backend).await;

    let summary = &result.summary;
    assert_eq!(summary.submitted, 5);
    assert_eq!(summary.resolved, 3);
    assert_eq!(summary.unresolved, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(
        summary.resolved + summary.unresolved + summary.failed,
        summary.submitted
    );

    let order: Vec<&str> = result.records.iter().map(|r| r.query_id.as_str()).collect();
    assert_eq!(order, vec!["0x01", "0x02", "0x03"]);
}

#[tokio::test]
async fn test_session_headers_reach_lookup_service() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/transactions"))
        .and(header("user-agent", "IntegrationTest/1.0"))
        .and(header("cookie", "cf_clearance=test-clearance"))
        .respond_with(ResponseTemplate::new(200).set_body_string("id=job-h;"))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .and(header("cookie", "cf_clearance=test-clearance"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAYLOAD))
        .expect(2)
        .mount(&server)
        .await;

    let engine = test_engine(test_config(&server.uri(), "unused.csv"));
    let backend = engine.backend_for(Strategy::Http).unwrap();

    let result = engine.resolve(ids(&["0x10", "0x20"]), &backend).await;
    assert_eq!(result.summary.resolved, 2);
}
