//! End-to-end runs: CSV input, mocked lookups, CSV and SQLite output

use crate::common::{test_config, test_engine, PAYLOAD};
use bridge_resolver::input::CsvSource;
use bridge_resolver::output::{CsvSink, SinkWriter, SqliteSink};
use bridge_resolver::Strategy;
use std::fs;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HEADER: &str = "query_tx_hash,sender_tx_hash,receiver_tx_hash,sender_address,receiver_address,sender_chain,receiver_chain,bridge_type,status,job_id";

async fn mount_service(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/transactions"))
        .and(query_param("s", "0xmissing"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/transactions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("id=job-1;"))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAYLOAD))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_csv_to_csv_and_sqlite() {
    let server = MockServer::start().await;
    mount_service(&server).await;

    let dir = TempDir::new().unwrap();
    let input_path = dir.path().join("export.csv");
    fs::write(
        &input_path,
        "block,Tx Hash,amount\n1,0xAAA,10\n2,,20\n3,0xmissing,30\n4,0xaaa,40\n5,0xBBB,50\n",
    )
    .unwrap();

    let csv_path = dir.path().join("out/pairs.csv");
    let db_path = dir.path().join("out/pairs.db");

    let engine = test_engine(test_config(&server.uri(), &csv_path.display().to_string()));
    let backend = engine.backend_for(Strategy::Http).unwrap();
    let source = CsvSource::new(&input_path, "tx hash");

    let mut sinks: Vec<Box<dyn SinkWriter>> = vec![
        Box::new(CsvSink::new(&csv_path)),
        Box::new(SqliteSink::open(&db_path).unwrap()),
    ];

    let result = engine.run_with(&source, &mut sinks, &backend).await.unwrap();
    drop(sinks);

    assert_eq!(result.summary.submitted, 3);
    assert_eq!(result.summary.resolved, 2);
    assert_eq!(result.summary.unresolved, 1);

    let written = fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], HEADER);
    assert_eq!(
        lines[1],
        "0xaaa,0xsend,0xrecv,0xA1,0xB2,ethereum,base,cctp,succeeded,job-1"
    );
    assert!(lines[2].starts_with("0xbbb,"));

    let db = SqliteSink::open(&db_path).unwrap();
    assert_eq!(db.count().unwrap(), 2);
    let stored = db.load_records().unwrap();
    let ids: Vec<&str> = stored.iter().map(|r| r.query_id.as_str()).collect();
    assert!(ids.contains(&"0xaaa"));
    assert!(ids.contains(&"0xbbb"));
    assert_eq!(stored[0].sender_chain.as_deref(), Some("ethereum"));
}

#[tokio::test]
async fn test_empty_input_writes_header_only() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let input_path = dir.path().join("export.csv");
    fs::write(&input_path, "tx_hash\n\n  \n").unwrap();
    let csv_path = dir.path().join("pairs.csv");

    let engine = test_engine(test_config(&server.uri(), &csv_path.display().to_string()));
    let backend = engine.backend_for(Strategy::Http).unwrap();
    let source = CsvSource::new(&input_path, "tx_hash");
    let mut sinks: Vec<Box<dyn SinkWriter>> = vec![Box::new(CsvSink::new(&csv_path))];

    let result = engine.run_with(&source, &mut sinks, &backend).await.unwrap();

    assert!(result.is_empty());
    assert_eq!(result.summary.submitted, 0);
    assert_eq!(fs::read_to_string(&csv_path).unwrap().trim_end(), HEADER);
}

#[tokio::test]
async fn test_missing_column_fails_before_any_lookup() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let input_path = dir.path().join("export.csv");
    fs::write(&input_path, "hash,amount\n0x01,1\n").unwrap();
    let csv_path = dir.path().join("pairs.csv");

    let engine = test_engine(test_config(&server.uri(), &csv_path.display().to_string()));
    let backend = engine.backend_for(Strategy::Http).unwrap();
    let source = CsvSource::new(&input_path, "tx_hash");
    let mut sinks: Vec<Box<dyn SinkWriter>> = vec![Box::new(CsvSink::new(&csv_path))];

    let err = engine
        .run_with(&source, &mut sinks, &backend)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("tx_hash"));
    assert!(!csv_path.exists());
}
