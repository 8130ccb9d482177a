//! Integration test: local HTTP server, curl fetcher, real ledger on disk.
//!
//! Runs a batch against a server with good, missing, and erroring paths,
//! then checks files, ledger contents, and that a second run resumes nothing.

mod common;

use std::collections::BTreeMap;
use std::time::Duration;

use common::http_server::{self, Routes};
use urlbatch_core::fetcher::{CurlFetcher, ErrorKind};
use urlbatch_core::ledger::{self, Outcome, LEDGER_FILENAME};
use urlbatch_core::{Batch, BatchOptions, Dispatcher, ProgressEvent};

fn options() -> BatchOptions {
    BatchOptions {
        error_threshold: 1000,
        cooldown: Duration::ZERO,
        timeout: Duration::from_secs(10),
        milestone_every: 0,
    }
}

#[test]
fn batch_downloads_and_resumes() {
    let image: Vec<u8> = (0u8..=255).cycle().take(32 * 1024).collect();
    let server = http_server::start(
        Routes::new()
            .body("/img/a.jpg", &image)
            .body("/img/b.jpg", b"bbb")
            .body("/dice", b"<html>dice</html>")
            .status("/broken", 500),
    );
    let out = tempfile::tempdir().unwrap();

    let locators = vec![
        server.url("/img/a.jpg"),
        server.url("/img/b.jpg"),
        server.url("/dice"),
        server.url("/img/a.jpg"),
        server.url("/missing.png"),
        server.url("/broken"),
    ];
    let batch = Batch::new(locators.clone(), None, out.path(), options()).unwrap();
    assert_eq!(batch.remaining_count().unwrap(), 5, "duplicate locator dropped");

    let fetcher = CurlFetcher::new(&BTreeMap::new()).unwrap();
    let (tx, mut rx) = tokio::sync::mpsc::channel(64);
    let summary = Dispatcher::new(&fetcher)
        .with_progress(tx)
        .run(&batch, 3)
        .unwrap();
    assert_eq!(summary.succeeded, 3);
    assert_eq!(summary.failed, 2);

    assert_eq!(std::fs::read(out.path().join("a.jpg")).unwrap(), image);
    assert_eq!(std::fs::read(out.path().join("b.jpg")).unwrap(), b"bbb");
    assert_eq!(
        std::fs::read(out.path().join("dice")).unwrap(),
        b"<html>dice</html>"
    );
    assert!(!out.path().join("missing.png").exists());
    assert!(!out.path().join("broken").exists());
    assert_eq!(server.hits("/img/a.jpg"), 1);

    let mut statuses = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        if let ProgressEvent::Failed { status, kind, .. } = ev {
            statuses.push((status, kind));
        }
    }
    statuses.sort_by_key(|(s, _)| *s);
    assert_eq!(
        statuses,
        vec![
            (Some(404), ErrorKind::Status(404)),
            (Some(500), ErrorKind::Status(500)),
        ]
    );

    let entries = ledger::load(&out.path().join(LEDGER_FILENAME)).unwrap();
    assert_eq!(entries.len(), 5);
    assert_eq!(
        entries.iter().filter(|e| e.outcome == Outcome::Success).count(),
        3
    );

    // Same input in a fresh process: nothing left to do.
    let rerun = Batch::new(locators, None, out.path(), options()).unwrap();
    assert_eq!(rerun.remaining_count().unwrap(), 0);
    let again = Dispatcher::new(&fetcher).run(&rerun, 2).unwrap();
    assert_eq!(again.processed(), 0);
    assert_eq!(server.hits("/img/a.jpg"), 1);
    assert_eq!(server.hits("/broken"), 1);
}

#[test]
fn batch_headers_sent_with_every_request() {
    let server = http_server::start(
        Routes::new()
            .body("/one", b"1")
            .body("/two", b"2")
            .require_header("X-Batch-Token", "s3cret"),
    );
    let out = tempfile::tempdir().unwrap();
    let locators = vec![server.url("/one"), server.url("/two")];

    let without = tempfile::tempdir().unwrap();
    let batch = Batch::new(locators.clone(), None, without.path(), options()).unwrap();
    let plain = CurlFetcher::new(&BTreeMap::new()).unwrap();
    let summary = Dispatcher::new(&plain).run(&batch, 1).unwrap();
    assert_eq!(summary.failed, 2);

    let mut headers = BTreeMap::new();
    headers.insert("X-Batch-Token".to_string(), "s3cret".to_string());
    let fetcher = CurlFetcher::new(&headers).unwrap();
    let batch = Batch::new(
        locators,
        Some(vec!["first.bin".into(), "second.bin".into()]),
        out.path(),
        options(),
    )
    .unwrap();
    let summary = Dispatcher::new(&fetcher).run(&batch, 1).unwrap();
    assert_eq!(summary.succeeded, 2);
    assert_eq!(std::fs::read(out.path().join("first.bin")).unwrap(), b"1");
    assert_eq!(std::fs::read(out.path().join("second.bin")).unwrap(), b"2");
}

#[test]
fn throttled_status_classified() {
    let server = http_server::start(Routes::new().status("/busy", 429));
    let out = tempfile::tempdir().unwrap();
    let batch = Batch::new(vec![server.url("/busy")], None, out.path(), options()).unwrap();
    let fetcher = CurlFetcher::new(&BTreeMap::new()).unwrap();
    let (tx, mut rx) = tokio::sync::mpsc::channel(8);
    Dispatcher::new(&fetcher).with_progress(tx).run(&batch, 1).unwrap();
    match rx.try_recv().unwrap() {
        ProgressEvent::Failed { status, kind, .. } => {
            assert_eq!(status, Some(429));
            assert_eq!(kind, ErrorKind::Throttled);
        }
        other => panic!("unexpected event {:?}", other),
    }
}
