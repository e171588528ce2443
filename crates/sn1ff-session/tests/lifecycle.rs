//! Integration tests for the check session lifecycle.
//!
//! These drive `CheckSession` against the mock collector and verify the
//! begin/append/end contract, including recovery from collector failures.

use sn1ff_collector::{CollectorCall, MockCollector, MockFailure};
use sn1ff_core::Sn1ffError;
use sn1ff_session::{CheckSession, RecordWriter, SessionState};
use tempfile::TempDir;

fn record_path(dir: &TempDir, name: &str) -> String {
    dir.path().join(name).to_string_lossy().to_string()
}

#[tokio::test]
async fn test_full_check_run() {
    let dir = TempDir::new().unwrap();
    let handle_str = record_path(&dir, "chk-001");
    let collector = MockCollector::new().with_handle(handle_str.clone());
    let mut session = CheckSession::new(collector.clone());

    let handle = session.begin().await.unwrap();
    assert_eq!(handle.as_str(), handle_str);

    session.append("check A passed").await.unwrap();
    session.append("check B passed").await.unwrap();
    session.end("OKAY", 300).await.unwrap();

    let lines = RecordWriter::new().read_lines(&handle).await.unwrap();
    assert_eq!(lines, vec!["check A passed", "check B passed"]);
    assert_eq!(
        collector.submissions(),
        vec![CollectorCall::Submit {
            handle: handle_str,
            status: "OKAY".to_string(),
            ttl: 300,
        }]
    );
    assert_eq!(session.state(), &SessionState::Closed(handle));
}

#[tokio::test]
async fn test_append_outside_open_has_no_side_effect() {
    let dir = TempDir::new().unwrap();
    let handle_str = record_path(&dir, "chk-002");
    let collector = MockCollector::new().with_handle(handle_str.clone());
    let mut session = CheckSession::new(collector.clone());

    let err = session.append("too early").await.unwrap_err();
    assert!(matches!(err, Sn1ffError::InvalidState { state: "NEW", .. }));
    assert!(collector.calls().is_empty());

    session.begin().await.unwrap();
    session.end("OKAY", 5).await.unwrap();

    let err = session.append("too late").await.unwrap_err();
    assert!(matches!(err, Sn1ffError::InvalidState { state: "CLOSED", .. }));
    assert!(!std::path::Path::new(&handle_str).exists());
    assert_eq!(collector.calls().len(), 2);
}

#[tokio::test]
async fn test_closed_session_never_resubmits() {
    let dir = TempDir::new().unwrap();
    let collector = MockCollector::new().with_handle(record_path(&dir, "chk-003"));
    let mut session = CheckSession::new(collector.clone());

    session.begin().await.unwrap();
    session.end("WARN", 60).await.unwrap();

    let err = session.end("WARN", 60).await.unwrap_err();
    assert!(matches!(err, Sn1ffError::InvalidState { operation: "end", .. }));
    assert_eq!(collector.submissions().len(), 1);
}

#[tokio::test]
async fn test_negative_ttl_makes_no_collector_call() {
    let dir = TempDir::new().unwrap();
    let collector = MockCollector::new().with_handle(record_path(&dir, "chk-004"));
    let mut session = CheckSession::new(collector.clone());
    session.begin().await.unwrap();

    let err = session.end("OKAY", -1).await.unwrap_err();

    assert!(matches!(err, Sn1ffError::InvalidArgument(_)));
    assert!(collector.submissions().is_empty());
    assert_eq!(session.state().name(), "OPEN");
}

#[tokio::test]
async fn test_failed_begin_stays_new_and_can_retry() {
    let dir = TempDir::new().unwrap();
    let collector = MockCollector::new()
        .fail_next_open(MockFailure::Rejected {
            code: 1,
            diagnostic: "Could not begin sn1ff file".to_string(),
        })
        .fail_next_open(MockFailure::Unavailable("timed out after 60s".to_string()))
        .with_handle(record_path(&dir, "chk-005"));
    let mut session = CheckSession::new(collector.clone());

    let err = session.begin().await.unwrap_err();
    assert!(matches!(err, Sn1ffError::CollectorRejected { .. }));
    assert_eq!(session.state(), &SessionState::New);

    let err = session.begin().await.unwrap_err();
    assert!(matches!(err, Sn1ffError::CollectorUnavailable { .. }));
    assert_eq!(session.state(), &SessionState::New);
    assert!(session.handle().is_none());

    let handle = session.begin().await.unwrap();
    assert_eq!(handle.as_str(), record_path(&dir, "chk-005"));
    assert_eq!(collector.calls().len(), 3);
}

#[tokio::test]
async fn test_failed_end_keeps_lines_and_retry_succeeds() {
    let dir = TempDir::new().unwrap();
    let handle_str = record_path(&dir, "chk-006");
    let collector = MockCollector::new()
        .with_handle(handle_str.clone())
        .fail_next_submit(MockFailure::Unavailable("connection refused".to_string()));
    let mut session = CheckSession::new(collector.clone());

    let handle = session.begin().await.unwrap();
    session.append("line A").await.unwrap();
    session.append("line B").await.unwrap();

    let err = session.end("OKAY", 300).await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(session.state(), &SessionState::Open(handle.clone()));

    let writer = RecordWriter::new();
    assert_eq!(writer.read_lines(&handle).await.unwrap(), vec!["line A", "line B"]);

    session.end("OKAY", 300).await.unwrap();
    assert_eq!(session.state(), &SessionState::Closed(handle.clone()));

    let submissions = collector.submissions();
    assert_eq!(submissions.len(), 2);
    assert_eq!(submissions[0], submissions[1]);
    assert_eq!(writer.read_lines(&handle).await.unwrap(), vec!["line A", "line B"]);
}

#[tokio::test]
async fn test_independent_sessions_run_concurrently() {
    let dir = TempDir::new().unwrap();
    let collector = MockCollector::new()
        .with_handle(record_path(&dir, "cpu.snff"))
        .with_handle(record_path(&dir, "disk.snff"));

    let mut tasks = Vec::new();
    for name in ["cpu", "disk"] {
        let collector = collector.clone();
        tasks.push(tokio::spawn(async move {
            let mut session = CheckSession::new(collector);
            session
                .run([format!("{} check passed", name)], "OKAY", 5)
                .await
        }));
    }

    let mut handles = Vec::new();
    for task in tasks {
        handles.push(task.await.unwrap().unwrap());
    }
    handles.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    handles.dedup();

    assert_eq!(handles.len(), 2);
    assert_eq!(collector.submissions().len(), 2);
    for handle in &handles {
        assert_eq!(RecordWriter::new().read_lines(handle).await.unwrap().len(), 1);
    }
}
