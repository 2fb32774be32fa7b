//! Fixture replay tests driven through files on disk.

use std::io::Write;

use chatline::cli::replay::run_replay_file;
use tempfile::NamedTempFile;

fn write_fixture(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[tokio::test]
async fn test_replay_send_then_stream() {
    let fixture = write_fixture(
        r#"{
            "threadId": "t1",
            "steps": [
                { "type": "list", "messages": [
                    { "_id": "m1", "_creationTime": 1700000000000, "order": 0, "role": "user", "text": "Hi" },
                    { "_id": "m2", "_creationTime": 1700000001000, "order": 1, "role": "assistant", "text": "Hello!" }
                ] },
                { "type": "send", "text": "How are you?" },
                { "type": "list", "messages": [
                    { "_id": "m1", "_creationTime": 1700000000000, "order": 0, "role": "user", "text": "Hi" },
                    { "_id": "m2", "_creationTime": 1700000001000, "order": 1, "role": "assistant", "text": "Hello!" },
                    { "_id": "m3", "_creationTime": 1700000002000, "order": 2, "role": "user", "text": "How are you?" }
                ] },
                { "type": "deltas",
                  "streams": [{ "streamId": "s1", "order": 3, "status": "streaming" }],
                  "deltas": [{ "streamId": "s1", "start": 0, "end": 1,
                               "parts": [{ "type": "text-delta", "textDelta": "I'm" }] }] }
            ]
        }"#,
    );

    let reports = run_replay_file(fixture.path()).await.unwrap();

    assert_eq!(reports.len(), 4);
    assert_eq!(
        reports[1].lines.last().map(String::as_str),
        Some("user [pending] How are you?")
    );
    assert_eq!(
        reports[3].lines,
        vec![
            "user Hi".to_string(),
            "assistant Hello!".to_string(),
            "user How are you?".to_string(),
            "assistant [streaming] I'm".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_replay_attach_reports_no_notifications() {
    let fixture = write_fixture(
        r#"{
            "threadId": "t1",
            "steps": [
                { "type": "attach", "name": "notes.txt", "content": "hello" },
                { "type": "send", "text": "See attached" }
            ]
        }"#,
    );

    let reports = run_replay_file(fixture.path()).await.unwrap();

    assert!(reports[0].notifications.is_empty());
    assert_eq!(reports[1].lines, vec!["user [pending] See attached".to_string()]);
}

#[tokio::test]
async fn test_replay_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.json");

    let err = run_replay_file(&missing).await.unwrap_err();

    assert!(err.to_string().contains("Failed to read fixture"));
}

#[tokio::test]
async fn test_replay_invalid_json() {
    let fixture = write_fixture("{ not json");

    let err = run_replay_file(fixture.path()).await.unwrap_err();

    assert!(err.to_string().contains("Invalid fixture"));
}
