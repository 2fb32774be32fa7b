//! End-to-end reconciliation tests through the ChatContext façade.
//!
//! These cover the merge pass as a whole: optimistic messages superseded by
//! persisted rows, stream placeholders, reasoning fallback across refresh
//! gaps, ordering and idempotence.

mod common;

use std::sync::Arc;

use chatline::cache::{MessageStore, ThreadPhase};
use chatline::display::DisplayCoordinator;
use chatline::models::{DisplayKey, DisplayMessage, StreamStatus};
use common::*;

fn texts(messages: &[DisplayMessage]) -> Vec<&str> {
    messages.iter().map(|m| m.display_text.as_str()).collect()
}

fn assert_sorted(messages: &[DisplayMessage]) {
    for pair in messages.windows(2) {
        assert!(
            pair[0].creation_time() <= pair[1].creation_time(),
            "{} sorts after {}",
            pair[0].id(),
            pair[1].id()
        );
    }
}

#[tokio::test]
async fn test_send_refresh_stream_scenario() {
    let (_backend, mut chat) = mock_context("t1");
    chat.apply_list_snapshot(list_snapshot(
        "t1",
        vec![user_row("m0", "Hi", 0), assistant_row("m1", "Hello", 1)],
    ));
    assert_eq!(chat.display_messages().len(), 2);

    // Optimistic message appears right away
    chat.set_input_value("How are you?");
    chat.send().unwrap();
    chat.settle_send().await.unwrap();
    assert_eq!(chat.display_messages().len(), 3);
    assert!(chat.last_message().is_some_and(DisplayMessage::is_optimistic));
    assert!(chat.is_awaiting_stream());

    // List refresh confirms it without duplicating
    chat.apply_list_snapshot(list_snapshot(
        "t1",
        vec![
            user_row("m0", "Hi", 0),
            assistant_row("m1", "Hello", 1),
            user_row("m2", "How are you?", 2),
        ],
    ));
    assert_eq!(chat.display_messages().len(), 3);
    assert_eq!(texts(chat.display_messages()), vec!["Hi", "Hello", "How are you?"]);
    assert!(chat.store().optimistic_messages().is_empty());
    assert_eq!(chat.store().phase(), ThreadPhase::AwaitingStream);

    // A live stream for the next order adds a fourth, streaming row
    chat.apply_delta_snapshot(delta_snapshot(
        "t1",
        vec![stream_meta("s1", 3, StreamStatus::Streaming)],
        vec![text_delta("s1", 0, "I'm")],
    ));
    let messages = chat.display_messages();
    assert_eq!(messages.len(), 4);
    assert!(messages[3].is_streaming);
    assert_eq!(messages[3].display_text, "I'm");
    assert_eq!(messages[3].order(), Some(3));
    assert!(!chat.is_awaiting_stream());
    assert_sorted(chat.display_messages());
}

#[test]
fn test_recompute_is_idempotent() {
    let mut store = MessageStore::for_thread("t1");
    let mut coordinator = DisplayCoordinator::new();
    let list = list_snapshot(
        "t1",
        vec![user_row("m0", "Hi", 0), assistant_row("m1", "Hello", 1)],
    );
    let deltas = delta_snapshot(
        "t1",
        vec![stream_meta("s1", 2, StreamStatus::Streaming)],
        vec![
            reasoning_delta("s1", 0, "thinking"),
            text_delta("s1", 1, "Par"),
            text_delta("s1", 2, "tial"),
        ],
    );

    let first = coordinator.recompute(&mut store, &list, &deltas).to_vec();
    let second = coordinator.recompute(&mut store, &list, &deltas).to_vec();

    assert_eq!(first, second);
    assert_eq!(first[2].display_text, "Partial");
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_memoized_update_skips_identical_snapshots() {
    let mut store = MessageStore::for_thread("t1");
    let mut coordinator = DisplayCoordinator::new();
    let list = Arc::new(list_snapshot("t1", vec![user_row("m0", "Hi", 0)]));
    let deltas = Arc::new(no_deltas("t1"));

    assert!(coordinator.update(&mut store, &list, &deltas));
    assert!(!coordinator.update(&mut store, &list, &deltas));

    // Equal content in a new Arc is a new publish and recomputes
    let republished = Arc::new((*list).clone());
    assert!(coordinator.update(&mut store, &republished, &deltas));
}

#[tokio::test]
async fn test_no_duplicates_across_interleavings() {
    let (_backend, mut chat) = mock_context("t1");

    chat.set_input_value("one");
    chat.send().unwrap();
    chat.settle_send().await.unwrap();
    chat.set_input_value("two");
    chat.send().unwrap();
    chat.settle_send().await.unwrap();
    assert_eq!(chat.display_messages().len(), 2);

    // Only the first is confirmed so far
    chat.apply_list_snapshot(list_snapshot("t1", vec![user_row("m0", "one", 0)]));
    assert_eq!(texts(chat.display_messages()), vec!["one", "two"]);
    assert_eq!(chat.store().optimistic_messages().len(), 1);

    // A stale page without it does not bring the first back as optimistic
    chat.apply_list_snapshot(list_snapshot("t1", Vec::new()));
    assert_eq!(texts(chat.display_messages()), vec!["two"]);

    chat.apply_list_snapshot(list_snapshot(
        "t1",
        vec![user_row("m0", "one", 0), user_row("m1", "two", 1)],
    ));
    assert_eq!(texts(chat.display_messages()), vec!["one", "two"]);
    assert!(chat.display_messages().iter().all(|m| !m.is_optimistic()));
}

#[test]
fn test_rows_sorted_by_creation_time() {
    let mut store = MessageStore::for_thread("t1");
    let mut coordinator = DisplayCoordinator::new();
    let list = list_snapshot(
        "t1",
        vec![
            assistant_row("m3", "later", 3),
            user_row("m0", "first", 0),
            assistant_row("m1", "second", 1),
            user_row("m2", "third", 2),
        ],
    );

    let messages = coordinator.recompute(&mut store, &list, &no_deltas("t1"));

    assert_eq!(texts(messages), vec!["first", "second", "third", "later"]);
    assert_sorted(messages);
}

#[test]
fn test_reasoning_three_tier_fallback() {
    let mut store = MessageStore::for_thread("t1");
    let mut coordinator = DisplayCoordinator::new();
    let base = vec![user_row("m0", "Why?", 0)];
    let unpersisted = list_snapshot("t1", base.clone());

    // Live reasoning "B" fills the cache
    coordinator.recompute(
        &mut store,
        &unpersisted,
        &delta_snapshot(
            "t1",
            vec![stream_meta("s1", 1, StreamStatus::Streaming)],
            vec![reasoning_delta("s1", 0, "B")],
        ),
    );
    assert_eq!(store.get_cached_reasoning(1), Some("B"));

    // live = "A", persisted = "", cached = "B" -> "A"
    let mut other = DisplayCoordinator::new();
    let messages = other.recompute(
        &mut store,
        &unpersisted,
        &delta_snapshot(
            "t1",
            vec![stream_meta("s2", 1, StreamStatus::Streaming)],
            vec![reasoning_delta("s2", 0, "A")],
        ),
    );
    assert_eq!(messages[1].display_reasoning, "A");
    store.update_reasoning_cache(1, "B");

    // live = "", persisted = "", cached = "B" -> "B"
    let mut unanswered = assistant_row("m1", "", 1);
    unanswered.text = None;
    let messages = coordinator.recompute(
        &mut store,
        &list_snapshot("t1", vec![base[0].clone(), unanswered]),
        &no_deltas("t1"),
    );
    assert_eq!(messages[1].display_reasoning, "B");
    assert!(messages[1].has_reasoning_stream);

    // live = "", persisted = "C", cached = "B" -> "C"
    let messages = coordinator.recompute(
        &mut store,
        &list_snapshot(
            "t1",
            vec![base[0].clone(), assistant_row_with_reasoning("m1", "Because", "C", 1)],
        ),
        &no_deltas("t1"),
    );
    assert_eq!(messages[1].display_reasoning, "C");
    assert!(!messages[1].has_reasoning_stream);
}

#[test]
fn test_reasoning_cache_cleared_once_persisted() {
    let mut store = MessageStore::for_thread("t1");
    let mut coordinator = DisplayCoordinator::new();
    let question = user_row("m0", "Why?", 0);

    coordinator.recompute(
        &mut store,
        &list_snapshot("t1", vec![question.clone()]),
        &delta_snapshot(
            "t1",
            vec![stream_meta("s1", 1, StreamStatus::Streaming)],
            vec![reasoning_delta("s1", 0, "pondering")],
        ),
    );
    assert_eq!(store.get_cached_reasoning(1), Some("pondering"));

    // Refresh gap: the stream is gone, the row not yet persisted
    let messages = coordinator.recompute(
        &mut store,
        &list_snapshot("t1", vec![question.clone()]),
        &no_deltas("t1"),
    );
    assert_eq!(messages.len(), 1);
    assert_eq!(store.get_cached_reasoning(1), Some("pondering"));

    // Persistence catches up
    let messages = coordinator.recompute(
        &mut store,
        &list_snapshot(
            "t1",
            vec![question, assistant_row_with_reasoning("m1", "Because", "pondering", 1)],
        ),
        &no_deltas("t1"),
    );
    assert_eq!(messages[1].display_reasoning, "pondering");
    assert_eq!(store.get_cached_reasoning(1), None);
}

#[test]
fn test_status_cache_bridges_refresh_gap() {
    let mut store = MessageStore::for_thread("t1");
    let mut coordinator = DisplayCoordinator::new();
    let list = list_snapshot(
        "t1",
        vec![user_row("m0", "Hi", 0), assistant_row("m1", "Hel", 1)],
    );

    coordinator.recompute(
        &mut store,
        &list,
        &delta_snapshot(
            "t1",
            vec![stream_meta("s1", 1, StreamStatus::Streaming)],
            vec![text_delta("s1", 0, "Hello")],
        ),
    );
    assert_eq!(store.get_cached_status(1), Some(StreamStatus::Streaming));

    let messages = coordinator.recompute(&mut store, &list, &no_deltas("t1"));
    assert!(messages[1].is_streaming);
    assert_eq!(messages[1].display_text, "Hel");
}

#[test]
fn test_user_text_never_from_stream() {
    let mut store = MessageStore::for_thread("t1");
    let mut coordinator = DisplayCoordinator::new();

    let messages = coordinator.recompute(
        &mut store,
        &list_snapshot("t1", vec![user_row("m0", "Question", 0)]),
        &delta_snapshot(
            "t1",
            vec![stream_meta("s1", 0, StreamStatus::Streaming)],
            vec![text_delta("s1", 0, "streamed")],
        ),
    );

    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].display_text, "Question");
    assert!(!messages[0].is_streaming);
}

#[test]
fn test_reasoning_panel_auto_opens_then_closes() {
    let (_backend, mut chat) = mock_context("t1");
    chat.apply_list_snapshot(list_snapshot("t1", vec![user_row("m0", "Why?", 0)]));
    let key = DisplayKey::Order(1);

    chat.apply_delta_snapshot(delta_snapshot(
        "t1",
        vec![stream_meta("s1", 1, StreamStatus::Streaming)],
        vec![reasoning_delta("s1", 0, "hmm")],
    ));
    assert!(chat.is_reasoning_open(&key));

    chat.apply_delta_snapshot(delta_snapshot(
        "t1",
        vec![stream_meta("s1", 1, StreamStatus::Streaming)],
        vec![reasoning_delta("s1", 0, "hmm"), text_delta("s1", 1, "Because")],
    ));
    assert!(!chat.is_reasoning_open(&key));

    // Manual toggle sticks
    assert!(chat.toggle_reasoning(&key));
    chat.apply_delta_snapshot(delta_snapshot(
        "t1",
        vec![stream_meta("s1", 1, StreamStatus::Streaming)],
        vec![
            reasoning_delta("s1", 0, "hmm"),
            text_delta("s1", 1, "Because"),
            text_delta("s1", 2, "!"),
        ],
    ));
    assert!(chat.is_reasoning_open(&key));
}

#[test]
fn test_thread_switch_resets_and_ignores_stale_snapshots() {
    let (_backend, mut chat) = mock_context("t1");
    chat.apply_list_snapshot(list_snapshot("t1", vec![user_row("m0", "Hi", 0)]));
    assert_eq!(chat.display_messages().len(), 1);

    assert!(chat.set_thread(Some("t2".to_string())));
    assert!(chat.is_empty());

    chat.apply_list_snapshot(list_snapshot("t2", vec![user_row("x0", "Other", 0)]));
    assert_eq!(texts(chat.display_messages()), vec!["Other"]);
}
