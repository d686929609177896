use crate::model::{PageToken, ResolvedWindow, from_millis};
use crate::tail::TailSettings;
use crate::tail::cursor::StreamCursor;
use std::time::Duration;

#[test]
fn drained_cursor_advances_horizon_to_fetch_start() {
    let mut cursor = StreamCursor::new("s1", from_millis(0));

    cursor.record_pages(Some(from_millis(500)), None, true, from_millis(1_000));

    assert_eq!(cursor.horizon, from_millis(1_000));
    assert_eq!(cursor.resume_from, from_millis(500));
}

#[test]
fn drained_cursor_with_future_events_moves_past_newest() {
    let mut cursor = StreamCursor::new("s1", from_millis(0));

    cursor.record_pages(Some(from_millis(2_000)), None, true, from_millis(1_000));

    assert_eq!(cursor.horizon, from_millis(2_001));
}

#[test]
fn partial_page_walk_keeps_newest_timestamp_open() {
    let mut cursor = StreamCursor::new("s1", from_millis(0));
    let token = PageToken("next".to_string());

    cursor.record_pages(
        Some(from_millis(700)),
        Some(token.clone()),
        false,
        from_millis(1_000),
    );

    assert_eq!(cursor.horizon, from_millis(700));
    assert_eq!(cursor.next_token, Some(token));
}

#[test]
fn horizon_never_moves_backwards() {
    let mut cursor = StreamCursor::new("s1", from_millis(0));
    cursor.record_pages(None, None, true, from_millis(5_000));

    cursor.record_pages(Some(from_millis(100)), None, false, from_millis(6_000));

    assert_eq!(cursor.horizon, from_millis(5_000));
}

#[test]
fn plan_resumes_from_last_fetched_timestamp() {
    let mut cursor = StreamCursor::new("s1", from_millis(0));
    cursor.record_pages(Some(from_millis(800)), None, true, from_millis(1_000));
    let window = ResolvedWindow {
        start: from_millis(100),
        end: Some(from_millis(9_000)),
    };

    let plan = cursor.plan("app", &window, &TailSettings::default());

    assert_eq!(plan.window.start, from_millis(800));
    assert_eq!(plan.window.end, Some(from_millis(9_000)));
    assert_eq!(plan.stream, "s1");
}

#[test]
fn throttled_cursor_is_due_only_after_its_delay() {
    let mut cursor = StreamCursor::new("s1", from_millis(0));

    cursor.record_throttle(from_millis(1_000), Duration::from_millis(250));

    assert!(!cursor.is_due(from_millis(1_249)));
    assert!(cursor.is_due(from_millis(1_250)));
    assert_eq!(cursor.throttle_attempts, 1);

    cursor.record_success();
    assert!(cursor.is_due(from_millis(0)));
    assert_eq!(cursor.throttle_attempts, 0);
}
