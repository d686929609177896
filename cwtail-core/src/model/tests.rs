use crate::model::{EventId, EventKey, TimeWindow, from_millis};
use crate::tail::TailError;

#[test]
fn window_rejects_start_after_end() {
    let err = TimeWindow::new(Some(from_millis(2_000)), Some(from_millis(1_000))).unwrap_err();
    assert!(matches!(err, TailError::InvalidRange { .. }));
}

#[test]
fn window_rejects_empty_range() {
    let err = TimeWindow::new(Some(from_millis(1_000)), Some(from_millis(1_000))).unwrap_err();
    assert!(matches!(err, TailError::InvalidRange { .. }));
}

#[test]
fn window_with_open_start_resolves_to_now() {
    let now = from_millis(50_000);
    let window = TimeWindow::new(None, Some(from_millis(10_000))).unwrap();

    let resolved = window.resolve(now);

    assert_eq!(resolved.start, now);
    assert_eq!(resolved.end, Some(from_millis(10_000)));
    // Empty once resolved, but not an error: the tail simply finds nothing.
    assert!(!resolved.contains(from_millis(20_000)));
}

#[test]
fn resolved_window_is_half_open() {
    let window = TimeWindow::new(Some(from_millis(100)), Some(from_millis(200))).unwrap();
    let resolved = window.resolve(from_millis(0));

    assert!(!resolved.contains(from_millis(99)));
    assert!(resolved.contains(from_millis(100)));
    assert!(resolved.contains(from_millis(199)));
    assert!(!resolved.contains(from_millis(200)));
}

#[test]
fn unbounded_window_has_no_end() {
    let resolved = TimeWindow::unbounded().resolve(from_millis(7));
    assert!(resolved.contains(from_millis(i64::MAX / 4)));
}

#[test]
fn event_keys_order_by_timestamp_then_stream_then_id() {
    let key = |ts: i64, stream: &str, id: &str| EventKey {
        timestamp: from_millis(ts),
        stream: stream.to_string(),
        id: EventId::from(id),
    };

    let mut keys = vec![
        key(20, "a", "1"),
        key(10, "b", "1"),
        key(10, "a", "2"),
        key(10, "a", "1"),
    ];
    keys.sort();

    assert_eq!(
        keys,
        vec![
            key(10, "a", "1"),
            key(10, "a", "2"),
            key(10, "b", "1"),
            key(20, "a", "1"),
        ]
    );
    assert!(EventKey::floor(from_millis(10)) < key(10, "a", "1"));
}
