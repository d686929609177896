use crate::backend::{BackendError, MemoryBackend};
use crate::list::Lister;
use crate::model::from_millis;
use crate::tail::backoff::BackoffConfig;
use crate::tail::{ManualClock, StreamEnumerator, StreamPattern, TailError};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn enumerator(backend: &Arc<MemoryBackend>) -> StreamEnumerator<MemoryBackend> {
    StreamEnumerator::new(Lister::with_retry(
        backend.clone(),
        Arc::new(ManualClock::new(from_millis(0))),
        BackoffConfig::UNAVAILABLE,
    ))
}

fn backend_with(streams: &[&str]) -> Arc<MemoryBackend> {
    let backend = MemoryBackend::with_page_sizes(2, 100);
    for stream in streams {
        backend.create_stream("app", stream);
    }
    Arc::new(backend)
}

#[test]
fn parse_classifies_patterns() {
    assert!(matches!(StreamPattern::parse("").unwrap(), StreamPattern::All));
    assert!(matches!(StreamPattern::parse("*").unwrap(), StreamPattern::All));
    assert!(matches!(
        StreamPattern::parse("web-1").unwrap(),
        StreamPattern::Exact(name) if name == "web-1"
    ));
    assert!(matches!(
        StreamPattern::parse("web-*").unwrap(),
        StreamPattern::Prefix(prefix) if prefix == "web-"
    ));
    assert!(matches!(
        StreamPattern::parse("web-?").unwrap(),
        StreamPattern::Glob(_)
    ));
    assert!(matches!(
        StreamPattern::parse("*-web").unwrap(),
        StreamPattern::Glob(_)
    ));
}

#[test]
fn glob_patterns_match_whole_names() {
    let pattern = StreamPattern::parse("web-[12]").unwrap();

    assert!(pattern.matches("web-1"));
    assert!(!pattern.matches("web-3"));
    assert!(!pattern.matches("web-12"));
    assert_eq!(pattern.to_string(), "web-[12]");
}

#[tokio::test]
async fn resolves_all_streams_across_listing_pages() {
    // Arrange
    let backend = backend_with(&["a", "b", "c", "d", "e"]);

    // Act
    let streams = enumerator(&backend)
        .resolve("app", &StreamPattern::All)
        .await
        .unwrap();

    // Assert
    assert_eq!(
        streams.into_iter().collect::<Vec<_>>(),
        vec!["a", "b", "c", "d", "e"]
    );
    assert_eq!(backend.counters().list_streams, 3);
}

#[tokio::test]
async fn resolves_prefix_and_glob_patterns() {
    // Arrange
    let backend = backend_with(&["api-1", "web-1", "web-2", "worker"]);
    let enumerator = enumerator(&backend);

    // Act
    let prefixed = enumerator
        .resolve("app", &StreamPattern::parse("web*").unwrap())
        .await
        .unwrap();
    let globbed = enumerator
        .resolve("app", &StreamPattern::parse("*-1").unwrap())
        .await
        .unwrap();

    // Assert
    assert_eq!(
        prefixed.into_iter().collect::<Vec<_>>(),
        vec!["web-1", "web-2"]
    );
    assert_eq!(
        globbed.into_iter().collect::<Vec<_>>(),
        vec!["api-1", "web-1"]
    );
}

#[tokio::test]
async fn exact_pattern_does_not_match_longer_names() {
    // Arrange
    let backend = backend_with(&["web", "web-1"]);

    // Act
    let streams = enumerator(&backend)
        .resolve("app", &StreamPattern::parse("web").unwrap())
        .await
        .unwrap();

    // Assert
    assert_eq!(streams.into_iter().collect::<Vec<_>>(), vec!["web"]);
}

#[tokio::test]
async fn missing_exact_stream_is_an_error() {
    // Arrange
    let backend = backend_with(&["web-1"]);

    // Act
    let err = enumerator(&backend)
        .resolve("app", &StreamPattern::parse("web-9").unwrap())
        .await
        .unwrap_err();

    // Assert
    assert!(matches!(err, TailError::StreamNotFound { stream, .. } if stream == "web-9"));
}

#[tokio::test]
async fn unmatched_prefix_resolves_to_nothing() {
    // Arrange
    let backend = backend_with(&["web-1"]);

    // Act
    let streams = enumerator(&backend)
        .resolve("app", &StreamPattern::parse("db*").unwrap())
        .await
        .unwrap();

    // Assert
    assert!(streams.is_empty());
}

#[tokio::test]
async fn listing_retries_through_brief_outages() {
    // Arrange
    let backend = backend_with(&["web-1"]);
    backend.inject_listing_fault(BackendError::throttled("busy"));
    backend.inject_listing_fault(BackendError::unavailable("blip"));

    // Act
    let streams = enumerator(&backend)
        .resolve("app", &StreamPattern::All)
        .await
        .unwrap();

    // Assert
    assert_eq!(streams.len(), 1);
    assert_eq!(backend.counters().list_streams, 3);
}
