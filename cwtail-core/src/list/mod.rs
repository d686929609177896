//! Group and stream enumeration.

use crate::backend::{BackendError, ListGroupsRequest, ListStreamsRequest, LogBackend, Page};
use crate::model::PageToken;
use crate::tail::backoff::{BackoffConfig, is_transient, retry_with_backoff};
use crate::tail::{Clock, SystemClock, TailError};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;


pub struct Lister<B> {
    backend: Arc<B>,
    clock: Arc<dyn Clock>,
    retry: BackoffConfig,
}

impl<B: LogBackend> Lister<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self::with_retry(backend, Arc::new(SystemClock), BackoffConfig::UNAVAILABLE)
    }

    pub fn with_retry(backend: Arc<B>, clock: Arc<dyn Clock>, retry: BackoffConfig) -> Self {
        Self {
            backend,
            clock,
            retry,
        }
    }

    pub fn groups(&self, prefix: Option<String>) -> Listing<B> {
        self.listing(ListingKind::Groups { prefix })
    }

    pub fn streams(&self, group: &str) -> Listing<B> {
        self.streams_with_prefix(group, None)
    }

    pub fn streams_with_prefix(&self, group: &str, prefix: Option<String>) -> Listing<B> {
        self.listing(ListingKind::Streams {
            group: group.to_string(),
            prefix,
        })
    }

    fn listing(&self, kind: ListingKind) -> Listing<B> {
        Listing {
            backend: self.backend.clone(),
            clock: self.clock.clone(),
            retry: self.retry,
            kind,
            token: None,
            buffer: VecDeque::new(),
            seen: HashSet::new(),
            exhausted: false,
        }
    }
}

enum ListingKind {
    Groups {
        prefix: Option<String>,
    },
    Streams {
        group: String,
        prefix: Option<String>,
    },
}

/// Lazily paged sequence of names.
///
/// Pages are fetched on demand. Names repeated across pages are yielded once.
pub struct Listing<B> {
    backend: Arc<B>,
    clock: Arc<dyn Clock>,
    retry: BackoffConfig,
    kind: ListingKind,
    token: Option<PageToken>,
    buffer: VecDeque<String>,
    seen: HashSet<String>,
    exhausted: bool,
}

impl<B: LogBackend> Listing<B> {
    pub async fn next(&mut self) -> Option<Result<String, TailError>> {
        loop {
            if let Some(name) = self.buffer.pop_front() {
                return Some(Ok(name));
            }
            if self.exhausted {
                return None;
            }

            let page = match self.fetch_page().await {
                Ok(page) => page,
                Err(e) => {
                    self.exhausted = true;
                    return Some(Err(e.into()));
                }
            };

            for name in page.items {
                if self.seen.insert(name.clone()) {
                    self.buffer.push_back(name);
                }
            }

            match page.next_token {
                Some(next) if Some(&next) == self.token.as_ref() => {
                    tracing::warn!("listing returned the same page token twice; stopping");
                    self.exhausted = true;
                }
                Some(next) => self.token = Some(next),
                None => self.exhausted = true,
            }
        }
    }

    pub async fn collect_all(mut self) -> Result<Vec<String>, TailError> {
        let mut names = Vec::new();
        while let Some(name) = self.next().await {
            names.push(name?);
        }
        Ok(names)
    }

    async fn fetch_page(&self) -> Result<Page<String>, BackendError> {
        let backend = &self.backend;
        let token = &self.token;

        let result = match &self.kind {
            ListingKind::Groups { prefix } => {
                retry_with_backoff(&self.retry, self.clock.as_ref(), is_transient, || {
                    backend.list_groups(ListGroupsRequest {
                        prefix: prefix.clone(),
                        token: token.clone(),
                    })
                })
                .await
            }
            ListingKind::Streams { group, prefix } => {
                retry_with_backoff(&self.retry, self.clock.as_ref(), is_transient, || {
                    backend.list_streams(ListStreamsRequest {
                        group: group.clone(),
                        prefix: prefix.clone(),
                        token: token.clone(),
                    })
                })
                .await
            }
        };

        result.into_result()
    }
}
