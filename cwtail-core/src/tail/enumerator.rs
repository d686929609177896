use crate::backend::LogBackend;
use crate::list::Lister;
use crate::tail::TailError;
use std::collections::BTreeSet;
use std::fmt;

const GLOB_META: &[char] = &['*', '?', '['];

/// Which streams of a group a tail covers.
#[derive(Debug, Clone)]
pub enum StreamPattern {
    All,
    Exact(String),
    /// `name*`: resolved with a server-side prefix listing.
    Prefix(String),
    Glob(glob::Pattern),
}

impl StreamPattern {
    pub fn parse(raw: &str) -> Result<Self, TailError> {
        let raw = raw.trim();
        if raw.is_empty() || raw == "*" {
            return Ok(Self::All);
        }

        let Some(first_meta) = raw.find(GLOB_META) else {
            return Ok(Self::Exact(raw.to_string()));
        };

        if first_meta == raw.len() - 1 && raw.ends_with('*') {
            return Ok(Self::Prefix(raw[..first_meta].to_string()));
        }

        glob::Pattern::new(raw)
            .map(Self::Glob)
            .map_err(|source| TailError::InvalidStreamPattern {
                pattern: raw.to_string(),
                source,
            })
    }

    pub fn matches(&self, stream: &str) -> bool {
        match self {
            StreamPattern::All => true,
            StreamPattern::Exact(name) => stream == name,
            StreamPattern::Prefix(prefix) => stream.starts_with(prefix.as_str()),
            StreamPattern::Glob(pattern) => pattern.matches(stream),
        }
    }

    /// Literal prefix every matching stream shares, used to narrow the listing.
    fn listing_prefix(&self) -> Option<String> {
        let prefix = match self {
            StreamPattern::All => return None,
            StreamPattern::Exact(name) => name.as_str(),
            StreamPattern::Prefix(prefix) => prefix.as_str(),
            StreamPattern::Glob(pattern) => {
                let raw = pattern.as_str();
                raw.find(GLOB_META).map_or(raw, |i| &raw[..i])
            }
        };
        (!prefix.is_empty()).then(|| prefix.to_string())
    }
}

impl fmt::Display for StreamPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamPattern::All => f.write_str("*"),
            StreamPattern::Exact(name) => f.write_str(name),
            StreamPattern::Prefix(prefix) => write!(f, "{prefix}*"),
            StreamPattern::Glob(pattern) => f.write_str(pattern.as_str()),
        }
    }
}

/// Resolves a [`StreamPattern`] against the live stream listing of a group.
pub struct StreamEnumerator<B> {
    lister: Lister<B>,
}

impl<B: LogBackend> StreamEnumerator<B> {
    pub fn new(lister: Lister<B>) -> Self {
        Self { lister }
    }

    pub async fn resolve(
        &self,
        group: &str,
        pattern: &StreamPattern,
    ) -> Result<BTreeSet<String>, TailError> {
        let mut listing = self
            .lister
            .streams_with_prefix(group, pattern.listing_prefix());

        let mut streams = BTreeSet::new();
        while let Some(name) = listing.next().await {
            let name = name?;
            if pattern.matches(&name) {
                streams.insert(name);
            }
        }

        if let StreamPattern::Exact(name) = pattern {
            if streams.is_empty() {
                return Err(TailError::StreamNotFound {
                    group: group.to_string(),
                    stream: name.clone(),
                });
            }
        }

        tracing::debug!(group, %pattern, resolved = streams.len(), "streams resolved");
        Ok(streams)
    }
}
