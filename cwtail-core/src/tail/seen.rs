use crate::model::EventKey;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Keys already handled by a session, ordered so old entries can be dropped
/// once no cursor can fetch them again.
#[derive(Debug, Default)]
pub(crate) struct SeenSet {
    keys: BTreeSet<EventKey>,
}

impl SeenSet {
    pub fn contains(&self, key: &EventKey) -> bool {
        self.keys.contains(key)
    }

    pub fn insert(&mut self, key: EventKey) -> bool {
        self.keys.insert(key)
    }

    /// Forgets every key strictly older than `floor`.
    pub fn prune_below(&mut self, floor: DateTime<Utc>) {
        self.keys = self.keys.split_off(&EventKey::floor(floor));
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }
}
