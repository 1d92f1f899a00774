//! In-memory comment storage
//!
//! The authoritative collection of comments, keyed by byte range and
//! iterated in key order (offset ascending, then length ascending). Every
//! mutation raises a payload-free change signal; consumers re-read the full
//! snapshot rather than trusting a delta.
//!
//! The store guarantees key uniqueness by construction. It does not validate
//! the non-overlap contract between distinct ranges; callers inserting
//! comments are responsible for keeping ranges nested-or-disjoint.

use std::collections::BTreeMap;

use super::types::{Comment, RangeKey};

/// Fire-and-forget signal that the store changed in some way
///
/// Carries no payload; the comment tree always reconciles against the full
/// snapshot, so signals coalesce freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreChanged;

/// Subscription handle for store change signals
///
/// Dropping the watcher unsubscribes: its channel closes and the store
/// prunes the dead sender on the next notification.
pub struct StoreWatcher {
    rx: flume::Receiver<StoreChanged>,
}

impl StoreWatcher {
    /// Drain pending signals, returning whether any arrived
    pub fn has_changed(&self) -> bool {
        self.rx.try_iter().count() > 0
    }
}

/// Ordered collection of comments keyed by byte range
#[derive(Debug, Default)]
pub struct CommentStore {
    entries: BTreeMap<RangeKey, Comment>,
    watchers: Vec<flume::Sender<StoreChanged>>,
}

impl CommentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the comment for a range
    ///
    /// Returns the previous comment if the key was already present.
    pub fn set(&mut self, key: RangeKey, comment: Comment) -> Option<Comment> {
        let previous = self.entries.insert(key, comment);
        self.notify();
        previous
    }

    /// Remove the comment for a range, if present
    pub fn remove(&mut self, key: &RangeKey) -> Option<Comment> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.notify();
        }
        removed
    }

    /// Remove all comments
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            self.entries.clear();
            self.notify();
        }
    }

    /// Look up the comment for a range
    pub fn get(&self, key: &RangeKey) -> Option<&Comment> {
        self.entries.get(key)
    }

    /// Whether a range currently has a comment
    pub fn contains_key(&self, key: &RangeKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Snapshot iteration in key order
    pub fn iter(&self) -> impl Iterator<Item = (&RangeKey, &Comment)> {
        self.entries.iter()
    }

    /// Keys in snapshot order
    pub fn keys(&self) -> impl Iterator<Item = &RangeKey> {
        self.entries.keys()
    }

    /// Number of comments
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no comments
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Subscribe to change signals
    pub fn watch(&mut self) -> StoreWatcher {
        let (tx, rx) = flume::unbounded();
        self.watchers.push(tx);
        StoreWatcher { rx }
    }

    fn notify(&mut self) {
        self.watchers.retain(|tx| tx.send(StoreChanged).is_ok());
    }
}
