//! Hierarchical comment index
//!
//! Maintains a forest of comment ranges mirroring a [`CommentStore`]
//! snapshot: each node wraps one range key, a node's parent is the innermost
//! live range containing it, and the children of a node are the maximal
//! ranges directly inside it. The forest is rebuilt against the full
//! snapshot on every refresh; the store may have changed arbitrarily
//! between signals, so no delta is trusted.
//!
//! Nodes are owned by a single keyed map; parent and child links are key
//! lookups into that map, never separate ownership, so removal can not
//! leave a dangling reference.
//!
//! Structural changes are published as [`TreeEvent`]s through [`watch`]
//! subscriptions, each carrying enough information for a passive tree view
//! to insert, delete, or move exactly one row. Events are buffered and
//! drained by the consumer after `refresh` returns; no consumer code runs
//! inside the refresh pass.
//!
//! [`watch`]: CommentTree::watch

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use thiserror::Error;

use super::store::CommentStore;
use super::types::RangeKey;

/// Marker returned by [`CommentTree::display_value`] when the store has no
/// entry for an indexed key, meaning the index and store have
/// desynchronized. That is a defect, not a user error.
pub const MISSING_COMMENT_MARKER: &str = "BUG: unknown key in comment tree";

/// Error type for tree lookups
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TreeError {
    /// The queried range has no node in the index
    ///
    /// Callers must not hold on to keys past their `Removed` event.
    #[error("Range {0} is not present in the comment tree")]
    UnknownKey(RangeKey),
}

/// Result type alias for tree operations
pub type Result<T> = std::result::Result<T, TreeError>;

/// A structural change to the forest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum TreeEvent {
    /// A node was created under `parent` (`None` = root set)
    Added {
        parent: Option<RangeKey>,
        key: RangeKey,
    },
    /// A node was removed from under `parent`
    ///
    /// Emitted children-first: a removed subtree notifies every descendant
    /// before its ancestor, so no event ever names an already-removed
    /// parent.
    Removed {
        parent: Option<RangeKey>,
        key: RangeKey,
    },
    /// A surviving node moved to a different parent
    ///
    /// Raised when a refresh computes a new innermost container for a key
    /// that exists on both sides of the snapshot change.
    Reparented {
        old_parent: Option<RangeKey>,
        new_parent: Option<RangeKey>,
        key: RangeKey,
    },
}

/// Subscription handle for tree events
///
/// Dropping the watcher unsubscribes: its channel closes and the tree
/// prunes the dead sender on the next publish.
pub struct TreeWatcher {
    rx: flume::Receiver<TreeEvent>,
}

impl TreeWatcher {
    /// Take the next pending event, if any
    pub fn try_next(&self) -> Option<TreeEvent> {
        self.rx.try_recv().ok()
    }

    /// Drain all pending events in publication order
    pub fn drain(&self) -> Vec<TreeEvent> {
        self.rx.try_iter().collect()
    }
}

/// Parent and child links for one live range
struct NodeLinks {
    parent: Option<RangeKey>,
    children: BTreeSet<RangeKey>,
}

/// What [`CommentTree::place`] did with an entry
enum Placement {
    Added,
    Reparented,
    Unchanged,
}

/// The comment forest
#[derive(Default)]
pub struct CommentTree {
    /// Owning collection; all links below are keys into this map
    nodes: BTreeMap<RangeKey, NodeLinks>,
    /// Keys with no enclosing live range
    roots: BTreeSet<RangeKey>,
    watchers: Vec<flume::Sender<TreeEvent>>,
}

impl CommentTree {
    /// Create an empty tree; call [`refresh`](Self::refresh) to populate it
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to structural change events
    pub fn watch(&mut self) -> TreeWatcher {
        let (tx, rx) = flume::unbounded();
        self.watchers.push(tx);
        TreeWatcher { rx }
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the forest is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether a range currently has a node
    pub fn contains(&self, key: &RangeKey) -> bool {
        self.nodes.contains_key(key)
    }

    /// Direct children of a node, or the root set for `None`
    ///
    /// Returns an empty vec for a leaf. Querying a key with no node is an
    /// invariant violation.
    pub fn children_of(&self, key: Option<&RangeKey>) -> Result<Vec<RangeKey>> {
        match key {
            None => Ok(self.roots.iter().copied().collect()),
            Some(k) => self
                .nodes
                .get(k)
                .map(|links| links.children.iter().copied().collect())
                .ok_or(TreeError::UnknownKey(*k)),
        }
    }

    /// Parent of a node, or `None` for a root
    ///
    /// Querying a key with no node is an invariant violation.
    pub fn parent_of(&self, key: &RangeKey) -> Result<Option<RangeKey>> {
        self.nodes
            .get(key)
            .map(|links| links.parent)
            .ok_or(TreeError::UnknownKey(*key))
    }

    /// The single-line display text for a node's comment
    ///
    /// Looks the key up in the store and returns the text up to the first
    /// CR or LF. A key missing from the store means the index has fallen
    /// out of sync; that returns [`MISSING_COMMENT_MARKER`] rather than
    /// silently degraded output.
    pub fn display_value(&self, store: &CommentStore, key: &RangeKey) -> String {
        match store.get(key) {
            Some(comment) => comment.first_line().to_string(),
            None => {
                tracing::error!("Comment tree out of sync with store: no entry for {}", key);
                MISSING_COMMENT_MARKER.to_string()
            }
        }
    }

    /// Reconcile the forest with a full store snapshot
    ///
    /// Two passes: prune every node whose key left the store (cascading,
    /// children first), then walk the snapshot in key order re-deriving
    /// containment and inserting missing nodes. Idempotent: refreshing an
    /// unchanged snapshot publishes no events.
    pub fn refresh(&mut self, store: &CommentStore) {
        let removed = self.prune_stale(store);
        let (added, reparented) = self.reconcile(store);

        if added > 0 || removed > 0 || reparented > 0 {
            tracing::debug!(
                "Comment tree refreshed: {} added, {} removed, {} reparented, {} total",
                added,
                removed,
                reparented,
                self.nodes.len()
            );
        }
    }

    /// Remove every node whose key is no longer in the store
    fn prune_stale(&mut self, store: &CommentStore) -> usize {
        let stale: Vec<RangeKey> = self
            .nodes
            .keys()
            .filter(|key| !store.contains_key(key))
            .copied()
            .collect();

        let mut removed = 0;
        for key in stale {
            // An earlier cascade may have taken this key out already
            if self.nodes.contains_key(&key) {
                removed += self.remove_subtree(key);
            }
        }
        removed
    }

    /// Remove a node and all of its descendants, children first
    ///
    /// Collects an explicit post-order deletion list before mutating, so
    /// the owning map is never erased from while being traversed.
    fn remove_subtree(&mut self, key: RangeKey) -> usize {
        let mut doomed = Vec::new();
        self.collect_subtree(key, &mut doomed);

        let mut removed = 0;
        for k in doomed {
            let links = match self.nodes.remove(&k) {
                Some(links) => links,
                None => continue,
            };
            match links.parent {
                Some(parent) => {
                    if let Some(parent_links) = self.nodes.get_mut(&parent) {
                        parent_links.children.remove(&k);
                    }
                }
                None => {
                    self.roots.remove(&k);
                }
            }
            self.publish(TreeEvent::Removed {
                parent: links.parent,
                key: k,
            });
            removed += 1;
        }
        removed
    }

    /// Append the subtree rooted at `key` to `out` in post-order
    fn collect_subtree(&self, key: RangeKey, out: &mut Vec<RangeKey>) {
        if let Some(links) = self.nodes.get(&key) {
            for child in &links.children {
                self.collect_subtree(*child, out);
            }
        }
        out.push(key);
    }

    /// Walk the snapshot in key order, inserting and re-linking nodes
    ///
    /// Entries sharing an offset are processed from largest length to
    /// smallest, so the larger range is established as an ancestor before
    /// the ranges nested at its start are placed. The ancestry stack holds
    /// the currently-open containers, innermost last.
    fn reconcile(&mut self, store: &CommentStore) -> (usize, usize) {
        let keys: Vec<RangeKey> = store.keys().copied().collect();

        let mut open: Vec<RangeKey> = Vec::new();
        let mut added = 0;
        let mut reparented = 0;

        let mut group_start = 0;
        while group_start < keys.len() {
            let offset = keys[group_start].offset;
            let mut group_end = group_start;
            while group_end < keys.len() && keys[group_end].offset == offset {
                group_end += 1;
            }

            // Containers ending at or before this offset can hold nothing
            // further along the document
            while let Some(top) = open.last() {
                if top.end() <= offset {
                    open.pop();
                } else {
                    break;
                }
            }

            for key in keys[group_start..group_end].iter().rev() {
                let parent = open.last().copied();
                match self.place(*key, parent) {
                    Placement::Added => added += 1,
                    Placement::Reparented => reparented += 1,
                    Placement::Unchanged => {}
                }
                open.push(*key);
            }

            group_start = group_end;
        }

        (added, reparented)
    }

    /// Ensure a node exists for `key` with the given parent
    fn place(&mut self, key: RangeKey, parent: Option<RangeKey>) -> Placement {
        let old_parent = match self.nodes.get(&key) {
            Some(links) => links.parent,
            None => {
                self.nodes.insert(
                    key,
                    NodeLinks {
                        parent,
                        children: BTreeSet::new(),
                    },
                );
                self.attach(key, parent);
                self.publish(TreeEvent::Added { parent, key });
                return Placement::Added;
            }
        };

        if old_parent == parent {
            return Placement::Unchanged;
        }

        // The computed innermost container changed while the node stayed
        // live; move it, subtree intact, and tell the view
        self.detach(key, old_parent);
        self.attach(key, parent);
        if let Some(links) = self.nodes.get_mut(&key) {
            links.parent = parent;
        }
        self.publish(TreeEvent::Reparented {
            old_parent,
            new_parent: parent,
            key,
        });
        Placement::Reparented
    }

    fn attach(&mut self, key: RangeKey, parent: Option<RangeKey>) {
        match parent {
            Some(p) => {
                if let Some(links) = self.nodes.get_mut(&p) {
                    links.children.insert(key);
                }
            }
            None => {
                self.roots.insert(key);
            }
        }
    }

    fn detach(&mut self, key: RangeKey, parent: Option<RangeKey>) {
        match parent {
            Some(p) => {
                if let Some(links) = self.nodes.get_mut(&p) {
                    links.children.remove(&key);
                }
            }
            None => {
                self.roots.remove(&key);
            }
        }
    }

    fn publish(&mut self, event: TreeEvent) {
        self.watchers.retain(|tx| tx.send(event).is_ok());
    }
}
