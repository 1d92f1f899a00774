//! Annotation module
//!
//! Comments attached to byte ranges of a binary document, and the
//! hierarchical index presented to the user.
//!
//! # Components
//!
//! - [`RangeKey`] / [`Comment`]: the `(offset, length)` key and the value
//!   stored against it
//! - [`CommentStore`]: the authoritative ordered collection, with change
//!   signals
//! - [`CommentTree`]: the forest index, rebuilt from store snapshots,
//!   publishing add/remove/reparent events for a passive tree view
//! - [`display_order`]: presentation-side ordering over range keys

mod order;
mod store;
mod tree;
mod types;

pub use order::{display_order, is_before, SortOrder};
pub use store::{CommentStore, StoreChanged, StoreWatcher};
pub use tree::{
    CommentTree, Result, TreeError, TreeEvent, TreeWatcher, MISSING_COMMENT_MARKER,
};
pub use types::{Comment, RangeKey};
