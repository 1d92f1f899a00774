//! Hexnote
//!
//! An annotation engine for binary documents: comments attached to byte
//! ranges, an ordered comment store with change signals, and a hierarchical
//! comment index that stays synchronized with the store and feeds a passive
//! tree view through granular events.
//!
//! # Modules
//!
//! - `annotations`: range keys, comments, the ordered store, and the
//!   comment tree (the core index)
//! - `document`: the byte buffer under annotation, with virtual address
//!   mappings and an owned comment store
//! - `formats`: import pipelines that populate documents (Intel HEX)
//!
//! # Flow
//!
//! A mutation of the [`CommentStore`] raises a payload-free change signal;
//! the consumer reacts by calling [`CommentTree::refresh`], which reconciles
//! the forest against the full snapshot and publishes `Added` / `Removed` /
//! `Reparented` events to its watchers. Lookups on keys that already left
//! the tree fail loudly rather than returning empty data.

pub mod annotations;
pub mod document;
pub mod formats;

pub use annotations::{
    display_order, Comment, CommentStore, CommentTree, RangeKey, SortOrder, TreeError, TreeEvent,
};
pub use document::Document;
