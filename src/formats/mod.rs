//! File format import pipelines
//!
//! Importers parse an external file format into a [`Document`](crate::document::Document):
//! buffer bytes, virtual address mappings, and any comments the format
//! declares. The comment tree never sees a format directly; it only indexes
//! whatever ends up in the document's store.

pub mod ihex;
