//! Binary document abstraction
//!
//! A document is the byte buffer under annotation: raw data, the virtual
//! addresses that data was declared to load at, a title, a dirty flag, and
//! the comments attached to its byte ranges. Import pipelines write into
//! this surface; the comment tree reads from its store.

mod virt;

pub use virt::VirtualSegment;

use thiserror::Error;

use crate::annotations::{Comment, CommentStore, RangeKey};

/// Error type for document buffer operations
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DocumentError {
    /// A buffer access fell outside the document
    #[error("Range {offset:#x}+{length} is outside the document buffer")]
    OutOfRange {
        /// Requested start offset
        offset: u64,
        /// Requested length
        length: u64,
    },
}

/// Result type alias for document operations
pub type Result<T> = std::result::Result<T, DocumentError>;

/// A binary document with its annotations
#[derive(Debug, Default)]
pub struct Document {
    data: Vec<u8>,
    comments: CommentStore,
    virt_map: Vec<VirtualSegment>,
    title: Option<String>,
    dirty: bool,
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document over existing bytes
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    /// Current buffer length in bytes
    pub fn buffer_length(&self) -> u64 {
        self.data.len() as u64
    }

    /// Insert bytes at an offset, shifting everything after it
    ///
    /// Inserting exactly at the end appends.
    pub fn insert_data(&mut self, offset: u64, bytes: &[u8]) -> Result<()> {
        let at = usize::try_from(offset).map_err(|_| DocumentError::OutOfRange {
            offset,
            length: bytes.len() as u64,
        })?;
        if at > self.data.len() {
            return Err(DocumentError::OutOfRange {
                offset,
                length: bytes.len() as u64,
            });
        }
        self.data.splice(at..at, bytes.iter().copied());
        self.dirty = true;
        Ok(())
    }

    /// Read a slice of the buffer
    pub fn read_data(&self, offset: u64, length: u64) -> Result<&[u8]> {
        let start = usize::try_from(offset);
        let len = usize::try_from(length);
        match (start, len) {
            (Ok(start), Ok(len)) if start.checked_add(len).is_some_and(|e| e <= self.data.len()) => {
                Ok(&self.data[start..start + len])
            }
            _ => Err(DocumentError::OutOfRange { offset, length }),
        }
    }

    /// Record that a run of buffer offsets loads at a virtual address
    pub fn set_virt_mapping(&mut self, real_base: u64, virt_base: u64, length: u64) {
        self.virt_map.push(VirtualSegment {
            real_base,
            virt_base,
            length,
        });
        self.dirty = true;
    }

    /// The recorded virtual mapping segments, in declaration order
    pub fn virt_mappings(&self) -> &[VirtualSegment] {
        &self.virt_map
    }

    /// Translate a buffer offset to its virtual address, if mapped
    pub fn real_to_virt(&self, real: u64) -> Option<u64> {
        self.virt_map.iter().find_map(|seg| seg.real_to_virt(real))
    }

    /// Translate a virtual address to its buffer offset, if mapped
    pub fn virt_to_real(&self, virt: u64) -> Option<u64> {
        self.virt_map.iter().find_map(|seg| seg.virt_to_real(virt))
    }

    /// The comments attached to this document
    pub fn comments(&self) -> &CommentStore {
        &self.comments
    }

    /// Mutable access to the comment store
    ///
    /// Mutations raise the store's change signal; the caller is responsible
    /// for refreshing any comment tree watching it.
    pub fn comments_mut(&mut self) -> &mut CommentStore {
        self.dirty = true;
        &mut self.comments
    }

    /// Attach a comment to the range `[offset, offset+length)`
    pub fn set_comment(&mut self, offset: u64, length: u64, comment: Comment) {
        self.comments.set(RangeKey::new(offset, length), comment);
        self.dirty = true;
    }

    /// Document title, if one was set
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Set the document title
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Whether the document has unsaved changes
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark the current state as clean (e.g. after import or save)
    pub fn reset_to_clean(&mut self) {
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_read() {
        let mut doc = Document::new();
        doc.insert_data(0, b"hello").unwrap();
        doc.insert_data(5, b" world").unwrap();
        doc.insert_data(5, b",").unwrap();

        assert_eq!(doc.buffer_length(), 12);
        assert_eq!(doc.read_data(0, 12).unwrap(), b"hello, world");
        assert_eq!(doc.read_data(7, 5).unwrap(), b"world");
    }

    #[test]
    fn test_out_of_range() {
        let mut doc = Document::from_bytes(vec![0u8; 8]);

        assert_eq!(
            doc.insert_data(9, b"x"),
            Err(DocumentError::OutOfRange { offset: 9, length: 1 })
        );
        assert_eq!(
            doc.read_data(4, 5),
            Err(DocumentError::OutOfRange { offset: 4, length: 5 })
        );
    }

    #[test]
    fn test_virtual_mapping_lookup() {
        let mut doc = Document::from_bytes(vec![0u8; 32]);
        doc.set_virt_mapping(0, 0x1000, 16);
        doc.set_virt_mapping(16, 0x8000, 16);

        assert_eq!(doc.real_to_virt(0), Some(0x1000));
        assert_eq!(doc.real_to_virt(20), Some(0x8004));
        assert_eq!(doc.virt_to_real(0x100f), Some(15));
        assert_eq!(doc.virt_to_real(0x2000), None);
    }

    #[test]
    fn test_store_signal_drives_tree_refresh() {
        use crate::annotations::CommentTree;

        let mut doc = Document::from_bytes(vec![0u8; 64]);
        let watcher = doc.comments_mut().watch();
        let mut tree = CommentTree::new();

        doc.set_comment(0, 64, Comment::new("whole file"));
        doc.set_comment(8, 4, Comment::new("length field"));
        assert!(watcher.has_changed());
        tree.refresh(doc.comments());

        assert_eq!(
            tree.parent_of(&RangeKey::new(8, 4)).unwrap(),
            Some(RangeKey::new(0, 64))
        );

        doc.comments_mut().remove(&RangeKey::new(0, 64));
        assert!(watcher.has_changed());
        tree.refresh(doc.comments());

        assert_eq!(tree.parent_of(&RangeKey::new(8, 4)).unwrap(), None);
    }

    #[test]
    fn test_comments_and_dirty_flag() {
        let mut doc = Document::new();
        assert!(!doc.is_dirty());

        doc.set_comment(0, 4, Comment::new("file magic"));
        assert!(doc.is_dirty());
        assert_eq!(
            doc.comments().get(&RangeKey::new(0, 4)).unwrap().text,
            "file magic"
        );

        doc.reset_to_clean();
        assert!(!doc.is_dirty());
    }
}
