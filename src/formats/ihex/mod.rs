//! Intel HEX import
//!
//! Parses Intel HEX record files (`:llaaaatt<data>cc`) into a document:
//! data records append to the buffer and drive the virtual address mapping,
//! start-address records are recorded as comments on the zero-length range
//! at offset 0, and the file must end with an end-of-file record.
//!
//! Reference: <https://en.wikipedia.org/wiki/Intel_HEX>

mod parser;

pub use parser::{load_hex_file, parse_hex};

use thiserror::Error;

/// Error type for Intel HEX import
#[derive(Debug, Error)]
pub enum ImportError {
    /// Malformed or truncated record
    #[error("Parse error at file position {0}")]
    Parse(usize),

    /// Record bytes did not sum to zero
    #[error("Checksum error at file position {0}")]
    Checksum(usize),

    /// The file ended without an end-of-file record
    #[error("No end of file record found")]
    MissingEndOfFile,

    /// Buffer write failed
    #[error("Document error: {0}")]
    Document(#[from] crate::document::DocumentError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for import operations
pub type Result<T> = std::result::Result<T, ImportError>;
