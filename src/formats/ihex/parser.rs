//! Intel HEX record parser
//!
//! Records are located by scanning for `:`; anything between records is
//! ignored. Every record is read as hex byte pairs with a running checksum
//! that must sum to zero over the whole record. Consecutive data records
//! with contiguous virtual addresses accumulate into one mapping segment; a
//! jump in the virtual address flushes the segment and starts another.

use std::fs;
use std::path::Path;

use crate::annotations::Comment;
use crate::document::Document;

use super::{ImportError, Result};

/// Data record: bytes to append at the current virtual address
const RECORD_DATA: u8 = 0x00;
/// End-of-file record; required, terminates parsing
const RECORD_EOF: u8 = 0x01;
/// Extended segment address: payload * 16 becomes the address base
const RECORD_EXT_SEGMENT_ADDR: u8 = 0x02;
/// Start segment address: recorded as a comment, not mapped
const RECORD_START_SEGMENT_ADDR: u8 = 0x03;
/// Extended linear address: payload << 16 becomes the address base
const RECORD_EXT_LINEAR_ADDR: u8 = 0x04;
/// Start linear address: recorded as a comment, not mapped
const RECORD_START_LINEAR_ADDR: u8 = 0x05;

/// Import an Intel HEX file from disk
///
/// Titles the document "<basename> (imported)" and resets it to clean, so
/// the freshly imported state does not read as unsaved changes.
pub fn load_hex_file(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref();
    let data = fs::read(path)?;
    let mut doc = parse_hex(&data)?;

    let basename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    doc.set_title(format!("{} (imported)", basename));
    doc.reset_to_clean();

    tracing::info!(
        "Imported {}: {} bytes, {} mapping segments, {} comments",
        path.display(),
        doc.buffer_length(),
        doc.virt_mappings().len(),
        doc.comments().len()
    );
    Ok(doc)
}

/// Parse Intel HEX records into a document
pub fn parse_hex(data: &[u8]) -> Result<Document> {
    let mut doc = Document::new();

    let mut base_address: u64 = 0;
    let mut found_eof = false;

    // Contiguous run of data records accumulating into one mapping segment
    let mut real_base: u64 = 0;
    let mut virt_base: u64 = 0;
    let mut seg_length: u64 = 0;

    let mut pos = 0;
    while let Some(colon) = data[pos..].iter().position(|&b| b == b':') {
        let record_start = pos + colon;
        let mut reader = RecordReader::new(data, record_start + 1);

        let count = reader.read_byte()?;
        let address = reader.read_u16()?;
        let record_type = reader.read_byte()?;

        let mut payload = [0u8; 255];
        for slot in payload.iter_mut().take(count as usize) {
            *slot = reader.read_byte()?;
        }
        let payload = &payload[..count as usize];

        // The checksum byte folds into the running sum, which must wrap
        // to zero over the whole record
        reader.read_byte()?;
        if reader.checksum != 0 {
            return Err(ImportError::Checksum(record_start));
        }

        match record_type {
            RECORD_DATA => {
                let real_offset = doc.buffer_length();
                let virt_addr = base_address + address as u64;

                if virt_base + seg_length != virt_addr {
                    if seg_length > 0 {
                        doc.set_virt_mapping(real_base, virt_base, seg_length);
                    }
                    real_base = real_offset;
                    virt_base = virt_addr;
                    seg_length = 0;
                }

                doc.insert_data(real_offset, payload)?;
                seg_length += count as u64;
            }
            RECORD_EOF => {
                found_eof = true;
            }
            RECORD_EXT_SEGMENT_ADDR => {
                if count != 2 {
                    return Err(ImportError::Parse(reader.pos));
                }
                base_address = (((payload[0] as u64) << 8) | payload[1] as u64) * 16;
            }
            RECORD_START_SEGMENT_ADDR => {
                if count != 4 {
                    return Err(ImportError::Parse(reader.pos));
                }
                doc.set_comment(
                    0,
                    0,
                    Comment::new(format!(
                        "Start Segment Address = {:02X}{:02X}{:02X}{:02X}",
                        payload[0], payload[1], payload[2], payload[3]
                    )),
                );
            }
            RECORD_EXT_LINEAR_ADDR => {
                if count != 2 {
                    return Err(ImportError::Parse(reader.pos));
                }
                base_address = (((payload[0] as u64) << 8) | payload[1] as u64) << 16;
            }
            RECORD_START_LINEAR_ADDR => {
                if count != 4 {
                    return Err(ImportError::Parse(reader.pos));
                }
                doc.set_comment(
                    0,
                    0,
                    Comment::new(format!(
                        "Start Linear Address = {:02X}{:02X}{:02X}{:02X}",
                        payload[0], payload[1], payload[2], payload[3]
                    )),
                );
            }
            other => {
                tracing::debug!(
                    "Skipping unknown record type {:#04x} at file position {}",
                    other,
                    record_start
                );
            }
        }

        if found_eof {
            break;
        }
        pos = reader.pos;
    }

    if seg_length > 0 {
        doc.set_virt_mapping(real_base, virt_base, seg_length);
    }

    if !found_eof {
        return Err(ImportError::MissingEndOfFile);
    }

    Ok(doc)
}

/// Hex byte-pair reader over one record, accumulating the checksum
struct RecordReader<'a> {
    data: &'a [u8],
    pos: usize,
    checksum: u8,
}

impl<'a> RecordReader<'a> {
    fn new(data: &'a [u8], pos: usize) -> Self {
        Self {
            data,
            pos,
            checksum: 0,
        }
    }

    fn read_byte(&mut self) -> Result<u8> {
        if self.pos + 2 > self.data.len() {
            return Err(ImportError::Parse(self.pos));
        }
        let hi = hex_nibble(self.data[self.pos]).ok_or(ImportError::Parse(self.pos))?;
        let lo = hex_nibble(self.data[self.pos + 1]).ok_or(ImportError::Parse(self.pos + 1))?;
        self.pos += 2;

        let byte = (hi << 4) | lo;
        self.checksum = self.checksum.wrapping_add(byte);
        Ok(byte)
    }

    fn read_u16(&mut self) -> Result<u16> {
        let b1 = self.read_byte()?;
        let b2 = self.read_byte()?;
        Ok(((b1 as u16) << 8) | b2 as u16)
    }
}

fn hex_nibble(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
