//! Virtual address mapping
//!
//! Imported files may load sections of the buffer at virtual addresses that
//! differ from their file offsets. Each mapping segment associates a run of
//! real (buffer) offsets with a run of virtual addresses; segments do not
//! overlap on either side.

use serde::{Deserialize, Serialize};

/// One contiguous real-to-virtual address mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualSegment {
    /// Buffer offset the segment starts at
    #[serde(rename = "realBase")]
    pub real_base: u64,
    /// Virtual address the segment starts at
    #[serde(rename = "virtBase")]
    pub virt_base: u64,
    /// Segment length in bytes
    pub length: u64,
}

impl VirtualSegment {
    /// Translate a real offset inside this segment, if it falls within
    pub fn real_to_virt(&self, real: u64) -> Option<u64> {
        if real >= self.real_base && real < self.real_base + self.length {
            Some(self.virt_base + (real - self.real_base))
        } else {
            None
        }
    }

    /// Translate a virtual address inside this segment, if it falls within
    pub fn virt_to_real(&self, virt: u64) -> Option<u64> {
        if virt >= self.virt_base && virt < self.virt_base + self.length {
            Some(self.real_base + (virt - self.virt_base))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_within_segment() {
        let seg = VirtualSegment {
            real_base: 4,
            virt_base: 0x8000,
            length: 16,
        };

        assert_eq!(seg.real_to_virt(4), Some(0x8000));
        assert_eq!(seg.real_to_virt(19), Some(0x800f));
        assert_eq!(seg.virt_to_real(0x8005), Some(9));
    }

    #[test]
    fn test_translation_outside_segment() {
        let seg = VirtualSegment {
            real_base: 4,
            virt_base: 0x8000,
            length: 16,
        };

        assert_eq!(seg.real_to_virt(3), None);
        assert_eq!(seg.real_to_virt(20), None);
        assert_eq!(seg.virt_to_real(0x7fff), None);
        assert_eq!(seg.virt_to_real(0x8010), None);
    }
}
