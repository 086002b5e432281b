// File: crates/genmeta-core/src/chunk.rs

use std::fmt;

/// Length of the PNG file signature that precedes the first chunk.
pub const SIGNATURE_LEN: usize = 8;

/// The 8-byte PNG file signature.
pub const PNG_SIGNATURE: [u8; SIGNATURE_LEN] = [137, 80, 78, 71, 13, 10, 26, 10];

// length (4) + type (4)
const HEADER_LEN: usize = 8;
const CRC_LEN: usize = 4;

/// A four byte chunk type tag, such as `tEXt`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkType(pub [u8; 4]);

#[allow(non_upper_case_globals)]
impl ChunkType {
    pub const tEXt: Self = Self(*b"tEXt");
    pub const iTXt: Self = Self(*b"iTXt");
    pub const zTXt: Self = Self(*b"zTXt");

    /// Whether this chunk carries keyword/text metadata.
    pub fn is_text(self) -> bool {
        self == Self::tEXt || self == Self::iTXt || self == Self::zTXt
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            let c = if b.is_ascii_graphic() { b as char } else { '?' };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkType({self})")
    }
}

/// One chunk of a PNG stream, borrowed from the scanned buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRecord<'a> {
    pub chunk_type: ChunkType,
    pub payload: &'a [u8],
}

/// Lazily walks the chunks of a PNG byte buffer.
///
/// Neither the signature nor the CRCs are checked. The walk ends as soon as
/// fewer than eight bytes remain or a chunk declares more payload than the
/// buffer holds, so truncated files simply yield fewer chunks.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    bytes: &'a [u8],
    cursor: usize,
}

impl<'a> Chunks<'a> {
    /// Pass the full file bytes; the signature is skipped, not validated.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            cursor: SIGNATURE_LEN,
        }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = ChunkRecord<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.bytes.get(self.cursor..)?;
        if rest.len() < HEADER_LEN {
            self.cursor = self.bytes.len();
            return None;
        }

        let length = u32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]]) as usize;
        let chunk_type = ChunkType([rest[4], rest[5], rest[6], rest[7]]);

        let Some(payload) = length
            .checked_add(HEADER_LEN)
            .and_then(|end| rest.get(HEADER_LEN..end))
        else {
            log::debug!(
                "{chunk_type} chunk at offset {} declares {length} bytes past the end of the buffer",
                self.cursor
            );
            self.cursor = self.bytes.len();
            return None;
        };

        // A missing CRC on the final chunk just ends the walk on the next call.
        self.cursor = self
            .cursor
            .saturating_add(HEADER_LEN + length)
            .saturating_add(CRC_LEN);

        Some(ChunkRecord {
            chunk_type,
            payload,
        })
    }
}

/// Only the chunks that carry textual metadata (`tEXt`, `iTXt`, `zTXt`).
pub fn text_chunks(bytes: &[u8]) -> impl Iterator<Item = ChunkRecord<'_>> {
    Chunks::new(bytes).filter(|chunk| chunk.chunk_type.is_text())
}

/// Whether `bytes` begins with the PNG signature.
pub fn has_png_signature(bytes: &[u8]) -> bool {
    bytes.len() >= SIGNATURE_LEN && bytes[..SIGNATURE_LEN] == PNG_SIGNATURE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{PngBuilder, raw_chunk};

    #[test]
    fn walks_every_chunk_in_order() {
        let bytes = PngBuilder::new()
            .text("Author", "someone")
            .chunk(*b"tIME", &[0; 7])
            .build();

        let types: Vec<String> = Chunks::new(&bytes)
            .map(|c| c.chunk_type.to_string())
            .collect();
        assert_eq!(types, ["IHDR", "tEXt", "tIME", "IDAT", "IEND"]);
    }

    #[test]
    fn text_chunks_skips_everything_else() {
        let bytes = PngBuilder::new()
            .text("a", "1")
            .chunk(*b"pHYs", &[0; 9])
            .ztxt("b", "2")
            .itxt("c", "3")
            .build();

        let types: Vec<ChunkType> = text_chunks(&bytes).map(|c| c.chunk_type).collect();
        assert_eq!(types, [ChunkType::tEXt, ChunkType::zTXt, ChunkType::iTXt]);
    }

    #[test]
    fn payload_is_exactly_the_declared_length() {
        let bytes = PngBuilder::new().text("k", "value").build();
        let chunk = text_chunks(&bytes).next().unwrap();
        assert_eq!(chunk.payload, b"k\0value");
    }

    #[test]
    fn stops_when_declared_length_runs_past_the_buffer() {
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend(raw_chunk(*b"tEXt", b"a\0b"));
        // Claims 1000 bytes but carries only 3.
        bytes.extend_from_slice(&1000u32.to_be_bytes());
        bytes.extend_from_slice(b"tEXtabc");

        let chunks: Vec<_> = Chunks::new(&bytes).collect();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].payload, b"a\0b");
    }

    #[test]
    fn survives_maximum_declared_length() {
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend_from_slice(&u32::MAX.to_be_bytes());
        bytes.extend_from_slice(b"tEXt");
        bytes.extend_from_slice(b"xyz");

        assert_eq!(Chunks::new(&bytes).count(), 0);
    }

    #[test]
    fn stops_with_fewer_than_eight_bytes_left() {
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend(raw_chunk(*b"tEXt", b"a\0b"));
        bytes.extend_from_slice(&[0, 0, 0]);

        assert_eq!(Chunks::new(&bytes).count(), 1);
    }

    #[test]
    fn tolerates_a_missing_final_crc() {
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend_from_slice(&3u32.to_be_bytes());
        bytes.extend_from_slice(b"tEXta\0b");

        let chunks: Vec<_> = Chunks::new(&bytes).collect();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].payload, b"a\0b");
    }

    #[test]
    fn short_and_empty_inputs_yield_nothing() {
        assert_eq!(Chunks::new(&[]).count(), 0);
        assert_eq!(Chunks::new(&PNG_SIGNATURE[..5]).count(), 0);
        assert_eq!(Chunks::new(&PNG_SIGNATURE).count(), 0);
    }

    #[test]
    fn signature_check() {
        assert!(has_png_signature(&PngBuilder::new().build()));
        assert!(!has_png_signature(&[0xFF, 0xD8, 0xFF, 0xE0]));
        assert!(!has_png_signature(&PNG_SIGNATURE[..7]));
    }

    #[test]
    fn chunk_type_display_masks_non_ascii() {
        assert_eq!(ChunkType::iTXt.to_string(), "iTXt");
        assert_eq!(ChunkType([b'a', 0, b'c', 0xFF]).to_string(), "a?c?");
    }
}
