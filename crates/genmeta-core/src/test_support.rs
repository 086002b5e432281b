// File: crates/genmeta-core/src/test_support.rs
//
// Builders for synthetic PNG files used across the unit tests.

use crate::chunk::PNG_SIGNATURE;
use flate2::{Compression, Crc, write::ZlibEncoder};
use std::io::Write;

/// Frames `data` as a complete chunk: length, type, payload and CRC.
pub(crate) fn raw_chunk(chunk_type: [u8; 4], data: &[u8]) -> Vec<u8> {
    let mut crc = Crc::new();
    crc.update(&chunk_type);
    crc.update(data);

    let mut out = Vec::with_capacity(data.len() + 12);
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(&chunk_type);
    out.extend_from_slice(data);
    out.extend_from_slice(&crc.sum().to_be_bytes());
    out
}

pub(crate) fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn join(parts: &[&[u8]]) -> Vec<u8> {
    parts.concat()
}

/// A 1x1 RGBA image with arbitrary chunks placed between IHDR and IDAT.
#[derive(Default)]
pub(crate) struct PngBuilder {
    chunks: Vec<([u8; 4], Vec<u8>)>,
}

impl PngBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn chunk(mut self, chunk_type: [u8; 4], data: &[u8]) -> Self {
        self.chunks.push((chunk_type, data.to_vec()));
        self
    }

    pub(crate) fn text(self, keyword: &str, text: &str) -> Self {
        let data = join(&[keyword.as_bytes(), &[0], text.as_bytes()]);
        self.chunk(*b"tEXt", &data)
    }

    pub(crate) fn ztxt(self, keyword: &str, text: &str) -> Self {
        let data = join(&[keyword.as_bytes(), &[0, 0], &zlib(text.as_bytes())]);
        self.chunk(*b"zTXt", &data)
    }

    pub(crate) fn itxt(self, keyword: &str, text: &str) -> Self {
        self.itxt_full(keyword, false, "", "", text)
    }

    pub(crate) fn itxt_full(
        self,
        keyword: &str,
        compressed: bool,
        language: &str,
        translated_keyword: &str,
        text: &str,
    ) -> Self {
        let body = if compressed {
            zlib(text.as_bytes())
        } else {
            text.as_bytes().to_vec()
        };
        let data = join(&[
            keyword.as_bytes(),
            &[0, compressed as u8, 0],
            language.as_bytes(),
            &[0],
            translated_keyword.as_bytes(),
            &[0],
            &body,
        ]);
        self.chunk(*b"iTXt", &data)
    }

    pub(crate) fn build(self) -> Vec<u8> {
        let mut ihdr = Vec::with_capacity(13);
        ihdr.extend_from_slice(&1u32.to_be_bytes());
        ihdr.extend_from_slice(&1u32.to_be_bytes());
        // 8-bit RGBA, deflate, adaptive filtering, no interlace
        ihdr.extend_from_slice(&[8, 6, 0, 0, 0]);

        let mut out = PNG_SIGNATURE.to_vec();
        out.extend(raw_chunk(*b"IHDR", &ihdr));
        for (chunk_type, data) in &self.chunks {
            out.extend(raw_chunk(*chunk_type, data));
        }
        out.extend(raw_chunk(*b"IDAT", &zlib(&[0, 255, 255, 255, 255])));
        out.extend(raw_chunk(*b"IEND", &[]));
        out
    }
}

/// A PNG carrying a single `tEXt` chunk.
pub(crate) fn png_with_text(keyword: &str, text: &str) -> Vec<u8> {
    PngBuilder::new().text(keyword, text).build()
}
