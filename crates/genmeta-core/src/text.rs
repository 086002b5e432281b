// File: crates/genmeta-core/src/text.rs

//! Decoding of the three PNG text chunk variants into keyword/value pairs.

use crate::chunk::{ChunkRecord, ChunkType, text_chunks};
use flate2::read::ZlibDecoder;
use std::collections::HashMap;
use std::io::Read;

/// Keyword → text value, last write wins.
pub type MetadataMap = HashMap<String, String>;

/// Upper bound on the inflated size of a single compressed text chunk.
pub const MAX_INFLATED_LEN: u64 = 64 * 1024 * 1024;

/// A decoded keyword/text pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEntry {
    pub keyword: String,
    pub text: String,
}

/// Scans `bytes` and collects every decodable text chunk.
pub fn read_metadata_map(bytes: &[u8]) -> MetadataMap {
    let mut map = MetadataMap::new();
    for chunk in text_chunks(bytes) {
        if let Some(entry) = decode_chunk(&chunk) {
            map.insert(entry.keyword, entry.text);
        }
    }
    map
}

/// Decodes one text chunk, or `None` if it is malformed or cannot be inflated.
pub fn decode_chunk(chunk: &ChunkRecord<'_>) -> Option<TextEntry> {
    let entry = match chunk.chunk_type {
        ChunkType::tEXt => decode_text(chunk.payload),
        ChunkType::zTXt => decode_ztxt(chunk.payload),
        ChunkType::iTXt => decode_itxt(chunk.payload),
        _ => None,
    };
    if entry.is_none() {
        log::debug!("skipping undecodable {} chunk", chunk.chunk_type);
    }
    entry
}

/// `keyword \0 text`
fn decode_text(payload: &[u8]) -> Option<TextEntry> {
    let (keyword, text) = split_keyword(payload)?;
    Some(TextEntry {
        keyword,
        text: decode_latin1_or_utf8(text),
    })
}

/// `keyword \0 method zlib-stream`
fn decode_ztxt(payload: &[u8]) -> Option<TextEntry> {
    let (keyword, rest) = split_keyword(payload)?;
    let (&method, stream) = rest.split_first()?;
    if method != 0 {
        return None;
    }
    let text = inflate(stream)?;
    Some(TextEntry {
        keyword,
        text: decode_latin1_or_utf8(&text),
    })
}

/// `keyword \0 flag method language \0 translated_keyword \0 text`
///
/// The compression flag and method are single bytes, not null-terminated
/// fields, so an uncompressed chunk with empty language and translated
/// keyword has four consecutive nulls after the keyword.
fn decode_itxt(payload: &[u8]) -> Option<TextEntry> {
    let (keyword, rest) = split_keyword(payload)?;
    let [flag, method, rest @ ..] = rest else {
        return None;
    };
    let (_language, rest) = split_at_null(rest)?;
    let (_translated_keyword, text) = split_at_null(rest)?;

    let text = match (*flag, *method) {
        (0, _) => String::from_utf8_lossy(text).into_owned(),
        (1, 0) => String::from_utf8_lossy(&inflate(text)?).into_owned(),
        _ => return None,
    };
    Some(TextEntry { keyword, text })
}

fn split_at_null(bytes: &[u8]) -> Option<(&[u8], &[u8])> {
    let nul = bytes.iter().position(|&b| b == 0)?;
    Some((&bytes[..nul], &bytes[nul + 1..]))
}

fn split_keyword(payload: &[u8]) -> Option<(String, &[u8])> {
    let (keyword, rest) = split_at_null(payload)?;
    if keyword.is_empty() {
        return None;
    }
    Some((decode_latin1_or_utf8(keyword), rest))
}

/// tEXt is nominally Latin-1, but generators routinely write UTF-8 into it.
fn decode_latin1_or_utf8(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_owned(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn inflate(stream: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    let mut decoder = ZlibDecoder::new(stream).take(MAX_INFLATED_LEN + 1);
    if let Err(e) = decoder.read_to_end(&mut out) {
        log::debug!("failed to inflate text chunk: {e}");
        return None;
    }
    if out.len() as u64 > MAX_INFLATED_LEN {
        log::debug!("compressed text chunk exceeds {MAX_INFLATED_LEN} bytes once inflated");
        return None;
    }
    Some(out)
}
