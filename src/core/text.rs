//! String helpers
//!
//! Host strings are sequences of character codes in `0..=255`, stored either
//! raw (one code per list item) or word-packed.

use crate::codec::{Word, WordCodec};
use crate::config::LayoutConfig;
use crate::error::{Result, WordStoreError};
use serde::Serialize;

/// Flatten a string into its character codes
///
/// # Errors
///
/// `InvalidByte` for the first character whose code point exceeds 255.
pub fn byte_string(value: &str) -> Result<Vec<u8>> {
    value
        .chars()
        .enumerate()
        .map(|(position, c)| {
            u8::try_from(u32::from(c)).map_err(|_| WordStoreError::InvalidByte {
                position,
                value: u32::from(c),
            })
        })
        .collect()
}

/// Rebuild a string from character codes
pub fn latin1_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Word-packed character codes of `value`
pub fn string_words(codec: &WordCodec, value: &str) -> Result<Vec<Word>> {
    Ok(codec.encode(&byte_string(value)?))
}

/// Number of characters in `value`, matching the other string helpers
pub fn string_len(value: &str) -> usize {
    value.chars().count()
}

/// Character code of the first character of `value`
pub fn char_code(value: &str) -> Result<u8> {
    let first = value
        .chars()
        .next()
        .ok_or(WordStoreError::EmptyValue("character"))?;
    u8::try_from(u32::from(first)).map_err(|_| WordStoreError::InvalidByte {
        position: 0,
        value: u32::from(first),
    })
}

/// A string laid out for copying into allocated host memory
///
/// The capacity is the packed word count rounded up to whole memory blocks;
/// `words` holds one write per packed word, starting at offset 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StringAllocation {
    /// Words to allocate
    pub capacity_words: usize,

    /// String length in characters
    pub length: usize,

    /// Packed words to write, in order
    pub words: Vec<Word>,
}

impl StringAllocation {
    pub fn new(codec: &WordCodec, config: &LayoutConfig, value: &str) -> Result<Self> {
        let bytes = byte_string(value)?;
        let bytes_per_block = codec.width() * config.memory_block_size;
        let capacity_words = bytes.len().div_ceil(bytes_per_block) * config.memory_block_size;

        Ok(StringAllocation {
            capacity_words,
            length: bytes.len(),
            words: codec.encode(&bytes),
        })
    }
}
