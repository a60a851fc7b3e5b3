//! Byte to word codec
//!
//! A word packs `W` bytes most-significant first, so byte `j` of a word
//! contributes `byte * 256^(W - j - 1)`. Encoding pads the final word with
//! zero bytes; decoding always yields whole words, so a buffer whose length
//! is not a multiple of `W` comes back with trailing zeros.

use crate::config::{LayoutConfig, MAX_WORD_WIDTH};
use crate::error::{Result, WordStoreError};

/// A packed word. Values stay below `256^W`.
pub type Word = u64;

/// Radix of one packed digit
const BASE: u64 = 256;

/// Fixed-width word codec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordCodec {
    width: usize,
}

impl WordCodec {
    /// Create a codec for words of `width` bytes
    pub fn new(width: usize) -> Result<Self> {
        if width == 0 || width > MAX_WORD_WIDTH {
            return Err(WordStoreError::InvalidConfig(format!(
                "word_width must be between 1 and {} (got {})",
                MAX_WORD_WIDTH, width
            )));
        }
        Ok(WordCodec { width })
    }

    /// Codec for a validated configuration
    pub fn from_config(config: &LayoutConfig) -> Result<Self> {
        Self::new(config.word_width)
    }

    /// Bytes per word
    pub fn width(&self) -> usize {
        self.width
    }

    /// Exclusive upper bound of word values (`256^W`)
    pub fn word_limit(&self) -> Word {
        BASE.pow(self.width as u32)
    }

    /// Number of words needed for `byte_len` bytes
    pub fn word_count(&self, byte_len: usize) -> usize {
        byte_len.div_ceil(self.width)
    }

    /// Pack bytes into words, zero-filling the last word
    pub fn encode(&self, bytes: &[u8]) -> Vec<Word> {
        bytes
            .chunks(self.width)
            .map(|group| self.encode_word(group))
            .collect()
    }

    /// Pack up to `W` bytes into a single word; missing bytes count as zero
    pub fn encode_word(&self, group: &[u8]) -> Word {
        (0..self.width).fold(0, |word, j| {
            word * BASE + group.get(j).copied().unwrap_or(0) as Word
        })
    }

    /// Unpack words into `W` bytes each
    pub fn decode(&self, words: &[Word]) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(words.len() * self.width);
        for &word in words {
            for j in 0..self.width {
                bytes.push(self.extract_byte(word, j));
            }
        }
        bytes
    }

    /// Byte `j` (0 = most significant) of `word`
    pub fn extract_byte(&self, word: Word, j: usize) -> u8 {
        (self.place_value(j).map_or(0, |place| word / place) % BASE) as u8
    }

    /// Byte extraction using only division and floor, as the host evaluates it
    ///
    /// Computes `floor(v / 256^(W-j-1) - floor(v / 256^(W-j)) * 256)`. For
    /// in-range integer words this agrees with [`WordCodec::extract_byte`];
    /// for fractional or out-of-range values it reproduces the host's result.
    pub fn host_extract_byte(&self, value: f64, j: usize) -> f64 {
        if j >= self.width {
            return 0.0;
        }
        let base = BASE as f64;
        let low = value / base.powi((self.width - j - 1) as i32);
        let high = value / base.powi((self.width - j) as i32);
        (low - high.floor() * base).floor()
    }

    /// `256^(W - j - 1)`, or `None` when `j` is outside the word
    fn place_value(&self, j: usize) -> Option<Word> {
        (j < self.width).then(|| BASE.pow((self.width - j - 1) as u32))
    }
}

impl Default for WordCodec {
    fn default() -> Self {
        WordCodec {
            width: crate::config::DEFAULT_WORD_WIDTH,
        }
    }
}
