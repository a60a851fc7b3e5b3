//! Disk header table
//!
//! The header table is a flat word list of fixed-size records, one per file:
//!
//! ```text
//! [occupied = 1][name: HEADER_NAME_SIZE words][block IDs: HEADER_BLOCKS_SIZE words]
//! ```
//!
//! Record `k` therefore starts at word `k * HEADER_SIZE`, which lets host
//! code walk the table with arithmetic alone. The name is the word-encoded
//! character codes, zero-padded. The block list is the file's block IDs as
//! byte pairs, word-encoded and zero-padded; a zero ID ends the list.

use crate::allocator::{block_id_bytes, parse_block_id_bytes, BlockId};
use crate::codec::{Word, WordCodec};
use crate::config::LayoutConfig;
use crate::error::{Result, WordStoreError};
use crate::text::{byte_string, latin1_string};
use serde::Serialize;
use tracing::warn;

/// Occupancy flag of a filled record
pub const OCCUPIED: Word = 1;

/// One file's entry in the header table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderRecord {
    /// File name as registered
    pub name: String,

    /// Every block ID of the file, in order
    pub block_ids: Vec<BlockId>,

    /// Encoded name, padded to `header_name_size` words
    name_words: Vec<Word>,

    /// Encoded block list, padded or capped to `header_blocks_size` words
    block_words: Vec<Word>,
}

impl HeaderRecord {
    /// Build the record for a file occupying `block_ids`
    ///
    /// # Errors
    ///
    /// `NameTooLong` if the encoded name does not fit the name field,
    /// `InvalidByte` if the name contains a character above 255.
    pub fn new(
        codec: &WordCodec,
        config: &LayoutConfig,
        name: &str,
        block_ids: Vec<BlockId>,
    ) -> Result<Self> {
        let mut name_words = codec.encode(&byte_string(name)?);
        if name_words.len() > config.header_name_size {
            return Err(WordStoreError::NameTooLong {
                file: name.to_string(),
                max_words: config.header_name_size,
            });
        }
        name_words.resize(config.header_name_size, 0);

        let mut block_words = codec.encode(&block_id_bytes(&block_ids));
        if block_words.len() > config.header_blocks_size {
            warn!(
                "Block list of '{}' needs {} words; header keeps the first {}",
                name,
                block_words.len(),
                config.header_blocks_size
            );
            block_words.truncate(config.header_blocks_size);
        }
        block_words.resize(config.header_blocks_size, 0);

        Ok(HeaderRecord {
            name: name.to_string(),
            block_ids,
            name_words,
            block_words,
        })
    }

    /// Whether the header's block list holds every block ID
    pub fn is_complete(&self, codec: &WordCodec) -> bool {
        codec.word_count(self.block_ids.len() * 2) <= self.block_words.len()
    }

    /// Append this record's words to `out`
    pub fn write_words(&self, out: &mut Vec<Word>) {
        out.push(OCCUPIED);
        out.extend_from_slice(&self.name_words);
        out.extend_from_slice(&self.block_words);
    }
}

/// A record decoded back from header words
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRecord {
    pub name: String,
    pub block_ids: Vec<BlockId>,
}

/// Ordered collection of header records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HeaderTable {
    records: Vec<HeaderRecord>,
}

impl HeaderTable {
    pub fn new() -> Self {
        HeaderTable {
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, record: HeaderRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[HeaderRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Flatten the table into host words
    pub fn to_words(&self) -> Vec<Word> {
        let mut words = Vec::new();
        for record in &self.records {
            record.write_words(&mut words);
        }
        words
    }

    /// Decode a flat header word list
    ///
    /// Records whose occupancy flag is not set are skipped. A trailing
    /// partial record is ignored.
    pub fn parse(words: &[Word], codec: &WordCodec, config: &LayoutConfig) -> Vec<ParsedRecord> {
        words
            .chunks_exact(config.disk_header_size())
            .filter(|record| record[0] == OCCUPIED)
            .map(|record| {
                let name_end = 1 + config.header_name_size;
                let mut name_bytes = codec.decode(&record[1..name_end]);
                while name_bytes.last() == Some(&0) {
                    name_bytes.pop();
                }
                ParsedRecord {
                    name: latin1_string(&name_bytes),
                    block_ids: parse_block_id_bytes(&codec.decode(&record[name_end..])),
                }
            })
            .collect()
    }
}
