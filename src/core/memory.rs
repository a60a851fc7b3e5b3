//! Memories: pre-sized, initially empty word regions
//!
//! A memory has no files. Exporting it only produces the scaffolding a host
//! program needs to allocate and write into it at run time: empty header and
//! ID lists, enough empty data chunks for the requested capacity, and the
//! sizing constants.

use crate::codec::Word;
use crate::config::LayoutConfig;
use crate::error::Result;
use crate::layout::{ChunkedData, LayoutConstants};
use crate::validation::HostName;
use serde::Serialize;
use tracing::info;

/// A registered memory region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memory {
    name: HostName,
    capacity_bytes: u64,
}

impl Memory {
    pub fn new(name: HostName, capacity_bytes: u64) -> Self {
        Memory {
            name,
            capacity_bytes,
        }
    }

    pub fn name(&self) -> &HostName {
        &self.name
    }

    pub fn capacity_bytes(&self) -> u64 {
        self.capacity_bytes
    }

    /// Produce the memory's scaffolding
    ///
    /// Independent of anything written before, so it may be called any
    /// number of times.
    ///
    /// # Errors
    ///
    /// `CapacityTooLarge` if the capacity exceeds what block IDs address.
    pub fn export(&self, config: &LayoutConfig) -> Result<MemoryLayout> {
        config.check_memory_capacity(self.name.as_str(), self.capacity_bytes)?;
        let num_chunks = config.chunks_for_capacity(self.capacity_bytes).max(1);
        info!(
            "Exported memory {}: {} bytes in {} data chunks",
            self.name, self.capacity_bytes, num_chunks
        );

        Ok(MemoryLayout {
            name: self.name.clone(),
            data: ChunkedData::unpopulated(config.chunk_size, num_chunks),
            constants: LayoutConstants {
                word_width: config.word_width,
                chunk_size: config.chunk_size,
                num_chunks,
                header_name_size: None,
                header_blocks_size: config.memory_header_blocks_size,
                header_size: config.memory_header_size(),
                block_size: config.memory_block_size,
            },
        })
    }
}

/// The exported form of a memory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryLayout {
    name: HostName,
    data: ChunkedData,
    constants: LayoutConstants,
}

impl MemoryLayout {
    pub fn name(&self) -> &HostName {
        &self.name
    }

    /// Always empty: the host fills the header at run time
    pub fn header_words(&self) -> Vec<Word> {
        Vec::new()
    }

    /// Always empty: the host fills the ID list at run time
    pub fn occupied_ids(&self) -> Vec<Word> {
        Vec::new()
    }

    pub fn data(&self) -> &ChunkedData {
        &self.data
    }

    pub fn constants(&self) -> &LayoutConstants {
        &self.constants
    }
}
