//! Block-ID allocation
//!
//! Blocks are never freed, so IDs come from a bump counter: monotonically
//! increasing, never reused. ID 0 is reserved as the "no block" sentinel
//! that fills unused slots of a header block list, so the first ID handed
//! out is 1. IDs are serialized as two bytes, which caps a disk at 65535
//! blocks.

use crate::error::{Result, WordStoreError};

/// Identifier of a data block within one disk
pub type BlockId = u16;

/// Sentinel marking an empty slot in a block-ID list
pub const NO_BLOCK: BlockId = 0;

/// First ID handed out by a fresh allocator
pub const FIRST_BLOCK_ID: BlockId = 1;

/// Largest representable block ID
pub const MAX_BLOCK_ID: BlockId = BlockId::MAX;

/// Monotonic block-ID allocator
#[derive(Debug, Clone)]
pub struct BumpAllocator {
    /// Next ID to hand out; one past `MAX_BLOCK_ID` once exhausted
    next: u32,
}

impl BumpAllocator {
    pub fn new() -> Self {
        BumpAllocator {
            next: FIRST_BLOCK_ID as u32,
        }
    }

    /// Allocate a single block ID
    pub fn allocate(&mut self) -> Result<BlockId> {
        if self.next > MAX_BLOCK_ID as u32 {
            return Err(WordStoreError::BlockIdSpaceExhausted {
                limit: MAX_BLOCK_ID as u32,
            });
        }
        let id = self.next as BlockId;
        self.next += 1;
        Ok(id)
    }

    /// Allocate `count` consecutive IDs
    ///
    /// Either every ID is allocated or none is.
    pub fn allocate_run(&mut self, count: usize) -> Result<Vec<BlockId>> {
        if count > self.remaining() {
            return Err(WordStoreError::BlockIdSpaceExhausted {
                limit: MAX_BLOCK_ID as u32,
            });
        }
        (0..count).map(|_| self.allocate()).collect()
    }

    /// Number of IDs handed out so far
    pub fn allocated(&self) -> usize {
        (self.next - FIRST_BLOCK_ID as u32) as usize
    }

    /// Number of IDs still available
    pub fn remaining(&self) -> usize {
        (MAX_BLOCK_ID as u32 + 1 - self.next) as usize
    }
}

impl Default for BumpAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialize block IDs as big-endian byte pairs (`id / 256`, `id % 256`)
pub fn block_id_bytes(ids: &[BlockId]) -> Vec<u8> {
    ids.iter().flat_map(|id| id.to_be_bytes()).collect()
}

/// Parse byte pairs back into block IDs, stopping at the first sentinel
pub fn parse_block_id_bytes(bytes: &[u8]) -> Vec<BlockId> {
    bytes
        .chunks_exact(2)
        .map(|pair| BlockId::from_be_bytes([pair[0], pair[1]]))
        .take_while(|&id| id != NO_BLOCK)
        .collect()
}
