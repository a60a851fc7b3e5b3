//! Layout configuration
//!
//! Word width and chunk size are tied to the host's numeric precision and
//! maximum list length. They are fixed for the lifetime of a session and
//! shared by every disk, memory and dispatch tree it produces.

use crate::allocator::MAX_BLOCK_ID;
use crate::error::{Result, WordStoreError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Bytes per word in the reference host
pub const DEFAULT_WORD_WIDTH: usize = 6;

/// Maximum flat list length in the reference host
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

/// Widest word whose value stays exact inside a 53-bit float mantissa
pub const MAX_WORD_WIDTH: usize = 6;

/// Layout parameters for the word codec, disks and memories
///
/// # Examples
///
/// ```
/// use wordstore::LayoutConfig;
///
/// let config = LayoutConfig::from_toml_str("word_width = 4\nblock_size = 8").unwrap();
/// assert_eq!(config.word_width, 4);
/// assert_eq!(config.bytes_per_block(), 32);
/// assert_eq!(config.chunk_size, 10_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Bytes stored in each word (`W`)
    pub word_width: usize,

    /// Words per host list (`CHUNK`)
    pub chunk_size: usize,

    /// Words reserved for a file name in a disk header record
    pub header_name_size: usize,

    /// Words reserved for a file's block-ID list in a disk header record
    pub header_blocks_size: usize,

    /// Words per disk data block
    pub block_size: usize,

    /// Words reserved for a block-ID list in a memory header record
    pub memory_header_blocks_size: usize,

    /// Words per memory block (also the string allocation granularity)
    pub memory_block_size: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            word_width: DEFAULT_WORD_WIDTH,
            chunk_size: DEFAULT_CHUNK_SIZE,
            header_name_size: 10,
            header_blocks_size: 2,
            block_size: 10,
            memory_header_blocks_size: 2,
            memory_block_size: 5,
        }
    }
}

impl LayoutConfig {
    /// Parse and validate a configuration from TOML text
    ///
    /// Missing keys take their default values.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: LayoutConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Check that every size is usable
    pub fn validate(&self) -> Result<()> {
        if self.word_width == 0 || self.word_width > MAX_WORD_WIDTH {
            return Err(WordStoreError::InvalidConfig(format!(
                "word_width must be between 1 and {} (got {})",
                MAX_WORD_WIDTH, self.word_width
            )));
        }

        let sizes = [
            ("chunk_size", self.chunk_size),
            ("header_name_size", self.header_name_size),
            ("header_blocks_size", self.header_blocks_size),
            ("block_size", self.block_size),
            ("memory_header_blocks_size", self.memory_header_blocks_size),
            ("memory_block_size", self.memory_block_size),
        ];
        for (field, value) in sizes {
            if value == 0 {
                return Err(WordStoreError::InvalidConfig(format!(
                    "{} must be greater than zero",
                    field
                )));
            }
        }

        Ok(())
    }

    /// Bytes carried by one disk data block
    pub fn bytes_per_block(&self) -> usize {
        self.block_size * self.word_width
    }

    /// Words per disk header record: occupancy flag, name, block list
    pub fn disk_header_size(&self) -> usize {
        1 + self.header_name_size + self.header_blocks_size
    }

    /// Words per memory header record: occupancy flag, block list
    pub fn memory_header_size(&self) -> usize {
        1 + self.memory_header_blocks_size
    }

    /// Largest disk capacity the block-ID space can address
    pub fn max_disk_capacity(&self) -> u64 {
        u64::from(MAX_BLOCK_ID) * self.bytes_per_block() as u64
    }

    /// Largest memory capacity the block-ID space can address
    pub fn max_memory_capacity(&self) -> u64 {
        u64::from(MAX_BLOCK_ID) * (self.memory_block_size * self.word_width) as u64
    }

    /// Reject a disk capacity beyond [`LayoutConfig::max_disk_capacity`]
    pub fn check_disk_capacity(&self, name: &str, capacity_bytes: u64) -> Result<()> {
        check_capacity(name, capacity_bytes, self.max_disk_capacity())
    }

    /// Reject a memory capacity beyond [`LayoutConfig::max_memory_capacity`]
    pub fn check_memory_capacity(&self, name: &str, capacity_bytes: u64) -> Result<()> {
        check_capacity(name, capacity_bytes, self.max_memory_capacity())
    }

    /// Number of chunks needed to hold `capacity_bytes` of word-packed data
    ///
    /// Callers bound `capacity_bytes` with the capacity checks first.
    pub fn chunks_for_capacity(&self, capacity_bytes: u64) -> usize {
        let bytes_per_chunk = (self.word_width * self.chunk_size) as u64;
        capacity_bytes.div_ceil(bytes_per_chunk) as usize
    }
}

fn check_capacity(name: &str, capacity_bytes: u64, max_bytes: u64) -> Result<()> {
    if capacity_bytes > max_bytes {
        return Err(WordStoreError::CapacityTooLarge {
            name: name.to_string(),
            capacity_bytes,
            max_bytes,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = LayoutConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.disk_header_size(), 13);
        assert_eq!(config.memory_header_size(), 3);
        assert_eq!(config.bytes_per_block(), 60);
    }

    #[test]
    fn test_word_width_bounds() {
        let mut config = LayoutConfig::default();
        config.word_width = 0;
        assert!(matches!(
            config.validate(),
            Err(WordStoreError::InvalidConfig(_))
        ));

        config.word_width = 7;
        assert!(matches!(
            config.validate(),
            Err(WordStoreError::InvalidConfig(_))
        ));

        config.word_width = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_block_size_rejected() {
        let err = LayoutConfig::from_toml_str("block_size = 0").unwrap_err();
        assert!(err.to_string().contains("block_size"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = LayoutConfig::from_toml_str("chunk_size = 500").unwrap();
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.word_width, DEFAULT_WORD_WIDTH);
        assert_eq!(config.header_name_size, 10);
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            LayoutConfig::from_toml_str("word_width = \"six\""),
            Err(WordStoreError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "word_width = 3").unwrap();
        writeln!(file, "header_blocks_size = 5").unwrap();

        let config = LayoutConfig::load(file.path()).unwrap();
        assert_eq!(config.word_width, 3);
        assert_eq!(config.header_blocks_size, 5);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            LayoutConfig::load("/nonexistent/wordstore.toml"),
            Err(WordStoreError::Io(_))
        ));
    }

    #[test]
    fn test_chunks_for_capacity() {
        let config = LayoutConfig::default();
        assert_eq!(config.chunks_for_capacity(0), 0);
        assert_eq!(config.chunks_for_capacity(1), 1);
        assert_eq!(config.chunks_for_capacity(60_000), 1);
        assert_eq!(config.chunks_for_capacity(60_001), 2);
    }

    #[test]
    fn test_capacity_limits() {
        let config = LayoutConfig::default();
        assert_eq!(config.max_disk_capacity(), 65_535 * 60);
        assert_eq!(config.max_memory_capacity(), 65_535 * 30);

        assert!(config.check_disk_capacity("rom", 65_535 * 60).is_ok());
        assert!(matches!(
            config.check_disk_capacity("rom", 1 << 50),
            Err(WordStoreError::CapacityTooLarge { capacity_bytes, max_bytes, .. })
                if capacity_bytes == 1 << 50 && max_bytes == 3_932_100
        ));
        assert!(matches!(
            config.check_memory_capacity("heap", 65_535 * 30 + 1),
            Err(WordStoreError::CapacityTooLarge { .. })
        ));
    }
}
