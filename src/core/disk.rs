//! Disks: named file collections packed into host word lists
//!
//! A disk collects files until it is exported. Export lays the files out as:
//!
//! - a header table with one record per file (see [`crate::header`]);
//! - the list of occupied block IDs, in allocation order;
//! - the data stream, `BLOCK_SIZE` words per block, block `id` starting at
//!   stream word `(id - 1) * BLOCK_SIZE`, split into `CHUNK`-word lists.
//!
//! Exporting locks the disk. Files are laid out in registration order, so
//! identical registrations always produce identical layouts.

use crate::allocator::{BlockId, BumpAllocator, FIRST_BLOCK_ID};
use crate::codec::{Word, WordCodec};
use crate::config::LayoutConfig;
use crate::error::{Result, WordStoreError};
use crate::header::{HeaderRecord, HeaderTable};
use crate::layout::{ChunkedData, LayoutConstants};
use crate::text::byte_string;
use crate::validation::{normalize_name, HostName};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

/// A file registered on a disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct File {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// A disk being assembled
#[derive(Debug, Clone)]
pub struct Disk {
    name: HostName,
    capacity_bytes: u64,
    files: Vec<File>,
    locked: bool,
}

impl Disk {
    /// Create an empty, unlocked disk
    pub fn new(name: HostName, capacity_bytes: u64) -> Self {
        Disk {
            name,
            capacity_bytes,
            files: Vec::new(),
            locked: false,
        }
    }

    pub fn name(&self) -> &HostName {
        &self.name
    }

    /// Requested capacity in bytes
    pub fn capacity_bytes(&self) -> u64 {
        self.capacity_bytes
    }

    /// Files in registration order
    pub fn files(&self) -> &[File] {
        &self.files
    }

    pub fn file(&self, name: &str) -> Option<&File> {
        let name = normalize_name(name);
        self.files.iter().find(|f| f.name == name)
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Add a file, or replace the bytes of a file with the same name
    ///
    /// A replaced file keeps its original position in registration order.
    ///
    /// # Errors
    ///
    /// `DiskLocked` once the disk has been exported.
    pub fn add_file(&mut self, name: &str, bytes: Vec<u8>) -> Result<()> {
        if self.locked {
            return Err(WordStoreError::DiskLocked(self.name.to_string()));
        }

        let name = normalize_name(name);
        debug!("Adding {} bytes as '{}' on disk {}", bytes.len(), name, self.name);

        match self.files.iter_mut().find(|f| f.name == name) {
            Some(existing) => existing.bytes = bytes,
            None => self.files.push(File { name, bytes }),
        }
        Ok(())
    }

    /// Add a file holding the character codes of `content`
    pub fn add_file_string(&mut self, name: &str, content: &str) -> Result<()> {
        let bytes = byte_string(content)?;
        self.add_file(name, bytes)
    }

    /// Export the disk and lock it
    ///
    /// The disk is only locked when the layout is built successfully; a
    /// failed export leaves it open for further changes. Exporting a locked
    /// disk again yields the same layout.
    pub fn export(&mut self, config: &LayoutConfig) -> Result<DiskLayout> {
        let layout = DiskLayout::build(self, config)?;
        if !self.locked {
            info!(
                "Locked disk {} after exporting {} files",
                self.name,
                self.files.len()
            );
        }
        self.locked = true;
        Ok(layout)
    }
}

/// The exported form of a disk
#[derive(Debug, Clone, Serialize)]
pub struct DiskLayout {
    name: HostName,
    #[serde(skip)]
    codec: WordCodec,
    header: HeaderTable,
    occupied_ids: Vec<BlockId>,
    data: ChunkedData,
    constants: LayoutConstants,
}

impl DiskLayout {
    /// Lay out `disk` without changing its lock state
    pub fn build(disk: &Disk, config: &LayoutConfig) -> Result<Self> {
        config.check_disk_capacity(disk.name.as_str(), disk.capacity_bytes)?;
        let codec = WordCodec::from_config(config)?;
        let bytes_per_block = config.bytes_per_block();

        let mut allocator = BumpAllocator::new();
        let mut header = HeaderTable::new();
        let mut occupied_ids = Vec::new();
        let mut stream: Vec<Word> = Vec::new();

        for file in &disk.files {
            let required_blocks = file.bytes.len().div_ceil(bytes_per_block);
            let ids = allocator.allocate_run(required_blocks)?;

            for block in file.bytes.chunks(bytes_per_block) {
                let mut words = codec.encode(block);
                words.resize(config.block_size, 0);
                stream.extend_from_slice(&words);
            }

            if let (Some(first), Some(last)) = (ids.first(), ids.last()) {
                debug!("File '{}' occupies blocks {}..={}", file.name, first, last);
            }
            occupied_ids.extend_from_slice(&ids);
            header.push(HeaderRecord::new(&codec, config, &file.name, ids)?);
        }

        let num_chunks = config
            .chunks_for_capacity(disk.capacity_bytes)
            .max(stream.len().div_ceil(config.chunk_size))
            .max(1);
        let data = ChunkedData::from_stream(&stream, config.chunk_size, num_chunks);

        info!(
            "Exported disk {}: {} files, {} blocks, {} data chunks",
            disk.name,
            header.len(),
            occupied_ids.len(),
            num_chunks
        );

        Ok(DiskLayout {
            name: disk.name.clone(),
            codec,
            header,
            occupied_ids,
            constants: LayoutConstants {
                word_width: config.word_width,
                chunk_size: config.chunk_size,
                num_chunks,
                header_name_size: Some(config.header_name_size),
                header_blocks_size: config.header_blocks_size,
                header_size: config.disk_header_size(),
                block_size: config.block_size,
            },
            data,
        })
    }

    pub fn name(&self) -> &HostName {
        &self.name
    }

    pub fn header(&self) -> &HeaderTable {
        &self.header
    }

    /// Header table flattened into host words
    pub fn header_words(&self) -> Vec<Word> {
        self.header.to_words()
    }

    /// Occupied block IDs in allocation order
    pub fn occupied_ids(&self) -> &[BlockId] {
        &self.occupied_ids
    }

    pub fn data(&self) -> &ChunkedData {
        &self.data
    }

    pub fn constants(&self) -> &LayoutConstants {
        &self.constants
    }

    /// Host read of data element `index` (1-based)
    pub fn read(&self, index: i64) -> Option<Word> {
        self.data.read(index)
    }

    /// 0-based stream position of the first word of block `id`
    pub fn block_start(&self, id: BlockId) -> Option<usize> {
        id.checked_sub(FIRST_BLOCK_ID)
            .map(|offset| offset as usize * self.constants.block_size)
    }

    /// Decoded contents of a file, padded to whole blocks
    pub fn file_bytes(&self, name: &str) -> Option<Vec<u8>> {
        let name = normalize_name(name);
        let record = self.header.records().iter().find(|r| r.name == name)?;

        let mut bytes = Vec::new();
        for &id in &record.block_ids {
            let start = self.block_start(id)?;
            let words = self.data.words(start, self.constants.block_size)?;
            bytes.extend(self.codec.decode(&words));
        }
        Some(bytes)
    }

    /// SHA-256 over the header, ID list and data chunks
    pub fn fingerprint(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();

        let header_words = self.header_words();
        hasher.update((header_words.len() as u64).to_be_bytes());
        for word in &header_words {
            hasher.update(word.to_be_bytes());
        }

        hasher.update((self.occupied_ids.len() as u64).to_be_bytes());
        for id in &self.occupied_ids {
            hasher.update(id.to_be_bytes());
        }

        hasher.update((self.data.num_chunks() as u64).to_be_bytes());
        for chunk in self.data.chunks() {
            for word in chunk {
                hasher.update(word.to_be_bytes());
            }
        }

        hasher.finalize().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disk(capacity: u64) -> Disk {
        Disk::new(HostName::new("test").unwrap(), capacity)
    }

    #[test]
    fn test_add_file_normalizes_name() {
        let mut disk = disk(0);
        disk.add_file("  README ", vec![1, 2, 3]).unwrap();
        assert_eq!(disk.files()[0].name, "readme");
        assert!(disk.file("Readme").is_some());
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut disk = disk(0);
        disk.add_file("a", vec![1]).unwrap();
        disk.add_file("b", vec![2]).unwrap();
        disk.add_file("A", vec![3, 3]).unwrap();

        let names: Vec<&str> = disk.files().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(disk.files()[0].bytes, vec![3, 3]);
    }

    #[test]
    fn test_export_locks() {
        let config = LayoutConfig::default();
        let mut disk = disk(0);
        disk.add_file("a", vec![1]).unwrap();

        disk.export(&config).unwrap();
        assert!(disk.is_locked());
        assert!(matches!(
            disk.add_file("b", vec![2]),
            Err(WordStoreError::DiskLocked(_))
        ));
    }

    #[test]
    fn test_failed_export_leaves_disk_open() {
        let config = LayoutConfig::default();
        let mut disk = disk(0);
        disk.add_file(&"n".repeat(100), vec![1]).unwrap();

        assert!(matches!(
            disk.export(&config),
            Err(WordStoreError::NameTooLong { .. })
        ));
        assert!(!disk.is_locked());
        assert!(disk.add_file("ok", vec![1]).is_ok());
    }

    #[test]
    fn test_block_payload_is_word_encoded() {
        let config = LayoutConfig::default();
        let mut disk = disk(0);
        disk.add_file("a", vec![1, 2, 3, 4, 5, 6, 7]).unwrap();

        let layout = disk.export(&config).unwrap();
        assert_eq!(layout.occupied_ids(), &[1]);
        assert_eq!(layout.data().word(0), Some(0x0102_0304_0506));
        assert_eq!(layout.data().word(1), Some(0x0700_0000_0000));
        assert_eq!(layout.data().word(2), Some(0));
        assert_eq!(layout.read(1), Some(0x0102_0304_0506));
    }

    #[test]
    fn test_empty_file_has_no_blocks() {
        let config = LayoutConfig::default();
        let mut disk = disk(0);
        disk.add_file("empty", Vec::new()).unwrap();
        disk.add_file("one", vec![9]).unwrap();

        let layout = disk.export(&config).unwrap();
        assert_eq!(layout.header().len(), 2);
        assert!(layout.header().records()[0].block_ids.is_empty());
        assert_eq!(layout.occupied_ids(), &[1]);
        assert_eq!(layout.file_bytes("empty"), Some(Vec::new()));
    }

    #[test]
    fn test_file_bytes_across_blocks() {
        let config = LayoutConfig::default();
        let mut disk = disk(0);
        let content: Vec<u8> = (0..150).map(|i| i as u8).collect();
        disk.add_file("x", vec![42; 10]).unwrap();
        disk.add_file("data.bin", content.clone()).unwrap();

        let layout = disk.export(&config).unwrap();
        assert_eq!(layout.occupied_ids(), &[1, 2, 3, 4]);

        let bytes = layout.file_bytes("DATA.BIN").unwrap();
        assert_eq!(bytes.len(), 180);
        assert_eq!(&bytes[..150], content.as_slice());
        assert!(bytes[150..].iter().all(|&b| b == 0));
        assert_eq!(layout.file_bytes("missing"), None);
    }

    #[test]
    fn test_capacity_sets_chunk_floor() {
        let config = LayoutConfig::default();
        let layout = disk(150_000).export(&config).unwrap();
        assert_eq!(layout.constants().num_chunks, 3);
        assert_eq!(layout.data().num_chunks(), 3);
        assert!(layout.header_words().is_empty());
    }

    #[test]
    fn test_fingerprint_changes_with_content() {
        let config = LayoutConfig::default();
        let mut first = disk(0);
        first.add_file("a", vec![1]).unwrap();
        let mut second = disk(0);
        second.add_file("a", vec![2]).unwrap();

        assert_ne!(
            first.export(&config).unwrap().fingerprint(),
            second.export(&config).unwrap().fingerprint()
        );
    }
}
