//! # wordstore - Word-Packed Storage Layouts for Numeric Hosts
//!
//! `wordstore` generates storage for host languages whose only values are
//! numbers and flat lists of numbers. Bytes are packed into fixed-width
//! numeric words, files are laid out on named disks as header tables plus
//! chunked block data, and string comparisons are compiled into decision
//! trees over packed words.
//!
//! ## Quick Start
//!
//! ```rust
//! use wordstore::{render, Result, Session};
//!
//! # fn main() -> Result<()> {
//! let mut session = Session::new();
//!
//! // Register a disk and put some files on it
//! session.register_disk("rom", 4096)?;
//! session.add_file_string("rom", "greeting.txt", "Hello, World!")?;
//! session.add_file_bytes("rom", "table.bin", vec![1, 2, 3, 4])?;
//!
//! // Export locks the disk and produces its word lists
//! let layout = session.export_disk("rom")?;
//! assert_eq!(layout.occupied_ids(), &[1, 2]);
//!
//! // Splice the generated host source into the program
//! let source = render::disk(&layout)?;
//! assert!(source.contains("DISK_rom_HEADER_SIZE"));
//! # Ok(())
//! # }
//! ```
//!
//! ## String Dispatch
//!
//! ```rust
//! use wordstore::{DispatchCase, DispatchCases, Result, Session, Target};
//!
//! # fn main() -> Result<()> {
//! let mut session = Session::new();
//! let cases = DispatchCases::new(
//!     vec![
//!         DispatchCase::new("go", "go();"),
//!         DispatchCase::new("get", "get();"),
//!         DispatchCase::new("got", "got();"),
//!     ],
//!     Some("none();".to_string()),
//! )?;
//!
//! let program = session.compile_dispatch("s_ptr", "s_len", cases)?;
//! assert_eq!(program.tree.select_str("get")?, Target::Case(1));
//! assert_eq!(program.tree.select_str("xyz")?, Target::Default);
//! # Ok(())
//! # }
//! ```

pub mod core;

// Re-export core modules internally so crate:: paths in core still work
pub(crate) use core::{
    allocator, codec, config, disk, dispatch, error, header, layout, memory, text, validation,
};

pub use crate::core::allocator::{BlockId, FIRST_BLOCK_ID, MAX_BLOCK_ID, NO_BLOCK};
pub use crate::core::codec::{Word, WordCodec};
pub use crate::core::config::LayoutConfig;
pub use crate::core::disk::{Disk, DiskLayout, File};
pub use crate::core::dispatch::{
    DispatchArg, DispatchCase, DispatchCases, DispatchNode, DispatchProgram, DispatchTree, Target,
};
pub use crate::core::error::{Result, WordStoreError};
pub use crate::core::header::{HeaderRecord, HeaderTable, ParsedRecord};
pub use crate::core::layout::{ChunkAddress, ChunkedData, LayoutConstants};
pub use crate::core::memory::{Memory, MemoryLayout};
pub use crate::core::render;
pub use crate::core::text::StringAllocation;
pub use crate::core::validation::HostName;

use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};

/// A compile session: the registry of named disks and memories
///
/// A session owns everything registered during one generation run. Disk and
/// memory names are case-insensitive and share the host identifier rules of
/// [`HostName`]. The layout configuration is fixed when the session is
/// created.
///
/// # Examples
///
/// ```rust
/// use wordstore::{Session, WordStoreError};
///
/// let mut session = Session::new();
/// session.register_disk("Main", 1024)?;
///
/// // Names are case-insensitive
/// assert!(session.disk("MAIN").is_ok());
/// assert!(matches!(
///     session.register_disk("main", 1),
///     Err(WordStoreError::DuplicateDisk(_))
/// ));
/// # Ok::<(), WordStoreError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Session {
    config: LayoutConfig,
    codec: WordCodec,
    disks: BTreeMap<HostName, Disk>,
    memories: BTreeMap<HostName, Memory>,
    dispatch_count: usize,
}

impl Session {
    /// Create a session with the default layout configuration
    pub fn new() -> Self {
        Session {
            config: LayoutConfig::default(),
            codec: WordCodec::default(),
            disks: BTreeMap::new(),
            memories: BTreeMap::new(),
            dispatch_count: 0,
        }
    }

    /// Create a session with a custom layout configuration
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the configuration fails validation.
    pub fn with_config(config: LayoutConfig) -> Result<Self> {
        config.validate()?;
        let codec = WordCodec::from_config(&config)?;
        debug!(
            "Session configured: word width {}, chunk size {}",
            config.word_width, config.chunk_size
        );
        Ok(Session {
            config,
            codec,
            disks: BTreeMap::new(),
            memories: BTreeMap::new(),
            dispatch_count: 0,
        })
    }

    /// The layout configuration in force for this session
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// The word codec matching [`Session::config`]
    pub fn codec(&self) -> &WordCodec {
        &self.codec
    }

    /// Register a new, empty disk
    ///
    /// # Errors
    ///
    /// `InvalidName` if the name is not a host identifier fragment,
    /// `DuplicateDisk` if a disk with the same normalized name exists,
    /// `CapacityTooLarge` beyond [`LayoutConfig::max_disk_capacity`].
    pub fn register_disk(&mut self, name: &str, capacity_bytes: u64) -> Result<()> {
        let name = HostName::new(name)?;
        if self.disks.contains_key(&name) {
            return Err(WordStoreError::DuplicateDisk(name.to_string()));
        }
        self.config.check_disk_capacity(name.as_str(), capacity_bytes)?;

        info!("Registered disk {} ({} bytes)", name, capacity_bytes);
        self.disks
            .insert(name.clone(), Disk::new(name, capacity_bytes));
        Ok(())
    }

    /// Register a new memory region
    ///
    /// # Errors
    ///
    /// `InvalidName` if the name is not a host identifier fragment,
    /// `DuplicateMemory` if a memory with the same normalized name exists,
    /// `CapacityTooLarge` beyond [`LayoutConfig::max_memory_capacity`].
    pub fn register_memory(&mut self, name: &str, capacity_bytes: u64) -> Result<()> {
        let name = HostName::new(name)?;
        if self.memories.contains_key(&name) {
            return Err(WordStoreError::DuplicateMemory(name.to_string()));
        }
        self.config.check_memory_capacity(name.as_str(), capacity_bytes)?;

        info!("Registered memory {} ({} bytes)", name, capacity_bytes);
        self.memories
            .insert(name.clone(), Memory::new(name, capacity_bytes));
        Ok(())
    }

    /// Look up a registered disk
    pub fn disk(&self, name: &str) -> Result<&Disk> {
        let key = disk_key(name)?;
        self.disks
            .get(&key)
            .ok_or_else(|| WordStoreError::UnknownDisk(key.to_string()))
    }

    /// Look up a registered memory
    pub fn memory(&self, name: &str) -> Result<&Memory> {
        let key = memory_key(name)?;
        self.memories
            .get(&key)
            .ok_or_else(|| WordStoreError::UnknownMemory(key.to_string()))
    }

    fn disk_mut(&mut self, name: &str) -> Result<&mut Disk> {
        let key = disk_key(name)?;
        self.disks
            .get_mut(&key)
            .ok_or_else(|| WordStoreError::UnknownDisk(key.to_string()))
    }

    /// Names of all registered disks, in sorted order
    pub fn disk_names(&self) -> impl Iterator<Item = &HostName> {
        self.disks.keys()
    }

    /// Names of all registered memories, in sorted order
    pub fn memory_names(&self) -> impl Iterator<Item = &HostName> {
        self.memories.keys()
    }

    /// Add a file to a disk, replacing any file with the same name
    ///
    /// # Errors
    ///
    /// `UnknownDisk` or `DiskLocked` once the disk has been exported.
    pub fn add_file_bytes(&mut self, disk: &str, file: &str, bytes: Vec<u8>) -> Result<()> {
        self.disk_mut(disk)?.add_file(file, bytes)
    }

    /// Add a file holding the character codes of `content`
    pub fn add_file_string(&mut self, disk: &str, file: &str, content: &str) -> Result<()> {
        self.disk_mut(disk)?.add_file_string(file, content)
    }

    /// Export a disk and lock it against further changes
    ///
    /// Exporting an already locked disk succeeds and yields the same layout.
    /// A failed export leaves the disk unlocked.
    pub fn export_disk(&mut self, name: &str) -> Result<DiskLayout> {
        let config = self.config.clone();
        self.disk_mut(name)?.export(&config)
    }

    /// Export a memory's empty scaffolding
    pub fn export_memory(&self, name: &str) -> Result<MemoryLayout> {
        self.memory(name)?.export(&self.config)
    }

    /// Compile a string dispatch reading the runtime string at `pointer`
    ///
    /// Each compiled dispatch gets its own scratch variable name so several
    /// dispatches can live in one host scope.
    pub fn compile_dispatch(
        &mut self,
        pointer: &str,
        length: &str,
        cases: DispatchCases,
    ) -> Result<DispatchProgram> {
        let tree = DispatchTree::compile(&self.codec, cases)?;
        let scratch = format!("s_tringDispatchRead{}", self.dispatch_count);
        self.dispatch_count += 1;

        debug!(
            "Compiled dispatch #{} over {} ({} cases, depth {})",
            self.dispatch_count - 1,
            pointer,
            tree.cases().cases().len(),
            tree.root().depth()
        );

        Ok(DispatchProgram {
            pointer: pointer.to_string(),
            length: length.to_string(),
            scratch,
            tree,
        })
    }

    /// Lay out a string for copying into allocated host memory
    pub fn string_allocation(&self, value: &str) -> Result<StringAllocation> {
        StringAllocation::new(&self.codec, &self.config, value)
    }

    /// Word-packed character codes of `value`
    pub fn string_words(&self, value: &str) -> Result<Vec<Word>> {
        text::string_words(&self.codec, value)
    }

    /// Length of `value` as the host string helpers count it
    pub fn string_len(&self, value: &str) -> usize {
        text::string_len(value)
    }

    /// Raw character codes of `value`
    pub fn string_bytes(&self, value: &str) -> Result<Vec<u8>> {
        text::byte_string(value)
    }

    /// Character code of the first character of `value`
    pub fn char_code(&self, value: &str) -> Result<u8> {
        text::char_code(value)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

fn disk_key(name: &str) -> Result<HostName> {
    HostName::new(name)
        .map_err(|_| WordStoreError::UnknownDisk(validation::normalize_name(name)))
}

fn memory_key(name: &str) -> Result<HostName> {
    HostName::new(name)
        .map_err(|_| WordStoreError::UnknownMemory(validation::normalize_name(name)))
}

/// Builder for sessions with non-default layouts
///
/// A configuration file, when given, is loaded first; individual overrides
/// are applied on top of it.
///
/// # Examples
///
/// ```rust
/// use wordstore::{Result, SessionBuilder};
///
/// # fn main() -> Result<()> {
/// let session = SessionBuilder::new()
///     .chunk_size(500)
///     .block_size(4)
///     .build()?;
///
/// assert_eq!(session.config().chunk_size, 500);
/// assert_eq!(session.config().bytes_per_block(), 24);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct SessionBuilder {
    config: Option<LayoutConfig>,
    config_path: Option<PathBuf>,
    word_width: Option<usize>,
    chunk_size: Option<usize>,
    block_size: Option<usize>,
}

impl SessionBuilder {
    /// Create a new SessionBuilder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an explicit configuration
    pub fn config(mut self, config: LayoutConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Start from a TOML configuration file
    pub fn config_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Override the number of bytes per word
    pub fn word_width(mut self, width: usize) -> Self {
        self.word_width = Some(width);
        self
    }

    /// Override the maximum host list length
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    /// Override the number of words per disk block
    pub fn block_size(mut self, block_size: usize) -> Self {
        self.block_size = Some(block_size);
        self
    }

    /// Build the Session instance
    pub fn build(self) -> Result<Session> {
        let mut config = match (self.config, self.config_path) {
            (Some(config), _) => config,
            (None, Some(path)) => {
                info!("Loading layout configuration from {}", path.display());
                LayoutConfig::load(&path)?
            }
            (None, None) => LayoutConfig::default(),
        };

        if let Some(width) = self.word_width {
            config.word_width = width;
        }
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = chunk_size;
        }
        if let Some(block_size) = self.block_size {
            config.block_size = block_size;
        }

        Session::with_config(config)
    }
}
