use thiserror::Error;

#[derive(Error, Debug)]
pub enum WordStoreError {
    #[error("Invalid layout configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse layout configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid name '{0}' (must be lowercase letters, digits or underscores)")]
    InvalidName(String),

    #[error("A disk with the name \"{0}\" already exists")]
    DuplicateDisk(String),

    #[error("A disk with the name \"{0}\" does not exist")]
    UnknownDisk(String),

    #[error("Disk \"{0}\" has already been exported")]
    DiskLocked(String),

    #[error("A memory with the name \"{0}\" already exists")]
    DuplicateMemory(String),

    #[error("A memory with the name \"{0}\" does not exist")]
    UnknownMemory(String),

    #[error("File name \"{file}\" exceeds the maximum name length of {max_words} words")]
    NameTooLong { file: String, max_words: usize },

    #[error("A non-empty {0} is required")]
    EmptyValue(&'static str),

    #[error("Value {value} at position {position} is not a byte (0-255)")]
    InvalidByte { position: usize, value: u32 },

    #[error("Capacity of \"{name}\" is {capacity_bytes} bytes; block IDs address at most {max_bytes}")]
    CapacityTooLarge {
        name: String,
        capacity_bytes: u64,
        max_bytes: u64,
    },

    #[error("Block ID space exhausted: at most {limit} blocks per disk")]
    BlockIdSpaceExhausted { limit: u32 },

    #[error("At least one dispatch value must be given")]
    NoDispatchCandidates,

    #[error("Dispatch value at position {position} is empty; empty strings cannot be matched")]
    EmptyDispatchCandidate { position: usize },

    #[error("Dispatch value \"{0}\" is indistinguishable from an earlier value")]
    DuplicateDispatchCandidate(String),

    #[error("Invalid dispatch argument at position {position}: {reason}")]
    InvalidDispatchArgument { position: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, WordStoreError>;
