//! Name normalization for disks, memories and files
//!
//! Disk and memory names are spliced into host identifiers
//! (`d_isk_<name>_data_0`, `MEMORY_<name>_BLOCK_SIZE`, ...), so after
//! normalization they must be plain identifier fragments. File names are
//! data stored in the header table and are only normalized.

use crate::error::{Result, WordStoreError};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Normalize a registry or file name: surrounding whitespace is trimmed and
/// the result lowercased, so lookups are case-insensitive.
pub fn normalize_name(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// A normalized disk or memory name usable inside host identifiers
///
/// # Examples
///
/// ```
/// use wordstore::HostName;
///
/// let name = HostName::new("  Main_Disk ").unwrap();
/// assert_eq!(name.as_str(), "main_disk");
///
/// assert!(HostName::new("my disk").is_err()); // whitespace inside
/// assert!(HostName::new("   ").is_err()); // empty after trimming
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct HostName(String);

impl HostName {
    /// Pattern for names after normalization
    const PATTERN: &'static str = r"^[a-z0-9_]+$";

    /// Normalize and validate a name
    pub fn new(raw: &str) -> Result<Self> {
        let name = normalize_name(raw);
        if !Self::pattern().is_match(&name) {
            return Err(WordStoreError::InvalidName(name));
        }
        Ok(HostName(name))
    }

    fn pattern() -> &'static Regex {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        PATTERN.get_or_init(|| Regex::new(Self::PATTERN).expect("name pattern compiles"))
    }

    /// Get the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for HostName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HostName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Readme.TXT "), "readme.txt");
        assert_eq!(normalize_name("a"), "a");
    }

    #[test]
    fn test_valid_host_names() {
        for raw in ["main", "Disk2", "  boot_sector  ", "0", "a_b_c"] {
            assert!(HostName::new(raw).is_ok(), "{:?} should be valid", raw);
        }
    }

    #[test]
    fn test_invalid_host_names() {
        for raw in ["", "   ", "my-disk", "my disk", "disk!", "dé"] {
            assert!(
                matches!(HostName::new(raw), Err(WordStoreError::InvalidName(_))),
                "{:?} should be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_case_insensitive_equality() {
        assert_eq!(HostName::new("ROM").unwrap(), HostName::new("rom").unwrap());
    }
}
