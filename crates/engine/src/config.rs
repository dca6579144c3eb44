//! Vault configuration via `modelvault.toml`
//!
//! A config file is optional: every field has a default. Stores that own a
//! directory may keep a `modelvault.toml` next to their files; callers load
//! it with [`VaultConfig::from_file`] and hand it to the engine.

use modelvault_core::{Error, Result, CHUNK_SIZE};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file name placed in a store directory.
pub const CONFIG_FILE_NAME: &str = "modelvault.toml";

/// Engine configuration loaded from `modelvault.toml`.
///
/// # Example
///
/// ```toml
/// chunk_size = 32768
/// file_suffix = ".mvlt"
/// sync_on_close = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Byte-stream chunk size; at most 32768.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Suffix appended to generated container file names.
    #[serde(default = "default_file_suffix")]
    pub file_suffix: String,
    /// fsync container files when they are written back.
    #[serde(default = "default_sync_on_close")]
    pub sync_on_close: bool,
}

fn default_chunk_size() -> usize {
    CHUNK_SIZE
}

fn default_file_suffix() -> String {
    ".mvlt".to_string()
}

fn default_sync_on_close() -> bool {
    true
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            file_suffix: default_file_suffix(),
            sync_on_close: default_sync_on_close(),
        }
    }
}

impl VaultConfig {
    /// Check field ranges.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `chunk_size` is zero or above 32768, or if
    /// `file_suffix` contains a path separator.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 || self.chunk_size > CHUNK_SIZE {
            return Err(Error::InvalidConfig(format!(
                "chunk_size must be between 1 and {}, got {}",
                CHUNK_SIZE, self.chunk_size
            )));
        }
        if self.file_suffix.contains('/') || self.file_suffix.contains('\\') {
            return Err(Error::InvalidConfig(format!(
                "file_suffix must not contain a path separator: '{}'",
                self.file_suffix
            )));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# modelvault configuration
#
# Byte-stream chunk size in bytes (default and maximum: 32768)
chunk_size = 32768

# Suffix for generated container file names
file_suffix = ".mvlt"

# fsync container files and their directory on close (default: true)
sync_on_close = true
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: VaultConfig = toml::from_str(&content).map_err(|e| {
            Error::InvalidConfig(format!(
                "failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::InvalidConfig(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
