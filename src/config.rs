//! Configuration for bigarray
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{BigArrayError, Result};

/// Cache bound meaning "no limit, never evict"
pub const UNBOUNDED: i64 = -1;

/// Geometry and residency configuration for one array
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Layout Configuration
    // -------------------------------------------------------------------------
    /// Directory holding every page file of this array.
    /// Internal structure:
    ///   {directory}/
    ///     ├── {prefix}page-0.dat
    ///     ├── {prefix}page-1.dat
    ///     └── ...
    pub directory: PathBuf,

    /// Filename prefix, namespacing several arrays in one directory
    pub prefix: String,

    // -------------------------------------------------------------------------
    // Geometry Configuration
    // -------------------------------------------------------------------------
    /// Capacity of one page file in bytes (rounded up to a power of two)
    pub page_size_in_bytes: usize,

    /// Hard ceiling on the number of pages, i.e. on the address space
    pub max_page_count: usize,

    /// Size of one memory-mapped window in bytes (rounded up to a power of
    /// two, at most `page_size_in_bytes`)
    pub sub_page_size_in_bytes: usize,

    // -------------------------------------------------------------------------
    // Residency Configuration
    // -------------------------------------------------------------------------
    /// Max pages resident at once; [`UNBOUNDED`] disables eviction
    pub max_page_in_mem: i64,

    /// Max windows resident at once per page; [`UNBOUNDED`] disables eviction
    pub max_sub_page_in_mem: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./bigarray_data"),
            prefix: String::new(),
            page_size_in_bytes: 64 * 1024 * 1024, // 64 MiB
            max_page_count: 10,
            sub_page_size_in_bytes: 1024 * 1024, // 1 MiB
            max_page_in_mem: UNBOUNDED,
            max_sub_page_in_mem: 10,
        }
    }
}

impl Config {
    /// Create a new config builder rooted at the given directory
    pub fn builder(directory: impl Into<PathBuf>) -> ConfigBuilder {
        ConfigBuilder {
            config: Config {
                directory: directory.into(),
                ..Config::default()
            },
        }
    }

    /// Validate the configuration and normalize sizes to powers of two
    ///
    /// Rounding happens here, once, so every later component sees final
    /// geometry. Fails with `Config` on impossible geometry.
    pub fn validated(mut self) -> Result<Self> {
        if self.page_size_in_bytes == 0 || self.sub_page_size_in_bytes == 0 {
            return Err(BigArrayError::Config(
                "page and sub-page sizes must be non-zero".to_string(),
            ));
        }
        if self.max_page_count == 0 {
            return Err(BigArrayError::Config(
                "max_page_count must be at least 1".to_string(),
            ));
        }

        self.page_size_in_bytes = self.page_size_in_bytes.next_power_of_two();
        self.sub_page_size_in_bytes = self.sub_page_size_in_bytes.next_power_of_two();

        if self.sub_page_size_in_bytes > self.page_size_in_bytes {
            return Err(BigArrayError::Config(format!(
                "sub_page_size_in_bytes {} > page_size_in_bytes {}",
                self.sub_page_size_in_bytes, self.page_size_in_bytes
            )));
        }

        Ok(self)
    }
}

/// Builder for Config
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the filename prefix (namespacing several arrays per directory)
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.prefix = prefix.into();
        self
    }

    /// Set the page size in bytes (rounded up to a power of two on build)
    pub fn page_size_in_bytes(mut self, size: usize) -> Self {
        self.config.page_size_in_bytes = size;
        self
    }

    /// Set the hard ceiling on the number of pages
    pub fn max_page_count(mut self, count: usize) -> Self {
        self.config.max_page_count = count;
        self
    }

    /// Set the window size in bytes (rounded up to a power of two on build)
    pub fn sub_page_size_in_bytes(mut self, size: usize) -> Self {
        self.config.sub_page_size_in_bytes = size;
        self
    }

    /// Set the max number of resident pages ([`UNBOUNDED`] = no eviction)
    pub fn max_page_in_mem(mut self, max: i64) -> Self {
        self.config.max_page_in_mem = max;
        self
    }

    /// Set the max number of resident windows per page
    pub fn max_sub_page_in_mem(mut self, max: i64) -> Self {
        self.config.max_sub_page_in_mem = max;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.page_size_in_bytes, 64 * 1024 * 1024);
        assert_eq!(config.sub_page_size_in_bytes, 1024 * 1024);
        assert_eq!(config.max_page_count, 10);
        assert_eq!(config.max_page_in_mem, UNBOUNDED);
        assert_eq!(config.max_sub_page_in_mem, 10);
    }

    #[test]
    fn test_validated_rounds_to_power_of_two() {
        let config = Config::builder("/tmp/x")
            .page_size_in_bytes(1000)
            .sub_page_size_in_bytes(100)
            .build()
            .validated()
            .unwrap();
        assert_eq!(config.page_size_in_bytes, 1024);
        assert_eq!(config.sub_page_size_in_bytes, 128);
    }

    #[test]
    fn test_validated_rejects_sub_page_larger_than_page() {
        let result = Config::builder("/tmp/x")
            .page_size_in_bytes(1024)
            .sub_page_size_in_bytes(4096)
            .build()
            .validated();
        assert!(matches!(result, Err(BigArrayError::Config(_))));
    }

    #[test]
    fn test_validated_rejects_zero_sizes() {
        let result = Config::builder("/tmp/x")
            .page_size_in_bytes(0)
            .build()
            .validated();
        assert!(matches!(result, Err(BigArrayError::Config(_))));

        let result = Config::builder("/tmp/x").max_page_count(0).build().validated();
        assert!(matches!(result, Err(BigArrayError::Config(_))));
    }
}
