//! Page Directory
//!
//! Owns every page of one array under a single filesystem directory.
//!
//! ## Responsibilities
//! - Translate page index → `Page`, creating page files append-only
//! - Bound resident pages with an LRU cache
//! - Recover `page_count` at startup by scanning for existing page files
//! - Flush and release every resident page on close
//!
//! ## File Layout
//! ```text
//! {directory}/
//!   ├── {prefix}page-0.dat
//!   ├── {prefix}page-1.dat
//!   └── ...
//! ```
//! Page files are created sparse at full page capacity. The startup scan
//! costs time proportional to the number of existing page files.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::config::Config;
use crate::error::{BigArrayError, Result};
use crate::paging::cache::BoundedCache;
use crate::paging::page::Page;

/// Filename suffix of every page file
const PAGE_NAME_SUFFIX: &str = ".dat";

/// Directory of pages with bounded residency
pub struct PageDirectory {
    /// Directory holding the page files
    directory: PathBuf,

    /// Full filename prefix: `{config.prefix}page-`
    file_prefix: String,

    /// Final (power-of-two) page capacity in bytes
    page_size_in_bytes: usize,

    /// Final (power-of-two) window size in bytes
    sub_page_size_in_bytes: usize,

    /// Residency bound handed to each page's window cache
    max_sub_page_in_mem: i64,

    /// Resident pages, keyed by page index
    pages: BoundedCache<usize, Arc<Page>>,

    /// Highest page index ever created, plus one; survives restarts via the
    /// startup scan and never decreases while open
    page_count: AtomicUsize,

    /// Set once; all operations fail `Closed` afterwards
    closed: AtomicBool,
}

impl PageDirectory {
    /// Open a directory of pages, discovering any persisted pages
    ///
    /// Creates the directory if absent. Expects an already-validated
    /// config (sizes normalized to powers of two).
    pub fn open(config: &Config) -> Result<Self> {
        fs::create_dir_all(&config.directory)?;
        if !config.directory.is_dir() {
            return Err(BigArrayError::Config(format!(
                "not a directory: {}",
                config.directory.display()
            )));
        }

        let directory = Self {
            directory: config.directory.clone(),
            file_prefix: format!("{}page-", config.prefix),
            page_size_in_bytes: config.page_size_in_bytes,
            sub_page_size_in_bytes: config.sub_page_size_in_bytes,
            max_sub_page_in_mem: config.max_sub_page_in_mem,
            pages: BoundedCache::new(config.max_page_in_mem),
            page_count: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        };
        directory.discover_existing_pages()?;
        Ok(directory)
    }

    /// Return the page at `index`
    ///
    /// Fails `IndexOutOfRange` if the page was never created.
    pub fn get_page(&self, index: usize) -> Result<Arc<Page>> {
        self.check_open()?;
        let page_count = self.page_count.load(Ordering::Acquire);
        if index >= page_count {
            return Err(BigArrayError::IndexOutOfRange(format!(
                "page index {} out of {} pages",
                index, page_count
            )));
        }
        self.load_page(index)
    }

    /// Return the page at `index`, creating it if `index == page_count`
    ///
    /// Page creation is append-only; any larger index fails `IndexOverflow`.
    pub fn get_or_create_page(&self, index: usize) -> Result<Arc<Page>> {
        self.check_open()?;
        let page_count = self.page_count.load(Ordering::Acquire);
        if index > page_count {
            return Err(BigArrayError::IndexOverflow(format!(
                "page index {} would skip past {} existing pages",
                index, page_count
            )));
        }
        self.load_page(index)
    }

    /// Return the most recently created page, creating page 0 if none exists
    ///
    /// Backs append-mode writes.
    pub fn last_page(&self) -> Result<Arc<Page>> {
        self.check_open()?;
        let page_count = self.page_count.load(Ordering::Acquire);
        if page_count == 0 {
            self.load_page(0)
        } else {
            self.load_page(page_count - 1)
        }
    }

    /// Number of pages ever created (not the resident count)
    pub fn page_count(&self) -> usize {
        self.page_count.load(Ordering::Acquire)
    }

    /// Number of pages currently resident
    pub fn resident_page_count(&self) -> usize {
        self.pages.len()
    }

    /// Flush and evict every resident page without deleting files; idempotent
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.pages.expire_all();
        Ok(())
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Close, then remove every page file of this array
    pub fn delete_all_pages(&self) -> Result<()> {
        self.close()?;
        for entry in fs::read_dir(&self.directory)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() && self.parse_page_index(&path).is_some() {
                tracing::debug!("deleting page file {}", path.display());
                fs::remove_file(&path)?;
            }
        }
        self.page_count.store(0, Ordering::Release);
        Ok(())
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Fetch-or-create through the page cache
    fn load_page(&self, index: usize) -> Result<Arc<Page>> {
        let page = self
            .pages
            .get_or_create(index, |&i| self.create_page(i))?;
        self.page_count.fetch_max(index + 1, Ordering::AcqRel);
        Ok(page)
    }

    /// Open (or create sparse) the backing file for page `index`
    fn create_page(&self, index: usize) -> Result<Arc<Page>> {
        let path = self.page_path(index);
        if path.exists() && !path.is_file() {
            return Err(BigArrayError::Config(format!(
                "page path exists and is not a file: {}",
                path.display()
            )));
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;
        // Pre-size so every window maps inside the file; holes stay sparse.
        if file.metadata()?.len() < self.page_size_in_bytes as u64 {
            file.set_len(self.page_size_in_bytes as u64)?;
        }
        tracing::debug!("opened page file {}", path.display());
        Ok(Arc::new(Page::new(
            file,
            self.page_size_in_bytes,
            self.sub_page_size_in_bytes,
            self.max_sub_page_in_mem,
        )))
    }

    /// Scan the directory and register every persisted page
    ///
    /// Malformed page filenames (non-numeric index) are configuration
    /// errors rather than silently skipped files.
    fn discover_existing_pages(&self) -> Result<()> {
        let mut indices: Vec<usize> = Vec::new();
        for entry in fs::read_dir(&self.directory)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let name = entry.file_name();
            let name = name.to_string_lossy();
            let Some(stem) = name
                .strip_prefix(self.file_prefix.as_str())
                .and_then(|rest| rest.strip_suffix(PAGE_NAME_SUFFIX))
            else {
                continue;
            };
            let index: usize = stem.parse().map_err(|_| {
                BigArrayError::Config(format!("illegal page file name: {}", name))
            })?;
            indices.push(index);
        }
        if indices.is_empty() {
            return Ok(());
        }
        indices.sort_unstable();
        for &index in &indices {
            self.load_page(index)?;
        }
        tracing::info!(
            "discovered {} existing pages in {}",
            indices.len(),
            self.directory.display()
        );
        Ok(())
    }

    fn page_path(&self, index: usize) -> PathBuf {
        self.directory
            .join(format!("{}{}{}", self.file_prefix, index, PAGE_NAME_SUFFIX))
    }

    /// Parse a page index from a file path
    /// "{prefix}page-42.dat" → Some(42)
    fn parse_page_index(&self, path: &Path) -> Option<usize> {
        let name = path.file_name()?.to_string_lossy();
        name.strip_prefix(self.file_prefix.as_str())?
            .strip_suffix(PAGE_NAME_SUFFIX)?
            .parse()
            .ok()
    }

    fn check_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(BigArrayError::Closed("page directory".to_string()));
        }
        Ok(())
    }
}
