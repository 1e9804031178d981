//! BigArray Facade
//!
//! The top-level API: a logical array of bytes and 32-bit integers spread
//! over a directory of page files.
//!
//! ## Responsibilities
//! - Translate logical slot indices to (page index, page-relative offset)
//! - Enforce the `max_page_count` address-space ceiling
//! - Provide append-style writes through one monotonic cursor
//!
//! ## Addressing
//!
//! Int slot `i` occupies bytes `i*4 .. i*4+4`; byte index `i` addresses byte
//! `i` directly. Both address spaces alias the same underlying bytes, which
//! is what lets the IP bitmap helpers flip single bits inside ints written
//! elsewhere.
//!
//! ## Handles
//!
//! [`BigArray::page`] returns an `Arc` handle. The caches treat handles as
//! independent of residency: eviction closes the shared object, so a handle
//! retained across later calls can start failing `Closed`. Fetch pages
//! fresh per operation instead of keeping handles around.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::Config;
use crate::error::{BigArrayError, Result};
use crate::paging::{Page, PageDirectory};

/// A file-backed array of primitive slots far larger than process memory
///
/// ## Concurrency
/// - Safe to call from many threads; both cache levels lock internally
/// - Writes to the same slot are not serialized — partition index ranges
///   per thread
pub struct BigArray {
    /// Validated configuration (sizes are final powers of two)
    config: Config,

    /// Owner of every page of this array
    directory: PageDirectory,

    /// Append cursor, shared by byte and int appends: `append_int` consumes
    /// one int slot per call, `append_byte` one byte slot, over the same
    /// monotonic sequence. Starts at zero on every open.
    cursor: AtomicU64,
}

impl BigArray {
    /// Open an array, creating its directory and discovering persisted pages
    pub fn open(config: Config) -> Result<Self> {
        let config = config.validated()?;
        let directory = PageDirectory::open(&config)?;
        Ok(Self {
            config,
            directory,
            cursor: AtomicU64::new(0),
        })
    }

    // =========================================================================
    // Int Access
    // =========================================================================

    /// Read the int at slot `index`
    ///
    /// Fails `IndexOutOfRange` if the addressed page was never created.
    pub fn get_int(&self, index: u64) -> Result<i32> {
        let byte_index = index * 4;
        self.check_index(byte_index)?;
        let page = self.directory.get_page(self.page_index(byte_index))?;
        page.get_int(self.index_in_page(byte_index))
    }

    /// Read the int at slot `index`, creating the addressed page if needed
    pub fn get_or_put_int(&self, index: u64) -> Result<i32> {
        let byte_index = index * 4;
        self.check_index(byte_index)?;
        let page = self.directory.get_or_create_page(self.page_index(byte_index))?;
        page.get_int(self.index_in_page(byte_index))
    }

    /// Write the int at slot `index`, creating the addressed page if needed
    pub fn put_int(&self, index: u64, value: i32) -> Result<()> {
        let byte_index = index * 4;
        self.check_index(byte_index)?;
        let page = self.directory.get_or_create_page(self.page_index(byte_index))?;
        page.put_int(self.index_in_page(byte_index), value)
    }

    /// Append an int at the cursor; returns the slot it landed in
    pub fn append_int(&self, value: i32) -> Result<u64> {
        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        self.put_int(index, value)?;
        Ok(index)
    }

    // =========================================================================
    // Byte Access
    // =========================================================================

    /// Read the byte at `index`
    ///
    /// Fails `IndexOutOfRange` if the addressed page was never created.
    pub fn get_byte(&self, index: u64) -> Result<u8> {
        self.check_index(index)?;
        let page = self.directory.get_page(self.page_index(index))?;
        page.get_byte(self.index_in_page(index))
    }

    /// Read the byte at `index`, creating the addressed page if needed
    pub fn get_or_put_byte(&self, index: u64) -> Result<u8> {
        self.check_index(index)?;
        let page = self.directory.get_or_create_page(self.page_index(index))?;
        page.get_byte(self.index_in_page(index))
    }

    /// Write the byte at `index`, creating the addressed page if needed
    pub fn put_byte(&self, index: u64, value: u8) -> Result<()> {
        self.check_index(index)?;
        let page = self.directory.get_or_create_page(self.page_index(index))?;
        page.put_byte(self.index_in_page(index), value)
    }

    /// Append a byte at the cursor; returns the index it landed at
    pub fn append_byte(&self, value: u8) -> Result<u64> {
        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        self.put_byte(index, value)?;
        Ok(index)
    }

    // =========================================================================
    // Page Handles
    // =========================================================================

    /// Existing page at `page_index` (see the handle caveat above)
    pub fn page(&self, page_index: usize) -> Result<Arc<Page>> {
        self.directory.get_page(page_index)
    }

    /// Page at `page_index`, created if it is the next page in sequence
    pub fn page_or_create(&self, page_index: usize) -> Result<Arc<Page>> {
        self.directory.get_or_create_page(page_index)
    }

    /// Most recently created page, creating page 0 if none exists
    pub fn last_page(&self) -> Result<Arc<Page>> {
        self.directory.last_page()
    }

    // =========================================================================
    // Geometry Accessors
    // =========================================================================

    /// Capacity of one page in bytes
    pub fn page_size_in_bytes(&self) -> usize {
        self.config.page_size_in_bytes
    }

    /// Size of one mapped window in bytes
    pub fn sub_page_size_in_bytes(&self) -> usize {
        self.config.sub_page_size_in_bytes
    }

    /// Hard ceiling on the number of pages
    pub fn max_page_count(&self) -> usize {
        self.config.max_page_count
    }

    /// Number of pages ever created
    pub fn page_count(&self) -> usize {
        self.directory.page_count()
    }

    /// Number of pages currently resident in memory
    pub fn resident_page_count(&self) -> usize {
        self.directory.resident_page_count()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Flush and release every resident page; idempotent
    ///
    /// Files stay on disk; reopening with the same config recovers them.
    pub fn close(&self) -> Result<()> {
        self.directory.close()
    }

    /// Close, then delete every page file of this array
    pub fn delete_all_pages(&self) -> Result<()> {
        self.directory.delete_all_pages()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn page_index(&self, byte_index: u64) -> usize {
        (byte_index / self.config.page_size_in_bytes as u64) as usize
    }

    fn index_in_page(&self, byte_index: u64) -> usize {
        (byte_index % self.config.page_size_in_bytes as u64) as usize
    }

    /// Reject any access that would need a page past `max_page_count`
    fn check_index(&self, byte_index: u64) -> Result<()> {
        let page_index = self.page_index(byte_index);
        if page_index >= self.config.max_page_count {
            return Err(BigArrayError::IndexOverflow(format!(
                "byte index {} needs page {}, max page count is {}",
                byte_index, page_index, self.config.max_page_count
            )));
        }
        Ok(())
    }
}

impl Drop for BigArray {
    /// Dropping without an explicit `close` still flushes and releases every
    /// mapping; `close` is idempotent, so close-then-drop is fine too
    fn drop(&mut self) {
        if let Err(e) = self.directory.close() {
            tracing::error!("failed to close array on drop: {}", e);
        }
    }
}
