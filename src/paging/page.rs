//! Page
//!
//! One backing file split into fixed-size mapped windows.
//!
//! ## Responsibilities
//! - Translate page-relative offsets to (window index, offset in window)
//! - Own the bounded cache of resident windows, created lazily on first touch
//! - Whole-page bulk transfers for sort-in-place and repository persistence
//! - Flush every dirty window before the file handle goes away
//!
//! ## Concurrency
//! - `windows`: BoundedCache (shared reads, exclusive structural changes)
//! - `file`: RwLock so `close` can drop the handle deterministically
//! - counters/flags: atomics, lock-free

use std::fs::File;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use memmap2::MmapOptions;
use parking_lot::RwLock;

use crate::error::{BigArrayError, Result};
use crate::paging::cache::{BoundedCache, Evictable};
use crate::paging::window::MappedWindow;

/// One page file and its resident windows
pub struct Page {
    /// Backing file; `None` once the page is closed
    file: RwLock<Option<File>>,

    /// Full capacity of this page in bytes
    page_size_in_bytes: usize,

    /// Size of one window in bytes
    sub_page_size_in_bytes: usize,

    /// Number of windows this page divides into
    max_sub_page: usize,

    /// Resident windows, keyed by window index
    windows: BoundedCache<usize, Arc<MappedWindow>>,

    /// Highest window index ever created, plus one
    window_count: AtomicUsize,

    /// Byte position for append-style writes into this page
    append_offset: AtomicUsize,

    /// Set once; all operations fail `Closed` afterwards
    closed: AtomicBool,
}

impl Page {
    /// Wrap an open, pre-sized page file
    ///
    /// The file must already span `page_size_in_bytes` (sparse is fine);
    /// windows map sub-ranges of it without further size checks.
    pub fn new(
        file: File,
        page_size_in_bytes: usize,
        sub_page_size_in_bytes: usize,
        max_sub_page_in_mem: i64,
    ) -> Self {
        Self {
            file: RwLock::new(Some(file)),
            page_size_in_bytes,
            sub_page_size_in_bytes,
            max_sub_page: page_size_in_bytes / sub_page_size_in_bytes,
            windows: BoundedCache::new(max_sub_page_in_mem),
            window_count: AtomicUsize::new(0),
            append_offset: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }

    // =========================================================================
    // Slot Access
    // =========================================================================

    /// Read one byte at a page-relative offset
    pub fn get_byte(&self, offset: usize) -> Result<u8> {
        let (window, offset_in_window) = self.window_for(offset)?;
        window.get_byte(offset_in_window)
    }

    /// Write one byte at a page-relative offset
    pub fn put_byte(&self, offset: usize, value: u8) -> Result<()> {
        let (window, offset_in_window) = self.window_for(offset)?;
        window.put_byte(offset_in_window, value)
    }

    /// Read one big-endian 32-bit integer at a page-relative byte offset
    pub fn get_int(&self, offset: usize) -> Result<i32> {
        let (window, offset_in_window) = self.window_for(offset)?;
        window.get_int(offset_in_window)
    }

    /// Write one big-endian 32-bit integer at a page-relative byte offset
    pub fn put_int(&self, offset: usize, value: i32) -> Result<()> {
        let (window, offset_in_window) = self.window_for(offset)?;
        window.put_int(offset_in_window, value)
    }

    /// Append one integer at this page's own append position
    ///
    /// The position is a monotonic byte cursor local to the page; it is
    /// independent of the array-level append cursor.
    pub fn append_int(&self, value: i32) -> Result<usize> {
        let offset = self.append_offset.fetch_add(4, Ordering::SeqCst);
        self.put_int(offset, value)?;
        Ok(offset)
    }

    /// Append one byte at this page's own append position
    pub fn append_byte(&self, value: u8) -> Result<usize> {
        let offset = self.append_offset.fetch_add(1, Ordering::SeqCst);
        self.put_byte(offset, value)?;
        Ok(offset)
    }

    // =========================================================================
    // Bulk Transfers
    // =========================================================================

    /// Copy `len` bytes starting at `offset` out of the page
    ///
    /// Maps the entire page as one temporary read-only mapping, bypassing
    /// the window cache, and unmaps it before returning.
    pub fn load_bytes(&self, offset: usize, len: usize) -> Result<Vec<u8>> {
        self.check_open()?;
        let guard = self.file.read();
        let file = guard.as_ref().ok_or_else(Self::closed_error)?;
        // SAFETY: read-only mapping of a file owned by this process; it is
        // dropped before this call returns, so it cannot outlive the file.
        let mmap = unsafe { MmapOptions::new().len(self.page_size_in_bytes).map(file)? };
        Ok(mmap[offset..offset + len].to_vec())
    }

    /// Copy `buf` into the page starting at byte `offset`
    ///
    /// Every resident window is flushed and evicted first so no stale
    /// window mapping overlaps the rewritten range. The temporary whole-page
    /// mapping is flushed and unmapped before returning.
    pub fn put_bytes(&self, buf: &[u8], offset: usize) -> Result<()> {
        self.check_open()?;
        self.windows.expire_all();
        let guard = self.file.read();
        let file = guard.as_ref().ok_or_else(Self::closed_error)?;
        // SAFETY: writable mapping of a file owned by this process; dropped
        // before this call returns.
        let mut mmap = unsafe { MmapOptions::new().len(self.page_size_in_bytes).map_mut(file)? };
        mmap[offset..offset + buf.len()].copy_from_slice(buf);
        mmap.flush()?;
        Ok(())
    }

    /// Read `count` big-endian integers starting at byte `offset`
    pub fn load_ints(&self, offset: usize, count: usize) -> Result<Vec<i32>> {
        let bytes = self.load_bytes(offset, count * 4)?;
        Ok(bytes
            .chunks_exact(4)
            .map(|chunk| i32::from_be_bytes(chunk.try_into().unwrap()))
            .collect())
    }

    /// Write integers big-endian starting at byte `offset`
    pub fn put_ints(&self, values: &[i32], offset: usize) -> Result<()> {
        let mut bytes = Vec::with_capacity(values.len() * 4);
        for value in values {
            bytes.extend_from_slice(&value.to_be_bytes());
        }
        self.put_bytes(&bytes, offset)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Flush every resident window without evicting any
    pub fn force(&self) -> Result<()> {
        self.check_open()?;
        for window in self.windows.values() {
            window.force()?;
        }
        Ok(())
    }

    /// Number of windows ever created in this page
    pub fn window_count(&self) -> usize {
        self.window_count.load(Ordering::Relaxed)
    }

    /// Number of windows currently resident
    pub fn resident_window_count(&self) -> usize {
        self.windows.len()
    }

    /// Full capacity of this page in bytes
    pub fn page_size_in_bytes(&self) -> usize {
        self.page_size_in_bytes
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Resolve a page-relative offset to its window and in-window offset,
    /// creating the window on first touch
    fn window_for(&self, offset: usize) -> Result<(Arc<MappedWindow>, usize)> {
        self.check_open()?;
        let index = offset / self.sub_page_size_in_bytes;
        let offset_in_window = offset % self.sub_page_size_in_bytes;
        Ok((self.load_window(index)?, offset_in_window))
    }

    fn load_window(&self, index: usize) -> Result<Arc<MappedWindow>> {
        if index >= self.max_sub_page {
            return Err(BigArrayError::SubPageOverflow(format!(
                "window index {} out of {} windows per page",
                index, self.max_sub_page
            )));
        }
        let window = self.windows.get_or_create(index, |&i| {
            let guard = self.file.read();
            let file = guard.as_ref().ok_or_else(Self::closed_error)?;
            let offset = (i * self.sub_page_size_in_bytes) as u64;
            tracing::debug!("mapping window {} at file offset {}", i, offset);
            Ok(Arc::new(MappedWindow::map(
                file,
                offset,
                self.sub_page_size_in_bytes,
            )?))
        })?;
        self.window_count.fetch_max(index + 1, Ordering::Relaxed);
        Ok(window)
    }

    fn check_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Self::closed_error());
        }
        Ok(())
    }

    fn closed_error() -> BigArrayError {
        BigArrayError::Closed("page".to_string())
    }
}

impl Evictable for Page {
    /// Flush and evict every window, then close the file handle; idempotent
    fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.windows.expire_all();
        if let Some(file) = self.file.write().take() {
            file.sync_all()?;
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
