//! Mapped Window
//!
//! One live memory mapping over a fixed byte range of a page file.
//!
//! A window is the actual resident unit: pages create windows lazily on
//! first touch and destroy them on eviction or page close. Releasing the OS
//! mapping is deterministic — `close` moves the mapping out and drops it on
//! the spot, never waiting for some later collection point. Native memory
//! stays bounded no matter how many windows churn through the cache.

use std::fs::File;

use memmap2::{MmapMut, MmapOptions};
use parking_lot::RwLock;

use crate::error::{BigArrayError, Result};
use crate::paging::cache::Evictable;

/// A fixed-size read-write mapping over part of a page file
///
/// Offsets are window-relative. Offsets beyond the window are caller error
/// and panic like any slice overrun; there is no padding beyond the mapped
/// range. 32-bit values are big-endian, matching the on-disk layout used by
/// the IP bitmap helpers.
pub struct MappedWindow {
    /// `None` once closed; the mapping is dropped (unmapped) at that moment
    mmap: RwLock<Option<MmapMut>>,
}

impl MappedWindow {
    /// Map `len` bytes of `file` starting at absolute `offset`
    ///
    /// The caller guarantees the file covers `offset + len` (page files are
    /// pre-sized to full capacity on creation).
    pub fn map(file: &File, offset: u64, len: usize) -> Result<Self> {
        // SAFETY: MmapMut::map_mut is unsafe because the file could be
        // modified externally. This is safe because:
        // 1. Page files are owned by this process for the array's lifetime
        // 2. The page pre-sizes the file, so [offset, offset+len) is valid
        // 3. The mapping is private to this window and dropped on close,
        //    preventing use-after-unmap
        let mmap = unsafe { MmapOptions::new().offset(offset).len(len).map_mut(file)? };
        Ok(Self {
            mmap: RwLock::new(Some(mmap)),
        })
    }

    /// Read one byte at a window-relative offset
    pub fn get_byte(&self, offset: usize) -> Result<u8> {
        let guard = self.mmap.read();
        let mmap = guard.as_ref().ok_or_else(Self::closed_error)?;
        Ok(mmap[offset])
    }

    /// Write one byte at a window-relative offset
    pub fn put_byte(&self, offset: usize, value: u8) -> Result<()> {
        let mut guard = self.mmap.write();
        let mmap = guard.as_mut().ok_or_else(Self::closed_error)?;
        mmap[offset] = value;
        Ok(())
    }

    /// Read one big-endian 32-bit integer at a window-relative offset
    pub fn get_int(&self, offset: usize) -> Result<i32> {
        let guard = self.mmap.read();
        let mmap = guard.as_ref().ok_or_else(Self::closed_error)?;
        let bytes: [u8; 4] = mmap[offset..offset + 4].try_into().unwrap();
        Ok(i32::from_be_bytes(bytes))
    }

    /// Write one big-endian 32-bit integer at a window-relative offset
    pub fn put_int(&self, offset: usize, value: i32) -> Result<()> {
        let mut guard = self.mmap.write();
        let mmap = guard.as_mut().ok_or_else(Self::closed_error)?;
        mmap[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
        Ok(())
    }

    /// Flush the mapping to disk without releasing it
    pub fn force(&self) -> Result<()> {
        let guard = self.mmap.read();
        let mmap = guard.as_ref().ok_or_else(Self::closed_error)?;
        mmap.flush()?;
        Ok(())
    }

    fn closed_error() -> BigArrayError {
        BigArrayError::Closed("mapped window".to_string())
    }
}

impl Evictable for MappedWindow {
    /// Force-flush, then release the OS mapping; idempotent
    fn close(&self) -> Result<()> {
        let mut guard = self.mmap.write();
        if let Some(mmap) = guard.take() {
            mmap.flush()?;
            // dropping the MmapMut unmaps the range right here
            drop(mmap);
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.mmap.read().is_none()
    }
}
