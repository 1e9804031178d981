//! # bigarray
//!
//! A logical array of fixed-size primitive slots (bytes, 32-bit integers)
//! addressable over a key space far larger than process memory, with:
//! - One file per page, memory-mapped in fixed-size windows on demand
//! - Two-level LRU caching (pages, then windows) bounding native memory
//! - External k-way merge sort built directly on the paging engine
//! - Pluggable page-blob repositories for whole-array persistence
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       BigArray                              │
//! │        (slot index → page index / offset in page)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    PageDirectory                            │
//! │            BoundedCache<page index, Page>                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Page                                  │
//! │          BoundedCache<window index, MappedWindow>           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!                ┌──────▼──────┐
//!                │ mmap window │  (one slice of the page file)
//!                └─────────────┘
//! ```
//!
//! Data flow for `put_int(i, v)`: byte offset `i*4` → page index / in-page
//! offset → directory creates-or-fetches the page → window index / in-window
//! offset → window cache creates-or-fetches the mapping → write.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod paging;
pub mod array;
pub mod sort;
pub mod repo;
pub mod iputil;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use array::BigArray;
pub use config::{Config, ConfigBuilder, UNBOUNDED};
pub use error::{BigArrayError, Result};
pub use repo::{load_from_repo, save_to_repo, FsRepository, Repository};
pub use sort::sort_int;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of bigarray
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
