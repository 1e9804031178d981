//! Paging Module
//!
//! The two-level paging/caching engine behind [`crate::BigArray`].
//!
//! ## Responsibilities
//! - Map logical byte ranges onto per-page files and per-window mappings
//! - Bound native memory with an LRU cache at each level
//! - Release OS mappings deterministically on eviction and close
//!
//! ## Structure
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ PageDirectory                               │
//! │   BoundedCache<page index, Page>            │
//! │   ┌─────────────────────────────────────┐   │
//! │   │ Page (one file)                     │   │
//! │   │   BoundedCache<window index,        │   │
//! │   │                MappedWindow>        │   │
//! │   │   ┌────────────┐ ┌────────────┐     │   │
//! │   │   │ mmap slice │ │ mmap slice │ ... │   │
//! │   │   └────────────┘ └────────────┘     │   │
//! │   └─────────────────────────────────────┘   │
//! └─────────────────────────────────────────────┘
//! ```

mod cache;
mod directory;
mod page;
mod window;

pub use cache::{BoundedCache, Evictable};
pub use directory::PageDirectory;
pub use page::Page;
pub use window::MappedWindow;
