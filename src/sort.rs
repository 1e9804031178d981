//! External Merge Sort
//!
//! Sorts the live int prefix of a [`BigArray`] into a new array of identical
//! geometry, without ever holding more than one page of data in heap memory.
//!
//! ## Algorithm
//! 1. **Local sort** — every page holding live data is bulk-loaded (the last
//!    page only up to its valid prefix), sorted in place, and bulk-stored.
//! 2. **K-way merge** — a min-heap holds one frontier element per page.
//!    Because each page is now sorted, its frontier value lower-bounds
//!    everything remaining in that page, so popping the heap minimum and
//!    refilling from the same page yields globally ascending output.
//!
//! Equal values may interleave in any order; stability is not promised.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::path::Path;

use crate::array::BigArray;
use crate::config::Config;
use crate::error::Result;

/// Sort the first `available_count` ints of `source` into a new array
///
/// The destination array is created under `dest_directory` with
/// `dest_prefix` namespacing its page files (pick a prefix that does not
/// collide with the source when both live in one directory). The source is
/// page-sorted in place as a side effect.
pub fn sort_int(
    source: &BigArray,
    available_count: u64,
    dest_directory: impl AsRef<Path>,
    dest_prefix: &str,
) -> Result<BigArray> {
    let dest = BigArray::open(
        Config::builder(dest_directory.as_ref())
            .prefix(dest_prefix)
            .page_size_in_bytes(source.page_size_in_bytes())
            .max_page_count(source.max_page_count())
            .sub_page_size_in_bytes(source.sub_page_size_in_bytes())
            .max_sub_page_in_mem(64)
            .build(),
    )?;
    if available_count == 0 {
        return Ok(dest);
    }

    let page_lens = page_lengths(source, available_count);
    sort_pages(source, &page_lens)?;

    let ints_per_page = source.page_size_in_bytes() / 4;

    // Seed the heap with each page's front value. `Reverse` turns the
    // std max-heap into the min-heap the merge needs.
    let mut heap: BinaryHeap<Reverse<(i32, usize)>> = BinaryHeap::with_capacity(page_lens.len());
    let mut read_pos = vec![0usize; page_lens.len()];
    for (page, &len) in page_lens.iter().enumerate() {
        if len > 0 {
            let value = source.get_int((page * ints_per_page) as u64)?;
            read_pos[page] = 1;
            heap.push(Reverse((value, page)));
        }
    }

    while let Some(Reverse((value, page))) = heap.pop() {
        dest.append_int(value)?;
        if read_pos[page] < page_lens[page] {
            let next = source.get_int((page * ints_per_page + read_pos[page]) as u64)?;
            read_pos[page] += 1;
            heap.push(Reverse((next, page)));
        }
    }

    Ok(dest)
}

/// Number of live ints in each page: full pages, then a possibly partial tail
fn page_lengths(source: &BigArray, available_count: u64) -> Vec<usize> {
    let ints_per_page = (source.page_size_in_bytes() / 4) as u64;
    let full_pages = (available_count / ints_per_page) as usize;
    let remainder = (available_count % ints_per_page) as usize;
    let mut lens = vec![ints_per_page as usize; full_pages];
    if remainder != 0 {
        lens.push(remainder);
    }
    lens
}

/// Phase 1: sort each page's valid int prefix in place
///
/// Trailing bytes past the valid prefix of the last page never move.
fn sort_pages(source: &BigArray, page_lens: &[usize]) -> Result<()> {
    for (index, &len) in page_lens.iter().enumerate() {
        let page = source.page(index)?;
        page.force()?;
        let mut values = page.load_ints(0, len)?;
        values.sort_unstable();
        page.put_ints(&values, 0)?;
    }
    Ok(())
}
