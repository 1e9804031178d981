//! Tests for repository save/load
//!
//! These tests verify:
//! - Whole-array round trips through a blob repository
//! - Blob layout on disk (one file per page, namespaced)
//! - Batch abort on missing blobs

use bigarray::{
    load_from_repo, save_to_repo, BigArray, BigArrayError, Config, FsRepository, Repository,
    UNBOUNDED,
};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

/// 64-byte pages (16 ints), 16-byte windows
fn tiny_config(dir: &TempDir, prefix: &str) -> Config {
    Config::builder(dir.path())
        .prefix(prefix)
        .page_size_in_bytes(64)
        .sub_page_size_in_bytes(16)
        .max_page_count(16)
        .max_page_in_mem(UNBOUNDED)
        .max_sub_page_in_mem(4)
        .build()
}

// =============================================================================
// Round-Trip Tests
// =============================================================================

#[test]
fn test_save_then_load_reproduces_every_slot() {
    let src_dir = TempDir::new().unwrap();
    let dest_dir = TempDir::new().unwrap();
    let repo_dir = TempDir::new().unwrap();

    let source = BigArray::open(tiny_config(&src_dir, "")).unwrap();
    for i in 0..40u64 {
        source.put_int(i, i as i32 * 13 - 7).unwrap();
    }
    source.put_byte(163, 0x5A).unwrap();

    let repo = FsRepository::open(repo_dir.path(), "snap").unwrap();
    save_to_repo(&source, &repo).unwrap();
    assert_eq!(repo.page_count().unwrap(), 3);

    // Identical geometry on the destination side
    let dest = BigArray::open(tiny_config(&dest_dir, "")).unwrap();
    load_from_repo(&dest, &repo).unwrap();

    assert_eq!(dest.page_count(), 3);
    for i in 0..40u64 {
        assert_eq!(dest.get_int(i).unwrap(), i as i32 * 13 - 7);
    }
    assert_eq!(dest.get_byte(163).unwrap(), 0x5A);
    repo.close().unwrap();
}

#[test]
fn test_blob_files_are_full_page_images() {
    let src_dir = TempDir::new().unwrap();
    let repo_dir = TempDir::new().unwrap();

    let source = BigArray::open(tiny_config(&src_dir, "")).unwrap();
    source.put_int(0, 42).unwrap();

    let repo = FsRepository::open(repo_dir.path(), "snap").unwrap();
    save_to_repo(&source, &repo).unwrap();

    let blob = std::fs::read(repo_dir.path().join("snap-page-0.blob")).unwrap();
    assert_eq!(blob.len(), 64);
    assert_eq!(&blob[0..4], &42i32.to_be_bytes());
}

#[test]
fn test_namespaces_partition_one_blob_directory() {
    let src_dir = TempDir::new().unwrap();
    let repo_dir = TempDir::new().unwrap();

    let source = BigArray::open(tiny_config(&src_dir, "")).unwrap();
    source.put_int(0, 1).unwrap();
    source.put_int(16, 2).unwrap();

    let first = FsRepository::open(repo_dir.path(), "a").unwrap();
    let second = FsRepository::open(repo_dir.path(), "b").unwrap();
    save_to_repo(&source, &first).unwrap();

    assert_eq!(first.page_count().unwrap(), 2);
    assert_eq!(second.page_count().unwrap(), 0);
}

// =============================================================================
// Failure Policy Tests
// =============================================================================

#[test]
fn test_load_aborts_on_missing_blob() {
    let dest_dir = TempDir::new().unwrap();
    let repo_dir = TempDir::new().unwrap();

    // Blob 0 and blob 2 exist, blob 1 is missing: page_count reports 3 and
    // the fetch of page 1 must abort the batch
    let repo = FsRepository::open(repo_dir.path(), "snap").unwrap();
    repo.save_page(0, &[1u8; 64]).unwrap();
    std::fs::write(repo_dir.path().join("snap-page-2.blob"), [3u8; 64]).unwrap();
    assert_eq!(repo.page_count().unwrap(), 3);

    let dest = BigArray::open(tiny_config(&dest_dir, "")).unwrap();
    let result = load_from_repo(&dest, &repo);
    assert!(matches!(result, Err(BigArrayError::Repository(_))));

    // Page 0 made it before the abort; nothing was created past it
    assert_eq!(dest.page_count(), 1);
    assert_eq!(dest.get_byte(0).unwrap(), 1);
}

#[test]
fn test_fetch_missing_page_is_repository_error() {
    let repo_dir = TempDir::new().unwrap();
    let repo = FsRepository::open(repo_dir.path(), "snap").unwrap();

    assert!(matches!(
        repo.fetch_page(9),
        Err(BigArrayError::Repository(_))
    ));
}

#[test]
fn test_save_empty_array_is_a_no_op() {
    let src_dir = TempDir::new().unwrap();
    let repo_dir = TempDir::new().unwrap();

    let source = BigArray::open(tiny_config(&src_dir, "")).unwrap();
    let repo = FsRepository::open(repo_dir.path(), "snap").unwrap();
    save_to_repo(&source, &repo).unwrap();
    assert_eq!(repo.page_count().unwrap(), 0);
}
