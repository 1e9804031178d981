//! Page Repositories
//!
//! Page-wise blob persistence behind a pluggable backend.
//!
//! ## Wire Contract
//! One stored blob per `(namespace, page index)`, always holding the full
//! page byte image — no diffing, no partial pages. Which store the blobs
//! land in (filesystem, SQL, object store) is the backend's business.
//!
//! ## Failure Policy
//! A failed or refused save/fetch is logged and aborts the remaining batch;
//! nothing silently continues past a partial transfer, and nothing retries.

use std::fs;
use std::path::{Path, PathBuf};

use crate::array::BigArray;
use crate::error::{BigArrayError, Result};

/// A page-blob persistence backend
pub trait Repository {
    /// Number of page blobs the backend reports for this namespace
    fn page_count(&self) -> Result<usize>;

    /// Fetch the full page image stored for `page_index`
    fn fetch_page(&self, page_index: usize) -> Result<Vec<u8>>;

    /// Store a full page image; `Ok(false)` means the backend refused it
    fn save_page(&self, page_index: usize, buf: &[u8]) -> Result<bool>;

    /// Release backend resources; idempotent
    fn close(&self) -> Result<()>;
}

/// Save every page of `array` into `repository`, whole pages, in order
pub fn save_to_repo(array: &BigArray, repository: &dyn Repository) -> Result<()> {
    let page_count = array.page_count();
    for index in 0..page_count {
        let page = array.page(index)?;
        let buf = page.load_bytes(0, array.page_size_in_bytes())?;
        match repository.save_page(index, &buf) {
            Ok(true) => {}
            Ok(false) => {
                tracing::error!("repository refused page {}, aborting save", index);
                return Err(BigArrayError::Repository(format!(
                    "save refused for page {}",
                    index
                )));
            }
            Err(e) => {
                tracing::error!("failed to save page {}: {}", index, e);
                return Err(e);
            }
        }
    }
    Ok(())
}

/// Load every page `repository` reports into `array`, creating pages as needed
pub fn load_from_repo(array: &BigArray, repository: &dyn Repository) -> Result<()> {
    let page_count = repository.page_count()?;
    for index in 0..page_count {
        let buf = match repository.fetch_page(index) {
            Ok(buf) => buf,
            Err(e) => {
                tracing::error!("failed to fetch page {}: {}", index, e);
                return Err(e);
            }
        };
        let page = array.page_or_create(index)?;
        page.put_bytes(&buf, 0)?;
    }
    Ok(())
}

// =============================================================================
// Filesystem Backend
// =============================================================================

/// Filename suffix of every stored blob
const BLOB_NAME_SUFFIX: &str = ".blob";

/// Repository storing one blob file per page
///
/// Layout: `{directory}/{namespace}-page-{index}.blob`. The stock backend
/// for tests and the demo CLI; a SQL or object-store backend plugs in
/// through the same trait.
pub struct FsRepository {
    directory: PathBuf,
    /// Full filename prefix: `{namespace}-page-`
    blob_prefix: String,
}

impl FsRepository {
    /// Open a blob directory, creating it if absent
    pub fn open(directory: impl Into<PathBuf>, namespace: &str) -> Result<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;
        if !directory.is_dir() {
            return Err(BigArrayError::Config(format!(
                "not a directory: {}",
                directory.display()
            )));
        }
        Ok(Self {
            directory,
            blob_prefix: format!("{}-page-", namespace),
        })
    }

    fn blob_path(&self, page_index: usize) -> PathBuf {
        self.directory
            .join(format!("{}{}{}", self.blob_prefix, page_index, BLOB_NAME_SUFFIX))
    }

    /// Parse a page index from a blob path
    /// "{namespace}-page-42.blob" → Some(42)
    fn parse_blob_index(&self, path: &Path) -> Option<usize> {
        let name = path.file_name()?.to_string_lossy();
        name.strip_prefix(self.blob_prefix.as_str())?
            .strip_suffix(BLOB_NAME_SUFFIX)?
            .parse()
            .ok()
    }
}

impl Repository for FsRepository {
    /// Highest stored page index plus one, by directory scan
    fn page_count(&self) -> Result<usize> {
        let mut count = 0;
        for entry in fs::read_dir(&self.directory)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Some(index) = self.parse_blob_index(&path) {
                count = count.max(index + 1);
            }
        }
        Ok(count)
    }

    fn fetch_page(&self, page_index: usize) -> Result<Vec<u8>> {
        let path = self.blob_path(page_index);
        fs::read(&path).map_err(|e| {
            BigArrayError::Repository(format!("fetch of {} failed: {}", path.display(), e))
        })
    }

    fn save_page(&self, page_index: usize, buf: &[u8]) -> Result<bool> {
        let path = self.blob_path(page_index);
        fs::write(&path, buf).map_err(|e| {
            BigArrayError::Repository(format!("save of {} failed: {}", path.display(), e))
        })?;
        Ok(true)
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}
