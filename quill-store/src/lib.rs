//! Quill Store - Local persistence
//!
//! An embedded LMDB store (via heed) serving two roles for the storage
//! client:
//!
//! - **Cache**: payloads keyed by content root hash, plus a secondary
//!   transaction-hash to root-hash mapping. Used as a fast path and as a
//!   fallback while the remote index lags behind a recent write.
//! - **Index**: the list of [`NoteIndexItem`] pointer records mapping
//!   logical note ids to their current content addresses.
//!
//! Both lookup directions live in one environment as separate key
//! namespaces with first-class prefix iteration.
//!
//! # Concurrency
//!
//! LMDB provides ACID transactions; read transactions for lookups, write
//! transactions for mutations. There is no compare-and-set above that:
//! concurrent writers to the same key race and the last write wins.
//!
//! [`NoteIndexItem`]: quill_core::NoteIndexItem

pub mod cache;
pub mod index;

pub use cache::{CacheKey, CacheStats, Namespace, NoteCache};
pub use index::NoteIndex;

use quill_core::{QuillResult, StoreError};
use std::path::Path;

/// Shared LMDB environment for the cache and index databases.
#[derive(Debug, Clone)]
pub struct StoreEnv {
    env: heed::Env,
}

impl StoreEnv {
    /// Open (creating if needed) the store environment at `path`.
    pub fn open<P: AsRef<Path>>(path: P, max_size_mb: usize) -> QuillResult<Self> {
        std::fs::create_dir_all(&path).map_err(StoreError::from)?;

        let env = unsafe {
            heed::EnvOpenOptions::new()
                .map_size(max_size_mb * 1024 * 1024)
                .max_dbs(2)
                .open(path.as_ref())
        }
        .map_err(|e| StoreError::EnvOpen(e.to_string()))?;

        Ok(Self { env })
    }

    pub(crate) fn inner(&self) -> &heed::Env {
        &self.env
    }
}
