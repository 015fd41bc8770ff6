//! LMDB-backed payload cache.
//!
//! Uses the heed crate (Rust bindings for LMDB) to provide a
//! memory-mapped key-value store for payloads and the tx-to-root mapping.
//!
//! # Thread Safety
//!
//! LMDB provides ACID transactions. The cache uses read transactions for
//! lookups, write transactions for puts, and atomic-free statistics
//! behind an `RwLock`.

use std::sync::{Arc, RwLock};

use heed::types::Bytes;
use heed::Database;
use quill_core::{Cid, QuillResult, StoreError, TxHash};

use super::key::{CacheKey, Namespace};
use crate::StoreEnv;

/// Cache hit/miss statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entry_count: u64,
}

/// LMDB-backed cache for uploaded payloads.
///
/// Holds payload bytes under the root-hash namespace and the
/// transaction-hash to root-hash mapping under the tx namespace. Clones
/// share the same environment and statistics.
#[derive(Debug, Clone)]
pub struct NoteCache {
    env: StoreEnv,
    db: Database<Bytes, Bytes>,
    stats: Arc<RwLock<CacheStats>>,
}

impl NoteCache {
    /// Open the cache database inside `env`.
    pub fn new(env: &StoreEnv) -> QuillResult<Self> {
        let mut wtxn = env
            .inner()
            .write_txn()
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        let db: Database<Bytes, Bytes> = env
            .inner()
            .create_database(&mut wtxn, Some("cache"))
            .map_err(|e| StoreError::DbOpen(e.to_string()))?;

        wtxn.commit()
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        Ok(Self {
            env: env.clone(),
            db,
            stats: Arc::new(RwLock::new(CacheStats::default())),
        })
    }

    /// Store payload bytes under the root-hash namespace.
    pub fn put_payload(&self, cid: &Cid, payload: &[u8]) -> QuillResult<()> {
        self.put(&CacheKey::root(cid.as_str()), payload)
    }

    /// Exact-match payload lookup by CID.
    pub fn get_payload(&self, cid: &Cid) -> QuillResult<Option<Vec<u8>>> {
        self.get(&CacheKey::root(cid.as_str()))
    }

    /// Store the transaction-hash to root-hash mapping.
    pub fn put_tx_mapping(&self, tx_hash: &TxHash, cid: &Cid) -> QuillResult<()> {
        self.put(&CacheKey::tx(tx_hash.as_str()), cid.as_str().as_bytes())
    }

    /// Resolve a transaction hash to the root hash it committed.
    pub fn get_root_for_tx(&self, tx_hash: &TxHash) -> QuillResult<Option<Cid>> {
        let bytes = self.get(&CacheKey::tx(tx_hash.as_str()))?;
        Ok(bytes.and_then(|b| String::from_utf8(b).ok()).map(Cid::new))
    }

    /// Iterate every payload in the root-hash namespace.
    ///
    /// This backs the partial-match degrade path on download, so it only
    /// touches keys in the root namespace.
    pub fn scan_payloads(&self) -> QuillResult<Vec<(Cid, Vec<u8>)>> {
        let rtxn = self
            .env
            .inner()
            .read_txn()
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        let prefix = Namespace::Root.prefix();
        let iter = self
            .db
            .prefix_iter(&rtxn, &prefix[..])
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        let mut entries = Vec::new();
        for result in iter {
            let (key, value) = result.map_err(|e| StoreError::Transaction(e.to_string()))?;
            if let Some(decoded) = CacheKey::decode(key) {
                entries.push((Cid::new(decoded.body()), value.to_vec()));
            }
        }

        Ok(entries)
    }

    /// Snapshot of the hit/miss statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats
            .read()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    fn put(&self, key: &CacheKey, value: &[u8]) -> QuillResult<()> {
        let encoded = key.encode();

        let mut wtxn = self
            .env
            .inner()
            .write_txn()
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        // Presence check inside the write transaction, so a concurrent
        // put of the same new key cannot double-count it
        let is_new = self
            .db
            .get(&wtxn, &encoded)
            .map_err(|e| StoreError::Transaction(e.to_string()))?
            .is_none();

        self.db
            .put(&mut wtxn, &encoded, value)
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        wtxn.commit()
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        if is_new {
            if let Ok(mut stats) = self.stats.write() {
                stats.entry_count += 1;
            }
        }

        Ok(())
    }

    fn get(&self, key: &CacheKey) -> QuillResult<Option<Vec<u8>>> {
        let rtxn = self
            .env
            .inner()
            .read_txn()
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        match self.db.get(&rtxn, &key.encode()) {
            Ok(Some(bytes)) => {
                self.record_hit();
                Ok(Some(bytes.to_vec()))
            }
            Ok(None) => {
                self.record_miss();
                Ok(None)
            }
            Err(e) => {
                self.record_miss();
                Err(StoreError::Transaction(e.to_string()).into())
            }
        }
    }

    fn record_hit(&self) {
        if let Ok(mut stats) = self.stats.write() {
            stats.hits += 1;
        }
    }

    fn record_miss(&self) {
        if let Ok(mut stats) = self.stats.write() {
            stats.misses += 1;
        }
    }
}
