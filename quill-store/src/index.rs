//! Note index: logical id to content address pointers.
//!
//! The index is the caller-visible list of [`NoteIndexItem`] records,
//! persisted as a single serialized list under one well-known key. The
//! upload path registers a pointer here after every successful upload;
//! re-adding an id replaces the old pointer, which is how an edited note
//! moves to its new CID.

use heed::types::Bytes;
use heed::Database;
use quill_core::{NoteIndexItem, QuillResult, StoreError};

use crate::StoreEnv;

/// Well-known key the serialized list lives under.
const INDEX_KEY: &[u8] = b"note-index";

/// The persisted note index.
#[derive(Debug, Clone)]
pub struct NoteIndex {
    env: StoreEnv,
    db: Database<Bytes, Bytes>,
}

impl NoteIndex {
    /// Open the index database inside `env`.
    pub fn new(env: &StoreEnv) -> QuillResult<Self> {
        let mut wtxn = env
            .inner()
            .write_txn()
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        let db: Database<Bytes, Bytes> = env
            .inner()
            .create_database(&mut wtxn, Some("index"))
            .map_err(|e| StoreError::DbOpen(e.to_string()))?;

        wtxn.commit()
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        Ok(Self {
            env: env.clone(),
            db,
        })
    }

    /// All index items, newest registration last.
    pub fn get(&self) -> QuillResult<Vec<NoteIndexItem>> {
        let rtxn = self
            .env
            .inner()
            .read_txn()
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        match self
            .db
            .get(&rtxn, INDEX_KEY)
            .map_err(|e| StoreError::Transaction(e.to_string()))?
        {
            Some(bytes) => {
                let items = serde_json::from_slice(bytes)
                    .map_err(|e| StoreError::Deserialization(e.to_string()))?;
                Ok(items)
            }
            None => Ok(Vec::new()),
        }
    }

    /// Register a pointer record.
    ///
    /// Replaces any existing record with the same id, so an edit that
    /// produced a new CID supersedes the old pointer.
    pub fn add(&self, item: NoteIndexItem) -> QuillResult<()> {
        let mut items = self.get()?;
        items.retain(|existing| existing.id != item.id);
        items.push(item);
        self.write(&items)
    }

    /// Look up a pointer record by logical note id.
    pub fn find_by_id(&self, id: &str) -> QuillResult<Option<NoteIndexItem>> {
        Ok(self.get()?.into_iter().find(|item| item.id == id))
    }

    /// Remove the pointer record for `id`, if present.
    pub fn remove(&self, id: &str) -> QuillResult<()> {
        let mut items = self.get()?;
        items.retain(|item| item.id != id);
        self.write(&items)
    }

    fn write(&self, items: &[NoteIndexItem]) -> QuillResult<()> {
        let bytes = serde_json::to_vec(items)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let mut wtxn = self
            .env
            .inner()
            .write_txn()
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        self.db
            .put(&mut wtxn, INDEX_KEY, &bytes)
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        wtxn.commit()
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::Cid;
    use tempfile::TempDir;

    fn create_test_index() -> (NoteIndex, TempDir) {
        let temp_dir = TempDir::new().expect("TempDir creation should succeed");
        let env = StoreEnv::open(temp_dir.path(), 10).expect("env open should succeed");
        let index = NoteIndex::new(&env).expect("index creation should succeed");
        (index, temp_dir)
    }

    fn make_item(id: &str, cid: &str) -> NoteIndexItem {
        NoteIndexItem {
            id: id.to_string(),
            cid: Cid::new(cid),
            title: format!("note {id}"),
            created_at: 1700000000000,
            updated_at: None,
            public: Some(false),
        }
    }

    #[test]
    fn test_empty_index() {
        let (index, _temp_dir) = create_test_index();
        assert!(index.get().expect("get should succeed").is_empty());
        assert!(index
            .find_by_id("missing")
            .expect("find should succeed")
            .is_none());
    }

    #[test]
    fn test_add_and_find() {
        let (index, _temp_dir) = create_test_index();

        index.add(make_item("a", "0xaaa")).expect("add should succeed");
        index.add(make_item("b", "0xbbb")).expect("add should succeed");

        let items = index.get().expect("get should succeed");
        assert_eq!(items.len(), 2);

        let found = index
            .find_by_id("a")
            .expect("find should succeed")
            .expect("item should exist");
        assert_eq!(found.cid, Cid::new("0xaaa"));
    }

    #[test]
    fn test_add_replaces_same_id() {
        let (index, _temp_dir) = create_test_index();

        index.add(make_item("a", "0xold")).expect("add should succeed");

        let mut updated = make_item("a", "0xnew");
        updated.updated_at = Some(1700000001000);
        index.add(updated).expect("add should succeed");

        let items = index.get().expect("get should succeed");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].cid, Cid::new("0xnew"));
        assert_eq!(items[0].updated_at, Some(1700000001000));
    }

    #[test]
    fn test_remove() {
        let (index, _temp_dir) = create_test_index();

        index.add(make_item("a", "0xaaa")).expect("add should succeed");
        index.add(make_item("b", "0xbbb")).expect("add should succeed");

        index.remove("a").expect("remove should succeed");

        let items = index.get().expect("get should succeed");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "b");

        // Removing an absent id is a no-op
        index.remove("a").expect("remove should succeed");
        assert_eq!(index.get().expect("get should succeed").len(), 1);
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp_dir = TempDir::new().expect("TempDir creation should succeed");
        {
            let env = StoreEnv::open(temp_dir.path(), 10).expect("env open should succeed");
            let index = NoteIndex::new(&env).expect("index creation should succeed");
            index.add(make_item("a", "0xaaa")).expect("add should succeed");
        }

        let env = StoreEnv::open(temp_dir.path(), 10).expect("env open should succeed");
        let index = NoteIndex::new(&env).expect("index creation should succeed");
        assert_eq!(index.get().expect("get should succeed").len(), 1);
    }
}
