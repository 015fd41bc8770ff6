//! Local cache for uploaded payloads.
//!
//! Two key namespaces over one LMDB database:
//!
//! - [`Namespace::Root`]: content root hash (CID) to payload bytes
//! - [`Namespace::Tx`]: transaction hash to root hash
//!
//! Cache writes on the upload path are best-effort; callers log and
//! continue when a write fails.

mod key;
mod lmdb;

pub use key::{CacheKey, Namespace};
pub use lmdb::{CacheStats, NoteCache};
