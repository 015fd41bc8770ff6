//! Quill Core - Entity Types
//!
//! Pure data structures with no behavior. All other crates depend on this.
//! This crate contains the note entity types, content identifiers, the
//! error taxonomy, and configuration - no storage or network logic.

pub mod config;
pub mod error;
pub mod identity;
pub mod note;

pub use config::{FeeScheduleConfig, StorageConfig};
pub use error::{
    ConfigError, DownloadError, QuillError, QuillResult, SignerError, StoreError, UploadError,
};
pub use identity::{compute_content_hash, Cid, ContentHash, TxHash};
pub use note::{Note, NoteIndexItem, NoteWithCid};
