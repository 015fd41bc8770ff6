//! Note entity types

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::Cid;

/// A note as stored on the network.
///
/// Immutable once uploaded: there is no update-in-place, a later edit
/// produces a new CID and updates the index pointer instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Derived as `<author>-<created_at millis>`. Unique per author per
    /// millisecond; no collision protection across clock skew.
    pub id: String,
    pub title: String,
    pub markdown: String,
    pub images: Vec<String>,
    pub public: bool,
    /// Creation timestamp in Unix milliseconds.
    #[serde(rename = "createdAt")]
    pub created_at: i64,
    /// Hex-prefixed wallet address of the creating client.
    pub author: Address,
}

impl Note {
    /// Build a new private note authored by `author` at `created_at`.
    pub fn new(title: impl Into<String>, markdown: impl Into<String>, author: Address, created_at: i64) -> Self {
        Self {
            id: derive_note_id(author, created_at),
            title: title.into(),
            markdown: markdown.into(),
            images: Vec::new(),
            public: false,
            created_at,
            author,
        }
    }
}

/// Derive the logical note id from author address and creation time.
pub fn derive_note_id(author: Address, created_at_millis: i64) -> String {
    format!("{author}-{created_at_millis}")
}

/// A [`Note`] annotated with the CID it was uploaded under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteWithCid {
    #[serde(flatten)]
    pub note: Note,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cid: Option<Cid>,
}

/// Lightweight pointer record mapping a logical note id to its current
/// content address.
///
/// This is the only mutable linkage between a stable logical identity and a
/// content-addressed blob: editing a note uploads a new payload and updates
/// this record's `cid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteIndexItem {
    pub id: String,
    pub cid: Cid,
    pub title: String,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
    #[serde(rename = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
}
