//! Merkle tree content addressing.
//!
//! The storage network addresses a payload by the root of a binary hash
//! tree built over its 256-byte chunks: keccak256 leaves, keccak256 over
//! concatenated children for parents, odd nodes promoted unchanged. The
//! root hash is the payload's CID, so identical bytes always address the
//! same content.

use alloy_primitives::{keccak256, B256};
use quill_core::{Cid, UploadError};

/// Chunk size the tree hashes over.
pub const CHUNK_SIZE: usize = 256;

/// Soft segment-size threshold for a single upload. Payloads above this
/// are advisory-warned and uploaded with a smaller task-size hint.
pub const SEGMENT_SIZE: usize = 256 * 1024;

/// A file object staged for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileObject {
    name: String,
    bytes: Vec<u8>,
}

impl FileObject {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Build the Merkle tree for this file's content.
    pub fn merkle_tree(&self) -> Result<MerkleTree, UploadError> {
        MerkleTree::build(&self.bytes)
    }
}

/// Binary Merkle tree over a payload's chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    root: Option<B256>,
    leaf_count: usize,
}

impl MerkleTree {
    /// Build the tree over `data`.
    ///
    /// Fails for an empty payload: the network cannot address zero chunks.
    pub fn build(data: &[u8]) -> Result<Self, UploadError> {
        if data.is_empty() {
            return Err(UploadError::TreeGenerationFailed {
                reason: "payload is empty".to_string(),
            });
        }

        let mut level: Vec<B256> = data.chunks(CHUNK_SIZE).map(keccak256).collect();
        let leaf_count = level.len();

        while level.len() > 1 {
            let mut next = Vec::with_capacity(level.len().div_ceil(2));
            for pair in level.chunks(2) {
                if pair.len() == 2 {
                    let mut joined = [0u8; 64];
                    joined[..32].copy_from_slice(pair[0].as_slice());
                    joined[32..].copy_from_slice(pair[1].as_slice());
                    next.push(keccak256(joined));
                } else {
                    // Odd node: promoted unchanged
                    next.push(pair[0]);
                }
            }
            level = next;
        }

        Ok(Self {
            root: level.first().copied(),
            leaf_count,
        })
    }

    /// The root hash, if the tree produced one.
    pub fn root_hash(&self) -> Option<B256> {
        self.root
    }

    /// The root hash as a content identifier.
    pub fn root_cid(&self) -> Option<Cid> {
        self.root.map(|root| Cid::new(root.to_string()))
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }
}
