//! Storage network adapter.
//!
//! One normalized boundary for the upload and download entry points: the
//! submission response stays loosely structured ([`UploadResponse`])
//! because relay nodes answer with version-dependent JSON shapes, and
//! [`extract_tx_hash`] owns the precedence rules for digging the
//! transaction hash out of it. Downloads return the payload bytes in
//! memory so the caller can parse them directly.

use alloy_primitives::U256;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use quill_core::{Cid, DownloadError, QuillResult, TxHash, UploadError};
use regex::Regex;
use serde_json::{json, Value};
use tracing::debug;

use crate::merkle::{FileObject, SEGMENT_SIZE};
use crate::signer::{TransactionRequest, TransactionSigner};

/// 32-byte hex pattern for the last-resort transaction hash scan.
static TX_HASH_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"0x[a-fA-F0-9]{64}").expect("pattern is valid"));

/// Fixed options record submitted alongside an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    pub tags: String,
    pub finality_required: bool,
    /// Task-size hint; shrunk for payloads above the segment threshold.
    pub task_size: u64,
    pub expected_replica: u32,
    pub skip_tx: bool,
    pub fee: U256,
    pub nonce: Option<u64>,
}

impl UploadOptions {
    /// The standard options for a payload of `byte_size` bytes at `fee`.
    pub fn for_payload(byte_size: usize, fee: U256) -> Self {
        Self {
            tags: "0x".to_string(),
            finality_required: true,
            task_size: if byte_size > SEGMENT_SIZE { 1 } else { 10 },
            expected_replica: 1,
            skip_tx: false,
            fee,
            nonce: None,
        }
    }
}

/// Loosely structured submission response, as received from the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResponse(pub Value);

/// Extract the transaction hash from a submission response.
///
/// Tries, in order: a plain string; an object field named `hash`; an
/// object field named `transactionHash`; a regex scan for a 32-byte hex
/// pattern in the serialized response. An empty match fails the same as
/// no match.
pub fn extract_tx_hash(response: &UploadResponse) -> Result<TxHash, UploadError> {
    let value = &response.0;

    let candidate = if let Some(s) = value.as_str() {
        Some(s.to_string())
    } else if let Some(s) = value.get("hash").and_then(Value::as_str) {
        Some(s.to_string())
    } else if let Some(s) = value.get("transactionHash").and_then(Value::as_str) {
        Some(s.to_string())
    } else {
        let serialized = value.to_string();
        TX_HASH_PATTERN
            .find(&serialized)
            .map(|m| m.as_str().to_string())
    };

    match candidate {
        Some(hash) if !hash.is_empty() => Ok(TxHash::new(hash)),
        _ => Err(UploadError::NoTransactionHash {
            response: value.to_string(),
        }),
    }
}

/// The network's upload and download entry points.
#[async_trait]
pub trait StorageNetwork: Send + Sync {
    /// Submit a file through the resolved transaction signer against the
    /// configured RPC endpoint.
    async fn upload(
        &self,
        file: &FileObject,
        rpc_url: &str,
        signer: &dyn TransactionSigner,
        options: &UploadOptions,
    ) -> QuillResult<UploadResponse>;

    /// Fetch the payload addressed by `root`, optionally verifying the
    /// returned bytes against the requested root hash.
    async fn download(&self, root: &Cid, verify: bool) -> QuillResult<Vec<u8>>;
}

/// HTTP implementation speaking to the indexer.
pub struct HttpStorageNetwork {
    client: reqwest::Client,
    indexer_url: String,
}

impl HttpStorageNetwork {
    pub fn new(indexer_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            indexer_url: indexer_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl StorageNetwork for HttpStorageNetwork {
    async fn upload(
        &self,
        file: &FileObject,
        rpc_url: &str,
        signer: &dyn TransactionSigner,
        options: &UploadOptions,
    ) -> QuillResult<UploadResponse> {
        let tree = file.merkle_tree()?;
        let root = tree.root_hash().ok_or(UploadError::NoRootHash)?;

        debug!(rpc_url, root = %root, size = file.size(), "submitting storage transaction");

        // Commit the root on chain first; the indexer accepts segments
        // only for announced roots.
        let tx_hash = if options.skip_tx {
            None
        } else {
            let request = TransactionRequest {
                to: None,
                value: options.fee,
                data: root.to_vec(),
            };
            Some(signer.send_transaction(request).await?)
        };

        let body = json!({
            "root": root.to_string(),
            "data": hex::encode(file.bytes()),
            "tags": options.tags,
            "finalityRequired": options.finality_required,
            "taskSize": options.task_size,
            "expectedReplica": options.expected_replica,
            "txHash": tx_hash.as_ref().map(TxHash::as_str),
        });

        let response = self
            .client
            .post(format!("{}/file/segment", self.indexer_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| UploadError::SubmissionFailed {
                reason: format!("indexer request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(UploadError::SubmissionFailed {
                reason: format!("indexer returned {status}: {text}"),
            }
            .into());
        }

        let mut value = response.json::<Value>().await.unwrap_or(Value::Null);
        if let (Some(obj), Some(hash)) = (value.as_object_mut(), tx_hash.as_ref()) {
            // Some indexer versions omit the hash from their reply
            obj.entry("hash").or_insert_with(|| json!(hash.as_str()));
        } else if value.is_null() {
            value = match tx_hash {
                Some(hash) => json!({ "hash": hash.as_str() }),
                None => Value::Null,
            };
        }

        Ok(UploadResponse(value))
    }

    async fn download(&self, root: &Cid, verify: bool) -> QuillResult<Vec<u8>> {
        let response = self
            .client
            .get(format!("{}/file", self.indexer_url))
            .query(&[("root", root.as_str())])
            .send()
            .await
            .map_err(|e| DownloadError::Failed {
                cid: root.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Failed {
                cid: root.to_string(),
                reason: format!("indexer returned {status}"),
            }
            .into());
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DownloadError::Failed {
                cid: root.to_string(),
                reason: e.to_string(),
            })?
            .to_vec();

        if verify {
            let downloaded_root = crate::merkle::MerkleTree::build(&bytes)
                .ok()
                .and_then(|tree| tree.root_cid());
            if downloaded_root.as_ref() != Some(root) {
                return Err(DownloadError::Failed {
                    cid: root.to_string(),
                    reason: "downloaded bytes do not match requested root".to_string(),
                }
                .into());
            }
        }

        Ok(bytes)
    }
}

impl std::fmt::Debug for HttpStorageNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpStorageNetwork")
            .field("indexer_url", &self.indexer_url)
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_from_plain_string() {
        let response = UploadResponse(json!("0xplainhash"));
        let hash = extract_tx_hash(&response).expect("extract should succeed");
        assert_eq!(hash.as_str(), "0xplainhash");
    }

    #[test]
    fn test_extract_from_hash_field() {
        let response = UploadResponse(json!({ "hash": "0xfieldhash" }));
        let hash = extract_tx_hash(&response).expect("extract should succeed");
        assert_eq!(hash.as_str(), "0xfieldhash");
    }

    #[test]
    fn test_extract_from_transaction_hash_field() {
        let response = UploadResponse(json!({ "transactionHash": "0xlegacy" }));
        let hash = extract_tx_hash(&response).expect("extract should succeed");
        assert_eq!(hash.as_str(), "0xlegacy");
    }

    #[test]
    fn test_hash_field_takes_precedence() {
        let response = UploadResponse(json!({
            "hash": "0xpreferred",
            "transactionHash": "0xignored",
        }));
        let hash = extract_tx_hash(&response).expect("extract should succeed");
        assert_eq!(hash.as_str(), "0xpreferred");
    }

    #[test]
    fn test_extract_regex_fallback() {
        let buried = format!("0x{}", "ab".repeat(32));
        let response = UploadResponse(json!({
            "receipt": { "nested": { "txn": buried } }
        }));
        let hash = extract_tx_hash(&response).expect("extract should succeed");
        assert_eq!(hash.as_str(), buried);
    }

    #[test]
    fn test_extract_rejects_empty_hash() {
        let response = UploadResponse(json!({ "hash": "" }));
        let err = extract_tx_hash(&response).expect_err("extract should fail");
        assert!(matches!(err, UploadError::NoTransactionHash { .. }));
    }

    #[test]
    fn test_extract_no_match() {
        let response = UploadResponse(json!({ "status": "ok", "seq": 42 }));
        let err = extract_tx_hash(&response).expect_err("extract should fail");
        assert!(matches!(err, UploadError::NoTransactionHash { .. }));
    }

    #[test]
    fn test_upload_options_task_size_hint() {
        let fee = U256::from(1u64);
        assert_eq!(UploadOptions::for_payload(100, fee).task_size, 10);
        assert_eq!(UploadOptions::for_payload(SEGMENT_SIZE, fee).task_size, 10);
        assert_eq!(
            UploadOptions::for_payload(SEGMENT_SIZE + 1, fee).task_size,
            1
        );
    }
}
