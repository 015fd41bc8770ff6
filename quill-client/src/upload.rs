//! Upload pipeline.
//!
//! Serializes a note, applies the soft segment-size check, computes the
//! fee and the Merkle root, submits through the negotiated signer with a
//! bounded attempt count, and extracts the transaction hash from the
//! loosely structured response. Cache writes at the end are best-effort:
//! a failure there is logged and never fails the upload.

use std::sync::Arc;

use alloy_primitives::U256;
use quill_core::{
    Cid, FeeScheduleConfig, Note, NoteIndexItem, QuillError, QuillResult, StorageConfig,
    StoreError, TxHash, UploadError,
};
use quill_store::NoteCache;
use tracing::{debug, error, warn};

use crate::fee::estimate_fee;
use crate::merkle::{FileObject, SEGMENT_SIZE};
use crate::network::{extract_tx_hash, StorageNetwork, UploadOptions};
use crate::signer::{resolve_address, to_transaction_signer, ProviderLookup, WalletSigner};

/// Result of a successful upload.
///
/// Carries everything the caller needs to register the index pointer that
/// is the required post-condition of an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    /// The content's canonical CID (its Merkle root hash).
    pub cid: Cid,
    /// The submission transaction hash; distinct from the CID.
    pub tx_hash: TxHash,
    /// Final serialized payload size in bytes.
    pub byte_size: usize,
    /// Fee the upload was submitted with.
    pub fee: U256,
}

impl UploadReceipt {
    /// Build the index pointer record for the uploaded note.
    pub fn index_item(&self, note: &Note) -> NoteIndexItem {
        NoteIndexItem {
            id: note.id.clone(),
            cid: self.cid.clone(),
            title: note.title.clone(),
            created_at: note.created_at,
            updated_at: None,
            public: Some(note.public),
        }
    }
}

/// The upload pipeline.
pub struct Uploader {
    config: StorageConfig,
    schedule: FeeScheduleConfig,
    cache: NoteCache,
    network: Arc<dyn StorageNetwork>,
    lookup: Arc<dyn ProviderLookup>,
}

impl Uploader {
    pub fn new(
        config: StorageConfig,
        schedule: FeeScheduleConfig,
        cache: NoteCache,
        network: Arc<dyn StorageNetwork>,
        lookup: Arc<dyn ProviderLookup>,
    ) -> Self {
        Self {
            config,
            schedule,
            cache,
            network,
            lookup,
        }
    }

    /// Upload a note, returning its receipt.
    pub async fn upload(&self, note: &Note, signer: &WalletSigner) -> QuillResult<UploadReceipt> {
        let address = resolve_address(signer, self.lookup.as_ref()).await?;
        debug!(%address, note_id = %note.id, "starting note upload");

        let mut payload =
            serde_json::to_vec(note).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let mut file_name = "note.json";

        // Soft threshold: attempt a lossless compact re-serialization,
        // then warn and proceed if the payload is still oversize.
        if payload.len() > SEGMENT_SIZE {
            debug!(size = payload.len(), "payload is large, attempting compact re-serialization");
            match compact_json(&payload) {
                Ok(compacted) if compacted.len() < payload.len() => {
                    debug!(from = payload.len(), to = compacted.len(), "re-serialization shrank payload");
                    payload = compacted;
                    file_name = "note-compressed.json";
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "compact re-serialization failed, using original payload");
                }
            }
            if payload.len() > SEGMENT_SIZE {
                warn!(
                    size = payload.len(),
                    threshold = SEGMENT_SIZE,
                    "payload exceeds recommended segment size; the network may reject the write"
                );
            }
        }

        let fee = estimate_fee(&self.schedule, payload.len() as u64);
        debug!(size = payload.len(), fee = %fee, "calculated storage fee");

        let file = FileObject::new(file_name, payload);
        let tree = file.merkle_tree()?;
        let cid = tree.root_cid().ok_or(UploadError::NoRootHash)?;
        debug!(%cid, "computed content root hash");

        let tx_signer = to_transaction_signer(signer, self.lookup.as_ref())?;
        let options = UploadOptions::for_payload(file.size(), fee);

        let max_retries = self.config.max_retries.max(1);
        let mut last_error: Option<QuillError> = None;
        let mut response = None;

        for attempt in 1..=max_retries {
            debug!(attempt, max_retries, "upload attempt");
            match self
                .network
                .upload(&file, &self.config.rpc_url, tx_signer.as_ref(), &options)
                .await
            {
                Ok(ok) => {
                    response = Some(ok);
                    break;
                }
                Err(e) => {
                    error!(attempt, error = %e, "upload attempt failed");
                    last_error = Some(e);
                }
            }
        }

        let response = match response {
            Some(response) => response,
            None => {
                return Err(UploadError::Exhausted {
                    attempts: max_retries,
                    last_error: last_error
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| "unknown error".to_string()),
                }
                .into());
            }
        };

        let tx_hash = extract_tx_hash(&response)?;

        // Best-effort: the local cache bridges the indexer lag after a
        // fresh write, but a cache failure must not fail the upload.
        if let Err(e) = self.cache.put_payload(&cid, file.bytes()) {
            warn!(error = %e, %cid, "failed to cache uploaded payload");
        }
        if let Err(e) = self.cache.put_tx_mapping(&tx_hash, &cid) {
            warn!(error = %e, %tx_hash, "failed to cache tx-to-root mapping");
        }

        debug!(%cid, %tx_hash, "upload complete");

        Ok(UploadReceipt {
            cid,
            tx_hash,
            byte_size: file.size(),
            fee,
        })
    }
}

/// Lossless re-serialization: parse and re-emit without whitespace.
fn compact_json(payload: &[u8]) -> Result<Vec<u8>, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_slice(payload)?;
    serde_json::to_vec(&value)
}
