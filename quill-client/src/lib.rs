//! Quill Client - storage client for decentralized note persistence
//!
//! Notes are serialized, fee-priced, Merkle-addressed, and submitted to a
//! content-addressed storage network through a negotiated wallet signer.
//! Downloads resolve a CID back to a note, preferring the local cache so
//! a freshly written note is readable before the remote index catches up.
//!
//! [`NoteClient`] is the entry point the page layer calls; the pipeline
//! pieces ([`Uploader`], [`Downloader`], fee estimation, signer
//! negotiation) are public for callers that need finer control.

pub mod download;
pub mod fee;
pub mod merkle;
pub mod network;
pub mod signer;
pub mod upload;

pub use download::Downloader;
pub use fee::{estimate_fee, format_fee};
pub use merkle::{FileObject, MerkleTree, CHUNK_SIZE, SEGMENT_SIZE};
pub use network::{
    extract_tx_hash, HttpStorageNetwork, StorageNetwork, UploadOptions, UploadResponse,
};
pub use signer::{
    resolve_address, to_transaction_signer, NoInjectedProvider, ProviderLookup,
    TransactionRequest, TransactionSigner, WalletSigner,
};
pub use upload::{UploadReceipt, Uploader};

use std::sync::Arc;

use alloy_primitives::U256;
use chrono::Utc;
use quill_core::{Cid, FeeScheduleConfig, Note, NoteWithCid, QuillResult, StorageConfig};
use quill_store::{NoteCache, NoteIndex, StoreEnv};
use tracing::debug;

/// High-level client the page layer talks to.
///
/// Owns the local store, the upload pipeline, and the download resolver.
/// Successful uploads register a pointer record in the note index - that
/// is how a note shows up in listings before the remote index knows it.
pub struct NoteClient {
    config: StorageConfig,
    schedule: FeeScheduleConfig,
    index: NoteIndex,
    lookup: Arc<dyn ProviderLookup>,
    uploader: Uploader,
    downloader: Downloader,
}

impl NoteClient {
    /// Open a client against the configured endpoints with no injected
    /// wallet provider.
    pub fn new(config: StorageConfig) -> QuillResult<Self> {
        let network = Arc::new(HttpStorageNetwork::new(config.indexer_url.clone()));
        Self::with_collaborators(
            config,
            FeeScheduleConfig::default(),
            network,
            Arc::new(NoInjectedProvider),
        )
    }

    /// Open a client with explicit network and provider-lookup
    /// collaborators.
    pub fn with_collaborators(
        config: StorageConfig,
        schedule: FeeScheduleConfig,
        network: Arc<dyn StorageNetwork>,
        lookup: Arc<dyn ProviderLookup>,
    ) -> QuillResult<Self> {
        let env = StoreEnv::open(&config.data_dir, config.max_store_mb)?;
        let cache = NoteCache::new(&env)?;
        let index = NoteIndex::new(&env)?;

        let uploader = Uploader::new(
            config.clone(),
            schedule.clone(),
            cache.clone(),
            Arc::clone(&network),
            Arc::clone(&lookup),
        );
        let downloader = Downloader::new(cache, network);

        Ok(Self {
            config,
            schedule,
            index,
            lookup,
            uploader,
            downloader,
        })
    }

    /// Create and upload a new private note, registering its index
    /// pointer.
    ///
    /// Returns the note annotated with its CID, and the fee the upload
    /// was submitted with.
    pub async fn save_note(
        &self,
        title: &str,
        markdown: &str,
        signer: &WalletSigner,
    ) -> QuillResult<(NoteWithCid, U256)> {
        let author = resolve_address(signer, self.lookup.as_ref()).await?;
        let note = Note::new(title, markdown, author, Utc::now().timestamp_millis());

        let receipt = self.uploader.upload(&note, signer).await?;

        // Required post-condition: the pointer record makes the note
        // discoverable by id.
        self.index.add(receipt.index_item(&note))?;
        debug!(note_id = %note.id, cid = %receipt.cid, "note saved and indexed");

        let fee = receipt.fee;
        Ok((
            NoteWithCid {
                note,
                cid: Some(receipt.cid),
            },
            fee,
        ))
    }

    /// Resolve a CID back to its note.
    pub async fn get_note(&self, cid: &Cid) -> QuillResult<Note> {
        self.downloader.download(cid).await
    }

    /// Estimate (without uploading) the fee for a payload of
    /// `byte_size` bytes.
    pub fn estimate_fee(&self, byte_size: u64) -> U256 {
        estimate_fee(&self.schedule, byte_size)
    }

    /// Shareable gateway link for a CID.
    pub fn gateway_url(&self, cid: &Cid) -> String {
        format!("{}{}", self.config.gateway_url, cid)
    }

    /// The caller-visible note index.
    pub fn index(&self) -> &NoteIndex {
        &self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::testing::MockNetwork;
    use alloy_primitives::Address;
    use async_trait::async_trait;
    use quill_core::TxHash;
    use serde_json::json;
    use tempfile::TempDir;

    struct StaticSigner;

    #[async_trait]
    impl TransactionSigner for StaticSigner {
        async fn address(&self) -> QuillResult<Address> {
            Ok("0x5555555555555555555555555555555555555555"
                .parse()
                .expect("valid address"))
        }

        async fn send_transaction(&self, _tx: TransactionRequest) -> QuillResult<TxHash> {
            Ok(TxHash::new("0xsigned"))
        }
    }

    fn build_client(network: Arc<MockNetwork>) -> (NoteClient, TempDir) {
        let temp_dir = TempDir::new().expect("TempDir creation should succeed");
        let config = StorageConfig {
            data_dir: temp_dir.path().to_path_buf(),
            ..StorageConfig::default()
        };
        let client = NoteClient::with_collaborators(
            config,
            FeeScheduleConfig::default(),
            network,
            Arc::new(NoInjectedProvider),
        )
        .expect("client creation should succeed");
        (client, temp_dir)
    }

    fn scripted_hash() -> String {
        format!("0x{}", "ef".repeat(32))
    }

    #[tokio::test]
    async fn test_save_then_get_round_trip() {
        let network = Arc::new(MockNetwork::new());
        network.script_upload(Ok(UploadResponse(json!({ "hash": scripted_hash() }))));
        let (client, _temp_dir) = build_client(Arc::clone(&network));

        let signer = WalletSigner::Direct(Arc::new(StaticSigner));
        let (saved, fee) = client
            .save_note("My Note", "# heading\n\nbody", &signer)
            .await
            .expect("save should succeed");

        let cid = saved.cid.clone().expect("cid should be present");
        assert!(fee > U256::ZERO);

        // Round trip from the local cache, without a network download
        let fetched = client.get_note(&cid).await.expect("get should succeed");
        assert_eq!(fetched, saved.note);
        assert_eq!(network.download_calls(), 0);
    }

    #[tokio::test]
    async fn test_save_registers_index_pointer() {
        let network = Arc::new(MockNetwork::new());
        network.script_upload(Ok(UploadResponse(json!({ "hash": scripted_hash() }))));
        let (client, _temp_dir) = build_client(network);

        let signer = WalletSigner::Direct(Arc::new(StaticSigner));
        let (saved, _fee) = client
            .save_note("Indexed", "body", &signer)
            .await
            .expect("save should succeed");

        let item = client
            .index()
            .find_by_id(&saved.note.id)
            .expect("find should succeed")
            .expect("pointer should be registered");
        assert_eq!(Some(item.cid), saved.cid);
        assert_eq!(item.title, "Indexed");
        assert_eq!(item.public, Some(false));
    }

    #[tokio::test]
    async fn test_estimate_fee_matches_worked_scenario() {
        let network = Arc::new(MockNetwork::new());
        let (client, _temp_dir) = build_client(network);
        assert_eq!(
            client.estimate_fee(1000),
            U256::from(200_000_000_000_000_000u128)
        );
    }

    #[tokio::test]
    async fn test_gateway_url() {
        let network = Arc::new(MockNetwork::new());
        let (client, _temp_dir) = build_client(network);
        let url = client.gateway_url(&Cid::new("0xabc"));
        assert!(url.ends_with("0xabc"));
        assert!(url.starts_with("https://"));
    }
}
