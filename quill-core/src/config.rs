//! Storage client configuration
//!
//! Configuration is loaded from environment variables with hardcoded
//! fallback defaults, so the client works out of the box against the
//! public testnet endpoints.

use alloy_primitives::U256;
use std::path::PathBuf;

/// Default RPC endpoint for chain transactions.
pub const DEFAULT_RPC_URL: &str = "https://evmrpc-testnet.0g.ai/";

/// Default indexer endpoint brokering uploads and downloads.
pub const DEFAULT_INDEXER_URL: &str = "https://indexer-storage-testnet-turbo.0g.ai";

/// Default gateway URL base for serving content by CID.
pub const DEFAULT_GATEWAY_URL: &str = "https://gateway.0g.ai/ipfs/";

/// Storage client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// RPC endpoint URL for chain transactions.
    pub rpc_url: String,

    /// Indexer endpoint URL brokering uploads and downloads.
    pub indexer_url: String,

    /// Gateway URL base; a CID is appended to form a shareable link.
    pub gateway_url: String,

    /// Bounded attempt count for the network-submission step.
    /// 1 means no retry.
    pub max_retries: u32,

    /// Directory for the local LMDB store.
    pub data_dir: PathBuf,

    /// Maximum size of the local store in megabytes.
    pub max_store_mb: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            indexer_url: DEFAULT_INDEXER_URL.to_string(),
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            max_retries: 1,
            data_dir: PathBuf::from(".quill"),
            max_store_mb: 100,
        }
    }
}

impl StorageConfig {
    /// Create a StorageConfig from environment variables.
    ///
    /// Environment variables:
    /// - `QUILL_RPC_URL`: Chain RPC endpoint (default: public testnet)
    /// - `QUILL_INDEXER_URL`: Indexer endpoint (default: public testnet)
    /// - `QUILL_GATEWAY_URL`: Gateway URL base (default: public testnet)
    /// - `QUILL_MAX_RETRIES`: Upload submission attempts (default: 1)
    /// - `QUILL_DATA_DIR`: Local store directory (default: `.quill`)
    /// - `QUILL_MAX_STORE_MB`: Local store size cap (default: 100)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let rpc_url = std::env::var("QUILL_RPC_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.rpc_url);

        let indexer_url = std::env::var("QUILL_INDEXER_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.indexer_url);

        let gateway_url = std::env::var("QUILL_GATEWAY_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.gateway_url);

        let max_retries = std::env::var("QUILL_MAX_RETRIES")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|n| *n >= 1)
            .unwrap_or(defaults.max_retries);

        let data_dir = std::env::var("QUILL_DATA_DIR")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let max_store_mb = std::env::var("QUILL_MAX_STORE_MB")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_store_mb);

        Self {
            rpc_url,
            indexer_url,
            gateway_url,
            max_retries,
            data_dir,
            max_store_mb,
        }
    }
}

/// Fee schedule for storage uploads, denominated in the chain's base token
/// (18 decimals).
///
/// The estimate is `min(max_fee, (base_fee + size * per_byte_fee) *
/// discount_percent / 100)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeScheduleConfig {
    /// Flat fee charged per upload.
    pub base_fee: U256,

    /// Fee per payload byte.
    pub per_byte_fee: U256,

    /// Hard ceiling on the total fee.
    pub max_fee: U256,

    /// Flat discount multiplier as a percentage (10 means pay 10%).
    pub discount_percent: u64,
}

impl Default for FeeScheduleConfig {
    fn default() -> Self {
        Self {
            // 1 token
            base_fee: U256::from(1_000_000_000_000_000_000u128),
            // 0.001 token per byte
            per_byte_fee: U256::from(1_000_000_000_000_000u128),
            // 10 tokens
            max_fee: U256::from(10_000_000_000_000_000_000u128),
            // 90% testnet discount
            discount_percent: 10,
        }
    }
}
