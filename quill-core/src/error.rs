//! Error types for quill operations

use thiserror::Error;

/// Signer negotiation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignerError {
    #[error("Wallet not connected")]
    NotConnected,

    #[error("Unsupported signer kind: {reason}")]
    UnsupportedSignerKind { reason: String },

    #[error("No compatible transaction signer available; connect a browser wallet")]
    NoSignerAvailable,

    #[error("Failed to get wallet address from signer: {reason}")]
    AddressUnavailable { reason: String },
}

/// Upload pipeline errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("Failed to generate Merkle tree: {reason}")]
    TreeGenerationFailed { reason: String },

    #[error("Failed to get root hash from Merkle tree")]
    NoRootHash,

    #[error("Network submission failed: {reason}")]
    SubmissionFailed { reason: String },

    #[error("Upload failed after {attempts} attempts. Last error: {last_error}")]
    Exhausted { attempts: u32, last_error: String },

    #[error("Upload succeeded but no transaction hash found in response: {response}")]
    NoTransactionHash { response: String },
}

/// Download resolver errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DownloadError {
    #[error("Invalid CID: empty or undefined")]
    InvalidCid,

    #[error("Download failed for CID {cid}: {reason}")]
    Failed { cid: String, reason: String },

    #[error("Downloaded payload for CID {cid} is not a valid note: {reason}")]
    MalformedPayload { cid: String, reason: String },
}

/// Local store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Failed to open store environment: {0}")]
    EnvOpen(String),

    #[error("Failed to open database: {0}")]
    DbOpen(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all quill operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QuillError {
    #[error("Signer error: {0}")]
    Signer(#[from] SignerError),

    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    #[error("Download error: {0}")]
    Download(#[from] DownloadError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl QuillError {
    /// Whether this failure is an insufficient-balance class error.
    ///
    /// The calling UI translates these into an actionable top-up message;
    /// all other errors are shown verbatim.
    pub fn is_insufficient_funds(&self) -> bool {
        self.to_string().to_lowercase().contains("insufficient funds")
    }
}

/// Result type alias for quill operations.
pub type QuillResult<T> = Result<T, QuillError>;
