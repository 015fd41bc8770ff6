//! Wallet signer negotiation.
//!
//! Heterogeneous wallet client objects are accepted without coupling to
//! one wallet library: the input is a tagged [`WalletSigner`] with
//! explicit constructors rather than a duck-typed object, and the
//! browser-injected provider is an explicit [`ProviderLookup`] capability
//! passed by the caller rather than ambient global state.
//!
//! The adapter never assumes ownership of credentials - it only proxies
//! calls through shared handles.

use std::fmt;
use std::sync::Arc;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use quill_core::{QuillResult, SignerError, TxHash};
use serde_json::Value;

/// A transaction to submit through a signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    /// Recipient; `None` targets the storage market entry point.
    pub to: Option<Address>,
    /// Value attached to the transaction (the storage fee).
    pub value: U256,
    /// Call data (the submission payload).
    pub data: Vec<u8>,
}

/// Capability set the upload path needs from a wallet: address retrieval
/// and transaction signing. Implementations must be thread-safe.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    /// The wallet address this signer authorizes for.
    async fn address(&self) -> QuillResult<Address>;

    /// Sign and submit a transaction, returning its hash.
    async fn send_transaction(&self, tx: TransactionRequest) -> QuillResult<TxHash>;
}

/// Lookup capability for a browser-injected (or otherwise ambient)
/// transaction signer.
///
/// Passing this in explicitly replaces reads of process-wide mutable
/// state; a host without an injected provider supplies
/// [`NoInjectedProvider`].
pub trait ProviderLookup: Send + Sync {
    fn injected_signer(&self) -> Option<Arc<dyn TransactionSigner>>;
}

/// A [`ProviderLookup`] for hosts with no injected wallet.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInjectedProvider;

impl ProviderLookup for NoInjectedProvider {
    fn injected_signer(&self) -> Option<Arc<dyn TransactionSigner>> {
        None
    }
}

/// The wallet object handed to the upload path, as a closed set of shapes.
#[derive(Clone)]
pub enum WalletSigner {
    /// A full transaction-capable signer.
    Direct(Arc<dyn TransactionSigner>),
    /// An account record exposing only an address; transaction capability
    /// must come from the provider lookup.
    Account { address: Address },
    /// Defer entirely to the injected provider.
    Injected,
}

impl fmt::Debug for WalletSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletSigner::Direct(_) => f.write_str("WalletSigner::Direct"),
            WalletSigner::Account { address } => {
                f.debug_struct("WalletSigner::Account").field("address", address).finish()
            }
            WalletSigner::Injected => f.write_str("WalletSigner::Injected"),
        }
    }
}

impl WalletSigner {
    /// Classify a foreign wallet descriptor (the loosely-typed object a
    /// host application hands over) into a [`WalletSigner`].
    ///
    /// Recognized shapes:
    /// - an object with a nested `account` record carrying an `address`
    /// - an object tagged `{"type": "injected"}`
    ///
    /// `null` fails [`SignerError::NotConnected`]; anything else fails
    /// [`SignerError::UnsupportedSignerKind`].
    pub fn from_descriptor(descriptor: &Value) -> Result<Self, SignerError> {
        if descriptor.is_null() {
            return Err(SignerError::NotConnected);
        }

        if let Some(address) = descriptor
            .get("account")
            .and_then(|account| account.get("address"))
            .and_then(Value::as_str)
        {
            let address = address.parse::<Address>().map_err(|e| {
                SignerError::AddressUnavailable {
                    reason: e.to_string(),
                }
            })?;
            return Ok(WalletSigner::Account { address });
        }

        if descriptor.get("type").and_then(Value::as_str) == Some("injected") {
            return Ok(WalletSigner::Injected);
        }

        Err(SignerError::UnsupportedSignerKind {
            reason: format!("unrecognized wallet descriptor: {descriptor}"),
        })
    }
}

/// Resolve the wallet address for any signer shape.
pub async fn resolve_address(
    signer: &WalletSigner,
    lookup: &dyn ProviderLookup,
) -> QuillResult<Address> {
    match signer {
        WalletSigner::Direct(inner) => inner.address().await,
        WalletSigner::Account { address } => Ok(*address),
        WalletSigner::Injected => {
            let injected = lookup
                .injected_signer()
                .ok_or(SignerError::NoSignerAvailable)?;
            injected.address().await
        }
    }
}

/// Obtain a transaction-capable signer for any signer shape.
///
/// A [`WalletSigner::Direct`] passes through unchanged; the other shapes
/// fall back to the injected provider and fail
/// [`SignerError::NoSignerAvailable`] when none is present.
pub fn to_transaction_signer(
    signer: &WalletSigner,
    lookup: &dyn ProviderLookup,
) -> QuillResult<Arc<dyn TransactionSigner>> {
    match signer {
        WalletSigner::Direct(inner) => Ok(Arc::clone(inner)),
        WalletSigner::Account { .. } | WalletSigner::Injected => lookup
            .injected_signer()
            .ok_or_else(|| SignerError::NoSignerAvailable.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct StaticSigner {
        address: Address,
    }

    #[async_trait]
    impl TransactionSigner for StaticSigner {
        async fn address(&self) -> QuillResult<Address> {
            Ok(self.address)
        }

        async fn send_transaction(&self, _tx: TransactionRequest) -> QuillResult<TxHash> {
            Ok(TxHash::new("0xstatic"))
        }
    }

    struct StaticProvider {
        signer: Arc<dyn TransactionSigner>,
    }

    impl ProviderLookup for StaticProvider {
        fn injected_signer(&self) -> Option<Arc<dyn TransactionSigner>> {
            Some(Arc::clone(&self.signer))
        }
    }

    fn test_address() -> Address {
        "0x2222222222222222222222222222222222222222"
            .parse()
            .expect("valid address")
    }

    #[tokio::test]
    async fn test_resolve_address_direct() {
        let signer = WalletSigner::Direct(Arc::new(StaticSigner {
            address: test_address(),
        }));
        let address = resolve_address(&signer, &NoInjectedProvider)
            .await
            .expect("resolve should succeed");
        assert_eq!(address, test_address());
    }

    #[tokio::test]
    async fn test_resolve_address_account_record() {
        let signer = WalletSigner::Account {
            address: test_address(),
        };
        let address = resolve_address(&signer, &NoInjectedProvider)
            .await
            .expect("resolve should succeed");
        assert_eq!(address, test_address());
    }

    #[tokio::test]
    async fn test_resolve_address_injected_without_provider() {
        let err = resolve_address(&WalletSigner::Injected, &NoInjectedProvider)
            .await
            .expect_err("resolve should fail");
        assert!(matches!(
            err,
            quill_core::QuillError::Signer(SignerError::NoSignerAvailable)
        ));
    }

    #[tokio::test]
    async fn test_resolve_address_injected_with_provider() {
        let provider = StaticProvider {
            signer: Arc::new(StaticSigner {
                address: test_address(),
            }),
        };
        let address = resolve_address(&WalletSigner::Injected, &provider)
            .await
            .expect("resolve should succeed");
        assert_eq!(address, test_address());
    }

    #[test]
    fn test_to_transaction_signer_account_falls_back_to_provider() {
        let provider = StaticProvider {
            signer: Arc::new(StaticSigner {
                address: test_address(),
            }),
        };
        let signer = WalletSigner::Account {
            address: test_address(),
        };
        assert!(to_transaction_signer(&signer, &provider).is_ok());
        assert!(to_transaction_signer(&signer, &NoInjectedProvider).is_err());
    }

    #[test]
    fn test_from_descriptor_account_record() {
        let descriptor = json!({
            "account": { "address": "0x2222222222222222222222222222222222222222" }
        });
        let signer =
            WalletSigner::from_descriptor(&descriptor).expect("descriptor should classify");
        assert!(matches!(signer, WalletSigner::Account { address } if address == test_address()));
    }

    #[test]
    fn test_from_descriptor_injected() {
        let signer = WalletSigner::from_descriptor(&json!({ "type": "injected" }))
            .expect("descriptor should classify");
        assert!(matches!(signer, WalletSigner::Injected));
    }

    #[test]
    fn test_from_descriptor_null_is_not_connected() {
        let err = WalletSigner::from_descriptor(&Value::Null).expect_err("should fail");
        assert_eq!(err, SignerError::NotConnected);
    }

    #[test]
    fn test_from_descriptor_unknown_shape() {
        let err = WalletSigner::from_descriptor(&json!({ "wallet": "mystery" }))
            .expect_err("should fail");
        assert!(matches!(err, SignerError::UnsupportedSignerKind { .. }));
    }

    #[test]
    fn test_from_descriptor_malformed_address() {
        let descriptor = json!({ "account": { "address": "not-hex" } });
        let err = WalletSigner::from_descriptor(&descriptor).expect_err("should fail");
        assert!(matches!(err, SignerError::AddressUnavailable { .. }));
    }
}
