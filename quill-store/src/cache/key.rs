//! Namespaced cache key encoding.
//!
//! The original client spread its two lookup directions across ad hoc
//! string prefixes scanned one key at a time. Here the namespace is a
//! single leading discriminant byte, so both directions are ordinary
//! prefix ranges over one database and a scan never has to parse keys it
//! is not interested in.

/// Separator byte between the namespace discriminant and the key body.
const SEPARATOR: u8 = 0xFF;

/// Key namespace discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Payload bytes keyed by content root hash (CID).
    Root,
    /// Root hash keyed by submission transaction hash.
    Tx,
}

impl Namespace {
    fn to_byte(self) -> u8 {
        match self {
            Namespace::Root => 0,
            Namespace::Tx => 1,
        }
    }

    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Namespace::Root),
            1 => Some(Namespace::Tx),
            _ => None,
        }
    }

    /// Prefix for scanning every key in this namespace.
    pub fn prefix(self) -> [u8; 2] {
        [self.to_byte(), SEPARATOR]
    }
}

/// A cache key scoped to a [`Namespace`].
///
/// # Binary Format
///
/// - Byte 0: namespace discriminant
/// - Byte 1: separator (0xFF)
/// - Bytes 2..: UTF-8 key body (a root hash or transaction hash)
///
/// Keys sort by namespace first, so a range scan over one namespace never
/// touches the other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    namespace: Namespace,
    body: String,
}

impl CacheKey {
    /// A payload key in the root-hash namespace.
    pub fn root(cid: impl Into<String>) -> Self {
        Self {
            namespace: Namespace::Root,
            body: cid.into(),
        }
    }

    /// A mapping key in the transaction-hash namespace.
    pub fn tx(tx_hash: impl Into<String>) -> Self {
        Self {
            namespace: Namespace::Tx,
            body: tx_hash.into(),
        }
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Encode this key for LMDB storage.
    pub fn encode(&self) -> Vec<u8> {
        let body = self.body.as_bytes();
        let mut bytes = Vec::with_capacity(2 + body.len());
        bytes.push(self.namespace.to_byte());
        bytes.push(SEPARATOR);
        bytes.extend_from_slice(body);
        bytes
    }

    /// Decode a key from bytes.
    ///
    /// Returns `None` if the namespace byte is unknown, the separator is
    /// missing, or the body is not UTF-8.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 2 || bytes[1] != SEPARATOR {
            return None;
        }
        let namespace = Namespace::from_byte(bytes[0])?;
        let body = std::str::from_utf8(&bytes[2..]).ok()?.to_string();
        Some(Self { namespace, body })
    }
}
