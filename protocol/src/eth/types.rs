//! # Chain Objects
//!
//! The publisher never decodes a block into fields. It works on canonical
//! encodings exactly as the chain produced them, because those bytes are
//! what gets hashed, and a re-encoding that differs by one byte would mint
//! a CID nobody else can reproduce.
//!
//! Each wrapper therefore holds its consensus encoding plus whatever the
//! publisher needs to key the output (a hash, a leaf flag, a storage key),
//! and offers a cheap structural check so garbage is rejected before it
//! reaches the store.

use primitive_types::H256;
use rlp::Rlp;
use serde::{Deserialize, Serialize};

use super::serde_hex;
use crate::crypto::keccak256_h256;

// ---------------------------------------------------------------------------
// Encoding Checks
// ---------------------------------------------------------------------------

/// Structural problems found in a canonical encoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    #[error("empty encoding")]
    Empty,

    #[error("expected an RLP list")]
    NotAList,

    #[error("RLP item spans {declared} bytes but {actual} were given")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("unknown typed envelope prefix 0x{0:02x}")]
    UnknownEnvelope(u8),

    #[error("malformed RLP: {0}")]
    Rlp(#[from] rlp::DecoderError),
}

/// Require `bytes` to be exactly one well-formed RLP list.
pub fn check_rlp_list(bytes: &[u8]) -> Result<(), EncodingError> {
    if bytes.is_empty() {
        return Err(EncodingError::Empty);
    }
    let rlp = Rlp::new(bytes);
    if !rlp.is_list() {
        return Err(EncodingError::NotAList);
    }
    let info = rlp.payload_info()?;
    let declared = info.header_len + info.value_len;
    if declared != bytes.len() {
        return Err(EncodingError::LengthMismatch {
            declared,
            actual: bytes.len(),
        });
    }
    Ok(())
}

/// Accept either a legacy RLP list or an EIP-2718 typed envelope
/// (`type || rlp_list` with `type` in `0x01..=0x7f`). Type 0 is the legacy
/// format, which is never wrapped, so a `0x00` prefix is rejected.
pub fn check_envelope(bytes: &[u8]) -> Result<(), EncodingError> {
    match bytes.first() {
        None => Err(EncodingError::Empty),
        Some(&prefix) if prefix >= 0xc0 => check_rlp_list(bytes),
        Some(&prefix) if (0x01..=0x7f).contains(&prefix) => check_rlp_list(&bytes[1..]),
        Some(&prefix) => Err(EncodingError::UnknownEnvelope(prefix)),
    }
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// An RLP-encoded block header. Uncles are headers too.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EthHeader {
    #[serde(with = "serde_hex")]
    rlp: Vec<u8>,
}

impl EthHeader {
    pub fn from_rlp(rlp: Vec<u8>) -> Self {
        Self { rlp }
    }

    pub fn rlp(&self) -> &[u8] {
        &self.rlp
    }

    /// The block hash: Keccak-256 of the header RLP.
    pub fn hash(&self) -> H256 {
        keccak256_h256(&self.rlp)
    }

    pub fn validate(&self) -> Result<(), EncodingError> {
        check_rlp_list(&self.rlp)
    }
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A transaction in its consensus encoding (legacy list or typed envelope).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transaction {
    #[serde(with = "serde_hex")]
    encoded: Vec<u8>,
}

impl Transaction {
    pub fn from_encoded(encoded: Vec<u8>) -> Self {
        Self { encoded }
    }

    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    /// The transaction hash: Keccak-256 of the consensus encoding.
    pub fn hash(&self) -> H256 {
        keccak256_h256(&self.encoded)
    }

    pub fn validate(&self) -> Result<(), EncodingError> {
        check_envelope(&self.encoded)
    }
}

// ---------------------------------------------------------------------------
// Receipt
// ---------------------------------------------------------------------------

/// A receipt in its consensus encoding, tagged with the hash of the
/// transaction that produced it.
///
/// The tag is not part of the encoding (consensus receipts do not carry
/// their transaction hash), so it is supplied by whoever extracted the block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_hash: H256,
    #[serde(with = "serde_hex")]
    pub encoded: Vec<u8>,
}

impl Receipt {
    pub fn new(tx_hash: H256, encoded: Vec<u8>) -> Self {
        Self { tx_hash, encoded }
    }

    pub fn validate(&self) -> Result<(), EncodingError> {
        check_envelope(&self.encoded)
    }
}

// ---------------------------------------------------------------------------
// Trie Nodes
// ---------------------------------------------------------------------------

/// A node of the account state trie.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateNode {
    #[serde(with = "serde_hex")]
    pub value: Vec<u8>,
    pub leaf: bool,
}

/// A node of one contract's storage trie.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageNode {
    /// Hashed storage slot (for leaves) or path key of the node.
    pub key: H256,
    #[serde(with = "serde_hex")]
    pub value: Vec<u8>,
    pub leaf: bool,
}
