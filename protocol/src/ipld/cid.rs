//! # Content Identifiers
//!
//! A CID names a node by what it contains. Ours are always version 1 with
//! a Keccak-256 multihash:
//!
//! ```text
//! ┌──────────┬────────────────┬────────────────┬──────────────┬──────────┐
//! │ version  │ codec          │ hash fn        │ digest len   │ digest   │
//! │ varint 1 │ varint 0x90..  │ varint 0x1b    │ varint 32    │ 32 bytes │
//! └──────────┴────────────────┴────────────────┴──────────────┴──────────┘
//! ```
//!
//! The codec says what the bytes *are* (a header, a receipt, a trie node);
//! the digest says which bytes. Two nodes with equal canonical encodings and
//! equal codecs always produce equal CIDs.
//!
//! The string form is multibase base58btc: a literal `z` followed by the
//! base58 encoding of the binary form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::{
    CID_VERSION, CODEC_ETH_BLOCK, CODEC_ETH_STATE_TRIE, CODEC_ETH_STORAGE_TRIE, CODEC_ETH_TX,
    CODEC_ETH_TX_RECEIPT, KECCAK_256_LENGTH, MULTIBASE_BASE58BTC, MULTIHASH_KECCAK_256,
};
use crate::crypto::keccak256;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors produced while parsing a CID from its string or binary form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CidError {
    #[error("unsupported multibase prefix: {0:?}")]
    UnsupportedMultibase(Option<char>),

    #[error("invalid base58 payload: {0}")]
    InvalidBase58(String),

    #[error("truncated varint")]
    TruncatedVarint,

    #[error("unsupported CID version: {0}")]
    UnsupportedVersion(u64),

    #[error("unknown codec: 0x{0:x}")]
    UnknownCodec(u64),

    #[error("unsupported multihash: code 0x{code:x}, length {length}")]
    UnsupportedMultihash { code: u64, length: u64 },

    #[error("expected {expected} digest bytes, found {found}")]
    DigestLength { expected: usize, found: usize },
}

// ---------------------------------------------------------------------------
// Codec
// ---------------------------------------------------------------------------

/// The multicodec of an Ethereum IPLD node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Codec {
    /// Block header; uncles use the same codec.
    EthBlock,
    /// A single transaction.
    EthTx,
    /// A single receipt.
    EthTxReceipt,
    /// A state trie node.
    EthStateTrie,
    /// A storage trie node.
    EthStorageTrie,
}

impl Codec {
    /// Every codec this crate emits.
    pub const ALL: [Codec; 5] = [
        Codec::EthBlock,
        Codec::EthTx,
        Codec::EthTxReceipt,
        Codec::EthStateTrie,
        Codec::EthStorageTrie,
    ];

    /// Numeric multicodec code.
    pub fn code(self) -> u64 {
        match self {
            Codec::EthBlock => CODEC_ETH_BLOCK,
            Codec::EthTx => CODEC_ETH_TX,
            Codec::EthTxReceipt => CODEC_ETH_TX_RECEIPT,
            Codec::EthStateTrie => CODEC_ETH_STATE_TRIE,
            Codec::EthStorageTrie => CODEC_ETH_STORAGE_TRIE,
        }
    }

    /// Multicodec table name, e.g. `eth-block`.
    pub fn name(self) -> &'static str {
        match self {
            Codec::EthBlock => "eth-block",
            Codec::EthTx => "eth-tx",
            Codec::EthTxReceipt => "eth-tx-receipt",
            Codec::EthStateTrie => "eth-state-trie",
            Codec::EthStorageTrie => "eth-storage-trie",
        }
    }

    /// Look up a codec by its numeric code.
    pub fn from_code(code: u64) -> Result<Self, CidError> {
        Codec::ALL
            .into_iter()
            .find(|c| c.code() == code)
            .ok_or(CidError::UnknownCodec(code))
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Codec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Codec::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| {
                let known: Vec<_> = Codec::ALL.iter().map(|c| c.name()).collect();
                format!("unknown codec {s:?} (expected one of {})", known.join(", "))
            })
    }
}

// ---------------------------------------------------------------------------
// Cid
// ---------------------------------------------------------------------------

/// A version-1 CID over a Keccak-256 digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cid {
    codec: Codec,
    digest: [u8; KECCAK_256_LENGTH],
}

impl Cid {
    /// Derive the CID of `data` under `codec`.
    ///
    /// This is a pure function of its arguments: no store, no clock, no
    /// counter participates.
    pub fn derive(codec: Codec, data: &[u8]) -> Self {
        Self {
            codec,
            digest: keccak256(data),
        }
    }

    pub fn codec(&self) -> Codec {
        self.codec
    }

    /// The Keccak-256 digest. For headers and transactions this equals the
    /// chain's own hash of the object.
    pub fn digest(&self) -> &[u8; KECCAK_256_LENGTH] {
        &self.digest
    }

    /// Binary CID: `version || codec || hash code || length || digest`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + KECCAK_256_LENGTH + 2);
        write_varint(&mut out, CID_VERSION);
        write_varint(&mut out, self.codec.code());
        write_varint(&mut out, MULTIHASH_KECCAK_256);
        write_varint(&mut out, KECCAK_256_LENGTH as u64);
        out.extend_from_slice(&self.digest);
        out
    }

    /// Parse the binary form produced by [`Cid::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CidError> {
        let mut cursor = bytes;

        let version = read_varint(&mut cursor)?;
        if version != CID_VERSION {
            return Err(CidError::UnsupportedVersion(version));
        }
        let codec = Codec::from_code(read_varint(&mut cursor)?)?;

        let code = read_varint(&mut cursor)?;
        let length = read_varint(&mut cursor)?;
        if code != MULTIHASH_KECCAK_256 || length != KECCAK_256_LENGTH as u64 {
            return Err(CidError::UnsupportedMultihash { code, length });
        }

        let digest: [u8; KECCAK_256_LENGTH] =
            cursor.try_into().map_err(|_| CidError::DigestLength {
                expected: KECCAK_256_LENGTH,
                found: cursor.len(),
            })?;

        Ok(Self { codec, digest })
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            MULTIBASE_BASE58BTC,
            bs58::encode(self.to_bytes()).into_string()
        )
    }
}

impl fmt::Debug for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cid({}, {self})", self.codec)
    }
}

impl FromStr for Cid {
    type Err = CidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match chars.next() {
            Some(MULTIBASE_BASE58BTC) => {}
            other => return Err(CidError::UnsupportedMultibase(other)),
        }
        let bytes = bs58::decode(chars.as_str())
            .into_vec()
            .map_err(|e| CidError::InvalidBase58(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

impl Serialize for Cid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Cid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Unsigned LEB128
// ---------------------------------------------------------------------------

fn write_varint(out: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

fn read_varint(cursor: &mut &[u8]) -> Result<u64, CidError> {
    let bytes: &[u8] = *cursor;
    let mut value = 0u64;
    for (i, &byte) in bytes.iter().enumerate().take(10) {
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            *cursor = &bytes[i + 1..];
            return Ok(value);
        }
    }
    Err(CidError::TruncatedVarint)
}
