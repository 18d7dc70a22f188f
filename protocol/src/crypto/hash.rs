//! # Hashing Utilities
//!
//! Ethereum names everything by Keccak-256: block hashes, transaction
//! hashes, trie node references. The content identifiers we mint reuse the
//! same digest, so a CID's multihash and the chain's own hash of an object
//! are the same 32 bytes.
//!
//! Note that Keccak-256 is *not* NIST SHA3-256. The padding differs, and
//! mixing them up produces hashes that look right and match nothing.

use primitive_types::H256;
use sha3::{Digest, Keccak256};

/// Compute the Keccak-256 hash of the input data.
///
/// # Example
///
/// ```
/// use ethdag_protocol::crypto::keccak256;
///
/// let hash = keccak256(b"");
/// assert_eq!(
///     hex::encode(hash),
///     "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
/// );
/// ```
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Keccak-256 wrapped in an [`H256`], the form used for Ethereum hashes.
pub fn keccak256_h256(data: &[u8]) -> H256 {
    H256::from(keccak256(data))
}
