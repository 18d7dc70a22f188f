//! # Protocol Configuration & Constants
//!
//! Every magic number the publisher depends on lives here: multicodec codes,
//! the multihash function, and storage layout names. These values are part
//! of the CID format, so changing one changes every identifier the system
//! has ever produced. Treat them as frozen.

// ---------------------------------------------------------------------------
// CID Format
// ---------------------------------------------------------------------------

/// CID version emitted for every node. Version 0 only supports dag-pb, so
/// Ethereum codecs always use version 1.
pub const CID_VERSION: u64 = 1;

/// Multihash code for Keccak-256.
pub const MULTIHASH_KECCAK_256: u64 = 0x1b;

/// Digest length for Keccak-256, in bytes.
pub const KECCAK_256_LENGTH: usize = 32;

/// Multibase prefix for base58btc, the string encoding used for CIDs.
pub const MULTIBASE_BASE58BTC: char = 'z';

// ---------------------------------------------------------------------------
// Multicodec Codes
// ---------------------------------------------------------------------------

/// Ethereum block header (also used for uncles).
pub const CODEC_ETH_BLOCK: u64 = 0x90;

/// Single Ethereum transaction.
pub const CODEC_ETH_TX: u64 = 0x93;

/// Single Ethereum transaction receipt.
pub const CODEC_ETH_TX_RECEIPT: u64 = 0x95;

/// Node of the account state trie.
pub const CODEC_ETH_STATE_TRIE: u64 = 0x96;

/// Node of a contract storage trie.
pub const CODEC_ETH_STORAGE_TRIE: u64 = 0x98;

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Name of the sled tree holding raw IPLD blocks keyed by binary CID.
pub const BLOCKSTORE_TREE: &str = "ipld_blocks";

/// Default on-disk location of the block store, relative to the working
/// directory.
pub const DEFAULT_STORE_PATH: &str = ".ethdag/blocks";

/// Default number of payloads the node publishes concurrently.
pub const DEFAULT_PUBLISH_CONCURRENCY: usize = 4;
