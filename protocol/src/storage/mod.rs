//! # Storage Module
//!
//! Content-store adapters. The publisher only ever *adds* blocks; reading
//! them back is here for verification and tooling.
//!
//! ## Architecture
//!
//! ```text
//! db.rs     — SledBlockstore: persistent store on an embedded sled tree
//! memory.rs — MemoryBlockstore: in-process store on a DashMap
//! ```
//!
//! ## Duplicates
//!
//! Every write is keyed by CID, and a CID is a function of the bytes. So a
//! second write under an existing key is, by construction, the same content
//! arriving again: another block sharing a trie node, an uncle seen on two
//! forks, a retried publish. Adapters report it as
//! [`StoreError::Duplicate`] and leave the stored copy alone; the putter
//! layer turns that into success.
//!
//! A store handle is shared, not global: construct one, wrap it in an
//! `Arc`, hand it to the publisher.

pub mod db;
pub mod memory;

pub use db::SledBlockstore;
pub use memory::MemoryBlockstore;

use crate::ipld::{Cid, IpldBlock};

/// Errors a content store can report.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A block with this CID is already stored.
    #[error("duplicate content: {0}")]
    Duplicate(Cid),

    /// The stored bytes under this CID differ from the bytes being added.
    /// Only reachable through a hash collision or a corrupted store.
    #[error("content conflict under {0}")]
    Conflict(Cid),

    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Any other backend failure.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::Duplicate(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A content-addressed block store.
///
/// Implementations must be safe to share across threads: concurrent
/// publishes of different blocks hit the same store with no coordination.
pub trait ContentStore: Send + Sync {
    /// Persist a block. Returns [`StoreError::Duplicate`] if the CID is
    /// already present.
    fn add(&self, block: &IpldBlock<'_>) -> StoreResult<()>;

    fn has(&self, cid: &Cid) -> StoreResult<bool>;

    fn get(&self, cid: &Cid) -> StoreResult<Option<Vec<u8>>>;
}
