//! # SledBlockstore — Persistent Block Store
//!
//! IPLD blocks on top of sled's embedded key-value store.
//!
//! ## Tree Layout
//!
//! | Tree          | Key                 | Value        |
//! |---------------|---------------------|--------------|
//! | `ipld_blocks` | binary CID (37 B)   | raw block    |
//!
//! The key carries the codec, so the same bytes stored as a state node and
//! as a storage node occupy two entries, exactly as their CIDs differ.
//!
//! ## Insert-If-Absent
//!
//! `add` is a single compare-and-swap from "no value" to the block bytes.
//! Two writers racing on the same CID both reach sled; exactly one swap
//! succeeds and the other observes the winner's value and reports a
//! duplicate. No lock is held across the write.

use std::path::Path;

use sled::{CompareAndSwapError, Db, Tree};

use super::{ContentStore, StoreError, StoreResult};
use crate::config::BLOCKSTORE_TREE;
use crate::ipld::{Cid, IpldBlock};

/// Persistent content store backed by sled.
///
/// Cheap to clone; clones share the same underlying database.
#[derive(Debug, Clone)]
pub struct SledBlockstore {
    /// The underlying sled database handle.
    db: Db,
    /// Raw blocks keyed by binary CID.
    blocks: Tree,
}

impl SledBlockstore {
    /// Open or create a block store at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Create a temporary store that is removed when dropped.
    pub fn open_temporary() -> StoreResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> StoreResult<Self> {
        let blocks = db.open_tree(BLOCKSTORE_TREE)?;
        Ok(Self { db, blocks })
    }

    /// Number of blocks held.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Block until all pending writes are durable.
    pub fn flush(&self) -> StoreResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

impl ContentStore for SledBlockstore {
    fn add(&self, block: &IpldBlock<'_>) -> StoreResult<()> {
        let key = block.cid().to_bytes();
        match self
            .blocks
            .compare_and_swap(key, None as Option<&[u8]>, Some(block.data()))?
        {
            Ok(()) => Ok(()),
            Err(CompareAndSwapError { current, .. }) => match current {
                Some(existing) if &existing[..] == block.data() => {
                    Err(StoreError::Duplicate(*block.cid()))
                }
                _ => Err(StoreError::Conflict(*block.cid())),
            },
        }
    }

    fn has(&self, cid: &Cid) -> StoreResult<bool> {
        Ok(self.blocks.contains_key(cid.to_bytes())?)
    }

    fn get(&self, cid: &Cid) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.blocks.get(cid.to_bytes())?.map(|v| v.to_vec()))
    }
}
