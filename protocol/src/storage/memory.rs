//! # MemoryBlockstore
//!
//! A content store that lives and dies with the process. Same duplicate
//! semantics as [`super::SledBlockstore`]; used by tests, benches, and dry
//! runs where nothing should touch disk.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{ContentStore, StoreError, StoreResult};
use crate::ipld::{Cid, IpldBlock};

#[derive(Debug, Default)]
pub struct MemoryBlockstore {
    blocks: DashMap<Cid, Vec<u8>>,
}

impl MemoryBlockstore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl ContentStore for MemoryBlockstore {
    fn add(&self, block: &IpldBlock<'_>) -> StoreResult<()> {
        match self.blocks.entry(*block.cid()) {
            Entry::Occupied(existing) if existing.get().as_slice() == block.data() => {
                Err(StoreError::Duplicate(*block.cid()))
            }
            Entry::Occupied(_) => Err(StoreError::Conflict(*block.cid())),
            Entry::Vacant(slot) => {
                slot.insert(block.data().to_vec());
                Ok(())
            }
        }
    }

    fn has(&self, cid: &Cid) -> StoreResult<bool> {
        Ok(self.blocks.contains_key(cid))
    }

    fn get(&self, cid: &Cid) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.blocks.get(cid).map(|data| data.value().clone()))
    }
}
