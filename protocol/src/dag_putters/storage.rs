//! Storage trie node putter.

use std::sync::Arc;

use super::{put_node, type_mismatch, DagPutter, PutError};
use crate::ipld::{Cid, DagNode, NodeKind};
use crate::storage::ContentStore;

const NAME: &str = "EthStorageDagPutter";

pub struct EthStorageDagPutter {
    store: Arc<dyn ContentStore>,
}

impl EthStorageDagPutter {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }
}

impl DagPutter for EthStorageDagPutter {
    fn dag_put(&self, node: DagNode<'_>) -> Result<Vec<Cid>, PutError> {
        if !matches!(node, DagNode::StorageTrie(_)) {
            return Err(type_mismatch(NAME, NodeKind::StorageTrie, &node));
        }
        put_node(self.store.as_ref(), NAME, node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag_putters::EthStateDagPutter;
    use crate::storage::MemoryBlockstore;

    #[test]
    fn storage_and_state_copies_of_same_bytes_are_distinct() {
        let store: Arc<dyn ContentStore> = Arc::new(MemoryBlockstore::new());
        let storage = EthStorageDagPutter::new(store.clone());
        let state = EthStateDagPutter::new(store.clone());
        let raw = vec![0xc2, 0x80, 0x80];

        let storage_cid = storage.dag_put(DagNode::StorageTrie(&raw)).unwrap();
        let state_cid = state.dag_put(DagNode::StateTrie(&raw)).unwrap();

        assert_ne!(storage_cid, state_cid);
        assert!(store.has(&storage_cid[0]).unwrap());
        assert!(store.has(&state_cid[0]).unwrap());
    }

    #[test]
    fn state_variant_is_rejected() {
        let store = Arc::new(MemoryBlockstore::new());
        let putter = EthStorageDagPutter::new(store.clone());

        let err = putter.dag_put(DagNode::StateTrie(&[0xc0])).unwrap_err();

        assert!(matches!(
            err,
            PutError::TypeMismatch {
                expected: NodeKind::StorageTrie,
                ..
            }
        ));
        assert!(store.is_empty());
    }
}
