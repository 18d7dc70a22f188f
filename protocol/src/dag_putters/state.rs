//! State trie node putter.

use std::sync::Arc;

use super::{put_node, type_mismatch, DagPutter, PutError};
use crate::ipld::{Cid, DagNode, NodeKind};
use crate::storage::ContentStore;

const NAME: &str = "EthStateDagPutter";

pub struct EthStateDagPutter {
    store: Arc<dyn ContentStore>,
}

impl EthStateDagPutter {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }
}

impl DagPutter for EthStateDagPutter {
    fn dag_put(&self, node: DagNode<'_>) -> Result<Vec<Cid>, PutError> {
        if !matches!(node, DagNode::StateTrie(_)) {
            return Err(type_mismatch(NAME, NodeKind::StateTrie, &node));
        }
        put_node(self.store.as_ref(), NAME, node)
    }
}
