//! Header putter. Uncles are headers and go through here too.

use std::sync::Arc;

use super::{put_node, type_mismatch, DagPutter, PutError};
use crate::ipld::{Cid, DagNode, NodeKind};
use crate::storage::ContentStore;

const NAME: &str = "EthHeaderDagPutter";

pub struct EthHeaderDagPutter {
    store: Arc<dyn ContentStore>,
}

impl EthHeaderDagPutter {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }
}

impl DagPutter for EthHeaderDagPutter {
    fn dag_put(&self, node: DagNode<'_>) -> Result<Vec<Cid>, PutError> {
        if !matches!(node, DagNode::Header(_)) {
            return Err(type_mismatch(NAME, NodeKind::Header, &node));
        }
        put_node(self.store.as_ref(), NAME, node)
    }
}
