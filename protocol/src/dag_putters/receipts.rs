//! Receipt putter. One `eth-tx-receipt` block per receipt, CIDs in input
//! order.

use std::sync::Arc;

use super::{put_node, type_mismatch, DagPutter, PutError};
use crate::ipld::{Cid, DagNode, NodeKind};
use crate::storage::ContentStore;

const NAME: &str = "EthReceiptsDagPutter";

pub struct EthReceiptsDagPutter {
    store: Arc<dyn ContentStore>,
}

impl EthReceiptsDagPutter {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }
}

impl DagPutter for EthReceiptsDagPutter {
    fn dag_put(&self, node: DagNode<'_>) -> Result<Vec<Cid>, PutError> {
        if !matches!(node, DagNode::Receipts(_)) {
            return Err(type_mismatch(NAME, NodeKind::Receipts, &node));
        }
        put_node(self.store.as_ref(), NAME, node)
    }
}
