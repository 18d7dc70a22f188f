//! Transaction putter.
//!
//! Takes the block's whole transaction list and stores each transaction as
//! its own `eth-tx` block. The returned CIDs line up with the input list
//! index for index; the publisher relies on that to attach them to
//! metadata.

use std::sync::Arc;

use super::{put_node, type_mismatch, DagPutter, PutError};
use crate::ipld::{Cid, DagNode, NodeKind};
use crate::storage::ContentStore;

const NAME: &str = "EthTxsDagPutter";

pub struct EthTxsDagPutter {
    store: Arc<dyn ContentStore>,
}

impl EthTxsDagPutter {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }
}

impl DagPutter for EthTxsDagPutter {
    fn dag_put(&self, node: DagNode<'_>) -> Result<Vec<Cid>, PutError> {
        if !matches!(node, DagNode::Transactions(_)) {
            return Err(type_mismatch(NAME, NodeKind::Transactions, &node));
        }
        put_node(self.store.as_ref(), NAME, node)
    }
}
