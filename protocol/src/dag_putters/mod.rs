//! # DAG Putters
//!
//! One putter per node kind. A putter takes a [`DagNode`], checks that it
//! is the kind it handles, validates every unit, writes the resulting
//! blocks to the content store and returns their CIDs in input order.
//!
//! ## Contract
//!
//! 1. **Wrong kind** → [`PutError::TypeMismatch`], nothing written.
//! 2. **Malformed unit** → [`PutError::Decode`], nothing written. The whole
//!    node is validated before the first block goes out.
//! 3. **Already stored** → success. The store's duplicate signal is
//!    absorbed and the CID is returned as if the write were the first.
//! 4. **Any other store failure** → [`PutError::Store`]. Blocks written
//!    before the failure stay written; re-putting is always safe.
//!
//! ```text
//! header.rs        — EthHeaderDagPutter       (eth-block)
//! transactions.rs  — EthTxsDagPutter          (eth-tx, one per tx)
//! receipts.rs      — EthReceiptsDagPutter     (eth-tx-receipt, one per receipt)
//! state.rs         — EthStateDagPutter        (eth-state-trie)
//! storage.rs       — EthStorageDagPutter      (eth-storage-trie)
//! ```

pub mod header;
pub mod receipts;
pub mod state;
pub mod storage;
pub mod transactions;

pub use header::EthHeaderDagPutter;
pub use receipts::EthReceiptsDagPutter;
pub use state::EthStateDagPutter;
pub use storage::EthStorageDagPutter;
pub use transactions::EthTxsDagPutter;

use crate::eth::EncodingError;
use crate::ipld::{Cid, DagNode, IpldBlock, NodeKind};
use crate::storage::{ContentStore, StoreError};

/// Errors a putter can return.
#[derive(Debug, thiserror::Error)]
pub enum PutError {
    #[error("{putter} expected a {expected} node, got a {got} node")]
    TypeMismatch {
        putter: &'static str,
        expected: NodeKind,
        got: NodeKind,
    },

    #[error("{putter} rejected unit {index}: {source}")]
    Decode {
        putter: &'static str,
        index: usize,
        #[source]
        source: EncodingError,
    },

    #[error("{putter} store write failed: {source}")]
    Store {
        putter: &'static str,
        #[source]
        source: StoreError,
    },
}

/// Publishes one kind of [`DagNode`] and returns a CID per logical unit,
/// in input order.
pub trait DagPutter: Send + Sync {
    fn dag_put(&self, node: DagNode<'_>) -> Result<Vec<Cid>, PutError>;
}

/// Shared tail of every putter: validate, then write each block, treating
/// duplicates as success.
pub(crate) fn put_node(
    store: &dyn ContentStore,
    putter: &'static str,
    node: DagNode<'_>,
) -> Result<Vec<Cid>, PutError> {
    node.validate()
        .map_err(|(index, source)| PutError::Decode {
            putter,
            index,
            source,
        })?;

    node.blocks()
        .iter()
        .map(|block| add_block(store, putter, block))
        .collect()
}

fn add_block(
    store: &dyn ContentStore,
    putter: &'static str,
    block: &IpldBlock<'_>,
) -> Result<Cid, PutError> {
    match store.add(block) {
        Ok(()) => {}
        Err(StoreError::Duplicate(cid)) => {
            tracing::trace!(putter, %cid, "content already stored");
        }
        Err(source) => return Err(PutError::Store { putter, source }),
    }
    Ok(*block.cid())
}

fn type_mismatch(putter: &'static str, expected: NodeKind, node: &DagNode<'_>) -> PutError {
    PutError::TypeMismatch {
        putter,
        expected,
        got: node.kind(),
    }
}
