//! # Block Publisher
//!
//! Turns one [`IpldPayload`] into one [`CidPayload`] by running every
//! sub-object of the block through its putter.
//!
//! ## Steps
//!
//! ```text
//! 0. validate   metadata lengths, hash-key uniqueness,
//!               receipt owners                             (no writes yet)
//! 1. header     HeaderPutter(header_rlp)          → exactly 1 CID
//! 2. uncles     HeaderPutter(uncle) per uncle     → exactly 1 CID each
//! 3. txs        TransactionPutter(all txs)        → one CID per tx
//! 4. receipts   ReceiptPutter(all receipts)       → one CID per receipt
//! 5. state      StatePutter(value) per state node → exactly 1 CID each
//! 6. storage    StoragePutter(value) per node     → exactly 1 CID each
//! 7. assemble
//! ```
//!
//! The first failure aborts the publish and nothing is returned. Blocks
//! written by earlier steps stay in the store, which is harmless: they are
//! content-addressed, so a retry writes the same keys and the putters
//! absorb the duplicates.
//!
//! ## Positional Zipping
//!
//! Steps 3 and 4 get CIDs back as a list aligned with the input list.
//! The zip against metadata happens on that list, in input order, before
//! anything is re-keyed by hash. After re-keying, position is gone.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use primitive_types::H256;

use crate::dag_putters::{
    DagPutter, EthHeaderDagPutter, EthReceiptsDagPutter, EthStateDagPutter, EthStorageDagPutter,
    EthTxsDagPutter, PutError,
};
use crate::eth::{
    CidPayload, EthHeader, IpldPayload, Receipt, ReceiptMetaData, StateNode, StateNodeCid,
    StorageNode, StorageNodeCid, Transaction, TrxMetaData, WithCid,
};
use crate::ipld::{Cid, DagNode};
use crate::storage::ContentStore;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Why a publish produced no output.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error(transparent)]
    Put(#[from] PutError),

    /// A putter returned a different number of CIDs than units it was given.
    #[error("expected {expected} CID(s) for {what}, putter returned {got}")]
    CountMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    /// A metadata list is not index-aligned with the collection it
    /// describes.
    #[error("{what} metadata has {got} entries for {expected} items")]
    MetadataMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    /// Two entries map to the same output key; the output map would
    /// silently lose one of them.
    #[error("duplicate {what} key {key:?}")]
    DuplicateKey { what: &'static str, key: H256 },

    /// A receipt is tagged with a transaction hash that is not in the
    /// block body.
    #[error("receipt tagged with {key:?}, which is not a transaction of this block")]
    UnknownReceiptOwner { key: H256 },
}

pub type PublishResult<T> = Result<T, PublishError>;

// ---------------------------------------------------------------------------
// IpldPublisher
// ---------------------------------------------------------------------------

/// Publishes a block's payload and returns the CIDs of everything in it.
pub trait IpldPublisher: Send + Sync {
    fn publish(&self, payload: &IpldPayload) -> PublishResult<CidPayload>;
}

/// The standard publisher: five putters over one content store.
pub struct Publisher {
    header_putter: Box<dyn DagPutter>,
    transaction_putter: Box<dyn DagPutter>,
    receipt_putter: Box<dyn DagPutter>,
    state_putter: Box<dyn DagPutter>,
    storage_putter: Box<dyn DagPutter>,
}

impl Publisher {
    /// Wire the standard putters to `store`.
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self {
            header_putter: Box::new(EthHeaderDagPutter::new(Arc::clone(&store))),
            transaction_putter: Box::new(EthTxsDagPutter::new(Arc::clone(&store))),
            receipt_putter: Box::new(EthReceiptsDagPutter::new(Arc::clone(&store))),
            state_putter: Box::new(EthStateDagPutter::new(Arc::clone(&store))),
            storage_putter: Box::new(EthStorageDagPutter::new(store)),
        }
    }

    pub fn with_header_putter(mut self, putter: impl DagPutter + 'static) -> Self {
        self.header_putter = Box::new(putter);
        self
    }

    pub fn with_transaction_putter(mut self, putter: impl DagPutter + 'static) -> Self {
        self.transaction_putter = Box::new(putter);
        self
    }

    pub fn with_receipt_putter(mut self, putter: impl DagPutter + 'static) -> Self {
        self.receipt_putter = Box::new(putter);
        self
    }

    pub fn with_state_putter(mut self, putter: impl DagPutter + 'static) -> Self {
        self.state_putter = Box::new(putter);
        self
    }

    pub fn with_storage_putter(mut self, putter: impl DagPutter + 'static) -> Self {
        self.storage_putter = Box::new(putter);
        self
    }

    fn publish_header(&self, header: &EthHeader) -> PublishResult<Cid> {
        let cids = self.header_putter.dag_put(DagNode::Header(header))?;
        single(cids, "header")
    }

    fn publish_uncles(&self, uncles: &[EthHeader]) -> PublishResult<BTreeMap<H256, Cid>> {
        let mut uncle_cids = BTreeMap::new();
        for uncle in uncles {
            let cid = self.publish_header(uncle)?;
            uncle_cids.insert(uncle.hash(), cid);
        }
        Ok(uncle_cids)
    }

    fn publish_transactions(
        &self,
        transactions: &[Transaction],
        meta: &[TrxMetaData],
    ) -> PublishResult<BTreeMap<H256, WithCid<TrxMetaData>>> {
        let cids = self
            .transaction_putter
            .dag_put(DagNode::Transactions(transactions))?;
        expect_count(&cids, transactions.len(), "transactions")?;

        Ok(transactions
            .iter()
            .zip(cids)
            .zip(meta)
            .map(|((tx, cid), meta)| (tx.hash(), WithCid::new(cid, meta)))
            .collect())
    }

    fn publish_receipts(
        &self,
        receipts: &[Receipt],
        meta: &[ReceiptMetaData],
    ) -> PublishResult<BTreeMap<H256, WithCid<ReceiptMetaData>>> {
        let cids = self.receipt_putter.dag_put(DagNode::Receipts(receipts))?;
        expect_count(&cids, receipts.len(), "receipts")?;

        Ok(receipts
            .iter()
            .zip(cids)
            .zip(meta)
            .map(|((rct, cid), meta)| (rct.tx_hash, WithCid::new(cid, meta)))
            .collect())
    }

    fn publish_state_nodes(
        &self,
        nodes: &BTreeMap<H256, StateNode>,
    ) -> PublishResult<BTreeMap<H256, StateNodeCid>> {
        nodes
            .iter()
            .map(|(key, node)| {
                let cids = self.state_putter.dag_put(DagNode::StateTrie(&node.value))?;
                let cid = single(cids, "state node")?;
                Ok((
                    *key,
                    StateNodeCid {
                        cid,
                        leaf: node.leaf,
                    },
                ))
            })
            .collect()
    }

    fn publish_storage_nodes(
        &self,
        tries: &BTreeMap<H256, Vec<StorageNode>>,
    ) -> PublishResult<BTreeMap<H256, Vec<StorageNodeCid>>> {
        let mut out = BTreeMap::new();
        for (state_key, nodes) in tries {
            let mut trie_cids = Vec::with_capacity(nodes.len());
            for node in nodes {
                let cids = self
                    .storage_putter
                    .dag_put(DagNode::StorageTrie(&node.value))?;
                trie_cids.push(StorageNodeCid {
                    key: node.key,
                    cid: single(cids, "storage node")?,
                    leaf: node.leaf,
                });
            }
            out.insert(*state_key, trie_cids);
        }
        Ok(out)
    }
}

impl IpldPublisher for Publisher {
    fn publish(&self, payload: &IpldPayload) -> PublishResult<CidPayload> {
        let span = tracing::debug_span!("publish", block = payload.block_number);
        let _enter = span.enter();

        validate_payload(payload)?;

        let header_cid = self.publish_header(&EthHeader::from_rlp(payload.header_rlp.clone()))?;
        tracing::debug!(%header_cid, "header published");

        let uncle_cids = self.publish_uncles(&payload.block_body.uncles)?;
        let transaction_cids =
            self.publish_transactions(&payload.block_body.transactions, &payload.trx_meta_data)?;
        let receipt_cids = self.publish_receipts(&payload.receipts, &payload.receipt_meta_data)?;
        tracing::debug!(
            uncles = uncle_cids.len(),
            transactions = transaction_cids.len(),
            receipts = receipt_cids.len(),
            "block body published"
        );

        let state_node_cids = self.publish_state_nodes(&payload.state_nodes)?;
        let storage_node_cids = self.publish_storage_nodes(&payload.storage_nodes)?;
        tracing::debug!(
            state_nodes = state_node_cids.len(),
            storage_tries = storage_node_cids.len(),
            "trie nodes published"
        );

        tracing::info!(
            number = payload.block_number,
            hash = ?payload.block_hash,
            "block published"
        );

        Ok(CidPayload {
            block_hash: payload.block_hash,
            block_number: payload.block_number.to_string(),
            total_difficulty: payload.total_difficulty.to_string(),
            header_cid,
            uncle_cids,
            transaction_cids,
            receipt_cids,
            state_node_cids,
            storage_node_cids,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Checks that need no store access. Running them first means a malformed
/// payload is rejected before anything is written.
fn validate_payload(payload: &IpldPayload) -> PublishResult<()> {
    let transactions = &payload.block_body.transactions;

    if payload.trx_meta_data.len() != transactions.len() {
        return Err(PublishError::MetadataMismatch {
            what: "transaction",
            expected: transactions.len(),
            got: payload.trx_meta_data.len(),
        });
    }
    if payload.receipt_meta_data.len() != payload.receipts.len() {
        return Err(PublishError::MetadataMismatch {
            what: "receipt",
            expected: payload.receipts.len(),
            got: payload.receipt_meta_data.len(),
        });
    }

    let tx_hashes: Vec<H256> = transactions.iter().map(Transaction::hash).collect();
    unique_keys(tx_hashes.iter().copied(), "transaction")?;
    unique_keys(payload.receipts.iter().map(|r| r.tx_hash), "receipt")?;

    let owners: HashSet<H256> = tx_hashes.into_iter().collect();
    if let Some(orphan) = payload
        .receipts
        .iter()
        .find(|r| !owners.contains(&r.tx_hash))
    {
        return Err(PublishError::UnknownReceiptOwner {
            key: orphan.tx_hash,
        });
    }
    Ok(())
}

fn unique_keys(keys: impl Iterator<Item = H256>, what: &'static str) -> PublishResult<()> {
    let mut seen = HashSet::new();
    for key in keys {
        if !seen.insert(key) {
            return Err(PublishError::DuplicateKey { what, key });
        }
    }
    Ok(())
}

fn expect_count(cids: &[Cid], expected: usize, what: &'static str) -> PublishResult<()> {
    if cids.len() != expected {
        return Err(PublishError::CountMismatch {
            what,
            expected,
            got: cids.len(),
        });
    }
    Ok(())
}

fn single(cids: Vec<Cid>, what: &'static str) -> PublishResult<Cid> {
    expect_count(&cids, 1, what)?;
    Ok(cids[0])
}
