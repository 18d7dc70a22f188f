//! # Typed DAG Nodes
//!
//! [`DagNode`] is the closed set of things a putter can be handed. Each
//! variant borrows its content from the payload, knows how to validate it,
//! and knows how to split itself into the IPLD blocks that actually get
//! stored:
//!
//! | Variant        | Blocks                   | Codec              |
//! |----------------|--------------------------|--------------------|
//! | `Header`       | 1                        | `eth-block`        |
//! | `Transactions` | one per transaction      | `eth-tx`           |
//! | `Receipts`     | one per receipt          | `eth-tx-receipt`   |
//! | `StateTrie`    | 1                        | `eth-state-trie`   |
//! | `StorageTrie`  | 1                        | `eth-storage-trie` |
//!
//! Blocks come out in input order, which is what lets the publisher zip
//! returned CIDs back onto positional metadata.

use std::fmt;

use super::cid::{Cid, Codec};
use crate::eth::types::{check_rlp_list, EncodingError, EthHeader, Receipt, Transaction};

/// Discriminant of a [`DagNode`], used in error reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Header,
    Transactions,
    Receipts,
    StateTrie,
    StorageTrie,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Header => "header",
            NodeKind::Transactions => "transactions",
            NodeKind::Receipts => "receipts",
            NodeKind::StateTrie => "state trie node",
            NodeKind::StorageTrie => "storage trie node",
        };
        f.write_str(name)
    }
}

/// A unit of block data ready to be published.
#[derive(Clone, Copy, Debug)]
pub enum DagNode<'a> {
    Header(&'a EthHeader),
    Transactions(&'a [Transaction]),
    Receipts(&'a [Receipt]),
    StateTrie(&'a [u8]),
    StorageTrie(&'a [u8]),
}

impl<'a> DagNode<'a> {
    pub fn kind(&self) -> NodeKind {
        match self {
            DagNode::Header(_) => NodeKind::Header,
            DagNode::Transactions(_) => NodeKind::Transactions,
            DagNode::Receipts(_) => NodeKind::Receipts,
            DagNode::StateTrie(_) => NodeKind::StateTrie,
            DagNode::StorageTrie(_) => NodeKind::StorageTrie,
        }
    }

    /// Check every unit in the node. Returns the position of the first bad
    /// unit along with the reason.
    pub fn validate(&self) -> Result<(), (usize, EncodingError)> {
        match self {
            DagNode::Header(header) => header.validate().map_err(|e| (0, e)),
            DagNode::Transactions(txs) => txs
                .iter()
                .enumerate()
                .try_for_each(|(i, tx)| tx.validate().map_err(|e| (i, e))),
            DagNode::Receipts(receipts) => receipts
                .iter()
                .enumerate()
                .try_for_each(|(i, rct)| rct.validate().map_err(|e| (i, e))),
            DagNode::StateTrie(raw) | DagNode::StorageTrie(raw) => {
                check_rlp_list(raw).map_err(|e| (0, e))
            }
        }
    }

    /// Split the node into storable blocks, in input order.
    pub fn blocks(&self) -> Vec<IpldBlock<'a>> {
        match *self {
            DagNode::Header(header) => vec![IpldBlock::new(Codec::EthBlock, header.rlp())],
            DagNode::Transactions(txs) => txs
                .iter()
                .map(|tx| IpldBlock::new(Codec::EthTx, tx.encoded()))
                .collect(),
            DagNode::Receipts(receipts) => receipts
                .iter()
                .map(|rct| IpldBlock::new(Codec::EthTxReceipt, &rct.encoded))
                .collect(),
            DagNode::StateTrie(raw) => vec![IpldBlock::new(Codec::EthStateTrie, raw)],
            DagNode::StorageTrie(raw) => vec![IpldBlock::new(Codec::EthStorageTrie, raw)],
        }
    }
}

/// Raw bytes paired with their CID; the unit a content store persists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IpldBlock<'a> {
    cid: Cid,
    data: &'a [u8],
}

impl<'a> IpldBlock<'a> {
    pub fn new(codec: Codec, data: &'a [u8]) -> Self {
        Self {
            cid: Cid::derive(codec, data),
            data,
        }
    }

    pub fn cid(&self) -> &Cid {
        &self.cid
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }
}
