//! # Publish Payloads
//!
//! [`IpldPayload`] is everything one block contributes to the DAG, as handed
//! over by the block extractor. [`CidPayload`] is what comes back: the same
//! block's identity plus a CID for every object that was published, keyed
//! so the persistence side can join them without caring about positions.
//!
//! ## Correspondence
//!
//! ```text
//! IpldPayload                         CidPayload
//! ───────────                         ──────────
//! header_rlp                   ──►    header_cid
//! block_body.uncles[i]         ──►    uncle_cids[uncle.hash()]
//! block_body.transactions[i]   ─┐
//! trx_meta_data[i]             ─┴──►  transaction_cids[tx.hash()]
//! receipts[i]                  ─┐
//! receipt_meta_data[i]         ─┴──►  receipt_cids[receipt.tx_hash]
//! state_nodes[key]             ──►    state_node_cids[key]
//! storage_nodes[key][j]        ──►    storage_node_cids[key][j]
//! ```
//!
//! Keyed collections are `BTreeMap`s so that two equal payloads serialize
//! to identical bytes. The storage-node sequence under one state key is a
//! `Vec`; its order is meaningful and preserved end to end.

use std::collections::BTreeMap;

use primitive_types::{H160, H256, U256};
use serde::{Deserialize, Serialize};

use super::serde_hex;
use super::types::{EthHeader, Receipt, StateNode, StorageNode, Transaction};
use crate::ipld::Cid;

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Indexing metadata extracted alongside each transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrxMetaData {
    /// Position of the transaction within its block.
    pub index: u64,
    /// Recovered sender.
    pub src: H160,
    /// Recipient; `None` for contract creation.
    pub dst: Option<H160>,
}

/// Indexing metadata extracted alongside each receipt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptMetaData {
    /// First topic of every log the receipt carries, in log order.
    pub topic0s: Vec<H256>,
    /// Address of the contract created by the transaction, if any.
    pub contract_address: Option<H160>,
}

/// A metadata record with the CID of the object it describes.
///
/// Built fresh for every published object; the input metadata is never
/// touched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithCid<M> {
    pub cid: Cid,
    #[serde(flatten)]
    pub meta: M,
}

impl<M: Clone> WithCid<M> {
    pub fn new(cid: Cid, meta: &M) -> Self {
        Self {
            cid,
            meta: meta.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// The parts of a block body the publisher consumes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockBody {
    pub transactions: Vec<Transaction>,
    pub uncles: Vec<EthHeader>,
}

/// One block's worth of data to publish.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpldPayload {
    pub block_hash: H256,
    pub block_number: u64,
    pub total_difficulty: U256,
    #[serde(with = "serde_hex")]
    pub header_rlp: Vec<u8>,
    pub block_body: BlockBody,
    /// Index-aligned with `block_body.transactions`.
    pub trx_meta_data: Vec<TrxMetaData>,
    /// Index-aligned with `block_body.transactions`.
    pub receipts: Vec<Receipt>,
    /// Index-aligned with `receipts`.
    pub receipt_meta_data: Vec<ReceiptMetaData>,
    #[serde(default)]
    pub state_nodes: BTreeMap<H256, StateNode>,
    #[serde(default)]
    pub storage_nodes: BTreeMap<H256, Vec<StorageNode>>,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// CID of a published state trie node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateNodeCid {
    pub cid: Cid,
    pub leaf: bool,
}

/// CID of a published storage trie node, in its input position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageNodeCid {
    pub key: H256,
    pub cid: Cid,
    pub leaf: bool,
}

/// The result of publishing one block. Only ever produced whole.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CidPayload {
    pub block_hash: H256,
    /// Decimal.
    pub block_number: String,
    /// Decimal.
    pub total_difficulty: String,
    pub header_cid: Cid,
    pub uncle_cids: BTreeMap<H256, Cid>,
    pub transaction_cids: BTreeMap<H256, WithCid<TrxMetaData>>,
    /// Keyed by the hash of the transaction that owns the receipt.
    pub receipt_cids: BTreeMap<H256, WithCid<ReceiptMetaData>>,
    pub state_node_cids: BTreeMap<H256, StateNodeCid>,
    pub storage_node_cids: BTreeMap<H256, Vec<StorageNodeCid>>,
}
