//! End-to-end publishing tests.
//!
//! Each test builds a block out of real RLP (header list, legacy and typed
//! transactions, receipts, trie nodes), publishes it into a store and checks
//! the CID payload against what can be derived independently from the raw
//! bytes. Stores are temporary; nothing is shared between tests.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

use primitive_types::{H160, H256, U256};
use rlp::RlpStream;

use ethdag_protocol::crypto::keccak256;
use ethdag_protocol::eth::{
    BlockBody, EthHeader, IpldPayload, Receipt, ReceiptMetaData, StateNode, StorageNode,
    Transaction, TrxMetaData,
};
use ethdag_protocol::storage::{ContentStore, MemoryBlockstore, SledBlockstore};
use ethdag_protocol::{Cid, CidPayload, Codec, IpldPublisher, Publisher};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

/// A 15-field pre-London header. Field values are arbitrary but the shape
/// is the real one.
fn header_rlp(number: u64, parent: H256) -> Vec<u8> {
    let mut s = RlpStream::new_list(15);
    s.append(&parent);
    s.append(&H256::from(keccak256(&[0xc0])));
    s.append(&H160::repeat_byte(0xcb));
    s.append(&H256::repeat_byte(0x51));
    s.append(&H256::repeat_byte(0x52));
    s.append(&H256::repeat_byte(0x53));
    s.append(&vec![0u8; 256]);
    s.append(&U256::from(0x0400_0000u64));
    s.append(&number);
    s.append(&8_000_000u64);
    s.append(&21_000u64);
    s.append(&1_600_000_000u64);
    s.append(&b"ethdag".to_vec());
    s.append(&H256::repeat_byte(0x77));
    s.append(&vec![0u8; 8]);
    s.out().to_vec()
}

fn legacy_tx(nonce: u64, to: H160) -> Vec<u8> {
    let mut s = RlpStream::new_list(9);
    s.append(&nonce);
    s.append(&20_000_000_000u64);
    s.append(&21_000u64);
    s.append(&to);
    s.append(&U256::exp10(18));
    s.append(&Vec::<u8>::new());
    s.append(&27u8);
    s.append(&H256::repeat_byte(0x0a));
    s.append(&H256::repeat_byte(0x0b));
    s.out().to_vec()
}

/// EIP-2930 access-list transaction: `0x01 || rlp(...)`.
fn typed_tx(nonce: u64) -> Vec<u8> {
    let mut s = RlpStream::new_list(11);
    s.append(&1u64);
    s.append(&nonce);
    s.append(&20_000_000_000u64);
    s.append(&50_000u64);
    s.append(&H160::repeat_byte(0x99));
    s.append(&0u64);
    s.append(&Vec::<u8>::new());
    s.begin_list(0);
    s.append(&1u8);
    s.append(&H256::repeat_byte(0x0c));
    s.append(&H256::repeat_byte(0x0d));
    let mut out = vec![0x01];
    out.extend_from_slice(&s.out());
    out
}

fn receipt_rlp(cumulative_gas: u64) -> Vec<u8> {
    let mut s = RlpStream::new_list(4);
    s.append(&1u8);
    s.append(&cumulative_gas);
    s.append(&vec![0u8; 256]);
    s.begin_list(0);
    s.out().to_vec()
}

fn trie_node(tag: u8) -> Vec<u8> {
    let mut s = RlpStream::new_list(2);
    s.append(&vec![0x20, tag]);
    s.append(&vec![tag; 40]);
    s.out().to_vec()
}

/// A block with three transactions (one typed), one uncle, one touched
/// account and two storage slots.
fn sample_block(number: u64) -> IpldPayload {
    let header = header_rlp(number, H256::repeat_byte(0x01));
    let transactions = vec![
        Transaction::from_encoded(legacy_tx(0, H160::repeat_byte(0x33))),
        Transaction::from_encoded(typed_tx(1)),
        Transaction::from_encoded(legacy_tx(2, H160::repeat_byte(0x44))),
    ];
    let receipts: Vec<_> = transactions
        .iter()
        .enumerate()
        .map(|(i, tx)| Receipt::new(tx.hash(), receipt_rlp(21_000 * (i as u64 + 1))))
        .collect();

    let account = H256::repeat_byte(0xac);
    let mut state_nodes = BTreeMap::new();
    state_nodes.insert(
        account,
        StateNode {
            value: trie_node(0x01),
            leaf: true,
        },
    );
    let mut storage_nodes = BTreeMap::new();
    storage_nodes.insert(
        account,
        vec![
            StorageNode {
                key: H256::repeat_byte(0x02),
                value: trie_node(0x02),
                leaf: false,
            },
            StorageNode {
                key: H256::repeat_byte(0x03),
                value: trie_node(0x03),
                leaf: true,
            },
        ],
    );

    IpldPayload {
        block_hash: H256(keccak256(&header)),
        block_number: number,
        total_difficulty: U256::from_dec_str("12345678901234567890123").unwrap(),
        header_rlp: header,
        block_body: BlockBody {
            transactions,
            uncles: vec![EthHeader::from_rlp(header_rlp(number - 1, H256::zero()))],
        },
        trx_meta_data: (0..3)
            .map(|i| TrxMetaData {
                index: i,
                src: H160::repeat_byte(0x11),
                dst: if i == 1 { None } else { Some(H160::repeat_byte(0x22)) },
            })
            .collect(),
        receipts,
        receipt_meta_data: (0..3u8)
            .map(|i| ReceiptMetaData {
                topic0s: vec![H256::repeat_byte(0xe0 + i)],
                contract_address: if i == 1 {
                    Some(H160::repeat_byte(0xcc))
                } else {
                    None
                },
            })
            .collect(),
        state_nodes,
        storage_nodes,
    }
}

fn every_cid(out: &CidPayload) -> Vec<Cid> {
    let mut cids = vec![out.header_cid];
    cids.extend(out.uncle_cids.values().copied());
    cids.extend(out.transaction_cids.values().map(|r| r.cid));
    cids.extend(out.receipt_cids.values().map(|r| r.cid));
    cids.extend(out.state_node_cids.values().map(|r| r.cid));
    cids.extend(out.storage_node_cids.values().flatten().map(|r| r.cid));
    cids
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn full_block_publishes_every_object() {
    let store = Arc::new(MemoryBlockstore::new());
    let publisher = Publisher::new(store.clone());
    let block = sample_block(4_000_000);

    let out = publisher.publish(&block).unwrap();

    assert_eq!(out.block_hash, block.block_hash);
    assert_eq!(out.block_number, "4000000");
    assert_eq!(out.total_difficulty, "12345678901234567890123");
    assert_eq!(
        out.header_cid,
        Cid::derive(Codec::EthBlock, &block.header_rlp)
    );
    // Header digest is the block hash.
    assert_eq!(out.header_cid.digest(), block.block_hash.as_fixed_bytes());

    assert_eq!(out.uncle_cids.len(), 1);
    assert_eq!(out.transaction_cids.len(), 3);
    assert_eq!(out.receipt_cids.len(), 3);
    assert_eq!(out.state_node_cids.len(), 1);
    assert_eq!(out.storage_node_cids[&H256::repeat_byte(0xac)].len(), 2);

    let cids = every_cid(&out);
    assert_eq!(cids.len(), 1 + 1 + 3 + 3 + 1 + 2);
    for cid in &cids {
        assert!(store.has(cid).unwrap(), "{cid} missing from store");
    }
    assert_eq!(store.len(), cids.len());
}

#[test]
fn stored_bytes_hash_to_their_cid() {
    let store = Arc::new(MemoryBlockstore::new());
    let publisher = Publisher::new(store.clone());

    let out = publisher.publish(&sample_block(77)).unwrap();

    for cid in every_cid(&out) {
        let data = store.get(&cid).unwrap().unwrap();
        assert_eq!(Cid::derive(cid.codec(), &data), cid);
    }
}

#[test]
fn typed_transaction_keeps_its_envelope() {
    let store = Arc::new(MemoryBlockstore::new());
    let publisher = Publisher::new(store.clone());
    let block = sample_block(12);
    let typed = &block.block_body.transactions[1];

    let out = publisher.publish(&block).unwrap();

    let record = &out.transaction_cids[&typed.hash()];
    assert_eq!(record.cid.codec(), Codec::EthTx);
    assert_eq!(record.meta.dst, None);
    assert_eq!(store.get(&record.cid).unwrap().unwrap()[0], 0x01);
}

#[test]
fn output_json_shape() {
    let publisher = Publisher::new(Arc::new(MemoryBlockstore::new()));
    let block = sample_block(5);

    let out = publisher.publish(&block).unwrap();
    let json = serde_json::to_value(&out).unwrap();

    assert_eq!(json["block_number"], "5");
    let header_cid = json["header_cid"].as_str().unwrap();
    assert!(header_cid.starts_with('z'));
    assert_eq!(header_cid.parse::<Cid>().unwrap(), out.header_cid);

    let tx_hash = format!("{:?}", block.block_body.transactions[0].hash());
    let record = &json["transaction_cids"][&tx_hash];
    assert!(record["cid"].is_string());
    assert_eq!(record["index"], 0);

    let back: CidPayload = serde_json::from_value(json).unwrap();
    assert_eq!(back, out);
}

#[test]
fn payload_json_survives_publish_from_disk() {
    let block = sample_block(9);
    let json = serde_json::to_string(&block).unwrap();
    let parsed: IpldPayload = serde_json::from_str(&json).unwrap();

    let publisher = Publisher::new(Arc::new(MemoryBlockstore::new()));
    assert_eq!(
        publisher.publish(&parsed).unwrap(),
        publisher.publish(&block).unwrap()
    );
}

#[test]
fn sled_store_persists_published_block() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blocks");

    let out = {
        let store = Arc::new(SledBlockstore::open(&path).unwrap());
        let out = Publisher::new(store.clone())
            .publish(&sample_block(100))
            .unwrap();
        store.flush().unwrap();
        out
    };

    let reopened = SledBlockstore::open(&path).unwrap();
    for cid in every_cid(&out) {
        assert!(reopened.has(&cid).unwrap());
    }
}

#[test]
fn concurrent_publishes_share_one_store() {
    // Consecutive blocks share their uncle-parent shape and trie nodes, so
    // the threads race on the same CIDs.
    let store = Arc::new(SledBlockstore::open_temporary().unwrap());
    let publisher = Arc::new(Publisher::new(store.clone()));

    let handles: Vec<_> = (0..8u64)
        .map(|i| {
            let publisher = Arc::clone(&publisher);
            thread::spawn(move || publisher.publish(&sample_block(1_000 + i % 4)))
        })
        .collect();
    let outputs: Vec<CidPayload> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap())
        .collect();

    for i in 0..4 {
        assert_eq!(outputs[i], outputs[i + 4]);
    }
    let expected = Publisher::new(Arc::new(MemoryBlockstore::new()))
        .publish(&sample_block(1_000))
        .unwrap();
    assert_eq!(outputs[0], expected);
}

#[test]
fn trie_nodes_shared_between_blocks_are_stored_once() {
    let store = Arc::new(MemoryBlockstore::new());
    let publisher = Publisher::new(store.clone());

    let first = publisher.publish(&sample_block(500)).unwrap();
    let after_first = store.len();
    let second = publisher.publish(&sample_block(501)).unwrap();

    assert_eq!(first.state_node_cids, second.state_node_cids);
    assert_eq!(first.storage_node_cids, second.storage_node_cids);
    assert_eq!(first.transaction_cids, second.transaction_cids);
    // Only the new header and its uncle are new blocks.
    assert_eq!(store.len(), after_first + 2);
}
