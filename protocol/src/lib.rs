// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # ethdag — Ethereum Block Data as IPLD
//!
//! Takes an Ethereum block that has already been extracted from a node
//! (header, uncles, transactions, receipts, and the state and storage trie
//! nodes it touched) and writes every piece of it into a content-addressed
//! store. What comes back is a CID for every piece, keyed the way an
//! indexer wants to look them up: by block hash, transaction hash, or
//! state key.
//!
//! ## Architecture
//!
//! - **crypto** — Keccak-256, the only hash anything here is addressed by.
//! - **ipld** — CIDs, multicodec table, and the closed set of node kinds.
//! - **eth** — Chain objects in canonical encoding plus the input and output
//!   payloads.
//! - **storage** — The content-store seam, with sled and in-memory adapters.
//! - **dag_putters** — One putter per node kind: validate, write, return CIDs.
//! - **publisher** — Runs a whole block through the putters and assembles
//!   the CID payload.
//! - **indexer** — Walks a header range and publishes every block that has
//!   not been checked yet.
//! - **config** — Protocol constants.
//!
//! ## Ground Rules
//!
//! 1. Bytes are hashed exactly as the chain produced them. Nothing is
//!    re-encoded.
//! 2. A publish either returns a full `CidPayload` or an error. Never half.
//! 3. Writing the same block twice is not an error.

pub mod config;
pub mod crypto;
pub mod dag_putters;
pub mod eth;
pub mod indexer;
pub mod ipld;
pub mod publisher;
pub mod storage;

pub use eth::{CidPayload, IpldPayload};
pub use ipld::{Cid, Codec};
pub use publisher::{IpldPublisher, PublishError, Publisher};
