//! # IPLD Layer
//!
//! Content addressing for Ethereum objects.
//!
//! ```text
//! cid.rs  — Codec table and version-1 Keccak-256 CIDs
//! node.rs — DagNode (closed set of publishable kinds) and IpldBlock
//! ```

pub mod cid;
pub mod node;

pub use cid::{Cid, CidError, Codec};
pub use node::{DagNode, IpldBlock, NodeKind};
