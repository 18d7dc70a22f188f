//! # Ethereum Block Data
//!
//! Input and output shapes of the publisher:
//!
//! ```text
//! types.rs     — chain objects held in their canonical encodings
//! payload.rs   — per-block input (IpldPayload) and output (CidPayload)
//! serde_hex.rs — 0x-hex serde adapter for raw byte fields
//! ```

pub mod payload;
pub(crate) mod serde_hex;
pub mod types;

pub use payload::{
    BlockBody, CidPayload, IpldPayload, ReceiptMetaData, StateNodeCid, StorageNodeCid,
    TrxMetaData, WithCid,
};
pub use types::{EncodingError, EthHeader, Receipt, StateNode, StorageNode, Transaction};
