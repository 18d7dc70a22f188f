//! # Cryptographic Primitives
//!
//! Only hashing lives here. Nothing in the publisher signs or encrypts;
//! it names bytes, and Keccak-256 is the name Ethereum already uses.

pub mod hash;

pub use hash::{keccak256, keccak256_h256};
