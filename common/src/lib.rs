//! Chain data consumed by the Firehose tracer.
//!
//! The tracer never touches live chain state. Everything it serializes comes
//! from the values defined here, handed over read-only by the host at well
//! defined points: the [`Block`] being processed, each [`Transaction`] and its
//! [`Receipt`], and the [`Log`]s emitted along the way.

#![deny(rustdoc::broken_intra_doc_links)]
#![warn(missing_debug_implementations)]
#![warn(missing_docs)]

mod block;
mod receipt;
pub mod serde_utils;
mod transaction;

pub use block::{Block, Header};
use ethereum_types::H256;
use hex_literal::hex;
pub use receipt::{Log, Receipt};
pub use transaction::{AccessList, AccessListItem, SignatureError, Transaction, TxType};

/// The hash of an empty Merkle Patricia trie.
/// 0x56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421
pub const EMPTY_TRIE_HASH: H256 = H256(hex!(
    "56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421"
));

/// The hash of an empty list of uncle headers, `keccak(rlp([]))`.
/// 0x1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347
pub const EMPTY_UNCLES_HASH: H256 = H256(hex!(
    "1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347"
));
