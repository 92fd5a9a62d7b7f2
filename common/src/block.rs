use ethereum_types::{Address, Bloom, H256, H64, U256};
use keccak_hash::keccak;
use rlp::{Encodable, RlpStream};
use serde::Serialize;

use crate::serde_utils::{hex_bytes, quantity};
use crate::{Transaction, EMPTY_TRIE_HASH, EMPTY_UNCLES_HASH};

/// A block header, serialized with the geth JSON field names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    /// Hash of the parent block.
    pub parent_hash: H256,
    /// `keccak(rlp(uncles))`.
    #[serde(rename = "sha3Uncles")]
    pub uncles_hash: H256,
    /// Beneficiary of the block rewards.
    #[serde(rename = "miner")]
    pub coinbase: Address,
    /// Root of the state trie after the block.
    pub state_root: H256,
    /// Root of the transactions trie.
    pub transactions_root: H256,
    /// Root of the receipts trie.
    pub receipts_root: H256,
    /// Bloom filter over the logs of every receipt.
    pub logs_bloom: Bloom,
    /// Proof of work difficulty, zero after the merge.
    pub difficulty: U256,
    /// Height of the block.
    #[serde(with = "quantity")]
    pub number: u64,
    /// Gas limit.
    #[serde(with = "quantity")]
    pub gas_limit: u64,
    /// Gas used by all transactions of the block.
    #[serde(with = "quantity")]
    pub gas_used: u64,
    /// Unix timestamp, in seconds.
    #[serde(with = "quantity")]
    pub timestamp: u64,
    /// Arbitrary data set by the producer.
    #[serde(with = "hex_bytes")]
    pub extra_data: Vec<u8>,
    /// Proof of work mix hash, or the beacon randomness.
    pub mix_hash: H256,
    /// Proof of work nonce.
    pub nonce: H64,
    /// Only present once the London fork is active.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_fee_per_gas: Option<U256>,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            parent_hash: H256::zero(),
            uncles_hash: EMPTY_UNCLES_HASH,
            coinbase: Address::zero(),
            state_root: EMPTY_TRIE_HASH,
            transactions_root: EMPTY_TRIE_HASH,
            receipts_root: EMPTY_TRIE_HASH,
            logs_bloom: Bloom::zero(),
            difficulty: U256::zero(),
            number: 0,
            gas_limit: 0,
            gas_used: 0,
            timestamp: 0,
            extra_data: Vec::new(),
            mix_hash: H256::zero(),
            nonce: H64::zero(),
            base_fee_per_gas: None,
        }
    }
}

impl Header {
    /// `keccak(rlp(header))`.
    pub fn hash(&self) -> H256 {
        keccak(rlp::encode(self))
    }
}

impl Encodable for Header {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(if self.base_fee_per_gas.is_some() { 16 } else { 15 });
        s.append(&self.parent_hash);
        s.append(&self.uncles_hash);
        s.append(&self.coinbase);
        s.append(&self.state_root);
        s.append(&self.transactions_root);
        s.append(&self.receipts_root);
        s.append(&self.logs_bloom);
        s.append(&self.difficulty);
        s.append(&self.number);
        s.append(&self.gas_limit);
        s.append(&self.gas_used);
        s.append(&self.timestamp);
        s.append(&self.extra_data);
        s.append(&self.mix_hash);
        s.append(&self.nonce);
        if let Some(base_fee) = &self.base_fee_per_gas {
            s.append(base_fee);
        }
    }
}

/// A full block: header plus body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Block {
    /// Header of the block.
    pub header: Header,
    /// Transactions, in execution order.
    pub transactions: Vec<Transaction>,
    /// Uncle headers.
    pub uncles: Vec<Header>,
}

impl Block {
    /// A block without transactions nor uncles.
    pub fn with_header(header: Header) -> Self {
        Self {
            header,
            transactions: Vec::new(),
            uncles: Vec::new(),
        }
    }

    /// Height of the block.
    pub fn number(&self) -> u64 {
        self.header.number
    }

    /// Hash of the header.
    pub fn hash(&self) -> H256 {
        self.header.hash()
    }

    /// Difficulty of the block.
    pub fn difficulty(&self) -> U256 {
        self.header.difficulty
    }

    /// State root after the block.
    pub fn state_root(&self) -> H256 {
        self.header.state_root
    }

    /// Size in bytes of the block's canonical RLP encoding.
    pub fn size(&self) -> usize {
        rlp::encode(self).len()
    }
}

impl Encodable for Block {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(3);
        s.append(&self.header);
        s.append_list::<Transaction, _>(&self.transactions);
        s.append_list::<Header, _>(&self.uncles);
    }
}
