use ethereum_types::{Address, Bloom, H256};

/// An event emitted by a contract during execution.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Log {
    /// Contract that emitted the log.
    pub address: Address,
    /// Indexed topics, the event signature first.
    pub topics: Vec<H256>,
    /// Non-indexed data.
    pub data: Vec<u8>,
}

/// The outcome of a transaction as computed by the host.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Receipt {
    /// Intermediate state root for pre-Byzantium receipts, empty afterwards.
    pub post_state: Vec<u8>,
    /// Gas used in the block up to and including this transaction.
    pub cumulative_gas_used: u64,
    /// Gas used by this transaction alone.
    pub gas_used: u64,
    /// Bloom filter over `logs`.
    pub logs_bloom: Bloom,
    /// Logs, in emission order.
    pub logs: Vec<Log>,
}
