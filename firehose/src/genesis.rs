//! The chain's initial state, as read from a geth genesis file, and its
//! recording as the first block of the stream.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use ethereum_types::{Address, H256, H64, U256};
use firehose_common::serde_utils::{hex_bytes, quantity, u256_hex_or_decimal};
use firehose_common::{Block, Header};
use keccak_hash::keccak;
use serde::Deserialize;

use crate::config::ConfigError;
use crate::context::Context;
use crate::error::TraceResult;
use crate::reasons::BalanceChangeReason;

/// Gas limit geth assumes when the genesis file does not set one.
pub const DEFAULT_GAS_LIMIT: u64 = 4_712_388;

/// Difficulty geth assumes when the genesis file does not set one.
pub const DEFAULT_DIFFICULTY: u64 = 131_072;

/// A geth genesis specification.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Genesis {
    /// Chain configuration, kept opaque.
    #[serde(default)]
    pub config: serde_json::Value,
    /// Proof of work nonce of the genesis header.
    #[serde(default, deserialize_with = "quantity::deserialize")]
    pub nonce: u64,
    /// Unix timestamp of the genesis header.
    #[serde(default, deserialize_with = "quantity::deserialize")]
    pub timestamp: u64,
    /// Extra data of the genesis header.
    #[serde(default, deserialize_with = "hex_bytes::deserialize")]
    pub extra_data: Vec<u8>,
    /// Gas limit, [`DEFAULT_GAS_LIMIT`] when zero.
    #[serde(default, deserialize_with = "quantity::deserialize")]
    pub gas_limit: u64,
    /// Difficulty, [`DEFAULT_DIFFICULTY`] when zero.
    #[serde(default, deserialize_with = "u256_hex_or_decimal::deserialize")]
    pub difficulty: U256,
    /// Mix hash of the genesis header.
    #[serde(default)]
    pub mix_hash: H256,
    /// Beneficiary of the genesis header.
    #[serde(default)]
    pub coinbase: Address,
    /// Accounts allocated at genesis, in address order.
    #[serde(default)]
    pub alloc: BTreeMap<Address, GenesisAccount>,
    /// Height of the genesis block, usually zero.
    #[serde(default, deserialize_with = "quantity::deserialize")]
    pub number: u64,
    /// Gas used, usually zero.
    #[serde(default, deserialize_with = "quantity::deserialize")]
    pub gas_used: u64,
    /// Parent hash, usually zero.
    #[serde(default)]
    pub parent_hash: H256,
    /// Base fee of chains starting with London active.
    #[serde(default)]
    pub base_fee_per_gas: Option<U256>,
}

/// An account allocated at genesis.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct GenesisAccount {
    /// Deployed code.
    #[serde(default, deserialize_with = "hex_bytes::deserialize")]
    pub code: Vec<u8>,
    /// Initial storage. Zero values are not recorded.
    #[serde(default)]
    pub storage: BTreeMap<H256, H256>,
    /// Initial balance.
    #[serde(deserialize_with = "u256_hex_or_decimal::deserialize")]
    pub balance: U256,
    /// Initial nonce.
    #[serde(default, deserialize_with = "quantity::deserialize")]
    pub nonce: u64,
}

impl Genesis {
    /// Decodes a genesis JSON document.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, serde_json::Error> {
        serde_json::from_reader(reader)
    }

    /// Loads a genesis JSON file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path).map_err(|source| ConfigError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file)).map_err(|source| ConfigError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The genesis block header. The state root is computed by the host from
    /// [`Genesis::alloc`].
    pub fn header(&self, state_root: H256) -> Header {
        Header {
            parent_hash: self.parent_hash,
            coinbase: self.coinbase,
            state_root,
            difficulty: if self.difficulty.is_zero() {
                U256::from(DEFAULT_DIFFICULTY)
            } else {
                self.difficulty
            },
            number: self.number,
            gas_limit: if self.gas_limit == 0 {
                DEFAULT_GAS_LIMIT
            } else {
                self.gas_limit
            },
            gas_used: self.gas_used,
            timestamp: self.timestamp,
            extra_data: self.extra_data.clone(),
            mix_hash: self.mix_hash,
            nonce: H64::from_low_u64_be(self.nonce),
            base_fee_per_gas: self.base_fee_per_gas,
            ..Default::default()
        }
    }

    /// The genesis block, without transactions nor uncles.
    pub fn to_block(&self, state_root: H256) -> Block {
        Block::with_header(self.header(state_root))
    }
}

impl Context {
    /// Records every allocated account as a state change of the synthetic
    /// genesis transaction, see [`Context::record_genesis_block`].
    ///
    /// Accounts are visited in address order, storage slots in key order and
    /// zero valued slots are skipped.
    pub fn record_genesis_alloc(
        &mut self,
        alloc: &BTreeMap<Address, GenesisAccount>,
    ) -> TraceResult {
        for (&address, account) in alloc {
            self.record_new_account(address)?;

            if !account.balance.is_zero() {
                self.record_balance_change(
                    address,
                    U256::zero(),
                    account.balance,
                    BalanceChangeReason::GenesisBalance,
                )?;
            }

            if account.nonce != 0 {
                self.record_nonce_change(address, 0, account.nonce)?;
            }

            if !account.code.is_empty() {
                self.record_code_change(
                    address,
                    None,
                    &[],
                    keccak(&account.code),
                    &account.code,
                )?;
            }

            for (&key, &value) in &account.storage {
                if !value.is_zero() {
                    self.record_storage_change(address, key, H256::zero(), value)?;
                }
            }
        }
        Ok(())
    }
}
