#![allow(dead_code)]

use std::io;
use std::sync::Arc;

use ethereum_types::{Address, U256};
use firehose::{Context, Sink};
use firehose_common::{Block, Header, Transaction, TxType};
use keccak_hash::keccak;
use libsecp256k1::{Message, PublicKey, SecretKey};
use parking_lot::Mutex;

/// In-memory destination shared between a [`Sink`] and the test.
#[derive(Clone, Default)]
pub struct Capture(Arc<Mutex<Vec<u8>>>);

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Capture {
    pub fn sink(&self) -> Sink {
        Sink::new(self.clone())
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.0.lock().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        String::from_utf8(self.bytes())
            .unwrap()
            .lines()
            .map(str::to_owned)
            .collect()
    }
}

pub fn init_logger() {
    let _ = pretty_env_logger::try_init();
}

pub fn block(number: u64) -> Block {
    Block::with_header(Header {
        number,
        gas_limit: 30_000_000,
        ..Default::default()
    })
}

/// Lines printed by a buffering context.
pub fn buffered_lines(ctx: &Context) -> Vec<String> {
    String::from_utf8(ctx.firehose_log().unwrap().to_vec())
        .unwrap()
        .lines()
        .map(str::to_owned)
        .collect()
}

/// The tag of each line.
pub fn tags(lines: &[String]) -> Vec<&str> {
    lines
        .iter()
        .map(|line| line.split(' ').nth(1).unwrap())
        .collect()
}

/// The last field of a line, the ordinal for ordering-sensitive events.
pub fn last_field(line: &str) -> u64 {
    line.rsplit(' ').next().unwrap().parse().unwrap()
}

pub fn secret() -> SecretKey {
    SecretKey::parse(&[0x46; 32]).unwrap()
}

pub fn address_of(secret: &SecretKey) -> Address {
    let public_key = PublicKey::from_secret_key(secret);
    Address::from_slice(&keccak(&public_key.serialize()[1..]).as_bytes()[12..])
}

/// A dynamic fee transaction signed by [`secret`].
pub fn signed_transaction(nonce: u64) -> Transaction {
    let mut tx = Transaction {
        tx_type: TxType::DynamicFee,
        chain_id: Some(137),
        nonce,
        gas_price: U256::from(30_000_000_000u64),
        max_fee_per_gas: Some(U256::from(30_000_000_000u64)),
        max_priority_fee_per_gas: Some(U256::from(1_000_000_000u64)),
        gas: 21000,
        to: Some(Address::repeat_byte(0x35)),
        value: U256::from(1_000_000u64),
        ..Default::default()
    };

    let message = Message::parse(tx.signing_hash().as_fixed_bytes());
    let (signature, recovery_id) = libsecp256k1::sign(&message, &secret());
    let bytes = signature.serialize();
    tx.r = U256::from_big_endian(&bytes[..32]);
    tx.s = U256::from_big_endian(&bytes[32..]);
    tx.v = U256::from(recovery_id.serialize());
    tx
}
