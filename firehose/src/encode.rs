//! Field encoders for the line protocol.
//!
//! Each encoder is a thin [`Display`](fmt::Display) adapter over a borrowed
//! value so a line can be assembled field by field into a reused buffer.
//!
//! | value              | encoding                                         |
//! |--------------------|--------------------------------------------------|
//! | integers           | decimal                                          |
//! | [`Addr`], [`Hash`] | fixed length lowercase hex, no prefix            |
//! | [`Hex`]            | lowercase hex, [`EMPTY`] when there are no bytes |
//! | [`BigInt`]         | [`Hex`] of the minimal big-endian bytes          |
//! | [`Bool`]           | `1` or `0`                                       |
//! | absent optionals   | [`EMPTY`]                                        |
//! | [`Json`]           | compact JSON                                     |

use std::fmt;

use ethereum_types::{Address, H256, U256};
use firehose_common::AccessListItem;
use serde::Serialize;

/// Placeholder for empty byte strings, zero big integers and absent values.
pub const EMPTY: &str = ".";

fn write_hex(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    let mut buf = [0u8; 128];
    for chunk in bytes.chunks(buf.len() / 2) {
        let out = &mut buf[..chunk.len() * 2];
        hex::encode_to_slice(chunk, out).map_err(|_| fmt::Error)?;
        f.write_str(std::str::from_utf8(out).map_err(|_| fmt::Error)?)?;
    }
    Ok(())
}

/// An address as 40 hex characters.
#[derive(Clone, Copy, Debug)]
pub struct Addr<'a>(pub &'a Address);

impl fmt::Display for Addr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hex(f, self.0.as_bytes())
    }
}

/// An optional address, [`EMPTY`] when absent (e.g. contract creation).
#[derive(Clone, Copy, Debug)]
pub struct OptAddr<'a>(pub Option<&'a Address>);

impl fmt::Display for OptAddr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(address) => Addr(address).fmt(f),
            None => f.write_str(EMPTY),
        }
    }
}

/// A 32 byte hash as 64 hex characters.
#[derive(Clone, Copy, Debug)]
pub struct Hash<'a>(pub &'a H256);

impl fmt::Display for Hash<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hex(f, self.0.as_bytes())
    }
}

/// An optional hash, [`EMPTY`] when absent.
#[derive(Clone, Copy, Debug)]
pub struct OptHash<'a>(pub Option<&'a H256>);

impl fmt::Display for OptHash<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(hash) => Hash(hash).fmt(f),
            None => f.write_str(EMPTY),
        }
    }
}

/// Arbitrary bytes.
#[derive(Clone, Copy, Debug)]
pub struct Hex<'a>(pub &'a [u8]);

impl fmt::Display for Hex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str(EMPTY);
        }
        write_hex(f, self.0)
    }
}

/// A big integer as the hex of its minimal big-endian representation, so zero
/// encodes as [`EMPTY`].
#[derive(Clone, Copy, Debug)]
pub struct BigInt<'a>(pub &'a U256);

impl fmt::Display for BigInt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = [0u8; 32];
        self.0.to_big_endian(&mut buf);
        let start = buf.iter().position(|b| *b != 0).unwrap_or(buf.len());
        Hex(&buf[start..]).fmt(f)
    }
}

/// An optional big integer, [`EMPTY`] when absent.
#[derive(Clone, Copy, Debug)]
pub struct OptBigInt<'a>(pub Option<&'a U256>);

impl fmt::Display for OptBigInt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => BigInt(value).fmt(f),
            None => f.write_str(EMPTY),
        }
    }
}

/// A boolean, `1` or `0`.
#[derive(Clone, Copy, Debug)]
pub struct Bool(pub bool);

impl fmt::Display for Bool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.0 { "1" } else { "0" })
    }
}

/// Log topics, comma separated.
#[derive(Clone, Copy, Debug)]
pub struct Topics<'a>(pub &'a [H256]);

impl fmt::Display for Topics<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, topic) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            Hash(topic).fmt(f)?;
        }
        Ok(())
    }
}

/// A structured payload as compact JSON.
#[derive(Clone, Copy, Debug)]
pub struct Json<'a, T: ?Sized>(pub &'a T);

impl<T: Serialize + ?Sized> fmt::Display for Json<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self.0).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// Binary form of an access list, printed as [`Hex`] and decoded by the
/// console reader.
///
/// Layout: uvarint tuple count, then for each tuple the 20 address bytes, a
/// uvarint storage key count and 32 bytes per storage key. An empty list is a
/// single `0x00`.
pub fn access_list(items: &[AccessListItem]) -> Vec<u8> {
    let size = items
        .iter()
        .map(|item| 20 + 10 + 32 * item.storage_keys.len())
        .sum::<usize>();
    let mut out = Vec::with_capacity(10 + size);

    put_uvarint(&mut out, items.len() as u64);
    for item in items {
        out.extend_from_slice(item.address.as_bytes());
        put_uvarint(&mut out, item.storage_keys.len() as u64);
        for key in &item.storage_keys {
            out.extend_from_slice(key.as_bytes());
        }
    }
    out
}

/// LEB128, as Go's `binary.PutUvarint`.
fn put_uvarint(out: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        out.push(value as u8 | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(&[], ".")]
    #[case(&[0x00], "00")]
    #[case(&[0xde, 0xad, 0xbe, 0xef], "deadbeef")]
    fn hex_bytes(#[case] bytes: &[u8], #[case] expected: &str) {
        assert_eq!(Hex(bytes).to_string(), expected);
    }

    #[test]
    fn hex_spanning_several_chunks() {
        let bytes = (0..=255u8).collect::<Vec<_>>();
        assert_eq!(Hex(&bytes).to_string(), hex::encode(&bytes));
    }

    #[rstest]
    #[case(U256::zero(), ".".to_owned())]
    #[case(U256::one(), "01".to_owned())]
    #[case(U256::from(0x1234), "1234".to_owned())]
    #[case(U256::from(1_000_000_000_000_000_000u64), "0de0b6b3a7640000".to_owned())]
    #[case(U256::MAX, "ff".repeat(32))]
    fn big_int(#[case] value: U256, #[case] expected: String) {
        assert_eq!(BigInt(&value).to_string(), expected);
    }

    #[test]
    fn fixed_length_values() {
        let address = Address::from_low_u64_be(1);
        assert_eq!(
            Addr(&address).to_string(),
            "0000000000000000000000000000000000000001"
        );
        assert_eq!(OptAddr(None).to_string(), ".");
        assert_eq!(Hash(&H256::zero()).to_string(), "0".repeat(64));
        assert_eq!(OptHash(None).to_string(), ".");
        assert_eq!(OptBigInt(None).to_string(), ".");
        assert_eq!(Bool(true).to_string(), "1");
        assert_eq!(Bool(false).to_string(), "0");
    }

    #[test]
    fn topics() {
        let topics = [H256::repeat_byte(0xaa), H256::repeat_byte(0xbb)];
        assert_eq!(
            Topics(&topics).to_string(),
            format!("{},{}", "aa".repeat(32), "bb".repeat(32))
        );
        assert_eq!(Topics(&[]).to_string(), "");
    }

    #[test]
    fn empty_access_list() {
        assert_eq!(access_list(&[]), vec![0x00]);
    }

    #[test]
    fn access_list_layout() {
        let items = [
            AccessListItem {
                address: Address::repeat_byte(0x11),
                storage_keys: vec![H256::repeat_byte(0x22), H256::repeat_byte(0x33)],
            },
            AccessListItem {
                address: Address::repeat_byte(0x44),
                storage_keys: vec![],
            },
        ];

        let mut expected = vec![0x02];
        expected.extend([0x11; 20]);
        expected.push(0x02);
        expected.extend([0x22; 32]);
        expected.extend([0x33; 32]);
        expected.extend([0x44; 20]);
        expected.push(0x00);

        assert_eq!(access_list(&items), expected);
    }

    #[rstest]
    #[case(0, &[0x00])]
    #[case(127, &[0x7f])]
    #[case(128, &[0x80, 0x01])]
    #[case(300, &[0xac, 0x02])]
    fn uvarint(#[case] value: u64, #[case] expected: &[u8]) {
        let mut out = Vec::new();
        put_uvarint(&mut out, value);
        assert_eq!(out, expected);
    }
}
