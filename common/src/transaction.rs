use ethereum_types::{Address, H256, U256};
use keccak_hash::keccak;
use rlp::{Encodable, RlpStream};
use thiserror::Error;

/// Stores the result of sender recovery. Returns a [SignatureError] upon
/// failure.
pub type SignatureResult<T> = Result<T, SignatureError>;

/// An error type for transaction sender recovery.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum SignatureError {
    /// The `v` component does not map to a recovery id for this transaction
    /// type.
    #[error("invalid signature v value {0}")]
    InvalidV(U256),

    /// `r` and `s` do not form a valid secp256k1 signature.
    #[error("malformed signature: {0:?}")]
    Malformed(libsecp256k1::Error),

    /// The signature is well formed but no public key recovers from it.
    #[error("public key recovery failed: {0:?}")]
    Recovery(libsecp256k1::Error),
}

/// The [EIP-2718](https://eips.ethereum.org/EIPS/eip-2718) envelope type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TxType {
    /// Pre-EIP-2718 transaction.
    #[default]
    Legacy = 0,
    /// [EIP-2930](https://eips.ethereum.org/EIPS/eip-2930) transaction.
    AccessList = 1,
    /// [EIP-1559](https://eips.ethereum.org/EIPS/eip-1559) transaction.
    DynamicFee = 2,
}

/// One entry of an [EIP-2930](https://eips.ethereum.org/EIPS/eip-2930) access list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccessListItem {
    /// Account warmed up by the entry.
    pub address: Address,
    /// Storage slots of `address` warmed up by the entry.
    pub storage_keys: Vec<H256>,
}

impl Encodable for AccessListItem {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(2);
        s.append(&self.address);
        s.append_list::<H256, _>(&self.storage_keys);
    }
}

/// An access list, RLP encoded as a list of entries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccessList(pub Vec<AccessListItem>);

impl AccessList {
    /// Iterates over the entries.
    pub fn iter(&self) -> impl Iterator<Item = &AccessListItem> {
        self.0.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list has no entry.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Encodable for AccessList {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.append_list::<AccessListItem, _>(&self.0);
    }
}

/// A signed transaction of any supported envelope type.
///
/// Fields that only exist for some envelopes are ignored by the others:
/// `chain_id` and `access_list` by legacy transactions (which carry their chain
/// id inside `v`), the fee caps by everything but dynamic fee transactions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Transaction {
    /// Envelope type.
    pub tx_type: TxType,
    /// Chain id of typed envelopes.
    pub chain_id: Option<u64>,
    /// Sender nonce.
    pub nonce: u64,
    /// Gas price, or the fee cap of dynamic fee transactions.
    pub gas_price: U256,
    /// Tip cap of dynamic fee transactions.
    pub max_priority_fee_per_gas: Option<U256>,
    /// Fee cap of dynamic fee transactions.
    pub max_fee_per_gas: Option<U256>,
    /// Gas limit.
    pub gas: u64,
    /// `None` for contract creation.
    pub to: Option<Address>,
    /// Wei transferred to `to`.
    pub value: U256,
    /// Call data, or init code for contract creation.
    pub data: Vec<u8>,
    /// Access list of typed envelopes.
    pub access_list: AccessList,
    /// Signature `v`: the recovery id, plus the EIP-155 offset for legacy
    /// transactions.
    pub v: U256,
    /// Signature `r`.
    pub r: U256,
    /// Signature `s`.
    pub s: U256,
}

impl Transaction {
    /// The chain id the transaction is replay-protected for, if any.
    pub fn chain_id(&self) -> Option<u64> {
        match self.tx_type {
            TxType::Legacy => {
                let v = self.v.low_u64();
                (self.v <= U256::from(u64::MAX) && v >= 35).then(|| (v - 35) / 2)
            }
            _ => self.chain_id,
        }
    }

    /// `keccak` of the transaction envelope.
    pub fn hash(&self) -> H256 {
        keccak(self.envelope(true))
    }

    /// The hash the sender signed.
    pub fn signing_hash(&self) -> H256 {
        keccak(self.envelope(false))
    }

    /// Recovers the sender address from the signature.
    pub fn sender(&self) -> SignatureResult<Address> {
        let recovery_id = self.recovery_id()?;

        let mut signature = [0u8; 64];
        self.r.to_big_endian(&mut signature[..32]);
        self.s.to_big_endian(&mut signature[32..]);

        ecrecover(self.signing_hash(), &signature, recovery_id)
    }

    /// The price per gas actually paid once `base_fee` is known. Only dynamic
    /// fee transactions depend on it.
    pub fn effective_gas_price(&self, base_fee: Option<U256>) -> U256 {
        match (self.tx_type, base_fee) {
            (TxType::DynamicFee, Some(base_fee)) => {
                let fee_cap = self.max_fee_per_gas.unwrap_or(self.gas_price);
                let tip = self.max_priority_fee_per_gas.unwrap_or_default();
                fee_cap.min(tip.saturating_add(base_fee))
            }
            _ => self.gas_price,
        }
    }

    fn recovery_id(&self) -> SignatureResult<u8> {
        if self.v > U256::from(u64::MAX) {
            return Err(SignatureError::InvalidV(self.v));
        }

        let v = self.v.low_u64();
        match self.tx_type {
            TxType::Legacy => match v {
                27 | 28 => Ok((v - 27) as u8),
                35.. => Ok(((v - 35) % 2) as u8),
                _ => Err(SignatureError::InvalidV(self.v)),
            },
            _ => match v {
                0 | 1 => Ok(v as u8),
                _ => Err(SignatureError::InvalidV(self.v)),
            },
        }
    }

    /// The EIP-2718 envelope: the RLP payload, prefixed by the type byte for
    /// typed transactions.
    fn envelope(&self, signed: bool) -> Vec<u8> {
        let mut stream = RlpStream::new();
        self.rlp_fields(&mut stream, signed);
        let payload = stream.out();

        match self.tx_type {
            TxType::Legacy => payload.to_vec(),
            tx_type => {
                let mut out = Vec::with_capacity(payload.len() + 1);
                out.push(tx_type as u8);
                out.extend_from_slice(&payload);
                out
            }
        }
    }

    fn rlp_fields(&self, s: &mut RlpStream, signed: bool) {
        match self.tx_type {
            TxType::Legacy => {
                let chain_id = self.chain_id();
                s.begin_list(if signed || chain_id.is_some() { 9 } else { 6 });
                s.append(&self.nonce);
                s.append(&self.gas_price);
                s.append(&self.gas);
                self.append_to(s);
                s.append(&self.value);
                s.append(&self.data);
                if !signed {
                    // EIP-155 signing payload.
                    if let Some(chain_id) = chain_id {
                        s.append(&chain_id);
                        s.append(&0u8);
                        s.append(&0u8);
                    }
                    return;
                }
            }
            TxType::AccessList => {
                s.begin_list(if signed { 11 } else { 8 });
                s.append(&self.chain_id.unwrap_or_default());
                s.append(&self.nonce);
                s.append(&self.gas_price);
                s.append(&self.gas);
                self.append_to(s);
                s.append(&self.value);
                s.append(&self.data);
                s.append(&self.access_list);
                if !signed {
                    return;
                }
            }
            TxType::DynamicFee => {
                s.begin_list(if signed { 12 } else { 9 });
                s.append(&self.chain_id.unwrap_or_default());
                s.append(&self.nonce);
                s.append(&self.max_priority_fee_per_gas.unwrap_or_default());
                s.append(&self.max_fee_per_gas.unwrap_or(self.gas_price));
                s.append(&self.gas);
                self.append_to(s);
                s.append(&self.value);
                s.append(&self.data);
                s.append(&self.access_list);
                if !signed {
                    return;
                }
            }
        }

        s.append(&self.v);
        s.append(&self.r);
        s.append(&self.s);
    }

    fn append_to(&self, s: &mut RlpStream) {
        match &self.to {
            Some(address) => s.append(address),
            None => s.append_empty_data(),
        };
    }
}

/// Block body encoding: legacy transactions inline, typed ones as a byte
/// string holding their envelope.
impl Encodable for Transaction {
    fn rlp_append(&self, s: &mut RlpStream) {
        match self.tx_type {
            TxType::Legacy => self.rlp_fields(s, true),
            _ => {
                s.append(&self.envelope(true));
            }
        }
    }
}

fn ecrecover(hash: H256, signature: &[u8; 64], recovery_id: u8) -> SignatureResult<Address> {
    let message = libsecp256k1::Message::parse(hash.as_fixed_bytes());
    let signature =
        libsecp256k1::Signature::parse_standard(signature).map_err(SignatureError::Malformed)?;
    let recovery_id =
        libsecp256k1::RecoveryId::parse(recovery_id).map_err(SignatureError::Malformed)?;
    let public_key = libsecp256k1::recover(&message, &signature, &recovery_id)
        .map_err(SignatureError::Recovery)?;

    // Addresses come from the raw 64 byte key, without the 0x04 tag.
    let hash = keccak(&public_key.serialize()[1..]);
    Ok(Address::from_slice(&hash.as_bytes()[12..]))
}
