//! Funding and refund transactions
//!
//! A [`TransactionRecord`] is a plain value. Its identifying hash is computed
//! from the encoded bytes on demand and never cached on the record, so a
//! mutated record always hashes to its new contents.

pub mod codec;

pub use codec::{decode, encode, encode_varint, CodecError};

use crate::hashing::double_sha256;
use crate::params::NetworkContext;
use crate::script::{address_from_script, checked_total, Address, ScriptError};
use std::fmt;

/// Reference to a previous output plus the unlocking script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxInput {
    pub previous_tx_hash: [u8; 32],
    pub previous_output_index: u32,
    /// Empty when the input is unsigned
    pub script_sig: Vec<u8>,
}

impl TxInput {
    pub fn is_signed(&self) -> bool {
        !self.script_sig.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutput {
    /// Satoshis, never negative
    pub amount: i64,
    pub script_pubkey: Vec<u8>,
}

impl TxOutput {
    pub fn new(amount: i64, script_pubkey: Vec<u8>) -> Self {
        Self {
            amount,
            script_pubkey,
        }
    }

    /// Destination address, if the script is pay-to-address
    pub fn address(&self, network: &NetworkContext) -> Result<Address, ScriptError> {
        address_from_script(&self.script_pubkey, network)
    }

    /// Whether this output is spendable to `address`
    pub fn pays_to(&self, address: &Address, network: &NetworkContext) -> bool {
        self.address(network).map_or(false, |a| &a == address)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    pub version: i32,
    pub lock_time: u32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    /// Fee reported by the wallet that built the transaction. Not part of the
    /// wire form; decoded records carry `None`.
    pub fee: Option<i64>,
}

impl TransactionRecord {
    /// Empty version-1 transaction
    pub fn new() -> Self {
        Self {
            version: 1,
            lock_time: 0,
            inputs: Vec::new(),
            outputs: Vec::new(),
            fee: None,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        encode(self)
    }

    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        decode(data)
    }

    /// Double SHA256 of the encoded transaction
    pub fn hash(&self) -> TxHash {
        hash(self)
    }

    /// Sum of output amounts in satoshis, `None` on overflow
    pub fn total_output(&self) -> Option<i64> {
        checked_total(self.outputs.iter().map(|o| o.amount))
    }
}

impl Default for TransactionRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifying hash of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxHash(pub [u8; 32]);

impl TxHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Hex in natural byte order (the order the hash function produced)
impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Identifying hash: double SHA256 of [`encode`]
pub fn hash(tx: &TransactionRecord) -> TxHash {
    TxHash(double_sha256(&encode(tx)))
}
