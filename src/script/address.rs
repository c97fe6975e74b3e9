//! Pay-to-address addresses and their base58check text form

use crate::hashing::hash160;
use crate::params::{Network, NetworkContext};
use std::fmt;

/// Length of the address hash (HASH160)
pub const ADDRESS_HASH_LEN: usize = 20;

/// Address parsing errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("Invalid base58 encoding: {0}")]
    InvalidBase58(String),

    #[error("Address checksum mismatch")]
    InvalidChecksum,

    #[error("Invalid address payload length: {0} bytes")]
    InvalidLength(usize),

    #[error("Address version 0x{found:02x} does not belong to network {network} (expected 0x{expected:02x})")]
    WrongNetwork {
        network: Network,
        expected: u8,
        found: u8,
    },
}

/// A pay-to-address destination: network, version byte and 20-byte hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    network: Network,
    version: u8,
    hash: [u8; ADDRESS_HASH_LEN],
}

impl Address {
    /// Address for `hash` on the given network
    pub fn new(network: &NetworkContext, hash: [u8; ADDRESS_HASH_LEN]) -> Self {
        Self {
            network: network.network(),
            version: network.pubkey_hash_version(),
            hash,
        }
    }

    /// Address paying to the holder of `public_key` (serialized SEC1 bytes)
    pub fn from_public_key(network: &NetworkContext, public_key: &[u8]) -> Self {
        Self::new(network, hash160(public_key))
    }

    /// Decode a base58check address, checking it belongs to `network`
    pub fn from_base58(text: &str, network: &NetworkContext) -> Result<Self, AddressError> {
        let payload = bs58::decode(text)
            .with_check(None)
            .into_vec()
            .map_err(|e| match e {
                bs58::decode::Error::InvalidChecksum { .. } => AddressError::InvalidChecksum,
                other => AddressError::InvalidBase58(other.to_string()),
            })?;

        if payload.len() != ADDRESS_HASH_LEN + 1 {
            return Err(AddressError::InvalidLength(payload.len()));
        }

        let version = payload[0];
        if version != network.pubkey_hash_version() {
            return Err(AddressError::WrongNetwork {
                network: network.network(),
                expected: network.pubkey_hash_version(),
                found: version,
            });
        }

        let mut hash = [0u8; ADDRESS_HASH_LEN];
        hash.copy_from_slice(&payload[1..]);
        Ok(Self {
            network: network.network(),
            version,
            hash,
        })
    }

    /// Base58check encoding of `version || hash`
    pub fn to_base58(&self) -> String {
        let mut payload = Vec::with_capacity(ADDRESS_HASH_LEN + 1);
        payload.push(self.version);
        payload.extend_from_slice(&self.hash);
        bs58::encode(payload).with_check().into_string()
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn hash(&self) -> &[u8; ADDRESS_HASH_LEN] {
        &self.hash
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_mainnet_address() {
        // Address of the compressed generator point public key
        let pubkey =
            hex::decode("0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798")
                .unwrap();
        let address = Address::from_public_key(&NetworkContext::mainnet(), &pubkey);
        assert_eq!(address.to_base58(), "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH");
    }

    #[test]
    fn test_testnet_prefix() {
        let address = Address::new(&NetworkContext::testnet(), [7u8; 20]);
        let text = address.to_base58();
        assert!(text.starts_with('m') || text.starts_with('n'));
        assert_eq!(
            Address::from_base58(&text, &NetworkContext::testnet()).unwrap(),
            address
        );
    }

    #[test]
    fn test_wrong_network_rejected() {
        let address = Address::new(&NetworkContext::mainnet(), [1u8; 20]);
        let err = Address::from_base58(&address.to_base58(), &NetworkContext::testnet())
            .unwrap_err();
        assert!(matches!(
            err,
            AddressError::WrongNetwork {
                expected: 0x6f,
                found: 0x00,
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_characters() {
        // '0' is not part of the base58 alphabet
        let err = Address::from_base58("10000000000", &NetworkContext::mainnet()).unwrap_err();
        assert!(matches!(err, AddressError::InvalidBase58(_)));
    }

    #[test]
    fn test_wrong_payload_length() {
        let text = bs58::encode([0x00u8, 1, 2, 3]).with_check().into_string();
        assert_eq!(
            Address::from_base58(&text, &NetworkContext::mainnet()).unwrap_err(),
            AddressError::InvalidLength(4)
        );
    }
}
