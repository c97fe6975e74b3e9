//! Network parameters
//!
//! A [`NetworkContext`] is passed explicitly to every address, script and
//! message call that depends on which ledger network is in use. There is no
//! process-wide default.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ledger network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Main,
    Test,
    Regtest,
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Main => write!(f, "main"),
            Network::Test => write!(f, "test"),
            Network::Regtest => write!(f, "regtest"),
        }
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "main" | "mainnet" | "bitcoin" => Ok(Network::Main),
            "test" | "testnet" | "testnet3" => Ok(Network::Test),
            "regtest" => Ok(Network::Regtest),
            other => Err(format!("Unknown network: {}", other)),
        }
    }
}

/// Parameters for one network, threaded through codec and script calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetworkContext {
    network: Network,
    payment_protocol_id: &'static str,
    pubkey_hash_version: u8,
}

impl NetworkContext {
    pub fn new(network: Network) -> Self {
        match network {
            Network::Main => Self {
                network,
                payment_protocol_id: "main",
                pubkey_hash_version: 0x00,
            },
            Network::Test => Self {
                network,
                payment_protocol_id: "test",
                pubkey_hash_version: 0x6f,
            },
            Network::Regtest => Self {
                network,
                payment_protocol_id: "regtest",
                pubkey_hash_version: 0x6f,
            },
        }
    }

    pub fn mainnet() -> Self {
        Self::new(Network::Main)
    }

    pub fn testnet() -> Self {
        Self::new(Network::Test)
    }

    pub fn regtest() -> Self {
        Self::new(Network::Regtest)
    }

    /// Look up a network by the identifier carried in `PaymentDetails.network`
    pub fn from_payment_protocol_id(id: &str) -> Option<Self> {
        [Network::Main, Network::Test, Network::Regtest]
            .into_iter()
            .map(Self::new)
            .find(|ctx| ctx.payment_protocol_id == id)
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Identifier used in the `network` field of payment details
    pub fn payment_protocol_id(&self) -> &'static str {
        self.payment_protocol_id
    }

    /// Version byte prefixed to pay-to-address hashes in base58check form
    pub fn pubkey_hash_version(&self) -> u8 {
        self.pubkey_hash_version
    }
}

impl FromStr for NetworkContext {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<Network>().map(Self::new)
    }
}
