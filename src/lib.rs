//! Payment Protocol - signed payment requests over a transaction ledger
//!
//! A payee publishes a (optionally X.509-signed) PaymentRequest describing
//! where funds should go; the payer answers with a Payment carrying funding
//! transactions and refund outputs; the payee acknowledges with a PaymentACK.
//!
//! ## Layers
//!
//! 1. `script`: pay-to-address scripts, base58check addresses, amounts
//! 2. `transaction`: binary transaction codec and identifying hash
//! 3. `protocol`: PaymentRequest / Payment / PaymentACK messages
//! 4. `pki`: certificate chain verification and request signing
//! 5. `payment`: payer ([`PaymentClient`]) and payee ([`PaymentProcessor`]) sessions
//!
//! Network parameters travel explicitly as a [`NetworkContext`].

#![allow(clippy::too_many_arguments)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod hashing;
pub mod params;
pub mod payment;
pub mod pki;
pub mod protocol;
pub mod script;
pub mod transaction;
pub mod utils;

pub use config::{LoggingConfig, PaymentConfig, SigningConfig};
pub use params::{Network, NetworkContext};
pub use payment::{PaymentClient, PaymentError, PaymentProcessor};
pub use pki::{TrustError, TrustStore, TrustVerificationResult};
pub use script::Address;
pub use transaction::{TransactionRecord, TxHash};
