//! Payment sessions
//!
//! Payer side ([`PaymentClient`]): fetch and inspect a payment request, pay
//! it, read the acknowledgement. Payee side ([`PaymentProcessor`]): issue
//! requests for a wallet and accept payments against it.

pub mod client;
pub mod processor;
pub mod transport;
pub mod wallet;

pub use client::{AckSummary, PaymentClient, PaymentSession};
pub use processor::{PaymentProcessor, ProcessedPayment};
pub use transport::{PaymentTransport, TransportError};
pub use wallet::{
    BroadcastCompleter, BroadcastHandle, BroadcastOutcome, Wallet, WalletError, WalletId,
    WalletRepository,
};

use crate::pki::SigningError;
use crate::protocol::MessageError;
use crate::script::{AddressError, AmountError, ScriptError};

/// Payment session errors
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Message error: {0}")]
    Message(#[from] MessageError),

    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Signing error: {0}")]
    Signing(#[from] SigningError),

    #[error("Amount error: {0}")]
    Amount(#[from] AmountError),

    #[error("Address error: {0}")]
    Address(#[from] AddressError),

    #[error("Script error: {0}")]
    Script(#[from] ScriptError),

    #[error("Payment request has no payment URL")]
    MissingPaymentUrl,
}
