//! Payment protocol messages
//!
//! PaymentDetails / PaymentRequest (payee → payer), Payment (payer → payee)
//! and PaymentACK (payee → payer). The wire form is protobuf: one tag per
//! logical field, unknown tags skipped, required fields checked on decode.

pub mod details;
pub mod payment;
pub mod wire;

pub use details::{
    build_payment_details, PaymentDetails, PaymentOutput, PaymentRequestMessage, PkiSignature,
    DEFAULT_PAYMENT_DETAILS_VERSION, PKI_TYPE_NONE,
};
pub use payment::{
    build_ack, build_payment, DecodedTransactions, PaymentAckMessage, PaymentMessage,
};

use crate::params::Network;

/// Content type of serialized PaymentRequest messages
pub const MIMETYPE_PAYMENTREQUEST: &str = "application/bitcoin-paymentrequest";
/// Content type of serialized Payment messages
pub const MIMETYPE_PAYMENT: &str = "application/bitcoin-payment";
/// Content type of serialized PaymentACK messages
pub const MIMETYPE_PAYMENTACK: &str = "application/bitcoin-paymentack";

/// Message codec errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MessageError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Payment details contain no outputs")]
    NoOutputs,

    #[error("Message truncated: {0}")]
    Truncated(String),

    #[error("Malformed message: {0}")]
    Malformed(String),

    #[error("Payment request carries a partial signature (pki_type, pki_data and signature must all be present or all absent)")]
    PartialSignature,

    #[error("Invalid output amount: {0}")]
    InvalidAmount(i64),

    #[error("Output amounts overflow when summed")]
    AmountOverflow,

    #[error("Invalid expiry: expires {expires} is not after time {time}")]
    InvalidExpiry { time: u64, expires: u64 },

    #[error("Payment request is for network {found}, expected {expected}")]
    WrongNetwork { expected: Network, found: String },
}

/// Decode a wire message. Failures are `Truncated` when a field's framing
/// runs past the end of `data`, `Malformed` otherwise.
pub(crate) fn decode_proto<M>(data: &[u8]) -> Result<M, MessageError>
where
    M: prost::Message + Default,
{
    M::decode(data).map_err(|err| {
        if wire::ends_early(data) {
            MessageError::Truncated(err.to_string())
        } else {
            MessageError::Malformed(err.to_string())
        }
    })
}
