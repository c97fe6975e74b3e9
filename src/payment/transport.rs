//! Transport seam between payer and payee
//!
//! HTTP (or any other carrier) is supplied by the embedding application. The
//! content types to use are the `MIMETYPE_*` constants in [`crate::protocol`].

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("Request to {url} failed: {reason}")]
    RequestFailed { url: String, reason: String },

    #[error("Payee at {url} rejected the payment: {reason}")]
    Rejected { url: String, reason: String },
}

/// Moves serialized protocol messages between payer and payee
pub trait PaymentTransport: Send + Sync {
    /// GET a serialized PaymentRequest
    fn fetch_payment_request(&self, url: &str) -> Result<Vec<u8>, TransportError>;

    /// POST a serialized Payment; returns the serialized PaymentACK
    fn send_payment(&self, url: &str, payment: &[u8]) -> Result<Vec<u8>, TransportError>;
}
