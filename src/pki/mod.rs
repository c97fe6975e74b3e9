//! PKI trust verification
//!
//! Signed payment requests carry an X.509 chain (leaf first) and an RSA
//! signature over the request's zero-signature encoding. Verification walks
//! the chain up to a certificate held in a [`TrustStore`], then checks the
//! request signature with the leaf key.

pub mod chain;
pub mod signer;
pub mod trust_store;
pub mod verifier;

pub use chain::{common_name, decode_chain, display_name, encode_chain};
pub use signer::{sign_payment_request, RequestSigner, SigningError};
pub use trust_store::TrustStore;
pub use verifier::verify_payment_request;

/// X.509 certificates, RSA PKCS#1 v1.5 signature over SHA-256
pub const PKI_TYPE_X509_SHA256: &str = "x509+sha256";

/// Why a payment request could not be tied to a trusted identity
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrustError {
    #[error("Payment request is not signed")]
    NotSigned,

    #[error("Malformed certificate chain: {0}")]
    MalformedChain(String),

    #[error("Certificate {subject} is outside its validity period ({not_before}..{not_after})")]
    ExpiredCertificate {
        subject: String,
        not_before: u64,
        not_after: u64,
    },

    #[error("Certificate chain ends at untrusted issuer {issuer}")]
    UntrustedRoot { issuer: String },

    #[error("Unsupported PKI type: {0}")]
    UnsupportedPkiType(String),

    #[error("Payment request signature does not verify")]
    SignatureMismatch,
}

/// Outcome of checking a payment request's signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustVerificationResult {
    Verified {
        /// Leaf certificate's common name (full subject when it has none)
        display_name: String,
        /// Name of the trust anchor the chain ends at
        root_authority_name: String,
    },
    Unverified { reason: TrustError },
}

impl TrustVerificationResult {
    pub fn is_verified(&self) -> bool {
        matches!(self, TrustVerificationResult::Verified { .. })
    }

    pub fn display_name(&self) -> Option<&str> {
        match self {
            TrustVerificationResult::Verified { display_name, .. } => Some(display_name),
            TrustVerificationResult::Unverified { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<&TrustError> {
        match self {
            TrustVerificationResult::Verified { .. } => None,
            TrustVerificationResult::Unverified { reason } => Some(reason),
        }
    }
}

impl From<Result<(String, String), TrustError>> for TrustVerificationResult {
    fn from(result: Result<(String, String), TrustError>) -> Self {
        match result {
            Ok((display_name, root_authority_name)) => TrustVerificationResult::Verified {
                display_name,
                root_authority_name,
            },
            Err(reason) => TrustVerificationResult::Unverified { reason },
        }
    }
}
