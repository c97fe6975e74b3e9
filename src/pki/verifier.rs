//! Payment request signature verification

use super::chain::{
    check_validity, decode_chain, display_name, rsa_public_key, verify_issued_by,
    verify_rsa_sha256,
};
use super::{TrustError, TrustStore, TrustVerificationResult, PKI_TYPE_X509_SHA256};
use crate::protocol::PaymentRequestMessage;
use tracing::debug;
use x509_cert::Certificate;

/// Verify a signed payment request against `trust_store` at time `now`
/// (epoch seconds).
///
/// Checks run in order and the first failure decides the result: the
/// request is signed, the PKI type is supported, the chain parses, every
/// certificate is within its validity window, each certificate is issued by
/// the next, the last one leads to a trust anchor, and finally the leaf key
/// verifies the request signature.
pub fn verify_payment_request(
    request: &PaymentRequestMessage,
    trust_store: &TrustStore,
    now: u64,
) -> TrustVerificationResult {
    let result: TrustVerificationResult = verify(request, trust_store, now).into();
    match &result {
        TrustVerificationResult::Verified {
            display_name,
            root_authority_name,
        } => debug!(
            "Payment request signed by {} (root {})",
            display_name, root_authority_name
        ),
        TrustVerificationResult::Unverified { reason } => {
            debug!("Payment request not verified: {}", reason)
        }
    }
    result
}

fn verify(
    request: &PaymentRequestMessage,
    trust_store: &TrustStore,
    now: u64,
) -> Result<(String, String), TrustError> {
    let pki = request.pki.as_ref().ok_or(TrustError::NotSigned)?;
    if pki.pki_type != PKI_TYPE_X509_SHA256 {
        return Err(TrustError::UnsupportedPkiType(pki.pki_type.clone()));
    }

    let chain = decode_chain(&pki.pki_data)?;
    for certificate in &chain {
        check_validity(certificate, now)?;
    }
    for link in chain.windows(2) {
        verify_issued_by(&link[0], &link[1])?;
    }

    let (leaf, last) = match (chain.first(), chain.last()) {
        (Some(leaf), Some(last)) => (leaf, last),
        _ => {
            return Err(TrustError::MalformedChain(
                "certificate chain is empty".to_string(),
            ))
        }
    };
    let anchor = find_anchor(last, trust_store, now)?;

    let message = request.signing_bytes(&pki.pki_type, &pki.pki_data);
    if !verify_rsa_sha256(&rsa_public_key(leaf)?, &message, &pki.signature) {
        return Err(TrustError::SignatureMismatch);
    }

    Ok((
        display_name(&leaf.tbs_certificate.subject),
        display_name(&anchor.tbs_certificate.subject),
    ))
}

/// The anchor that vouches for `last`: `last` itself when it is held in the
/// store, otherwise a stored certificate that issued it.
fn find_anchor<'a>(
    last: &'a Certificate,
    trust_store: &'a TrustStore,
    now: u64,
) -> Result<&'a Certificate, TrustError> {
    if trust_store.contains(last) {
        return Ok(last);
    }

    let untrusted = || TrustError::UntrustedRoot {
        issuer: last.tbs_certificate.issuer.to_string(),
    };
    let mut failure = None;
    for anchor in trust_store.issuers_of(last) {
        match check_validity(anchor, now).and_then(|_| verify_issued_by(last, anchor)) {
            Ok(()) => return Ok(anchor),
            Err(e @ TrustError::ExpiredCertificate { .. }) => failure = Some(e),
            // Same subject, different key
            Err(_) => failure = failure.or_else(|| Some(untrusted())),
        }
    }
    Err(failure.unwrap_or_else(untrusted))
}
