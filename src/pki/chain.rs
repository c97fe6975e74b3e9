//! Certificate chain parsing and link checks

use super::TrustError;
use crate::protocol::wire::X509CertificatesProto;
use prost::Message;
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::signature::Verifier;
use rsa::RsaPublicKey;
use sha2::Sha256;
use x509_cert::der::asn1::ObjectIdentifier;
use x509_cert::der::{Decode, Encode};
use x509_cert::name::Name;
use x509_cert::Certificate;

/// sha256WithRSAEncryption
const SHA256_WITH_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.11");

/// id-at-commonName
const COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");

/// Serialize DER certificates (leaf first) as `pki_data`
pub fn encode_chain(certificates: &[Vec<u8>]) -> Vec<u8> {
    X509CertificatesProto {
        certificate: certificates.to_vec(),
    }
    .encode_to_vec()
}

/// Parse `pki_data` into certificates, leaf first
pub fn decode_chain(pki_data: &[u8]) -> Result<Vec<Certificate>, TrustError> {
    let certificates = X509CertificatesProto::decode(pki_data)
        .map_err(|e| TrustError::MalformedChain(format!("pki_data: {}", e)))?;
    if certificates.certificate.is_empty() {
        return Err(TrustError::MalformedChain(
            "certificate chain is empty".to_string(),
        ));
    }

    certificates
        .certificate
        .iter()
        .enumerate()
        .map(|(index, der)| {
            Certificate::from_der(der)
                .map_err(|e| TrustError::MalformedChain(format!("certificate {}: {}", index, e)))
        })
        .collect()
}

/// Check `now` (epoch seconds) lies inside the certificate's validity window
pub fn check_validity(certificate: &Certificate, now: u64) -> Result<(), TrustError> {
    let validity = &certificate.tbs_certificate.validity;
    let not_before = validity.not_before.to_unix_duration().as_secs();
    let not_after = validity.not_after.to_unix_duration().as_secs();
    if now < not_before || now > not_after {
        return Err(TrustError::ExpiredCertificate {
            subject: certificate.tbs_certificate.subject.to_string(),
            not_before,
            not_after,
        });
    }
    Ok(())
}

/// RSA public key of the certificate subject
pub fn rsa_public_key(certificate: &Certificate) -> Result<RsaPublicKey, TrustError> {
    let spki_der = certificate
        .tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(|e| TrustError::MalformedChain(format!("public key encoding: {}", e)))?;
    RsaPublicKey::from_public_key_der(&spki_der).map_err(|e| {
        TrustError::MalformedChain(format!(
            "{} does not carry an RSA key: {}",
            certificate.tbs_certificate.subject, e
        ))
    })
}

/// RSA PKCS#1 v1.5 / SHA-256 signature check
pub fn verify_rsa_sha256(key: &RsaPublicKey, message: &[u8], signature: &[u8]) -> bool {
    let verifying_key = VerifyingKey::<Sha256>::new(key.clone());
    Signature::try_from(signature)
        .map(|sig| verifying_key.verify(message, &sig).is_ok())
        .unwrap_or(false)
}

/// Check that `certificate` names `issuer` as its issuer and carries a valid
/// signature from it
pub fn verify_issued_by(certificate: &Certificate, issuer: &Certificate) -> Result<(), TrustError> {
    let tbs = &certificate.tbs_certificate;
    if tbs.issuer != issuer.tbs_certificate.subject {
        return Err(TrustError::MalformedChain(format!(
            "{} is issued by {}, not by {}",
            tbs.subject, tbs.issuer, issuer.tbs_certificate.subject
        )));
    }

    if certificate.signature_algorithm.oid != SHA256_WITH_RSA_ENCRYPTION {
        return Err(TrustError::MalformedChain(format!(
            "{} uses unsupported signature algorithm {}",
            tbs.subject, certificate.signature_algorithm.oid
        )));
    }

    let tbs_der = tbs
        .to_der()
        .map_err(|e| TrustError::MalformedChain(format!("certificate encoding: {}", e)))?;
    let signature = certificate.signature.as_bytes().ok_or_else(|| {
        TrustError::MalformedChain(format!("{} has a malformed signature", tbs.subject))
    })?;

    if !verify_rsa_sha256(&rsa_public_key(issuer)?, &tbs_der, signature) {
        return Err(TrustError::MalformedChain(format!(
            "signature on {} does not verify under {}",
            tbs.subject, issuer.tbs_certificate.subject
        )));
    }
    Ok(())
}

/// First common name (CN) attribute of a distinguished name
pub fn common_name(name: &Name) -> Option<String> {
    name.0
        .iter()
        .flat_map(|rdn| rdn.0.iter())
        .find(|attr| attr.oid == COMMON_NAME)
        .and_then(|attr| std::str::from_utf8(attr.value.value()).ok())
        .map(str::to_string)
}

/// Human-readable name: the CN when there is one, else the full RFC 4514 form
pub fn display_name(name: &Name) -> String {
    common_name(name).unwrap_or_else(|| name.to_string())
}
