//! Payment request signing (payee side)

use super::chain::encode_chain;
use super::PKI_TYPE_X509_SHA256;
use crate::protocol::{PaymentRequestMessage, PkiSignature};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use sha2::Sha256;
use std::fmt;
use std::path::Path;
use x509_cert::der::Encode;
use x509_cert::Certificate;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SigningError {
    #[error("Signing certificate chain is empty")]
    EmptyChain,

    #[error("Invalid signing key: {0}")]
    InvalidKey(String),

    #[error("Invalid signing certificate: {0}")]
    InvalidCertificate(String),

    #[error("Signature failed: {0}")]
    Signature(String),
}

/// Signs payment requests with an RSA key and the matching certificate chain
pub struct RequestSigner {
    signing_key: SigningKey<Sha256>,
    /// DER certificates, leaf first
    chain: Vec<Vec<u8>>,
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner")
            .field("chain_len", &self.chain.len())
            .finish_non_exhaustive()
    }
}

impl RequestSigner {
    pub fn new(key: RsaPrivateKey, chain: Vec<Vec<u8>>) -> Result<Self, SigningError> {
        if chain.is_empty() {
            return Err(SigningError::EmptyChain);
        }
        Ok(Self {
            signing_key: SigningKey::<Sha256>::new(key),
            chain,
        })
    }

    /// Key in PKCS#8 or PKCS#1 PEM; chain as concatenated PEM certificates,
    /// leaf first
    pub fn from_pem(key_pem: &str, chain_pem: &[u8]) -> Result<Self, SigningError> {
        let key = RsaPrivateKey::from_pkcs8_pem(key_pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(key_pem))
            .map_err(|e| SigningError::InvalidKey(e.to_string()))?;
        let chain = Certificate::load_pem_chain(chain_pem)
            .map_err(|e| SigningError::InvalidCertificate(e.to_string()))?
            .iter()
            .map(|cert| cert.to_der())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| SigningError::InvalidCertificate(e.to_string()))?;
        Self::new(key, chain)
    }

    pub fn from_pem_files<P: AsRef<Path>, Q: AsRef<Path>>(
        key_path: P,
        chain_path: Q,
    ) -> anyhow::Result<Self> {
        let key_path = key_path.as_ref();
        let chain_path = chain_path.as_ref();
        let key_pem = std::fs::read_to_string(key_path).map_err(|e| {
            anyhow::anyhow!("Failed to read signing key {}: {}", key_path.display(), e)
        })?;
        let chain_pem = std::fs::read(chain_path).map_err(|e| {
            anyhow::anyhow!(
                "Failed to read certificate chain {}: {}",
                chain_path.display(),
                e
            )
        })?;
        Ok(Self::from_pem(&key_pem, &chain_pem)?)
    }

    /// Leaf-first DER chain placed in `pki_data`
    pub fn chain(&self) -> &[Vec<u8>] {
        &self.chain
    }

    /// Return a signed copy of `request` (any existing signature is replaced)
    pub fn sign(&self, request: &PaymentRequestMessage) -> Result<PaymentRequestMessage, SigningError> {
        let pki_data = encode_chain(&self.chain);
        let message = request.signing_bytes(PKI_TYPE_X509_SHA256, &pki_data);
        let signature = self
            .signing_key
            .try_sign(&message)
            .map_err(|e| SigningError::Signature(e.to_string()))?;

        Ok(PaymentRequestMessage {
            pki: Some(PkiSignature {
                pki_type: PKI_TYPE_X509_SHA256.to_string(),
                pki_data,
                signature: signature.to_vec(),
            }),
            ..request.clone()
        })
    }
}

/// Sign `request` with `key`; `chain` is the leaf-first DER certificate list
pub fn sign_payment_request(
    request: &PaymentRequestMessage,
    key: &RsaPrivateKey,
    chain: &[Vec<u8>],
) -> Result<PaymentRequestMessage, SigningError> {
    RequestSigner::new(key.clone(), chain.to_vec())?.sign(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_chain_rejected() {
        let mut rng = rand::thread_rng();
        let key = RsaPrivateKey::new(&mut rng, 1024).unwrap();
        assert_eq!(
            RequestSigner::new(key, vec![]).unwrap_err(),
            SigningError::EmptyChain
        );
    }

    #[test]
    fn test_bad_key_pem() {
        assert!(matches!(
            RequestSigner::from_pem("not a key", b""),
            Err(SigningError::InvalidKey(_))
        ));
    }
}
