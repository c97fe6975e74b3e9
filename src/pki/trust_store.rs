//! Trust anchors

use std::path::Path;
use tracing::debug;
use x509_cert::der::Decode;
use x509_cert::Certificate;

/// Set of trusted root certificates
#[derive(Debug, Clone, Default)]
pub struct TrustStore {
    anchors: Vec<Certificate>,
}

impl TrustStore {
    /// Empty store: nothing verifies against it
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_certificates(anchors: Vec<Certificate>) -> Self {
        Self { anchors }
    }

    /// Load every certificate from concatenated PEM blocks
    pub fn from_pem(pem: &[u8]) -> Result<Self, x509_cert::der::Error> {
        Ok(Self::from_certificates(Certificate::load_pem_chain(pem)?))
    }

    pub fn from_der(certificates: &[Vec<u8>]) -> Result<Self, x509_cert::der::Error> {
        let anchors = certificates
            .iter()
            .map(|der| Certificate::from_der(der))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_certificates(anchors))
    }

    /// Load a PEM bundle from disk
    pub fn from_pem_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let pem = std::fs::read(path).map_err(|e| {
            anyhow::anyhow!("Failed to read trust store {}: {}", path.display(), e)
        })?;
        let store = Self::from_pem(&pem).map_err(|e| {
            anyhow::anyhow!("Failed to parse trust store {}: {}", path.display(), e)
        })?;
        debug!(
            "Loaded {} trust anchors from {}",
            store.len(),
            path.display()
        );
        Ok(store)
    }

    pub fn add(&mut self, anchor: Certificate) {
        self.anchors.push(anchor);
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Anchors whose subject matches `certificate`'s issuer
    pub fn issuers_of<'a>(
        &'a self,
        certificate: &'a Certificate,
    ) -> impl Iterator<Item = &'a Certificate> + 'a {
        self.anchors
            .iter()
            .filter(move |a| a.tbs_certificate.subject == certificate.tbs_certificate.issuer)
    }

    /// True if this exact certificate is an anchor
    pub fn contains(&self, certificate: &Certificate) -> bool {
        self.anchors.iter().any(|a| a == certificate)
    }
}
