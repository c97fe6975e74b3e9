//! Shared test fixtures: RSA keys, certificate chains, an in-memory wallet
//! and a loopback transport wired to a payment processor.

#![allow(dead_code)]

use blvm_payment_protocol::params::NetworkContext;
use blvm_payment_protocol::payment::{
    BroadcastCompleter, BroadcastHandle, PaymentProcessor, PaymentTransport, TransportError,
    Wallet, WalletError, WalletId,
};
use blvm_payment_protocol::pki::{RequestSigner, TrustStore};
use blvm_payment_protocol::protocol::PaymentDetails;
use blvm_payment_protocol::script::Address;
use blvm_payment_protocol::transaction::{TransactionRecord, TxInput, TxOutput};
use rsa::pkcs1v15::{Signature, SigningKey};
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::RsaPrivateKey;
use sha2::Sha256;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use uuid::Uuid;
use x509_cert::builder::{Builder, CertificateBuilder, Profile};
use x509_cert::der::asn1::UtcTime;
use x509_cert::der::{Encode, EncodePem};
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::SubjectPublicKeyInfoOwned;
use x509_cert::time::{Time, Validity};
use x509_cert::Certificate;

/// Inside every fixture certificate's validity window
pub const NOW: u64 = 1_700_000_000;
pub const NOT_BEFORE: u64 = 1_600_000_000;
pub const NOT_AFTER: u64 = 2_400_000_000;

pub const ROOT_SUBJECT: &str = "CN=Test Root CA,O=Payment Test";
pub const INTERMEDIATE_SUBJECT: &str = "CN=Test Intermediate CA,O=Payment Test";
pub const LEAF_SUBJECT: &str = "CN=Example Merchant,O=Example Ltd";

pub struct TestPki {
    pub root: Certificate,
    pub intermediate: Certificate,
    pub leaf: Certificate,
    pub root_key: RsaPrivateKey,
    pub intermediate_key: RsaPrivateKey,
    pub leaf_key: RsaPrivateKey,
}

impl TestPki {
    /// Leaf-first DER chain, root excluded
    pub fn chain(&self) -> Vec<Vec<u8>> {
        vec![der(&self.leaf), der(&self.intermediate)]
    }

    pub fn trust_store(&self) -> TrustStore {
        TrustStore::from_certificates(vec![self.root.clone()])
    }

    pub fn signer(&self) -> RequestSigner {
        RequestSigner::new(self.leaf_key.clone(), self.chain()).expect("Failed to create signer")
    }

    pub fn leaf_key_pem(&self) -> String {
        self.leaf_key
            .to_pkcs8_pem(LineEnding::LF)
            .expect("Failed to encode key")
            .to_string()
    }

    pub fn chain_pem(&self) -> String {
        [&self.leaf, &self.intermediate]
            .iter()
            .map(|cert| pem(cert))
            .collect()
    }

    pub fn root_pem(&self) -> String {
        pem(&self.root)
    }
}

fn generate_key() -> RsaPrivateKey {
    let mut rng = rand::thread_rng();
    RsaPrivateKey::new(&mut rng, 2048).expect("Failed to generate RSA key")
}

fn keys() -> &'static [RsaPrivateKey; 4] {
    static KEYS: OnceLock<[RsaPrivateKey; 4]> = OnceLock::new();
    KEYS.get_or_init(|| [generate_key(), generate_key(), generate_key(), generate_key()])
}

/// A spare key that belongs to no fixture certificate
pub fn stranger_key() -> &'static RsaPrivateKey {
    &keys()[3]
}

pub fn validity(not_before: u64, not_after: u64) -> Validity {
    let time = |secs| {
        Time::UtcTime(
            UtcTime::from_unix_duration(Duration::from_secs(secs)).expect("Invalid UTC time"),
        )
    };
    Validity {
        not_before: time(not_before),
        not_after: time(not_after),
    }
}

pub fn name(text: &str) -> Name {
    Name::from_str(text).expect("Invalid name")
}

/// Issue a certificate for `subject_key`, signed with `issuer_key`
pub fn issue(
    profile: Profile,
    serial: u32,
    validity: Validity,
    subject: &str,
    subject_key: &RsaPrivateKey,
    issuer_key: &RsaPrivateKey,
) -> Certificate {
    let spki = SubjectPublicKeyInfoOwned::from_key(subject_key.to_public_key())
        .expect("Failed to encode public key");
    let signer = SigningKey::<Sha256>::new(issuer_key.clone());
    let builder = CertificateBuilder::new(
        profile,
        SerialNumber::from(serial),
        validity,
        name(subject),
        spki,
        &signer,
    )
    .expect("Failed to create certificate builder");
    builder
        .build::<Signature>()
        .expect("Failed to build certificate")
}

pub fn root_certificate(subject: &str, key: &RsaPrivateKey) -> Certificate {
    issue(
        Profile::Root,
        1,
        validity(NOT_BEFORE, NOT_AFTER),
        subject,
        key,
        key,
    )
}

pub fn intermediate_certificate(
    issuer: &str,
    issuer_key: &RsaPrivateKey,
    key: &RsaPrivateKey,
) -> Certificate {
    issue(
        Profile::SubCA {
            issuer: name(issuer),
            path_len_constraint: Some(0),
        },
        2,
        validity(NOT_BEFORE, NOT_AFTER),
        INTERMEDIATE_SUBJECT,
        key,
        issuer_key,
    )
}

pub fn leaf_certificate(
    subject: &str,
    validity: Validity,
    issuer: &str,
    issuer_key: &RsaPrivateKey,
    key: &RsaPrivateKey,
) -> Certificate {
    issue(
        Profile::Leaf {
            issuer: name(issuer),
            enable_key_agreement: false,
            enable_key_encipherment: false,
        },
        3,
        validity,
        subject,
        key,
        issuer_key,
    )
}

/// Root → intermediate → leaf, all valid around [`NOW`]
pub fn test_pki() -> &'static TestPki {
    static PKI: OnceLock<TestPki> = OnceLock::new();
    PKI.get_or_init(|| {
        let [root_key, intermediate_key, leaf_key, _] = keys().clone();
        let root = root_certificate(ROOT_SUBJECT, &root_key);
        let intermediate = intermediate_certificate(ROOT_SUBJECT, &root_key, &intermediate_key);
        let leaf = leaf_certificate(
            LEAF_SUBJECT,
            validity(NOT_BEFORE, NOT_AFTER),
            INTERMEDIATE_SUBJECT,
            &intermediate_key,
            &leaf_key,
        );
        TestPki {
            root,
            intermediate,
            leaf,
            root_key,
            intermediate_key,
            leaf_key,
        }
    })
}

pub fn der(cert: &Certificate) -> Vec<u8> {
    cert.to_der().expect("Failed to encode certificate")
}

pub fn pem(cert: &Certificate) -> String {
    cert.to_pem(x509_cert::der::pem::LineEnding::LF)
        .expect("Failed to encode certificate")
}

/// In-memory wallet handing out distinct testnet addresses
pub struct MockWallet {
    id: WalletId,
    network: NetworkContext,
    next_address: AtomicU8,
    auto_complete: bool,
    pub issued: Mutex<Vec<Address>>,
    pub broadcasts: Mutex<Vec<TransactionRecord>>,
    pending: Mutex<Vec<BroadcastCompleter>>,
}

impl MockWallet {
    pub fn new(network: NetworkContext) -> Self {
        Self {
            id: Uuid::new_v4(),
            network,
            next_address: AtomicU8::new(1),
            auto_complete: true,
            issued: Mutex::new(Vec::new()),
            broadcasts: Mutex::new(Vec::new()),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Broadcasts stay pending until [`complete_pending`](Self::complete_pending)
    pub fn deferred(network: NetworkContext) -> Self {
        Self {
            auto_complete: false,
            ..Self::new(network)
        }
    }

    pub fn complete_pending(&self) -> usize {
        let pending: Vec<_> = self.pending.lock().unwrap().drain(..).collect();
        let count = pending.len();
        for completer in pending {
            completer.complete();
        }
        count
    }
}

impl Wallet for MockWallet {
    fn id(&self) -> WalletId {
        self.id
    }

    fn fresh_receive_address(&self) -> Result<Address, WalletError> {
        let n = self.next_address.fetch_add(1, Ordering::SeqCst);
        let address = Address::new(&self.network, [n; 20]);
        self.issued.lock().unwrap().push(address);
        Ok(address)
    }

    fn broadcast(&self, tx: TransactionRecord) -> Result<BroadcastHandle, WalletError> {
        let hash = tx.hash();
        self.broadcasts.lock().unwrap().push(tx);
        if self.auto_complete {
            Ok(BroadcastHandle::completed(hash))
        } else {
            let (handle, completer) = BroadcastHandle::new(hash);
            self.pending.lock().unwrap().push(completer);
            Ok(handle)
        }
    }
}

/// Transport that hands requests straight to a local processor; the wallet
/// id is the last URL path segment
pub struct LoopbackTransport {
    processor: Arc<PaymentProcessor>,
}

impl LoopbackTransport {
    pub fn new(processor: Arc<PaymentProcessor>) -> Self {
        Self { processor }
    }

    fn wallet_id(url: &str) -> Result<WalletId, TransportError> {
        url.rsplit('/')
            .next()
            .and_then(|segment| Uuid::parse_str(segment).ok())
            .ok_or_else(|| TransportError::RequestFailed {
                url: url.to_string(),
                reason: "no wallet id in URL".to_string(),
            })
    }
}

impl PaymentTransport for LoopbackTransport {
    fn fetch_payment_request(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        let wallet_id = Self::wallet_id(url)?;
        self.processor
            .create_payment_request(&wallet_id, None)
            .map(|request| request.encode())
            .map_err(|e| TransportError::RequestFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }

    fn send_payment(&self, url: &str, payment: &[u8]) -> Result<Vec<u8>, TransportError> {
        let wallet_id = Self::wallet_id(url)?;
        self.processor
            .process_payment(payment, &wallet_id)
            .map(|processed| processed.ack.encode())
            .map_err(|e| TransportError::Rejected {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }
}

/// A signed-looking transaction paying every output of `details`
pub fn funding_transaction(details: &PaymentDetails) -> TransactionRecord {
    let mut tx = TransactionRecord::new();
    tx.inputs.push(TxInput {
        previous_tx_hash: [0x11; 32],
        previous_output_index: 0,
        script_sig: vec![0x47, 0x30, 0x44],
    });
    tx.outputs.extend(
        details
            .outputs
            .iter()
            .map(|output| TxOutput::new(output.amount, output.script.clone())),
    );
    tx
}
