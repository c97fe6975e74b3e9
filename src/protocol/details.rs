//! PaymentDetails and the PaymentRequest envelope

use super::wire::{OutputProto, PaymentDetailsProto, PaymentRequestProto};
use super::{decode_proto, MessageError};
use crate::params::NetworkContext;
use crate::script::{address_from_script, checked_total, Address, ScriptError};
use prost::Message;

/// Version written into new payment requests
pub const DEFAULT_PAYMENT_DETAILS_VERSION: u32 = 1;

/// PKI type of an unsigned request, when the field is present at all
pub const PKI_TYPE_NONE: &str = "none";

/// Network assumed when `PaymentDetails.network` is absent
const DEFAULT_NETWORK_ID: &str = "main";

/// A requested (or refund) output: amount in satoshis and output script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentOutput {
    pub amount: i64,
    pub script: Vec<u8>,
}

impl PaymentOutput {
    pub fn new(amount: i64, script: Vec<u8>) -> Self {
        Self { amount, script }
    }

    pub(crate) fn to_proto(&self) -> OutputProto {
        OutputProto {
            amount: Some(self.amount),
            script: Some(self.script.clone()),
        }
    }

    pub(crate) fn from_proto(proto: OutputProto) -> Result<Self, MessageError> {
        let script = proto.script.ok_or(MessageError::MissingField("output.script"))?;
        let amount = proto.amount.unwrap_or(0);
        if amount < 0 {
            return Err(MessageError::InvalidAmount(amount));
        }
        Ok(Self { amount, script })
    }
}

/// What the payee asks to be paid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentDetails {
    /// Payment-protocol network identifier ("main", "test", "regtest")
    pub network: String,
    pub outputs: Vec<PaymentOutput>,
    /// Creation time, epoch seconds
    pub time: u64,
    /// Expiry, epoch seconds; after `time` when present
    pub expires: Option<u64>,
    pub memo: Option<String>,
    pub payment_url: Option<String>,
    pub merchant_data: Option<Vec<u8>>,
}

/// Build payment details expiring `expires_in` seconds after `now`
pub fn build_payment_details(
    network: &NetworkContext,
    outputs: Vec<PaymentOutput>,
    memo: Option<String>,
    expires_in: u64,
    payment_url: Option<String>,
    merchant_data: Option<Vec<u8>>,
    now: u64,
) -> Result<PaymentDetails, MessageError> {
    if outputs.is_empty() {
        return Err(MessageError::NoOutputs);
    }
    if let Some(output) = outputs.iter().find(|o| o.amount < 0) {
        return Err(MessageError::InvalidAmount(output.amount));
    }
    if checked_total(outputs.iter().map(|o| o.amount)).is_none() {
        return Err(MessageError::AmountOverflow);
    }
    let expires = now.saturating_add(expires_in);
    if expires <= now {
        return Err(MessageError::InvalidExpiry { time: now, expires });
    }

    Ok(PaymentDetails {
        network: network.payment_protocol_id().to_string(),
        outputs,
        time: now,
        expires: Some(expires),
        memo,
        payment_url,
        merchant_data,
    })
}

impl PaymentDetails {
    pub fn encode(&self) -> Vec<u8> {
        PaymentDetailsProto {
            network: Some(self.network.clone()),
            outputs: self.outputs.iter().map(PaymentOutput::to_proto).collect(),
            time: Some(self.time),
            expires: self.expires,
            memo: self.memo.clone(),
            payment_url: self.payment_url.clone(),
            merchant_data: self.merchant_data.clone(),
        }
        .encode_to_vec()
    }

    pub fn decode(data: &[u8]) -> Result<Self, MessageError> {
        let proto: PaymentDetailsProto = decode_proto(data)?;

        let time = proto.time.ok_or(MessageError::MissingField("time"))?;
        if proto.outputs.is_empty() {
            return Err(MessageError::NoOutputs);
        }
        let outputs = proto
            .outputs
            .into_iter()
            .map(PaymentOutput::from_proto)
            .collect::<Result<Vec<_>, _>>()?;
        if checked_total(outputs.iter().map(|o| o.amount)).is_none() {
            return Err(MessageError::AmountOverflow);
        }
        if let Some(expires) = proto.expires {
            if expires <= time {
                return Err(MessageError::InvalidExpiry { time, expires });
            }
        }

        Ok(Self {
            network: proto
                .network
                .unwrap_or_else(|| DEFAULT_NETWORK_ID.to_string()),
            outputs,
            time,
            expires: proto.expires,
            memo: proto.memo,
            payment_url: proto.payment_url,
            merchant_data: proto.merchant_data,
        })
    }

    /// True once `now` is past `expires`; requests without expiry never expire
    pub fn is_expired_at(&self, now: u64) -> bool {
        self.expires.map_or(false, |expires| now > expires)
    }

    /// Sum of requested amounts in satoshis.
    ///
    /// Always `Some` for decoded or built details; `None` only when the
    /// fields were assembled by hand with amounts that overflow.
    pub fn total_amount(&self) -> Option<i64> {
        checked_total(self.outputs.iter().map(|o| o.amount))
    }

    /// Requested outputs as (address, amount) pairs
    pub fn output_addresses(
        &self,
        network: &NetworkContext,
    ) -> Result<Vec<(Address, i64)>, ScriptError> {
        self.outputs
            .iter()
            .map(|o| address_from_script(&o.script, network).map(|a| (a, o.amount)))
            .collect()
    }

    /// Check the details were issued for `network`
    pub fn check_network(&self, network: &NetworkContext) -> Result<(), MessageError> {
        if self.network == network.payment_protocol_id() {
            Ok(())
        } else {
            Err(MessageError::WrongNetwork {
                expected: network.network(),
                found: self.network.clone(),
            })
        }
    }

    /// Merchant data as text, when it is valid UTF-8
    pub fn merchant_data_utf8(&self) -> Option<&str> {
        self.merchant_data
            .as_deref()
            .and_then(|data| std::str::from_utf8(data).ok())
    }
}

/// The signature triple of a signed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkiSignature {
    pub pki_type: String,
    /// Serialized `X509Certificates` for the x509 PKI types
    pub pki_data: Vec<u8>,
    pub signature: Vec<u8>,
}

/// PaymentRequest envelope: serialized details plus an optional signature.
///
/// A partial signature triple is unrepresentable; decoding one fails with
/// [`MessageError::PartialSignature`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequestMessage {
    /// Kept as received so that re-encoding reproduces the signed bytes
    pub payment_details_version: Option<u32>,
    pub serialized_payment_details: Vec<u8>,
    pub pki: Option<PkiSignature>,
}

impl PaymentRequestMessage {
    /// Unsigned request wrapping `details`
    pub fn new(details: &PaymentDetails) -> Self {
        Self {
            payment_details_version: Some(DEFAULT_PAYMENT_DETAILS_VERSION),
            serialized_payment_details: details.encode(),
            pki: None,
        }
    }

    pub fn is_signed(&self) -> bool {
        self.pki.is_some()
    }

    pub fn details_version(&self) -> u32 {
        self.payment_details_version
            .unwrap_or(DEFAULT_PAYMENT_DETAILS_VERSION)
    }

    /// Decode the embedded payment details
    pub fn payment_details(&self) -> Result<PaymentDetails, MessageError> {
        PaymentDetails::decode(&self.serialized_payment_details)
    }

    pub fn encode(&self) -> Vec<u8> {
        self.to_proto(self.pki.as_ref().map(|p| p.signature.clone()))
            .encode_to_vec()
    }

    /// Canonical zero-signature encoding: the request with its signature
    /// field present but empty. Input to both signing and verification.
    pub fn signing_bytes(&self, pki_type: &str, pki_data: &[u8]) -> Vec<u8> {
        PaymentRequestProto {
            payment_details_version: self.payment_details_version,
            serialized_payment_details: Some(self.serialized_payment_details.clone()),
            pki_type: Some(pki_type.to_string()),
            pki_data: Some(pki_data.to_vec()),
            signature: Some(Vec::new()),
        }
        .encode_to_vec()
    }

    pub fn decode(data: &[u8]) -> Result<Self, MessageError> {
        let proto: PaymentRequestProto = decode_proto(data)?;

        let serialized_payment_details = proto
            .serialized_payment_details
            .ok_or(MessageError::MissingField("serialized_payment_details"))?;

        let pki = match (proto.pki_type, proto.pki_data, proto.signature) {
            (Some(pki_type), Some(pki_data), Some(signature)) => Some(PkiSignature {
                pki_type,
                pki_data,
                signature,
            }),
            (None, None, None) => None,
            // An explicit "none" type with nothing else is still unsigned
            (Some(pki_type), None, None) if pki_type == PKI_TYPE_NONE => None,
            _ => return Err(MessageError::PartialSignature),
        };

        Ok(Self {
            payment_details_version: proto.payment_details_version,
            serialized_payment_details,
            pki,
        })
    }

    fn to_proto(&self, signature: Option<Vec<u8>>) -> PaymentRequestProto {
        PaymentRequestProto {
            payment_details_version: self.payment_details_version,
            serialized_payment_details: Some(self.serialized_payment_details.clone()),
            pki_type: self.pki.as_ref().map(|p| p.pki_type.clone()),
            pki_data: self.pki.as_ref().map(|p| p.pki_data.clone()),
            signature,
        }
    }
}
