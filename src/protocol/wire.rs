//! Protobuf wire structures
//!
//! Every field is declared optional so that a missing required field can be
//! told apart from a default value; the domain types in this module's parent
//! enforce presence.

#[derive(Clone, PartialEq, prost::Message)]
pub struct OutputProto {
    #[prost(int64, optional, tag = "1")]
    pub amount: Option<i64>,
    #[prost(bytes = "vec", optional, tag = "2")]
    pub script: Option<Vec<u8>>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct PaymentDetailsProto {
    #[prost(string, optional, tag = "1")]
    pub network: Option<String>,
    #[prost(message, repeated, tag = "2")]
    pub outputs: Vec<OutputProto>,
    #[prost(uint64, optional, tag = "3")]
    pub time: Option<u64>,
    #[prost(uint64, optional, tag = "4")]
    pub expires: Option<u64>,
    #[prost(string, optional, tag = "5")]
    pub memo: Option<String>,
    #[prost(string, optional, tag = "6")]
    pub payment_url: Option<String>,
    #[prost(bytes = "vec", optional, tag = "7")]
    pub merchant_data: Option<Vec<u8>>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct PaymentRequestProto {
    #[prost(uint32, optional, tag = "1")]
    pub payment_details_version: Option<u32>,
    #[prost(bytes = "vec", optional, tag = "2")]
    pub serialized_payment_details: Option<Vec<u8>>,
    #[prost(string, optional, tag = "3")]
    pub pki_type: Option<String>,
    #[prost(bytes = "vec", optional, tag = "4")]
    pub pki_data: Option<Vec<u8>>,
    #[prost(bytes = "vec", optional, tag = "5")]
    pub signature: Option<Vec<u8>>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct PaymentProto {
    #[prost(bytes = "vec", optional, tag = "1")]
    pub merchant_data: Option<Vec<u8>>,
    #[prost(bytes = "vec", repeated, tag = "2")]
    pub transactions: Vec<Vec<u8>>,
    #[prost(message, repeated, tag = "3")]
    pub refund_to: Vec<OutputProto>,
    #[prost(string, optional, tag = "4")]
    pub memo: Option<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct PaymentAckProto {
    #[prost(message, optional, tag = "1")]
    pub payment: Option<PaymentProto>,
    #[prost(string, optional, tag = "2")]
    pub memo: Option<String>,
}

/// Payload of `pki_data` for the x509 PKI types: DER certificates, leaf first
#[derive(Clone, PartialEq, prost::Message)]
pub struct X509CertificatesProto {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub certificate: Vec<Vec<u8>>,
}

/// Longest valid protobuf varint
const MAX_VARINT_LEN: usize = 10;

enum Varint {
    Value(u64),
    EndOfBuffer,
    Overlong,
}

fn read_varint(buf: &mut &[u8]) -> Varint {
    let mut value = 0u64;
    for (i, byte) in buf.iter().enumerate().take(MAX_VARINT_LEN) {
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            *buf = &buf[i + 1..];
            return Varint::Value(value);
        }
    }
    if buf.len() < MAX_VARINT_LEN {
        Varint::EndOfBuffer
    } else {
        Varint::Overlong
    }
}

/// Whether a top-level field of `data` (its key, varint, fixed-width value or
/// length-delimited payload) runs past the end of the buffer.
///
/// Walks the field framing only; content errors are not looked at.
pub(crate) fn ends_early(data: &[u8]) -> bool {
    let mut rest = data;
    while !rest.is_empty() {
        let key = match read_varint(&mut rest) {
            Varint::Value(key) => key,
            Varint::EndOfBuffer => return true,
            Varint::Overlong => return false,
        };
        let len = match key & 0x7 {
            0 => match read_varint(&mut rest) {
                Varint::Value(_) => 0,
                Varint::EndOfBuffer => return true,
                Varint::Overlong => return false,
            },
            1 => 8,
            2 => match read_varint(&mut rest) {
                Varint::Value(len) => len,
                Varint::EndOfBuffer => return true,
                Varint::Overlong => return false,
            },
            5 => 4,
            // groups and unknown wire types
            _ => return false,
        };
        if len > rest.len() as u64 {
            return true;
        }
        rest = &rest[len as usize..];
    }
    false
}
