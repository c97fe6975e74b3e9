//! Payment and PaymentACK messages

use super::details::PaymentOutput;
use super::wire::{PaymentAckProto, PaymentProto};
use super::{decode_proto, MessageError};
use crate::script::checked_total;
use crate::transaction::{CodecError, TransactionRecord};
use prost::Message;
use tracing::warn;

/// Payer → payee: funding transactions plus where to send refunds
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PaymentMessage {
    /// Copied from the request's payment details
    pub merchant_data: Option<Vec<u8>>,
    /// Serialized transactions, each in the transaction wire form
    pub transactions: Vec<Vec<u8>>,
    pub refund_to: Vec<PaymentOutput>,
    pub memo: Option<String>,
}

/// Result of decoding the transactions embedded in a payment
#[derive(Debug, Clone, Default)]
pub struct DecodedTransactions {
    pub transactions: Vec<TransactionRecord>,
    /// Position and cause of every entry that failed to decode
    pub skipped: Vec<(usize, CodecError)>,
}

/// Build a payment from already-built funding transactions
pub fn build_payment(
    transactions: &[TransactionRecord],
    refund_outputs: Vec<PaymentOutput>,
    memo: Option<String>,
    merchant_data: Option<Vec<u8>>,
) -> PaymentMessage {
    PaymentMessage {
        merchant_data,
        transactions: transactions.iter().map(TransactionRecord::encode).collect(),
        refund_to: refund_outputs,
        memo,
    }
}

impl PaymentMessage {
    pub fn encode(&self) -> Vec<u8> {
        self.to_proto().encode_to_vec()
    }

    pub fn decode(data: &[u8]) -> Result<Self, MessageError> {
        Self::from_proto(decode_proto::<PaymentProto>(data)?)
    }

    /// Decode every embedded transaction.
    ///
    /// A transaction that fails to decode is skipped and logged; it never
    /// causes the whole payment to be rejected.
    pub fn decode_transactions(&self) -> DecodedTransactions {
        let mut decoded = DecodedTransactions::default();
        for (index, raw) in self.transactions.iter().enumerate() {
            match TransactionRecord::decode(raw) {
                Ok(tx) => decoded.transactions.push(tx),
                Err(e) => {
                    warn!(
                        "Skipping undecodable transaction {} of payment ({} bytes): {}",
                        index,
                        raw.len(),
                        e
                    );
                    decoded.skipped.push((index, e));
                }
            }
        }
        decoded
    }

    /// Sum of refund amounts in satoshis, `None` on overflow
    pub fn refund_total(&self) -> Option<i64> {
        checked_total(self.refund_to.iter().map(|o| o.amount))
    }

    pub(crate) fn to_proto(&self) -> PaymentProto {
        PaymentProto {
            merchant_data: self.merchant_data.clone(),
            transactions: self.transactions.clone(),
            refund_to: self.refund_to.iter().map(PaymentOutput::to_proto).collect(),
            memo: self.memo.clone(),
        }
    }

    pub(crate) fn from_proto(proto: PaymentProto) -> Result<Self, MessageError> {
        Ok(Self {
            merchant_data: proto.merchant_data,
            transactions: proto.transactions,
            refund_to: proto
                .refund_to
                .into_iter()
                .map(PaymentOutput::from_proto)
                .collect::<Result<Vec<_>, _>>()?,
            memo: proto.memo,
        })
    }
}

/// Payee → payer: acknowledgement echoing the received payment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentAckMessage {
    pub payment: PaymentMessage,
    pub memo: Option<String>,
}

/// Acknowledge `payment`
pub fn build_ack(payment: PaymentMessage, memo: Option<String>) -> PaymentAckMessage {
    PaymentAckMessage { payment, memo }
}

impl PaymentAckMessage {
    pub fn encode(&self) -> Vec<u8> {
        PaymentAckProto {
            payment: Some(self.payment.to_proto()),
            memo: self.memo.clone(),
        }
        .encode_to_vec()
    }

    pub fn decode(data: &[u8]) -> Result<Self, MessageError> {
        let proto: PaymentAckProto = decode_proto(data)?;
        let payment = proto
            .payment
            .ok_or(MessageError::MissingField("payment"))?;
        Ok(Self {
            payment: PaymentMessage::from_proto(payment)?,
            memo: proto.memo,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::TxOutput;

    fn sample_tx() -> TransactionRecord {
        let mut tx = TransactionRecord::new();
        tx.outputs.push(TxOutput::new(1_000, vec![0x51]));
        tx
    }

    #[test]
    fn test_build_payment_encodes_transactions() {
        let tx = sample_tx();
        let payment = build_payment(
            std::slice::from_ref(&tx),
            vec![PaymentOutput::new(500, vec![0x52])],
            Some("thanks".to_string()),
            Some(b"order-1".to_vec()),
        );
        assert_eq!(payment.transactions, vec![tx.encode()]);
        assert_eq!(payment.refund_total(), Some(500));
    }

    #[test]
    fn test_payment_round_trip() {
        let payment = build_payment(
            &[sample_tx()],
            vec![PaymentOutput::new(500, vec![0x52])],
            None,
            Some(vec![0xff, 0x00]),
        );
        assert_eq!(PaymentMessage::decode(&payment.encode()), Ok(payment));
    }

    #[test]
    fn test_ack_round_trip() {
        let ack = build_ack(
            build_payment(&[sample_tx()], vec![], Some("p".to_string()), None),
            Some("received".to_string()),
        );
        assert_eq!(PaymentAckMessage::decode(&ack.encode()), Ok(ack));
    }

    #[test]
    fn test_ack_without_payment() {
        let bytes = PaymentAckProto {
            payment: None,
            memo: Some("x".to_string()),
        }
        .encode_to_vec();
        assert_eq!(
            PaymentAckMessage::decode(&bytes),
            Err(MessageError::MissingField("payment"))
        );
    }

    #[test]
    fn test_refund_output_without_script() {
        let bytes = PaymentProto {
            refund_to: vec![crate::protocol::wire::OutputProto {
                amount: Some(5),
                script: None,
            }],
            ..Default::default()
        }
        .encode_to_vec();
        assert_eq!(
            PaymentMessage::decode(&bytes),
            Err(MessageError::MissingField("output.script"))
        );
    }

    #[test]
    fn test_partial_decode_tolerance() {
        let good = sample_tx().encode();
        let mut corrupt = good.clone();
        corrupt.truncate(corrupt.len() - 2);
        let payment = PaymentMessage {
            transactions: vec![good, corrupt],
            ..Default::default()
        };
        let decoded = payment.decode_transactions();
        assert_eq!(decoded.transactions, vec![sample_tx()]);
        assert_eq!(decoded.skipped.len(), 1);
        assert_eq!(decoded.skipped[0].0, 1);
    }
}
