//! Payer side of a payment session

use super::{PaymentError, PaymentTransport};
use crate::params::NetworkContext;
use crate::pki::{verify_payment_request, TrustStore, TrustVerificationResult};
use crate::protocol::{
    build_payment, MessageError, PaymentAckMessage, PaymentDetails, PaymentOutput,
    PaymentRequestMessage,
};
use crate::script::{
    build_pay_to_address_script, satoshis_to_btc, Address, AddressError,
};
use crate::transaction::TransactionRecord;
use crate::utils::current_timestamp;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A decoded payment request and what the payer learned about it
#[derive(Debug, Clone)]
pub struct PaymentSession {
    pub request: PaymentRequestMessage,
    pub details: PaymentDetails,
    /// Advisory: an unsigned or unverifiable request can still be paid
    pub trust: TrustVerificationResult,
    /// Expiry evaluated when the session was created
    pub expired: bool,
    /// Requested outputs as (address, satoshis)
    pub outputs: Vec<(Address, i64)>,
}

impl PaymentSession {
    /// Total requested, in satoshis
    pub fn total_amount(&self) -> Option<i64> {
        self.details.total_amount()
    }

    /// Total requested, in ledger units
    pub fn total_btc(&self) -> Option<Decimal> {
        self.total_amount().map(satoshis_to_btc)
    }

    pub fn memo(&self) -> Option<&str> {
        self.details.memo.as_deref()
    }

    pub fn payment_url(&self) -> Option<&str> {
        self.details.payment_url.as_deref()
    }

    pub fn merchant_data_utf8(&self) -> Option<&str> {
        self.details.merchant_data_utf8()
    }

    pub fn is_verified(&self) -> bool {
        self.trust.is_verified()
    }
}

/// What came back from the payee
#[derive(Debug, Clone)]
pub struct AckSummary {
    pub ack: PaymentAckMessage,
    /// Transactions echoed in the acknowledgement that decoded cleanly
    pub transactions: Vec<TransactionRecord>,
    /// Echoed transactions that failed to decode
    pub skipped: usize,
}

impl AckSummary {
    pub fn memo(&self) -> Option<&str> {
        self.ack.memo.as_deref()
    }
}

/// Drives the payer's half of the protocol
pub struct PaymentClient {
    network: NetworkContext,
    trust_store: Arc<TrustStore>,
    transport: Arc<dyn PaymentTransport>,
}

impl PaymentClient {
    pub fn new(
        network: NetworkContext,
        trust_store: Arc<TrustStore>,
        transport: Arc<dyn PaymentTransport>,
    ) -> Self {
        Self {
            network,
            trust_store,
            transport,
        }
    }

    pub fn network(&self) -> &NetworkContext {
        &self.network
    }

    /// Fetch a payment request from `url` and inspect it
    pub fn fetch_payment_request(&self, url: &str) -> Result<PaymentSession, PaymentError> {
        debug!("Fetching payment request from {}", url);
        let bytes = self.transport.fetch_payment_request(url)?;
        self.inspect_payment_request(&bytes, current_timestamp())
    }

    /// Decode a serialized payment request and evaluate it at `now`
    pub fn inspect_payment_request(
        &self,
        bytes: &[u8],
        now: u64,
    ) -> Result<PaymentSession, PaymentError> {
        let request = PaymentRequestMessage::decode(bytes)?;
        let details = request.payment_details()?;
        details.check_network(&self.network)?;

        let total = details
            .total_amount()
            .ok_or(MessageError::AmountOverflow)?;

        let trust = verify_payment_request(&request, &self.trust_store, now);
        let expired = details.is_expired_at(now);
        let outputs = details.output_addresses(&self.network)?;

        info!(
            "Payment request for {} ({} outputs), memo: {:?}, signed: {}, verified: {}",
            satoshis_to_btc(total),
            outputs.len(),
            details.memo,
            request.is_signed(),
            trust.display_name().unwrap_or("no"),
        );
        for (address, amount) in &outputs {
            debug!("  pay {} to {}", satoshis_to_btc(*amount), address);
        }
        if let Some(merchant_data) = details.merchant_data_utf8() {
            debug!("  merchant data: {}", merchant_data);
        }
        if expired {
            warn!(
                "Payment request expired at {} (now {})",
                details.expires.unwrap_or_default(),
                now
            );
        }

        Ok(PaymentSession {
            request,
            details,
            trust,
            expired,
            outputs,
        })
    }

    /// Pay the session with already-built funding transactions.
    ///
    /// `refunds` are (address, satoshis) pairs the payee should use if it has
    /// to return funds.
    pub fn send_payment(
        &self,
        session: &PaymentSession,
        transactions: &[TransactionRecord],
        refunds: &[(Address, i64)],
        memo: Option<String>,
    ) -> Result<AckSummary, PaymentError> {
        let url = session
            .payment_url()
            .ok_or(PaymentError::MissingPaymentUrl)?;
        if session.expired {
            warn!("Sending payment for an expired request to {}", url);
        }

        let refund_outputs = refunds
            .iter()
            .map(|(address, amount)| self.refund_output(address, *amount))
            .collect::<Result<Vec<_>, _>>()?;
        let payment = build_payment(
            transactions,
            refund_outputs,
            memo,
            session.details.merchant_data.clone(),
        );

        info!(
            "Sending payment with {} transactions to {}",
            transactions.len(),
            url
        );
        let ack_bytes = self.transport.send_payment(url, &payment.encode())?;
        let ack = PaymentAckMessage::decode(&ack_bytes)?;
        let decoded = ack.payment.decode_transactions();

        info!("Payment acknowledged, memo: {:?}", ack.memo);
        Ok(AckSummary {
            ack,
            transactions: decoded.transactions,
            skipped: decoded.skipped.len(),
        })
    }

    fn refund_output(&self, address: &Address, amount: i64) -> Result<PaymentOutput, PaymentError> {
        if address.network() != self.network.network() {
            return Err(AddressError::WrongNetwork {
                network: self.network.network(),
                expected: self.network.pubkey_hash_version(),
                found: address.version(),
            }
            .into());
        }
        if amount < 0 {
            return Err(MessageError::InvalidAmount(amount).into());
        }
        Ok(PaymentOutput::new(
            amount,
            build_pay_to_address_script(address),
        ))
    }
}
