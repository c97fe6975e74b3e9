//! Payment Processor
//!
//! Payee side of a payment session: issues payment requests on behalf of a
//! wallet and accepts the payments sent back for it. Transport-agnostic; the
//! embedding application routes bytes in and out.

use super::{PaymentError, WalletId, WalletRepository};
use crate::config::PaymentConfig;
use crate::params::NetworkContext;
use crate::pki::RequestSigner;
use crate::protocol::{
    build_ack, build_payment_details, PaymentAckMessage, PaymentMessage, PaymentOutput,
    PaymentRequestMessage,
};
use crate::script::{
    address_from_script, btc_to_satoshis, build_pay_to_address_script, satoshis_to_btc,
};
use crate::transaction::TxHash;
use crate::utils::current_timestamp;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Seconds a new payment request stays valid
pub const DEFAULT_EXPIRES_IN: u64 = 3600;

/// Requested amount when the caller names none: 0.5 units
pub const DEFAULT_AMOUNT_SATOSHIS: i64 = 50_000_000;

/// Memo returned in every acknowledgement
const ACK_MEMO: &str = "Thank you for your payment";

/// Result of accepting a payment
#[derive(Debug, Clone)]
pub struct ProcessedPayment {
    pub ack: PaymentAckMessage,
    /// Transactions the wallet accepted for broadcast
    pub broadcast: Vec<TxHash>,
    /// Embedded transactions that failed to decode
    pub skipped: usize,
}

/// Payee-side payment processor
pub struct PaymentProcessor {
    network: NetworkContext,
    wallets: Arc<WalletRepository>,
    /// Payments are posted to `<payment_url_base>/<wallet id>`
    payment_url_base: String,
    expires_in: u64,
    default_amount: i64,
    signer: Option<Arc<RequestSigner>>,
}

impl PaymentProcessor {
    pub fn new(
        network: NetworkContext,
        wallets: Arc<WalletRepository>,
        payment_url_base: impl Into<String>,
    ) -> Self {
        Self {
            network,
            wallets,
            payment_url_base: payment_url_base.into(),
            expires_in: DEFAULT_EXPIRES_IN,
            default_amount: DEFAULT_AMOUNT_SATOSHIS,
            signer: None,
        }
    }

    /// Build a processor from configuration, loading the signing key and
    /// certificate chain when signing is enabled
    pub fn from_config(
        config: &PaymentConfig,
        wallets: Arc<WalletRepository>,
    ) -> anyhow::Result<Self> {
        config.validate()?;

        let mut processor = Self::new(
            config.network_context()?,
            wallets,
            config.payment_url_base.clone(),
        )
        .with_expires_in(config.expires_in_seconds)
        .with_default_amount(config.default_amount_satoshis()?);

        if let Some(signer) = config.load_signer()? {
            processor = processor.with_signer(signer);
        }

        info!(
            "Payment processor initialized: network={}, url_base={}, signed={}",
            processor.network.network(),
            processor.payment_url_base,
            processor.signer.is_some()
        );
        Ok(processor)
    }

    /// Sign every request with `signer`
    pub fn with_signer(mut self, signer: RequestSigner) -> Self {
        self.signer = Some(Arc::new(signer));
        self
    }

    pub fn with_expires_in(mut self, seconds: u64) -> Self {
        self.expires_in = seconds;
        self
    }

    /// Amount in satoshis used when a request names none
    pub fn with_default_amount(mut self, satoshis: i64) -> Self {
        self.default_amount = satoshis;
        self
    }

    pub fn network(&self) -> &NetworkContext {
        &self.network
    }

    /// Where payments for `wallet_id` are posted
    pub fn payment_url(&self, wallet_id: &WalletId) -> String {
        format!(
            "{}/{}",
            self.payment_url_base.trim_end_matches('/'),
            wallet_id
        )
    }

    /// Create a payment request paying `amount` (ledger units, default 0.5)
    /// to a fresh address of the wallet
    pub fn create_payment_request(
        &self,
        wallet_id: &WalletId,
        amount: Option<Decimal>,
    ) -> Result<PaymentRequestMessage, PaymentError> {
        self.create_payment_request_at(wallet_id, amount, current_timestamp())
    }

    /// [`create_payment_request`](Self::create_payment_request) with an
    /// explicit creation time
    pub fn create_payment_request_at(
        &self,
        wallet_id: &WalletId,
        amount: Option<Decimal>,
        now: u64,
    ) -> Result<PaymentRequestMessage, PaymentError> {
        let wallet = self.wallets.get(wallet_id)?;
        let amount = match amount {
            Some(amount) => btc_to_satoshis(amount)?,
            None => self.default_amount,
        };
        let address = wallet.fresh_receive_address()?;

        let details = build_payment_details(
            &self.network,
            vec![PaymentOutput::new(
                amount,
                build_pay_to_address_script(&address),
            )],
            Some(format!("Payment request for wallet {}", wallet_id)),
            self.expires_in,
            Some(self.payment_url(wallet_id)),
            Some(wallet_id.to_string().into_bytes()),
            now,
        )?;

        let request = PaymentRequestMessage::new(&details);
        let request = match &self.signer {
            Some(signer) => signer.sign(&request)?,
            None => request,
        };

        info!(
            "Created payment request for wallet {}: {} to {} (expires {:?}, signed: {})",
            wallet_id,
            satoshis_to_btc(amount),
            address,
            details.expires,
            request.is_signed()
        );
        Ok(request)
    }

    /// Accept a serialized payment for `wallet_id`.
    ///
    /// Undecodable transactions are skipped. Each remaining transaction goes
    /// to the wallet for broadcast; completion is logged asynchronously.
    pub fn process_payment(
        &self,
        bytes: &[u8],
        wallet_id: &WalletId,
    ) -> Result<ProcessedPayment, PaymentError> {
        let wallet = self.wallets.get(wallet_id)?;
        let payment = PaymentMessage::decode(bytes)?;
        self.log_payment(wallet_id, &payment);

        let decoded = payment.decode_transactions();
        let mut broadcast = Vec::with_capacity(decoded.transactions.len());
        for tx in decoded.transactions {
            let tx_hash = tx.hash();
            match wallet.broadcast(tx) {
                Ok(handle) => {
                    let wallet_id = *wallet_id;
                    handle.on_complete(move |outcome| match outcome {
                        Ok(hash) => info!("Wallet {}: transaction {} broadcast", wallet_id, hash),
                        Err(e) => warn!(
                            "Wallet {}: broadcast of transaction {} failed: {}",
                            wallet_id, tx_hash, e
                        ),
                    });
                    broadcast.push(tx_hash);
                }
                Err(e) => warn!(
                    "Wallet {} rejected transaction {}: {}",
                    wallet_id, tx_hash, e
                ),
            }
        }

        info!(
            "Processed payment for wallet {}: {} transactions accepted, {} skipped",
            wallet_id,
            broadcast.len(),
            decoded.skipped.len()
        );
        Ok(ProcessedPayment {
            ack: build_ack(payment, Some(ACK_MEMO.to_string())),
            broadcast,
            skipped: decoded.skipped.len(),
        })
    }

    fn log_payment(&self, wallet_id: &WalletId, payment: &PaymentMessage) {
        debug!(
            "Payment for wallet {}: {} transactions, {} refund outputs",
            wallet_id,
            payment.transactions.len(),
            payment.refund_to.len()
        );
        if let Some(memo) = &payment.memo {
            info!("Payment memo: {}", memo);
        }
        if let Some(merchant_data) = &payment.merchant_data {
            info!(
                "Payment merchant data: {}",
                String::from_utf8_lossy(merchant_data)
            );
        }
        for (index, refund) in payment.refund_to.iter().enumerate() {
            match address_from_script(&refund.script, &self.network) {
                Ok(address) => info!(
                    "Refund output {}: {} to {}",
                    index,
                    satoshis_to_btc(refund.amount),
                    address
                ),
                Err(_) => info!(
                    "Refund output {}: {} to script {}",
                    index,
                    satoshis_to_btc(refund.amount),
                    hex::encode(&refund.script)
                ),
            }
        }
    }
}
