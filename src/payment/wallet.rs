//! Wallet collaborator seam
//!
//! Key derivation, coin selection and persistence live behind the [`Wallet`]
//! trait. Broadcasting is asynchronous: the wallet hands back a
//! [`BroadcastHandle`] and completes it once the transaction has propagated.

use crate::script::Address;
use crate::transaction::{TransactionRecord, TxHash};
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::debug;
use uuid::Uuid;

pub type WalletId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    #[error("Wallet not found: {0}")]
    WalletNotFound(WalletId),

    #[error("No receive address available: {0}")]
    AddressUnavailable(String),

    #[error("Broadcast rejected: {0}")]
    BroadcastRejected(String),

    #[error("Broadcast abandoned before completion")]
    BroadcastAbandoned,
}

/// Outcome delivered when a broadcast finishes
pub type BroadcastOutcome = Result<TxHash, WalletError>;

/// A payee-side wallet
pub trait Wallet: Send + Sync {
    fn id(&self) -> WalletId;

    /// A receive address not handed out before
    fn fresh_receive_address(&self) -> Result<Address, WalletError>;

    /// Commit `tx` to the wallet and start propagating it
    fn broadcast(&self, tx: TransactionRecord) -> Result<BroadcastHandle, WalletError>;
}

/// Pending broadcast of one transaction
#[derive(Debug)]
pub struct BroadcastHandle {
    tx_hash: TxHash,
    receiver: oneshot::Receiver<BroadcastOutcome>,
}

/// Wallet-side end of a [`BroadcastHandle`]
#[derive(Debug)]
pub struct BroadcastCompleter {
    tx_hash: TxHash,
    sender: oneshot::Sender<BroadcastOutcome>,
}

impl BroadcastCompleter {
    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    /// Report the transaction as propagated
    pub fn complete(self) {
        // Receiver may already be gone; nobody is waiting then
        let _ = self.sender.send(Ok(self.tx_hash));
    }

    pub fn fail(self, error: WalletError) {
        let _ = self.sender.send(Err(error));
    }
}

impl BroadcastHandle {
    pub fn new(tx_hash: TxHash) -> (Self, BroadcastCompleter) {
        let (sender, receiver) = oneshot::channel();
        (
            Self { tx_hash, receiver },
            BroadcastCompleter { tx_hash, sender },
        )
    }

    /// Handle for a broadcast that has already finished
    pub fn completed(tx_hash: TxHash) -> Self {
        let (handle, completer) = Self::new(tx_hash);
        completer.complete();
        handle
    }

    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    /// Wait for the wallet to finish the broadcast
    pub async fn wait(self) -> BroadcastOutcome {
        self.receiver
            .await
            .unwrap_or(Err(WalletError::BroadcastAbandoned))
    }

    /// Run `callback` once the broadcast finishes, without blocking the caller.
    ///
    /// Inside a tokio runtime the callback runs on a spawned task; otherwise a
    /// dedicated thread waits for it.
    pub fn on_complete<F>(self, callback: F)
    where
        F: FnOnce(BroadcastOutcome) + Send + 'static,
    {
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move { callback(self.wait().await) });
            }
            Err(_) => {
                debug!("No async runtime, waiting for broadcast {} on a thread", self.tx_hash);
                std::thread::spawn(move || {
                    let outcome = self
                        .receiver
                        .blocking_recv()
                        .unwrap_or(Err(WalletError::BroadcastAbandoned));
                    callback(outcome)
                });
            }
        }
    }
}

/// Concurrent wallet lookup by id
#[derive(Default)]
pub struct WalletRepository {
    wallets: DashMap<WalletId, Arc<dyn Wallet>>,
}

impl fmt::Debug for WalletRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletRepository")
            .field("wallets", &self.wallets.len())
            .finish()
    }
}

impl WalletRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `wallet` under its id, returning the wallet it replaced
    pub fn save(&self, wallet: Arc<dyn Wallet>) -> Option<Arc<dyn Wallet>> {
        self.wallets.insert(wallet.id(), wallet)
    }

    pub fn find_by_id(&self, id: &WalletId) -> Option<Arc<dyn Wallet>> {
        self.wallets.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Like [`find_by_id`](Self::find_by_id), failing with `WalletNotFound`
    pub fn get(&self, id: &WalletId) -> Result<Arc<dyn Wallet>, WalletError> {
        self.find_by_id(id).ok_or(WalletError::WalletNotFound(*id))
    }

    pub fn remove(&self, id: &WalletId) -> Option<Arc<dyn Wallet>> {
        self.wallets.remove(id).map(|(_, wallet)| wallet)
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }
}
