//! Gateway to the external stake ledger. All calls go through a spawned
//! worker task fed by a channel, so the simulation loop never waits on a
//! remote service: kill recording, player resets and prize distribution are
//! fire-and-forget, and match reservation hands back a oneshot the caller
//! can await off the hot path.

use shared::PrizeShare;
use std::future::Future;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Ledger rejected the request: {0}")]
    Rejected(String),
    #[error("Ledger is unreachable")]
    Unreachable,
}

/// The remote operations the game needs from the ledger. Implementations
/// talk to the real settlement service; tests swap in recording or failing
/// backends.
pub trait LedgerBackend: Send + 'static {
    /// Locks the stakes of a cohort and returns a reservation id for the
    /// match about to start. `reservation_ids` carries the per-player slot
    /// reservations the members obtained before joining.
    fn start_match(
        &mut self,
        wallets: Vec<String>,
        reservation_ids: Vec<u64>,
    ) -> impl Future<Output = Result<u64, LedgerError>> + Send;

    /// Records an elimination against the killer's reservation.
    fn record_kill(
        &mut self,
        reservation_id: u64,
        victim_wallet: String,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;

    /// Releases a player's locked stake (death, disconnect or cancellation).
    fn reset_player(
        &mut self,
        wallet_address: String,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;

    /// Pays out the computed shares at match end.
    fn distribute_prizes(
        &mut self,
        shares: Vec<PrizeShare>,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;
}

/// Backend used when the server runs without a settlement service attached.
/// Reservations are handed out from a local counter and everything else is
/// accepted silently.
pub struct NoopLedger {
    next_reservation: u64,
}

impl NoopLedger {
    pub fn new() -> Self {
        NoopLedger {
            next_reservation: 1,
        }
    }
}

impl Default for NoopLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerBackend for NoopLedger {
    async fn start_match(
        &mut self,
        _wallets: Vec<String>,
        _reservation_ids: Vec<u64>,
    ) -> Result<u64, LedgerError> {
        let id = self.next_reservation;
        self.next_reservation += 1;
        Ok(id)
    }

    async fn record_kill(
        &mut self,
        _reservation_id: u64,
        _victim_wallet: String,
    ) -> Result<(), LedgerError> {
        Ok(())
    }

    async fn reset_player(&mut self, _wallet_address: String) -> Result<(), LedgerError> {
        Ok(())
    }

    async fn distribute_prizes(&mut self, _shares: Vec<PrizeShare>) -> Result<(), LedgerError> {
        Ok(())
    }
}

enum LedgerCommand {
    StartMatch {
        wallets: Vec<String>,
        reservation_ids: Vec<u64>,
        reply: oneshot::Sender<Result<u64, LedgerError>>,
    },
    RecordKill {
        reservation_id: u64,
        victim_wallet: String,
    },
    ResetPlayer {
        wallet_address: String,
    },
    DistributePrizes {
        shares: Vec<PrizeShare>,
    },
}

/// Cheap clonable handle the server keeps; commands queue to the worker and
/// never block the caller.
#[derive(Clone)]
pub struct LedgerHandle {
    tx: mpsc::UnboundedSender<LedgerCommand>,
}

impl LedgerHandle {
    /// Spawns the worker task around a backend and returns the handle.
    pub fn spawn<B: LedgerBackend>(backend: B) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(backend, rx));
        LedgerHandle { tx }
    }

    /// Requests a stake reservation for a cohort. The returned receiver
    /// resolves once the ledger answers; if the worker is gone the receiver
    /// yields a channel error, which callers treat as a failed reservation.
    pub fn start_match(
        &self,
        wallets: Vec<String>,
        reservation_ids: Vec<u64>,
    ) -> oneshot::Receiver<Result<u64, LedgerError>> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(LedgerCommand::StartMatch {
            wallets,
            reservation_ids,
            reply,
        });
        rx
    }

    pub fn record_kill(&self, reservation_id: u64, victim_wallet: String) {
        let _ = self.tx.send(LedgerCommand::RecordKill {
            reservation_id,
            victim_wallet,
        });
    }

    pub fn reset_player(&self, wallet_address: String) {
        let _ = self.tx.send(LedgerCommand::ResetPlayer { wallet_address });
    }

    pub fn distribute_prizes(&self, shares: Vec<PrizeShare>) {
        if shares.is_empty() {
            return;
        }
        let _ = self.tx.send(LedgerCommand::DistributePrizes { shares });
    }
}

async fn run_worker<B: LedgerBackend>(
    mut backend: B,
    mut rx: mpsc::UnboundedReceiver<LedgerCommand>,
) {
    while let Some(command) = rx.recv().await {
        match command {
            LedgerCommand::StartMatch {
                wallets,
                reservation_ids,
                reply,
            } => {
                let result = backend.start_match(wallets, reservation_ids).await;
                if let Err(ref e) = result {
                    log::error!("Match reservation failed: {}", e);
                }
                let _ = reply.send(result);
            }
            LedgerCommand::RecordKill {
                reservation_id,
                victim_wallet,
            } => {
                if let Err(e) = backend.record_kill(reservation_id, victim_wallet).await {
                    log::error!("Failed to record kill on ledger: {}", e);
                }
            }
            LedgerCommand::ResetPlayer { wallet_address } => {
                if let Err(e) = backend.reset_player(wallet_address).await {
                    log::error!("Failed to reset player on ledger: {}", e);
                }
            }
            LedgerCommand::DistributePrizes { shares } => {
                if let Err(e) = backend.distribute_prizes(shares).await {
                    log::error!("Prize distribution failed: {}", e);
                }
            }
        }
    }
}
