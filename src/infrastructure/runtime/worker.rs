//! Async worker - runs in Tokio runtime and handles lookups and wallet actions

use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::infrastructure::indexer::IndexingApi;
use crate::infrastructure::runtime::bridge::{RuntimeCommand, RuntimeEvent};
use crate::infrastructure::runtime::lookup::{BalanceLookup, LookupOptions};
use crate::infrastructure::wallet::WalletSession;

/// Run the async worker loop
///
/// Each lookup runs in its own task, so a slow lookup never blocks newer
/// ones; the UI discards results that are no longer current.
pub async fn run_async_worker(
    api: Arc<dyn IndexingApi>,
    options: LookupOptions,
    wallet: WalletSession,
    cmd_rx: Receiver<RuntimeCommand>,
    evt_tx: Sender<RuntimeEvent>,
) {
    info!(endpoint = %api.endpoint_name(), wallet = %wallet.describe(), "worker started");

    let lookup = Arc::new(BalanceLookup::new(api, options));
    let wallet = Arc::new(Mutex::new(wallet));

    loop {
        // Process commands (non-blocking)
        loop {
            let cmd = match cmd_rx.try_recv() {
                Ok(cmd) => cmd,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return,
            };

            match cmd {
                RuntimeCommand::Shutdown => {
                    info!("worker shutting down");
                    return;
                }

                RuntimeCommand::Lookup { request, query } => {
                    debug!(request = request.0, query = %query, "lookup queued");
                    let lookup = Arc::clone(&lookup);
                    let evt_tx = evt_tx.clone();
                    tokio::spawn(async move {
                        let result = lookup.resolve(&query).await;
                        let _ = evt_tx.send(RuntimeEvent::LookupFinished { request, result });
                    });
                }

                RuntimeCommand::ConnectWallet => {
                    let wallet = Arc::clone(&wallet);
                    let evt_tx = evt_tx.clone();
                    tokio::spawn(async move {
                        let mut session = wallet.lock().await;
                        let event = match session.connect().await {
                            Ok(accounts) => RuntimeEvent::WalletConnected {
                                accounts: accounts
                                    .iter()
                                    .map(|account| account.to_checksum(None))
                                    .collect(),
                            },
                            Err(error) => RuntimeEvent::WalletFailed { error },
                        };
                        let _ = evt_tx.send(event);
                    });
                }

                RuntimeCommand::DisconnectWallet => {
                    let wallet = Arc::clone(&wallet);
                    let evt_tx = evt_tx.clone();
                    tokio::spawn(async move {
                        wallet.lock().await.disconnect().await;
                        let _ = evt_tx.send(RuntimeEvent::WalletDisconnected);
                    });
                }
            }
        }

        // Small yield to prevent busy loop
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
