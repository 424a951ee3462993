//! Runtime bridge - connects sync TUI thread with async Tokio runtime
//!
//! The TUI thread sends [`RuntimeCommand`]s and drains [`RuntimeEvent`]s;
//! all network I/O happens on the worker thread.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use anyhow::Context;
use tokio::runtime::Runtime;
use tracing::info;

use crate::domain::{LookupError, LookupOutcome, RequestId};
use crate::infrastructure::indexer::IndexingApi;
use crate::infrastructure::runtime::lookup::LookupOptions;
use crate::infrastructure::runtime::worker::run_async_worker;
use crate::infrastructure::wallet::WalletSession;

/// Commands sent from the TUI to the async worker
#[derive(Debug, Clone)]
pub enum RuntimeCommand {
    /// Run a balance lookup
    Lookup { request: RequestId, query: String },
    /// Ask the wallet for authorization
    ConnectWallet,
    /// Drop the wallet session
    DisconnectWallet,
    /// Shutdown the worker
    Shutdown,
}

/// Events sent from the async worker to the TUI
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A lookup finished, successfully or not
    LookupFinished {
        request: RequestId,
        result: Result<LookupOutcome, LookupError>,
    },
    /// Wallet authorized these accounts
    WalletConnected { accounts: Vec<String> },
    /// Wallet session ended
    WalletDisconnected,
    /// Wallet refused or is missing
    WalletFailed { error: LookupError },
}

/// Bridge between sync TUI thread and async Tokio runtime
pub struct RuntimeBridge {
    cmd_tx: Sender<RuntimeCommand>,
    evt_rx: Receiver<RuntimeEvent>,
}

impl RuntimeBridge {
    /// Spawn the worker thread with its own Tokio runtime
    pub fn new(
        api: Arc<dyn IndexingApi>,
        options: LookupOptions,
        wallet: WalletSession,
    ) -> anyhow::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<RuntimeCommand>();
        let (evt_tx, evt_rx) = mpsc::channel::<RuntimeEvent>();

        let rt = Runtime::new().context("Failed to create Tokio runtime")?;
        thread::Builder::new()
            .name("lookup-worker".into())
            .spawn(move || {
                rt.block_on(run_async_worker(api, options, wallet, cmd_rx, evt_tx));
                info!("worker thread finished");
            })
            .context("Failed to spawn worker thread")?;

        Ok(Self { cmd_tx, evt_rx })
    }

    /// Send a command to the async worker
    pub fn send(&self, cmd: RuntimeCommand) -> anyhow::Result<()> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| anyhow::anyhow!("Worker channel closed"))
    }

    /// Poll for events (non-blocking)
    pub fn poll_events(&self) -> Vec<RuntimeEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.evt_rx.try_recv() {
            events.push(evt);
        }
        events
    }
}

impl Drop for RuntimeBridge {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(RuntimeCommand::Shutdown);
    }
}
