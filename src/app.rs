use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::domain::{
    Debouncer, DisplayRow, LookupError, LookupOutcome, LookupState, RequestId, RequestTracker,
};

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub level: StatusLevel,
    pub since: Instant,
}

/// A lookup the worker should run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    pub request: RequestId,
    pub query: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletRequest {
    Connect,
    Disconnect,
}

/// What the header shows about the wallet
#[derive(Debug, Clone, Default)]
pub struct WalletView {
    pub connected: bool,
    pub accounts: Vec<String>,
    /// A connect/disconnect is in flight
    pub busy: bool,
    pub endpoint: String,
}

pub struct App {
    pub input: String,
    pub lookup: LookupState,
    pub wallet: WalletView,
    pub endpoint: String,
    pub network: String,
    pub help_open: bool,
    pub should_quit: bool,
    pub selected_row: usize,
    requests: RequestTracker,
    debouncer: Debouncer<String>,
    pending_lookups: Vec<LookupRequest>,
    wallet_request: Option<WalletRequest>,
    status: Option<StatusMessage>,
    spinner: usize,
}

impl App {
    pub fn new(debounce: Duration) -> Self {
        Self {
            input: String::new(),
            lookup: LookupState::Idle,
            wallet: WalletView::default(),
            endpoint: String::new(),
            network: String::new(),
            help_open: false,
            should_quit: false,
            selected_row: 0,
            requests: RequestTracker::new(),
            debouncer: Debouncer::new(debounce),
            pending_lookups: Vec::new(),
            wallet_request: None,
            status: None,
            spinner: 0,
        }
    }

    pub fn set_status(&mut self, text: impl Into<String>, level: StatusLevel) {
        self.status = Some(StatusMessage {
            text: text.into(),
            level,
            since: Instant::now(),
        });
    }

    pub fn status_text(&self) -> Option<(&str, StatusLevel)> {
        self.status
            .as_ref()
            .map(|status| (status.text.as_str(), status.level))
    }

    pub fn on_tick(&mut self) {
        self.spinner = self.spinner.wrapping_add(1);
        if let Some(status) = self.status.as_ref() {
            if status.since.elapsed() > Duration::from_secs(4) {
                self.status = None;
            }
        }
    }

    pub fn spinner_frame(&self) -> &'static str {
        SPINNER[self.spinner % SPINNER.len()]
    }

    // === Query input ===

    pub fn push_char(&mut self, c: char, now: Instant) {
        self.input.push(c);
        self.on_query_changed(now);
    }

    pub fn pop_char(&mut self, now: Instant) {
        if self.input.pop().is_some() {
            self.on_query_changed(now);
        }
    }

    pub fn clear_input(&mut self, now: Instant) {
        if !self.input.is_empty() {
            self.input.clear();
            self.on_query_changed(now);
        }
    }

    /// Every edit restarts the quiet window; an empty query schedules nothing
    fn on_query_changed(&mut self, now: Instant) {
        if self.input.trim().is_empty() {
            self.debouncer.cancel();
        } else {
            self.debouncer.trigger(self.input.clone(), now);
        }
    }

    /// Explicit submit: skip the quiet window
    pub fn submit(&mut self) -> RequestId {
        self.debouncer.cancel();
        self.start_lookup(self.input.clone())
    }

    /// Fire the debounced query once input has settled
    pub fn poll_debounce(&mut self, now: Instant) -> Option<RequestId> {
        let query = self.debouncer.poll(now)?;
        Some(self.start_lookup(query))
    }

    /// How long the event loop may sleep before the debouncer needs a poll
    pub fn next_wakeup(&self, now: Instant) -> Option<Duration> {
        self.debouncer.time_until_fire(now)
    }

    fn start_lookup(&mut self, query: String) -> RequestId {
        let request = self.requests.issue();
        debug!(request = request.0, query = %query, "lookup started");
        self.lookup = LookupState::Loading {
            request,
            query: query.clone(),
        };
        self.selected_row = 0;
        self.pending_lookups.push(LookupRequest { request, query });
        request
    }

    pub fn take_lookup_requests(&mut self) -> Vec<LookupRequest> {
        std::mem::take(&mut self.pending_lookups)
    }

    /// Apply a finished lookup. Results from superseded requests are dropped.
    pub fn apply_lookup_result(
        &mut self,
        request: RequestId,
        result: Result<LookupOutcome, LookupError>,
    ) -> bool {
        if !self.requests.is_current(request) {
            debug!(
                request = request.0,
                latest = ?self.requests.latest().map(|id| id.0),
                "discarding stale lookup result"
            );
            return false;
        }

        let query = match &self.lookup {
            LookupState::Loading { query, .. } => query.clone(),
            _ => self.input.clone(),
        };

        match result {
            Ok(outcome) => {
                let count = outcome.rows.len();
                let target = outcome
                    .resolved_from
                    .clone()
                    .unwrap_or_else(|| outcome.address.to_checksum(None));
                self.set_status(
                    format!("{} token balances for {}", count, target),
                    StatusLevel::Info,
                );
                self.lookup = LookupState::Success(outcome);
            }
            Err(error) => {
                info!(query = %query, kind = error.kind(), "lookup failed: {}", error);
                self.status = None;
                self.lookup = LookupState::Failure { query, error };
            }
        }
        self.clamp_selection();
        true
    }

    pub fn is_loading(&self) -> bool {
        self.lookup.is_loading()
    }

    pub fn rows(&self) -> &[DisplayRow] {
        self.lookup.rows()
    }

    // === Wallet ===

    pub fn toggle_wallet(&mut self) {
        if self.wallet.busy {
            self.set_status("Wallet request already in progress", StatusLevel::Warn);
            return;
        }
        let request = if self.wallet.connected {
            WalletRequest::Disconnect
        } else {
            WalletRequest::Connect
        };
        self.wallet.busy = true;
        self.wallet_request = Some(request);
        if request == WalletRequest::Connect {
            self.set_status("Waiting for wallet approval…", StatusLevel::Info);
        }
    }

    pub fn take_wallet_request(&mut self) -> Option<WalletRequest> {
        self.wallet_request.take()
    }

    pub fn apply_wallet_connected(&mut self, accounts: Vec<String>) {
        self.wallet.busy = false;
        self.wallet.connected = true;
        let first = accounts.first().cloned().unwrap_or_default();
        self.wallet.accounts = accounts;
        self.set_status(format!("Wallet connected: {}", first), StatusLevel::Info);
    }

    pub fn apply_wallet_disconnected(&mut self) {
        self.wallet.busy = false;
        self.wallet.connected = false;
        self.wallet.accounts.clear();
        self.set_status("Wallet disconnected", StatusLevel::Info);
    }

    pub fn apply_wallet_failed(&mut self, error: LookupError) {
        self.wallet.busy = false;
        self.wallet.connected = false;
        self.wallet.accounts.clear();
        self.set_status(error.to_string(), StatusLevel::Error);
    }

    pub fn apply_worker_error(&mut self, message: String) {
        self.set_status(message, StatusLevel::Error);
    }

    // === Results table ===

    pub fn move_selection_up(&mut self) {
        self.selected_row = self.selected_row.saturating_sub(1);
    }

    pub fn move_selection_down(&mut self) {
        let len = self.rows().len();
        if len > 0 && self.selected_row + 1 < len {
            self.selected_row += 1;
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.rows().len();
        if len == 0 {
            self.selected_row = 0;
        } else if self.selected_row >= len {
            self.selected_row = len - 1;
        }
    }
}
