use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use erc20_indexer::app::{App, StatusLevel, WalletRequest};
use erc20_indexer::config::{self, Overrides, Settings, API_KEY_ENV};
use erc20_indexer::export::{self, OutputFormat};
use erc20_indexer::infrastructure::{
    AlchemyClient, BalanceLookup, IndexingApi, LookupOptions, NoWalletConnector,
    RpcWalletConnector, RuntimeBridge, RuntimeCommand, RuntimeEvent, WalletConnector,
    WalletSession,
};
use erc20_indexer::ui;

#[derive(Debug, Parser)]
#[command(
    name = "erc20-indexer",
    version,
    about = "Look up the ERC-20 token balances of an address or ENS name"
)]
struct Args {
    /// Run a single lookup, print the result and exit
    #[arg(long, short)]
    query: Option<String>,

    /// Output format for --query
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Alchemy network (eth-mainnet, eth-sepolia, polygon-mainnet, ...)
    #[arg(long)]
    network: Option<String>,

    /// Full indexing API URL, overrides network and API key
    #[arg(long)]
    rpc_url: Option<String>,

    /// Wallet JSON-RPC endpoint used for account authorization
    #[arg(long)]
    wallet_rpc: Option<String>,

    /// Quiet period before a typed query is looked up
    #[arg(long)]
    debounce_ms: Option<u64>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Hide tokens with a zero balance
    #[arg(long)]
    hide_zero: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            network: self.network.clone(),
            rpc_url: self.rpc_url.clone(),
            wallet_rpc: self.wallet_rpc.clone(),
            debounce_ms: self.debounce_ms,
            request_timeout_secs: self.timeout,
            hide_zero_balances: self.hide_zero,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = init_logging();

    let settings = Settings::resolve(
        config::load(),
        args.overrides(),
        std::env::var(API_KEY_ENV).ok(),
    )?;
    info!(
        network = %settings.network,
        endpoint = %settings.endpoint.display,
        debounce_ms = settings.debounce.as_millis() as u64,
        "starting"
    );

    let api: Arc<dyn IndexingApi> = Arc::new(AlchemyClient::new(settings.endpoint.clone())?);
    let options = LookupOptions {
        request_timeout: settings.request_timeout,
        hide_zero_balances: settings.hide_zero_balances,
    };

    if let Some(query) = args.query.as_deref() {
        return run_once(api, options, query, args.format);
    }

    let (connector, wallet_warning) = wallet_connector(settings.wallet_rpc.as_deref());
    let wallet = WalletSession::new(connector);
    let wallet_label = wallet.describe();

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = RuntimeBridge::new(api, options, wallet).and_then(|runtime| {
        let mut app = App::new(settings.debounce);
        app.network = settings.network.to_string();
        app.endpoint = settings.endpoint.display.clone();
        app.wallet.endpoint = wallet_label;
        if let Some(warning) = wallet_warning {
            app.set_status(warning, StatusLevel::Warn);
        }
        run_app(&mut terminal, app, runtime)
    });

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("{:#}", err);
        eprintln!("{err:?}");
    }

    Ok(())
}

/// Log to a file so the TUI owns the terminal
fn init_logging() -> Option<WorkerGuard> {
    let dir = config::log_dir();
    if let Err(err) = std::fs::create_dir_all(&dir) {
        eprintln!("Logging disabled: cannot create {}: {err}", dir.display());
        return None;
    }

    let file_appender = tracing_appender::rolling::never(&dir, "erc20-indexer.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();
    Some(guard)
}

fn wallet_connector(wallet_rpc: Option<&str>) -> (Box<dyn WalletConnector>, Option<String>) {
    let Some(url) = wallet_rpc else {
        return (Box::new(NoWalletConnector), None);
    };
    match RpcWalletConnector::new(url) {
        Ok(connector) => (Box::new(connector), None),
        Err(err) => {
            warn!("wallet endpoint rejected: {:#}", err);
            (
                Box::new(NoWalletConnector),
                Some(format!("Wallet disabled: {err}")),
            )
        }
    }
}

fn run_once(
    api: Arc<dyn IndexingApi>,
    options: LookupOptions,
    query: &str,
    format: OutputFormat,
) -> Result<()> {
    let rt = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    let lookup = BalanceLookup::new(api, options);
    let outcome = rt.block_on(lookup.resolve(query))?;

    let stdout = io::stdout();
    export::write_outcome(stdout.lock(), &outcome, format)
        .map_err(|err| anyhow::anyhow!("Failed to write output: {err}"))?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    runtime: RuntimeBridge,
) -> Result<()> {
    let tick_rate = Duration::from_millis(120);
    let mut last_tick = Instant::now();

    loop {
        pump_background(&mut app, &runtime);
        terminal.draw(|f| ui::draw(f, &app))?;
        if app.should_quit {
            let _ = runtime.send(RuntimeCommand::Shutdown);
            return Ok(());
        }

        let now = Instant::now();
        let mut timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));
        if let Some(wake) = app.next_wakeup(now) {
            timeout = timeout.min(wake);
        }

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                handle_key(&mut app, key);
            }
        }

        app.poll_debounce(Instant::now());

        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = Instant::now();
        }
    }
}

fn pump_background(app: &mut App, runtime: &RuntimeBridge) {
    for event in runtime.poll_events() {
        match event {
            RuntimeEvent::LookupFinished { request, result } => {
                app.apply_lookup_result(request, result);
            }
            RuntimeEvent::WalletConnected { accounts } => app.apply_wallet_connected(accounts),
            RuntimeEvent::WalletDisconnected => app.apply_wallet_disconnected(),
            RuntimeEvent::WalletFailed { error } => app.apply_wallet_failed(error),
        }
    }

    for lookup in app.take_lookup_requests() {
        let cmd = RuntimeCommand::Lookup {
            request: lookup.request,
            query: lookup.query,
        };
        if let Err(err) = runtime.send(cmd) {
            app.apply_worker_error(err.to_string());
        }
    }

    if let Some(request) = app.take_wallet_request() {
        let cmd = match request {
            WalletRequest::Connect => RuntimeCommand::ConnectWallet,
            WalletRequest::Disconnect => RuntimeCommand::DisconnectWallet,
        };
        if let Err(err) = runtime.send(cmd) {
            app.apply_worker_error(err.to_string());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if app.help_open {
        if matches!(key.code, KeyCode::F(1) | KeyCode::Char('?') | KeyCode::Esc) {
            app.help_open = false;
        }
        return;
    }

    let now = Instant::now();
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => app.should_quit = true,
            KeyCode::Char('w') => app.toggle_wallet(),
            KeyCode::Char('u') => app.clear_input(now),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::F(1) | KeyCode::Char('?') => app.help_open = true,
        KeyCode::Enter => {
            app.submit();
        }
        KeyCode::Backspace => app.pop_char(now),
        KeyCode::Up => app.move_selection_up(),
        KeyCode::Down => app.move_selection_down(),
        KeyCode::Char(c) => app.push_char(c, now),
        _ => {}
    }
}
