//! Tickerboard terminal markets board and portfolio tracker.
//!
//! Markets table fed by the Binance 24h snapshot, the tonapi rates source and the
//! Binance all-market live stream, with favourites, a portfolio and a profit calculator.

mod app;
mod ui;

use app::{Action, App};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use rustls::crypto::ring::default_provider;
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io,
    path::Path,
    sync::{Arc, Mutex},
    time::Duration,
};
use tickerboard_data::{
    BoardHandle, BoardRunner, TickerBoard,
    config::{self, FeedConfig},
    storage::LocalStore,
};
use tracing::{error, info};

const TICK_RATE: Duration = Duration::from_millis(250);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Install rustls crypto provider for REST + WSS
    let _ = default_provider().install_default();

    let data_dir = config::data_dir();
    init_logging(&data_dir)?;

    // Setup panic hook to restore terminal on crash
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));

    let config = FeedConfig::from_env();
    info!(?config, data_dir = %data_dir.display(), "starting tickerboard");

    let board = Arc::new(TickerBoard::default());
    let mut app = App::new(Arc::clone(&board), LocalStore::new(&data_dir));
    let handle = BoardRunner::spawn(config, board)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, &handle).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    handle.shutdown();

    if let Err(error) = &res {
        error!(%error, "tickerboard exited with error");
    }
    info!("tickerboard stopped");

    Ok(res?)
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    handle: &BoardHandle,
) -> io::Result<()> {
    let board = handle.board();
    let mut mapping_rx = board.subscribe();
    let live_status_rx = handle.live_status();
    let mut interval = tokio::time::interval(TICK_RATE);

    loop {
        // Reactive recompute: adopt the latest mapping version when it changed
        if mapping_rx.has_changed().unwrap_or(false) {
            let mapping = mapping_rx.borrow_and_update().clone();
            app.sync(mapping);
        }
        app.last_error = board.last_error();
        app.live_status = *live_status_rx.borrow();

        terminal.draw(|f| ui::render(f, app))?;

        // Drain every pending key before yielding back to the runtime
        while event::poll(Duration::ZERO)? {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }

            match app.handle_key(key) {
                Action::Quit => return Ok(()),
                Action::Refresh => handle.refresh(),
                Action::None => {}
            }
        }

        interval.tick().await;
    }
}

/// Log to a file in the data directory, the terminal belongs to the UI.
fn init_logging(data_dir: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(data_dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(data_dir.join("tickerboard.log"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}
