//! Full-screen TUI entrypoint.
//!
//! Wires the terminal to the state machine and delegates the rest:
//! - `app`: state + transitions (`init`, `on_event`)
//! - `event`: events in, commands out
//! - `loader`: runs commands on worker threads
//! - `input`: key dispatch + focus/navigation rules
//! - `view`: rendering/layout (ratatui)
//! - `form`, `cursor`: field editing and list selection

pub mod app;
pub mod cursor;
pub mod event;
pub mod form;
pub mod input;
pub mod loader;
pub mod view;

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::{
    event::{self as term, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::auth::OAuthClient;
use crate::client::{TaskService, TickTickClient};
use crate::clipboard::SystemClipboard;
use crate::config::ConfigFile;

use app::App;
use event::AppEvent;
use loader::{AsyncLoader, Services};

fn services(store: Arc<ConfigFile>) -> Services {
    Services {
        store,
        oauth: Arc::new(OAuthClient::new()),
        connect: Arc::new(|token: &str| -> Arc<dyn TaskService> {
            Arc::new(TickTickClient::new(token))
        }),
        clipboard: Arc::new(SystemClipboard::new()),
    }
}

/// Run the full-screen TUI until the user quits.
///
/// The loop never blocks on the network: commands go to the loader and their
/// completions come back as events on a later iteration.
pub fn run_tui(store: Arc<ConfigFile>) -> Result<()> {
    let mut app = App::new(&store.snapshot());
    let loader = AsyncLoader::new(services(store));

    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen) {
        disable_raw_mode().ok();
        return Err(e).context("Failed to enter alternate screen");
    }

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = match Terminal::new(backend) {
        Ok(terminal) => terminal,
        Err(e) => {
            disable_raw_mode().ok();
            execute!(io::stdout(), LeaveAlternateScreen).ok();
            return Err(e).context("Failed to create terminal backend");
        }
    };
    terminal.clear().ok();

    let result = event_loop(&mut terminal, &mut app, &loader);

    // Restore terminal state
    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();

    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    loader: &AsyncLoader,
) -> Result<()> {
    let tick_rate = Duration::from_millis(80);
    let mut last_tick = Instant::now();

    if let Ok(size) = terminal.size() {
        app.on_event(AppEvent::Resize(size.width, size.height));
    }
    if let Some(command) = app.init() {
        loader.spawn(command);
    }

    loop {
        terminal
            .draw(|f| view::draw(f, app))
            .context("Failed to draw frame")?;

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if term::poll(timeout).context("Failed to poll events")? {
            let command = match term::read().context("Failed to read event")? {
                Event::Key(key) => app.on_event(AppEvent::Key(key)),
                Event::Resize(width, height) => app.on_event(AppEvent::Resize(width, height)),
                _ => None,
            };
            if let Some(command) = command {
                loader.spawn(command);
            }
        }

        for completion in loader.drain() {
            if let Some(command) = app.on_event(completion) {
                loader.spawn(command);
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.on_event(AppEvent::Tick);
            last_tick = Instant::now();
        }

        if app.should_quit {
            tracing::info!("quit requested");
            return Ok(());
        }
    }
}
