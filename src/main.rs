mod app;
mod config;
mod editor;
mod input;
mod layout;
mod logging;
mod matches;
mod query;
mod store;
mod theme;
mod ui;
mod viewport;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use app::AppState;
use config::Config;
use theme::Theme;

/// Browse a file of JSON-per-line log records
#[derive(Parser, Debug)]
#[command(name = "jlv", version, about)]
struct Cli {
    /// Log file to open
    file: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;

    if let Some(path) = &config.log_file {
        logging::init(path)?;
    }

    let theme = Theme::by_name(&config.theme).unwrap_or_else(|| {
        warn!(theme = %config.theme, "Unknown theme, using default");
        Theme::default()
    });

    // Never enter the UI for a file we cannot read
    let report = store::load(&cli.file)?;
    let summary = report.summary();

    let mut state = AppState::new(report.store, &config, theme);
    state.status_message = summary;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    let result = run_event_loop(&mut terminal, &mut state);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("Exiting");
    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut AppState,
) -> Result<()> {
    let size = terminal.size()?;
    state.resize(size.width, size.height);

    loop {
        terminal.draw(|frame| ui::draw(frame, state))?;

        // Block until the next event; nothing changes between events
        match event::read()? {
            Event::Key(key) => {
                // Only handle key press events (not release)
                if key.kind == KeyEventKind::Press {
                    input::handle_key(state, key);
                }
            }
            Event::Resize(width, height) => {
                state.resize(width, height);
            }
            _ => {}
        }

        if state.should_quit {
            break;
        }
    }

    Ok(())
}
