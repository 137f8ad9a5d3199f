mod app;
mod color;
mod config;
mod error;
mod forms;
mod menu;
mod runner;
mod theme;
mod ui;

use std::io::{self, Stdout, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{execute, ExecutableCommand};
use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::app::AppState;
use crate::config::AppPaths;
use crate::runner::CommandRunner;

type MenuTerminal = Terminal<CrosstermBackend<Stdout>>;

/// Categorized terminal launcher.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Directory holding menus.json, theme.json, bin/ and logs/
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Drop directory scanned for new executables (Ctrl+B)
    #[arg(long, value_name = "DIR", default_value = "./bin")]
    import_dir: PathBuf,

    /// Log filter, e.g. `debug` or `info, menu_maker=trace`
    #[arg(long, value_name = "FILTER", default_value = "info")]
    log_level: String,

    /// Print the menu layout and exit
    #[arg(long)]
    list: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let paths = AppPaths::new(args.config_dir, args.import_dir)?;
    let _logger = start_logger(&paths, &args.log_level);
    log::info!("starting with config dir {}", paths.config_dir.display());

    let mut app = AppState::new(paths);
    if args.list {
        for line in ui::listing(app.store.tree(), &app.projection) {
            println!("{line}");
        }
        return Ok(());
    }

    let result = run_app(&mut app);
    if let Err(err) = app.theme.save(&app.paths.theme_file) {
        log::warn!("failed to save theme on exit: {err:#}");
    }
    log::info!("exiting");
    result
}

fn start_logger(paths: &AppPaths, filter: &str) -> Option<LoggerHandle> {
    let logger = Logger::try_with_str(filter)
        .or_else(|_| Logger::try_with_str("info"))
        .ok()?;
    match logger
        .log_to_file(
            FileSpec::default()
                .directory(&paths.log_dir)
                .basename("menu-maker")
                .suffix("log")
                .suppress_timestamp(),
        )
        .rotate(
            Criterion::Size(64 * 1024),
            Naming::Numbers,
            Cleanup::KeepLogFiles(3),
        )
        .start()
    {
        Ok(handle) => Some(handle),
        Err(err) => {
            eprintln!("Failed to start logging: {err}");
            None
        }
    }
}

fn run_app(app: &mut AppState) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal")?;
    terminal.hide_cursor()?;

    let result = event_loop(&mut terminal, app);

    restore_terminal(&mut terminal)?;
    result
}

fn event_loop(terminal: &mut MenuTerminal, app: &mut AppState) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut runner = CommandRunner::new();
    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Release {
                    app.handle_key(key);
                }
            }
        }

        if let Some(pending) = app.take_pending_command() {
            let outcome = runner.execute(terminal, &pending.command, pending.pause);
            log::debug!("{outcome:?}, runner {:?}", runner.state());
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

fn restore_terminal<W: Write>(terminal: &mut Terminal<CrosstermBackend<W>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
