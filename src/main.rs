// ============================================
// src/main.rs
// Entry point: configuration, logging and the terminal loop
// ============================================

use std::error::Error;
use std::fs::{self, OpenOptions};
use std::io::stdout;
use std::time::{Duration, Instant};

mod adapter;
mod app;
mod catalog;
mod config;
mod content;
mod error;
mod language;
mod narration;
mod recent;
mod registry;
mod schedule;
mod session;
mod ui;

use app::App;
use config::{AppConfig, Cli};
use narration::{CommandNarrator, Narrator, SilentNarrator};
use recent::RecentStore;
use registry::Registry;
use session::Session;

use clap::Parser;
use crossterm::{
    ExecutableCommand,
    cursor::{Hide, Show},
    event::{self, Event, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use env_logger::{Builder, Env, Target};
use log::{info, warn};
use ratatui::prelude::*;

fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::from_cli(Cli::parse());
    init_logging(&config)?;

    let registry = Registry::load_dir(&config.content_dir)?;
    info!(
        "[main] {} quizzes registered from {}",
        registry.len(),
        config.content_dir.display()
    );
    if registry.is_empty() {
        warn!("[main] no quizzes found under {}", config.content_dir.display());
    }

    let narrator: Box<dyn Narrator> = match &config.tts_command {
        Some(program) => Box::new(CommandNarrator::new(program.clone())),
        None => Box::new(SilentNarrator),
    };
    let session = Session::new(&registry, rand::rng(), config.session_options(), Instant::now())?;
    let mut app = App::new(
        session,
        &registry,
        narrator,
        Some(RecentStore::new(config.data_dir.clone())),
    );

    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, &mut app);
    restore_terminal()?;
    result?;
    Ok(())
}

// MARK: logging

/// Logs go to a file; the terminal belongs to the UI.
fn init_logging(config: &AppConfig) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = config.log_file.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;

    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

// MARK: terminal

fn setup_terminal() -> std::io::Result<Terminal<impl Backend>> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(Hide)?;
    let backend = CrosstermBackend::new(stdout());
    Terminal::new(backend)
}

fn restore_terminal() -> std::io::Result<()> {
    stdout().execute(Show)?;
    stdout().execute(LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}

fn run_app<R: rand::Rng>(
    terminal: &mut Terminal<impl Backend>,
    app: &mut App<'_, R>,
) -> std::io::Result<()> {
    loop {
        terminal.draw(|f| ui::render(f, app))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key.code, Instant::now());
                }
            }
        }
        app.tick(Instant::now());

        if app.should_quit() {
            break;
        }
    }
    Ok(())
}
