mod accent;
mod app;
mod config;
mod error;
mod session;
mod ticker;
mod tone;
mod ui;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::{fs, io, path::{Path, PathBuf}, sync::Mutex, time::{Duration, Instant}};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::accent::{AccentPreference, JsonFileStore};
use crate::app::{App, Options};
use crate::config::{DEFAULT_CYCLES, DEFAULT_REST_MINUTES, DEFAULT_WORK_MINUTES};

// ============================================================================
// Type Aliases & Constants
// ============================================================================

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
const FRAME_RATE: Duration = Duration::from_millis(100);
const DATA_DIR: &str = "tomatick";

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser)]
#[command(author, version, about = "🍅 tomatick - A single-screen terminal Pomodoro timer")]
struct Args {
    /// Work phase length in minutes
    #[arg(short, long, default_value_t = DEFAULT_WORK_MINUTES, value_parser = clap::value_parser!(u32).range(1..=60))]
    work: u32,
    /// Rest phase length in minutes
    #[arg(short, long, default_value_t = DEFAULT_REST_MINUTES, value_parser = clap::value_parser!(u32).range(1..=30))]
    rest: u32,
    /// Number of work/rest cycles
    #[arg(short, long, default_value_t = DEFAULT_CYCLES, value_parser = clap::value_parser!(u32).range(1..=12))]
    cycles: u32,
    /// Disable the phase chimes
    #[arg(long)]
    no_sound: bool,
    /// Disable desktop notifications
    #[arg(long)]
    no_notify: bool,
    /// Preference file holding the accent color
    #[arg(long)]
    prefs: Option<PathBuf>,
    /// Log file (filter with RUST_LOG)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn get_path(filename: &str) -> PathBuf {
    let mut path = PathBuf::from(".");
    path.push(DATA_DIR);
    path.push(filename);
    path
}

/// Logs go to a file because the terminal belongs to the UI. Logging is
/// skipped entirely when the file cannot be opened.
fn init_logging(path: &Path) {
    if let Some(dir) = path.parent() {
        let _ = fs::create_dir_all(dir);
    }
    let Ok(file) = fs::OpenOptions::new().create(true).append(true).open(path) else {
        return;
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_file.clone().unwrap_or_else(|| get_path("tomatick.log")));

    let prefs_path = args.prefs.clone().unwrap_or_else(|| get_path("prefs.json"));
    info!(prefs = %prefs_path.display(), work = args.work, rest = args.rest, cycles = args.cycles, "starting");

    let prefs = AccentPreference::new(Box::new(JsonFileStore::new(prefs_path)));
    let options = Options {
        work_minutes: args.work,
        rest_minutes: args.rest,
        cycles: args.cycles,
        notifications: !args.no_notify,
    };
    let mut app = App::new(options, prefs, tone::default_player(!args.no_sound));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("exiting");
    res
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui::render_ui(f, app))?;

        let now = Instant::now();
        let timeout = app
            .next_wakeup()
            .map(|at| at.saturating_duration_since(now).min(FRAME_RATE))
            .unwrap_or(FRAME_RATE);

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && app.handle_key(key, Instant::now()) {
                    return Ok(());
                }
            }
        }

        app.update(Instant::now());
    }
}
