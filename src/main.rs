use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use log::info;
use openfield::{
    app::{Action, App},
    app_dirs::AppDirs,
    clock::{Clock, SystemClock},
    config::{ConfigStore, FileConfigStore},
    runtime::{CrosstermEventSource, FixedTicker, Runner},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, File, OpenOptions},
    io::{self, stdin},
    path::{Path, PathBuf},
    time::Duration,
};

/// open field test timer: hold a zone key while the animal is in it
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Times an Open Field Test. Mark which arena zone (corner, lateral, center) the animal occupies while the countdown runs, then generate and export a per-zone occupancy report."
)]
pub struct Cli {
    /// animal identifier to pre-fill
    #[clap(short = 'a', long)]
    animal_id: Option<String>,

    /// test duration in seconds (defaults to the last used duration, 300 initially)
    #[clap(short = 'd', long)]
    duration: Option<u32>,

    /// polling interval in milliseconds for the countdown and live zone times
    #[clap(short = 't', long)]
    tick_ms: Option<u64>,

    /// file to export the report to (defaults to a timestamped file in the reports directory)
    #[clap(short = 'o', long)]
    output: Option<PathBuf>,
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Log to a file only when RUST_LOG is set; the terminal belongs to the TUI
fn init_logging(path: &Path) -> Result<(), Box<dyn Error>> {
    if std::env::var_os("RUST_LOG").is_none() {
        return Ok(());
    }
    let file = open_log_file(path)?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()?;
    Ok(())
}

fn build_app(cli: &Cli, store: Box<dyn ConfigStore>) -> App<SystemClock> {
    let mut app = App::new(SystemClock::new(), store);
    if let Some(id) = &cli.animal_id {
        app = app.with_animal_id(id.clone());
    }
    if let Some(secs) = cli.duration {
        app = app.with_duration(secs);
    }
    if let Some(path) = &cli.output {
        app = app.with_output(path.clone());
    }
    app
}

/// CLI tick overrides the configured one for this run only
fn tick_interval(cli: &Cli, app: &App<SystemClock>) -> Duration {
    Duration::from_millis(cli.tick_ms.unwrap_or(app.config.tick_rate_ms).max(1))
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let log_path = AppDirs::log_path();
    if let Err(e) = init_logging(&log_path) {
        eprintln!("openfield: not logging to {}: {e}", log_path.display());
    }

    let mut app = build_app(&cli, Box::new(FileConfigStore::default()));
    let tick = tick_interval(&cli, &app);
    info!("openfield starting, tick {}ms", tick.as_millis());

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app, tick);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, C: Clock>(
    terminal: &mut Terminal<B>,
    app: &mut App<C>,
    tick: Duration,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::new(tick));

    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        if app.handle_event(runner.step()) == Action::Quit {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use openfield::config::{Config, MemoryConfigStore};

    fn memory_store() -> Box<dyn ConfigStore> {
        Box::new(MemoryConfigStore::new(Config::default()))
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["openfield"]);

        assert_eq!(cli.animal_id, None);
        assert_eq!(cli.duration, None);
        assert_eq!(cli.tick_ms, None);
        assert_eq!(cli.output, None);
    }

    #[test]
    fn test_cli_animal_id() {
        let cli = Cli::parse_from(["openfield", "-a", "A1"]);
        assert_eq!(cli.animal_id.as_deref(), Some("A1"));

        let cli = Cli::parse_from(["openfield", "--animal-id", "rat-7"]);
        assert_eq!(cli.animal_id.as_deref(), Some("rat-7"));
    }

    #[test]
    fn test_cli_duration() {
        let cli = Cli::parse_from(["openfield", "-d", "600"]);
        assert_eq!(cli.duration, Some(600));

        let cli = Cli::parse_from(["openfield", "--duration", "120"]);
        assert_eq!(cli.duration, Some(120));
    }

    #[test]
    fn test_cli_rejects_negative_duration() {
        assert!(Cli::try_parse_from(["openfield", "-d", "-5"]).is_err());
        assert!(Cli::try_parse_from(["openfield", "-d", "abc"]).is_err());
    }

    #[test]
    fn test_cli_tick_and_output() {
        let cli = Cli::parse_from(["openfield", "-t", "50", "-o", "/tmp/r.txt"]);
        assert_eq!(cli.tick_ms, Some(50));
        assert_eq!(cli.output, Some(PathBuf::from("/tmp/r.txt")));
    }

    #[test]
    fn test_build_app_applies_overrides() {
        let cli = Cli::parse_from(["openfield", "-a", "A1", "-d", "60", "-t", "250"]);
        let app = build_app(&cli, memory_store());
        assert_eq!(app.animal_id_input, "A1");
        assert_eq!(app.duration_input, "60");
        assert_eq!(tick_interval(&cli, &app), Duration::from_millis(250));
        assert_eq!(app.config.tick_rate_ms, 100);
        assert_eq!(app.output_path, None);
    }

    #[test]
    fn test_log_file_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, b"").unwrap();

        assert!(open_log_file(&blocker.join("openfield.log")).is_err());
        assert!(open_log_file(&dir.path().join("logs").join("openfield.log")).is_ok());
    }

    #[test]
    fn test_build_app_uses_config_defaults() {
        let cli = Cli::parse_from(["openfield"]);
        let app = build_app(&cli, memory_store());
        assert_eq!(app.duration_input, "300");
        assert_eq!(tick_interval(&cli, &app), Duration::from_millis(100));
    }
}
