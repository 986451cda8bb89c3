use std::io;
use std::time::Duration;

use anyhow::{bail, Context};
use crossterm::event::KeyEventKind;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;

mod app;
mod auth;
mod config;
mod error;
mod models;
mod review;
mod sheets;
mod tui;

use app::App;
use config::Config;
use error::AppError;
use models::Verdict;
use tui::{draw, draw_fatal, handle_key_event};

enum Command {
    Interactive,
    Stats,
    Review(u32, Verdict),
}

fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    match args.get(1).map(String::as_str) {
        None => Ok(Command::Interactive),
        Some("--stats") => Ok(Command::Stats),
        Some(flag @ ("--approve" | "--reject")) => {
            let row: u32 = args
                .get(2)
                .with_context(|| format!("{flag} needs a sheet row number"))?
                .parse()
                .with_context(|| format!("{flag} needs a sheet row number"))?;
            let verdict = if flag == "--approve" {
                Verdict::Approve
            } else {
                Verdict::Reject
            };
            Ok(Command::Review(row, verdict))
        }
        Some(other) => bail!("unknown argument {other:?} (expected --stats, --approve ROW or --reject ROW)"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    let command = parse_args(&args)?;

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    if let Command::Interactive = command {
        return run_interactive(&config).await;
    }

    let mut app = App::new(&config)?;
    app.sign_in().await?;
    app.refresh_blocking().await?;

    match command {
        Command::Stats => {
            let stats = app.stats();
            println!(
                "{} entries: {} reviewed ({}%), {} approved, {} rejected, {} pending",
                stats.total,
                stats.reviewed,
                stats.percent_reviewed(),
                stats.approved,
                stats.rejected,
                stats.total - stats.reviewed
            );
        }
        Command::Review(row, verdict) => {
            app.review_blocking(row, verdict).await?;
            println!("Row {row} marked {}", verdict.decision().label().to_lowercase());
        }
        Command::Interactive => {}
    }

    Ok(())
}

async fn run_interactive(config: &Config) -> anyhow::Result<()> {
    // A missing client id blocks everything else
    let mut app = match App::new(config) {
        Ok(app) => app,
        Err(AppError::Config(message)) => {
            tracing::error!("Configuration error: {}", message);
            with_terminal(|terminal| show_fatal(terminal, &message))?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    // Pick up a token without a key press when one is already available
    if std::env::var_os(auth::ENV_ACCESS_TOKEN).is_some() {
        if let Err(e) = app.handle_action(tui::AppAction::SignIn).await {
            tracing::warn!("Automatic sign-in failed: {}", e);
        }
    }

    let mut terminal = setup_terminal()?;

    // Run the app
    let result = run_app(&mut terminal, &mut app).await;

    restore_terminal(&mut terminal)?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    Ok(())
}

fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()
}

fn with_terminal<F>(f: F) -> io::Result<()>
where
    F: FnOnce(&mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()>,
{
    let mut terminal = setup_terminal()?;
    let result = f(&mut terminal);
    restore_terminal(&mut terminal)?;
    result
}

fn show_fatal<B: Backend>(terminal: &mut Terminal<B>, message: &str) -> io::Result<()> {
    loop {
        terminal.draw(|frame| draw_fatal(frame, message))?;
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                return Ok(());
            }
        }
    }
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> error::Result<()> {
    loop {
        terminal.draw(|frame| draw(frame, app))?;

        // Poll for sign-in/sign-out changes
        app.poll_auth_change();

        // Poll for completed sheet loads
        app.poll_fetch_result();

        // Poll for completed review writes
        app.poll_review_results();

        // Poll for events with timeout to allow async operations
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(action) = handle_key_event(key, app.input_mode()) {
                        let should_quit = app.handle_action(action).await?;
                        if should_quit {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}
