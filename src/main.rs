use std::fs;
use std::io::stdout;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use tracing_subscriber::EnvFilter;

use flatsql::cli::{Cli, OutputFormat};
use flatsql::output::render;
use flatsql::session::{split_statements, Session};
use flatsql::storage::TableStore;
use flatsql::tui::{app::App, input::handle_events, ui::draw};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse_args();
    init_logging(cli.verbose);

    let store = TableStore::new().with_delimiter(cli.delimiter);
    let mut session = Session::new(&cli.root, store);
    if let Some(name) = &cli.database {
        session.use_database(name)?;
    }

    if let Some(query) = &cli.query {
        // Non-interactive mode
        run_statements(&mut session, query, cli.format)?;
    } else if let Some(script) = &cli.script {
        let text = fs::read_to_string(script)?;
        run_statements(&mut session, &text, cli.format)?;
    } else {
        // Interactive TUI mode
        run_tui(session)?;
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "flatsql=debug" } else { "flatsql=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_statements(
    session: &mut Session,
    text: &str,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    for stmt in split_statements(text) {
        let output = session.execute(&stmt)?;
        println!("{}", render(&output, format)?);
    }
    Ok(())
}

fn run_tui(session: Session) -> Result<(), Box<dyn std::error::Error>> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session);

    // Main loop
    loop {
        terminal.draw(|frame| draw(frame, &app))?;

        if handle_events(&mut app)? {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    Ok(())
}
