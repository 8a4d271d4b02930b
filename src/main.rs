mod app;
mod board;
mod cli;
mod comments;
mod config;
mod event;
mod model;
mod store;
mod ui;

use std::io;
use std::panic;
use std::sync::Arc;

use anyhow::{bail, Result};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

use app::{Action, App};
use store::rest::RestStore;
use store::ResourceStore;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("comment") => return cli::handle_comment(&args[1..]).await,
        Some("help") | Some("--help") | Some("-h") => {
            cli::print_help();
            return Ok(());
        }
        Some(other) => {
            cli::print_help();
            bail!("Unknown command: {other}");
        }
        None => {}
    }

    // Load config
    let config = config::load_config()?;
    let Some(server) = &config.server else {
        bail!("No server configured. Set [server] base_url in ~/.triage/config.toml");
    };
    let store: Arc<dyn ResourceStore> = Arc::new(RestStore::new(
        server.base_url.clone(),
        server.api_token.clone(),
    ));

    // Set up action channel
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();

    // Create app
    let mut app = App::new(&config, store, action_tx.clone());

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.hide_cursor()?;

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    // Spawn event reader
    let event_tx = action_tx.clone();
    tokio::spawn(async move {
        event::run_event_loop(event_tx).await;
    });

    // Initial fetch
    app.refresh_items();

    // Main loop
    loop {
        // Render
        terminal.draw(|f| ui::render(f, &app))?;

        // Wait for action
        if let Some(action) = action_rx.recv().await {
            app.update(action).await;
            if app.should_quit {
                break;
            }
        } else {
            break;
        }
    }

    // Restore terminal
    terminal.show_cursor()?;
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    Ok(())
}
