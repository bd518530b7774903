//! pagehost TUI - live project dashboard
//!
//! Shows the hosted project list with its current filter, and lets the
//! user search, toggle, delete and copy project URLs. Status messages come
//! from the shared message store and clear themselves after a delay.

mod app;
mod ui;

use std::fs::File;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEvent},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use pagehost_core::api::{ApiClient, normalize_api_base};
use pagehost_core::config::Config;
use pagehost_core::format::{Locale, copy_to_clipboard, project_url};
use pagehost_core::store::{MessageStore, ProjectStore};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tracing::{debug, info};

use app::{Action, App};

const TICK: Duration = Duration::from_millis(250);

#[derive(Parser)]
#[command(name = "pagehost-tui")]
#[command(about = "Live dashboard for pagehost projects")]
#[command(version)]
struct Args {
    /// API base URL, e.g. http://localhost:3000/api
    #[arg(long)]
    api_base: Option<String>,
}

struct Dashboard {
    store: ProjectStore<ApiClient>,
    messages: MessageStore,
    api_base: String,
    locale: Locale,
}

/// Logs go to a file so they never corrupt the screen
fn init_logging() -> anyhow::Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        return Ok(());
    }

    let dir = Config::config_dir()?;
    std::fs::create_dir_all(&dir)?;
    let file = File::create(dir.join("tui.log"))?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pagehost=info".parse()?),
        )
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_logging()?;

    let config = Config::load()?;
    let api_base = match args.api_base.as_deref() {
        Some(base) => normalize_api_base(base)?,
        None => config.resolved_api_base()?,
    };
    info!(api_base = %api_base, "Starting dashboard");

    let dashboard = Dashboard {
        store: ProjectStore::new(Arc::new(ApiClient::new(api_base.clone())?)),
        messages: MessageStore::from_config(&config.message),
        api_base,
        locale: config.display.locale,
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let result = run_app(&mut terminal, &dashboard).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Forward key presses from a blocking reader thread
fn spawn_input_reader() -> mpsc::UnboundedReceiver<KeyEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        loop {
            match event::poll(Duration::from_millis(100)) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) => {
                        if tx.send(key).is_err() {
                            return;
                        }
                    }
                    Ok(_) => {}
                    Err(_) => return,
                },
                Ok(false) => {
                    if tx.is_closed() {
                        return;
                    }
                }
                Err(_) => return,
            }
        }
    });
    rx
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    dashboard: &Dashboard,
) -> anyhow::Result<()> {
    let mut app = App::new();
    let mut keys = spawn_input_reader();
    let mut projects_rx = dashboard.store.subscribe();
    let mut messages_rx = dashboard.messages.subscribe();
    let mut tick = tokio::time::interval(TICK);

    let store = dashboard.store.clone();
    tokio::spawn(async move { store.fetch_projects(None).await });

    loop {
        let projects = dashboard.store.snapshot();
        let message = dashboard.messages.snapshot();
        app.clamp(projects.projects.len());

        terminal.draw(|frame| {
            ui::draw(
                frame,
                &app,
                &projects,
                &message,
                &dashboard.api_base,
                dashboard.locale,
            )
        })?;

        tokio::select! {
            key = keys.recv() => {
                let Some(key) = key else {
                    return Ok(());
                };
                match app.handle_key(key, &projects) {
                    Action::Quit => return Ok(()),
                    action => dispatch(action, dashboard),
                }
            }
            Ok(()) = projects_rx.changed() => {}
            Ok(()) = messages_rx.changed() => {}
            _ = tick.tick() => {}
        }
    }
}

/// Run a store action in the background and report its outcome
fn dispatch(action: Action, dashboard: &Dashboard) {
    debug!(?action, "Dispatching");
    let store = dashboard.store.clone();
    let messages = dashboard.messages.clone();

    match action {
        Action::None | Action::Quit => {}
        Action::Refresh => {
            tokio::spawn(async move { store.refresh_projects().await });
        }
        Action::Search(query) => {
            tokio::spawn(async move { store.search_projects(&query).await });
        }
        Action::ClearSearch => {
            tokio::spawn(async move { store.clear_search().await });
        }
        Action::Toggle(slug) => {
            tokio::spawn(async move {
                match store.toggle_project(&slug).await {
                    Ok(toggled) => messages.success(toggled.message),
                    Err(e) => messages.error(e.to_string()),
                }
            });
        }
        Action::Delete(slug) => {
            tokio::spawn(async move {
                match store.delete_project(&slug).await {
                    Ok(deleted) => messages.success(deleted.message),
                    Err(e) => messages.error(e.to_string()),
                }
            });
        }
        Action::CopyUrl(slug) => {
            let Some(project) = store.snapshot().find(&slug).cloned() else {
                return;
            };
            let url = project_url(&project, &dashboard.api_base);
            match copy_to_clipboard(&url) {
                Ok(()) => messages.success(format!("Copied {}", url)),
                Err(e) => messages.error(e.to_string()),
            }
        }
    }
}
