//! PackLab TUI — schema-driven panels and the strategy wizard in a terminal.
//!
//! Panels:
//! 1. Form — the schema's config fields
//! 2. Results — tabbed chart and table views
//! 3. Wizard — five-step strategy builder
//! 4. Help — keyboard shortcuts

mod app;
mod input;
mod theme;
mod ui;
mod worker;

use std::fs::{self, File};
use std::io::{self, stdout};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing_subscriber::EnvFilter;

use packlab_core::wizard::WizardCatalog;
use packlab_core::{AppConfig, DemoCompute, PanelSchema, PanelScreen, Wizard};

use crate::app::{AppState, ErrorCategory};
use crate::worker::WorkerCommand;

fn main() -> Result<()> {
    // Install a panic hook that restores the terminal before printing the panic.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);
        default_hook(info);
    }));

    init_logging();

    // Paths
    let config_path = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("packlab")
        .join("config.toml");
    let config = AppConfig::load_or_default(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    let schema = match std::env::args().nth(1) {
        Some(path) => PanelSchema::load(Path::new(&path)).with_context(|| format!("loading schema {path}"))?,
        None => PanelSchema::builtin()?,
    };
    let issues = schema.issues();
    for issue in &issues {
        tracing::warn!(%issue, "schema issue");
    }

    let (catalog, catalog_error) = match config.wizard.load_catalog() {
        Ok(catalog) => (catalog, None),
        Err(e) => (WizardCatalog::builtin(), Some(e.to_string())),
    };

    // Worker channels
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (resp_tx, resp_rx) = mpsc::channel();
    let worker_handle = worker::spawn_worker(
        cmd_rx,
        resp_tx,
        Box::new(DemoCompute::new(config.compute.clone())),
    )?;

    // Build app state
    let screen = PanelScreen::new(schema, config.theme.clone());
    let wizard = Wizard::new(catalog, config.wizard_settings());
    let mut app = AppState::new(screen, wizard, config, cmd_tx.clone(), resp_rx);
    for issue in issues {
        app.push_error(ErrorCategory::Schema, issue.to_string(), "schema lint".into());
    }
    if let Some(e) = catalog_error {
        app.push_error(ErrorCategory::Wizard, e, "catalog; using built-in".into());
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut app);

    // Shutdown worker
    let _ = cmd_tx.send(WorkerCommand::Shutdown);
    let _ = worker_handle.join();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
) -> Result<()> {
    loop {
        // 1. Render
        terminal.draw(|f| ui::draw(f, app))?;

        // 2. Drain worker responses (non-blocking)
        while let Ok(resp) = app.worker_rx.try_recv() {
            app.handle_worker_response(resp);
        }

        // 3. Fire the wizard's post-save navigation when due
        app.tick_wizard(Instant::now());

        // 4. Poll for input events (50ms timeout for ~20 FPS tick)
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                input::handle_key(app, key);
            }
        }

        // 5. Check quit
        if !app.running {
            break;
        }
    }
    Ok(())
}

/// Log to `<cache_dir>/packlab/packlab-tui.log`; the terminal belongs to the UI.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let dir = dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("packlab");
    let file = fs::create_dir_all(&dir).and_then(|()| File::create(dir.join("packlab-tui.log")));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_ansi(false);
    let _ = match file {
        Ok(file) => builder.with_writer(Mutex::new(file)).try_init(),
        Err(_) => builder.with_writer(io::sink).try_init(),
    };
}
