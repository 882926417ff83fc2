//! PackLab CLI — inspect and exercise schema packs without a terminal UI.
//!
//! Commands:
//! - `check` — parse a schema pack and report lint issues
//! - `render` — build the UI tree and print its outline, optionally after a run
//! - `export` — run the bound action and write one table tab as CSV
//! - `derive-id` — compute a wizard strategy id from its four basics

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use packlab_core::table::write_csv;
use packlab_core::wizard::derive_id;
use packlab_core::{AppConfig, DemoCompute, PanelSchema, PanelScreen};

#[derive(Parser)]
#[command(
    name = "packlab",
    about = "PackLab CLI — schema-driven panels and strategy ids"
)]
struct Cli {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a schema pack and report lint issues.
    Check {
        /// Schema JSON file. The built-in backtest pack when omitted.
        schema: Option<PathBuf>,

        /// Exit with an error if any lint issue is found.
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
    /// Build the UI tree and print its outline.
    Render {
        /// Schema JSON file. The built-in backtest pack when omitted.
        schema: Option<PathBuf>,

        /// Trigger the bound run action with the demo compute first.
        #[arg(long, default_value_t = false)]
        run: bool,

        /// Override the demo compute seed.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Run the bound action and export one table tab as CSV.
    Export {
        /// Schema JSON file. The built-in backtest pack when omitted.
        schema: Option<PathBuf>,

        /// Result tab id to export.
        #[arg(long)]
        tab: String,

        /// Output file. Stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Override the demo compute seed.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Derive a wizard strategy id from its four basics.
    DeriveId {
        #[arg(long, default_value = "")]
        ticker: String,
        #[arg(long, default_value = "")]
        asset_type: String,
        #[arg(long, default_value = "")]
        horizon: String,
        #[arg(long, default_value = "")]
        cadence: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => AppConfig::default(),
    };

    match cli.command {
        Commands::Check { schema, strict } => run_check(schema.as_deref(), strict),
        Commands::Render { schema, run, seed } => run_render(&config, schema.as_deref(), run, seed),
        Commands::Export {
            schema,
            tab,
            out,
            seed,
        } => run_export(&config, schema.as_deref(), &tab, out.as_deref(), seed),
        Commands::DeriveId {
            ticker,
            asset_type,
            horizon,
            cadence,
        } => match derive_id(&ticker, &asset_type, &horizon, &cadence) {
            Some(id) => {
                println!("{id}");
                Ok(())
            }
            None => bail!("all four of --ticker, --asset-type, --horizon and --cadence are required"),
        },
    }
}

fn load_schema(path: Option<&Path>) -> Result<PanelSchema> {
    match path {
        Some(path) => PanelSchema::load(path).with_context(|| format!("loading schema {}", path.display())),
        None => Ok(PanelSchema::builtin()?),
    }
}

fn run_check(path: Option<&Path>, strict: bool) -> Result<()> {
    let schema = load_schema(path)?;
    println!("Pack:        {} v{}", schema.pack, schema.version);
    println!("Fingerprint: {}", schema.fingerprint());
    println!(
        "Panels:      {} ({} fields, {} tabs, {} actions)",
        schema.panels.len(),
        schema.config_panel().map_or(0, |p| p.fields.len()),
        schema.results_panel().map_or(0, |p| p.tabs.len()),
        schema.all_actions().count()
    );

    let issues = schema.issues();
    if issues.is_empty() {
        println!("No issues.");
        return Ok(());
    }
    println!("{} issue(s):", issues.len());
    for issue in &issues {
        println!("  - {issue}");
    }
    if strict {
        bail!("{} lint issue(s) in strict mode", issues.len());
    }
    Ok(())
}

/// Build a screen, optionally running the bound action once.
fn build_screen(config: &AppConfig, schema: PanelSchema, run: bool, seed: Option<u64>) -> Result<PanelScreen> {
    let mut screen = PanelScreen::new(schema, config.theme.clone());
    if !run {
        return Ok(screen);
    }
    let action = &config.panels.run_action;
    if !screen.bind_run(action) {
        bail!("schema has no '{action}' action to run");
    }
    let mut settings = config.compute.clone();
    if let Some(seed) = seed {
        settings.seed = seed;
    }
    let applied = screen
        .run_with(action, &DemoCompute::new(settings))?
        .with_context(|| format!("action '{action}' did not start a run"))?;
    tracing::info!(
        ticket = applied.ticket,
        charts = applied.charts,
        tables = applied.tables.len(),
        "run applied"
    );
    Ok(screen)
}

fn run_render(config: &AppConfig, path: Option<&Path>, run: bool, seed: Option<u64>) -> Result<()> {
    let screen = build_screen(config, load_schema(path)?, run, seed)?;
    print!("{}", screen.root().outline());
    let summary = screen.summary();
    println!();
    println!(
        "config panel: {}  results panel: {}  actions: {}",
        summary.config_panel.as_deref().unwrap_or("-"),
        summary.results_panel.as_deref().unwrap_or("-"),
        summary.actions.join(", ")
    );
    Ok(())
}

fn run_export(
    config: &AppConfig,
    path: Option<&Path>,
    tab: &str,
    out: Option<&Path>,
    seed: Option<u64>,
) -> Result<()> {
    let screen = build_screen(config, load_schema(path)?, true, seed)?;
    let snapshot = screen.export_table(tab)?;
    match out {
        Some(out) => {
            let file = File::create(out).with_context(|| format!("creating {}", out.display()))?;
            write_csv(&snapshot, file)?;
            eprintln!("Wrote {} rows to {}", snapshot.rows.len(), out.display());
        }
        None => write_csv(&snapshot, io::stdout().lock())?,
    }
    Ok(())
}
