//! Point d'entrée CLI pour kaldic

use anyhow::Result;
use clap::Parser;
use tracing::{debug, Level};
use tracing_subscriber::{fmt, EnvFilter};

use kaldic::{Config, Settings};

// Charger .env au démarrage
fn load_env() {
    // Chercher .env dans le répertoire courant ou parent
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;

use cli::{AppContext, Commands};

/// Annoter une orthomosaïque: export DXF et overlay des features détectées
#[derive(Parser)]
#[command(name = "kaldic")]
#[command(author, version)]
#[command(about = "Exporter les features détectées sur une orthomosaïque vers DXF ou GeoJSON")]
#[command(long_about = "Outil d'annotation d'orthomosaïques aériennes.\n\nLes features (axes de voirie, bordures) restent dans leur système natif pour l'export DXF et sont reprojetées pour l'affichage.")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Preset (default/arizona) ou chemin vers une config JSON
    #[arg(long, default_value = "default", global = true)]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    // Configurer le logging
    init_logging(cli.verbose, cli.quiet);

    let config = Config::resolve(&cli.config)?;
    let reprojector = config.build_reprojector()?;
    debug!(config = %cli.config, systems = reprojector.ids().len(), "Reference systems ready");

    let mut ctx = AppContext {
        settings: Settings::from_env(),
        reprojector,
    };

    match cli.command {
        Commands::ExportDxf {
            features,
            output,
            output_dir,
            report,
        } => {
            ctx.settings.apply_overrides(None, None, output_dir);
            cli::cmd_export_dxf(&ctx, features.as_deref(), output, report.as_deref())?;
        }
        Commands::Overlay {
            features,
            output,
            output_dir,
            crs,
            report,
        } => {
            ctx.settings.apply_overrides(None, crs, output_dir);
            cli::cmd_overlay(&ctx, features.as_deref(), output, report.as_deref())?;
        }
        Commands::Project { x, y, from, to } => {
            cli::cmd_project(&ctx, x, y, from.as_deref(), to.as_deref())?;
        }
        Commands::Extent { extent, from, to } => {
            cli::cmd_extent(&ctx, extent, from.as_deref(), to.as_deref())?;
        }
        Commands::Panel {
            features,
            select,
            hidden,
        } => {
            cli::cmd_panel(&ctx, features.as_deref(), select.as_deref(), hidden)?;
        }
        Commands::Inspect { path } => {
            cli::cmd_inspect(&path)?;
        }
        Commands::Systems => {
            cli::cmd_systems(&ctx)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}
