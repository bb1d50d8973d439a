//! Définition et implémentation des commandes CLI
//!
//! - `export-dxf`: features → DXF (coordonnées natives)
//! - `overlay`: features → GeoJSON reprojeté pour la carte
//! - `project` / `extent`: reprojection d'un point ou d'une emprise
//! - `panel`: rendu textuel du panneau des features
//! - `inspect`: lecture d'un fichier DXF
//! - `systems`: systèmes de référence enregistrés

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use geo::Coord;
use tracing::{info, warn};

use kaldic::export::{dxf, geojson};
use kaldic::panel;
use kaldic::report::{ExportFormat, ExportReport};
use kaldic::{AppStore, Extent, FeatureCollection, Reprojector, Settings};

#[derive(Subcommand)]
pub enum Commands {
    /// Export features to a DXF file (native coordinates)
    ExportDxf {
        /// Features JSON file (default: embedded demo features)
        #[arg(short, long)]
        features: Option<PathBuf>,

        /// Output file (default: <output-dir>/kaldic_demo.dxf)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output directory (défaut : env KALDIC_OUTPUT_DIR / .)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Save the export report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Export the map overlay as GeoJSON in the display reference system
    Overlay {
        /// Features JSON file (default: embedded demo features)
        #[arg(short, long)]
        features: Option<PathBuf>,

        /// Output file (default: <output-dir>/kaldic_overlay.geojson)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output directory (défaut : env KALDIC_OUTPUT_DIR / .)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Display reference system (défaut : env KALDIC_DISPLAY_CRS / EPSG:3857)
        #[arg(long)]
        crs: Option<String>,

        /// Save the export report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Reproject a single point
    Project {
        #[arg(allow_negative_numbers = true)]
        x: f64,

        #[arg(allow_negative_numbers = true)]
        y: f64,

        /// Source reference system (défaut : env KALDIC_SOURCE_CRS / EPSG:6405)
        #[arg(long)]
        from: Option<String>,

        /// Target reference system (défaut : env KALDIC_DISPLAY_CRS / EPSG:3857)
        #[arg(long)]
        to: Option<String>,
    },

    /// Reproject an extent "minx,miny,maxx,maxy" (default: demo orthomosaic extent)
    Extent {
        #[arg(allow_hyphen_values = true)]
        extent: Option<Extent>,

        /// Source reference system (défaut : env KALDIC_SOURCE_CRS / EPSG:6405)
        #[arg(long)]
        from: Option<String>,

        /// Target reference system (défaut : env KALDIC_DISPLAY_CRS / EPSG:3857)
        #[arg(long)]
        to: Option<String>,
    },

    /// Render the feature panel
    Panel {
        /// Features JSON file (default: embedded demo features)
        #[arg(short, long)]
        features: Option<PathBuf>,

        /// Feature id to mark as selected
        #[arg(long)]
        select: Option<String>,

        /// Render with the panel hidden
        #[arg(long)]
        hidden: bool,
    },

    /// Print the content of a DXF file
    Inspect {
        /// DXF file
        path: PathBuf,
    },

    /// List registered reference systems
    Systems,
}

/// Contexte partagé par les commandes
pub struct AppContext {
    pub settings: Settings,
    pub reprojector: Reprojector,
}

/// Features d'un fichier, ou features de démonstration
fn load_features(path: Option<&Path>) -> Result<FeatureCollection> {
    match path {
        Some(path) => FeatureCollection::load(path),
        None => FeatureCollection::demo(),
    }
}

/// Chemin de sortie: explicite, sinon dans le répertoire de sortie
fn resolve_output(output: Option<PathBuf>, output_dir: &Path, default_name: &str) -> Result<PathBuf> {
    let path = output.unwrap_or_else(|| output_dir.join(default_name));
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .context(format!("Failed to create output directory: {}", parent.display()))?;
    }
    Ok(path)
}

/// Affiche (et sauvegarde) le rapport, y compris en cas d'échec
fn finish_export(
    result: Result<ExportReport>,
    mut failed: ExportReport,
    report_path: Option<&Path>,
) -> Result<()> {
    let report = match result {
        Ok(report) => report,
        Err(e) => {
            failed.fail(format!("{:#}", e));
            failed.display();
            if let Some(path) = report_path {
                failed.save_to_file(path)?;
            }
            return Err(e);
        }
    };

    report.display();
    if let Some(path) = report_path {
        report.save_to_file(path)?;
        info!(path = %path.display(), "Report saved");
    }
    println!("{}", report.summary());
    Ok(())
}

/// Exécute la commande export-dxf
pub fn cmd_export_dxf(
    ctx: &AppContext,
    features: Option<&Path>,
    output: Option<PathBuf>,
    report_path: Option<&Path>,
) -> Result<()> {
    let collection = load_features(features)?;
    let output = resolve_output(output, &ctx.settings.output_dir, dxf::DEFAULT_FILE_NAME)?;

    info!(
        features = collection.len(),
        crs = %collection.crs,
        output = %output.display(),
        "Starting DXF export"
    );

    let mut failed = ExportReport::new(ExportFormat::Dxf, &output, &collection.crs, &collection.crs);
    failed.features = collection.len();

    let result = dxf::write_file(&collection, &ctx.reprojector, &output);
    finish_export(result, failed, report_path)
}

/// Exécute la commande overlay
pub fn cmd_overlay(
    ctx: &AppContext,
    features: Option<&Path>,
    output: Option<PathBuf>,
    report_path: Option<&Path>,
) -> Result<()> {
    let collection = load_features(features)?;
    let output = resolve_output(output, &ctx.settings.output_dir, "kaldic_overlay.geojson")?;
    let display_crs = &ctx.settings.display_crs;

    info!(
        features = collection.len(),
        from = %collection.crs,
        to = %display_crs,
        output = %output.display(),
        "Starting overlay export"
    );

    let mut failed = ExportReport::new(ExportFormat::GeoJson, &output, &collection.crs, display_crs);
    failed.features = collection.len();

    let result = geojson::export_overlay(&collection, &ctx.reprojector, display_crs, &output);
    finish_export(result, failed, report_path)
}

/// Exécute la commande project
pub fn cmd_project(ctx: &AppContext, x: f64, y: f64, from: Option<&str>, to: Option<&str>) -> Result<()> {
    let from = from.unwrap_or(&ctx.settings.source_crs);
    let to = to.unwrap_or(&ctx.settings.display_crs);

    let p = ctx
        .reprojector
        .project(Coord { x, y }, from, to)
        .context(format!("Cannot project ({}, {}) from {} to {}", x, y, from, to))?;

    println!("{} {}", p.x, p.y);
    Ok(())
}

/// Exécute la commande extent
pub fn cmd_extent(ctx: &AppContext, extent: Option<Extent>, from: Option<&str>, to: Option<&str>) -> Result<()> {
    let (extent, default_crs) = match extent {
        Some(extent) => (extent, ctx.settings.source_crs.clone()),
        None => {
            let demo = FeatureCollection::demo()?;
            let extent = demo.extent.context("Demo fixture has no extent")?;
            (extent, demo.crs)
        }
    };
    let from = from.unwrap_or(&default_crs);
    let to = to.unwrap_or(&ctx.settings.display_crs);

    let projected = ctx
        .reprojector
        .project_extent(extent, from, to)
        .context(format!("Cannot project extent {} from {} to {}", extent, from, to))?;

    println!("{}", projected);
    Ok(())
}

/// Exécute la commande panel
pub fn cmd_panel(ctx: &AppContext, features: Option<&Path>, select: Option<&str>, hidden: bool) -> Result<()> {
    let collection = load_features(features)?;
    let unit = ctx.reprojector.get(&collection.crs)?.unit;

    let mut store = AppStore::default();
    store.replace_features(collection.features)?;
    if let Some(id) = select {
        store.select(id)?;
    }
    if hidden {
        store.toggle_panel();
    }

    let text = panel::render(store.state(), unit);
    if text.is_empty() {
        warn!("Panel is hidden");
    }
    print!("{}", text);
    Ok(())
}

/// Exécute la commande inspect
pub fn cmd_inspect(path: &Path) -> Result<()> {
    let data = std::fs::read(path).context(format!("Cannot open {}", path.display()))?;
    let doc = dxf_lite::parse(&data).context(format!("Invalid DXF file: {}", path.display()))?;

    println!("File: {}", path.display());
    println!("Units: {:?}", doc.header.units);
    if let Some(ext) = doc.header.extents {
        println!("Extents: ({}, {}) - ({}, {})", ext.min.0, ext.min.1, ext.max.0, ext.max.1);
    }
    println!("Entities: {}", doc.entities.len());

    for (i, polyline) in doc.polylines().enumerate() {
        println!(
            "  #{} LWPOLYLINE layer={} color={} vertices={}{}",
            i,
            polyline.layer,
            polyline.color.0,
            polyline.vertices.len(),
            if polyline.closed { " closed" } else { "" }
        );
    }

    Ok(())
}

/// Exécute la commande systems
pub fn cmd_systems(ctx: &AppContext) -> Result<()> {
    for id in ctx.reprojector.ids() {
        let system = ctx.reprojector.get(id)?;
        println!("{}\t{}\t{}", system.id, system.unit.symbol(), system.name);
    }
    Ok(())
}
