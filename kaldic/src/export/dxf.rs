//! Export des features en DXF (une LWPOLYLINE par feature)
//!
//! Les coordonnées restent dans le système natif de la collection;
//! l'unité du système donne `$INSUNITS`.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use dxf_lite::{Document, Header, LwPolyline};
use tracing::{debug, info};

use crate::feature::{Feature, FeatureCollection};
use crate::report::{ExportFormat, ExportReport};
use crate::reproject_lite::Reprojector;

/// Nom de fichier par défaut
pub const DEFAULT_FILE_NAME: &str = "kaldic_demo.dxf";

/// Convertit une feature en polyligne DXF ouverte
fn to_polyline(feature: &Feature) -> LwPolyline {
    let vertices = feature.geometry.coords().map(|c| (c.x, c.y)).collect();
    LwPolyline::open(feature.category.label(), feature.category.aci_color(), vertices)
}

/// Construit le document DXF d'une collection (ordre des features conservé)
pub fn to_document(collection: &FeatureCollection, reprojector: &Reprojector) -> Result<Document> {
    let system = reprojector
        .get(&collection.crs)
        .context(format!("Cannot export features in {}", collection.crs))?;

    let header = Header {
        units: system.unit.dxf_units(),
        extents: collection.native_extent().map(Into::into),
    };

    let entities = collection
        .features
        .iter()
        .map(|f| to_polyline(f).into())
        .collect();

    Ok(Document::new(header, entities))
}

/// Sérialise une collection en texte DXF
pub fn serialize(collection: &FeatureCollection, reprojector: &Reprojector) -> Result<String> {
    let document = to_document(collection, reprojector)?;
    let text = dxf_lite::to_string(&document).context("Failed to serialize DXF document")?;
    debug!(entities = document.entities.len(), bytes = text.len(), "Serialized DXF");
    Ok(text)
}

/// Écrit le DXF d'une collection; aucun fichier n'est créé en cas d'erreur
pub fn write_file(collection: &FeatureCollection, reprojector: &Reprojector, path: &Path) -> Result<ExportReport> {
    let started_at = Instant::now();
    let mut report = ExportReport::new(ExportFormat::Dxf, path, &collection.crs, &collection.crs);
    report.features = collection.len();

    let text = serialize(collection, reprojector)?;

    std::fs::write(path, &text).context(format!("Failed to write DXF file: {}", path.display()))?;

    for feature in &collection.features {
        report.record_entity(feature.category.label(), feature.point_count());
    }
    report.record_document(text.as_bytes());
    report.set_duration(started_at.elapsed());

    info!(
        path = %path.display(),
        entities = report.entities,
        bytes = report.bytes,
        "DXF export complete"
    );

    Ok(report)
}
