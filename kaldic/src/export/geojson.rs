//! Overlay GeoJSON pour la carte (geozero, streaming)
//!
//! Chaque feature est reprojetée vers le système d'affichage
//! (EPSG:3857 par défaut) avec son style de trait.

use std::io::Write;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use geo::{Geometry, LineString};
use geozero::geojson::GeoJsonWriter;
use geozero::GeozeroGeometry;
use tracing::info;

use crate::feature::{Feature, FeatureCollection};
use crate::report::{ExportFormat, ExportReport};
use crate::reproject_lite::{epsg_code, normalize_id, Reprojector};

/// Système d'affichage par défaut
pub const DEFAULT_DISPLAY_CRS: &str = "EPSG:3857";

/// Sérialise l'overlay en texte GeoJSON
///
/// Toutes les features sont reprojetées avant l'écriture du premier octet.
pub fn to_string(collection: &FeatureCollection, reprojector: &Reprojector, display_crs: &str) -> Result<String> {
    let lines = collection
        .features
        .iter()
        .map(|f| {
            reprojector
                .project_line(f.geometry.line(), &collection.crs, display_crs)
                .context(format!("Failed to reproject feature {}", f.id))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut buf = Vec::with_capacity(256 + collection.len() * 512);
    write_overlay(&mut buf, collection.features.iter().zip(&lines), display_crs)?;
    String::from_utf8(buf).context("GeoJSON output is not valid UTF-8")
}

/// Écrit l'overlay dans un fichier; aucun fichier n'est créé en cas d'erreur
pub fn export_overlay(
    collection: &FeatureCollection,
    reprojector: &Reprojector,
    display_crs: &str,
    output_path: &Path,
) -> Result<ExportReport> {
    let started_at = Instant::now();
    let display_crs = normalize_id(display_crs);
    let mut report = ExportReport::new(ExportFormat::GeoJson, output_path, &collection.crs, &display_crs);
    report.features = collection.len();

    let text = to_string(collection, reprojector, &display_crs)?;
    std::fs::write(output_path, &text)
        .context(format!("Failed to create file: {}", output_path.display()))?;

    for feature in &collection.features {
        report.record_entity(feature.category.label(), feature.point_count());
    }
    report.record_document(text.as_bytes());
    report.set_duration(started_at.elapsed());

    info!(
        path = %output_path.display(),
        crs = %display_crs,
        features = report.entities,
        "Overlay export complete"
    );

    Ok(report)
}

fn write_overlay<'a, W, I>(writer: &mut W, features: I, crs: &str) -> Result<()>
where
    W: Write,
    I: Iterator<Item = (&'a Feature, &'a LineString<f64>)>,
{
    // Header FeatureCollection (membre crs seulement pour un code EPSG)
    write!(writer, r#"{{"type":"FeatureCollection","#)?;
    if let Some(code) = epsg_code(crs) {
        write!(
            writer,
            r#""crs":{{"type":"name","properties":{{"name":"urn:ogc:def:crs:EPSG::{}"}}}},"#,
            code
        )?;
    }
    write!(writer, r#""features":["#)?;

    for (i, (feature, line)) in features.enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        write_feature(writer, feature, line)?;
    }

    write!(writer, "]}}")?;
    writer.flush()?;
    Ok(())
}

/// Écrit une feature (géométrie déjà reprojetée)
fn write_feature<W: Write>(writer: &mut W, feature: &Feature, line: &LineString<f64>) -> Result<()> {
    write!(writer, r#"{{"type":"Feature","id":"{}","#, escape_json(&feature.id))?;

    write!(writer, r#""geometry":"#)?;
    let mut geom_buf = Vec::new();
    let mut geom_writer = GeoJsonWriter::new(&mut geom_buf);
    Geometry::LineString(line.clone()).process_geom(&mut geom_writer)?;
    writer.write_all(&geom_buf)?;

    let stroke = feature.category.stroke();
    write!(
        writer,
        r#","properties":{{"id":"{}","layer":"{}","name":"{}","length":{},"detected_by":"{}","stroke":"{}","stroke-width":{}}}}}"#,
        escape_json(&feature.id),
        escape_json(feature.category.label()),
        escape_json(&feature.properties.name),
        json_number(feature.properties.length),
        escape_json(&feature.properties.detected_by),
        stroke.color,
        stroke.width
    )?;

    Ok(())
}

/// Nombre JSON (`null` si non fini)
fn json_number(value: f64) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        "null".to_string()
    }
}

/// Échappe une chaîne pour JSON
fn escape_json(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if c.is_control() => {
                result.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => result.push(c),
        }
    }
    result
}
