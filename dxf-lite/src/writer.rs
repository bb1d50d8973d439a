//! Écriture DXF (paires code de groupe / valeur)
//!
//! Structure produite, toujours dans cet ordre :
//! - section HEADER (`$ACADVER`, `$INSUNITS`, `$EXTMIN`, `$EXTMAX`)
//! - section ENTITIES (une LWPOLYLINE par polyligne)
//! - marqueur `EOF`
//!
//! Le document entier est validé avant l'écriture du premier octet.

use std::io::Write;

use crate::types::{Document, Entity, Header, LwPolyline};
use crate::DxfError;

/// Caractères interdits dans un nom de calque DXF
const FORBIDDEN_LAYER_CHARS: &[char] = &['<', '>', '/', '\\', '"', ':', ';', '?', '*', '|', '=', '`'];

/// Version DXF déclarée dans `$ACADVER` (AutoCAD 2000)
pub const ACAD_VERSION: &str = "AC1015";

/// Écrit un document complet
pub fn write_document<W: Write>(doc: &Document, writer: &mut W) -> Result<(), DxfError> {
    validate(doc)?;

    write_header(writer, &doc.header)?;

    write_pair(writer, 0, "SECTION")?;
    write_pair(writer, 2, "ENTITIES")?;
    for entity in &doc.entities {
        match entity {
            Entity::LwPolyline(polyline) => write_lwpolyline(writer, polyline)?,
        }
    }
    write_pair(writer, 0, "ENDSEC")?;

    write_pair(writer, 0, "EOF")?;
    writer.flush()?;

    Ok(())
}

/// Sérialise un document en texte
pub fn to_string(doc: &Document) -> Result<String, DxfError> {
    let mut buf = Vec::with_capacity(256 + doc.entities.len() * 128);
    write_document(doc, &mut buf)?;
    // Seules des &str sont écrites: le buffer est de l'UTF-8 valide
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Vérifie chaque entité, sans rien écrire
pub fn validate(doc: &Document) -> Result<(), DxfError> {
    for (index, entity) in doc.entities.iter().enumerate() {
        match entity {
            Entity::LwPolyline(polyline) => validate_lwpolyline(index, polyline)?,
        }
    }

    if let Some(ext) = &doc.header.extents {
        let finite = [ext.min.0, ext.min.1, ext.max.0, ext.max.1]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(DxfError::InvalidHeader {
                name: "$EXTMIN/$EXTMAX",
                reason: "non-finite drawing extents".to_string(),
            });
        }
    }

    Ok(())
}

fn validate_lwpolyline(index: usize, polyline: &LwPolyline) -> Result<(), DxfError> {
    if !is_valid_layer_name(&polyline.layer) {
        return Err(DxfError::InvalidLayer {
            index,
            layer: polyline.layer.clone(),
        });
    }

    if !polyline.color.is_valid() {
        return Err(DxfError::InvalidColor {
            index,
            color: polyline.color.0,
        });
    }

    if polyline.vertices.len() < 2 {
        return Err(DxfError::invalid_geometry(
            index,
            format!(
                "a polyline needs at least 2 vertices, got {}",
                polyline.vertices.len()
            ),
        ));
    }

    if let Some(pos) = polyline
        .vertices
        .iter()
        .position(|(x, y)| !x.is_finite() || !y.is_finite())
    {
        return Err(DxfError::invalid_geometry(
            index,
            format!("vertex {} has a non-finite coordinate", pos),
        ));
    }

    Ok(())
}

/// Un nom de calque est non vide, sur une ligne, sans caractère réservé
/// ni espace en bordure (la lecture supprime les espaces autour des valeurs)
pub fn is_valid_layer_name(name: &str) -> bool {
    !name.trim().is_empty()
        && name.trim() == name
        && !name
            .chars()
            .any(|c| c.is_control() || FORBIDDEN_LAYER_CHARS.contains(&c))
}

fn write_header<W: Write>(writer: &mut W, header: &Header) -> Result<(), DxfError> {
    write_pair(writer, 0, "SECTION")?;
    write_pair(writer, 2, "HEADER")?;

    // LWPOLYLINE n'existe qu'à partir de R2000
    write_pair(writer, 9, "$ACADVER")?;
    write_pair(writer, 1, ACAD_VERSION)?;

    write_pair(writer, 9, "$INSUNITS")?;
    write_pair(writer, 70, header.units.code())?;

    if let Some(ext) = &header.extents {
        write_pair(writer, 9, "$EXTMIN")?;
        write_pair(writer, 10, format_coord(ext.min.0))?;
        write_pair(writer, 20, format_coord(ext.min.1))?;
        write_pair(writer, 9, "$EXTMAX")?;
        write_pair(writer, 10, format_coord(ext.max.0))?;
        write_pair(writer, 20, format_coord(ext.max.1))?;
    }

    write_pair(writer, 0, "ENDSEC")?;
    Ok(())
}

fn write_lwpolyline<W: Write>(writer: &mut W, polyline: &LwPolyline) -> Result<(), DxfError> {
    write_pair(writer, 0, "LWPOLYLINE")?;
    write_pair(writer, 8, &polyline.layer)?;
    write_pair(writer, 62, polyline.color.0)?;
    write_pair(writer, 90, polyline.vertices.len())?;
    write_pair(writer, 70, if polyline.closed { 1 } else { 0 })?;

    for &(x, y) in &polyline.vertices {
        write_pair(writer, 10, format_coord(x))?;
        write_pair(writer, 20, format_coord(y))?;
    }

    Ok(())
}

/// Écrit une paire code de groupe / valeur
#[inline]
fn write_pair<W: Write>(
    writer: &mut W,
    code: u16,
    value: impl std::fmt::Display,
) -> Result<(), DxfError> {
    write!(writer, "{}\n{}\n", code, value)?;
    Ok(())
}

/// Formate une coordonnée en précision complète (aller-retour exact, sans exposant)
fn format_coord(value: f64) -> String {
    format!("{}", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AciColor, Extents, Units};

    fn centerline() -> LwPolyline {
        LwPolyline::open(
            "ROAD_CENTERLINE",
            AciColor::RED,
            vec![(569800.0, 886000.0), (569850.0, 885950.0)],
        )
    }

    #[test]
    fn test_empty_document_is_well_formed() {
        let dxf = to_string(&Document::default()).unwrap();
        assert_eq!(
            dxf,
            "0\nSECTION\n2\nHEADER\n9\n$ACADVER\n1\nAC1015\n9\n$INSUNITS\n70\n0\n0\nENDSEC\n\
             0\nSECTION\n2\nENTITIES\n0\nENDSEC\n0\nEOF\n"
        );
    }

    #[test]
    fn test_lwpolyline_tags() {
        let doc = Document::new(Header::default(), vec![centerline().into()]);
        let dxf = to_string(&doc).unwrap();

        assert!(dxf.contains(
            "0\nLWPOLYLINE\n8\nROAD_CENTERLINE\n62\n1\n90\n2\n70\n0\n\
             10\n569800\n20\n886000\n10\n569850\n20\n885950\n0\nENDSEC\n"
        ));
    }

    #[test]
    fn test_closed_flag() {
        let mut polyline = centerline();
        polyline.closed = true;
        let doc = Document::new(Header::default(), vec![polyline.into()]);
        let dxf = to_string(&doc).unwrap();
        assert!(dxf.contains("90\n2\n70\n1\n"));
    }

    #[test]
    fn test_full_precision_coordinates() {
        let polyline = LwPolyline::open("L", AciColor::BLUE, vec![(0.1, -2.5), (1e-7, 123456.789)]);
        let doc = Document::new(Header::default(), vec![polyline.into()]);
        let dxf = to_string(&doc).unwrap();
        assert!(dxf.contains("10\n0.1\n20\n-2.5\n"));
        assert!(dxf.contains("10\n0.0000001\n20\n123456.789\n"));
    }

    #[test]
    fn test_header_units_and_extents() {
        let header = Header {
            units: Units::Feet,
            extents: Some(Extents {
                min: (1.0, 2.0),
                max: (3.5, 4.0),
            }),
        };
        let dxf = to_string(&Document::new(header, vec![])).unwrap();
        assert!(dxf.contains("9\n$INSUNITS\n70\n2\n"));
        assert!(dxf.contains("9\n$EXTMIN\n10\n1\n20\n2\n9\n$EXTMAX\n10\n3.5\n20\n4\n"));
    }

    #[test]
    fn test_single_vertex_rejected() {
        let polyline = LwPolyline::open("ROAD_CURB", AciColor::BLUE, vec![(1.0, 1.0)]);
        let doc = Document::new(Header::default(), vec![centerline().into(), polyline.into()]);

        let mut buf = Vec::new();
        let err = write_document(&doc, &mut buf).unwrap_err();
        assert!(matches!(err, DxfError::InvalidGeometry { index: 1, .. }));
        assert!(buf.is_empty(), "nothing may be written on failure");
    }

    #[test]
    fn test_non_finite_rejected() {
        let polyline = LwPolyline::open("L", AciColor::RED, vec![(1.0, 1.0), (f64::NAN, 2.0)]);
        let doc = Document::new(Header::default(), vec![polyline.into()]);
        assert!(matches!(
            to_string(&doc),
            Err(DxfError::InvalidGeometry { index: 0, .. })
        ));
    }

    #[test]
    fn test_layer_names() {
        assert!(is_valid_layer_name("ROAD_CURB"));
        assert!(is_valid_layer_name("Voirie bordure"));
        assert!(!is_valid_layer_name(""));
        assert!(!is_valid_layer_name("   "));
        assert!(!is_valid_layer_name("A/B"));
        assert!(!is_valid_layer_name("line\nbreak"));
        assert!(!is_valid_layer_name(" SIDEWALK "));
        assert!(!is_valid_layer_name("SIDEWALK\t"));

        let polyline = LwPolyline::open("BAD:NAME", AciColor::RED, vec![(0.0, 0.0), (1.0, 1.0)]);
        let doc = Document::new(Header::default(), vec![polyline.into()]);
        assert!(matches!(to_string(&doc), Err(DxfError::InvalidLayer { index: 0, .. })));
    }

    #[test]
    fn test_padded_layer_rejected() {
        let polyline = LwPolyline::open(" SIDEWALK ", AciColor::WHITE, vec![(0.0, 0.0), (1.0, 1.0)]);
        let doc = Document::new(Header::default(), vec![polyline.into()]);

        let mut buf = Vec::new();
        assert!(matches!(
            write_document(&doc, &mut buf),
            Err(DxfError::InvalidLayer { index: 0, .. })
        ));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_invalid_color_rejected() {
        let polyline = LwPolyline::open("L", AciColor(300), vec![(0.0, 0.0), (1.0, 1.0)]);
        let doc = Document::new(Header::default(), vec![polyline.into()]);
        assert!(matches!(
            to_string(&doc),
            Err(DxfError::InvalidColor { color: 300, .. })
        ));
    }
}
