//! Lecture DXF (sous-ensemble: en-tête, LWPOLYLINE)
//!
//! Les sections inconnues et les entités autres que LWPOLYLINE sont ignorées.

use std::borrow::Cow;
use std::iter::Peekable;
use std::str::Lines;

use encoding_rs::Encoding;
use memchr::memmem;
use tracing::debug;

use crate::types::{AciColor, Document, Entity, Extents, Header, LwPolyline, Units};
use crate::DxfError;

/// Parse un document DXF depuis des octets bruts
pub fn parse(data: &[u8]) -> Result<Document, DxfError> {
    let text = decode(data);
    parse_str(&text)
}

/// Parse un document DXF déjà décodé
pub fn parse_str(text: &str) -> Result<Document, DxfError> {
    let mut pairs = Pairs::new(text);
    let mut doc = Document::default();

    loop {
        let pair = pairs.require()?;
        match (pair.code, pair.value) {
            (0, "EOF") => break,
            (0, "SECTION") => {
                let name = pairs.require()?;
                if name.code != 2 {
                    return Err(DxfError::parse_error(
                        name.line,
                        format!("expected section name (code 2), got code {}", name.code),
                    ));
                }
                match name.value {
                    "HEADER" => doc.header = parse_header(&mut pairs)?,
                    "ENTITIES" => doc.entities = parse_entities(&mut pairs)?,
                    other => {
                        debug!(section = other, "Skipping DXF section");
                        skip_section(&mut pairs)?;
                    }
                }
            }
            (999, _) => continue,
            (code, value) => {
                return Err(DxfError::parse_error(
                    pair.line,
                    format!("expected SECTION or EOF, got {} {:?}", code, value),
                ))
            }
        }
    }

    Ok(doc)
}

/// Décode les octets: UTF-8 si valide, sinon selon `$DWGCODEPAGE`
fn decode(data: &[u8]) -> Cow<'_, str> {
    if let Ok(text) = simdutf8::basic::from_utf8(data) {
        return Cow::Borrowed(text);
    }

    let encoding = detect_codepage(data);
    debug!(encoding = encoding.name(), "DXF is not UTF-8, decoding with code page");
    let (decoded, _, _) = encoding.decode(data);
    decoded
}

/// Extrait l'encodage depuis la variable `$DWGCODEPAGE` (code 3)
fn detect_codepage(data: &[u8]) -> &'static Encoding {
    let finder = memmem::Finder::new(b"$DWGCODEPAGE");

    if let Some(pos) = finder.find(data) {
        // Lignes: "$DWGCODEPAGE", "3", "ANSI_xxxx"
        let mut lines = data[pos..].split(|&b| b == b'\n');
        let value = lines.nth(2).unwrap_or_default();
        let codepage = std::str::from_utf8(value).unwrap_or("").trim();
        return codepage_to_encoding(codepage);
    }

    // Par défaut: ANSI_1252 (valeur par défaut d'AutoCAD)
    encoding_rs::WINDOWS_1252
}

/// Mappe les codes de page DXF vers les encodages
fn codepage_to_encoding(codepage: &str) -> &'static Encoding {
    match codepage.to_uppercase().as_str() {
        "ANSI_874" => encoding_rs::WINDOWS_874,
        "ANSI_932" => encoding_rs::SHIFT_JIS,
        "ANSI_936" => encoding_rs::GBK,
        "ANSI_949" => encoding_rs::EUC_KR,
        "ANSI_950" => encoding_rs::BIG5,
        "ANSI_1250" => encoding_rs::WINDOWS_1250,
        "ANSI_1251" => encoding_rs::WINDOWS_1251,
        "ANSI_1253" => encoding_rs::WINDOWS_1253,
        "ANSI_1254" => encoding_rs::WINDOWS_1254,
        "ANSI_1255" => encoding_rs::WINDOWS_1255,
        "ANSI_1256" => encoding_rs::WINDOWS_1256,
        "ANSI_1257" => encoding_rs::WINDOWS_1257,
        "ANSI_1258" => encoding_rs::WINDOWS_1258,
        _ => encoding_rs::WINDOWS_1252,
    }
}

/// Paire code de groupe / valeur
#[derive(Debug, Clone, Copy)]
struct Pair<'a> {
    code: i32,
    value: &'a str,
    /// Ligne du code de groupe (1-based)
    line: usize,
}

/// Itérateur sur les paires d'un texte DXF
struct Pairs<'a> {
    lines: Peekable<Lines<'a>>,
    line: usize,
    peeked: Option<Pair<'a>>,
}

impl<'a> Pairs<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().peekable(),
            line: 0,
            peeked: None,
        }
    }

    /// Paire suivante, ou `None` en fin de texte
    fn next_pair(&mut self) -> Result<Option<Pair<'a>>, DxfError> {
        if let Some(pair) = self.peeked.take() {
            return Ok(Some(pair));
        }

        // Lignes vides de fin de fichier tolérées
        let code_line = loop {
            match self.lines.next() {
                Some(l) if l.trim().is_empty() && self.lines.peek().is_none() => return Ok(None),
                Some(l) => {
                    self.line += 1;
                    break l;
                }
                None => return Ok(None),
            }
        };
        let line = self.line;

        let code = code_line.trim().parse::<i32>().map_err(|_| {
            DxfError::parse_error(line, format!("invalid group code {:?}", code_line.trim()))
        })?;

        let value = self
            .lines
            .next()
            .ok_or_else(|| DxfError::parse_error(line, format!("missing value for group code {}", code)))?;
        self.line += 1;

        Ok(Some(Pair {
            code,
            value: value.trim(),
            line,
        }))
    }

    /// Paire suivante, fin de texte interdite
    fn require(&mut self) -> Result<Pair<'a>, DxfError> {
        self.next_pair()?.ok_or(DxfError::UnexpectedEof)
    }

    /// Remet une paire en tête
    fn push_back(&mut self, pair: Pair<'a>) {
        self.peeked = Some(pair);
    }
}

fn is_end_of_section(pair: &Pair<'_>) -> bool {
    pair.code == 0 && pair.value == "ENDSEC"
}

fn skip_section(pairs: &mut Pairs<'_>) -> Result<(), DxfError> {
    loop {
        if is_end_of_section(&pairs.require()?) {
            return Ok(());
        }
    }
}

fn parse_header(pairs: &mut Pairs<'_>) -> Result<Header, DxfError> {
    let mut header = Header::default();
    let mut current: Option<&str> = None;
    let mut extmin = (None, None);
    let mut extmax = (None, None);

    loop {
        let pair = pairs.require()?;
        if is_end_of_section(&pair) {
            break;
        }

        match (pair.code, current) {
            (9, _) => current = Some(pair.value),
            (70, Some("$INSUNITS")) => header.units = Units::from_code(parse_i16(&pair)?),
            (10, Some("$EXTMIN")) => extmin.0 = Some(parse_float(&pair)?),
            (20, Some("$EXTMIN")) => extmin.1 = Some(parse_float(&pair)?),
            (10, Some("$EXTMAX")) => extmax.0 = Some(parse_float(&pair)?),
            (20, Some("$EXTMAX")) => extmax.1 = Some(parse_float(&pair)?),
            _ => {}
        }
    }

    if let ((Some(x0), Some(y0)), (Some(x1), Some(y1))) = (extmin, extmax) {
        header.extents = Some(Extents {
            min: (x0, y0),
            max: (x1, y1),
        });
    }

    Ok(header)
}

fn parse_entities(pairs: &mut Pairs<'_>) -> Result<Vec<Entity>, DxfError> {
    let mut entities = Vec::new();

    loop {
        let pair = pairs.require()?;
        if pair.code != 0 {
            return Err(DxfError::parse_error(
                pair.line,
                format!("expected entity start (code 0), got code {}", pair.code),
            ));
        }

        match pair.value {
            "ENDSEC" => return Ok(entities),
            "LWPOLYLINE" => {
                let polyline = parse_lwpolyline(pairs, pair.line)?;
                entities.push(Entity::LwPolyline(polyline));
            }
            other => {
                debug!(entity = other, line = pair.line, "Skipping unsupported entity");
                skip_entity(pairs)?;
            }
        }
    }
}

/// Consomme les paires jusqu'au prochain code 0 (laissé en tête)
fn skip_entity(pairs: &mut Pairs<'_>) -> Result<(), DxfError> {
    loop {
        let pair = pairs.require()?;
        if pair.code == 0 {
            pairs.push_back(pair);
            return Ok(());
        }
    }
}

fn parse_lwpolyline(pairs: &mut Pairs<'_>, start_line: usize) -> Result<LwPolyline, DxfError> {
    let mut layer = None;
    let mut color = AciColor::BY_LAYER;
    let mut declared: Option<usize> = None;
    let mut flags = 0;
    let mut vertices: Vec<(f64, f64)> = Vec::new();

    loop {
        let pair = pairs.require()?;
        match pair.code {
            0 => {
                pairs.push_back(pair);
                break;
            }
            8 => layer = Some(pair.value.to_string()),
            62 => {
                color = AciColor(parse_i16(&pair)?);
                if !color.is_valid() {
                    return Err(DxfError::parse_error(
                        pair.line,
                        format!("color index {} outside the ACI range 0..=256", color.0),
                    ));
                }
            }
            90 => declared = Some(parse_int(&pair)?.max(0) as usize),
            70 => flags = parse_int(&pair)?,
            10 => vertices.push((parse_float(&pair)?, f64::NAN)),
            20 => match vertices.last_mut() {
                Some(last) if last.1.is_nan() => last.1 = parse_float(&pair)?,
                _ => {
                    return Err(DxfError::parse_error(
                        pair.line,
                        "Y ordinate (code 20) without a preceding X ordinate (code 10)",
                    ))
                }
            },
            _ => {}
        }
    }

    if vertices.iter().any(|(_, y)| y.is_nan()) {
        return Err(DxfError::parse_error(
            start_line,
            "vertex without Y ordinate (code 20)",
        ));
    }

    if let Some(count) = declared {
        if count != vertices.len() {
            return Err(DxfError::parse_error(
                start_line,
                format!(
                    "vertex count mismatch: declared {}, found {}",
                    count,
                    vertices.len()
                ),
            ));
        }
    }

    Ok(LwPolyline {
        // Calque par défaut d'un dessin DXF
        layer: layer.unwrap_or_else(|| "0".to_string()),
        color,
        vertices,
        closed: flags & 1 == 1,
    })
}

fn parse_int(pair: &Pair<'_>) -> Result<i32, DxfError> {
    pair.value.parse::<i32>().map_err(|_| {
        DxfError::parse_error(
            pair.line,
            format!("invalid integer {:?} for group code {}", pair.value, pair.code),
        )
    })
}

/// Entier 16 bits (codes 60-79), sans troncature silencieuse
fn parse_i16(pair: &Pair<'_>) -> Result<i16, DxfError> {
    let value = parse_int(pair)?;
    i16::try_from(value).map_err(|_| {
        DxfError::parse_error(
            pair.line,
            format!("value {} out of 16-bit range for group code {}", value, pair.code),
        )
    })
}

/// Parse f64 via fast-float
fn parse_float(pair: &Pair<'_>) -> Result<f64, DxfError> {
    fast_float::parse::<f64, _>(pair.value).map_err(|_| {
        DxfError::parse_error(
            pair.line,
            format!("invalid number {:?} for group code {}", pair.value, pair.code),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "0\nSECTION\n2\nHEADER\n9\n$INSUNITS\n70\n2\n0\nENDSEC\n\
                          0\nSECTION\n2\nENTITIES\n\
                          0\nLWPOLYLINE\n8\nROAD_CURB\n62\n5\n90\n2\n70\n0\n\
                          10\n1.5\n20\n2.5\n10\n3\n20\n4\n\
                          0\nENDSEC\n0\nEOF\n";

    #[test]
    fn test_parse_sample() {
        let doc = parse_str(SAMPLE).unwrap();
        assert_eq!(doc.header.units, Units::Feet);
        assert_eq!(doc.entities.len(), 1);

        let polyline = doc.polylines().next().unwrap();
        assert_eq!(polyline.layer, "ROAD_CURB");
        assert_eq!(polyline.color, AciColor::BLUE);
        assert_eq!(polyline.vertices, vec![(1.5, 2.5), (3.0, 4.0)]);
        assert!(!polyline.closed);
    }

    #[test]
    fn test_parse_crlf_and_padded_codes() {
        let text = SAMPLE
            .lines()
            .enumerate()
            .map(|(i, l)| if i % 2 == 0 { format!("  {}", l) } else { l.to_string() })
            .collect::<Vec<_>>()
            .join("\r\n");
        let doc = parse_str(&text).unwrap();
        assert_eq!(doc.entities.len(), 1);
    }

    #[test]
    fn test_skip_unknown_entities_and_sections() {
        let text = "999\ncomment\n0\nSECTION\n2\nTABLES\n0\nTABLE\n2\nLAYER\n0\nENDTAB\n0\nENDSEC\n\
                    0\nSECTION\n2\nENTITIES\n\
                    0\nLINE\n8\n0\n10\n0\n20\n0\n11\n1\n21\n1\n\
                    0\nLWPOLYLINE\n8\nA\n90\n2\n10\n0\n20\n0\n10\n1\n20\n1\n\
                    0\nENDSEC\n0\nEOF\n";
        let doc = parse_str(text).unwrap();
        assert_eq!(doc.entities.len(), 1);
        assert_eq!(doc.entities[0].layer(), "A");
    }

    #[test]
    fn test_missing_eof() {
        let text = SAMPLE.trim_end_matches("0\nEOF\n");
        assert!(matches!(parse_str(text), Err(DxfError::UnexpectedEof)));
    }

    #[test]
    fn test_vertex_count_mismatch() {
        let text = SAMPLE.replace("90\n2\n", "90\n3\n");
        assert!(matches!(parse_str(&text), Err(DxfError::Parse { .. })));
    }

    #[test]
    fn test_invalid_group_code() {
        let text = SAMPLE.replacen("0\nSECTION", "X\nSECTION", 1);
        match parse_str(&text) {
            Err(DxfError::Parse { line, .. }) => assert_eq!(line, 1),
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_number() {
        let text = SAMPLE.replace("10\n1.5\n", "10\nabc\n");
        assert!(matches!(parse_str(&text), Err(DxfError::Parse { .. })));
    }

    #[test]
    fn test_color_out_of_range() {
        // 65537 tronqué en i16 donnerait la couleur 1
        let text = SAMPLE.replace("62\n5\n", "62\n65537\n");
        match parse_str(&text) {
            Err(DxfError::Parse { line, .. }) => assert_eq!(line, 19),
            other => panic!("Expected Parse error, got {:?}", other),
        }

        let text = SAMPLE.replace("62\n5\n", "62\n300\n");
        assert!(matches!(parse_str(&text), Err(DxfError::Parse { .. })));

        let text = SAMPLE.replace("62\n5\n", "62\n256\n");
        assert_eq!(parse_str(&text).unwrap().entities.len(), 1);
    }

    #[test]
    fn test_insunits_out_of_range() {
        let text = SAMPLE.replace("70\n2\n", "70\n70000\n");
        assert!(matches!(parse_str(&text), Err(DxfError::Parse { .. })));
    }

    #[test]
    fn test_acadver_ignored() {
        let text = SAMPLE.replace("9\n$INSUNITS", "9\n$ACADVER\n1\nAC1015\n9\n$INSUNITS");
        let doc = parse_str(&text).unwrap();
        assert_eq!(doc.header.units, Units::Feet);
    }

    #[test]
    fn test_decode_windows_1252() {
        let mut data = b"0\nSECTION\n2\nHEADER\n9\n$DWGCODEPAGE\n3\nANSI_1252\n0\nENDSEC\n\
                         0\nSECTION\n2\nENTITIES\n0\nLWPOLYLINE\n8\nBORDURE_"
            .to_vec();
        data.push(0xC9); // 'É' en Windows-1252
        data.extend_from_slice(b"\n10\n0\n20\n0\n10\n1\n20\n1\n0\nENDSEC\n0\nEOF\n");

        let doc = parse(&data).unwrap();
        assert_eq!(doc.entities[0].layer(), "BORDURE_É");
    }

    #[test]
    fn test_codepage_mapping() {
        assert_eq!(codepage_to_encoding("ANSI_1251").name(), "windows-1251");
        assert_eq!(codepage_to_encoding("ansi_932").name(), "Shift_JIS");
        assert_eq!(codepage_to_encoding("UNKNOWN").name(), "windows-1252");
    }
}
