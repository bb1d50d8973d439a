//! Features détectées (axes de voirie, bordures)
//!
//! Les coordonnées restent dans le système natif de la collection
//! (ex: EPSG:6405, pieds): la reprojection n'a lieu qu'à l'affichage.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use geo::{Coord, EuclideanLength, LineString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::reproject_lite::Extent;

/// Fixture de démonstration (3 features en EPSG:6405)
const DEMO_FIXTURE: &str = include_str!("fixtures/demo.json");

/// Erreurs de validation des features
#[derive(Debug, Error, PartialEq)]
pub enum FeatureError {
    #[error("Feature with an empty id")]
    EmptyId,

    #[error("Duplicate feature id: {0}")]
    DuplicateId(String),

    #[error("Feature {id}: a polyline needs at least 2 points, got {count}")]
    TooFewPoints { id: String, count: usize },

    #[error("Feature {id}: missing category label")]
    MissingCategory { id: String },

    #[error("Feature {id}: point {index} has a non-finite coordinate")]
    NonFiniteCoordinate { id: String, index: usize },

    #[error("Feature {id}: unsupported geometry type {kind}")]
    UnsupportedKind { id: String, kind: String },
}

/// Catégorie (calque) d'une feature
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    RoadCenterline,
    RoadCurb,
    /// Catégorie future du pipeline de détection
    Other(String),
}

/// Style de trait de l'overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stroke {
    pub color: &'static str,
    pub width: u8,
}

impl Category {
    pub fn label(&self) -> &str {
        match self {
            Self::RoadCenterline => "ROAD_CENTERLINE",
            Self::RoadCurb => "ROAD_CURB",
            Self::Other(label) => label,
        }
    }

    /// Couleur DXF: axe rouge, bordure bleue, autre couleur de premier plan
    pub fn aci_color(&self) -> dxf_lite::AciColor {
        match self {
            Self::RoadCenterline => dxf_lite::AciColor::RED,
            Self::RoadCurb => dxf_lite::AciColor::BLUE,
            Self::Other(_) => dxf_lite::AciColor::WHITE,
        }
    }

    /// Style d'affichage sur la carte
    pub fn stroke(&self) -> Stroke {
        match self {
            Self::RoadCenterline => Stroke { color: "red", width: 4 },
            Self::RoadCurb => Stroke { color: "blue", width: 3 },
            Self::Other(_) => Stroke { color: "gray", width: 2 },
        }
    }
}

impl From<String> for Category {
    fn from(label: String) -> Self {
        match label.trim() {
            "ROAD_CENTERLINE" => Self::RoadCenterline,
            "ROAD_CURB" => Self::RoadCurb,
            trimmed if trimmed.len() == label.len() => Self::Other(label),
            trimmed => Self::Other(trimmed.to_string()),
        }
    }
}

impl From<&str> for Category {
    fn from(label: &str) -> Self {
        Self::from(label.to_string())
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.label().to_string()
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Géométrie d'une feature (seule la polyligne ouverte existe)
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureGeometry {
    Polyline(LineString<f64>),
}

impl FeatureGeometry {
    /// Type d'entité DXF correspondant
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Polyline(_) => "LWPOLYLINE",
        }
    }

    pub fn line(&self) -> &LineString<f64> {
        match self {
            Self::Polyline(line) => line,
        }
    }

    pub fn coords(&self) -> impl Iterator<Item = &Coord<f64>> {
        self.line().coords()
    }
}

/// Propriétés affichées dans le panneau
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureProperties {
    pub name: String,
    /// Longueur en unités natives
    pub length: f64,
    /// Méthode de détection
    pub detected_by: String,
}

/// Une feature détectée
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Identifiant unique dans la session
    pub id: String,
    pub category: Category,
    pub geometry: FeatureGeometry,
    pub properties: FeatureProperties,
}

impl Feature {
    /// Crée une polyligne; la longueur est calculée
    pub fn polyline(
        id: impl Into<String>,
        category: Category,
        points: Vec<(f64, f64)>,
        name: impl Into<String>,
        detected_by: impl Into<String>,
    ) -> Self {
        let line = LineString::from(points);
        let length = line.euclidean_length();
        Self {
            id: id.into(),
            category,
            geometry: FeatureGeometry::Polyline(line),
            properties: FeatureProperties {
                name: name.into(),
                length,
                detected_by: detected_by.into(),
            },
        }
    }

    /// Longueur euclidienne en unités natives
    pub fn computed_length(&self) -> f64 {
        self.geometry.line().euclidean_length()
    }

    pub fn point_count(&self) -> usize {
        self.geometry.line().0.len()
    }

    /// Vérifie id, catégorie et géométrie
    pub fn validate(&self) -> Result<(), FeatureError> {
        if self.id.trim().is_empty() {
            return Err(FeatureError::EmptyId);
        }

        if self.category.label().trim().is_empty() {
            return Err(FeatureError::MissingCategory { id: self.id.clone() });
        }

        let count = self.point_count();
        if count < 2 {
            return Err(FeatureError::TooFewPoints {
                id: self.id.clone(),
                count,
            });
        }

        if let Some(index) = self
            .geometry
            .coords()
            .position(|c| !c.x.is_finite() || !c.y.is_finite())
        {
            return Err(FeatureError::NonFiniteCoordinate {
                id: self.id.clone(),
                index,
            });
        }

        Ok(())
    }
}

/// Enregistrement JSON d'une feature (format du pipeline de détection)
#[derive(Debug, Deserialize)]
struct FeatureRecord {
    id: String,
    #[serde(rename = "type", default = "default_kind")]
    kind: String,
    #[serde(default)]
    layer: Option<String>,
    coordinates: Vec<[f64; 2]>,
    #[serde(default)]
    properties: RecordProperties,
}

#[derive(Debug, Default, Deserialize)]
struct RecordProperties {
    #[serde(default)]
    name: String,
    /// Recalculée si absente
    length: Option<f64>,
    #[serde(default)]
    detected_by: String,
}

#[derive(Debug, Deserialize)]
struct CollectionRecord {
    crs: String,
    #[serde(default)]
    extent: Option<Extent>,
    features: Vec<FeatureRecord>,
}

fn default_kind() -> String {
    "LWPOLYLINE".to_string()
}

impl TryFrom<FeatureRecord> for Feature {
    type Error = FeatureError;

    fn try_from(record: FeatureRecord) -> Result<Self, Self::Error> {
        if !record.kind.eq_ignore_ascii_case("LWPOLYLINE") && !record.kind.eq_ignore_ascii_case("LineString") {
            return Err(FeatureError::UnsupportedKind {
                id: record.id,
                kind: record.kind,
            });
        }

        let category = match record.layer {
            Some(layer) if !layer.trim().is_empty() => Category::from(layer),
            _ => return Err(FeatureError::MissingCategory { id: record.id }),
        };

        let points: Vec<(f64, f64)> = record.coordinates.iter().map(|c| (c[0], c[1])).collect();
        let mut feature = Feature::polyline(
            record.id,
            category,
            points,
            record.properties.name,
            record.properties.detected_by,
        );
        if let Some(length) = record.properties.length {
            feature.properties.length = length;
        }

        Ok(feature)
    }
}

/// Ensemble ordonné de features dans un même système natif
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureCollection {
    /// Système de référence natif des coordonnées
    pub crs: String,
    /// Emprise de l'orthomosaïque associée, si connue
    pub extent: Option<Extent>,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(crs: impl Into<String>, features: Vec<Feature>) -> Self {
        Self {
            crs: crs.into(),
            extent: None,
            features,
        }
    }

    /// Charge une collection depuis un fichier JSON
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read features file: {}", path.display()))?;
        Self::from_json(&content).context(format!("Invalid features file: {}", path.display()))
    }

    /// Collection de démonstration embarquée
    pub fn demo() -> Result<Self> {
        Self::from_json(DEMO_FIXTURE).context("Failed to parse embedded demo features")
    }

    /// Parse et valide une collection JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let record: CollectionRecord = serde_json::from_str(json).context("Failed to parse features JSON")?;

        let features = record
            .features
            .into_iter()
            .map(Feature::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let collection = Self {
            crs: record.crs,
            extent: record.extent,
            features,
        };
        collection.validate()?;
        Ok(collection)
    }

    /// Ids uniques et features valides
    pub fn validate(&self) -> Result<(), FeatureError> {
        let mut seen = HashSet::with_capacity(self.features.len());
        for feature in &self.features {
            feature.validate()?;
            if !seen.insert(feature.id.as_str()) {
                return Err(FeatureError::DuplicateId(feature.id.clone()));
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.id == id)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Emprise des sommets en coordonnées natives
    pub fn native_extent(&self) -> Option<Extent> {
        Extent::from_coords(self.features.iter().flat_map(|f| f.geometry.coords().copied()))
    }
}
