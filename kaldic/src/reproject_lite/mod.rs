//! Reprojection légère en Rust pur (sans dépendances externes)
//!
//! Registre de systèmes de référence identifiés par code (`EPSG:6405`),
//! chacun décrit par sa méthode de projection, son ellipsoïde et son unité.
//!
//! Méthodes supportées :
//! - Géographique (degrés, EPSG:4326)
//! - Web Mercator (EPSG:3857)
//! - Transverse Mercator ellipsoïdale (State Plane, UTM)
//!
//! Toute transformation passe par des coordonnées géographiques (radians).
//! Les écarts de datum NAD83(2011) / WGS84 (sub-métriques) sont ignorés.

mod ellipsoid;
mod extent;
mod mercator;
mod transverse_mercator;
mod units;

use std::collections::HashMap;

use geo::{Coord, LineString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use ellipsoid::Ellipsoid;
pub use extent::Extent;
pub use transverse_mercator::TransverseMercator;
pub use units::Unit;

/// Segments d'échantillonnage par bord pour `project_extent`
pub const EXTENT_SAMPLES_PER_EDGE: usize = 10;

/// Point en coordonnées géographiques (radians)
#[derive(Debug, Clone, Copy)]
pub struct Geographic {
    /// Longitude en radians
    pub lon: f64,
    /// Latitude en radians
    pub lat: f64,
}

impl Geographic {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Convertit en degrés
    pub fn to_degrees(self) -> (f64, f64) {
        (self.lon.to_degrees(), self.lat.to_degrees())
    }

    /// Crée depuis des degrés
    pub fn from_degrees(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon: lon_deg.to_radians(),
            lat: lat_deg.to_radians(),
        }
    }
}

/// Erreurs de reprojection
#[derive(Debug, Error, PartialEq)]
pub enum ReprojectError {
    /// Identifiant non enregistré
    #[error("Reference system not found: {0}")]
    NotFound(String),

    /// Ré-enregistrement d'un identifiant avec une autre définition
    #[error("Reference system {0} is already registered with a different definition")]
    ConflictingDefinition(String),

    /// Définition incohérente (ex: projection géographique en pieds)
    #[error("Invalid definition for {id}: {reason}")]
    InvalidDefinition { id: String, reason: String },

    /// Point hors du domaine de validité du système
    #[error("Point ({x}, {y}) is outside the valid range of {id}")]
    OutOfRange { id: String, x: f64, y: f64 },
}

/// Méthode de projection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Projection {
    /// Longitude/latitude en degrés (x = longitude)
    Geographic,
    /// Pseudo-Mercator sphérique
    WebMercator,
    /// Transverse Mercator ellipsoïdale
    TransverseMercator(TransverseMercator),
}

/// Définition d'un système de référence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceSystem {
    /// Identifiant (ex: "EPSG:6405")
    pub id: String,
    /// Nom lisible
    pub name: String,
    pub projection: Projection,
    pub ellipsoid: Ellipsoid,
    pub unit: Unit,
}

impl ReferenceSystem {
    /// WGS 84 géographique (EPSG:4326)
    pub fn wgs84() -> Self {
        Self {
            id: "EPSG:4326".into(),
            name: "WGS 84".into(),
            projection: Projection::Geographic,
            ellipsoid: Ellipsoid::WGS84,
            unit: Unit::Degree,
        }
    }

    /// WGS 84 / Pseudo-Mercator (EPSG:3857)
    pub fn web_mercator() -> Self {
        Self {
            id: "EPSG:3857".into(),
            name: "WGS 84 / Pseudo-Mercator".into(),
            projection: Projection::WebMercator,
            ellipsoid: Ellipsoid::WGS84,
            unit: Unit::Meter,
        }
    }

    /// NAD83(2011) / Arizona Central (ft) (EPSG:6405)
    pub fn arizona_central_ft() -> Self {
        Self {
            id: "EPSG:6405".into(),
            name: "NAD83(2011) / Arizona Central (ft)".into(),
            projection: Projection::TransverseMercator(TransverseMercator {
                lat0: 31.0,
                lon0: -111.0 - 55.0 / 60.0,
                k0: 0.9999,
                false_easting: 213360.0,
                false_northing: 0.0,
            }),
            ellipsoid: Ellipsoid::GRS80,
            unit: Unit::Foot,
        }
    }

    /// Vérifie la cohérence de la définition
    fn validate(&self) -> Result<(), ReprojectError> {
        let invalid = |reason: &str| ReprojectError::InvalidDefinition {
            id: self.id.clone(),
            reason: reason.to_string(),
        };

        match (&self.projection, self.unit) {
            (Projection::Geographic, Unit::Degree) => {}
            (Projection::Geographic, _) => return Err(invalid("geographic systems use degrees")),
            (_, Unit::Degree) => return Err(invalid("projected systems need a linear unit")),
            _ => {}
        }

        if !(self.ellipsoid.a > 0.0) || self.ellipsoid.inv_f < 0.0 {
            return Err(invalid("ellipsoid needs a > 0 and inv_f >= 0"));
        }

        if let Projection::TransverseMercator(tm) = &self.projection {
            let finite = [tm.lat0, tm.lon0, tm.k0, tm.false_easting, tm.false_northing]
                .iter()
                .all(|v| v.is_finite());
            if !finite || tm.k0 <= 0.0 || tm.lat0.abs() >= 90.0 {
                return Err(invalid("transverse mercator parameters out of range"));
            }
        }

        Ok(())
    }

    /// Coordonnées natives → géographiques
    fn to_geographic(&self, c: Coord) -> Result<Geographic, ReprojectError> {
        if !c.x.is_finite() || !c.y.is_finite() {
            return Err(self.out_of_range(c));
        }

        let geo = match &self.projection {
            Projection::Geographic => {
                if c.y.abs() > 90.0 {
                    return Err(self.out_of_range(c));
                }
                Geographic::from_degrees(c.x, c.y)
            }
            Projection::WebMercator => {
                let (x, y) = (self.unit.to_meters(c.x), self.unit.to_meters(c.y));
                if !mercator::in_range(x, y) {
                    return Err(self.out_of_range(c));
                }
                mercator::web_mercator_to_geographic(x, y)
            }
            Projection::TransverseMercator(tm) => transverse_mercator::projected_to_geographic(
                tm,
                &self.ellipsoid,
                self.unit.to_meters(c.x),
                self.unit.to_meters(c.y),
            ),
        };

        if !geo.lon.is_finite() || !geo.lat.is_finite() {
            return Err(self.out_of_range(c));
        }
        Ok(geo)
    }

    /// Géographiques → coordonnées natives
    fn from_geographic(&self, geo: Geographic) -> Coord {
        match &self.projection {
            Projection::Geographic => {
                let (lon, lat) = geo.to_degrees();
                Coord { x: lon, y: lat }
            }
            Projection::WebMercator => {
                let (x, y) = mercator::geographic_to_web_mercator(geo);
                Coord {
                    x: self.unit.from_meters(x),
                    y: self.unit.from_meters(y),
                }
            }
            Projection::TransverseMercator(tm) => {
                let (x, y) = transverse_mercator::geographic_to_projected(tm, &self.ellipsoid, geo);
                Coord {
                    x: self.unit.from_meters(x),
                    y: self.unit.from_meters(y),
                }
            }
        }
    }

    fn out_of_range(&self, c: Coord) -> ReprojectError {
        ReprojectError::OutOfRange {
            id: self.id.clone(),
            x: c.x,
            y: c.y,
        }
    }
}

/// Normalise un identifiant: majuscules, "6405" → "EPSG:6405"
pub fn normalize_id(id: &str) -> String {
    let id = id.trim();
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
        format!("EPSG:{}", id)
    } else {
        id.to_ascii_uppercase()
    }
}

/// Code EPSG numérique d'un identifiant, si c'en est un
pub fn epsg_code(id: &str) -> Option<u32> {
    normalize_id(id).strip_prefix("EPSG:")?.parse().ok()
}

/// Registre de systèmes de référence et reprojection entre eux
#[derive(Debug, Clone, Default)]
pub struct Reprojector {
    systems: HashMap<String, ReferenceSystem>,
}

impl Reprojector {
    /// Registre vide
    pub fn new() -> Self {
        Self::default()
    }

    /// Registre avec EPSG:4326, EPSG:3857 et EPSG:6405
    pub fn with_defaults() -> Self {
        let mut reprojector = Self::new();
        for system in [
            ReferenceSystem::wgs84(),
            ReferenceSystem::web_mercator(),
            ReferenceSystem::arizona_central_ft(),
        ] {
            // Définitions intégrées: cohérentes et sans doublon
            reprojector
                .systems
                .insert(normalize_id(&system.id), system);
        }
        reprojector
    }

    /// Enregistre un système (idempotent pour une définition identique)
    pub fn register(&mut self, mut system: ReferenceSystem) -> Result<(), ReprojectError> {
        system.id = normalize_id(&system.id);
        system.validate()?;

        match self.systems.get(&system.id) {
            Some(existing) if existing == &system => Ok(()),
            Some(_) => Err(ReprojectError::ConflictingDefinition(system.id)),
            None => {
                debug!(id = %system.id, name = %system.name, "Registered reference system");
                self.systems.insert(system.id.clone(), system);
                Ok(())
            }
        }
    }

    /// Récupère la définition d'un système
    pub fn get(&self, id: &str) -> Result<&ReferenceSystem, ReprojectError> {
        let key = normalize_id(id);
        self.systems
            .get(&key)
            .ok_or(ReprojectError::NotFound(key))
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.systems.contains_key(&normalize_id(id))
    }

    /// Identifiants enregistrés, triés
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.systems.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Transforme un point de `from` vers `to`
    pub fn project(&self, point: Coord, from: &str, to: &str) -> Result<Coord, ReprojectError> {
        let (source, target) = self.resolve(from, to)?;
        transform(source, target, point)
    }

    /// Transforme une polyligne (ordre des sommets conservé, échec global)
    pub fn project_line(&self, line: &LineString, from: &str, to: &str) -> Result<LineString, ReprojectError> {
        let (source, target) = self.resolve(from, to)?;
        let coords: Result<Vec<Coord>, ReprojectError> = line
            .coords()
            .map(|&c| transform(source, target, c))
            .collect();
        Ok(LineString::new(coords?))
    }

    /// Transforme une emprise: plus petite emprise contenant le contour
    /// échantillonné (coins + points intermédiaires) une fois reprojeté
    pub fn project_extent(&self, extent: Extent, from: &str, to: &str) -> Result<Extent, ReprojectError> {
        let (source, target) = self.resolve(from, to)?;
        if source.id == target.id {
            return Ok(extent);
        }

        let samples = extent.boundary_samples(EXTENT_SAMPLES_PER_EDGE);
        let transformed: Result<Vec<Coord>, ReprojectError> = samples
            .into_iter()
            .map(|c| transform(source, target, c))
            .collect();

        let result = Extent::from_coords(transformed?).ok_or_else(|| source.out_of_range(extent.center()))?;
        debug!(from = %source.id, to = %target.id, extent = %extent, result = %result, "Projected extent");
        Ok(result)
    }

    /// Résout les deux systèmes avant tout calcul
    fn resolve(&self, from: &str, to: &str) -> Result<(&ReferenceSystem, &ReferenceSystem), ReprojectError> {
        Ok((self.get(from)?, self.get(to)?))
    }
}

fn transform(source: &ReferenceSystem, target: &ReferenceSystem, point: Coord) -> Result<Coord, ReprojectError> {
    if source.id == target.id {
        return Ok(point);
    }

    let geo = source.to_geographic(point)?;
    let out = target.from_geographic(geo);

    let valid = match target.projection {
        Projection::WebMercator => mercator::in_range(target.unit.to_meters(out.x), target.unit.to_meters(out.y)),
        _ => out.x.is_finite() && out.y.is_finite(),
    };
    if !valid {
        return Err(source.out_of_range(point));
    }

    Ok(out)
}
