//! Projection Web Mercator (EPSG:3857)
//!
//! Aussi connu sous le nom de Pseudo-Mercator ou Spherical Mercator.
//! Utilisé par OpenLayers, OpenStreetMap, etc. Le modèle est sphérique par
//! définition (rayon = demi-grand axe WGS84).

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use super::ellipsoid::Ellipsoid;
use super::Geographic;

/// Latitude maximale (carte carrée), en degrés
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Demi-étendue du plan Web Mercator en mètres
pub const HALF_WORLD: f64 = std::f64::consts::PI * Ellipsoid::WGS84.a;

/// Convertit coordonnées géographiques vers Web Mercator (mètres)
pub fn geographic_to_web_mercator(geo: Geographic) -> (f64, f64) {
    let r = Ellipsoid::WGS84.a;

    // Limiter la latitude pour éviter l'infini
    let max = MAX_LATITUDE.to_radians();
    let lat = geo.lat.clamp(-max, max);

    // X = R * longitude
    let x = r * geo.lon;

    // Y = R * ln(tan(π/4 + lat/2))
    let y = r * (FRAC_PI_4 + lat / 2.0).tan().ln();

    (x, y)
}

/// Convertit Web Mercator (mètres) vers coordonnées géographiques
pub fn web_mercator_to_geographic(x: f64, y: f64) -> Geographic {
    let r = Ellipsoid::WGS84.a;

    // Longitude = x / R
    let lon = x / r;

    // Latitude = 2 * atan(exp(y/R)) - π/2
    let lat = 2.0 * (y / r).exp().atan() - FRAC_PI_2;

    Geographic::new(lon, lat)
}

/// Vérifie qu'un point est dans le domaine Web Mercator
pub fn in_range(x: f64, y: f64) -> bool {
    x.is_finite() && y.is_finite() && x.abs() <= HALF_WORLD + 1e-6 && y.abs() <= HALF_WORLD + 1e-6
}
