//! Projection Transverse Mercator (formules ellipsoïdales, Snyder 1987)
//!
//! Utilisée par les State Plane américains en zone transverse
//! (ex: EPSG:6405 NAD83(2011) / Arizona Central (ft)).
//!
//! Les coordonnées planes sont en mètres ici: la conversion d'unité
//! (pieds ↔ mètres) est faite par l'appelant, avant/après ces calculs.

use serde::{Deserialize, Serialize};

use super::ellipsoid::Ellipsoid;
use super::Geographic;

/// Paramètres d'une projection Transverse Mercator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransverseMercator {
    /// Latitude d'origine (degrés)
    pub lat0: f64,
    /// Méridien central (degrés)
    pub lon0: f64,
    /// Facteur d'échelle sur le méridien central
    pub k0: f64,
    /// False easting (mètres)
    pub false_easting: f64,
    /// False northing (mètres)
    pub false_northing: f64,
}

impl TransverseMercator {
    /// Zone UTM (hémisphère nord ou sud)
    pub fn utm(zone: u32, south: bool) -> Self {
        Self {
            lat0: 0.0,
            lon0: (zone as f64 - 1.0) * 6.0 - 180.0 + 3.0,
            k0: 0.9996,
            false_easting: 500000.0,
            false_northing: if south { 10000000.0 } else { 0.0 },
        }
    }
}

/// Longueur de l'arc de méridien depuis l'équateur
fn meridian_arc(lat: f64, ell: &Ellipsoid) -> f64 {
    let e2 = ell.e2();
    let e4 = e2 * e2;
    let e6 = e4 * e2;

    ell.a
        * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * lat).sin())
}

/// Rayon de courbure dans le méridien
fn meridian_radius(lat: f64, ell: &Ellipsoid) -> f64 {
    let e2 = ell.e2();
    ell.a * (1.0 - e2) / (1.0 - e2 * lat.sin().powi(2)).powf(1.5)
}

/// Grande normale (rayon de courbure dans le premier vertical)
fn grande_normale(lat: f64, ell: &Ellipsoid) -> f64 {
    ell.a / (1.0 - ell.e2() * lat.sin().powi(2)).sqrt()
}

/// Latitude du pied de la verticale pour un arc de méridien donné (itératif)
fn footpoint_latitude(m: f64, ell: &Ellipsoid) -> f64 {
    let e2 = ell.e2();
    let mut lat = m / (ell.a * (1.0 - e2 / 4.0 - 3.0 * e2.powi(2) / 64.0 - 5.0 * e2.powi(3) / 256.0));

    for _ in 0..10 {
        let new_lat = lat + (m - meridian_arc(lat, ell)) / meridian_radius(lat, ell);
        if (new_lat - lat).abs() < 1e-14 {
            return new_lat;
        }
        lat = new_lat;
    }
    lat
}

/// Ramène une différence de longitude dans [-π, π]
fn wrap_longitude(dlon: f64) -> f64 {
    use std::f64::consts::{PI, TAU};
    if dlon > PI {
        dlon - TAU
    } else if dlon < -PI {
        dlon + TAU
    } else {
        dlon
    }
}

/// Convertit des coordonnées géographiques en coordonnées projetées (mètres)
pub fn geographic_to_projected(tm: &TransverseMercator, ell: &Ellipsoid, geo: Geographic) -> (f64, f64) {
    let ep2 = ell.ep2();
    let k0 = tm.k0;
    let lat = geo.lat;
    let lat0 = tm.lat0.to_radians();
    let lon0 = tm.lon0.to_radians();

    let (sin_lat, cos_lat) = lat.sin_cos();
    let tan_lat = sin_lat / cos_lat;

    let n = grande_normale(lat, ell);
    let t = tan_lat.powi(2);
    let c = ep2 * cos_lat.powi(2);
    let a = wrap_longitude(geo.lon - lon0) * cos_lat;

    let m = meridian_arc(lat, ell);
    let m0 = meridian_arc(lat0, ell);

    let x = k0
        * n
        * (a + (1.0 - t + c) * a.powi(3) / 6.0
            + (5.0 - 18.0 * t + t.powi(2) + 72.0 * c - 58.0 * ep2) * a.powi(5) / 120.0);

    let y = k0
        * (m - m0
            + n * tan_lat
                * (a.powi(2) / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c.powi(2)) * a.powi(4) / 24.0
                    + (61.0 - 58.0 * t + t.powi(2) + 600.0 * c - 330.0 * ep2) * a.powi(6) / 720.0));

    (x + tm.false_easting, y + tm.false_northing)
}

/// Inverse par séries (sans raffinement)
fn series_inverse(tm: &TransverseMercator, ell: &Ellipsoid, x: f64, y: f64) -> Geographic {
    let e2 = ell.e2();
    let ep2 = ell.ep2();
    let k0 = tm.k0;

    // Coordonnées réduites
    let x = x - tm.false_easting;
    let y = y - tm.false_northing;

    let m = meridian_arc(tm.lat0.to_radians(), ell) + y / k0;
    let phi1 = footpoint_latitude(m, ell);

    let (sin_phi1, cos_phi1) = phi1.sin_cos();
    let tan_phi1 = sin_phi1 / cos_phi1;

    let n1 = grande_normale(phi1, ell);
    let t1 = tan_phi1.powi(2);
    let c1 = ep2 * cos_phi1.powi(2);
    let r1 = ell.a * (1.0 - e2) / (1.0 - e2 * sin_phi1.powi(2)).powf(1.5);
    let d = x / (n1 * k0);

    let lat = phi1
        - (n1 * tan_phi1 / r1)
            * (d.powi(2) / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1.powi(2) - 9.0 * ep2) * d.powi(4) / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1.powi(2) - 252.0 * ep2 - 3.0 * c1.powi(2))
                    * d.powi(6)
                    / 720.0);

    let lon = tm.lon0.to_radians()
        + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1.powi(2) + 8.0 * ep2 + 24.0 * t1.powi(2))
                * d.powi(5)
                / 120.0)
            / cos_phi1;

    Geographic::new(lon, lat)
}

/// Convertit des coordonnées projetées (mètres) en coordonnées géographiques
///
/// L'inverse par séries est raffiné sur la projection directe jusqu'à un écart
/// sub-nanométrique, pour que l'aller-retour soit exact loin du méridien central.
pub fn projected_to_geographic(tm: &TransverseMercator, ell: &Ellipsoid, x: f64, y: f64) -> Geographic {
    let mut geo = series_inverse(tm, ell, x, y);

    for _ in 0..5 {
        let (fx, fy) = geographic_to_projected(tm, ell, geo);
        let (dx, dy) = (x - fx, y - fy);
        if dx.abs() < 1e-9 && dy.abs() < 1e-9 {
            break;
        }
        geo.lon += dx / (tm.k0 * grande_normale(geo.lat, ell) * geo.lat.cos());
        geo.lat += dy / (tm.k0 * meridian_radius(geo.lat, ell));
    }

    geo
}
