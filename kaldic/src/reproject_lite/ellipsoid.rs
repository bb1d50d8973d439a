//! Définitions des ellipsoïdes

use serde::{Deserialize, Serialize};

/// Ellipsoïde de référence (demi-grand axe + inverse de l'aplatissement)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipsoid {
    /// Demi-grand axe (rayon équatorial) en mètres
    pub a: f64,
    /// Inverse de l'aplatissement (0 pour une sphère)
    pub inv_f: f64,
}

impl Ellipsoid {
    /// GRS80 (NAD83, NAD83(2011))
    pub const GRS80: Self = Self {
        a: 6378137.0,
        inv_f: 298.257222101,
    };

    /// WGS84
    pub const WGS84: Self = Self {
        a: 6378137.0,
        inv_f: 298.257223563,
    };

    /// Aplatissement
    pub fn f(&self) -> f64 {
        if self.inv_f == 0.0 {
            0.0
        } else {
            1.0 / self.inv_f
        }
    }

    /// Première excentricité au carré
    pub fn e2(&self) -> f64 {
        let f = self.f();
        2.0 * f - f * f
    }

    /// Deuxième excentricité au carré
    pub fn ep2(&self) -> f64 {
        let e2 = self.e2();
        e2 / (1.0 - e2)
    }

    /// Demi-petit axe (rayon polaire) en mètres
    pub fn b(&self) -> f64 {
        self.a * (1.0 - self.f())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wgs84_constants() {
        let e = Ellipsoid::WGS84;
        assert!((e.e2().sqrt() - 0.0818191908426215).abs() < 1e-15);
        assert!((e.b() - 6356752.314245).abs() < 1e-3);
    }

    #[test]
    fn test_grs80_close_to_wgs84() {
        // Différence < 0.1 mm sur le demi-petit axe
        assert!((Ellipsoid::GRS80.b() - Ellipsoid::WGS84.b()).abs() < 1e-3);
    }

    #[test]
    fn test_sphere() {
        let sphere = Ellipsoid { a: 6371000.0, inv_f: 0.0 };
        assert_eq!(sphere.e2(), 0.0);
        assert_eq!(sphere.ep2(), 0.0);
    }
}
