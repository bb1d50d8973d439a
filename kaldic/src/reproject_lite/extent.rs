//! Emprise rectangulaire alignée sur les axes

use std::str::FromStr;

use geo::Coord;
use serde::{Deserialize, Serialize};

/// Emprise `(min_x, min_y, max_x, max_y)` dans un système de référence
///
/// Sérialisée en JSON comme un tableau `[min_x, min_y, max_x, max_y]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    /// Crée une emprise (les bornes sont réordonnées si besoin)
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            min_x: x0.min(x1),
            min_y: y0.min(y1),
            max_x: x0.max(x1),
            max_y: y0.max(y1),
        }
    }

    /// Emprise depuis une origine (coin bas-gauche) et une taille
    pub fn from_origin(origin: Coord, width: f64, height: f64) -> Self {
        Self::new(origin.x, origin.y, origin.x + width, origin.y + height)
    }

    /// Plus petite emprise contenant tous les points (`None` si aucun)
    pub fn from_coords<I: IntoIterator<Item = Coord>>(coords: I) -> Option<Self> {
        let mut iter = coords.into_iter();
        let first = iter.next()?;
        let mut extent = Self::new(first.x, first.y, first.x, first.y);
        for c in iter {
            extent.expand_to_include(c);
        }
        Some(extent)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Coord {
        Coord {
            x: self.min_x + self.width() / 2.0,
            y: self.min_y + self.height() / 2.0,
        }
    }

    /// Vérifie si l'emprise contient un point (bornes incluses)
    pub fn contains(&self, c: Coord) -> bool {
        c.x >= self.min_x && c.x <= self.max_x && c.y >= self.min_y && c.y <= self.max_y
    }

    /// Agrandit l'emprise pour inclure un point
    pub fn expand_to_include(&mut self, c: Coord) {
        self.min_x = self.min_x.min(c.x);
        self.min_y = self.min_y.min(c.y);
        self.max_x = self.max_x.max(c.x);
        self.max_y = self.max_y.max(c.y);
    }

    pub fn corners(&self) -> [Coord; 4] {
        [
            Coord { x: self.min_x, y: self.min_y },
            Coord { x: self.max_x, y: self.min_y },
            Coord { x: self.max_x, y: self.max_y },
            Coord { x: self.min_x, y: self.max_y },
        ]
    }

    /// Points d'échantillonnage du contour: les 4 coins et `segments - 1`
    /// points intermédiaires par bord, dans le sens anti-horaire
    pub fn boundary_samples(&self, segments: usize) -> Vec<Coord> {
        let segments = segments.max(1);
        let corners = self.corners();
        let mut samples = Vec::with_capacity(4 * segments);

        for i in 0..4 {
            let start = corners[i];
            let end = corners[(i + 1) % 4];
            for step in 0..segments {
                let t = step as f64 / segments as f64;
                samples.push(Coord {
                    x: start.x + (end.x - start.x) * t,
                    y: start.y + (end.y - start.y) * t,
                });
            }
        }

        samples
    }

    pub fn is_finite(&self) -> bool {
        [self.min_x, self.min_y, self.max_x, self.max_y]
            .iter()
            .all(|v| v.is_finite())
    }
}

impl From<[f64; 4]> for Extent {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<Extent> for [f64; 4] {
    fn from(e: Extent) -> Self {
        [e.min_x, e.min_y, e.max_x, e.max_y]
    }
}

impl From<Extent> for dxf_lite::Extents {
    fn from(e: Extent) -> Self {
        Self {
            min: (e.min_x, e.min_y),
            max: (e.max_x, e.max_y),
        }
    }
}

impl FromStr for Extent {
    type Err = String;

    /// Format: "minx,miny,maxx,maxy"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err("Extent must have 4 comma-separated values: minx,miny,maxx,maxy".to_string());
        }

        let mut values = [0.0; 4];
        for (value, part) in values.iter_mut().zip(&parts) {
            *value = part
                .parse::<f64>()
                .map_err(|_| format!("Invalid extent value: {}", part))?;
        }

        let extent = Self::from(values);
        if !extent.is_finite() {
            return Err("Extent values must be finite".to_string());
        }
        Ok(extent)
    }
}

impl std::fmt::Display for Extent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{},{}", self.min_x, self.min_y, self.max_x, self.max_y)
    }
}
