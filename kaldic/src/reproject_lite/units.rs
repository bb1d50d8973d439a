//! Unités des coordonnées

use serde::{Deserialize, Serialize};

/// Pied international en mètres
pub const FOOT: f64 = 0.3048;

/// Pied US (survey foot) en mètres
pub const US_SURVEY_FOOT: f64 = 1200.0 / 3937.0;

/// Unité des coordonnées d'un système de référence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Meter,
    Foot,
    UsSurveyFoot,
    /// Degrés décimaux (systèmes géographiques uniquement)
    Degree,
}

impl Unit {
    /// Longueur de l'unité en mètres (`None` pour les degrés)
    pub fn meters_per_unit(self) -> Option<f64> {
        match self {
            Self::Meter => Some(1.0),
            Self::Foot => Some(FOOT),
            Self::UsSurveyFoot => Some(US_SURVEY_FOOT),
            Self::Degree => None,
        }
    }

    pub fn is_linear(self) -> bool {
        self.meters_per_unit().is_some()
    }

    /// Convertit une valeur de cette unité en mètres (identité pour les degrés)
    pub fn to_meters(self, value: f64) -> f64 {
        self.meters_per_unit().map_or(value, |m| value * m)
    }

    /// Convertit une valeur en mètres vers cette unité (identité pour les degrés)
    pub fn from_meters(self, value: f64) -> f64 {
        self.meters_per_unit().map_or(value, |m| value / m)
    }

    /// Suffixe d'affichage
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Meter => "m",
            Self::Foot => "ft",
            Self::UsSurveyFoot => "us-ft",
            Self::Degree => "°",
        }
    }

    /// Unité DXF (`$INSUNITS`) correspondante
    pub fn dxf_units(self) -> dxf_lite::Units {
        match self {
            Self::Meter => dxf_lite::Units::Meters,
            // Le DXF ne distingue pas pied international et pied US
            Self::Foot | Self::UsSurveyFoot => dxf_lite::Units::Feet,
            Self::Degree => dxf_lite::Units::Unitless,
        }
    }
}
