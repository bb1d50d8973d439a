//! Types de données pour le crate dxf-lite

/// Index de couleur AutoCAD (ACI, code de groupe 62)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AciColor(pub i16);

impl AciColor {
    /// Couleur héritée du bloc
    pub const BY_BLOCK: Self = Self(0);
    pub const RED: Self = Self(1);
    pub const YELLOW: Self = Self(2);
    pub const GREEN: Self = Self(3);
    pub const CYAN: Self = Self(4);
    pub const BLUE: Self = Self(5);
    pub const MAGENTA: Self = Self(6);
    /// Couleur de premier plan (blanc sur fond sombre, noir sur fond clair)
    pub const WHITE: Self = Self(7);
    /// Couleur héritée du calque
    pub const BY_LAYER: Self = Self(256);

    /// Vérifie que l'index est dans la plage ACI
    pub fn is_valid(self) -> bool {
        (0..=256).contains(&self.0)
    }
}

impl Default for AciColor {
    fn default() -> Self {
        Self::BY_LAYER
    }
}

/// Unités du dessin (variable d'en-tête `$INSUNITS`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Units {
    #[default]
    Unitless,
    Feet,
    Meters,
}

impl Units {
    /// Code DXF de l'unité
    pub fn code(self) -> i16 {
        match self {
            Self::Unitless => 0,
            Self::Feet => 2,
            Self::Meters => 6,
        }
    }

    /// Unité depuis un code DXF (codes inconnus: sans unité)
    pub fn from_code(code: i16) -> Self {
        match code {
            2 => Self::Feet,
            6 => Self::Meters,
            _ => Self::Unitless,
        }
    }
}

/// Emprise du dessin (`$EXTMIN` / `$EXTMAX`)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extents {
    pub min: (f64, f64),
    pub max: (f64, f64),
}

/// Variables d'en-tête supportées
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    pub units: Units,
    pub extents: Option<Extents>,
}

/// Polyligne légère (entité LWPOLYLINE)
#[derive(Debug, Clone, PartialEq)]
pub struct LwPolyline {
    /// Nom du calque (code 8)
    pub layer: String,
    /// Couleur (code 62)
    pub color: AciColor,
    /// Sommets dans l'ordre (codes 10/20)
    pub vertices: Vec<(f64, f64)>,
    /// Drapeau de fermeture (bit 1 du code 70)
    pub closed: bool,
}

impl LwPolyline {
    /// Crée une polyligne ouverte
    pub fn open(layer: impl Into<String>, color: AciColor, vertices: Vec<(f64, f64)>) -> Self {
        Self {
            layer: layer.into(),
            color,
            vertices,
            closed: false,
        }
    }
}

/// Entité de la section ENTITIES
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    LwPolyline(LwPolyline),
}

impl Entity {
    /// Nom du type d'entité DXF
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LwPolyline(_) => "LWPOLYLINE",
        }
    }

    pub fn layer(&self) -> &str {
        match self {
            Self::LwPolyline(p) => &p.layer,
        }
    }
}

impl From<LwPolyline> for Entity {
    fn from(polyline: LwPolyline) -> Self {
        Self::LwPolyline(polyline)
    }
}

/// Document DXF complet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub header: Header,
    pub entities: Vec<Entity>,
}

impl Document {
    pub fn new(header: Header, entities: Vec<Entity>) -> Self {
        Self { header, entities }
    }

    /// Itère sur les polylignes du document, dans l'ordre
    pub fn polylines(&self) -> impl Iterator<Item = &LwPolyline> {
        self.entities.iter().map(|e| match e {
            Entity::LwPolyline(p) => p,
        })
    }
}
