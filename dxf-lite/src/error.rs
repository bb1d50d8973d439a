//! Types d'erreurs pour le crate dxf-lite

use thiserror::Error;

/// Erreurs pouvant survenir lors de l'écriture ou de la lecture DXF
#[derive(Debug, Error)]
pub enum DxfError {
    /// Erreur d'I/O lors de l'écriture du document
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Géométrie invalide (moins de 2 sommets, coordonnée non finie)
    #[error("Invalid geometry for entity #{index}: {reason}")]
    InvalidGeometry { index: usize, reason: String },

    /// Nom de calque vide ou contenant des caractères interdits
    #[error("Invalid layer name {layer:?} for entity #{index}")]
    InvalidLayer { index: usize, layer: String },

    /// Index de couleur hors de la plage ACI (0..=256)
    #[error("Invalid color index {color} for entity #{index}")]
    InvalidColor { index: usize, color: i16 },

    /// Variable d'en-tête invalide
    #[error("Invalid header variable {name}: {reason}")]
    InvalidHeader { name: &'static str, reason: String },

    /// Erreur de parsing avec numéro de ligne (1-based)
    #[error("Parse error at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    /// Fin de fichier atteinte sans marqueur EOF
    #[error("Unexpected end of file: missing EOF marker")]
    UnexpectedEof,
}

impl DxfError {
    /// Crée une erreur de parsing avec contexte
    pub fn parse_error(line: usize, reason: impl Into<String>) -> Self {
        Self::Parse {
            line,
            reason: reason.into(),
        }
    }

    /// Crée une erreur de géométrie invalide
    pub fn invalid_geometry(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            index,
            reason: reason.into(),
        }
    }
}
