//! Configuration: systèmes de référence additionnels et variables d'environnement

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::export::geojson::DEFAULT_DISPLAY_CRS;
use crate::reproject_lite::{normalize_id, ReferenceSystem, Reprojector};

/// Presets embarqués
pub const PRESETS: &[&str] = &["default", "arizona"];

/// Système natif par défaut (orthomosaïque de démonstration)
pub const DEFAULT_SOURCE_CRS: &str = "EPSG:6405";

/// Configuration principale
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Systèmes enregistrés en plus des systèmes intégrés
    #[serde(default)]
    pub reference_systems: Vec<ReferenceSystem>,
}

impl Config {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }

    /// Charge une configuration depuis un preset embarqué
    pub fn from_preset(preset: &str) -> Result<Self> {
        match preset {
            "default" => Self::load_embedded(include_str!("presets/default.json")),
            "arizona" => Self::load_embedded(include_str!("presets/arizona.json")),
            _ => anyhow::bail!("Unknown preset: {}. Use: {}", preset, PRESETS.join(", ")),
        }
    }

    /// Nom de preset ou chemin vers un fichier JSON
    pub fn resolve(name_or_path: &str) -> Result<Self> {
        if PRESETS.contains(&name_or_path) {
            Self::from_preset(name_or_path)
        } else {
            Self::load(Path::new(name_or_path))
        }
    }

    fn load_embedded(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse embedded config")
    }

    /// Enregistre les systèmes de la configuration; retourne leur nombre
    pub fn apply(&self, reprojector: &mut Reprojector) -> Result<usize> {
        for system in &self.reference_systems {
            reprojector
                .register(system.clone())
                .context(format!("Cannot register reference system {}", system.id))?;
        }
        debug!(count = self.reference_systems.len(), "Applied reference systems from config");
        Ok(self.reference_systems.len())
    }

    /// Registre avec les systèmes intégrés et ceux de la configuration
    pub fn build_reprojector(&self) -> Result<Reprojector> {
        let mut reprojector = Reprojector::with_defaults();
        self.apply(&mut reprojector)?;
        Ok(reprojector)
    }
}

/// Réglages d'exécution (environnement, surchargés par la CLI)
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Système natif par défaut des coordonnées saisies
    pub source_crs: String,
    /// Système d'affichage de la carte
    pub display_crs: String,
    /// Répertoire des fichiers produits
    pub output_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source_crs: DEFAULT_SOURCE_CRS.into(),
            display_crs: DEFAULT_DISPLAY_CRS.into(),
            output_dir: PathBuf::from("."),
        }
    }
}

impl Settings {
    /// Charge les réglages depuis les variables d'environnement
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            source_crs: non_empty("KALDIC_SOURCE_CRS")
                .map(|v| normalize_id(&v))
                .unwrap_or(defaults.source_crs),
            display_crs: non_empty("KALDIC_DISPLAY_CRS")
                .map(|v| normalize_id(&v))
                .unwrap_or(defaults.display_crs),
            output_dir: non_empty("KALDIC_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
        }
    }

    /// Applique les surcharges de la ligne de commande
    pub fn apply_overrides(
        &mut self,
        source_crs: Option<String>,
        display_crs: Option<String>,
        output_dir: Option<PathBuf>,
    ) {
        if let Some(source_crs) = source_crs {
            self.source_crs = normalize_id(&source_crs);
        }
        if let Some(display_crs) = display_crs {
            self.display_crs = normalize_id(&display_crs);
        }
        if let Some(output_dir) = output_dir {
            self.output_dir = output_dir;
        }
    }
}
