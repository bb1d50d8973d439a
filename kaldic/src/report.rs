//! Rapport d'export (DXF, overlay GeoJSON)
//!
//! Collecte les compteurs d'un export, l'empreinte du document produit
//! et l'éventuelle erreur; affichable en console ou sauvegardable en JSON.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;

/// Statut de l'export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExportStatus {
    /// Document écrit
    Success,
    /// Rien n'a été écrit
    Failed,
}

/// Format produit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Dxf,
    GeoJson,
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dxf => f.write_str("DXF"),
            Self::GeoJson => f.write_str("GeoJSON"),
        }
    }
}

/// Statistiques par calque
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayerStats {
    pub entities: usize,
    pub vertices: usize,
}

/// Rapport complet d'un export
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub format: ExportFormat,
    /// Fichier de sortie
    pub output: String,
    /// Système natif des features
    pub source_crs: String,
    /// Système des coordonnées écrites
    pub target_crs: String,
    /// Nombre de features en entrée
    pub features: usize,
    /// Nombre d'entités écrites
    pub entities: usize,
    pub by_layer: BTreeMap<String, LayerStats>,
    /// Taille du document en octets
    pub bytes: usize,
    /// Empreinte blake3 du document (hex)
    pub digest: Option<String>,
    pub duration_secs: f64,
    pub status: ExportStatus,
    pub error: Option<String>,
}

impl ExportReport {
    pub fn new(format: ExportFormat, output: &Path, source_crs: &str, target_crs: &str) -> Self {
        Self {
            format,
            output: output.display().to_string(),
            source_crs: source_crs.to_string(),
            target_crs: target_crs.to_string(),
            features: 0,
            entities: 0,
            by_layer: BTreeMap::new(),
            bytes: 0,
            digest: None,
            duration_secs: 0.0,
            status: ExportStatus::Success,
            error: None,
        }
    }

    /// Enregistre une entité écrite
    pub fn record_entity(&mut self, layer: &str, vertices: usize) {
        self.entities += 1;
        let stats = self.by_layer.entry(layer.to_string()).or_default();
        stats.entities += 1;
        stats.vertices += vertices;
    }

    /// Enregistre le document produit (taille + empreinte)
    pub fn record_document(&mut self, bytes: &[u8]) {
        self.bytes = bytes.len();
        self.digest = Some(hex::encode(blake3::hash(bytes).as_bytes()));
    }

    /// Marque l'export en échec; les compteurs d'entités sont remis à zéro
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = ExportStatus::Failed;
        self.error = Some(message.into());
        self.entities = 0;
        self.by_layer.clear();
        self.bytes = 0;
        self.digest = None;
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    pub fn is_success(&self) -> bool {
        self.status == ExportStatus::Success
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("EXPORT REPORT - {}", self.format);
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}", self.status);
        println!("Duration: {:.3}s", self.duration_secs);
        println!("Output: {}", self.output);
        println!("CRS: {} -> {}", self.source_crs, self.target_crs);

        println!("\n--- SUMMARY ---");
        println!("Features: {}", self.features);
        println!("Entities: {}", self.entities);
        println!("Size: {} bytes", self.bytes);
        if let Some(ref digest) = self.digest {
            println!("blake3: {}", digest);
        }

        if !self.by_layer.is_empty() {
            println!("\n--- BY LAYER ---");
            for (layer, stats) in &self.by_layer {
                println!("  {}: {} entities, {} vertices", layer, stats.entities, stats.vertices);
            }
        }

        if let Some(ref error) = self.error {
            println!("\n--- ERROR ---");
            println!("  {}", error);
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).context(format!("Failed to write report: {}", path.display()))?;
        Ok(())
    }

    /// Affichage compact
    pub fn summary(&self) -> String {
        match self.status {
            ExportStatus::Success => format!(
                "{} {}: {} entities, {} bytes",
                self.format, self.output, self.entities, self.bytes
            ),
            ExportStatus::Failed => format!(
                "{} {}: failed ({})",
                self.format,
                self.output,
                self.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}
