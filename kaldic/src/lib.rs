//! # kaldic
//!
//! Annotation d'orthomosaïques aériennes: features de voirie détectées
//! (axes, bordures), reprojection pour l'affichage et export DXF.
//!
//! ## Features
//!
//! - Registre de systèmes de référence en Rust pur (State Plane, UTM, Web Mercator)
//! - Reprojection de points, polylignes et emprises
//! - Export DXF (LWPOLYLINE) et overlay GeoJSON pour la carte
//! - Store d'état applicatif avec abonnements
//!
//! ## Usage CLI
//!
//! ```bash
//! # Export DXF des features de démonstration
//! kaldic export-dxf --output ./kaldic_demo.dxf
//!
//! # Overlay GeoJSON en Web Mercator
//! kaldic overlay --crs EPSG:3857
//!
//! # Reprojeter un point
//! kaldic project 569800 886000 --from EPSG:6405 --to EPSG:4326
//! ```

pub mod config;
pub mod export;
pub mod feature;
pub mod panel;
pub mod report;
pub mod reproject_lite;
pub mod store;

pub use config::{Config, Settings};
pub use feature::{Category, Feature, FeatureCollection, FeatureError};
pub use report::{ExportReport, ExportStatus};
pub use reproject_lite::{Extent, ReferenceSystem, ReprojectError, Reprojector};
pub use store::{AppState, AppStore, StoreError};
