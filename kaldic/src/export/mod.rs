//! Modules d'export (DXF, overlay GeoJSON)

pub mod dxf;
pub mod geojson;
