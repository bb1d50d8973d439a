//! Tests d'intégration: features → DXF / overlay → relecture

use std::str::FromStr;

use dxf_lite::{AciColor, Units};
use geo::Coord;
use kaldic::export::{dxf, geojson as overlay};
use kaldic::{AppStore, Category, Config, Feature, FeatureCollection, Reprojector};

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("kaldic_it_{}", name))
}

#[test]
fn test_demo_dxf_round_trip() {
    let demo = FeatureCollection::demo().unwrap();
    let reprojector = Reprojector::with_defaults();

    let text = dxf::serialize(&demo, &reprojector).unwrap();
    let doc = dxf_lite::parse_str(&text).unwrap();

    assert_eq!(doc.header.units, Units::Feet);
    assert_eq!(doc.entities.len(), 3);

    let polylines: Vec<_> = doc.polylines().collect();
    for (polyline, feature) in polylines.iter().zip(&demo.features) {
        assert_eq!(polyline.layer, feature.category.label());
        assert_eq!(polyline.vertices.len(), 4);
        assert!(!polyline.closed);

        // Coordonnées natives, sans perte
        let expected: Vec<(f64, f64)> = feature.geometry.coords().map(|c| (c.x, c.y)).collect();
        assert_eq!(polyline.vertices, expected);
    }

    assert_eq!(polylines[0].color, AciColor::RED);
    assert_eq!(polylines[1].color, AciColor::BLUE);
    assert_eq!(polylines[1].color, polylines[2].color);
    assert_ne!(polylines[0].color, polylines[1].color);
}

#[test]
fn test_padded_layer_label_round_trip() {
    let feature = Feature::polyline(
        "s-1",
        Category::from(" SIDEWALK "),
        vec![(0.0, 0.0), (10.0, 0.0)],
        "Sidewalk",
        "manual",
    );
    let collection = FeatureCollection::new("EPSG:6405", vec![feature]);

    let text = dxf::serialize(&collection, &Reprojector::with_defaults()).unwrap();
    let doc = dxf_lite::parse_str(&text).unwrap();
    assert_eq!(doc.entities[0].layer(), "SIDEWALK");
    assert_eq!(doc.entities[0].layer(), collection.features[0].category.label());
}

#[test]
fn test_dxf_is_deterministic() {
    let demo = FeatureCollection::demo().unwrap();
    let reprojector = Reprojector::with_defaults();

    let a = dxf::serialize(&demo, &reprojector).unwrap();
    let b = dxf::serialize(&demo, &reprojector).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_empty_collection_is_well_formed() {
    let empty = FeatureCollection::new("EPSG:6405", vec![]);
    let text = dxf::serialize(&empty, &Reprojector::with_defaults()).unwrap();

    assert!(text.contains("0\nSECTION\n2\nENTITIES\n0\nENDSEC\n"));
    assert!(text.ends_with("0\nEOF\n"));
    assert!(!text.contains("$EXTMIN"));

    let doc = dxf_lite::parse_str(&text).unwrap();
    assert!(doc.entities.is_empty());
}

#[test]
fn test_single_point_feature_writes_nothing() {
    let mut demo = FeatureCollection::demo().unwrap();
    demo.features.push(Feature::polyline(
        "stub",
        Category::RoadCurb,
        vec![(569800.0, 886000.0)],
        "Stub",
        "manual",
    ));

    let path = temp_path("single_point.dxf");
    std::fs::remove_file(&path).ok();

    assert!(dxf::write_file(&demo, &Reprojector::with_defaults(), &path).is_err());
    assert!(!path.exists());
}

#[test]
fn test_write_file_then_parse_bytes() {
    let demo = FeatureCollection::demo().unwrap();
    let path = temp_path(dxf::DEFAULT_FILE_NAME);

    let report = dxf::write_file(&demo, &Reprojector::with_defaults(), &path).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    let doc = dxf_lite::parse(&bytes).unwrap();

    assert_eq!(doc.entities.len(), report.entities);
    assert_eq!(bytes.len(), report.bytes);

    std::fs::remove_file(path).ok();
}

#[test]
fn test_overlay_parses_as_geojson() {
    let demo = FeatureCollection::demo().unwrap();
    let reprojector = Reprojector::with_defaults();
    let path = temp_path("overlay.geojson");

    overlay::export_overlay(&demo, &reprojector, "EPSG:3857", &path).unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    let parsed = geojson::GeoJson::from_str(&content).unwrap();

    let geojson::GeoJson::FeatureCollection(fc) = parsed else {
        panic!("expected a FeatureCollection");
    };
    assert_eq!(fc.features.len(), 3);

    for (out, feature) in fc.features.iter().zip(&demo.features) {
        let stroke = feature.category.stroke();
        assert_eq!(out.property("layer").and_then(|v| v.as_str()), Some(feature.category.label()));
        assert_eq!(out.property("stroke").and_then(|v| v.as_str()), Some(stroke.color));
        assert_eq!(out.property("stroke-width").and_then(|v| v.as_u64()), Some(stroke.width as u64));

        let geometry = out.geometry.as_ref().unwrap();
        let geojson::Value::LineString(coords) = &geometry.value else {
            panic!("expected a LineString");
        };
        assert_eq!(coords.len(), 4);

        // Chaque sommet correspond à la reprojection du sommet natif
        for (pos, native) in coords.iter().zip(feature.geometry.coords()) {
            let expected = reprojector.project(*native, "EPSG:6405", "EPSG:3857").unwrap();
            assert!((pos[0] - expected.x).abs() < 1e-6);
            assert!((pos[1] - expected.y).abs() < 1e-6);
        }
    }

    std::fs::remove_file(path).ok();
}

#[test]
fn test_demo_extent_display_bounds() {
    let demo = FeatureCollection::demo().unwrap();
    let reprojector = Reprojector::with_defaults();
    let extent = demo.extent.unwrap();

    let display = reprojector.project_extent(extent, &demo.crs, "EPSG:3857").unwrap();

    // Tous les sommets reprojetés tombent dans l'emprise reprojetée
    for feature in &demo.features {
        let line = reprojector.project_line(feature.geometry.line(), &demo.crs, "EPSG:3857").unwrap();
        assert!(line.coords().all(|&c| display.contains(c)));
    }

    let center = reprojector.project(extent.center(), &demo.crs, "EPSG:3857").unwrap();
    assert!(display.contains(center));
    assert!(display.contains(Coord { x: -12506017.2, y: 3953161.7 }));
}

#[test]
fn test_arizona_config_export_in_meters() {
    let reprojector = Config::from_preset("arizona").unwrap().build_reprojector().unwrap();
    let demo = FeatureCollection::demo().unwrap();

    // Même jeu de features converti en mètres (EPSG:6404)
    let features = demo
        .features
        .iter()
        .map(|f| {
            let line = reprojector.project_line(f.geometry.line(), "EPSG:6405", "EPSG:6404").unwrap();
            let points = line.coords().map(|c| (c.x, c.y)).collect();
            Feature::polyline(f.id.clone(), f.category.clone(), points, f.properties.name.clone(), "")
        })
        .collect();
    let metric = FeatureCollection::new("EPSG:6404", features);

    let doc = dxf_lite::parse_str(&dxf::serialize(&metric, &reprojector).unwrap()).unwrap();
    assert_eq!(doc.header.units, Units::Meters);
    assert_eq!(doc.entities.len(), 3);
}

#[test]
fn test_store_drives_panel() {
    let demo = FeatureCollection::demo().unwrap();
    let mut store = AppStore::default();
    store.replace_features(demo.features).unwrap();
    store.set_viewer_ready(true);
    store.select("centerline-1").unwrap();

    let text = kaldic::panel::render(store.state(), kaldic::reproject_lite::Unit::Foot);
    assert!(text.contains("3 features detected"));
    assert!(text.contains("* [ROAD_CENTERLINE] LWPOLYLINE"));

    store.toggle_panel();
    assert!(kaldic::panel::render(store.state(), kaldic::reproject_lite::Unit::Foot).is_empty());
}
