//! Panneau textuel des features détectées

use crate::reproject_lite::Unit;
use crate::store::AppState;

/// Rendu du panneau (chaîne vide si le panneau est masqué)
///
/// Les longueurs sont affichées avec une décimale dans l'unité native.
pub fn render(state: &AppState, unit: Unit) -> String {
    if !state.panel_visible {
        return String::new();
    }

    let count = state.features.len();
    let mut out = String::from("Detected Features\n");
    out.push_str(&format!(
        "{} feature{} detected\n",
        count,
        if count == 1 { "" } else { "s" }
    ));

    for feature in &state.features {
        let marker = if state.selected.as_deref() == Some(feature.id.as_str()) {
            '*'
        } else {
            ' '
        };

        out.push('\n');
        out.push_str(&format!("{} [{}] {}\n", marker, feature.category, feature.geometry.kind()));
        out.push_str(&format!("  {}\n", feature.properties.name));
        out.push_str(&format!(
            "  Length: {:.1} {}\n",
            feature.properties.length,
            unit.symbol()
        ));
        out.push_str(&format!("  {}\n", feature.properties.detected_by));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{Category, Feature, FeatureCollection};
    use crate::store::AppStore;

    fn demo_state() -> AppState {
        AppState {
            features: FeatureCollection::demo().unwrap().features,
            ..Default::default()
        }
    }

    #[test]
    fn test_render_demo() {
        let text = render(&demo_state(), Unit::Foot);

        assert!(text.starts_with("Detected Features\n3 features detected\n"));
        assert_eq!(text.matches("Length: 212.1 ft").count(), 3);
        assert!(text.contains("  [ROAD_CENTERLINE] LWPOLYLINE\n  Main Street Centerline\n"));
        assert!(text.contains("Grounding DINO + SAM 2 (mock)"));
        assert!(!text.contains('*'));

        // Ordre des features conservé
        let center = text.find("Main Street Centerline").unwrap();
        let north = text.find("Main Street North Curb").unwrap();
        let south = text.find("Main Street South Curb").unwrap();
        assert!(center < north && north < south);
    }

    #[test]
    fn test_render_singular_and_empty() {
        let mut state = AppState::default();
        assert!(render(&state, Unit::Foot).contains("0 features detected"));

        state.features = vec![Feature::polyline(
            "a",
            Category::RoadCurb,
            vec![(0.0, 0.0), (3.0, 4.0)],
            "Curb",
            "manual",
        )];
        let text = render(&state, Unit::Meter);
        assert!(text.contains("1 feature detected\n"));
        assert!(text.contains("Length: 5.0 m"));
    }

    #[test]
    fn test_render_marks_selection() {
        let mut store = AppStore::new(demo_state());
        store.select("curb-1").unwrap();

        let text = render(store.state(), Unit::Foot);
        assert!(text.contains("* [ROAD_CURB] LWPOLYLINE\n  Main Street North Curb"));
        assert_eq!(text.matches('*').count(), 1);
    }

    #[test]
    fn test_render_exact_layout() {
        let state = AppState {
            features: vec![Feature::polyline("a", Category::RoadCurb, vec![(0.0, 0.0), (3.0, 4.0)], "Curb", "manual")],
            selected: Some("a".into()),
            ..Default::default()
        };
        assert_eq!(
            render(&state, Unit::Meter),
            "Detected Features\n1 feature detected\n\n* [ROAD_CURB] LWPOLYLINE\n  Curb\n  Length: 5.0 m\n  manual\n"
        );
    }

    #[test]
    fn test_render_ignores_unknown_selection() {
        let store = AppStore::new(AppState {
            selected: Some("ghost".into()),
            ..demo_state()
        });
        assert!(!render(store.state(), Unit::Foot).contains('*'));
    }

    #[test]
    fn test_render_hidden_panel() {
        let mut store = AppStore::new(demo_state());
        store.toggle_panel();
        assert_eq!(render(store.state(), Unit::Foot), "");
    }
}
