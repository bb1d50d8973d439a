//! État applicatif partagé entre la carte et le panneau
//!
//! Un seul propriétaire de l'état; les vues s'abonnent et reçoivent
//! l'état validé après chaque mutation, de façon synchrone.

use std::collections::HashSet;

use thiserror::Error;
use tracing::debug;

use crate::feature::Feature;

/// Erreurs du store
#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("Unknown feature id: {0}")]
    UnknownFeature(String),

    #[error("Duplicate feature id: {0}")]
    DuplicateFeature(String),
}

/// État de l'interface
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    /// La carte a fini son initialisation
    pub viewer_ready: bool,
    /// Features affichées, dans l'ordre du pipeline
    pub features: Vec<Feature>,
    /// Id de la feature sélectionnée
    pub selected: Option<String>,
    pub panel_visible: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            viewer_ready: false,
            features: Vec::new(),
            selected: None,
            panel_visible: true,
        }
    }
}

impl AppState {
    /// Premier id présent plusieurs fois
    fn duplicate_id(features: &[Feature]) -> Option<&str> {
        let mut seen = HashSet::with_capacity(features.len());
        features
            .iter()
            .map(|f| f.id.as_str())
            .find(|id| !seen.insert(*id))
    }

    pub fn selected_feature(&self) -> Option<&Feature> {
        let id = self.selected.as_deref()?;
        self.features.iter().find(|f| f.id == id)
    }
}

/// Identifiant d'abonnement (pour `unsubscribe`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn Fn(&AppState)>;

/// Store de l'état applicatif
pub struct AppStore {
    state: AppState,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_id: u64,
}

impl Default for AppStore {
    fn default() -> Self {
        Self::new(AppState::default())
    }
}

impl std::fmt::Debug for AppStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppStore")
            .field("state", &self.state)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl AppStore {
    /// Store initialisé avec un état cohérent: ids uniques (première
    /// occurrence conservée) et sélection résolue
    pub fn new(mut state: AppState) -> Self {
        if AppState::duplicate_id(&state.features).is_some() {
            let mut seen = HashSet::new();
            state.features.retain(|f| {
                let first = seen.insert(f.id.clone());
                if !first {
                    debug!(id = %f.id, "Duplicate feature dropped");
                }
                first
            });
        }
        if state.selected_feature().is_none() {
            if let Some(id) = state.selected.take() {
                debug!(id = %id, "Selection dropped: unknown feature");
            }
        }

        Self {
            state,
            subscribers: Vec::new(),
            next_id: 0,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn selected_feature(&self) -> Option<&Feature> {
        self.state.selected_feature()
    }

    /// Abonne une vue; appelée après chaque mutation
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&AppState) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Retourne `false` si l'abonnement n'existait pas
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    pub fn set_viewer_ready(&mut self, ready: bool) {
        self.state.viewer_ready = ready;
        self.notify();
    }

    /// Remplace les features; la sélection est perdue si son id disparaît.
    /// Des ids en double laissent l'état inchangé
    pub fn replace_features(&mut self, features: Vec<Feature>) -> Result<(), StoreError> {
        if let Some(id) = AppState::duplicate_id(&features) {
            return Err(StoreError::DuplicateFeature(id.to_string()));
        }

        self.state.features = features;
        if self.state.selected_feature().is_none() {
            if let Some(id) = self.state.selected.take() {
                debug!(id = %id, "Selection dropped: feature no longer present");
            }
        }
        self.notify();
        Ok(())
    }

    /// Sélectionne une feature existante (état inchangé sinon)
    pub fn select(&mut self, id: &str) -> Result<(), StoreError> {
        if !self.state.features.iter().any(|f| f.id == id) {
            return Err(StoreError::UnknownFeature(id.to_string()));
        }
        self.state.selected = Some(id.to_string());
        self.notify();
        Ok(())
    }

    pub fn deselect(&mut self) {
        self.state.selected = None;
        self.notify();
    }

    pub fn toggle_panel(&mut self) {
        self.state.panel_visible = !self.state.panel_visible;
        self.notify();
    }

    fn notify(&self) {
        for (_, callback) in &self.subscribers {
            callback(&self.state);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::feature::FeatureCollection;

    fn demo_store() -> AppStore {
        let mut store = AppStore::default();
        store.replace_features(FeatureCollection::demo().unwrap().features).unwrap();
        store
    }

    #[test]
    fn test_initial_state() {
        let store = AppStore::default();
        let state = store.state();
        assert!(!state.viewer_ready);
        assert!(state.features.is_empty());
        assert!(state.selected.is_none());
        assert!(state.panel_visible);
    }

    #[test]
    fn test_select_and_deselect() {
        let mut store = demo_store();
        store.select("curb-1").unwrap();
        assert_eq!(store.selected_feature().map(|f| f.id.as_str()), Some("curb-1"));

        store.deselect();
        assert!(store.selected_feature().is_none());
    }

    #[test]
    fn test_select_unknown_leaves_state() {
        let mut store = demo_store();
        store.select("centerline-1").unwrap();
        let before = store.state().clone();

        assert_eq!(
            store.select("nope"),
            Err(StoreError::UnknownFeature("nope".into()))
        );
        assert_eq!(store.state(), &before);
    }

    #[test]
    fn test_replace_features_drops_stale_selection() {
        let mut store = demo_store();
        store.select("curb-2").unwrap();

        let kept: Vec<Feature> = store
            .state()
            .features
            .iter()
            .filter(|f| f.id != "curb-2")
            .cloned()
            .collect();
        store.replace_features(kept.clone()).unwrap();
        assert!(store.state().selected.is_none());

        store.select("curb-1").unwrap();
        store.replace_features(kept).unwrap();
        assert_eq!(store.state().selected.as_deref(), Some("curb-1"));
    }

    #[test]
    fn test_new_drops_dangling_selection() {
        let features = FeatureCollection::demo().unwrap().features;

        let store = AppStore::new(AppState {
            features: features.clone(),
            selected: Some("ghost".into()),
            ..AppState::default()
        });
        assert!(store.state().selected.is_none());
        assert!(store.selected_feature().is_none());

        let store = AppStore::new(AppState {
            features,
            selected: Some("curb-1".into()),
            ..AppState::default()
        });
        assert_eq!(store.selected_feature().map(|f| f.id.as_str()), Some("curb-1"));
    }

    #[test]
    fn test_new_keeps_first_of_duplicate_ids() {
        let mut features = FeatureCollection::demo().unwrap().features;
        let mut copy = features[0].clone();
        copy.properties.name = "Copy".into();
        features.push(copy);

        let store = AppStore::new(AppState {
            features,
            ..AppState::default()
        });
        assert_eq!(store.state().features.len(), 3);
        assert_eq!(store.state().features[0].properties.name, "Main Street Centerline");
    }

    #[test]
    fn test_replace_features_rejects_duplicate_ids() {
        let mut store = demo_store();
        store.select("curb-1").unwrap();
        let before = store.state().clone();

        let notified = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&notified);
        store.subscribe(move |_| *sink.borrow_mut() += 1);

        let mut features = before.features.clone();
        features.push(features[1].clone());
        assert_eq!(
            store.replace_features(features),
            Err(StoreError::DuplicateFeature(before.features[1].id.clone()))
        );
        assert_eq!(store.state(), &before);
        assert_eq!(*notified.borrow(), 0);
    }

    #[test]
    fn test_subscribers_notified_once_per_mutation() {
        let mut store = demo_store();
        let seen: Rc<RefCell<Vec<bool>>> = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&seen);
        let id = store.subscribe(move |state| sink.borrow_mut().push(state.panel_visible));

        store.toggle_panel();
        store.toggle_panel();
        assert_eq!(*seen.borrow(), vec![false, true]);

        // Échec: pas de notification
        let _ = store.select("missing");
        assert_eq!(seen.borrow().len(), 2);

        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.set_viewer_ready(true);
        assert_eq!(seen.borrow().len(), 2);
        assert!(store.state().viewer_ready);
    }

    #[test]
    fn test_subscriber_sees_committed_state() {
        let mut store = demo_store();
        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        store.subscribe(move |state| {
            *sink.borrow_mut() = state.selected_feature().map(|f| f.properties.name.clone());
        });

        store.select("centerline-1").unwrap();
        assert_eq!(seen.borrow().as_deref(), Some("Main Street Centerline"));
    }
}
