//! Sighting markers kept in step with the latest fetched list.

use std::sync::Arc;

use findpaw_core::SightingMarker;
use tokio::sync::watch;

use crate::sdk::{
    EventTarget, ListenerHandle, MapEvent, MapHandle, MapSdk, MarkerHandle, MarkerOptions,
};
use crate::store::MapViewStore;

/// Result of the sightings query as seen by the map.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SightingFeed {
    #[default]
    Loading,
    Loaded(Vec<SightingMarker>),
}

struct RenderedMarker {
    marker: MarkerHandle,
    click: ListenerHandle,
}

/// Rendered sighting markers.
///
/// Every [`MarkerLayer::reconcile`] removes all tracked markers and rebuilds
/// them from the feed, so the rendered set always equals the latest list.
pub struct MarkerLayer<S: MapSdk> {
    sdk: Arc<S>,
    store: MapViewStore,
    rendered: Vec<RenderedMarker>,
}

impl<S: MapSdk> MarkerLayer<S> {
    pub fn new(sdk: Arc<S>, store: MapViewStore) -> Self {
        Self {
            sdk,
            store,
            rendered: Vec::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rendered.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rendered.is_empty()
    }

    /// Rebuilds the markers for `map` from `feed`. Returns the rendered count.
    pub fn reconcile(&mut self, map: Option<MapHandle>, feed: &SightingFeed) -> usize {
        self.clear();

        let (Some(map), SightingFeed::Loaded(records)) = (map, feed) else {
            return 0;
        };

        for record in records {
            let options = MarkerOptions {
                title: Some(record.breed_label.clone()),
                icon_url: Some(record.image_url.clone()),
                ..MarkerOptions::at(record.coordinate)
            };
            let marker = self.sdk.create_marker(map, &options);

            let store = self.store.clone();
            let selected = record.clone();
            let click = self.sdk.add_listener(
                EventTarget::Marker(marker),
                MapEvent::Click,
                Arc::new(move |_| {
                    store.select_sighting(Some(selected.clone()));
                }),
            );
            self.rendered.push(RenderedMarker { marker, click });
        }

        tracing::debug!(map = map.0, count = self.rendered.len(), "sighting markers rendered");
        self.rendered.len()
    }

    pub fn clear(&mut self) {
        for rendered in self.rendered.drain(..) {
            self.sdk.remove_listener(rendered.click);
            self.sdk.remove_marker(rendered.marker);
        }
    }

    /// Reconciles whenever the map instance or the feed changes, until the
    /// feed sender is dropped. Markers are cleared on return.
    pub async fn follow(mut self, mut feed: watch::Receiver<SightingFeed>) {
        let mut view = self.store.subscribe();
        let mut map = view.borrow_and_update().instance;
        self.reconcile(map, &feed.borrow_and_update());

        loop {
            tokio::select! {
                changed = feed.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                changed = view.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let instance = view.borrow_and_update().instance;
                    if instance == map {
                        continue;
                    }
                    map = instance;
                }
            }
            let current = feed.borrow_and_update().clone();
            self.reconcile(map, &current);
        }
    }
}

impl<S: MapSdk> Drop for MarkerLayer<S> {
    fn drop(&mut self) {
        self.clear();
    }
}
