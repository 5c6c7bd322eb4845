//! Shared map view state.
//!
//! One [`MapViewStore`] is created per map page and handed to every component
//! that reads or writes the view. Setters compare against the latest value and
//! skip the write (and the change notification) when nothing changed.

use std::sync::Arc;

use findpaw_core::{Coordinate, SightingMarker};
use tokio::sync::watch;

use crate::sdk::MapHandle;

pub const DEFAULT_ZOOM: u8 = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct MapViewState {
    pub instance: Option<MapHandle>,
    pub center: Coordinate,
    pub my_location: Option<Coordinate>,
    pub zoom: u8,
    pub selected_sighting: Option<SightingMarker>,
}

impl Default for MapViewState {
    fn default() -> Self {
        Self::centered_at(Coordinate::FALLBACK)
    }
}

impl MapViewState {
    #[must_use]
    pub fn centered_at(center: Coordinate) -> Self {
        Self {
            instance: None,
            center,
            my_location: None,
            zoom: DEFAULT_ZOOM,
            selected_sighting: None,
        }
    }
}

/// Cloneable handle to one shared [`MapViewState`].
#[derive(Debug, Clone)]
pub struct MapViewStore {
    tx: Arc<watch::Sender<MapViewState>>,
}

impl Default for MapViewStore {
    fn default() -> Self {
        Self::new(MapViewState::default())
    }
}

impl MapViewStore {
    #[must_use]
    pub fn new(initial: MapViewState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    #[must_use]
    pub fn snapshot(&self) -> MapViewState {
        self.tx.borrow().clone()
    }

    #[must_use]
    pub fn instance(&self) -> Option<MapHandle> {
        self.tx.borrow().instance
    }

    #[must_use]
    pub fn center(&self) -> Coordinate {
        self.tx.borrow().center
    }

    #[must_use]
    pub fn my_location(&self) -> Option<Coordinate> {
        self.tx.borrow().my_location
    }

    #[must_use]
    pub fn selected_sighting(&self) -> Option<SightingMarker> {
        self.tx.borrow().selected_sighting.clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<MapViewState> {
        self.tx.subscribe()
    }

    pub fn set_instance(&self, instance: Option<MapHandle>) -> bool {
        self.update("instance", |s| replace_if_changed(&mut s.instance, instance))
    }

    /// Clears the instance only if it still refers to `map`.
    pub fn release_instance(&self, map: MapHandle) -> bool {
        self.update("instance", |s| {
            if s.instance == Some(map) {
                s.instance = None;
                true
            } else {
                false
            }
        })
    }

    pub fn set_center(&self, center: Coordinate) -> bool {
        self.update("center", |s| replace_if_changed(&mut s.center, center))
    }

    pub fn set_my_location(&self, location: Coordinate) -> bool {
        self.update("my_location", |s| {
            replace_if_changed(&mut s.my_location, Some(location))
        })
    }

    pub fn set_zoom(&self, zoom: u8) -> bool {
        self.update("zoom", |s| replace_if_changed(&mut s.zoom, zoom))
    }

    pub fn select_sighting(&self, sighting: Option<SightingMarker>) -> bool {
        self.update("selected_sighting", |s| {
            replace_if_changed(&mut s.selected_sighting, sighting)
        })
    }

    fn update(&self, field: &'static str, apply: impl FnOnce(&mut MapViewState) -> bool) -> bool {
        let changed = self.tx.send_if_modified(apply);
        if !changed {
            tracing::debug!(field, "map view write skipped, value unchanged");
        }
        changed
    }
}

fn replace_if_changed<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}
