//! In-memory map SDK and container used by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use findpaw_core::Coordinate;

use crate::sdk::{
    EventHandler, EventTarget, ListenerHandle, MapContainer, MapEvent, MapHandle, MapOptions,
    MapSdk, MarkerHandle, MarkerOptions,
};
use crate::MapError;

#[derive(Default)]
pub(crate) struct FakeContainer {
    children: AtomicUsize,
}

impl FakeContainer {
    pub(crate) fn with_children(n: usize) -> Self {
        Self {
            children: AtomicUsize::new(n),
        }
    }
}

impl MapContainer for FakeContainer {
    fn child_count(&self) -> usize {
        self.children.load(Ordering::SeqCst)
    }

    fn append_child(&self) {
        self.children.fetch_add(1, Ordering::SeqCst);
    }

    fn clear_children(&self) {
        self.children.store(0, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct FakeState {
    next_id: u64,
    maps: HashMap<MapHandle, Coordinate>,
    options: Vec<MapOptions>,
    markers: HashMap<MarkerHandle, Coordinate>,
    listeners: HashMap<ListenerHandle, (EventTarget, MapEvent, EventHandler)>,
    pans: Vec<Coordinate>,
    zooms: HashMap<MapHandle, u8>,
    maps_created: usize,
}

pub(crate) struct FakeSdk {
    loaded: AtomicBool,
    state: Mutex<FakeState>,
}

impl FakeSdk {
    pub(crate) fn loaded() -> Self {
        Self {
            loaded: AtomicBool::new(true),
            state: Mutex::default(),
        }
    }

    pub(crate) fn not_loaded() -> Self {
        Self {
            loaded: AtomicBool::new(false),
            state: Mutex::default(),
        }
    }

    pub(crate) fn finish_loading(&self) {
        self.loaded.store(true, Ordering::SeqCst);
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub(crate) fn live_maps(&self) -> usize {
        self.state().maps.len()
    }

    pub(crate) fn maps_created(&self) -> usize {
        self.state().maps_created
    }

    pub(crate) fn last_options(&self) -> Option<MapOptions> {
        self.state().options.last().cloned()
    }

    pub(crate) fn live_markers(&self) -> usize {
        self.state().markers.len()
    }

    pub(crate) fn marker_positions(&self) -> Vec<Coordinate> {
        self.state().markers.values().copied().collect()
    }

    pub(crate) fn marker_handles(&self) -> Vec<MarkerHandle> {
        self.state().markers.keys().copied().collect()
    }

    pub(crate) fn live_listeners(&self) -> usize {
        self.state().listeners.len()
    }

    pub(crate) fn pans(&self) -> Vec<Coordinate> {
        self.state().pans.clone()
    }

    pub(crate) fn zoom(&self, map: MapHandle) -> Option<u8> {
        self.state().zooms.get(&map).copied()
    }

    /// Simulates the user pinching the map to another zoom level.
    pub(crate) fn zoom_to(&self, map: MapHandle, zoom: u8) {
        self.state().zooms.insert(map, zoom);
    }

    /// Simulates a user drag that ends at `center`.
    pub(crate) fn drag_to(&self, map: MapHandle, center: Coordinate) {
        let handlers = {
            let mut state = self.state();
            state.maps.insert(map, center);
            handlers_for(&state, EventTarget::Map(map), MapEvent::DragEnd)
        };
        for handler in handlers {
            handler(center);
        }
    }

    pub(crate) fn click_marker(&self, marker: MarkerHandle) {
        let (position, handlers) = {
            let state = self.state();
            let position = state.markers.get(&marker).copied();
            (
                position,
                handlers_for(&state, EventTarget::Marker(marker), MapEvent::Click),
            )
        };
        if let Some(position) = position {
            for handler in handlers {
                handler(position);
            }
        }
    }

    fn next_id(state: &mut FakeState) -> u64 {
        state.next_id += 1;
        state.next_id
    }
}

fn handlers_for(state: &FakeState, target: EventTarget, event: MapEvent) -> Vec<EventHandler> {
    state
        .listeners
        .values()
        .filter(|(t, e, _)| *t == target && *e == event)
        .map(|(_, _, h)| Arc::clone(h))
        .collect()
}

impl MapSdk for FakeSdk {
    fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    fn create_map(
        &self,
        container: &dyn MapContainer,
        options: &MapOptions,
    ) -> Result<MapHandle, MapError> {
        let mut state = self.state();
        let map = MapHandle(Self::next_id(&mut state));
        state.maps.insert(map, options.center);
        state.zooms.insert(map, options.zoom);
        state.options.push(options.clone());
        state.maps_created += 1;
        container.append_child();
        Ok(map)
    }

    fn destroy_map(&self, map: MapHandle) {
        let mut state = self.state();
        state.maps.remove(&map);
        state.zooms.remove(&map);
    }

    fn center(&self, map: MapHandle) -> Coordinate {
        self.state()
            .maps
            .get(&map)
            .copied()
            .unwrap_or(Coordinate::FALLBACK)
    }

    fn morph(&self, map: MapHandle, target: Coordinate, zoom: u8) {
        let mut state = self.state();
        state.maps.insert(map, target);
        state.zooms.insert(map, zoom);
        state.pans.push(target);
    }

    fn create_marker(&self, _map: MapHandle, options: &MarkerOptions) -> MarkerHandle {
        let mut state = self.state();
        let marker = MarkerHandle(Self::next_id(&mut state));
        state.markers.insert(marker, options.position);
        marker
    }

    fn set_marker_position(&self, marker: MarkerHandle, position: Coordinate) {
        self.state().markers.insert(marker, position);
    }

    fn remove_marker(&self, marker: MarkerHandle) {
        self.state().markers.remove(&marker);
    }

    fn add_listener(
        &self,
        target: EventTarget,
        event: MapEvent,
        handler: EventHandler,
    ) -> ListenerHandle {
        let mut state = self.state();
        let listener = ListenerHandle(Self::next_id(&mut state));
        state.listeners.insert(listener, (target, event, handler));
        listener
    }

    fn remove_listener(&self, listener: ListenerHandle) {
        self.state().listeners.remove(&listener);
    }
}
