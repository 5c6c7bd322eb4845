//! Map lifecycle: one map widget per container, camera and my-location sync.
//!
//! ```text
//! Uninitialized ──mount──▶ AwaitingSdk ──sdk loaded──▶ Ready
//!       ▲                       │                        │
//!       └──── (remount) ── TornDown ◀──────unmount───────┘
//! ```
//!
//! The map, its drag-end listener, the my-location marker and the rendered
//! container children are held together in [`MountedMap`] and released
//! together when it drops.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use findpaw_core::Coordinate;
use tokio::sync::Notify;

use crate::geolocation::{
    Geolocation, GeolocationFailure, GeolocationResult, PositionOptions, PositionSource,
};
use crate::sdk::{
    EventTarget, ListenerHandle, MapContainer, MapEvent, MapHandle, MapOptions, MapSdk,
    MarkerHandle, MarkerOptions,
};
use crate::store::{MapViewStore, DEFAULT_ZOOM};
use crate::MapError;

pub const SDK_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const INIT_LOCATE_DELAY: Duration = Duration::from_millis(500);
pub const MIN_CAMERA_MOVE_METERS: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    AwaitingSdk,
    Ready,
    TornDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountOutcome {
    Ready(MapHandle),
    /// This controller or the shared view already has a rendered map.
    AlreadyMounted,
    /// The shared view holds an instance rendered elsewhere.
    OwnedElsewhere,
    /// Unmounted while waiting for the SDK.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    NotReady,
    Applied {
        camera_moved: bool,
        show_location_prompt: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Recenter {
    Requested(GeolocationResult),
    Immediate(Coordinate),
    NotReady,
}

struct MountedMap<S: MapSdk, C: MapContainer> {
    sdk: Arc<S>,
    container: Arc<C>,
    store: MapViewStore,
    map: MapHandle,
    drag_listener: ListenerHandle,
    my_marker: Option<MarkerHandle>,
}

impl<S: MapSdk, C: MapContainer> MountedMap<S, C> {
    fn upsert_my_marker(&mut self, position: Coordinate) {
        match self.my_marker {
            Some(marker) => self.sdk.set_marker_position(marker, position),
            None => {
                let options = MarkerOptions {
                    title: Some("My location".to_owned()),
                    ..MarkerOptions::at(position)
                };
                self.my_marker = Some(self.sdk.create_marker(self.map, &options));
            }
        }
    }
}

impl<S: MapSdk, C: MapContainer> Drop for MountedMap<S, C> {
    fn drop(&mut self) {
        if let Some(marker) = self.my_marker.take() {
            self.sdk.remove_marker(marker);
        }
        self.sdk.remove_listener(self.drag_listener);
        self.sdk.destroy_map(self.map);
        self.container.clear_children();
        self.store.release_instance(self.map);
        tracing::info!(map = self.map.0, "map released");
    }
}

enum Lifecycle<S: MapSdk, C: MapContainer> {
    Uninitialized,
    AwaitingSdk { generation: u64 },
    Ready(MountedMap<S, C>),
    TornDown,
}

struct Inner<S: MapSdk, C: MapContainer> {
    lifecycle: Lifecycle<S, C>,
    generation: u64,
    fallback_mode: bool,
    location_prompt: bool,
}

/// Owns the map widget bound to one container.
pub struct MapController<S: MapSdk, C: MapContainer> {
    sdk: Arc<S>,
    container: Arc<C>,
    store: MapViewStore,
    fallback: Coordinate,
    inner: Mutex<Inner<S, C>>,
    cancel_poll: Notify,
}

impl<S: MapSdk, C: MapContainer> MapController<S, C> {
    pub fn new(sdk: Arc<S>, container: Arc<C>, store: MapViewStore) -> Self {
        Self {
            sdk,
            container,
            store,
            fallback: Coordinate::FALLBACK,
            inner: Mutex::new(Inner {
                lifecycle: Lifecycle::Uninitialized,
                generation: 0,
                fallback_mode: false,
                location_prompt: false,
            }),
            cancel_poll: Notify::new(),
        }
    }

    /// Coordinate used for camera and marker when no live fix is available.
    #[must_use]
    pub fn with_fallback(mut self, fallback: Coordinate) -> Self {
        self.fallback = fallback;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Inner<S, C>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn state(&self) -> LifecycleState {
        match self.lock().lifecycle {
            Lifecycle::Uninitialized => LifecycleState::Uninitialized,
            Lifecycle::AwaitingSdk { .. } => LifecycleState::AwaitingSdk,
            Lifecycle::Ready(_) => LifecycleState::Ready,
            Lifecycle::TornDown => LifecycleState::TornDown,
        }
    }

    #[must_use]
    pub fn store(&self) -> &MapViewStore {
        &self.store
    }

    #[must_use]
    pub fn is_fallback_mode(&self) -> bool {
        self.lock().fallback_mode
    }

    /// Whether the location-settings prompt should be showing.
    #[must_use]
    pub fn location_prompt(&self) -> bool {
        self.lock().location_prompt
    }

    pub fn dismiss_location_prompt(&self) {
        self.lock().location_prompt = false;
    }

    /// Mounts the map, waiting for the SDK if it is not loaded yet.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Construction`] if the SDK fails to build the map.
    /// The controller returns to `Uninitialized` and may be mounted again.
    pub async fn mount(&self) -> Result<MountOutcome, MapError> {
        let generation = {
            let mut inner = self.lock();
            match inner.lifecycle {
                Lifecycle::Ready(_) | Lifecycle::AwaitingSdk { .. } => {
                    return Ok(MountOutcome::AlreadyMounted);
                }
                Lifecycle::Uninitialized | Lifecycle::TornDown => {}
            }
            if let Some(outcome) = self.check_container() {
                return Ok(outcome);
            }
            inner.generation += 1;
            let generation = inner.generation;
            inner.lifecycle = Lifecycle::AwaitingSdk { generation };
            generation
        };

        while !self.sdk.is_loaded() {
            tracing::debug!(generation, "map sdk not loaded, polling");
            tokio::select! {
                () = tokio::time::sleep(SDK_POLL_INTERVAL) => {}
                () = self.cancel_poll.notified() => {}
            }
            if !self.is_awaiting(generation) {
                tracing::info!(generation, "mount cancelled while waiting for sdk");
                return Ok(MountOutcome::Cancelled);
            }
        }

        self.commit(generation)
    }

    fn is_awaiting(&self, generation: u64) -> bool {
        matches!(self.lock().lifecycle, Lifecycle::AwaitingSdk { generation: g } if g == generation)
    }

    /// Guards against rendering twice and clears leftover children.
    fn check_container(&self) -> Option<MountOutcome> {
        let has_instance = self.store.instance().is_some();
        let children = self.container.child_count();
        match (has_instance, children > 0) {
            (true, true) => {
                tracing::debug!("map already rendered, skipping mount");
                Some(MountOutcome::AlreadyMounted)
            }
            (true, false) => {
                tracing::debug!("map instance owned by another view, skipping mount");
                Some(MountOutcome::OwnedElsewhere)
            }
            (false, true) => {
                tracing::warn!(children, "clearing leftover map children");
                self.container.clear_children();
                None
            }
            (false, false) => None,
        }
    }

    fn commit(&self, generation: u64) -> Result<MountOutcome, MapError> {
        let mut inner = self.lock();
        if !matches!(inner.lifecycle, Lifecycle::AwaitingSdk { generation: g } if g == generation) {
            return Ok(MountOutcome::Cancelled);
        }
        // Re-check: another view may have rendered while we waited.
        if let Some(outcome) = self.check_container() {
            inner.lifecycle = Lifecycle::Uninitialized;
            return Ok(outcome);
        }

        let center = self.store.my_location().unwrap_or_else(|| self.store.center());
        let map = match self
            .sdk
            .create_map(self.container.as_ref(), &MapOptions::bare(center, DEFAULT_ZOOM))
        {
            Ok(map) => map,
            Err(e) => {
                inner.lifecycle = Lifecycle::Uninitialized;
                self.container.clear_children();
                tracing::warn!(error = %e, "map construction failed");
                return Err(e);
            }
        };

        let store = self.store.clone();
        let drag_listener = self.sdk.add_listener(
            EventTarget::Map(map),
            MapEvent::DragEnd,
            Arc::new(move |new_center| {
                store.set_center(new_center);
            }),
        );

        self.store.set_instance(Some(map));
        self.store.set_zoom(DEFAULT_ZOOM);
        inner.lifecycle = Lifecycle::Ready(MountedMap {
            sdk: Arc::clone(&self.sdk),
            container: Arc::clone(&self.container),
            store: self.store.clone(),
            map,
            drag_listener,
            my_marker: None,
        });
        tracing::info!(map = map.0, %center, zoom = DEFAULT_ZOOM, "map mounted");
        Ok(MountOutcome::Ready(map))
    }

    /// Tears down from any state. Safe to call repeatedly.
    pub fn unmount(&self) {
        let previous = std::mem::replace(&mut self.lock().lifecycle, Lifecycle::TornDown);
        match previous {
            Lifecycle::Ready(mounted) => drop(mounted),
            Lifecycle::AwaitingSdk { generation } => {
                self.cancel_poll.notify_waiters();
                self.container.clear_children();
                tracing::info!(generation, "mount cancelled");
            }
            Lifecycle::Uninitialized | Lifecycle::TornDown => {}
        }
    }

    /// Applies a geolocation outcome to the camera and the my-location marker.
    ///
    /// On failure the fallback coordinate is used for camera and marker only;
    /// `my_location` is written on success alone.
    pub fn apply_position(&self, outcome: &GeolocationResult) -> SyncOutcome {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let Lifecycle::Ready(mounted) = &mut inner.lifecycle else {
            tracing::debug!("map not ready, ignoring position");
            return SyncOutcome::NotReady;
        };

        let target = match outcome {
            Ok(coordinate) => *coordinate,
            Err(_) => self.fallback,
        };

        let current = self.sdk.center(mounted.map);
        let distance = self.sdk.distance_meters(current, target);
        let camera_moved = distance > MIN_CAMERA_MOVE_METERS;
        if camera_moved {
            self.sdk.morph(mounted.map, target, DEFAULT_ZOOM);
            self.store.set_zoom(DEFAULT_ZOOM);
        }
        self.store.set_center(target);
        mounted.upsert_my_marker(target);

        match outcome {
            Ok(coordinate) => {
                inner.fallback_mode = false;
                inner.location_prompt = false;
                self.store.set_my_location(*coordinate);
            }
            Err(failure) => {
                inner.fallback_mode = true;
                if *failure == GeolocationFailure::PermissionDenied {
                    inner.location_prompt = true;
                }
                tracing::info!(%failure, fallback = %self.fallback, "using fallback location");
            }
        }

        tracing::debug!(distance_m = distance, camera_moved, "position applied");
        SyncOutcome::Applied {
            camera_moved,
            show_location_prompt: inner.location_prompt,
        }
    }

    /// Handles the recenter control.
    pub async fn recenter<P: PositionSource>(&self, geolocation: &Geolocation<P>) -> Recenter {
        let fallback_mode = {
            let inner = self.lock();
            if !matches!(inner.lifecycle, Lifecycle::Ready(_)) {
                return Recenter::NotReady;
            }
            inner.fallback_mode
        };

        if !fallback_mode {
            if let Some(location) = self.store.my_location() {
                return if self.pan_now(location) {
                    Recenter::Immediate(location)
                } else {
                    Recenter::NotReady
                };
            }
        }

        let options = if fallback_mode {
            PositionOptions::MAP_DEFAULT
        } else {
            PositionOptions::MAP_RECENTER
        };
        let outcome = geolocation.request_position(&options).await;
        self.apply_position(&outcome);
        Recenter::Requested(outcome)
    }

    fn pan_now(&self, target: Coordinate) -> bool {
        let inner = self.lock();
        let Lifecycle::Ready(mounted) = &inner.lifecycle else {
            return false;
        };
        self.sdk.morph(mounted.map, target, DEFAULT_ZOOM);
        self.store.set_center(target);
        self.store.set_zoom(DEFAULT_ZOOM);
        true
    }

    /// Requests the first fix shortly after mount and applies it.
    ///
    /// Returns `None` if the map was torn down before the request started.
    pub async fn locate_after_mount<P: PositionSource>(
        &self,
        geolocation: &Geolocation<P>,
    ) -> Option<GeolocationResult> {
        tokio::time::sleep(INIT_LOCATE_DELAY).await;
        if self.state() != LifecycleState::Ready {
            return None;
        }
        let outcome = geolocation
            .request_position(&PositionOptions::MAP_DEFAULT)
            .await;
        self.apply_position(&outcome);
        Some(outcome)
    }
}

impl<S: MapSdk, C: MapContainer> Drop for MapController<S, C> {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
#[path = "controller_test.rs"]
mod tests;
