//! Map view: geolocation, shared view state, map lifecycle and sighting markers.
//!
//! The map SDK and the platform location API are collaborators behind
//! [`MapSdk`], [`MapContainer`] and [`PositionSource`]; this crate owns only
//! the state machines that drive them.

pub mod controller;
pub mod geolocation;
pub mod markers;
pub mod picker;
pub mod sdk;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

use thiserror::Error;

pub use controller::{
    LifecycleState, MapController, MountOutcome, Recenter, SyncOutcome, INIT_LOCATE_DELAY,
    MIN_CAMERA_MOVE_METERS, SDK_POLL_INTERVAL,
};
pub use geolocation::{
    FixedPositionSource, Geolocation, GeolocationFailure, GeolocationResult, GeolocationSnapshot,
    PlatformError, PositionOptions, PositionSource,
};
pub use markers::{MarkerLayer, SightingFeed};
pub use picker::{Geocoder, LocationPicker, PICKER_DEFAULT_CENTER};
pub use sdk::{
    EventHandler, EventTarget, ListenerHandle, MapContainer, MapEvent, MapHandle, MapOptions,
    MapSdk, MarkerHandle, MarkerOptions,
};
pub use store::{MapViewState, MapViewStore, DEFAULT_ZOOM};

#[derive(Debug, Error)]
pub enum MapError {
    #[error("map construction failed: {0}")]
    Construction(String),
}
