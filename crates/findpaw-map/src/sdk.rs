//! Seam to the map widget SDK and the element it renders into.

use std::sync::Arc;

use findpaw_core::Coordinate;

use crate::MapError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTarget {
    Map(MapHandle),
    Marker(MarkerHandle),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapEvent {
    /// Fired after the user finishes panning. Carries the new map center.
    DragEnd,
    /// Carries the clicked coordinate (marker position for marker clicks).
    Click,
}

/// Callback registered with [`MapSdk::add_listener`].
pub type EventHandler = Arc<dyn Fn(Coordinate) + Send + Sync>;

/// Construction options for a map widget.
#[derive(Debug, Clone, PartialEq)]
pub struct MapOptions {
    pub center: Coordinate,
    pub zoom: u8,
    pub scale_control: bool,
    pub logo_control: bool,
    pub map_data_control: bool,
    pub zoom_control: bool,
}

impl MapOptions {
    /// Options with every on-map control hidden.
    #[must_use]
    pub fn bare(center: Coordinate, zoom: u8) -> Self {
        Self {
            center,
            zoom,
            scale_control: false,
            logo_control: false,
            map_data_control: false,
            zoom_control: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerOptions {
    pub position: Coordinate,
    pub title: Option<String>,
    pub icon_url: Option<String>,
    pub draggable: bool,
}

impl MarkerOptions {
    #[must_use]
    pub fn at(position: Coordinate) -> Self {
        Self {
            position,
            title: None,
            icon_url: None,
            draggable: false,
        }
    }
}

/// The element a map renders into.
pub trait MapContainer: Send + Sync + 'static {
    fn child_count(&self) -> usize;

    /// Adds one rendered child. Called by SDK implementations while rendering.
    fn append_child(&self);

    fn clear_children(&self);
}

/// Map widget SDK.
///
/// All calls are synchronous; the SDK itself may not be available yet when
/// the page starts, which [`MapSdk::is_loaded`] reports.
pub trait MapSdk: Send + Sync + 'static {
    fn is_loaded(&self) -> bool;

    /// Renders a new map into `container`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Construction`] when the widget cannot be created.
    fn create_map(
        &self,
        container: &dyn MapContainer,
        options: &MapOptions,
    ) -> Result<MapHandle, MapError>;

    fn destroy_map(&self, map: MapHandle);

    fn center(&self, map: MapHandle) -> Coordinate;

    /// Moves the camera to `target` and resets the zoom level.
    fn morph(&self, map: MapHandle, target: Coordinate, zoom: u8);

    fn create_marker(&self, map: MapHandle, options: &MarkerOptions) -> MarkerHandle;

    fn set_marker_position(&self, marker: MarkerHandle, position: Coordinate);

    fn remove_marker(&self, marker: MarkerHandle);

    fn add_listener(
        &self,
        target: EventTarget,
        event: MapEvent,
        handler: EventHandler,
    ) -> ListenerHandle;

    fn remove_listener(&self, listener: ListenerHandle);

    /// Distance used for the camera move threshold. Defaults to haversine.
    fn distance_meters(&self, from: Coordinate, to: Coordinate) -> f64 {
        from.distance_meters(&to)
    }
}
