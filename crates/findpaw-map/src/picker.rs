//! Location picker used by the report form.

use async_trait::async_trait;
use findpaw_core::Coordinate;

use crate::geolocation::{Geolocation, GeolocationResult, PositionOptions, PositionSource};

/// Picker center when the form has no location yet (Seoul City Hall).
pub const PICKER_DEFAULT_CENTER: Coordinate = Coordinate {
    latitude: 37.5665,
    longitude: 126.978,
};

/// Reverse geocoding provided by the map SDK.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Road address, falling back to the lot address. `None` when the lookup
    /// fails or finds nothing.
    async fn reverse_geocode(&self, coordinate: Coordinate) -> Option<String>;
}

/// Selected coordinate plus its looked-up address.
pub struct LocationPicker<G> {
    geocoder: G,
    selected: Coordinate,
    address: Option<String>,
}

impl<G: Geocoder> LocationPicker<G> {
    /// Opens the picker at `initial`, or the default center.
    pub async fn open(geocoder: G, initial: Option<Coordinate>) -> Self {
        let mut picker = Self {
            geocoder,
            selected: initial.unwrap_or(PICKER_DEFAULT_CENTER),
            address: None,
        };
        picker.select(picker.selected).await;
        picker
    }

    #[must_use]
    pub fn selected(&self) -> Coordinate {
        self.selected
    }

    #[must_use]
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// Moves the pin (map click or marker drag) and refreshes the address.
    pub async fn select(&mut self, coordinate: Coordinate) -> Option<&str> {
        self.selected = coordinate;
        self.address = self
            .geocoder
            .reverse_geocode(coordinate)
            .await
            .filter(|a| !a.trim().is_empty());
        if self.address.is_none() {
            tracing::debug!(%coordinate, "no address for selected location");
        }
        self.address()
    }

    /// Moves the pin to the current position. Failures leave the pin in place.
    pub async fn use_current_position<P: PositionSource>(
        &mut self,
        geolocation: &Geolocation<P>,
    ) -> GeolocationResult {
        let outcome = geolocation
            .request_position(&PositionOptions::REPORT_FORM)
            .await;
        if let Ok(coordinate) = outcome {
            self.select(coordinate).await;
        }
        outcome
    }

    /// Confirms the selection, consuming the picker.
    #[must_use]
    pub fn confirm(self) -> (Coordinate, Option<String>) {
        (self.selected, self.address)
    }
}
