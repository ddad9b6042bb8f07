//! Caller location resolution
//!
//! Grounding is always anchored to a coordinate. A live device position is
//! only asked for when a question is location-relevant; denial, timeout and
//! missing support all fall back to the agency's home coordinate.

use crate::persona::HOME_LOCATION;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, watch};

/// Geographic coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    /// Build a location, rejecting non-finite or out-of-range coordinates
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, LocationError> {
        let location = Self {
            latitude,
            longitude,
        };
        location.validated()
    }

    pub fn validated(self) -> Result<Self, LocationError> {
        let lat_ok = self.latitude.is_finite() && (-90.0..=90.0).contains(&self.latitude);
        let lng_ok = self.longitude.is_finite() && (-180.0..=180.0).contains(&self.longitude);
        if lat_ok && lng_ok {
            Ok(self)
        } else {
            Err(LocationError::Invalid(format!(
                "({}, {})",
                self.latitude, self.longitude
            )))
        }
    }
}

/// Why a device position could not be used
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Geolocation permission denied")]
    Denied,
    #[error("Timed out waiting for geolocation")]
    Timeout,
    #[error("Geolocation not supported")]
    Unsupported,
    #[error("Invalid coordinate {0}")]
    Invalid(String),
}

impl LocationError {
    /// Conditions the platform treats as normal; these resolve to the home
    /// coordinate instead of failing the request.
    pub fn falls_back_to_home(&self) -> bool {
        matches!(self, Self::Denied | Self::Timeout | Self::Unsupported)
    }
}

/// Source of the caller's live position
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_position(&self) -> Result<Location, LocationError>;
}

/// Always yields the same coordinate
#[cfg(test)]
pub struct FixedLocation(pub Location);

#[cfg(test)]
#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_position(&self) -> Result<Location, LocationError> {
        self.0.validated()
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum DeviceFix {
    #[default]
    Unknown,
    Denied,
    Position(Location),
}

impl DeviceFix {
    fn resolve(self) -> Result<Location, LocationError> {
        match self {
            DeviceFix::Unknown => Err(LocationError::Unsupported),
            DeviceFix::Denied => Err(LocationError::Denied),
            DeviceFix::Position(location) => location.validated(),
        }
    }
}

/// Ask for the browser's current position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationPrompt;

/// Position reported by the widget's browser through its geolocation API.
///
/// Every lookup sends a [`LocationPrompt`] to connected browsers and waits
/// for the next report, so a denial only applies to the query it answered.
/// With no browser listening the last report is used; before any report,
/// geolocation counts as unsupported.
#[derive(Debug)]
pub struct ReportedLocation {
    fix: watch::Sender<DeviceFix>,
    prompts: broadcast::Sender<LocationPrompt>,
}

impl ReportedLocation {
    pub fn new() -> Self {
        let (fix, _) = watch::channel(DeviceFix::Unknown);
        let (prompts, _) = broadcast::channel(8);
        Self { fix, prompts }
    }

    pub fn report(&self, location: Location) {
        self.fix.send_replace(DeviceFix::Position(location));
    }

    pub fn deny(&self) {
        self.fix.send_replace(DeviceFix::Denied);
    }

    /// Prompts sent while a location-relevant reply is being prepared
    pub fn subscribe_prompts(&self) -> broadcast::Receiver<LocationPrompt> {
        self.prompts.subscribe()
    }
}

impl Default for ReportedLocation {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocationProvider for ReportedLocation {
    async fn current_position(&self) -> Result<Location, LocationError> {
        // Subscribing first marks the current fix as seen
        let mut fixes = self.fix.subscribe();

        if self.prompts.send(LocationPrompt).is_err() {
            let last = *fixes.borrow();
            return last.resolve();
        }

        // The sender lives in `self`, so this only ends with a new report
        if fixes.changed().await.is_err() {
            return Err(LocationError::Unsupported);
        }
        let fresh = *fixes.borrow_and_update();
        fresh.resolve()
    }
}

/// Resolve the coordinate a request is anchored to.
///
/// Without `use_location` the home coordinate is used directly. Otherwise the
/// provider gets at most `wait` to answer.
pub async fn resolve_location(
    provider: &dyn LocationProvider,
    use_location: bool,
    wait: Duration,
) -> Result<Location, LocationError> {
    if !use_location {
        return Ok(HOME_LOCATION);
    }

    let outcome = tokio::time::timeout(wait, provider.current_position())
        .await
        .unwrap_or(Err(LocationError::Timeout));

    match outcome {
        Ok(location) => Ok(location),
        Err(e) if e.falls_back_to_home() => {
            tracing::debug!(reason = %e, "Using home coordinate");
            Ok(HOME_LOCATION)
        }
        Err(e) => Err(e),
    }
}
