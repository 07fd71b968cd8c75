//! Device position capability.
//!
//! A terminal has no permission prompt, so the position comes from configuration.
//! Without a configured position the capability is reported as unsupported.

use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

use crate::{Config, error::GeolocationError, model::Coordinates};

#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    /// Whether a position can be requested at all.
    fn is_supported(&self) -> bool;

    /// One-shot position request.
    async fn current_position(&self) -> Result<Coordinates, GeolocationError>;
}

#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Coordinates);

#[async_trait]
impl Geolocator for FixedPosition {
    fn is_supported(&self) -> bool {
        true
    }

    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        Ok(self.0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeolocation;

#[async_trait]
impl Geolocator for NoGeolocation {
    fn is_supported(&self) -> bool {
        false
    }

    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        Err(GeolocationError::Unsupported)
    }
}

pub fn geolocator_from_config(config: &Config) -> Arc<dyn Geolocator> {
    match config.location {
        Some(location) => Arc::new(FixedPosition(location.into())),
        None => Arc::new(NoGeolocation),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn configured_location_is_supported() {
        let mut cfg = Config::default();
        cfg.set_location(48.85, 2.35);

        let geo = geolocator_from_config(&cfg);
        assert!(geo.is_supported());
        let at = geo.current_position().await.expect("fixed position");
        assert_eq!(at, Coordinates { latitude: 48.85, longitude: 2.35 });
    }

    #[tokio::test]
    async fn missing_location_is_unsupported() {
        let geo = geolocator_from_config(&Config::default());
        assert!(!geo.is_supported());
        assert_eq!(geo.current_position().await, Err(GeolocationError::Unsupported));
    }
}
