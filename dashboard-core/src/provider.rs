use crate::{
    Config,
    error::ProviderError,
    model::{Coordinates, ForecastEntry, Place, WeatherSnapshot},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc, time::Duration};

pub mod openweather;

/// The external weather and geocoding API, as the coordinator sees it.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current_by_city(&self, city: &str) -> Result<WeatherSnapshot, ProviderError>;

    async fn current_by_coordinates(
        &self,
        at: Coordinates,
    ) -> Result<WeatherSnapshot, ProviderError>;

    /// First match of a reverse-geocode lookup.
    async fn reverse_geocode(&self, at: Coordinates) -> Result<Place, ProviderError>;

    /// Upcoming entries in ascending time order, at most [`crate::model::FORECAST_LEN`].
    async fn forecast_by_city(&self, city: &str) -> Result<Vec<ForecastEntry>, ProviderError>;
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let api_key = config.resolved_api_key()?;
    let timeout = config.timeout_secs.map(Duration::from_secs);

    let provider = OpenWeatherProvider::new(api_key, config.endpoints.clone(), timeout)?;
    Ok(Arc::new(provider))
}
