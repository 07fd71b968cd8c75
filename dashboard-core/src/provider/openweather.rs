use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::{
    config::Endpoints,
    error::ProviderError,
    model::{Coordinates, FORECAST_LEN, ForecastEntry, Place, WeatherSnapshot, round_half_up},
};

use super::WeatherProvider;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    endpoints: Endpoints,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(
        api_key: String,
        endpoints: Endpoints,
        timeout: Option<Duration>,
    ) -> anyhow::Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build HTTP client")?;

        Ok(Self { api_key, endpoints, http })
    }

    fn data_url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.endpoints.weather_base.trim_end_matches('/'))
    }

    fn geo_url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.endpoints.geo_base.trim_end_matches('/'))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        what: &str,
    ) -> Result<T, ProviderError> {
        let res = self.http.get(url).query(query).send().await.map_err(|e| {
            ProviderError::Unavailable(format!("failed to send {what} request: {e}"))
        })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            ProviderError::Unavailable(format!("failed to read {what} response body: {e}"))
        })?;

        if status == StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(truncate_body(&body)));
        }
        if !status.is_success() {
            return Err(ProviderError::Unavailable(format!(
                "{what} request failed with status {status}: {}",
                truncate_body(&body),
            )));
        }

        debug!(what, %status, bytes = body.len(), "provider response received");
        serde_json::from_str(&body)
            .map_err(|e| ProviderError::Parse(format!("invalid {what} JSON: {e}")))
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    #[instrument(skip(self))]
    async fn current_by_city(&self, city: &str) -> Result<WeatherSnapshot, ProviderError> {
        let query = [
            ("q", city.to_string()),
            ("units", "metric".to_string()),
            ("APPID", self.api_key.clone()),
        ];
        let parsed: OwCurrentResponse =
            self.get_json(&self.data_url("weather"), &query, "current weather").await?;
        parsed.into_snapshot()
    }

    #[instrument(skip(self))]
    async fn current_by_coordinates(
        &self,
        at: Coordinates,
    ) -> Result<WeatherSnapshot, ProviderError> {
        let query = [
            ("lat", at.latitude.to_string()),
            ("lon", at.longitude.to_string()),
            ("units", "metric".to_string()),
            ("APPID", self.api_key.clone()),
        ];
        let parsed: OwCurrentResponse =
            self.get_json(&self.data_url("weather"), &query, "current weather").await?;
        parsed.into_snapshot()
    }

    #[instrument(skip(self))]
    async fn reverse_geocode(&self, at: Coordinates) -> Result<Place, ProviderError> {
        let query = [
            ("lat", at.latitude.to_string()),
            ("lon", at.longitude.to_string()),
            ("limit", "1".to_string()),
            ("appid", self.api_key.clone()),
        ];
        let parsed: Vec<OwGeoPlace> =
            self.get_json(&self.geo_url("reverse"), &query, "reverse geocoding").await?;
        first_place(parsed)
    }

    #[instrument(skip(self))]
    async fn forecast_by_city(&self, city: &str) -> Result<Vec<ForecastEntry>, ProviderError> {
        let query = [
            ("q", city.to_string()),
            ("units", "metric".to_string()),
            ("APPID", self.api_key.clone()),
        ];
        let parsed: OwForecastResponse =
            self.get_json(&self.data_url("forecast"), &query, "forecast").await?;
        parsed.into_entries()
    }
}

// Wire types are fully optional; validation below decides what counts as a usable payload.

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    id: Option<i64>,
    description: Option<String>,
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: Option<String>,
    sys: Option<OwSys>,
    main: Option<OwMain>,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: Option<i64>,
    main: Option<OwMain>,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    #[serde(default)]
    list: Vec<OwForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct OwGeoPlace {
    name: Option<String>,
    country: Option<String>,
}

fn temperature(main: Option<&OwMain>) -> Result<f64, ProviderError> {
    main.and_then(|m| m.temp)
        .ok_or_else(|| ProviderError::Parse("missing main.temp".to_string()))
}

fn condition(weather: &[OwWeather]) -> Result<(&OwWeather, String), ProviderError> {
    let first = weather
        .first()
        .ok_or_else(|| ProviderError::Parse("empty weather condition list".to_string()))?;
    let description = first
        .description
        .clone()
        .ok_or_else(|| ProviderError::Parse("missing weather[0].description".to_string()))?;
    Ok((first, description))
}

impl OwCurrentResponse {
    fn into_snapshot(self) -> Result<WeatherSnapshot, ProviderError> {
        let temp = temperature(self.main.as_ref())?;
        let (first, description) = condition(&self.weather)?;

        // Current conditions are keyed by the numeric condition code.
        let icon_id = first
            .id
            .map(|id| id.to_string())
            .or_else(|| first.icon.clone())
            .unwrap_or_default();

        Ok(WeatherSnapshot {
            location_name: self.name.unwrap_or_default(),
            country_code: self.sys.and_then(|s| s.country).unwrap_or_default(),
            temperature_celsius: round_half_up(temp),
            condition_description: description,
            condition_icon_id: icon_id,
            observed_at: Utc::now(),
        })
    }
}

impl OwForecastEntry {
    fn into_entry(self) -> Result<ForecastEntry, ProviderError> {
        let timestamp = self
            .dt
            .ok_or_else(|| ProviderError::Parse("missing forecast dt".to_string()))?;
        let temp = temperature(self.main.as_ref())?;
        let (first, description) = condition(&self.weather)?;

        let icon_id = first
            .icon
            .clone()
            .or_else(|| first.id.map(|id| id.to_string()))
            .unwrap_or_default();

        Ok(ForecastEntry {
            timestamp,
            temperature_celsius: round_half_up(temp),
            condition_description: description,
            condition_icon_id: icon_id,
        })
    }
}

impl OwForecastResponse {
    /// Only the consumed entries are validated; one bad entry fails the whole forecast.
    fn into_entries(self) -> Result<Vec<ForecastEntry>, ProviderError> {
        self.list.into_iter().take(FORECAST_LEN).map(OwForecastEntry::into_entry).collect()
    }
}

fn first_place(places: Vec<OwGeoPlace>) -> Result<Place, ProviderError> {
    let place = places
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::Parse("reverse geocoding returned no results".to_string()))?;

    match (place.name, place.country) {
        (Some(name), Some(country)) => Ok(Place { name, country }),
        _ => Err(ProviderError::Parse("reverse geocoding result lacks name or country".to_string())),
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
