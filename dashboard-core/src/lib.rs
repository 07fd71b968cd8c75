//! Core library for the weather dashboard.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The weather provider contract and its OpenWeather implementation
//! - Device position and clock sources
//! - The coordinator that merges provider results into one dashboard state
//!
//! It is used by `dashboard-cli`, but any front-end that can drive an async event loop can reuse it.

pub mod clock;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod geolocation;
pub mod model;
pub mod provider;

pub use clock::{ClockTicker, TICK_INTERVAL};
pub use config::Config;
pub use coordinator::{RacePolicy, Settlement, Settlements, WeatherQueryCoordinator};
pub use error::{GeolocationError, ProviderError};
pub use geolocation::{Geolocator, geolocator_from_config};
pub use model::{DashboardState, ForecastEntry, LocationLabel, QueryState, WeatherSnapshot};
pub use provider::{WeatherProvider, provider_from_config};
