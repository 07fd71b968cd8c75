//! Orchestration of the dashboard's provider calls.
//!
//! Every request runs as its own task and reports back with a [`Settlement`] over a channel.
//! The owner of the coordinator feeds settlements into [`WeatherQueryCoordinator::apply`] in
//! arrival order, so the [`DashboardState`] has a single writer and needs no locking.
//!
//! Two request streams share the weather slot: the user's city search and the startup
//! auto-locate. Under [`RacePolicy::LastWriteWins`] whichever settles last overwrites the other,
//! even if it was issued first.

use serde::{Deserialize, Serialize};
use std::{future::Future, sync::Arc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    clock::ClockTicker,
    error::{GeolocationError, ProviderError},
    geolocation::Geolocator,
    model::{
        Coordinates, DashboardState, ForecastEntry, LocationLabel, Place, QueryState,
        WeatherSnapshot,
    },
    provider::WeatherProvider,
};

pub const CITY_NOT_FOUND: &str = "City not found";
pub const GEOLOCATION_UNSUPPORTED: &str =
    "Geolocation is not supported by your browser. Please enter a city manually.";
pub const GEOLOCATION_FAILED: &str =
    "Error getting current location. Please enter a city manually.";
pub const LOCATED_WEATHER_FAILED: &str = "Error fetching current weather data";

/// How settlements from superseded requests are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RacePolicy {
    /// Every settlement is applied; the last one to arrive wins.
    #[default]
    LastWriteWins,
    /// Settlements of requests older than the latest one issued for the same slot are dropped.
    LatestRequestWins,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    Search,
    AutoLocate,
}

/// Identifies the request a settlement belongs to. `seq` grows across both streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTag {
    pub stream: Stream,
    pub seq: u64,
}

#[derive(Debug)]
pub enum Settlement {
    Position {
        tag: RequestTag,
        result: Result<Coordinates, GeolocationError>,
    },
    Label {
        tag: RequestTag,
        result: Result<Place, ProviderError>,
    },
    LocatedWeather {
        tag: RequestTag,
        result: Result<WeatherSnapshot, ProviderError>,
    },
    SearchWeather {
        tag: RequestTag,
        city: String,
        result: Result<WeatherSnapshot, ProviderError>,
    },
    Forecast {
        tag: RequestTag,
        result: Result<Vec<ForecastEntry>, ProviderError>,
    },
}

impl Settlement {
    pub fn tag(&self) -> RequestTag {
        match self {
            Settlement::Position { tag, .. }
            | Settlement::Label { tag, .. }
            | Settlement::LocatedWeather { tag, .. }
            | Settlement::SearchWeather { tag, .. }
            | Settlement::Forecast { tag, .. } => *tag,
        }
    }
}

/// Receiving end of the settlement channel, owned by the event loop.
#[derive(Debug)]
pub struct Settlements(mpsc::UnboundedReceiver<Settlement>);

impl Settlements {
    pub async fn recv(&mut self) -> Option<Settlement> {
        self.0.recv().await
    }
}

#[derive(Debug)]
pub struct WeatherQueryCoordinator {
    provider: Arc<dyn WeatherProvider>,
    geolocator: Arc<dyn Geolocator>,
    clock: ClockTicker,
    policy: RacePolicy,
    state: DashboardState,
    tx: mpsc::UnboundedSender<Settlement>,
    next_seq: u64,
    latest_weather_seq: u64,
    latest_locate_seq: u64,
    in_flight: usize,
}

impl WeatherQueryCoordinator {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        geolocator: Arc<dyn Geolocator>,
    ) -> (Self, Settlements) {
        let (tx, rx) = mpsc::unbounded_channel();
        let coordinator = Self {
            provider,
            geolocator,
            clock: ClockTicker::system(),
            policy: RacePolicy::default(),
            state: DashboardState::default(),
            tx,
            next_seq: 0,
            latest_weather_seq: 0,
            latest_locate_seq: 0,
            in_flight: 0,
        };
        (coordinator, Settlements(rx))
    }

    pub fn with_clock(mut self, clock: ClockTicker) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_race_policy(mut self, policy: RacePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    /// Requests issued whose settlement has not been applied yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Startup sequence: locate the device and show the time.
    pub fn start(&mut self) {
        self.locate_and_fetch();
        self.tick();
    }

    pub fn tick(&mut self) {
        self.state.clock = self.clock.tick().clone();
    }

    pub fn set_query(&mut self, text: impl Into<String>) {
        self.state.query = text.into();
    }

    /// Search for whatever is typed in the query box. Empty input is not rejected here.
    pub fn submit_search(&mut self) {
        let city = self.state.query.clone();
        self.search_by_city(&city);
    }

    pub fn search_by_city(&mut self, city: &str) {
        let tag = self.issue(Stream::Search);
        self.latest_weather_seq = tag.seq;
        self.state.query_state = QueryState::Loading;
        info!(city, seq = tag.seq, "searching weather by city");

        let provider = Arc::clone(&self.provider);
        let city = city.to_string();
        let failed_city = city.clone();
        self.spawn(
            async move {
                let result = provider.current_by_city(&city).await;
                Settlement::SearchWeather { tag, city, result }
            },
            move |reason| Settlement::SearchWeather {
                tag,
                city: failed_city,
                result: Err(ProviderError::Unavailable(reason)),
            },
        );
    }

    pub fn locate_and_fetch(&mut self) {
        let tag = self.issue(Stream::AutoLocate);
        self.latest_locate_seq = tag.seq;

        if !self.geolocator.is_supported() {
            warn!("geolocation unsupported");
            self.state.query_state = QueryState::Failed(GEOLOCATION_UNSUPPORTED.to_string());
            return;
        }

        self.latest_weather_seq = tag.seq;
        self.state.query_state = QueryState::Loading;
        debug!(seq = tag.seq, "requesting device position");

        let geolocator = Arc::clone(&self.geolocator);
        self.spawn(
            async move {
                let result = geolocator.current_position().await;
                Settlement::Position { tag, result }
            },
            move |reason| Settlement::Position {
                tag,
                result: Err(GeolocationError::Denied(reason)),
            },
        );
    }

    /// Fold one settlement into the state, issuing any dependent request.
    pub fn apply(&mut self, settlement: Settlement) {
        self.in_flight = self.in_flight.saturating_sub(1);

        match settlement {
            Settlement::SearchWeather { tag, city, result } => {
                // The search box is emptied whatever the outcome.
                self.state.query.clear();
                if self.is_stale(tag, self.latest_weather_seq) {
                    return;
                }
                match result {
                    Ok(snapshot) => {
                        info!(
                            city = %city,
                            temp = snapshot.temperature_celsius,
                            "city weather ready"
                        );
                        self.state.query_state = QueryState::Ready(snapshot);
                        self.fetch_forecast(tag, city);
                    }
                    Err(err) => {
                        warn!(%err, city = %city, "city weather lookup failed");
                        self.state.query_state = QueryState::Failed(CITY_NOT_FOUND.to_string());
                    }
                }
            }
            Settlement::Forecast { tag, result } => {
                if self.is_stale(tag, self.latest_weather_seq) {
                    return;
                }
                self.state.forecast = result.unwrap_or_else(|err| {
                    warn!(%err, "forecast lookup failed, showing none");
                    Vec::new()
                });
            }
            Settlement::Position { tag, result } => {
                if self.is_stale(tag, self.latest_locate_seq) {
                    return;
                }
                match result {
                    Ok(at) => self.fetch_located(tag, at),
                    Err(err) => {
                        warn!(%err, "device position unavailable");
                        if self.is_stale(tag, self.latest_weather_seq) {
                            return;
                        }
                        let reason = match err {
                            GeolocationError::Unsupported => GEOLOCATION_UNSUPPORTED,
                            GeolocationError::Denied(_) => GEOLOCATION_FAILED,
                        };
                        self.state.query_state = QueryState::Failed(reason.to_string());
                    }
                }
            }
            Settlement::Label { tag, result } => {
                if self.is_stale(tag, self.latest_locate_seq) {
                    return;
                }
                let label = match result {
                    Ok(place) => LocationLabel::Known(place),
                    Err(err) => {
                        warn!(%err, "reverse geocoding failed");
                        LocationLabel::Unknown
                    }
                };
                self.state.location = Some(label);
            }
            Settlement::LocatedWeather { tag, result } => {
                if self.is_stale(tag, self.latest_weather_seq) {
                    return;
                }
                match result {
                    Ok(snapshot) => {
                        info!(location = %snapshot.location_name, "located weather ready");
                        self.state.query_state = QueryState::Ready(snapshot);
                    }
                    Err(err) => {
                        warn!(%err, "weather by coordinates failed");
                        self.state.query_state =
                            QueryState::Failed(LOCATED_WEATHER_FAILED.to_string());
                    }
                }
            }
        }
    }

    /// Apply settlements until nothing is in flight.
    pub async fn settle_all(&mut self, settlements: &mut Settlements) {
        while self.in_flight > 0 {
            match settlements.recv().await {
                Some(settlement) => self.apply(settlement),
                None => break,
            }
        }
    }

    fn fetch_forecast(&mut self, tag: RequestTag, city: String) {
        let provider = Arc::clone(&self.provider);
        self.spawn(
            async move {
                let result = provider.forecast_by_city(&city).await;
                Settlement::Forecast { tag, result }
            },
            move |reason| Settlement::Forecast {
                tag,
                result: Err(ProviderError::Unavailable(reason)),
            },
        );
    }

    /// Reverse geocoding and weather lookup run concurrently with no ordering between them.
    fn fetch_located(&mut self, tag: RequestTag, at: Coordinates) {
        let provider = Arc::clone(&self.provider);
        self.spawn(
            async move {
                let result = provider.reverse_geocode(at).await;
                Settlement::Label { tag, result }
            },
            move |reason| Settlement::Label { tag, result: Err(ProviderError::Unavailable(reason)) },
        );

        if self.is_stale(tag, self.latest_weather_seq) {
            return;
        }
        let provider = Arc::clone(&self.provider);
        self.spawn(
            async move {
                let result = provider.current_by_coordinates(at).await;
                Settlement::LocatedWeather { tag, result }
            },
            move |reason| Settlement::LocatedWeather {
                tag,
                result: Err(ProviderError::Unavailable(reason)),
            },
        );
    }

    fn issue(&mut self, stream: Stream) -> RequestTag {
        self.next_seq += 1;
        RequestTag { stream, seq: self.next_seq }
    }

    fn is_stale(&self, tag: RequestTag, latest: u64) -> bool {
        let stale = self.policy == RacePolicy::LatestRequestWins && tag.seq < latest;
        if stale {
            debug!(stream = ?tag.stream, seq = tag.seq, latest, "discarding superseded settlement");
        }
        stale
    }

    /// Run `request` as its own task. If the task dies without settling (a panicking provider),
    /// `on_failure` builds the settlement instead, so every issued request is settled exactly once.
    fn spawn<F, E>(&mut self, request: F, on_failure: E)
    where
        F: Future<Output = Settlement> + Send + 'static,
        E: FnOnce(String) -> Settlement + Send + 'static,
    {
        self.in_flight += 1;
        let tx = self.tx.clone();
        let task = tokio::spawn(request);
        tokio::spawn(async move {
            let settlement = match task.await {
                Ok(settlement) => settlement,
                Err(err) => {
                    warn!(%err, "request task ended without settling");
                    on_failure(format!("request task failed: {err}"))
                }
            };
            // A closed channel means the dashboard has shut down.
            let _ = tx.send(settlement);
        });
    }
}
