use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of forecast entries the dashboard consumes.
pub const FORECAST_LEN: usize = 2;

/// Label shown when reverse geocoding fails.
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Current conditions for one place, built from a fully populated provider payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location_name: String,
    pub country_code: String,
    pub temperature_celsius: i32,
    pub condition_description: String,
    pub condition_icon_id: String,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub timestamp: i64,
    pub temperature_celsius: i32,
    pub condition_description: String,
    pub condition_icon_id: String,
}

impl ForecastEntry {
    pub fn time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub country: String,
}

/// Result of reverse geocoding. Independent from the weather snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationLabel {
    Known(Place),
    Unknown,
}

impl fmt::Display for LocationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationLabel::Known(place) => write!(f, "{}, {}", place.name, place.country),
            LocationLabel::Unknown => f.write_str(UNKNOWN_LOCATION),
        }
    }
}

/// Lifecycle of the shared weather slot: Idle → Loading → Ready | Failed.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum QueryState {
    #[default]
    Idle,
    Loading,
    Ready(WeatherSnapshot),
    Failed(String),
}

impl QueryState {
    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        match self {
            QueryState::Ready(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            QueryState::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, QueryState::Loading)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClockState {
    pub display: String,
}

/// Everything the presentation layer reads. Only the coordinator writes it.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    /// Text typed into the search box.
    pub query: String,
    pub query_state: QueryState,
    /// `None` until the first reverse-geocode settles.
    pub location: Option<LocationLabel>,
    pub forecast: Vec<ForecastEntry>,
    pub clock: ClockState,
}

/// Rounds half-way values towards positive infinity, the way the dashboard displays temperatures.
pub fn round_half_up(value: f64) -> i32 {
    let floor = value.floor();
    // `value - floor` is exact, so only true ties reach the upper branch.
    if value - floor >= 0.5 { (floor + 1.0) as i32 } else { floor as i32 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_half_up_matches_display_rounding() {
        assert_eq!(round_half_up(18.4), 18);
        assert_eq!(round_half_up(18.5), 19);
        assert_eq!(round_half_up(-2.5), -2);
        assert_eq!(round_half_up(-2.6), -3);
        assert_eq!(round_half_up(0.0), 0);
    }

    #[test]
    fn round_half_up_does_not_round_just_below_half() {
        assert_eq!(round_half_up(0.49999999999999994), 0);
        assert_eq!(round_half_up(-0.5), 0);
        assert_eq!(round_half_up(-0.5000000000000001), -1);
    }

    #[test]
    fn location_label_display() {
        let known = LocationLabel::Known(Place { name: "Paris".into(), country: "FR".into() });
        assert_eq!(known.to_string(), "Paris, FR");
        assert_eq!(LocationLabel::Unknown.to_string(), "Unknown Location");
    }

    #[test]
    fn query_state_accessors() {
        assert!(QueryState::Loading.is_loading());
        assert_eq!(QueryState::Failed("boom".into()).error(), Some("boom"));
        assert!(QueryState::Idle.snapshot().is_none());
    }

    #[test]
    fn forecast_entry_time_from_unix_seconds() {
        let entry = ForecastEntry {
            timestamp: 1_700_000_000,
            temperature_celsius: 3,
            condition_description: "mist".into(),
            condition_icon_id: "50n".into(),
        };
        assert_eq!(entry.time().map(|t| t.timestamp()), Some(1_700_000_000));
    }
}
