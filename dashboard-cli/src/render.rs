use chrono::{DateTime, Local, NaiveDate};
use dashboard_core::{DashboardState, ForecastEntry};

/// Plain-text view of the dashboard. Reads state only; errors arrive as display text.
pub fn dashboard(state: &DashboardState, today: NaiveDate) -> String {
    if state.query_state.is_loading() {
        return [
            "Detecting your location",
            "Your current location will be displayed here and used for real-time weather.",
        ]
        .join("\n");
    }

    let mut lines = Vec::new();
    let snapshot = state.query_state.snapshot();

    if let Some(weather) = snapshot {
        lines.push(format!("{}, {}", weather.location_name, weather.country_code));
        lines.push(format!("Temperature: {}°C", weather.temperature_celsius));
        lines.push(format!(
            "{} (icon {})",
            weather.condition_description, weather.condition_icon_id
        ));
        lines.push(String::new());
    }

    lines.push("Weather Dashboard".to_string());

    match state.query_state.error() {
        Some(error) => lines.push(format!("Error: {error}")),
        None => {
            lines.push(String::new());
            lines.push("Current Location Weather".to_string());
            lines.push(format!("Current Time: {}", state.clock.display));
            lines.push(format!(
                "Current Temperature: {}",
                snapshot
                    .map(|w| format!("{}°C", w.temperature_celsius))
                    .unwrap_or_else(|| "Loading...".to_string())
            ));
            lines.push(format!(
                "Location: {}",
                state.location.as_ref().map(ToString::to_string).unwrap_or_default()
            ));

            // Hidden while an error is shown.
            if !state.forecast.is_empty() {
                lines.push(String::new());
                lines.extend(
                    state.forecast.iter().enumerate().map(|(i, e)| forecast_row(i, e, today)),
                );
            }
        }
    }

    lines.join("\n")
}

fn forecast_row(index: usize, entry: &ForecastEntry, today: NaiveDate) -> String {
    let day = match index {
        0 => "Today".to_string(),
        _ => today
            .succ_opt()
            .map(|d| format!("Tomorrow, {}", d.format("%-d %B")))
            .unwrap_or_else(|| "Tomorrow".to_string()),
    };
    let at = entry
        .time()
        .map(|t| DateTime::<Local>::from(t).format("%H:%M").to_string())
        .unwrap_or_default();

    format!(
        "{day} {at}: {}°C, {} ({})",
        entry.temperature_celsius, entry.condition_description, entry.condition_icon_id
    )
}
