//! OpenWeather client behaviour against a mock HTTP server.

use dashboard_core::{
    ProviderError, WeatherProvider,
    config::Endpoints,
    model::{Coordinates, Place},
    provider::openweather::OpenWeatherProvider,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

const KEY: &str = "test-key";

fn client(server: &MockServer) -> OpenWeatherProvider {
    let endpoints = Endpoints {
        weather_base: format!("{}/data/2.5", server.uri()),
        geo_base: format!("{}/geo/1.0", server.uri()),
    };
    OpenWeatherProvider::new(KEY.to_string(), endpoints, None).expect("client builds")
}

fn paris_current() -> serde_json::Value {
    serde_json::json!({
        "coord": { "lon": 2.35, "lat": 48.85 },
        "weather": [{ "id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d" }],
        "main": { "temp": 17.6, "feels_like": 17.1, "humidity": 62 },
        "sys": { "country": "FR" },
        "name": "Paris",
        "cod": 200
    })
}

#[tokio::test]
async fn current_by_city_sends_expected_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "Paris"))
        .and(query_param("units", "metric"))
        .and(query_param("APPID", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(paris_current()))
        .expect(1)
        .mount(&server)
        .await;

    let snapshot = client(&server).current_by_city("Paris").await.expect("weather");

    assert_eq!(snapshot.location_name, "Paris");
    assert_eq!(snapshot.country_code, "FR");
    assert_eq!(snapshot.temperature_celsius, 18);
    assert_eq!(snapshot.condition_description, "broken clouds");
    assert_eq!(snapshot.condition_icon_id, "803");
}

#[tokio::test]
async fn current_by_coordinates_sends_lat_lon() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("lat", "48.85"))
        .and(query_param("lon", "2.35"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(paris_current()))
        .mount(&server)
        .await;

    let at = Coordinates { latitude: 48.85, longitude: 2.35 };
    let snapshot = client(&server).current_by_coordinates(at).await.expect("weather");
    assert_eq!(snapshot.location_name, "Paris");
}

#[tokio::test]
async fn unknown_city_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({ "cod": "404", "message": "city not found" })),
        )
        .mount(&server)
        .await;

    let err = client(&server).current_by_city("Atlantis").await.unwrap_err();
    assert!(matches!(err, ProviderError::NotFound(_)));
}

#[tokio::test]
async fn server_error_maps_to_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let err = client(&server).forecast_by_city("Paris").await.unwrap_err();
    match err {
        ProviderError::Unavailable(msg) => assert!(msg.contains("503")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn partial_payload_is_not_a_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "name": "Paris" })),
        )
        .mount(&server)
        .await;

    let err = client(&server).current_by_city("Paris").await.unwrap_err();
    assert!(matches!(err, ProviderError::Parse(_)));
}

#[tokio::test]
async fn forecast_returns_first_two_entries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .and(query_param("q", "Paris"))
        .and(query_param("APPID", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "cod": "200",
            "list": [
                { "dt": 1700000000, "main": { "temp": 9.4 },
                  "weather": [{ "id": 500, "description": "light rain", "icon": "10d" }] },
                { "dt": 1700010800, "main": { "temp": 8.5 },
                  "weather": [{ "id": 804, "description": "overcast clouds", "icon": "04n" }] },
                { "dt": 1700021600, "main": { "temp": 7.0 },
                  "weather": [{ "id": 804, "description": "overcast clouds", "icon": "04n" }] }
            ],
            "city": { "name": "Paris", "country": "FR" }
        })))
        .mount(&server)
        .await;

    let entries = client(&server).forecast_by_city("Paris").await.expect("forecast");

    assert_eq!(entries.len(), 2);
    assert!(entries[0].timestamp < entries[1].timestamp);
    assert_eq!(entries[0].temperature_celsius, 9);
    assert_eq!(entries[1].temperature_celsius, 9);
    assert_eq!(entries[1].condition_icon_id, "04n");
}

#[tokio::test]
async fn reverse_geocode_uses_geo_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geo/1.0/reverse"))
        .and(query_param("limit", "1"))
        .and(query_param("appid", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "name": "Berlin", "lat": 52.52, "lon": 13.40, "country": "DE" }
        ])))
        .mount(&server)
        .await;

    let at = Coordinates { latitude: 52.52, longitude: 13.40 };
    let place = client(&server).reverse_geocode(at).await.expect("place");
    assert_eq!(place, Place { name: "Berlin".to_string(), country: "DE".to_string() });
}

#[tokio::test]
async fn reverse_geocode_empty_array_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geo/1.0/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let at = Coordinates { latitude: 0.0, longitude: 0.0 };
    let err = client(&server).reverse_geocode(at).await.unwrap_err();
    assert!(matches!(err, ProviderError::Parse(_)));
}
