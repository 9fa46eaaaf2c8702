//! Integration tests for the OpenWeather provider and the source adapter,
//! run against a wiremock server.

use std::time::Duration;

use climagraph_core::{
    Condition, QueryTarget, WeatherError, WeatherQuery, WeatherSource,
    provider::openweather::OpenWeatherProvider,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn current_body(name: &str, lat: f64, lon: f64) -> serde_json::Value {
    serde_json::json!({
        "coord": { "lon": lon, "lat": lat },
        "weather": [{ "id": 500, "main": "Rain", "description": "light rain", "icon": "10d" }],
        "main": {
            "temp": 18.4, "feels_like": 17.9, "temp_min": 17.0, "temp_max": 19.5,
            "pressure": 1012, "humidity": 71
        },
        "visibility": 9000,
        "wind": { "speed": 4.6, "deg": 230 },
        "clouds": { "all": 75 },
        "dt": 1720107000,
        "sys": { "country": "US", "sunrise": 1720085000, "sunset": 1720139000 },
        "name": name,
        "cod": 200
    })
}

fn forecast_entry(dt: i64, temp: f64, humidity: u8, main: &str) -> serde_json::Value {
    serde_json::json!({
        "dt": dt,
        "main": { "temp": temp, "humidity": humidity },
        "weather": [{ "main": main }]
    })
}

fn forecast_body() -> serde_json::Value {
    serde_json::json!({
        "cod": "200",
        "list": [
            forecast_entry(1720116000, 20.6, 60, "Clouds"),
            forecast_entry(1720105200, 19.2, 65, "Clear"),
            forecast_entry(1720126800, 17.5, 70, "Haze"),
        ],
        "city": { "name": "New York", "country": "US" }
    })
}

fn source_for(server: &MockServer) -> WeatherSource {
    let provider = OpenWeatherProvider::new("TEST_KEY".into(), Duration::from_secs(5))
        .unwrap()
        .with_base_url(server.uri());
    WeatherSource::live(Box::new(provider))
}

#[tokio::test]
async fn resolves_current_and_forecast() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", "new york"))
        .and(query_param("appid", "TEST_KEY"))
        .and(query_param("units", "metric"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(current_body("New York", 40.7128, -74.006)),
        )
        .expect(1)
        .mount(&server)
        .await;

    // The forecast must be requested at the coordinates the first call returned.
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("lat", "40.7128"))
        .and(query_param("lon", "-74.006"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .expect(1)
        .mount(&server)
        .await;

    let resolved = source_for(&server)
        .resolve(&WeatherQuery::by_name("  new york "))
        .await
        .unwrap();
    let snap = resolved.snapshot;

    assert!(resolved.warning.is_none());
    assert_eq!(snap.provider, "openweather");
    assert_eq!(snap.query, QueryTarget::Name("new york".into()));
    assert_eq!(snap.location.name, "New York");
    assert_eq!(snap.location.country_code, "US");
    assert_eq!(snap.location.lat, 40.7128);

    assert_eq!(snap.current.condition, Condition::Rain);
    assert_eq!(snap.current.description, "light rain");
    assert_eq!(snap.current.temperature_c, 18.4);
    assert_eq!(snap.current.humidity_pct, 71);
    assert_eq!(snap.current.pressure_hpa, 1012);
    assert_eq!(snap.current.wind_direction_deg, 230);
    assert_eq!(snap.current.visibility_m, 9000);
    assert_eq!(snap.current.cloudiness_pct, 75);
    assert_eq!(snap.current.observed_at.timestamp(), 1720107000);
    assert_eq!(snap.current.sunset.timestamp(), 1720139000);

    let times: Vec<i64> = snap.forecast.iter().map(|p| p.time.timestamp()).collect();
    assert_eq!(times, vec![1720105200, 1720116000, 1720126800]);
    assert_eq!(snap.forecast[2].condition, Condition::Other("Haze".into()));
}

#[tokio::test]
async fn coordinate_query_uses_lat_lon() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("lat", "48.85"))
        .and(query_param("lon", "2.35"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(current_body("Paris", 48.8534, 2.3488)),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("lat", "48.8534"))
        .and(query_param("lon", "2.3488"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .mount(&server)
        .await;

    let resolved = source_for(&server)
        .resolve(&WeatherQuery::by_coordinates(48.85, 2.35))
        .await
        .unwrap();

    assert_eq!(resolved.snapshot.location.name, "Paris");
    assert_eq!(resolved.snapshot.forecast.len(), 3);
}

#[tokio::test]
async fn not_found_maps_to_location_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "cod": "404", "message": "city not found"
        })))
        .mount(&server)
        .await;

    let err = source_for(&server)
        .resolve(&WeatherQuery::by_name("Atlantis"))
        .await
        .unwrap_err();

    assert_eq!(err, WeatherError::LocationNotFound("Atlantis".into()));
}

#[tokio::test]
async fn server_error_maps_to_source_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let err = source_for(&server)
        .resolve(&WeatherQuery::by_name("Oslo"))
        .await
        .unwrap_err();

    match err {
        WeatherError::SourceUnavailable(msg) => {
            assert!(msg.contains("503"));
            assert!(msg.contains("upstream down"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_payload_maps_to_source_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"unexpected\": true}"))
        .mount(&server)
        .await;

    let err = source_for(&server)
        .resolve(&WeatherQuery::by_name("Oslo"))
        .await
        .unwrap_err();

    assert!(matches!(err, WeatherError::SourceUnavailable(_)));
}

#[tokio::test]
async fn forecast_failure_degrades_to_empty_series() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body("Oslo", 59.91, 10.75)))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let resolved = source_for(&server)
        .resolve(&WeatherQuery::by_name("Oslo"))
        .await
        .unwrap();

    assert_eq!(resolved.snapshot.current.temperature_c, 18.4);
    assert!(resolved.snapshot.forecast.is_empty());
    let warning = resolved.warning.expect("forecast warning");
    assert!(warning.reason.contains("500"));
}

#[tokio::test]
async fn slow_backend_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(current_body("Oslo", 59.91, 10.75))
                .set_delay(Duration::from_millis(800)),
        )
        .mount(&server)
        .await;

    let err = source_for(&server)
        .with_timeout(Duration::from_millis(100))
        .resolve(&WeatherQuery::by_name("Oslo"))
        .await
        .unwrap_err();

    match err {
        WeatherError::SourceUnavailable(msg) => assert!(msg.contains("timed out")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn forecast_timeout_degrades() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body("Oslo", 59.91, 10.75)))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(forecast_body())
                .set_delay(Duration::from_millis(800)),
        )
        .mount(&server)
        .await;

    let resolved = source_for(&server)
        .with_timeout(Duration::from_millis(200))
        .resolve(&WeatherQuery::by_name("Oslo"))
        .await
        .unwrap();

    assert_eq!(resolved.snapshot.location.name, "Oslo");
    assert_eq!(resolved.snapshot.current.temperature_c, 18.4);
    assert!(resolved.snapshot.forecast.is_empty());

    let warning = resolved.warning.expect("forecast warning");
    assert!(warning.reason.contains("forecast request timed out"));
}

#[tokio::test]
async fn invalid_query_makes_no_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = source_for(&server)
        .resolve(&WeatherQuery::by_name(""))
        .await
        .unwrap_err();

    assert!(matches!(err, WeatherError::InvalidQuery(_)));
}
