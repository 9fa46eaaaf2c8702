use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::{
    error::WeatherError,
    model::{
        Condition, Coordinates, CurrentConditions, ForecastPoint, ForecastSeries, Location,
        QueryTarget,
    },
};

use super::{CurrentObservation, WeatherProvider};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Visibility OpenWeather omits when it is unrestricted.
const MAX_VISIBILITY_M: u32 = 10_000;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, WeatherError> {
        let http = Client::builder().timeout(timeout).build().map_err(|e| {
            WeatherError::unavailable(format!("Failed to build HTTP client: {e}"))
        })?;

        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http,
        })
    }

    /// Point the provider at another deployment of the same API.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
        subject: &str,
    ) -> Result<String, WeatherError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(%url, subject, "requesting OpenWeather {endpoint}");

        let res = self
            .http
            .get(&url)
            .query(params)
            .query(&[("appid", self.api_key.as_str()), ("units", "metric")])
            .send()
            .await
            .map_err(|e| transport_error(endpoint, e))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| transport_error(endpoint, e))?;

        if status == StatusCode::NOT_FOUND || body_reports_not_found(&body) {
            return Err(WeatherError::LocationNotFound(subject.to_string()));
        }

        if !status.is_success() {
            return Err(WeatherError::unavailable(format!(
                "OpenWeather {endpoint} request failed with status {status}: {}",
                truncate_body(&body),
            )));
        }

        debug!(endpoint, status = status.as_u16(), "OpenWeather responded");
        Ok(body)
    }
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    pressure: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
    #[serde(default)]
    deg: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwClouds {
    all: u8,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    #[serde(default)]
    country: String,
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    coord: OwCoord,
    weather: Vec<OwWeather>,
    main: OwMain,
    visibility: Option<u32>,
    wind: OwWind,
    #[serde(default)]
    clouds: OwClouds,
    dt: i64,
    sys: OwSys,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwForecastMain,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    fn name(&self) -> &str {
        "openweather"
    }

    async fn current(&self, target: &QueryTarget) -> Result<CurrentObservation, WeatherError> {
        let params = match target {
            QueryTarget::Name(name) => vec![("q", name.clone())],
            QueryTarget::Coordinates(c) => {
                vec![("lat", c.lat.to_string()), ("lon", c.lon.to_string())]
            }
        };

        let body = self.get("weather", &params, &target.to_string()).await?;
        let parsed: OwCurrentResponse = serde_json::from_str(&body).map_err(|e| {
            WeatherError::unavailable(format!("Failed to parse OpenWeather current JSON: {e}"))
        })?;

        let observed_at = unix_to_utc(parsed.dt).unwrap_or_else(Utc::now);
        let (condition, description) = match parsed.weather.into_iter().next() {
            Some(w) => {
                let condition = Condition::from(w.main);
                let description = if w.description.is_empty() {
                    condition.default_description().to_string()
                } else {
                    w.description
                };
                (condition, description)
            }
            None => (Condition::Other("Unknown".to_string()), "Unknown".to_string()),
        };

        let coords = Coordinates::new(parsed.coord.lat, parsed.coord.lon);
        let name = if parsed.name.is_empty() {
            coords.to_string()
        } else {
            parsed.name
        };

        Ok(CurrentObservation {
            location: Location {
                name,
                country_code: parsed.sys.country,
                lat: coords.lat,
                lon: coords.lon,
            },
            conditions: CurrentConditions {
                observed_at,
                temperature_c: parsed.main.temp,
                feels_like_c: parsed.main.feels_like,
                humidity_pct: parsed.main.humidity,
                pressure_hpa: parsed.main.pressure.round().max(0.0) as u32,
                condition,
                description,
                wind_speed_mps: parsed.wind.speed,
                wind_direction_deg: (parsed.wind.deg.round() as i64).rem_euclid(360) as u16,
                visibility_m: parsed.visibility.unwrap_or(MAX_VISIBILITY_M),
                cloudiness_pct: parsed.clouds.all,
                sunrise: unix_to_utc(parsed.sys.sunrise).unwrap_or(observed_at),
                sunset: unix_to_utc(parsed.sys.sunset).unwrap_or(observed_at),
            },
        })
    }

    async fn forecast(&self, at: Coordinates) -> Result<ForecastSeries, WeatherError> {
        let params = [("lat", at.lat.to_string()), ("lon", at.lon.to_string())];

        let body = self.get("forecast", &params, &at.to_string()).await?;
        let parsed: OwForecastResponse = serde_json::from_str(&body).map_err(|e| {
            WeatherError::unavailable(format!("Failed to parse OpenWeather forecast JSON: {e}"))
        })?;

        let mut series: ForecastSeries = parsed
            .list
            .into_iter()
            .filter_map(|entry| {
                let time = unix_to_utc(entry.dt)?;
                let condition = entry
                    .weather
                    .into_iter()
                    .next()
                    .map(|w| Condition::from(w.main))
                    .unwrap_or_else(|| Condition::Other("Unknown".to_string()));

                Some(ForecastPoint {
                    time,
                    temperature_c: entry.main.temp,
                    humidity_pct: entry.main.humidity,
                    condition,
                })
            })
            .collect();

        series.sort_by_key(|p| p.time);
        Ok(series)
    }
}

fn transport_error(endpoint: &str, err: reqwest::Error) -> WeatherError {
    if err.is_timeout() {
        WeatherError::unavailable(format!("OpenWeather {endpoint} request timed out"))
    } else {
        WeatherError::unavailable(format!("Failed to reach OpenWeather ({endpoint}): {err}"))
    }
}

/// OpenWeather sometimes reports "no such place" only in the body's `cod` field.
fn body_reports_not_found(body: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("cod").cloned())
        .is_some_and(|cod| cod == "404" || cod == 404)
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
