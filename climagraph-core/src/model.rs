use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::WeatherError;

/// Geographic point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lon)
    }
}

/// Caller-facing lookup request. Exactly one of the two fields must be set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherQuery {
    pub name: Option<String>,
    pub coordinates: Option<Coordinates>,
}

impl WeatherQuery {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            coordinates: None,
        }
    }

    pub fn by_coordinates(lat: f64, lon: f64) -> Self {
        Self {
            name: None,
            coordinates: Some(Coordinates::new(lat, lon)),
        }
    }

    /// Check the query shape and turn it into a resolvable target.
    pub fn validate(&self) -> Result<QueryTarget, WeatherError> {
        match (&self.name, self.coordinates) {
            (Some(_), Some(_)) => Err(WeatherError::invalid_query(
                "Provide either a city name or coordinates, not both",
            )),
            (None, None) => Err(WeatherError::invalid_query("Please enter a city name")),
            (Some(name), None) => {
                let trimmed = name.trim();
                if trimmed.is_empty() {
                    return Err(WeatherError::invalid_query("Please enter a city name"));
                }
                Ok(QueryTarget::Name(trimmed.to_string()))
            }
            (None, Some(coords)) => {
                if !coords.is_valid() {
                    return Err(WeatherError::invalid_query(format!(
                        "Coordinates out of range: {coords}"
                    )));
                }
                Ok(QueryTarget::Coordinates(coords))
            }
        }
    }
}

/// A validated query: what a snapshot was resolved from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryTarget {
    Name(String),
    Coordinates(Coordinates),
}

impl From<QueryTarget> for WeatherQuery {
    fn from(target: QueryTarget) -> Self {
        match target {
            QueryTarget::Name(name) => WeatherQuery::by_name(name),
            QueryTarget::Coordinates(c) => WeatherQuery::by_coordinates(c.lat, c.lon),
        }
    }
}

impl fmt::Display for QueryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryTarget::Name(name) => f.write_str(name),
            QueryTarget::Coordinates(c) => write!(f, "({c})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub country_code: String,
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }
}

/// Primary condition label as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Condition {
    Clear,
    Clouds,
    Rain,
    Drizzle,
    Snow,
    Thunderstorm,
    Mist,
    Fog,
    Other(String),
}

impl Condition {
    pub fn as_str(&self) -> &str {
        match self {
            Condition::Clear => "Clear",
            Condition::Clouds => "Clouds",
            Condition::Rain => "Rain",
            Condition::Drizzle => "Drizzle",
            Condition::Snow => "Snow",
            Condition::Thunderstorm => "Thunderstorm",
            Condition::Mist => "Mist",
            Condition::Fog => "Fog",
            Condition::Other(label) => label,
        }
    }

    /// Short human description used when the backend supplies none.
    pub fn default_description(&self) -> &str {
        match self {
            Condition::Clear => "clear sky",
            Condition::Clouds => "scattered clouds",
            Condition::Rain => "moderate rain",
            Condition::Drizzle => "light intensity drizzle",
            Condition::Snow => "light snow",
            Condition::Thunderstorm => "thunderstorm",
            Condition::Mist => "mist",
            Condition::Fog => "fog",
            Condition::Other(label) => label,
        }
    }
}

impl From<String> for Condition {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Clear" => Condition::Clear,
            "Clouds" => Condition::Clouds,
            "Rain" => Condition::Rain,
            "Drizzle" => Condition::Drizzle,
            "Snow" => Condition::Snow,
            "Thunderstorm" => Condition::Thunderstorm,
            "Mist" => Condition::Mist,
            "Fog" => Condition::Fog,
            _ => Condition::Other(label),
        }
    }
}

impl From<Condition> for String {
    fn from(condition: Condition) -> Self {
        match condition {
            Condition::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observed conditions at a point in time, metric units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub observed_at: DateTime<Utc>,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: u8,
    pub pressure_hpa: u32,
    pub condition: Condition,
    pub description: String,
    pub wind_speed_mps: f64,
    pub wind_direction_deg: u16,
    pub visibility_m: u32,
    pub cloudiness_pct: u8,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub time: DateTime<Utc>,
    pub temperature_c: f64,
    pub humidity_pct: u8,
    pub condition: Condition,
}

/// Forecast points in ascending time order.
pub type ForecastSeries = Vec<ForecastPoint>;

/// One fetched bundle of current conditions and forecast. Never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Short name of the source that produced this snapshot.
    pub provider: String,
    /// What the caller asked for; refresh resolves this again.
    pub query: QueryTarget,
    pub location: Location,
    pub current: CurrentConditions,
    pub forecast: ForecastSeries,
    pub retrieved_at: DateTime<Utc>,
}

/// Monotonic, time-derived identifier of a saved report (epoch millis).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(pub u64);

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ReportId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(ReportId)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedReport {
    pub id: ReportId,
    pub saved_at: DateTime<Utc>,
    pub snapshot: WeatherSnapshot,
}
