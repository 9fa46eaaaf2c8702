use crate::{
    Config, WeatherError,
    model::{Coordinates, CurrentConditions, ForecastSeries, Location, QueryTarget},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::{convert::TryFrom, fmt::Debug};

pub mod openweather;
pub mod synthetic;

/// Live data sources that can be configured with credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather]
    }

    /// Environment variable consulted when the config file holds no key.
    pub fn api_key_env_var(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "OPENWEATHER_API_KEY",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderId::OpenWeather),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openweather."
            )),
        }
    }
}

/// Location and conditions returned by a current-conditions lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentObservation {
    pub location: Location,
    pub conditions: CurrentConditions,
}

/// A live backend: one call for current conditions, one for the forecast.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Short name recorded on every snapshot this provider produces.
    fn name(&self) -> &str;

    async fn current(&self, target: &QueryTarget) -> Result<CurrentObservation, WeatherError>;

    async fn forecast(&self, at: Coordinates) -> Result<ForecastSeries, WeatherError>;
}

/// Construct a live provider from config, or `None` when no credentials are available.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Option<Box<dyn WeatherProvider>>> {
    let Some(id) = config.active_provider_id()? else {
        return Ok(None);
    };

    let Some(api_key) = config.resolve_api_key(id) else {
        return Ok(None);
    };

    let boxed: Box<dyn WeatherProvider> = match id {
        ProviderId::OpenWeather => {
            let mut provider = OpenWeatherProvider::new(api_key, config.request_timeout())?;
            if let Some(base_url) = config.provider_base_url(id) {
                provider = provider.with_base_url(base_url);
            }
            Box::new(provider)
        }
    };

    Ok(Some(boxed))
}
