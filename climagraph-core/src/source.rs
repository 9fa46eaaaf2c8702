//! Weather source adapter.
//!
//! Turns a [`WeatherQuery`] into one [`WeatherSnapshot`]: either through a
//! live [`WeatherProvider`] (current conditions, then the forecast at the
//! coordinates the first call resolved to) or, with no provider configured,
//! through the [`SyntheticGenerator`].

use std::{future::Future, time::Duration};

use chrono::Utc;
use tracing::{debug, warn};

use crate::{
    config::{Config, DEFAULT_REQUEST_TIMEOUT_SECS},
    error::{ForecastWarning, WeatherError},
    model::{QueryTarget, WeatherQuery, WeatherSnapshot},
    provider::{WeatherProvider, provider_from_config, synthetic::SyntheticGenerator},
};

/// A fresh snapshot, plus a warning when the forecast had to be dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub snapshot: WeatherSnapshot,
    pub warning: Option<ForecastWarning>,
}

#[derive(Debug)]
pub struct WeatherSource {
    live: Option<Box<dyn WeatherProvider>>,
    synthetic: SyntheticGenerator,
    timeout: Duration,
}

impl WeatherSource {
    /// Offline source backed only by the generator.
    pub fn synthetic(generator: SyntheticGenerator) -> Self {
        Self {
            live: None,
            synthetic: generator,
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    pub fn live(provider: Box<dyn WeatherProvider>) -> Self {
        Self {
            live: Some(provider),
            ..Self::synthetic(SyntheticGenerator::default())
        }
    }

    /// Live provider when credentials are configured, synthetic otherwise.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let source = match provider_from_config(config)? {
            Some(provider) => Self::live(provider),
            None => Self::synthetic(SyntheticGenerator::default()),
        };
        Ok(source.with_timeout(config.request_timeout()))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_live(&self) -> bool {
        self.live.is_some()
    }

    pub fn provider_name(&self) -> &str {
        self.live.as_deref().map_or("synthetic", |p| p.name())
    }

    pub async fn resolve(&self, query: &WeatherQuery) -> Result<Resolved, WeatherError> {
        let target = query.validate()?;

        match self.live.as_deref() {
            Some(provider) => self.resolve_live(provider, target).await,
            None => {
                debug!(%target, "no live provider configured, generating synthetic weather");
                Ok(Resolved {
                    snapshot: self.synthetic.generate(&target),
                    warning: None,
                })
            }
        }
    }

    async fn resolve_live(
        &self,
        provider: &dyn WeatherProvider,
        target: QueryTarget,
    ) -> Result<Resolved, WeatherError> {
        let observation = self.bounded("current conditions", provider.current(&target)).await?;

        // Ask for the forecast where the first call actually landed.
        let at = observation.location.coordinates();
        let (forecast, warning) = match self.bounded("forecast", provider.forecast(at)).await {
            Ok(series) => (series, None),
            Err(err) => {
                warn!(%target, error = %err, "forecast unavailable, continuing without it");
                (Vec::new(), Some(ForecastWarning::from(err)))
            }
        };

        Ok(Resolved {
            snapshot: WeatherSnapshot {
                provider: provider.name().to_string(),
                query: target,
                location: observation.location,
                current: observation.conditions,
                forecast,
                retrieved_at: Utc::now(),
            },
            warning,
        })
    }

    async fn bounded<T>(
        &self,
        what: &str,
        call: impl Future<Output = Result<T, WeatherError>>,
    ) -> Result<T, WeatherError> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| {
                WeatherError::unavailable(format!(
                    "{what} request timed out after {:?}",
                    self.timeout
                ))
            })?
    }
}
