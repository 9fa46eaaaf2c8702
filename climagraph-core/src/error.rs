use thiserror::Error;

/// Failures surfaced by the weather source, the report store and the manager.
///
/// The `Display` text of every variant is written for end users; the manager
/// stores it verbatim as `last_error`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeatherError {
    /// Bad caller input. Raised before any I/O is attempted.
    #[error("{0}")]
    InvalidQuery(String),

    /// The backend explicitly reported that it has no match for the query.
    #[error("City not found: {0}")]
    LocationNotFound(String),

    /// Network failure, non-success status, timeout or undecodable payload.
    #[error("Failed to fetch weather data: {0}")]
    SourceUnavailable(String),

    #[error("There is no weather report to save yet. Look up a location first.")]
    NoActiveSnapshot,

    /// The history blob could not be written; in-memory history is unchanged.
    #[error("Failed to persist report history: {0}")]
    PersistenceFailed(String),
}

impl WeatherError {
    pub(crate) fn invalid_query(msg: impl Into<String>) -> Self {
        Self::InvalidQuery(msg.into())
    }

    pub(crate) fn unavailable(msg: impl Into<String>) -> Self {
        Self::SourceUnavailable(msg.into())
    }
}

/// A forecast-only failure that was recovered by degrading to an empty series.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Current conditions loaded, but the forecast is unavailable: {reason}")]
pub struct ForecastWarning {
    pub reason: String,
}

impl From<WeatherError> for ForecastWarning {
    fn from(err: WeatherError) -> Self {
        Self {
            reason: err.to_string(),
        }
    }
}
