//! Core library for ClimaGraph.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Weather acquisition from a live provider, with a synthetic fallback
//! - A bounded, persisted history of saved reports
//! - The lifecycle manager the presentation layer drives
//! - Chart and export shaping of report data
//!
//! It is used by `climagraph-cli`, but can also be reused by other front ends.

pub mod config;
pub mod error;
pub mod export;
pub mod manager;
pub mod model;
pub mod provider;
pub mod series;
pub mod source;
pub mod storage;
pub mod store;

pub use config::{Config, ProviderConfig};
pub use error::{ForecastWarning, WeatherError};
pub use export::ReportSheet;
pub use manager::{FetchStatus, ReportManager};
pub use model::{
    Condition, Coordinates, CurrentConditions, ForecastPoint, ForecastSeries, Location,
    QueryTarget, ReportId, SavedReport, WeatherQuery, WeatherSnapshot,
};
pub use provider::{ProviderId, WeatherProvider};
pub use series::{ChartPoint, project, project_local};
pub use source::{Resolved, WeatherSource};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use store::{HISTORY_CAPACITY, ReportStore};
