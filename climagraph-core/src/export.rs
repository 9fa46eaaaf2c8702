use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::{
    model::{CurrentConditions, Location, ReportId, SavedReport, WeatherSnapshot},
    series::{ChartPoint, DEFAULT_WINDOW, project},
};

/// Everything an export renderer needs to lay out one report page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSheet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_id: Option<ReportId>,
    pub provider: String,
    pub location: Location,
    /// e.g. "Thursday, July 4, 2024"
    pub date_line: String,
    pub current: CurrentConditions,
    pub sunrise_label: String,
    pub sunset_label: String,
    pub chart: Vec<ChartPoint>,
    pub retrieved_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl ReportSheet {
    pub fn from_snapshot<Tz>(snapshot: &WeatherSnapshot, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let local = |t: DateTime<Utc>| t.with_timezone(tz);

        Self {
            report_id: None,
            provider: snapshot.provider.clone(),
            location: snapshot.location.clone(),
            date_line: local(snapshot.current.observed_at)
                .format("%A, %B %-d, %Y")
                .to_string(),
            current: snapshot.current.clone(),
            sunrise_label: local(snapshot.current.sunrise).format("%I:%M %p").to_string(),
            sunset_label: local(snapshot.current.sunset).format("%I:%M %p").to_string(),
            chart: project(&snapshot.forecast, DEFAULT_WINDOW, tz),
            retrieved_at: snapshot.retrieved_at,
            saved_at: None,
        }
    }

    pub fn from_report<Tz>(report: &SavedReport, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        Self {
            report_id: Some(report.id),
            saved_at: Some(report.saved_at),
            ..Self::from_snapshot(&report.snapshot, tz)
        }
    }

    /// Suggested file name, e.g. `weather-report-New-York-2024-07-04.json`.
    pub fn file_name(&self, on: NaiveDate) -> String {
        let city: String = self
            .location
            .name
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '-' })
            .collect();
        format!("weather-report-{}-{}.json", city.trim_matches('-'), on.format("%Y-%m-%d"))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize report sheet")
    }
}
