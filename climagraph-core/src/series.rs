use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::model::ForecastPoint;

/// Number of forecast points shown on a report chart (24 hours at 3h spacing).
pub const DEFAULT_WINDOW: usize = 8;

/// One chart sample: hour label, whole-degree temperature, humidity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub temperature: i64,
    pub humidity: u8,
}

/// Take the first `window` points of `series` and shape them for charting,
/// labelling each with its `hh:mm AM/PM` time in `tz`.
pub fn project<Tz>(series: &[ForecastPoint], window: usize, tz: &Tz) -> Vec<ChartPoint>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    series
        .iter()
        .take(window)
        .map(|point| ChartPoint {
            label: point.time.with_timezone(tz).format("%I:%M %p").to_string(),
            temperature: round_half_up(point.temperature_c),
            humidity: point.humidity_pct,
        })
        .collect()
}

/// [`project`] in the host's local time zone.
pub fn project_local(series: &[ForecastPoint], window: usize) -> Vec<ChartPoint> {
    project(series, window, &Local)
}

/// Nearest integer, ties toward positive infinity.
fn round_half_up(value: f64) -> i64 {
    let floor = value.floor();
    let rounded = if value - floor >= 0.5 { floor + 1.0 } else { floor };
    rounded as i64
}
