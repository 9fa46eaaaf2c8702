//! Offline weather generator.
//!
//! Produces plausible current conditions and a 5-day forecast without any
//! network dependency. Values are pseudo-random; inject a fixed [`RngCore`]
//! to make them reproducible.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use rand::{Rng, RngCore, SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::model::{
    Condition, Coordinates, CurrentConditions, ForecastPoint, Location, QueryTarget,
    WeatherSnapshot,
};

/// Location name used when the query carries only coordinates.
pub const DEFAULT_LOCATION_NAME: &str = "London";
/// Country code attached to every synthetic location.
pub const DEFAULT_COUNTRY_CODE: &str = "GB";
/// Point used when the query carries only a name.
pub const DEFAULT_COORDINATES: Coordinates = Coordinates::new(51.5074, -0.1278);

pub const FORECAST_POINTS: usize = 40;
pub const FORECAST_STEP_HOURS: i64 = 3;

/// Labels the generator draws from, uniformly.
pub const CONDITIONS: [Condition; 7] = [
    Condition::Clear,
    Condition::Clouds,
    Condition::Rain,
    Condition::Snow,
    Condition::Thunderstorm,
    Condition::Mist,
    Condition::Fog,
];

const SUNRISE_HOUR: i64 = 6;
const SUNSET_HOUR: i64 = 18;

pub struct SyntheticGenerator {
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl std::fmt::Debug for SyntheticGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntheticGenerator").finish_non_exhaustive()
    }
}

impl Default for SyntheticGenerator {
    fn default() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl SyntheticGenerator {
    pub fn new(rng: impl RngCore + Send + 'static) -> Self {
        Self {
            rng: Mutex::new(Box::new(rng)),
        }
    }

    pub fn generate(&self, target: &QueryTarget) -> WeatherSnapshot {
        self.generate_at(target, Utc::now())
    }

    pub fn generate_at(&self, target: &QueryTarget, now: DateTime<Utc>) -> WeatherSnapshot {
        // Backends report whole seconds.
        let now = DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now);

        let (name, coords) = match target {
            QueryTarget::Name(name) => (name.clone(), DEFAULT_COORDINATES),
            QueryTarget::Coordinates(c) => (DEFAULT_LOCATION_NAME.to_string(), *c),
        };

        let mut guard = self.rng.lock();
        let rng: &mut dyn RngCore = &mut **guard;

        let condition = pick_condition(rng);
        let base_temp: f64 = rng.gen_range(5.0..35.0);
        let feels_like = base_temp + rng.gen_range(-2.0..2.0);
        let humidity: u8 = rng.gen_range(40..80);
        let pressure: u32 = rng.gen_range(1000..1100);
        let wind_speed: f64 = rng.gen_range(1.0..16.0);
        let wind_direction: u16 = rng.gen_range(0..360);
        let visibility: u32 = rng.gen_range(5000..10000);
        let cloudiness: u8 = rng.gen_range(0..100);

        let day_start = now - Duration::seconds(now.timestamp().rem_euclid(86_400));

        let current = CurrentConditions {
            observed_at: now,
            temperature_c: base_temp,
            feels_like_c: feels_like,
            humidity_pct: humidity,
            pressure_hpa: pressure,
            description: condition.default_description().to_string(),
            condition,
            wind_speed_mps: wind_speed,
            wind_direction_deg: wind_direction,
            visibility_m: visibility,
            cloudiness_pct: cloudiness,
            sunrise: day_start + Duration::hours(SUNRISE_HOUR),
            sunset: day_start + Duration::hours(SUNSET_HOUR),
        };

        let forecast = (0..FORECAST_POINTS)
            .map(|i| ForecastPoint {
                time: now + Duration::hours(FORECAST_STEP_HOURS * i as i64),
                temperature_c: base_temp + rng.gen_range(-5.0..=5.0),
                humidity_pct: (i16::from(humidity) + rng.gen_range(-10i16..=10)).clamp(0, 100)
                    as u8,
                condition: pick_condition(rng),
            })
            .collect();

        WeatherSnapshot {
            provider: "synthetic".to_string(),
            query: target.clone(),
            location: Location {
                name,
                country_code: DEFAULT_COUNTRY_CODE.to_string(),
                lat: coords.lat,
                lon: coords.lon,
            },
            current,
            forecast,
            retrieved_at: now,
        }
    }
}

fn pick_condition(rng: &mut dyn RngCore) -> Condition {
    CONDITIONS
        .choose(rng)
        .cloned()
        .unwrap_or(Condition::Clear)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::mock::StepRng;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn zero_source_yields_range_minimums() {
        let generator = SyntheticGenerator::new(StepRng::new(0, 0));
        let snap = generator.generate_at(&QueryTarget::Name("Testville".into()), fixed_now());

        assert_eq!(snap.provider, "synthetic");
        assert_eq!(snap.location.name, "Testville");
        assert_eq!(snap.location.coordinates(), DEFAULT_COORDINATES);
        assert_eq!(snap.current.condition, Condition::Clear);
        assert_eq!(snap.current.temperature_c, 5.0);
        assert_eq!(snap.current.feels_like_c, 3.0);
        assert_eq!(snap.current.humidity_pct, 40);
        assert_eq!(snap.current.pressure_hpa, 1000);
        assert_eq!(snap.current.wind_speed_mps, 1.0);
        assert_eq!(snap.current.wind_direction_deg, 0);
        assert_eq!(snap.current.visibility_m, 5000);
        assert_eq!(snap.current.cloudiness_pct, 0);
        assert_eq!(snap.forecast[0].temperature_c, 0.0);
        assert_eq!(snap.forecast[0].humidity_pct, 30);
    }

    #[test]
    fn coordinate_query_gets_default_name() {
        let generator = SyntheticGenerator::new(StepRng::new(0, 0));
        let snap = generator.generate_at(
            &QueryTarget::Coordinates(Coordinates::new(35.68, 139.69)),
            fixed_now(),
        );
        assert_eq!(snap.location.name, DEFAULT_LOCATION_NAME);
        assert_eq!(snap.location.country_code, DEFAULT_COUNTRY_CODE);
        assert_eq!(snap.location.lat, 35.68);
        assert_eq!(snap.location.lon, 139.69);
    }

    #[test]
    fn forecast_has_forty_points_three_hours_apart() {
        let generator = SyntheticGenerator::new(StdRng::seed_from_u64(7));
        let now = fixed_now();
        let snap = generator.generate_at(&QueryTarget::Name("Oslo".into()), now);

        assert_eq!(snap.forecast.len(), FORECAST_POINTS);
        assert_eq!(snap.forecast[0].time, now);
        for pair in snap.forecast.windows(2) {
            assert_eq!(pair[1].time - pair[0].time, Duration::hours(3));
        }
    }

    #[test]
    fn values_stay_in_range_across_seeds() {
        for seed in 0..200 {
            let generator = SyntheticGenerator::new(StdRng::seed_from_u64(seed));
            let snap = generator.generate_at(&QueryTarget::Name("Lima".into()), fixed_now());
            let c = &snap.current;

            assert!((5.0..35.0).contains(&c.temperature_c));
            assert!((c.feels_like_c - c.temperature_c).abs() <= 2.0 + 1e-9);
            assert!((40..80).contains(&c.humidity_pct));
            assert!((1000..1100).contains(&c.pressure_hpa));
            assert!((1.0..16.0).contains(&c.wind_speed_mps));
            assert!(c.wind_direction_deg < 360);
            assert!((5000..10000).contains(&c.visibility_m));
            assert!(c.cloudiness_pct < 100);
            assert!(CONDITIONS.contains(&c.condition));
            assert!(c.sunrise < c.sunset);

            for point in &snap.forecast {
                assert!((point.temperature_c - c.temperature_c).abs() <= 5.0 + 1e-9);
                assert!(point.humidity_pct <= 100);
                assert!(CONDITIONS.contains(&point.condition));
            }
        }
    }
}
