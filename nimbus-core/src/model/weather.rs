use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{AirQuality, Alert, Pollen, WeatherCode};
use crate::units::Temperature as TemperatureValue;
use crate::units::{Distance, Precipitation as PrecipitationValue, PrecipitationIntensity, Pressure, Ratio, Speed};

/// Per-feature last-refresh bookkeeping. Each timestamp is independently
/// nullable: absence means "never fetched", not "fetched and empty".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Base {
    pub forecast_update_time: Option<DateTime<Utc>>,
    pub current_update_time: Option<DateTime<Utc>>,
    pub air_quality_update_time: Option<DateTime<Utc>>,
    pub pollen_update_time: Option<DateTime<Utc>>,
    pub minutely_update_time: Option<DateTime<Utc>>,
    pub alerts_update_time: Option<DateTime<Utc>>,
    pub normals_update_time: Option<DateTime<Utc>>,
    /// Coordinates the normals were interpolated for.
    pub normals_latitude: Option<f64>,
    pub normals_longitude: Option<f64>,
}

impl Base {
    /// Normals are geographically interpolated; once the location drifts
    /// beyond the tolerance (degrees) they must be refetched.
    pub fn normals_valid_for(&self, latitude: f64, longitude: f64, tolerance: f64) -> bool {
        match (self.normals_latitude, self.normals_longitude) {
            (Some(lat), Some(lon)) => {
                (lat - latitude).abs() <= tolerance && (lon - longitude).abs() <= tolerance
            }
            _ => false,
        }
    }
}

/// Temperature with its feels-like variants. Each field stays `None` when
/// the source never supplied that variant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    pub temperature: Option<TemperatureValue>,
    pub source_feels_like: Option<TemperatureValue>,
    pub apparent: Option<TemperatureValue>,
    pub wind_chill: Option<TemperatureValue>,
    pub wet_bulb: Option<TemperatureValue>,
}

impl Temperature {
    /// The value to display as "feels like": the source's own figure when
    /// given, otherwise the best available computed variant.
    pub fn feels_like(&self) -> Option<TemperatureValue> {
        self.source_feels_like.or(self.apparent).or(self.wind_chill)
    }

    pub fn is_valid(&self) -> bool {
        self.temperature.is_some()
            || self.source_feels_like.is_some()
            || self.apparent.is_some()
            || self.wind_chill.is_some()
            || self.wet_bulb.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    /// Meteorological direction in degrees (from which the wind blows).
    pub direction: Option<f64>,
    pub speed: Option<Speed>,
    pub gusts: Option<Speed>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Precipitation {
    pub total: Option<PrecipitationValue>,
    pub thunderstorm: Option<PrecipitationValue>,
    pub rain: Option<PrecipitationValue>,
    pub snow: Option<PrecipitationValue>,
    pub ice: Option<PrecipitationValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrecipitationProbability {
    pub total: Option<Ratio>,
    pub thunderstorm: Option<Ratio>,
    pub rain: Option<Ratio>,
    pub snow: Option<Ratio>,
    pub ice: Option<Ratio>,
}

/// Expected precipitation duration in hours.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrecipitationDuration {
    pub total: Option<f64>,
    pub thunderstorm: Option<f64>,
    pub rain: Option<f64>,
    pub snow: Option<f64>,
    pub ice: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UV {
    pub index: Option<f64>,
}

/// Rise/set pair for sun, moon or twilight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Astro {
    pub rise_date: Option<DateTime<Utc>>,
    pub set_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoonPhase {
    /// Phase angle in degrees, 0 = new moon, 180 = full moon.
    pub angle: Option<i32>,
}

/// Heating/cooling degree days relative to the local reference base.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DegreeDay {
    pub heating: Option<TemperatureValue>,
    pub cooling: Option<TemperatureValue>,
}

/// Daily average/min/max triple for a statistical summary field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyStat<T> {
    pub average: Option<T>,
    pub min: Option<T>,
    pub max: Option<T>,
}

/// The day-portion or night-portion sub-forecast of one calendar day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HalfDay {
    pub weather_text: Option<String>,
    pub weather_code: Option<WeatherCode>,
    pub temperature: Option<Temperature>,
    pub precipitation: Option<Precipitation>,
    pub precipitation_probability: Option<PrecipitationProbability>,
    pub precipitation_duration: Option<PrecipitationDuration>,
    pub wind: Option<Wind>,
    pub cloud_cover: Option<Ratio>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Daily {
    /// Start of the calendar day in the location's timezone, as UTC.
    pub date: DateTime<Utc>,
    pub day: Option<HalfDay>,
    pub night: Option<HalfDay>,
    pub degree_day: Option<DegreeDay>,
    pub sun: Option<Astro>,
    pub moon: Option<Astro>,
    pub twilight: Option<Astro>,
    pub moon_phase: Option<MoonPhase>,
    pub air_quality: Option<AirQuality>,
    pub pollen: Option<Pollen>,
    pub uv: Option<UV>,
    /// Sunshine duration in hours.
    pub sunshine_duration: Option<f64>,
    pub relative_humidity: Option<DailyStat<Ratio>>,
    pub dew_point: Option<DailyStat<TemperatureValue>>,
    pub pressure: Option<DailyStat<Pressure>>,
    pub cloud_cover: Option<DailyStat<Ratio>>,
    pub visibility: Option<DailyStat<Distance>>,
}

/// One hour of forecast. `is_daylight` is computed once at mapping time
/// because it depends on latitude and season, not on a fixed clock range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hourly {
    pub date: DateTime<Utc>,
    pub is_daylight: bool,
    pub weather_text: Option<String>,
    pub weather_code: Option<WeatherCode>,
    pub temperature: Option<Temperature>,
    pub precipitation: Option<Precipitation>,
    pub precipitation_probability: Option<PrecipitationProbability>,
    pub wind: Option<Wind>,
    pub air_quality: Option<AirQuality>,
    pub uv: Option<UV>,
    pub relative_humidity: Option<Ratio>,
    pub dew_point: Option<TemperatureValue>,
    pub pressure: Option<Pressure>,
    pub cloud_cover: Option<Ratio>,
    pub visibility: Option<Distance>,
}

/// One point of the minutely precipitation series. The interval is derived
/// from timestamp deltas by the converter, never assumed constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Minutely {
    pub date: DateTime<Utc>,
    pub minute_interval: i64,
    pub precipitation_intensity: Option<PrecipitationIntensity>,
}

/// Climatological average conditions for one calendar month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Normals {
    pub daytime_temperature: Option<TemperatureValue>,
    pub nighttime_temperature: Option<TemperatureValue>,
}

impl Normals {
    pub fn is_valid(&self) -> bool {
        self.daytime_temperature.is_some() || self.nighttime_temperature.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Current {
    pub weather_text: Option<String>,
    pub weather_code: Option<WeatherCode>,
    pub temperature: Option<Temperature>,
    pub wind: Option<Wind>,
    pub uv: Option<UV>,
    pub air_quality: Option<AirQuality>,
    pub relative_humidity: Option<Ratio>,
    pub dew_point: Option<TemperatureValue>,
    pub pressure: Option<Pressure>,
    pub cloud_cover: Option<Ratio>,
    pub visibility: Option<Distance>,
    pub ceiling: Option<Distance>,
    /// Pre-rendered one-line summaries used by notifications.
    pub daily_forecast: Option<String>,
    pub hourly_forecast: Option<String>,
}

/// The fully-assembled aggregate handed to persistence and the UI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    pub base: Base,
    pub current: Option<Current>,
    pub daily_forecast: Vec<Daily>,
    pub hourly_forecast: Vec<Hourly>,
    pub minutely_forecast: Vec<Minutely>,
    pub alert_list: Vec<Alert>,
    /// Keyed by calendar month (1-12) so months fetched across refresh
    /// cycles merge without clobbering each other.
    pub normals: BTreeMap<u32, Normals>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::TemperatureUnit;

    #[test]
    fn feels_like_prefers_source_value() {
        let t = Temperature {
            temperature: TemperatureValue::celsius(10.0).ok(),
            source_feels_like: TemperatureValue::celsius(7.0).ok(),
            apparent: TemperatureValue::celsius(8.0).ok(),
            wind_chill: TemperatureValue::celsius(6.0).ok(),
            wet_bulb: None,
        };
        assert_eq!(t.feels_like().unwrap().to_unit(TemperatureUnit::Celsius), 7.0);

        let computed_only = Temperature {
            source_feels_like: None,
            ..t
        };
        assert_eq!(
            computed_only.feels_like().unwrap().to_unit(TemperatureUnit::Celsius),
            8.0
        );
    }

    #[test]
    fn normals_invalidate_when_coordinates_drift() {
        let base = Base {
            normals_latitude: Some(48.8),
            normals_longitude: Some(2.3),
            ..Default::default()
        };
        assert!(base.normals_valid_for(48.81, 2.31, 0.1));
        assert!(!base.normals_valid_for(49.5, 2.3, 0.1));
        assert!(!Base::default().normals_valid_for(48.8, 2.3, 0.1));
    }
}
