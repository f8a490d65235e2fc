use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::weather::{
    Current, Daily, Minutely, Normals, Precipitation, PrecipitationProbability, Temperature, UV,
    Wind,
};
use super::{AirQuality, Alert, Pollen, WeatherCode};
use crate::error::SourceError;
use crate::source::SourceFeature;
use crate::units::{Distance, Pressure, Ratio, Temperature as TemperatureValue};

/// Hourly record as produced by a converter, before the mapper computes
/// the daylight flag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HourlyWrapper {
    pub date: DateTime<Utc>,
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

/// Transient per-refresh output of a primary source's converter.
///
/// A field that is `None` with no entry in `failed_features` means the
/// feature was not requested (or the source legitimately returned
/// nothing); an entry in `failed_features` means the source could not be
/// reached or parsed for that feature. The caching layer relies on this
/// distinction to keep previously cached data, so the two states must
/// never be conflated.
#[derive(Debug, Clone, Default)]
pub struct WeatherWrapper {
    pub current: Option<Current>,
    pub daily_forecast: Option<Vec<Daily>>,
    pub hourly_forecast: Option<Vec<HourlyWrapper>>,
    pub minutely_forecast: Option<Vec<Minutely>>,
    pub alert_list: Option<Vec<Alert>>,
    pub normals: Option<BTreeMap<u32, Normals>>,
    /// Present-conditions air quality / pollen snapshot; merged into
    /// `Current` by the mapper.
    pub air_quality: Option<AirQuality>,
    pub pollen: Option<Pollen>,
    pub failed_features: HashMap<SourceFeature, SourceError>,
}

/// Output of a secondary source, which can only supplement specific
/// features (alerts, air quality, pollen, normals) of a primary source.
#[derive(Debug, Clone, Default)]
pub struct SecondaryWeatherWrapper {
    pub air_quality: Option<AirQuality>,
    pub pollen: Option<Pollen>,
    pub minutely_forecast: Option<Vec<Minutely>>,
    pub alert_list: Option<Vec<Alert>>,
    pub normals: Option<BTreeMap<u32, Normals>>,
    pub failed_features: HashMap<SourceFeature, SourceError>,
}
