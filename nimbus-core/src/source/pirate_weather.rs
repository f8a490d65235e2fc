//! Pirate Weather, a Dark Sky compatible forecast API. Key required.

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

use super::{SourceFeature, SourceId, WeatherSource, ensure_supported, get_json, is_requested};
use crate::config::Config;
use crate::error::SourceError;
use crate::location::Location;
use crate::mapper;
use crate::model::weather::{Astro, Current, Daily, HalfDay, Minutely, MoonPhase, UV};
use crate::model::{Alert, AlertSeverity, HourlyWrapper, WeatherCode, WeatherWrapper, synthesized_alert_id};
use crate::units::{
    Distance, Precipitation, PrecipitationIntensity, Pressure, Ratio, Speed, Temperature,
};

const DEFAULT_BASE_URL: &str = "https://api.pirateweather.net";
const DEFAULT_API_KEY: Option<&str> = None;

#[derive(Debug, Clone)]
pub struct PirateWeatherService {
    api_key: String,
    base_url: String,
    http: Client,
}

impl PirateWeatherService {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url,
            http: Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let api_key = config.effective_api_key(SourceId::PirateWeather, DEFAULT_API_KEY)?;
        let base_url = config.effective_instance(SourceId::PirateWeather, DEFAULT_BASE_URL);
        Ok(Self::new(api_key, base_url))
    }

    async fn fetch_forecast(&self, location: &Location) -> Result<PwForecastResult, SourceError> {
        let url = format!(
            "{}/forecast/{}/{},{}",
            self.base_url, self.api_key, location.latitude, location.longitude
        );
        get_json(&self.http, &url, &[("units", "si".to_string())]).await
    }
}

#[async_trait]
impl WeatherSource for PirateWeatherService {
    fn id(&self) -> SourceId {
        SourceId::PirateWeather
    }

    fn supported_features(&self, _location: &Location) -> Vec<SourceFeature> {
        vec![
            SourceFeature::Forecast,
            SourceFeature::Current,
            SourceFeature::Alert,
            SourceFeature::Minutely,
        ]
    }

    async fn fetch(
        &self,
        location: &Location,
        features: &[SourceFeature],
    ) -> Result<WeatherWrapper, SourceError> {
        ensure_supported(&self.supported_features(location), features)?;

        // One endpoint serves everything; a fetch failure fails every
        // requested feature at once.
        let forecast = match self.fetch_forecast(location).await {
            Ok(forecast) => forecast,
            Err(err) => {
                let mut failed = HashMap::new();
                for feature in features {
                    failed.insert(*feature, err.clone());
                }
                return Ok(WeatherWrapper {
                    failed_features: failed,
                    ..Default::default()
                });
            }
        };

        convert(Some(forecast), features)
    }
}

pub(crate) fn convert(
    forecast: Option<PwForecastResult>,
    features: &[SourceFeature],
) -> Result<WeatherWrapper, SourceError> {
    let Some(forecast) = forecast else {
        return Ok(WeatherWrapper::default());
    };

    let daily = forecast.daily.as_ref().map(|b| b.data.as_slice()).unwrap_or_default();
    let hourly = forecast.hourly.as_ref().map(|b| b.data.as_slice()).unwrap_or_default();
    if is_requested(features, SourceFeature::Forecast) && daily.is_empty() && hourly.is_empty() {
        return Err(SourceError::InvalidOrIncompleteData);
    }

    let mut wrapper = WeatherWrapper::default();

    if is_requested(features, SourceFeature::Forecast) {
        wrapper.daily_forecast =
            (!daily.is_empty()).then(|| daily.iter().map(convert_daily).collect());
        wrapper.hourly_forecast =
            (!hourly.is_empty()).then(|| hourly.iter().map(convert_hourly).collect());
    }
    if is_requested(features, SourceFeature::Current) {
        wrapper.current = forecast.currently.as_ref().map(convert_current);
    }
    if is_requested(features, SourceFeature::Minutely) {
        wrapper.minutely_forecast = forecast
            .minutely
            .map(|block| convert_minutely(&block.data));
    }
    if is_requested(features, SourceFeature::Alert) {
        wrapper.alert_list = forecast
            .alerts
            .map(|alerts| Alert::deduplicate(alerts.iter().map(convert_alert).collect()));
    }

    Ok(wrapper)
}

fn convert_current(raw: &PwDataPoint) -> Current {
    Current {
        weather_text: raw.summary.clone(),
        weather_code: raw.icon.as_deref().and_then(weather_code),
        temperature: mapper::temperature(
            raw.temperature.and_then(|v| Temperature::celsius(v).ok()),
            raw.apparent_temperature.and_then(|v| Temperature::celsius(v).ok()),
            None,
            None,
            None,
        ),
        wind: mapper::wind(
            raw.wind_bearing,
            raw.wind_speed.and_then(|v| Speed::meters_per_second(v).ok()),
            raw.wind_gust.and_then(|v| Speed::meters_per_second(v).ok()),
        ),
        uv: raw.uv_index.map(|index| UV { index: Some(index) }),
        relative_humidity: raw.humidity.and_then(|v| Ratio::fraction(v).ok()),
        dew_point: raw.dew_point.and_then(|v| Temperature::celsius(v).ok()),
        pressure: raw.pressure.and_then(|v| Pressure::hectopascals(v).ok()),
        cloud_cover: raw.cloud_cover.and_then(|v| Ratio::fraction(v).ok()),
        visibility: raw
            .visibility
            .and_then(|v| Distance::kilometers(v).ok())
            .and_then(Distance::validate_non_negative),
        ..Default::default()
    }
}

fn convert_daily(raw: &PwDataPoint) -> Daily {
    Daily {
        date: DateTime::from_timestamp(raw.time, 0).unwrap_or_default(),
        day: Some(HalfDay {
            weather_text: raw.summary.clone(),
            weather_code: raw.icon.as_deref().and_then(weather_code),
            temperature: mapper::temperature(
                raw.temperature_high.and_then(|v| Temperature::celsius(v).ok()),
                raw.apparent_temperature_high.and_then(|v| Temperature::celsius(v).ok()),
                None,
                None,
                None,
            ),
            precipitation_probability: mapper::precipitation_probability(
                raw.precip_probability.and_then(|v| Ratio::fraction(v).ok()),
                None,
                None,
                None,
                None,
            ),
            wind: mapper::wind(
                raw.wind_bearing,
                raw.wind_speed.and_then(|v| Speed::meters_per_second(v).ok()),
                raw.wind_gust.and_then(|v| Speed::meters_per_second(v).ok()),
            ),
            cloud_cover: raw.cloud_cover.and_then(|v| Ratio::fraction(v).ok()),
            ..Default::default()
        }),
        night: Some(HalfDay {
            weather_text: raw.summary.clone(),
            weather_code: raw.icon.as_deref().and_then(weather_code),
            temperature: mapper::temperature(
                raw.temperature_low.and_then(|v| Temperature::celsius(v).ok()),
                raw.apparent_temperature_low.and_then(|v| Temperature::celsius(v).ok()),
                None,
                None,
                None,
            ),
            ..Default::default()
        }),
        sun: Some(Astro {
            rise_date: raw.sunrise_time.and_then(|t| DateTime::from_timestamp(t, 0)),
            set_date: raw.sunset_time.and_then(|t| DateTime::from_timestamp(t, 0)),
        }),
        moon_phase: raw.moon_phase.map(|phase| MoonPhase {
            angle: Some((phase * 360.0).round() as i32),
        }),
        uv: raw.uv_index.map(|index| UV { index: Some(index) }),
        ..Default::default()
    }
}

fn convert_hourly(raw: &PwDataPoint) -> HourlyWrapper {
    HourlyWrapper {
        date: DateTime::from_timestamp(raw.time, 0).unwrap_or_default(),
        weather_text: raw.summary.clone(),
        weather_code: raw.icon.as_deref().and_then(weather_code),
        temperature: mapper::temperature(
            raw.temperature.and_then(|v| Temperature::celsius(v).ok()),
            raw.apparent_temperature.and_then(|v| Temperature::celsius(v).ok()),
            None,
            None,
            None,
        ),
        precipitation: mapper::precipitation(
            // mm/h over a one hour slot is the accumulation in mm.
            raw.precip_intensity
                .and_then(|v| Precipitation::millimeters(v).ok()),
            None,
            None,
            None,
            None,
        ),
        precipitation_probability: mapper::precipitation_probability(
            raw.precip_probability.and_then(|v| Ratio::fraction(v).ok()),
            None,
            None,
            None,
            None,
        ),
        wind: mapper::wind(
            raw.wind_bearing,
            raw.wind_speed.and_then(|v| Speed::meters_per_second(v).ok()),
            raw.wind_gust.and_then(|v| Speed::meters_per_second(v).ok()),
        ),
        uv: raw.uv_index.map(|index| UV { index: Some(index) }),
        relative_humidity: raw.humidity.and_then(|v| Ratio::fraction(v).ok()),
        dew_point: raw.dew_point.and_then(|v| Temperature::celsius(v).ok()),
        pressure: raw.pressure.and_then(|v| Pressure::hectopascals(v).ok()),
        cloud_cover: raw.cloud_cover.and_then(|v| Ratio::fraction(v).ok()),
        visibility: raw
            .visibility
            .and_then(|v| Distance::kilometers(v).ok())
            .and_then(Distance::validate_non_negative),
        ..Default::default()
    }
}

/// Interval between minutely points from timestamp deltas, next-delta for
/// all but the last point.
pub(crate) fn convert_minutely(raw: &[PwMinutelyPoint]) -> Vec<Minutely> {
    raw.iter()
        .enumerate()
        .map(|(i, point)| {
            let minute_interval = if i + 1 < raw.len() {
                (raw[i + 1].time - point.time) / 60
            } else if i > 0 {
                (point.time - raw[i - 1].time) / 60
            } else {
                1
            };
            Minutely {
                date: DateTime::from_timestamp(point.time, 0).unwrap_or_default(),
                minute_interval,
                precipitation_intensity: point
                    .precip_intensity
                    .and_then(|v| PrecipitationIntensity::millimeters_per_hour(v).ok()),
            }
        })
        .collect()
}

fn convert_alert(raw: &PwAlert) -> Alert {
    let severity = match raw.severity.as_deref() {
        Some("Minor") => AlertSeverity::Minor,
        Some("Moderate") => AlertSeverity::Moderate,
        Some("Severe") => AlertSeverity::Severe,
        Some("Extreme") => AlertSeverity::Extreme,
        _ => AlertSeverity::Unknown,
    };
    let time = raw.time.map(|t| t.to_string()).unwrap_or_default();
    Alert {
        alert_id: synthesized_alert_id(&[
            raw.title.as_deref().unwrap_or_default(),
            raw.severity.as_deref().unwrap_or_default(),
            &time,
        ]),
        start_date: raw.time.and_then(|t| DateTime::from_timestamp(t, 0)),
        end_date: raw.expires.and_then(|t| DateTime::from_timestamp(t, 0)),
        headline: raw.title.clone(),
        description: raw.description.clone(),
        instruction: None,
        source: None,
        severity,
        color: severity.color(),
    }
}

/// Dark Sky icon vocabulary.
fn weather_code(icon: &str) -> Option<WeatherCode> {
    match icon {
        "clear-day" | "clear-night" => Some(WeatherCode::Clear),
        "partly-cloudy-day" | "partly-cloudy-night" => Some(WeatherCode::PartlyCloudy),
        "cloudy" => Some(WeatherCode::Cloudy),
        "fog" => Some(WeatherCode::Fog),
        "wind" => Some(WeatherCode::Wind),
        "rain" => Some(WeatherCode::Rain),
        "sleet" => Some(WeatherCode::Sleet),
        "snow" => Some(WeatherCode::Snow),
        "hail" => Some(WeatherCode::Hail),
        "thunderstorm" => Some(WeatherCode::Thunderstorm),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PwForecastResult {
    pub(crate) currently: Option<PwDataPoint>,
    pub(crate) minutely: Option<PwMinutelyBlock>,
    pub(crate) hourly: Option<PwDataBlock>,
    pub(crate) daily: Option<PwDataBlock>,
    pub(crate) alerts: Option<Vec<PwAlert>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PwDataBlock {
    #[serde(default)]
    pub(crate) data: Vec<PwDataPoint>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PwMinutelyBlock {
    #[serde(default)]
    pub(crate) data: Vec<PwMinutelyPoint>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PwMinutelyPoint {
    pub(crate) time: i64,
    #[serde(rename = "precipIntensity")]
    pub(crate) precip_intensity: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PwDataPoint {
    #[serde(default)]
    pub(crate) time: i64,
    pub(crate) summary: Option<String>,
    pub(crate) icon: Option<String>,
    pub(crate) temperature: Option<f64>,
    #[serde(rename = "apparentTemperature")]
    pub(crate) apparent_temperature: Option<f64>,
    #[serde(rename = "temperatureHigh")]
    pub(crate) temperature_high: Option<f64>,
    #[serde(rename = "temperatureLow")]
    pub(crate) temperature_low: Option<f64>,
    #[serde(rename = "apparentTemperatureHigh")]
    pub(crate) apparent_temperature_high: Option<f64>,
    #[serde(rename = "apparentTemperatureLow")]
    pub(crate) apparent_temperature_low: Option<f64>,
    #[serde(rename = "dewPoint")]
    pub(crate) dew_point: Option<f64>,
    pub(crate) humidity: Option<f64>,
    pub(crate) pressure: Option<f64>,
    #[serde(rename = "windSpeed")]
    pub(crate) wind_speed: Option<f64>,
    #[serde(rename = "windGust")]
    pub(crate) wind_gust: Option<f64>,
    #[serde(rename = "windBearing")]
    pub(crate) wind_bearing: Option<f64>,
    #[serde(rename = "cloudCover")]
    pub(crate) cloud_cover: Option<f64>,
    #[serde(rename = "uvIndex")]
    pub(crate) uv_index: Option<f64>,
    pub(crate) visibility: Option<f64>,
    #[serde(rename = "precipIntensity")]
    pub(crate) precip_intensity: Option<f64>,
    #[serde(rename = "precipProbability")]
    pub(crate) precip_probability: Option<f64>,
    #[serde(rename = "sunriseTime")]
    pub(crate) sunrise_time: Option<i64>,
    #[serde(rename = "sunsetTime")]
    pub(crate) sunset_time: Option<i64>,
    #[serde(rename = "moonPhase")]
    pub(crate) moon_phase: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PwAlert {
    pub(crate) title: Option<String>,
    pub(crate) severity: Option<String>,
    pub(crate) time: Option<i64>,
    pub(crate) expires: Option<i64>,
    pub(crate) description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forecast(json: &str) -> PwForecastResult {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn both_series_empty_is_rejected() {
        let result = forecast(r#"{"daily": {"data": []}, "hourly": {"data": []}}"#);
        let err = convert(Some(result), &[SourceFeature::Forecast]).unwrap_err();
        assert_eq!(err, SourceError::InvalidOrIncompleteData);
    }

    #[test]
    fn daily_only_payload_is_accepted() {
        let result = forecast(
            r#"{"daily": {"data": [{"time": 1700000000, "icon": "snow",
                 "temperatureHigh": -1.0, "temperatureLow": -6.0}]}}"#,
        );
        let wrapper = convert(Some(result), &[SourceFeature::Forecast]).unwrap();
        let days = wrapper.daily_forecast.unwrap();
        assert_eq!(days[0].day.as_ref().unwrap().weather_code, Some(WeatherCode::Snow));
        assert!(wrapper.hourly_forecast.is_none());
    }

    #[test]
    fn minutely_intervals_follow_timestamp_deltas() {
        let points: Vec<PwMinutelyPoint> = serde_json::from_str(
            r#"[{"time": 0, "precipIntensity": 0.5},
                {"time": 60, "precipIntensity": 0.8},
                {"time": 180, "precipIntensity": 0.0}]"#,
        )
        .unwrap();
        let minutely = convert_minutely(&points);
        assert_eq!(minutely[0].minute_interval, 1);
        assert_eq!(minutely[1].minute_interval, 2);
        assert_eq!(minutely[2].minute_interval, 2);
    }

    #[test]
    fn alert_ids_hash_title_severity_and_time() {
        let a: PwAlert = serde_json::from_str(
            r#"{"title": "Flood Warning", "severity": "Severe", "time": 1700000000}"#,
        )
        .unwrap();
        let b: PwAlert = serde_json::from_str(
            r#"{"title": "Flood Warning", "severity": "Severe", "time": 1700000000,
                "description": "updated wording"}"#,
        )
        .unwrap();
        // A reworded description must not change the identity.
        assert_eq!(convert_alert(&a).alert_id, convert_alert(&b).alert_id);
        assert_eq!(convert_alert(&a).severity, AlertSeverity::Severe);
    }

    #[test]
    fn humidity_and_cloud_cover_are_fractions() {
        let result = forecast(
            r#"{"hourly": {"data": [{"time": 1700000000, "humidity": 0.82, "cloudCover": 0.4}]}}"#,
        );
        let wrapper = convert(Some(result), &[SourceFeature::Forecast]).unwrap();
        let hourly = wrapper.hourly_forecast.unwrap();
        let humidity = hourly[0].relative_humidity.unwrap();
        assert!((humidity.value() - 0.82).abs() < 1e-9);
    }
}
