//! Bright Sky (DWD open data). Key-free; hourly forecast, current
//! conditions and native-id alerts.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

use super::{
    SourceFeature, SourceId, WeatherSource, ensure_supported, get_json, is_requested,
    rfc3339_to_utc, settle,
};
use crate::config::Config;
use crate::error::SourceError;
use crate::location::Location;
use crate::mapper;
use crate::model::weather::Current;
use crate::model::{Alert, AlertSeverity, HourlyWrapper, WeatherCode, WeatherWrapper};
use crate::units::{Distance, Precipitation, Pressure, Ratio, Speed, Temperature};

const DEFAULT_BASE_URL: &str = "https://api.brightsky.dev";

#[derive(Debug, Clone)]
pub struct BrightSkyService {
    base_url: String,
    http: Client,
}

impl BrightSkyService {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            http: Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.effective_instance(SourceId::BrightSky, DEFAULT_BASE_URL))
    }

    async fn fetch_weather(&self, location: &Location) -> Result<BsWeatherResult, SourceError> {
        let now = Utc::now();
        let url = format!("{}/weather", self.base_url);
        get_json(
            &self.http,
            &url,
            &[
                ("lat", location.latitude.to_string()),
                ("lon", location.longitude.to_string()),
                ("date", now.format("%Y-%m-%d").to_string()),
                ("last_date", (now + Duration::days(10)).format("%Y-%m-%d").to_string()),
                ("tz", "Etc/UTC".to_string()),
            ],
        )
        .await
    }

    async fn fetch_current(&self, location: &Location) -> Result<BsCurrentResult, SourceError> {
        let url = format!("{}/current_weather", self.base_url);
        get_json(
            &self.http,
            &url,
            &[
                ("lat", location.latitude.to_string()),
                ("lon", location.longitude.to_string()),
            ],
        )
        .await
    }

    async fn fetch_alerts(&self, location: &Location) -> Result<BsAlertsResult, SourceError> {
        let url = format!("{}/alerts", self.base_url);
        get_json(
            &self.http,
            &url,
            &[
                ("lat", location.latitude.to_string()),
                ("lon", location.longitude.to_string()),
            ],
        )
        .await
    }
}

#[async_trait]
impl WeatherSource for BrightSkyService {
    fn id(&self) -> SourceId {
        SourceId::BrightSky
    }

    fn supported_features(&self, _location: &Location) -> Vec<SourceFeature> {
        vec![
            SourceFeature::Forecast,
            SourceFeature::Current,
            SourceFeature::Alert,
        ]
    }

    async fn fetch(
        &self,
        location: &Location,
        features: &[SourceFeature],
    ) -> Result<WeatherWrapper, SourceError> {
        ensure_supported(&self.supported_features(location), features)?;

        let weather = async {
            if is_requested(features, SourceFeature::Forecast) {
                Some(self.fetch_weather(location).await)
            } else {
                None
            }
        };
        let current = async {
            if is_requested(features, SourceFeature::Current) {
                Some(self.fetch_current(location).await)
            } else {
                None
            }
        };
        let alerts = async {
            if is_requested(features, SourceFeature::Alert) {
                Some(self.fetch_alerts(location).await)
            } else {
                None
            }
        };
        let (weather, current, alerts) = tokio::join!(weather, current, alerts);

        let mut failed = HashMap::new();
        let weather = settle(weather, SourceFeature::Forecast, &mut failed);
        let current = settle(current, SourceFeature::Current, &mut failed);
        let alerts = settle(alerts, SourceFeature::Alert, &mut failed);

        let mut wrapper = convert(weather, current, alerts)?;
        wrapper.failed_features = failed;
        Ok(wrapper)
    }
}

pub(crate) fn convert(
    weather: Option<BsWeatherResult>,
    current: Option<BsCurrentResult>,
    alerts: Option<BsAlertsResult>,
) -> Result<WeatherWrapper, SourceError> {
    // Hourly-only source; an empty hourly series is a garbage payload.
    if let Some(result) = &weather
        && result.weather.is_empty()
    {
        return Err(SourceError::InvalidOrIncompleteData);
    }

    Ok(WeatherWrapper {
        hourly_forecast: weather.map(|r| r.weather.iter().map(convert_hourly).collect()),
        current: current.map(|r| convert_current(&r.weather)),
        alert_list: alerts.map(|r| {
            Alert::deduplicate(r.alerts.iter().map(convert_alert).collect())
        }),
        ..Default::default()
    })
}

fn convert_hourly(raw: &BsHourly) -> HourlyWrapper {
    HourlyWrapper {
        date: raw.timestamp.as_deref().and_then(rfc3339_to_utc).unwrap_or_default(),
        weather_code: weather_code(raw.condition.as_deref(), raw.icon.as_deref()),
        temperature: mapper::temperature(
            raw.temperature.and_then(|v| Temperature::celsius(v).ok()),
            None,
            None,
            None,
            None,
        ),
        precipitation: mapper::precipitation(
            raw.precipitation.and_then(|v| Precipitation::millimeters(v).ok()),
            None,
            None,
            None,
            None,
        ),
        precipitation_probability: mapper::precipitation_probability(
            raw.precipitation_probability.and_then(|v| Ratio::percent(v).ok()),
            None,
            None,
            None,
            None,
        ),
        wind: mapper::wind(
            raw.wind_direction,
            raw.wind_speed.and_then(|v| Speed::kilometers_per_hour(v).ok()),
            raw.wind_gust_speed.and_then(|v| Speed::kilometers_per_hour(v).ok()),
        ),
        relative_humidity: raw.relative_humidity.and_then(|v| Ratio::percent(v).ok()),
        dew_point: raw.dew_point.and_then(|v| Temperature::celsius(v).ok()),
        pressure: raw.pressure_msl.and_then(|v| Pressure::hectopascals(v).ok()),
        cloud_cover: raw.cloud_cover.and_then(|v| Ratio::percent(v).ok()),
        visibility: raw
            .visibility
            .and_then(|v| Distance::meters(v).ok())
            .and_then(Distance::validate_non_negative),
        ..Default::default()
    }
}

fn convert_current(raw: &BsHourly) -> Current {
    let hourly = convert_hourly(raw);
    Current {
        weather_code: hourly.weather_code,
        temperature: hourly.temperature,
        wind: hourly.wind,
        relative_humidity: hourly.relative_humidity,
        dew_point: hourly.dew_point,
        pressure: hourly.pressure,
        cloud_cover: hourly.cloud_cover,
        visibility: hourly.visibility,
        ..Default::default()
    }
}

fn convert_alert(raw: &BsAlert) -> Alert {
    let severity = match raw.severity.as_deref() {
        Some("minor") => AlertSeverity::Minor,
        Some("moderate") => AlertSeverity::Moderate,
        Some("severe") => AlertSeverity::Severe,
        Some("extreme") => AlertSeverity::Extreme,
        _ => AlertSeverity::Unknown,
    };
    Alert {
        alert_id: raw.id.to_string(),
        start_date: raw.onset.as_deref().and_then(rfc3339_to_utc),
        end_date: raw.expires.as_deref().and_then(rfc3339_to_utc),
        headline: raw.headline_en.clone(),
        description: raw.description_en.clone(),
        instruction: raw.instruction_en.clone(),
        source: Some("DWD".to_string()),
        severity,
        color: severity.color(),
    }
}

/// The condition vocabulary covers precipitation states only; "dry" hours
/// take their code from the icon instead.
fn weather_code(condition: Option<&str>, icon: Option<&str>) -> Option<WeatherCode> {
    match condition {
        Some("fog") => return Some(WeatherCode::Fog),
        Some("rain") => return Some(WeatherCode::Rain),
        Some("sleet") => return Some(WeatherCode::Sleet),
        Some("snow") => return Some(WeatherCode::Snow),
        Some("hail") => return Some(WeatherCode::Hail),
        Some("thunderstorm") => return Some(WeatherCode::Thunderstorm),
        _ => {}
    }
    match icon {
        Some("clear-day" | "clear-night") => Some(WeatherCode::Clear),
        Some("partly-cloudy-day" | "partly-cloudy-night") => Some(WeatherCode::PartlyCloudy),
        Some("cloudy") => Some(WeatherCode::Cloudy),
        Some("fog") => Some(WeatherCode::Fog),
        Some("wind") => Some(WeatherCode::Wind),
        Some("rain") => Some(WeatherCode::Rain),
        Some("sleet") => Some(WeatherCode::Sleet),
        Some("snow") => Some(WeatherCode::Snow),
        Some("hail") => Some(WeatherCode::Hail),
        Some("thunderstorm") => Some(WeatherCode::Thunderstorm),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct BsWeatherResult {
    #[serde(default)]
    pub(crate) weather: Vec<BsHourly>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BsCurrentResult {
    pub(crate) weather: BsHourly,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BsAlertsResult {
    #[serde(default)]
    pub(crate) alerts: Vec<BsAlert>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct BsHourly {
    pub(crate) timestamp: Option<String>,
    pub(crate) condition: Option<String>,
    pub(crate) icon: Option<String>,
    pub(crate) temperature: Option<f64>,
    pub(crate) dew_point: Option<f64>,
    pub(crate) precipitation: Option<f64>,
    pub(crate) precipitation_probability: Option<f64>,
    pub(crate) pressure_msl: Option<f64>,
    pub(crate) relative_humidity: Option<f64>,
    pub(crate) cloud_cover: Option<f64>,
    pub(crate) visibility: Option<f64>,
    pub(crate) wind_direction: Option<f64>,
    pub(crate) wind_speed: Option<f64>,
    pub(crate) wind_gust_speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BsAlert {
    pub(crate) id: i64,
    pub(crate) severity: Option<String>,
    pub(crate) headline_en: Option<String>,
    pub(crate) description_en: Option<String>,
    pub(crate) instruction_en: Option<String>,
    pub(crate) onset: Option<String>,
    pub(crate) expires: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::SpeedUnit;

    #[test]
    fn empty_hourly_series_is_rejected() {
        let result: BsWeatherResult = serde_json::from_str(r#"{"weather": []}"#).unwrap();
        let err = convert(Some(result), None, None).unwrap_err();
        assert_eq!(err, SourceError::InvalidOrIncompleteData);
    }

    #[test]
    fn wind_speed_is_taken_as_kilometers_per_hour() {
        let result: BsWeatherResult = serde_json::from_str(
            r#"{"weather": [{"timestamp": "2024-06-01T12:00:00+00:00", "wind_speed": 36.0}]}"#,
        )
        .unwrap();
        let wrapper = convert(Some(result), None, None).unwrap();
        let hourly = wrapper.hourly_forecast.unwrap();
        let speed = hourly[0].wind.as_ref().unwrap().speed.unwrap();
        assert!((speed.to_unit(SpeedUnit::MeterPerSecond) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn dry_condition_falls_back_to_icon() {
        assert_eq!(
            weather_code(Some("dry"), Some("partly-cloudy-day")),
            Some(WeatherCode::PartlyCloudy)
        );
        assert_eq!(weather_code(Some("rain"), Some("clear-day")), Some(WeatherCode::Rain));
        assert_eq!(weather_code(Some("dry"), None), None);
    }

    #[test]
    fn alerts_carry_native_ids_and_severity() {
        let result: BsAlertsResult = serde_json::from_str(
            r#"{"alerts": [{"id": 2104, "severity": "severe",
                 "headline_en": "Official severe wind warning",
                 "onset": "2024-06-01T10:00:00+00:00",
                 "expires": "2024-06-01T20:00:00+00:00"}]}"#,
        )
        .unwrap();
        let wrapper = convert(None, None, Some(result)).unwrap();
        let alerts = wrapper.alert_list.unwrap();
        assert_eq!(alerts[0].alert_id, "2104");
        assert_eq!(alerts[0].severity, AlertSeverity::Severe);
        assert_eq!(alerts[0].color, AlertSeverity::Severe.color());
    }

    #[test]
    fn absent_forecast_leaves_wrapper_field_null() {
        let wrapper = convert(None, None, None).unwrap();
        assert!(wrapper.hourly_forecast.is_none());
        assert!(wrapper.current.is_none());
        assert!(wrapper.alert_list.is_none());
    }
}
