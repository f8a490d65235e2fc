//! Weatherbit. Key required; daily forecast, current conditions and
//! alerts.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

use super::{
    SourceFeature, SourceId, WeatherSource, ensure_supported, get_json, is_requested,
    local_date_to_utc, settle,
};
use crate::config::Config;
use crate::error::SourceError;
use crate::location::Location;
use crate::mapper;
use crate::model::weather::{Astro, Current, Daily, HalfDay, UV};
use crate::model::{Alert, AlertSeverity, WeatherCode, WeatherWrapper, synthesized_alert_id};
use crate::units::{Distance, Precipitation, Pressure, Ratio, Speed, Temperature};

const DEFAULT_BASE_URL: &str = "https://api.weatherbit.io/v2.0";
const DEFAULT_API_KEY: Option<&str> = None;

#[derive(Debug, Clone)]
pub struct WeatherbitService {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherbitService {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url,
            http: Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let api_key = config.effective_api_key(SourceId::Weatherbit, DEFAULT_API_KEY)?;
        let base_url = config.effective_instance(SourceId::Weatherbit, DEFAULT_BASE_URL);
        Ok(Self::new(api_key, base_url))
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        location: &Location,
    ) -> Result<T, SourceError> {
        let url = format!("{}/{endpoint}", self.base_url);
        get_json(
            &self.http,
            &url,
            &[
                ("lat", location.latitude.to_string()),
                ("lon", location.longitude.to_string()),
                ("key", self.api_key.clone()),
            ],
        )
        .await
    }
}

#[async_trait]
impl WeatherSource for WeatherbitService {
    fn id(&self) -> SourceId {
        SourceId::Weatherbit
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

        let daily = async {
            if is_requested(features, SourceFeature::Forecast) {
                Some(self.get::<WbDailyResult>("forecast/daily", location).await)
            } else {
                None
            }
        };
        let current = async {
            if is_requested(features, SourceFeature::Current) {
                Some(self.get::<WbCurrentResult>("current", location).await)
            } else {
                None
            }
        };
        let alerts = async {
            if is_requested(features, SourceFeature::Alert) {
                Some(self.get::<WbAlertResult>("alerts", location).await)
            } else {
                None
            }
        };
        let (daily, current, alerts) = tokio::join!(daily, current, alerts);

        let mut failed = HashMap::new();
        let daily = settle(daily, SourceFeature::Forecast, &mut failed);
        let current = settle(current, SourceFeature::Current, &mut failed);
        let alerts = settle(alerts, SourceFeature::Alert, &mut failed);

        let mut wrapper = convert(daily, current, alerts, location.timezone)?;
        wrapper.failed_features = failed;
        Ok(wrapper)
    }
}

pub(crate) fn convert(
    daily: Option<WbDailyResult>,
    current: Option<WbCurrentResult>,
    alerts: Option<WbAlertResult>,
    timezone: chrono::FixedOffset,
) -> Result<WeatherWrapper, SourceError> {
    // Daily-only forecast; an empty series is a garbage payload.
    if let Some(result) = &daily
        && result.data.is_empty()
    {
        return Err(SourceError::InvalidOrIncompleteData);
    }

    Ok(WeatherWrapper {
        daily_forecast: daily
            .map(|r| r.data.iter().map(|d| convert_daily(d, timezone)).collect()),
        current: current.and_then(|r| r.data.into_iter().next().map(|c| convert_current(&c))),
        alert_list: alerts.map(|r| {
            Alert::deduplicate(r.alerts.iter().map(convert_alert).collect())
        }),
        ..Default::default()
    })
}

fn convert_daily(raw: &WbDaily, timezone: chrono::FixedOffset) -> Daily {
    Daily {
        date: raw
            .valid_date
            .as_deref()
            .and_then(|d| local_date_to_utc(d, timezone))
            .unwrap_or_default(),
        day: Some(HalfDay {
            weather_text: raw.weather.as_ref().and_then(|w| w.description.clone()),
            weather_code: raw.weather.as_ref().and_then(|w| w.code).and_then(weather_code),
            temperature: mapper::temperature(
                raw.max_temp.and_then(|v| Temperature::celsius(v).ok()),
                raw.app_max_temp.and_then(|v| Temperature::celsius(v).ok()),
                None,
                None,
                None,
            ),
            precipitation: mapper::precipitation(
                raw.precip
                    .map(|p| p + raw.snow.unwrap_or(0.0))
                    .or(raw.snow)
                    .and_then(|v| Precipitation::millimeters(v).ok()),
                None,
                raw.precip.and_then(|v| Precipitation::millimeters(v).ok()),
                raw.snow.and_then(|v| Precipitation::millimeters(v).ok()),
                None,
            ),
            precipitation_probability: mapper::precipitation_probability(
                raw.pop.and_then(|v| Ratio::percent(v).ok()),
                None,
                None,
                None,
                None,
            ),
            wind: mapper::wind(
                raw.wind_dir,
                raw.wind_spd.and_then(|v| Speed::meters_per_second(v).ok()),
                raw.wind_gust_spd.and_then(|v| Speed::meters_per_second(v).ok()),
            ),
            cloud_cover: raw.clouds.and_then(|v| Ratio::percent(v).ok()),
            ..Default::default()
        }),
        night: Some(HalfDay {
            temperature: mapper::temperature(
                raw.min_temp.and_then(|v| Temperature::celsius(v).ok()),
                raw.app_min_temp.and_then(|v| Temperature::celsius(v).ok()),
                None,
                None,
                None,
            ),
            ..Default::default()
        }),
        sun: Some(Astro {
            rise_date: raw.sunrise_ts.and_then(|t| DateTime::from_timestamp(t, 0)),
            set_date: raw.sunset_ts.and_then(|t| DateTime::from_timestamp(t, 0)),
        }),
        moon: Some(Astro {
            rise_date: raw.moonrise_ts.and_then(|t| DateTime::from_timestamp(t, 0)),
            set_date: raw.moonset_ts.and_then(|t| DateTime::from_timestamp(t, 0)),
        }),
        uv: raw.uv.map(|index| UV { index: Some(index) }),
        ..Default::default()
    }
}

fn convert_current(raw: &WbCurrent) -> Current {
    Current {
        weather_text: raw.weather.as_ref().and_then(|w| w.description.clone()),
        weather_code: raw.weather.as_ref().and_then(|w| w.code).and_then(weather_code),
        temperature: mapper::temperature(
            raw.temp.and_then(|v| Temperature::celsius(v).ok()),
            raw.app_temp.and_then(|v| Temperature::celsius(v).ok()),
            None,
            None,
            None,
        ),
        wind: mapper::wind(
            raw.wind_dir,
            raw.wind_spd.and_then(|v| Speed::meters_per_second(v).ok()),
            raw.gust.and_then(|v| Speed::meters_per_second(v).ok()),
        ),
        uv: raw.uv.map(|index| UV { index: Some(index) }),
        relative_humidity: raw.rh.and_then(|v| Ratio::percent(v).ok()),
        dew_point: raw.dewpt.and_then(|v| Temperature::celsius(v).ok()),
        pressure: raw.pres.and_then(|v| Pressure::hectopascals(v).ok()),
        cloud_cover: raw.clouds.and_then(|v| Ratio::percent(v).ok()),
        visibility: raw
            .vis
            .and_then(|v| Distance::kilometers(v).ok())
            .and_then(Distance::validate_non_negative),
        ..Default::default()
    }
}

fn convert_alert(raw: &WbAlert) -> Alert {
    let severity = match raw.severity.as_deref() {
        Some("Advisory") => AlertSeverity::Minor,
        Some("Watch") => AlertSeverity::Moderate,
        Some("Warning") => AlertSeverity::Severe,
        _ => AlertSeverity::Unknown,
    };
    // Native uid when provided, synthesized otherwise.
    let alert_id = raw.uid.clone().unwrap_or_else(|| {
        synthesized_alert_id(&[
            raw.title.as_deref().unwrap_or_default(),
            raw.effective_utc.as_deref().unwrap_or_default(),
        ])
    });
    Alert {
        alert_id,
        start_date: raw.effective_utc.as_deref().and_then(naive_utc),
        end_date: raw.expires_utc.as_deref().and_then(naive_utc),
        headline: raw.title.clone(),
        description: raw.description.clone(),
        instruction: None,
        source: None,
        severity,
        color: severity.color(),
    }
}

/// Alert timestamps arrive as naive UTC ("2024-06-01T18:39:00").
fn naive_utc(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|n| n.and_utc())
}

fn weather_code(code: i64) -> Option<WeatherCode> {
    match code {
        200..=233 => Some(WeatherCode::Thunderstorm),
        300..=302 | 500..=522 | 900 => Some(WeatherCode::Rain),
        610..=612 => Some(WeatherCode::Sleet),
        600..=602 | 621..=623 => Some(WeatherCode::Snow),
        700..=751 => Some(WeatherCode::Fog),
        800 => Some(WeatherCode::Clear),
        801..=803 => Some(WeatherCode::PartlyCloudy),
        804 => Some(WeatherCode::Cloudy),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WbWeather {
    pub(crate) code: Option<i64>,
    pub(crate) description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WbDailyResult {
    #[serde(default)]
    pub(crate) data: Vec<WbDaily>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WbDaily {
    pub(crate) valid_date: Option<String>,
    pub(crate) max_temp: Option<f64>,
    pub(crate) min_temp: Option<f64>,
    pub(crate) app_max_temp: Option<f64>,
    pub(crate) app_min_temp: Option<f64>,
    pub(crate) pop: Option<f64>,
    pub(crate) precip: Option<f64>,
    pub(crate) snow: Option<f64>,
    pub(crate) wind_spd: Option<f64>,
    pub(crate) wind_gust_spd: Option<f64>,
    pub(crate) wind_dir: Option<f64>,
    pub(crate) clouds: Option<f64>,
    pub(crate) uv: Option<f64>,
    pub(crate) sunrise_ts: Option<i64>,
    pub(crate) sunset_ts: Option<i64>,
    pub(crate) moonrise_ts: Option<i64>,
    pub(crate) moonset_ts: Option<i64>,
    pub(crate) weather: Option<WbWeather>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WbCurrentResult {
    #[serde(default)]
    pub(crate) data: Vec<WbCurrent>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WbCurrent {
    pub(crate) temp: Option<f64>,
    pub(crate) app_temp: Option<f64>,
    pub(crate) rh: Option<f64>,
    pub(crate) dewpt: Option<f64>,
    pub(crate) pres: Option<f64>,
    pub(crate) clouds: Option<f64>,
    pub(crate) vis: Option<f64>,
    pub(crate) uv: Option<f64>,
    pub(crate) wind_spd: Option<f64>,
    pub(crate) wind_dir: Option<f64>,
    pub(crate) gust: Option<f64>,
    pub(crate) weather: Option<WbWeather>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WbAlertResult {
    #[serde(default)]
    pub(crate) alerts: Vec<WbAlert>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WbAlert {
    pub(crate) uid: Option<String>,
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) severity: Option<String>,
    pub(crate) effective_utc: Option<String>,
    pub(crate) expires_utc: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn tz() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn empty_daily_series_is_rejected() {
        let daily: WbDailyResult = serde_json::from_str(r#"{"data": []}"#).unwrap();
        let err = convert(Some(daily), None, None, tz()).unwrap_err();
        assert_eq!(err, SourceError::InvalidOrIncompleteData);
    }

    #[test]
    fn daily_highs_and_lows_split_across_halves() {
        let daily: WbDailyResult = serde_json::from_str(
            r#"{"data": [{"valid_date": "2024-06-01", "max_temp": 23.0, "min_temp": 12.0,
                 "weather": {"code": 801, "description": "Few clouds"}}]}"#,
        )
        .unwrap();
        let wrapper = convert(Some(daily), None, None, tz()).unwrap();
        let days = wrapper.daily_forecast.unwrap();
        let day = days[0].day.as_ref().unwrap();
        assert_eq!(day.weather_code, Some(WeatherCode::PartlyCloudy));
        let night = days[0].night.as_ref().unwrap();
        assert!(day.temperature.is_some());
        assert!(night.temperature.is_some());
    }

    #[test]
    fn alerts_without_uid_get_synthesized_stable_ids() {
        let alerts: WbAlertResult = serde_json::from_str(
            r#"{"alerts": [
                 {"title": "Flood Warning", "severity": "Warning",
                  "effective_utc": "2024-06-01T06:00:00", "expires_utc": "2024-06-01T18:00:00"},
                 {"title": "Flood Warning", "severity": "Warning",
                  "effective_utc": "2024-06-01T06:00:00", "expires_utc": "2024-06-01T18:00:00"}]}"#,
        )
        .unwrap();
        let wrapper = convert(None, None, Some(alerts), tz()).unwrap();
        let list = wrapper.alert_list.unwrap();
        // Identical repeated entries also collapse in deduplication.
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].severity, AlertSeverity::Severe);
        assert!(!list[0].alert_id.is_empty());
        assert!(list[0].start_date.is_some());
    }

    #[test]
    fn native_uid_wins_over_synthesis() {
        let raw: WbAlert = serde_json::from_str(
            r#"{"uid": "WB-77", "title": "Heat Advisory", "severity": "Advisory"}"#,
        )
        .unwrap();
        let alert = convert_alert(&raw);
        assert_eq!(alert.alert_id, "WB-77");
        assert_eq!(alert.severity, AlertSeverity::Minor);
    }
}
