//! Bangladesh Meteorological Department. Key-free, Bangladesh only;
//! daily forecast with free-text conditions.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

use super::{SourceFeature, SourceId, WeatherSource, ensure_supported, get_json, local_date_to_utc};
use crate::config::Config;
use crate::error::SourceError;
use crate::location::Location;
use crate::mapper;
use crate::model::weather::{Daily, HalfDay};
use crate::model::{WeatherCode, WeatherWrapper};
use crate::units::{Precipitation, Ratio, Speed, Temperature};

const DEFAULT_BASE_URL: &str = "https://bmd.bdservers.site/api";

#[derive(Debug, Clone)]
pub struct BmdService {
    base_url: String,
    http: Client,
}

impl BmdService {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            http: Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.effective_instance(SourceId::Bmd, DEFAULT_BASE_URL))
    }

    async fn fetch_forecast(&self, location: &Location) -> Result<BmdResult, SourceError> {
        let url = format!("{}/forecast", self.base_url);
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
impl WeatherSource for BmdService {
    fn id(&self) -> SourceId {
        SourceId::Bmd
    }

    fn supported_features(&self, location: &Location) -> Vec<SourceFeature> {
        if location.is_in_country("BD") {
            vec![SourceFeature::Forecast]
        } else {
            Vec::new()
        }
    }

    async fn fetch(
        &self,
        location: &Location,
        features: &[SourceFeature],
    ) -> Result<WeatherWrapper, SourceError> {
        ensure_supported(&self.supported_features(location), features)?;

        let forecast = match self.fetch_forecast(location).await {
            Ok(forecast) => forecast,
            Err(err) => {
                return Ok(WeatherWrapper {
                    failed_features: HashMap::from([(SourceFeature::Forecast, err)]),
                    ..Default::default()
                });
            }
        };

        convert(Some(forecast), location.timezone)
    }
}

pub(crate) fn convert(
    forecast: Option<BmdResult>,
    timezone: chrono::FixedOffset,
) -> Result<WeatherWrapper, SourceError> {
    let Some(forecast) = forecast else {
        return Ok(WeatherWrapper::default());
    };
    // Daily-only source; an empty series is a garbage payload.
    if forecast.forecast.is_empty() {
        return Err(SourceError::InvalidOrIncompleteData);
    }

    Ok(WeatherWrapper {
        daily_forecast: Some(
            forecast
                .forecast
                .iter()
                .map(|d| convert_daily(d, timezone))
                .collect(),
        ),
        ..Default::default()
    })
}

fn convert_daily(raw: &BmdDaily, timezone: chrono::FixedOffset) -> Daily {
    let code = raw.weather_condition.as_deref().and_then(weather_code);
    Daily {
        date: raw
            .forecast_date
            .as_deref()
            .and_then(|d| local_date_to_utc(d, timezone))
            .unwrap_or_default(),
        day: Some(HalfDay {
            weather_text: raw.weather_condition.clone(),
            weather_code: code,
            temperature: mapper::temperature(
                raw.temp_max.and_then(|v| Temperature::celsius(v).ok()),
                None,
                None,
                None,
                None,
            ),
            precipitation: mapper::precipitation(
                raw.rainfall.and_then(|v| Precipitation::millimeters(v).ok()),
                None,
                None,
                None,
                None,
            ),
            wind: mapper::wind(
                raw.wind_direction,
                raw.wind_speed.and_then(|v| Speed::kilometers_per_hour(v).ok()),
                None,
            ),
            ..Default::default()
        }),
        night: Some(HalfDay {
            weather_text: raw.weather_condition.clone(),
            weather_code: code,
            temperature: mapper::temperature(
                raw.temp_min.and_then(|v| Temperature::celsius(v).ok()),
                None,
                None,
                None,
                None,
            ),
            ..Default::default()
        }),
        relative_humidity: raw.humidity.and_then(|v| Ratio::percent(v).ok()).map(|avg| {
            crate::model::weather::DailyStat {
                average: Some(avg),
                min: None,
                max: None,
            }
        }),
        ..Default::default()
    }
}

/// Free-text conditions, matched by keyword.
fn weather_code(condition: &str) -> Option<WeatherCode> {
    let lower = condition.to_lowercase();
    if lower.contains("thunder") {
        Some(WeatherCode::Thunderstorm)
    } else if lower.contains("hail") {
        Some(WeatherCode::Hail)
    } else if lower.contains("rain") || lower.contains("drizzle") || lower.contains("shower") {
        Some(WeatherCode::Rain)
    } else if lower.contains("fog") || lower.contains("mist") {
        Some(WeatherCode::Fog)
    } else if lower.contains("haze") {
        Some(WeatherCode::Haze)
    } else if lower.contains("partly") {
        Some(WeatherCode::PartlyCloudy)
    } else if lower.contains("cloud") || lower.contains("overcast") {
        Some(WeatherCode::Cloudy)
    } else if lower.contains("clear") || lower.contains("sunny") || lower.contains("fair") {
        Some(WeatherCode::Clear)
    } else {
        None
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct BmdResult {
    #[serde(default)]
    pub(crate) forecast: Vec<BmdDaily>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BmdDaily {
    pub(crate) forecast_date: Option<String>,
    pub(crate) weather_condition: Option<String>,
    pub(crate) temp_max: Option<f64>,
    pub(crate) temp_min: Option<f64>,
    pub(crate) rainfall: Option<f64>,
    pub(crate) wind_speed: Option<f64>,
    pub(crate) wind_direction: Option<f64>,
    pub(crate) humidity: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn tz() -> FixedOffset {
        FixedOffset::east_opt(6 * 3600).unwrap()
    }

    #[test]
    fn empty_forecast_is_rejected() {
        let result: BmdResult = serde_json::from_str(r#"{"forecast": []}"#).unwrap();
        let err = convert(Some(result), tz()).unwrap_err();
        assert_eq!(err, SourceError::InvalidOrIncompleteData);
    }

    #[test]
    fn free_text_conditions_map_by_keyword() {
        assert_eq!(weather_code("Light Rain with Thunder"), Some(WeatherCode::Thunderstorm));
        assert_eq!(weather_code("Moderate Rain"), Some(WeatherCode::Rain));
        assert_eq!(weather_code("Partly Cloudy Sky"), Some(WeatherCode::PartlyCloudy));
        assert_eq!(weather_code("Mainly Clear"), Some(WeatherCode::Clear));
        assert_eq!(weather_code("Unspecified"), None);
    }

    #[test]
    fn daily_records_split_temperatures_across_halves() {
        let result: BmdResult = serde_json::from_str(
            r#"{"forecast": [{"forecast_date": "2024-06-01",
                 "weather_condition": "Light Rain", "temp_max": 33.0, "temp_min": 26.0,
                 "rainfall": 8.5, "humidity": 85.0}]}"#,
        )
        .unwrap();
        let wrapper = convert(Some(result), tz()).unwrap();
        let days = wrapper.daily_forecast.unwrap();
        let day = days[0].day.as_ref().unwrap();
        assert_eq!(day.weather_code, Some(WeatherCode::Rain));
        assert!(day.precipitation.is_some());
        assert!(days[0].night.as_ref().unwrap().temperature.is_some());
        assert!(days[0].relative_humidity.is_some());
    }
}
