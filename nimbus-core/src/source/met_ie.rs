//! Met Éireann. Key-free, Ireland only; hourly forecast and national
//! warnings with native ids.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
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
use crate::model::{Alert, AlertSeverity, HourlyWrapper, WeatherCode, WeatherWrapper};
use crate::units::{Precipitation, Pressure, Ratio, Speed, Temperature};

const DEFAULT_BASE_URL: &str = "https://prodapi.metweb.ie/v2";

#[derive(Debug, Clone)]
pub struct MetIeService {
    base_url: String,
    http: Client,
}

impl MetIeService {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            http: Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.effective_instance(SourceId::MetIe, DEFAULT_BASE_URL))
    }

    async fn fetch_hourly(&self, location: &Location) -> Result<Vec<MetIeHourly>, SourceError> {
        let url = format!(
            "{}/forecast/hourly/{}/{}",
            self.base_url, location.latitude, location.longitude
        );
        get_json(&self.http, &url, &[]).await
    }

    async fn fetch_warnings(&self, location: &Location) -> Result<Vec<MetIeWarning>, SourceError> {
        let url = format!("{}/warnings", self.base_url);
        get_json(
            &self.http,
            &url,
            &[(
                "region",
                location.admin_code.clone().unwrap_or_else(|| "IE".to_string()),
            )],
        )
        .await
    }
}

#[async_trait]
impl WeatherSource for MetIeService {
    fn id(&self) -> SourceId {
        SourceId::MetIe
    }

    fn supported_features(&self, location: &Location) -> Vec<SourceFeature> {
        if location.is_in_country("IE") {
            vec![SourceFeature::Forecast, SourceFeature::Alert]
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

        let hourly = async {
            if is_requested(features, SourceFeature::Forecast) {
                Some(self.fetch_hourly(location).await)
            } else {
                None
            }
        };
        let warnings = async {
            if is_requested(features, SourceFeature::Alert) {
                Some(self.fetch_warnings(location).await)
            } else {
                None
            }
        };
        let (hourly, warnings) = tokio::join!(hourly, warnings);

        let mut failed = HashMap::new();
        let hourly = settle(hourly, SourceFeature::Forecast, &mut failed);
        let warnings = settle(warnings, SourceFeature::Alert, &mut failed);

        let mut wrapper = convert(hourly, warnings, location.timezone)?;
        wrapper.failed_features = failed;
        Ok(wrapper)
    }
}

pub(crate) fn convert(
    hourly: Option<Vec<MetIeHourly>>,
    warnings: Option<Vec<MetIeWarning>>,
    timezone: FixedOffset,
) -> Result<WeatherWrapper, SourceError> {
    // Hourly-only source; an empty series is a garbage payload.
    if let Some(records) = &hourly
        && records.is_empty()
    {
        return Err(SourceError::InvalidOrIncompleteData);
    }

    Ok(WeatherWrapper {
        hourly_forecast: hourly
            .map(|records| records.iter().map(|r| convert_hourly(r, timezone)).collect()),
        alert_list: warnings
            .map(|w| Alert::deduplicate(w.iter().map(convert_warning).collect())),
        ..Default::default()
    })
}

fn convert_hourly(raw: &MetIeHourly, timezone: FixedOffset) -> HourlyWrapper {
    HourlyWrapper {
        date: record_date(raw, timezone).unwrap_or_default(),
        weather_text: raw.weather_description.clone(),
        weather_code: raw.symbol.as_deref().and_then(weather_code),
        temperature: mapper::temperature(
            raw.temperature
                .as_deref()
                .and_then(|v| v.parse().ok())
                .and_then(|v| Temperature::celsius(v).ok()),
            None,
            None,
            None,
            None,
        ),
        precipitation: mapper::precipitation(
            raw.rainfall
                .as_deref()
                .and_then(|v| v.parse().ok())
                .and_then(|v| Precipitation::millimeters(v).ok()),
            None,
            None,
            None,
            None,
        ),
        wind: mapper::wind(
            raw.wind_direction_degrees(),
            raw.wind_speed
                .as_deref()
                .and_then(|v| v.parse().ok())
                .and_then(|v| Speed::kilometers_per_hour(v).ok()),
            raw.wind_gust
                .as_deref()
                .and_then(|v| v.parse().ok())
                .and_then(|v| Speed::kilometers_per_hour(v).ok()),
        ),
        relative_humidity: raw
            .humidity
            .as_deref()
            .and_then(|v| v.parse().ok())
            .and_then(|v| Ratio::percent(v).ok()),
        pressure: raw
            .pressure
            .as_deref()
            .and_then(|v| v.parse().ok())
            .and_then(|v| Pressure::hectopascals(v).ok()),
        ..Default::default()
    }
}

/// Records carry a local calendar date and an "HH:MM" clock time.
fn record_date(raw: &MetIeHourly, timezone: FixedOffset) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(raw.date.as_deref()?, "%Y-%m-%d").ok()?;
    let (hour, minute) = raw
        .time
        .as_deref()?
        .split_once(':')
        .and_then(|(h, m)| Some((h.parse().ok()?, m.parse().ok()?)))?;
    let naive = date.and_hms_opt(hour, minute, 0)?;
    timezone
        .from_local_datetime(&naive)
        .single()
        .map(|d| d.with_timezone(&Utc))
}

fn convert_warning(raw: &MetIeWarning) -> Alert {
    let severity = match raw.level.as_deref() {
        Some("Yellow") => AlertSeverity::Moderate,
        Some("Orange") => AlertSeverity::Severe,
        Some("Red") => AlertSeverity::Extreme,
        _ => AlertSeverity::Unknown,
    };
    Alert {
        alert_id: raw.id.clone().unwrap_or_default(),
        start_date: raw.onset.as_deref().and_then(rfc3339_to_utc),
        end_date: raw.expiry.as_deref().and_then(rfc3339_to_utc),
        headline: raw.headline.clone(),
        description: raw.description.clone(),
        instruction: None,
        source: Some("Met Éireann".to_string()),
        severity,
        color: severity.color(),
    }
}

/// met.no style symbol codes ("04", "09n", "40d").
fn weather_code(symbol: &str) -> Option<WeatherCode> {
    let prefix: String = symbol.chars().take_while(char::is_ascii_digit).collect();
    match prefix.as_str() {
        "01" | "02" => Some(WeatherCode::Clear),
        "03" => Some(WeatherCode::PartlyCloudy),
        "04" => Some(WeatherCode::Cloudy),
        "15" => Some(WeatherCode::Fog),
        "05" | "09" | "10" | "40" | "41" | "46" => Some(WeatherCode::Rain),
        "07" | "12" | "26" | "27" | "42" | "43" | "47" | "48" => Some(WeatherCode::Sleet),
        "08" | "13" | "21" | "28" | "29" | "44" | "45" | "49" | "50" => Some(WeatherCode::Snow),
        "06" | "11" | "14" | "22" | "23" | "24" | "25" | "30" | "31" | "32" | "33" | "34" => {
            Some(WeatherCode::Thunderstorm)
        }
        _ => None,
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct MetIeHourly {
    pub(crate) date: Option<String>,
    pub(crate) time: Option<String>,
    pub(crate) temperature: Option<String>,
    pub(crate) symbol: Option<String>,
    #[serde(rename = "weatherDescription")]
    pub(crate) weather_description: Option<String>,
    pub(crate) rainfall: Option<String>,
    pub(crate) humidity: Option<String>,
    pub(crate) pressure: Option<String>,
    #[serde(rename = "windSpeed")]
    pub(crate) wind_speed: Option<String>,
    #[serde(rename = "windGust")]
    pub(crate) wind_gust: Option<String>,
    #[serde(rename = "cardinalWindDirection")]
    pub(crate) cardinal_wind_direction: Option<String>,
}

impl MetIeHourly {
    fn wind_direction_degrees(&self) -> Option<f64> {
        let degrees = match self.cardinal_wind_direction.as_deref()? {
            "N" => 0.0,
            "NE" => 45.0,
            "E" => 90.0,
            "SE" => 135.0,
            "S" => 180.0,
            "SW" => 225.0,
            "W" => 270.0,
            "NW" => 315.0,
            _ => return None,
        };
        Some(degrees)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct MetIeWarning {
    pub(crate) id: Option<String>,
    pub(crate) level: Option<String>,
    pub(crate) headline: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) onset: Option<String>,
    pub(crate) expiry: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::TemperatureUnit;

    fn tz() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn empty_hourly_series_is_rejected() {
        let err = convert(Some(Vec::new()), None, tz()).unwrap_err();
        assert_eq!(err, SourceError::InvalidOrIncompleteData);
    }

    #[test]
    fn string_typed_fields_parse_into_units() {
        let records: Vec<MetIeHourly> = serde_json::from_str(
            r#"[{"date": "2024-06-01", "time": "12:00", "temperature": "16",
                 "symbol": "04n", "rainfall": "0.4", "windSpeed": "18",
                 "cardinalWindDirection": "SW"}]"#,
        )
        .unwrap();
        let wrapper = convert(Some(records), None, tz()).unwrap();
        let hourly = wrapper.hourly_forecast.unwrap();
        let record = &hourly[0];
        assert_eq!(record.weather_code, Some(WeatherCode::Cloudy));
        assert_eq!(
            record
                .temperature
                .as_ref()
                .unwrap()
                .temperature
                .unwrap()
                .to_unit(TemperatureUnit::Celsius),
            16.0
        );
        assert_eq!(record.wind.as_ref().unwrap().direction, Some(225.0));
    }

    #[test]
    fn warning_levels_map_to_severities() {
        let warnings: Vec<MetIeWarning> = serde_json::from_str(
            r#"[{"id": "IE-2104", "level": "Orange", "headline": "Wind warning",
                 "onset": "2024-06-01T06:00:00+00:00", "expiry": "2024-06-01T18:00:00+00:00"},
                {"id": "IE-2105", "level": "Red", "headline": "Storm warning"}]"#,
        )
        .unwrap();
        let wrapper = convert(None, Some(warnings), tz()).unwrap();
        let alerts = wrapper.alert_list.unwrap();
        assert_eq!(alerts[0].alert_id, "IE-2104");
        assert_eq!(alerts[0].severity, AlertSeverity::Severe);
        assert_eq!(alerts[1].severity, AlertSeverity::Extreme);
    }

    #[test]
    fn symbol_prefix_selects_the_code() {
        assert_eq!(weather_code("40d"), Some(WeatherCode::Rain));
        assert_eq!(weather_code("13"), Some(WeatherCode::Snow));
        assert_eq!(weather_code("99"), None);
    }
}
