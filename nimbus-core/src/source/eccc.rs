//! Environment and Climate Change Canada. Key-free, Canada only.
//!
//! The daily feed alternates day and night periods instead of shipping
//! calendar days, so the converter realigns them before mapping.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, FixedOffset, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

use super::{
    SourceFeature, SourceId, WeatherSource, ensure_supported, get_json, is_requested,
    local_date_to_utc, rfc3339_to_utc,
};
use crate::config::Config;
use crate::error::SourceError;
use crate::location::Location;
use crate::mapper;
use crate::model::weather::{Current, Daily, HalfDay};
use crate::model::{Alert, AlertSeverity, HourlyWrapper, WeatherCode, WeatherWrapper, synthesized_alert_id};
use crate::units::{Distance, Pressure, Ratio, Speed, Temperature};

const DEFAULT_BASE_URL: &str = "https://app.weather.gc.ca/v3";

#[derive(Debug, Clone)]
pub struct EcccService {
    base_url: String,
    http: Client,
}

impl EcccService {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            http: Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.effective_instance(SourceId::Eccc, DEFAULT_BASE_URL))
    }

    async fn fetch_bundle(&self, location: &Location) -> Result<EcccResult, SourceError> {
        let url = format!("{}/en/weather", self.base_url);
        let mut results: Vec<EcccResult> = get_json(
            &self.http,
            &url,
            &[(
                "coords",
                format!("{},{}", location.latitude, location.longitude),
            )],
        )
        .await?;
        results
            .drain(..)
            .next()
            .ok_or(SourceError::InvalidOrIncompleteData)
    }
}

#[async_trait]
impl WeatherSource for EcccService {
    fn id(&self) -> SourceId {
        SourceId::Eccc
    }

    fn supported_features(&self, location: &Location) -> Vec<SourceFeature> {
        if location.is_in_country("CA") {
            vec![
                SourceFeature::Forecast,
                SourceFeature::Current,
                SourceFeature::Alert,
                SourceFeature::Normals,
            ]
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

        // Single bundle endpoint; a fetch failure fails every requested
        // feature at once.
        let bundle = match self.fetch_bundle(location).await {
            Ok(bundle) => bundle,
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

        let month = Utc::now().with_timezone(&location.timezone).month();
        convert(Some(bundle), features, month, location.timezone)
    }
}

pub(crate) fn convert(
    bundle: Option<EcccResult>,
    features: &[SourceFeature],
    month: u32,
    timezone: FixedOffset,
) -> Result<WeatherWrapper, SourceError> {
    let Some(bundle) = bundle else {
        return Ok(WeatherWrapper::default());
    };

    let daily_periods = bundle
        .daily_fcst
        .as_ref()
        .map(|d| d.daily.as_slice())
        .unwrap_or_default();
    let hourly_records = bundle
        .hourly_fcst
        .as_ref()
        .map(|h| h.hourly.as_slice())
        .unwrap_or_default();

    if is_requested(features, SourceFeature::Forecast)
        && daily_periods.is_empty()
        && hourly_records.is_empty()
    {
        return Err(SourceError::InvalidOrIncompleteData);
    }

    let mut wrapper = WeatherWrapper::default();

    if is_requested(features, SourceFeature::Forecast) {
        wrapper.daily_forecast =
            (!daily_periods.is_empty()).then(|| realign_daily(daily_periods, timezone));
        wrapper.hourly_forecast =
            (!hourly_records.is_empty()).then(|| hourly_records.iter().map(convert_hourly).collect());
    }
    if is_requested(features, SourceFeature::Current) {
        wrapper.current = bundle.observation.as_ref().map(convert_current);
    }
    if is_requested(features, SourceFeature::Alert) {
        wrapper.alert_list = bundle.alert.map(|a| {
            Alert::deduplicate(a.alerts.iter().map(convert_alert).collect())
        });
    }
    if is_requested(features, SourceFeature::Normals) {
        wrapper.normals = bundle
            .daily_fcst
            .and_then(|d| d.regional_normals)
            .map(|normals| convert_normals(&normals.metric, month));
    }

    Ok(wrapper)
}

/// Realign alternating day/night periods into calendar days. A leading
/// night period (temperature class "low") yields a day with no day part;
/// after that, periods pair up as (day, night).
pub(crate) fn realign_daily(periods: &[EcccDaily], timezone: FixedOffset) -> Vec<Daily> {
    let mut days = Vec::new();
    let mut rest = periods;

    if let Some(first) = rest.first()
        && first.is_night()
    {
        days.push(Daily {
            date: period_date(first, timezone),
            day: None,
            night: Some(convert_half_day(first)),
            ..Default::default()
        });
        rest = &rest[1..];
    }

    for pair in rest.chunks(2) {
        let day = &pair[0];
        days.push(Daily {
            date: period_date(day, timezone),
            day: Some(convert_half_day(day)),
            night: pair.get(1).map(convert_half_day),
            ..Default::default()
        });
    }

    days
}

fn period_date(period: &EcccDaily, timezone: FixedOffset) -> DateTime<Utc> {
    period
        .date
        .as_deref()
        .and_then(|d| local_date_to_utc(d, timezone))
        .unwrap_or_default()
}

fn convert_half_day(period: &EcccDaily) -> HalfDay {
    HalfDay {
        weather_text: period.summary.clone(),
        weather_code: period.icon_code.as_deref().and_then(weather_code),
        temperature: mapper::temperature(
            period
                .temperature
                .as_ref()
                .and_then(EcccTemperature::parsed)
                .and_then(|v| Temperature::celsius(v).ok()),
            None,
            None,
            None,
            None,
        ),
        precipitation_probability: mapper::precipitation_probability(
            period
                .precip
                .as_deref()
                .and_then(|p| p.parse::<f64>().ok())
                .and_then(|v| Ratio::percent(v).ok()),
            None,
            None,
            None,
            None,
        ),
        ..Default::default()
    }
}

fn convert_hourly(raw: &EcccHourly) -> HourlyWrapper {
    HourlyWrapper {
        date: raw
            .epoch_time
            .and_then(|t| DateTime::from_timestamp(t, 0))
            .unwrap_or_default(),
        weather_text: raw.condition.clone(),
        weather_code: raw.icon_code.as_deref().and_then(weather_code),
        temperature: mapper::temperature(
            raw.temperature.as_ref().and_then(EcccMetric::parsed).and_then(|v| Temperature::celsius(v).ok()),
            raw.feels_like.as_ref().and_then(EcccMetric::parsed).and_then(|v| Temperature::celsius(v).ok()),
            None,
            None,
            None,
        ),
        precipitation_probability: mapper::precipitation_probability(
            raw.precip
                .as_deref()
                .and_then(|p| p.parse::<f64>().ok())
                .and_then(|v| Ratio::percent(v).ok()),
            None,
            None,
            None,
            None,
        ),
        wind: mapper::wind(
            raw.wind_bearing,
            raw.wind_speed.as_ref().and_then(EcccMetric::parsed).and_then(|v| Speed::kilometers_per_hour(v).ok()),
            raw.wind_gust.as_ref().and_then(EcccMetric::parsed).and_then(|v| Speed::kilometers_per_hour(v).ok()),
        ),
        relative_humidity: raw
            .humidity
            .as_ref()
            .and_then(EcccMetric::parsed)
            .and_then(|v| Ratio::percent(v).ok()),
        ..Default::default()
    }
}

fn convert_current(raw: &EcccObservation) -> Current {
    Current {
        weather_text: raw.condition.clone(),
        weather_code: raw.icon_code.as_deref().and_then(weather_code),
        temperature: mapper::temperature(
            raw.temperature.as_ref().and_then(EcccMetric::parsed).and_then(|v| Temperature::celsius(v).ok()),
            raw.feels_like.as_ref().and_then(EcccMetric::parsed).and_then(|v| Temperature::celsius(v).ok()),
            None,
            None,
            None,
        ),
        wind: mapper::wind(
            raw.wind_bearing,
            raw.wind_speed.as_ref().and_then(EcccMetric::parsed).and_then(|v| Speed::kilometers_per_hour(v).ok()),
            raw.wind_gust.as_ref().and_then(EcccMetric::parsed).and_then(|v| Speed::kilometers_per_hour(v).ok()),
        ),
        relative_humidity: raw
            .humidity
            .as_ref()
            .and_then(EcccMetric::parsed)
            .and_then(|v| Ratio::percent(v).ok()),
        dew_point: raw
            .dewpoint
            .as_ref()
            .and_then(EcccMetric::parsed)
            .and_then(|v| Temperature::celsius(v).ok()),
        // Station pressure arrives in kPa.
        pressure: raw
            .pressure
            .as_ref()
            .and_then(EcccMetric::parsed)
            .and_then(|v| Pressure::pascals(v * 1000.0).ok()),
        visibility: raw
            .visibility
            .as_ref()
            .and_then(EcccMetric::parsed)
            .and_then(|v| Distance::kilometers(v).ok())
            .and_then(Distance::validate_non_negative),
        ..Default::default()
    }
}

fn convert_alert(raw: &EcccAlert) -> Alert {
    let severity = match raw.kind.as_deref() {
        Some("warning") => AlertSeverity::Severe,
        Some("watch") => AlertSeverity::Moderate,
        Some("statement") | Some("advisory") => AlertSeverity::Minor,
        _ => AlertSeverity::Unknown,
    };
    let start = raw.event_onset_time.as_deref().and_then(rfc3339_to_utc);
    Alert {
        alert_id: synthesized_alert_id(&[
            raw.alert_banner_text.as_deref().unwrap_or_default(),
            raw.event_onset_time.as_deref().unwrap_or_default(),
        ]),
        start_date: start,
        end_date: raw.event_end_time.as_deref().and_then(rfc3339_to_utc),
        headline: raw.alert_banner_text.clone(),
        description: raw.text.clone(),
        instruction: None,
        source: Some("ECCC".to_string()),
        severity,
        color: severity.color(),
    }
}

pub(crate) fn convert_normals(
    normals: &[EcccNormal],
    month: u32,
) -> std::collections::BTreeMap<u32, crate::model::weather::Normals> {
    let high = normals
        .iter()
        .find(|n| n.class.as_deref() == Some("high"))
        .and_then(|n| n.value)
        .and_then(|v| Temperature::celsius(v).ok());
    let low = normals
        .iter()
        .find(|n| n.class.as_deref() == Some("low"))
        .and_then(|n| n.value)
        .and_then(|v| Temperature::celsius(v).ok());
    mapper::normals_for_month(month, high, low)
}

/// ECCC numeric icon codes -> common vocabulary.
fn weather_code(icon: &str) -> Option<WeatherCode> {
    match icon {
        "00" | "01" | "30" | "31" => Some(WeatherCode::Clear),
        "02" | "03" | "04" | "05" | "32" | "33" | "34" | "35" => Some(WeatherCode::PartlyCloudy),
        "10" | "20" | "21" => Some(WeatherCode::Cloudy),
        "06" | "11" | "12" | "13" | "28" | "36" => Some(WeatherCode::Rain),
        "07" | "14" | "15" | "27" | "37" => Some(WeatherCode::Sleet),
        "08" | "16" | "17" | "18" | "26" | "38" => Some(WeatherCode::Snow),
        "09" | "19" | "39" | "46" | "47" => Some(WeatherCode::Thunderstorm),
        "23" | "44" | "45" => Some(WeatherCode::Haze),
        "24" => Some(WeatherCode::Fog),
        "25" | "40" | "41" | "42" | "43" | "48" => Some(WeatherCode::Wind),
        _ => None,
    }
}

/// Numeric fields arrive as strings in the metric wrapper.
#[derive(Debug, Deserialize)]
pub(crate) struct EcccMetric {
    pub(crate) metric: Option<String>,
}

impl EcccMetric {
    fn parsed(&self) -> Option<f64> {
        self.metric.as_deref().and_then(|v| v.parse().ok())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct EcccTemperature {
    pub(crate) class: Option<String>,
    pub(crate) value: Option<String>,
}

impl EcccTemperature {
    fn parsed(&self) -> Option<f64> {
        self.value.as_deref().and_then(|v| v.parse().ok())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct EcccResult {
    pub(crate) observation: Option<EcccObservation>,
    #[serde(rename = "dailyFcst")]
    pub(crate) daily_fcst: Option<EcccDailyForecast>,
    #[serde(rename = "hourlyFcst")]
    pub(crate) hourly_fcst: Option<EcccHourlyForecast>,
    pub(crate) alert: Option<EcccAlertResult>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EcccObservation {
    pub(crate) condition: Option<String>,
    #[serde(rename = "iconCode")]
    pub(crate) icon_code: Option<String>,
    pub(crate) temperature: Option<EcccMetric>,
    #[serde(rename = "feelsLike")]
    pub(crate) feels_like: Option<EcccMetric>,
    pub(crate) dewpoint: Option<EcccMetric>,
    pub(crate) pressure: Option<EcccMetric>,
    pub(crate) humidity: Option<EcccMetric>,
    pub(crate) visibility: Option<EcccMetric>,
    #[serde(rename = "windSpeed")]
    pub(crate) wind_speed: Option<EcccMetric>,
    #[serde(rename = "windGust")]
    pub(crate) wind_gust: Option<EcccMetric>,
    #[serde(rename = "windBearing")]
    pub(crate) wind_bearing: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EcccDailyForecast {
    #[serde(default)]
    pub(crate) daily: Vec<EcccDaily>,
    #[serde(rename = "regionalNormals")]
    pub(crate) regional_normals: Option<EcccRegionalNormals>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EcccDaily {
    pub(crate) date: Option<String>,
    pub(crate) summary: Option<String>,
    #[serde(rename = "iconCode")]
    pub(crate) icon_code: Option<String>,
    pub(crate) temperature: Option<EcccTemperature>,
    pub(crate) precip: Option<String>,
}

impl EcccDaily {
    fn is_night(&self) -> bool {
        self.temperature
            .as_ref()
            .is_some_and(|t| t.class.as_deref() == Some("low"))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct EcccHourlyForecast {
    #[serde(default)]
    pub(crate) hourly: Vec<EcccHourly>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EcccHourly {
    #[serde(rename = "epochTime")]
    pub(crate) epoch_time: Option<i64>,
    pub(crate) condition: Option<String>,
    #[serde(rename = "iconCode")]
    pub(crate) icon_code: Option<String>,
    pub(crate) temperature: Option<EcccMetric>,
    #[serde(rename = "feelsLike")]
    pub(crate) feels_like: Option<EcccMetric>,
    pub(crate) humidity: Option<EcccMetric>,
    pub(crate) precip: Option<String>,
    #[serde(rename = "windSpeed")]
    pub(crate) wind_speed: Option<EcccMetric>,
    #[serde(rename = "windGust")]
    pub(crate) wind_gust: Option<EcccMetric>,
    #[serde(rename = "windBearing")]
    pub(crate) wind_bearing: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EcccAlertResult {
    #[serde(default)]
    pub(crate) alerts: Vec<EcccAlert>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EcccAlert {
    #[serde(rename = "alertBannerText")]
    pub(crate) alert_banner_text: Option<String>,
    pub(crate) text: Option<String>,
    #[serde(rename = "type")]
    pub(crate) kind: Option<String>,
    #[serde(rename = "eventOnsetTime")]
    pub(crate) event_onset_time: Option<String>,
    #[serde(rename = "eventEndTime")]
    pub(crate) event_end_time: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EcccRegionalNormals {
    #[serde(default)]
    pub(crate) metric: Vec<EcccNormal>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EcccNormal {
    pub(crate) class: Option<String>,
    pub(crate) value: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::TemperatureUnit;

    fn tz() -> FixedOffset {
        FixedOffset::west_opt(5 * 3600).unwrap()
    }

    fn periods(json: &str) -> Vec<EcccDaily> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn leading_night_period_becomes_half_open_day() {
        let periods = periods(
            r#"[{"date": "2024-06-01", "temperature": {"class": "low", "value": "8"}},
                {"date": "2024-06-02", "temperature": {"class": "high", "value": "21"}},
                {"date": "2024-06-02", "temperature": {"class": "low", "value": "11"}}]"#,
        );
        let days = realign_daily(&periods, tz());
        assert_eq!(days.len(), 2);
        assert!(days[0].day.is_none());
        assert!(days[0].night.is_some());
        let second = &days[1];
        let high = second.day.as_ref().unwrap().temperature.as_ref().unwrap();
        assert_eq!(high.temperature.unwrap().to_unit(TemperatureUnit::Celsius), 21.0);
        let low = second.night.as_ref().unwrap().temperature.as_ref().unwrap();
        assert_eq!(low.temperature.unwrap().to_unit(TemperatureUnit::Celsius), 11.0);
    }

    #[test]
    fn day_first_feed_pairs_without_padding() {
        let periods = periods(
            r#"[{"date": "2024-06-01", "temperature": {"class": "high", "value": "20"}},
                {"date": "2024-06-01", "temperature": {"class": "low", "value": "10"}},
                {"date": "2024-06-02", "temperature": {"class": "high", "value": "22"}}]"#,
        );
        let days = realign_daily(&periods, tz());
        assert_eq!(days.len(), 2);
        assert!(days[0].day.is_some() && days[0].night.is_some());
        // Trailing day period with no matching night stays half-open.
        assert!(days[1].day.is_some() && days[1].night.is_none());
    }

    #[test]
    fn overlapping_warning_and_watch_collapse() {
        let bundle: EcccResult = serde_json::from_str(
            r#"{"alert": {"alerts": [
                 {"alertBannerText": "Rainfall warning", "text": "Heavy rain expected.",
                  "type": "warning", "eventOnsetTime": "2024-06-01T10:00:00+00:00"},
                 {"alertBannerText": "Rainfall watch", "text": "Heavy rain expected.",
                  "type": "watch", "eventOnsetTime": "2024-06-01T10:00:00+00:00"}]}}"#,
        )
        .unwrap();
        let wrapper = convert(Some(bundle), &[SourceFeature::Alert], 6, tz()).unwrap();
        let alerts = wrapper.alert_list.unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::Severe);
    }

    #[test]
    fn empty_daily_and_hourly_is_rejected() {
        let bundle: EcccResult =
            serde_json::from_str(r#"{"dailyFcst": {"daily": []}, "hourlyFcst": {"hourly": []}}"#)
                .unwrap();
        let err = convert(Some(bundle), &[SourceFeature::Forecast], 6, tz()).unwrap_err();
        assert_eq!(err, SourceError::InvalidOrIncompleteData);
    }

    #[test]
    fn regional_normals_key_the_current_month() {
        let normals: Vec<EcccNormal> = serde_json::from_str(
            r#"[{"class": "high", "value": 24.0}, {"class": "low", "value": 13.0}]"#,
        )
        .unwrap();
        let map = convert_normals(&normals, 7);
        let july = map.get(&7).unwrap();
        assert_eq!(
            july.daytime_temperature.unwrap().to_unit(TemperatureUnit::Celsius),
            24.0
        );
        assert_eq!(
            july.nighttime_temperature.unwrap().to_unit(TemperatureUnit::Celsius),
            13.0
        );
    }

    #[test]
    fn observation_pressure_is_kilopascals() {
        let bundle: EcccResult = serde_json::from_str(
            r#"{"observation": {"condition": "Sunny", "iconCode": "00",
                 "temperature": {"metric": "18.2"}, "pressure": {"metric": "101.3"}}}"#,
        )
        .unwrap();
        let wrapper = convert(Some(bundle), &[SourceFeature::Current], 6, tz()).unwrap();
        let current = wrapper.current.unwrap();
        assert_eq!(current.weather_code, Some(WeatherCode::Clear));
        let pressure = current.pressure.unwrap();
        assert!((pressure.to_unit(crate::units::PressureUnit::Hectopascal) - 1013.0).abs() < 1e-9);
    }
}
