//! QWeather. Key required; forecast, current conditions, air quality and
//! warnings.
//!
//! Every numeric field arrives as a string, and errors are reported
//! through a status code inside an HTTP 200 envelope.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

use super::{SourceFeature, SourceId, WeatherSource, ensure_supported, get_json, is_requested, settle};
use crate::config::Config;
use crate::error::SourceError;
use crate::location::Location;
use crate::mapper;
use crate::model::weather::{Astro, Current, Daily, HalfDay, Minutely, UV};
use crate::model::{Alert, AlertSeverity, HourlyWrapper, WeatherCode, WeatherWrapper};
use crate::units::{
    Distance, PollutantConcentration, Precipitation, PrecipitationIntensity, Pressure, Ratio,
    Speed, Temperature,
};

const DEFAULT_BASE_URL: &str = "https://devapi.qweather.com/v7";
const DEFAULT_API_KEY: Option<&str> = None;

#[derive(Debug, Clone)]
pub struct QWeatherService {
    api_key: String,
    base_url: String,
    http: Client,
}

impl QWeatherService {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url,
            http: Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let api_key = config.effective_api_key(SourceId::QWeather, DEFAULT_API_KEY)?;
        let base_url = config.effective_instance(SourceId::QWeather, DEFAULT_BASE_URL);
        Ok(Self::new(api_key, base_url))
    }

    async fn get<T: serde::de::DeserializeOwned + QwEnvelope>(
        &self,
        endpoint: &str,
        location: &Location,
    ) -> Result<T, SourceError> {
        let url = format!("{}/{endpoint}", self.base_url);
        let result: T = get_json(
            &self.http,
            &url,
            &[
                ("location", format!("{},{}", location.longitude, location.latitude)),
                ("key", self.api_key.clone()),
                ("lang", "en".to_string()),
            ],
        )
        .await?;
        check_code(result.code())?;
        Ok(result)
    }
}

#[async_trait]
impl WeatherSource for QWeatherService {
    fn id(&self) -> SourceId {
        SourceId::QWeather
    }

    fn supported_features(&self, _location: &Location) -> Vec<SourceFeature> {
        vec![
            SourceFeature::Forecast,
            SourceFeature::Current,
            SourceFeature::AirQuality,
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

        let daily = async {
            if is_requested(features, SourceFeature::Forecast) {
                Some(self.get::<QwDailyResult>("weather/7d", location).await)
            } else {
                None
            }
        };
        let hourly = async {
            if is_requested(features, SourceFeature::Forecast) {
                Some(self.get::<QwHourlyResult>("weather/24h", location).await)
            } else {
                None
            }
        };
        let now = async {
            if is_requested(features, SourceFeature::Current) {
                Some(self.get::<QwNowResult>("weather/now", location).await)
            } else {
                None
            }
        };
        let air = async {
            if is_requested(features, SourceFeature::AirQuality) {
                Some(self.get::<QwAirResult>("air/now", location).await)
            } else {
                None
            }
        };
        let warnings = async {
            if is_requested(features, SourceFeature::Alert) {
                Some(self.get::<QwWarningResult>("warning/now", location).await)
            } else {
                None
            }
        };
        let minutely = async {
            if is_requested(features, SourceFeature::Minutely) {
                Some(self.get::<QwMinutelyResult>("minutely/5m", location).await)
            } else {
                None
            }
        };
        let (daily, hourly, now, air, warnings, minutely) =
            tokio::join!(daily, hourly, now, air, warnings, minutely);

        let mut failed = HashMap::new();
        // Forecast rides on two endpoints; it fails only when both do.
        let (daily, hourly) = match (daily, hourly) {
            (Some(Err(err)), Some(Err(_))) => {
                failed.insert(SourceFeature::Forecast, err);
                (None, None)
            }
            (daily, hourly) => (
                daily.and_then(Result::ok),
                hourly.and_then(Result::ok),
            ),
        };
        let now = settle(now, SourceFeature::Current, &mut failed);
        let air = settle(air, SourceFeature::AirQuality, &mut failed);
        let warnings = settle(warnings, SourceFeature::Alert, &mut failed);
        let minutely = settle(minutely, SourceFeature::Minutely, &mut failed);

        let mut wrapper = convert(
            daily,
            hourly,
            now,
            air,
            warnings,
            minutely,
            features,
            location.timezone,
        )?;
        wrapper.failed_features = failed;
        Ok(wrapper)
    }
}

/// Map the in-envelope status code. "204" means the location is outside
/// the service area.
pub(crate) fn check_code(code: Option<&str>) -> Result<(), SourceError> {
    match code {
        Some("200") | None => Ok(()),
        Some("204") | Some("404") => Err(SourceError::InvalidLocation),
        Some("401") | Some("402") | Some("403") => Err(SourceError::ApiKeyMissing),
        Some(other) => Err(SourceError::Network(format!("status code {other}"))),
    }
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn convert(
    daily: Option<QwDailyResult>,
    hourly: Option<QwHourlyResult>,
    now: Option<QwNowResult>,
    air: Option<QwAirResult>,
    warnings: Option<QwWarningResult>,
    minutely: Option<QwMinutelyResult>,
    features: &[SourceFeature],
    timezone: FixedOffset,
) -> Result<WeatherWrapper, SourceError> {
    let daily_records = daily.as_ref().map(|d| d.daily.as_slice()).unwrap_or_default();
    let hourly_records = hourly.as_ref().map(|h| h.hourly.as_slice()).unwrap_or_default();
    if is_requested(features, SourceFeature::Forecast)
        && daily_records.is_empty()
        && hourly_records.is_empty()
    {
        return Err(SourceError::InvalidOrIncompleteData);
    }

    let mut wrapper = WeatherWrapper::default();

    if is_requested(features, SourceFeature::Forecast) {
        wrapper.daily_forecast = (!daily_records.is_empty())
            .then(|| daily_records.iter().map(|d| convert_daily(d, timezone)).collect());
        wrapper.hourly_forecast =
            (!hourly_records.is_empty()).then(|| hourly_records.iter().map(convert_hourly).collect());
    }
    if is_requested(features, SourceFeature::Current) {
        wrapper.current = now.and_then(|r| r.now).map(|n| convert_now(&n));
    }
    if is_requested(features, SourceFeature::AirQuality) {
        wrapper.air_quality = air.and_then(|r| r.now).and_then(|n| {
            mapper::air_quality(
                parse(&n.pm2p5).and_then(|v| PollutantConcentration::micrograms_per_cubic_meter(v).ok()),
                parse(&n.pm10).and_then(|v| PollutantConcentration::micrograms_per_cubic_meter(v).ok()),
                parse(&n.so2).and_then(|v| PollutantConcentration::micrograms_per_cubic_meter(v).ok()),
                parse(&n.no2).and_then(|v| PollutantConcentration::micrograms_per_cubic_meter(v).ok()),
                parse(&n.o3).and_then(|v| PollutantConcentration::micrograms_per_cubic_meter(v).ok()),
                // CO alone is reported in mg/m3.
                parse(&n.co).and_then(|v| PollutantConcentration::milligrams_per_cubic_meter(v).ok()),
            )
        });
    }
    if is_requested(features, SourceFeature::Alert) {
        wrapper.alert_list = warnings
            .map(|r| Alert::deduplicate(r.warning.iter().map(convert_warning).collect()));
    }
    if is_requested(features, SourceFeature::Minutely) {
        wrapper.minutely_forecast = minutely.map(|r| convert_minutely(&r.minutely));
    }

    Ok(wrapper)
}

/// Five-minute nowcast points; the interval is still derived from the
/// timestamps rather than assumed.
pub(crate) fn convert_minutely(raw: &[QwMinutely]) -> Vec<Minutely> {
    let dates: Vec<_> = raw
        .iter()
        .map(|p| p.fx_time.as_deref().and_then(offset_datetime))
        .collect();
    raw.iter()
        .enumerate()
        .map(|(i, point)| {
            let date = dates[i].unwrap_or_default();
            let minute_interval = match (dates.get(i + 1).copied().flatten(), i) {
                (Some(next), _) => (next - date).num_minutes(),
                (None, 0) => 5,
                (None, _) => dates[i - 1]
                    .map(|prev| (date - prev).num_minutes())
                    .unwrap_or(5),
            };
            Minutely {
                date,
                minute_interval,
                precipitation_intensity: parse(&point.precip)
                    .and_then(|v| PrecipitationIntensity::millimeters_per_hour(v).ok()),
            }
        })
        .collect()
}

fn parse(field: &Option<String>) -> Option<f64> {
    field.as_deref().and_then(|v| v.parse().ok())
}

fn convert_daily(raw: &QwDaily, timezone: FixedOffset) -> Daily {
    let date = raw
        .fx_date
        .as_deref()
        .and_then(|d| super::local_date_to_utc(d, timezone))
        .unwrap_or_default();
    Daily {
        date,
        day: Some(HalfDay {
            weather_text: raw.text_day.clone(),
            weather_code: raw.icon_day.as_deref().and_then(weather_code),
            temperature: mapper::temperature(
                parse(&raw.temp_max).and_then(|v| Temperature::celsius(v).ok()),
                None,
                None,
                None,
                None,
            ),
            precipitation: mapper::precipitation(
                parse(&raw.precip).and_then(|v| Precipitation::millimeters(v).ok()),
                None,
                None,
                None,
                None,
            ),
            wind: mapper::wind(
                parse(&raw.wind360_day),
                parse(&raw.wind_speed_day).and_then(|v| Speed::kilometers_per_hour(v).ok()),
                None,
            ),
            ..Default::default()
        }),
        night: Some(HalfDay {
            weather_text: raw.text_night.clone(),
            weather_code: raw.icon_night.as_deref().and_then(weather_code),
            temperature: mapper::temperature(
                parse(&raw.temp_min).and_then(|v| Temperature::celsius(v).ok()),
                None,
                None,
                None,
                None,
            ),
            wind: mapper::wind(
                parse(&raw.wind360_night),
                parse(&raw.wind_speed_night).and_then(|v| Speed::kilometers_per_hour(v).ok()),
                None,
            ),
            ..Default::default()
        }),
        sun: sun_events(raw, timezone),
        uv: parse(&raw.uv_index).map(|index| UV { index: Some(index) }),
        ..Default::default()
    }
}

/// Sunrise/sunset are "HH:MM" local clock times on the forecast date.
fn sun_events(raw: &QwDaily, timezone: FixedOffset) -> Option<Astro> {
    let date = NaiveDate::parse_from_str(raw.fx_date.as_deref()?, "%Y-%m-%d").ok()?;
    let at = |clock: &Option<String>| -> Option<DateTime<Utc>> {
        let (h, m) = clock.as_deref()?.split_once(':')?;
        let naive = date.and_hms_opt(h.parse().ok()?, m.parse().ok()?, 0)?;
        timezone
            .from_local_datetime(&naive)
            .single()
            .map(|d| d.with_timezone(&Utc))
    };
    let astro = Astro {
        rise_date: at(&raw.sunrise),
        set_date: at(&raw.sunset),
    };
    (astro.rise_date.is_some() || astro.set_date.is_some()).then_some(astro)
}

fn convert_hourly(raw: &QwHourly) -> HourlyWrapper {
    HourlyWrapper {
        date: raw
            .fx_time
            .as_deref()
            .and_then(offset_datetime)
            .unwrap_or_default(),
        weather_text: raw.text.clone(),
        weather_code: raw.icon.as_deref().and_then(weather_code),
        temperature: mapper::temperature(
            parse(&raw.temp).and_then(|v| Temperature::celsius(v).ok()),
            None,
            None,
            None,
            None,
        ),
        precipitation: mapper::precipitation(
            parse(&raw.precip).and_then(|v| Precipitation::millimeters(v).ok()),
            None,
            None,
            None,
            None,
        ),
        precipitation_probability: mapper::precipitation_probability(
            parse(&raw.pop).and_then(|v| Ratio::percent(v).ok()),
            None,
            None,
            None,
            None,
        ),
        wind: mapper::wind(
            parse(&raw.wind360),
            parse(&raw.wind_speed).and_then(|v| Speed::kilometers_per_hour(v).ok()),
            None,
        ),
        relative_humidity: parse(&raw.humidity).and_then(|v| Ratio::percent(v).ok()),
        dew_point: parse(&raw.dew).and_then(|v| Temperature::celsius(v).ok()),
        pressure: parse(&raw.pressure).and_then(|v| Pressure::hectopascals(v).ok()),
        cloud_cover: parse(&raw.cloud).and_then(|v| Ratio::percent(v).ok()),
        ..Default::default()
    }
}

fn convert_now(raw: &QwNow) -> Current {
    Current {
        weather_text: raw.text.clone(),
        weather_code: raw.icon.as_deref().and_then(weather_code),
        temperature: mapper::temperature(
            parse(&raw.temp).and_then(|v| Temperature::celsius(v).ok()),
            parse(&raw.feels_like).and_then(|v| Temperature::celsius(v).ok()),
            None,
            None,
            None,
        ),
        wind: mapper::wind(
            parse(&raw.wind360),
            parse(&raw.wind_speed).and_then(|v| Speed::kilometers_per_hour(v).ok()),
            None,
        ),
        relative_humidity: parse(&raw.humidity).and_then(|v| Ratio::percent(v).ok()),
        dew_point: parse(&raw.dew).and_then(|v| Temperature::celsius(v).ok()),
        pressure: parse(&raw.pressure).and_then(|v| Pressure::hectopascals(v).ok()),
        cloud_cover: parse(&raw.cloud).and_then(|v| Ratio::percent(v).ok()),
        visibility: parse(&raw.vis)
            .and_then(|v| Distance::kilometers(v).ok())
            .and_then(Distance::validate_non_negative),
        ..Default::default()
    }
}

fn convert_warning(raw: &QwWarning) -> Alert {
    let severity = match raw.severity.as_deref() {
        Some("Minor") => AlertSeverity::Minor,
        Some("Moderate") => AlertSeverity::Moderate,
        Some("Major") | Some("Severe") => AlertSeverity::Severe,
        Some("Extreme") => AlertSeverity::Extreme,
        _ => AlertSeverity::Unknown,
    };
    Alert {
        alert_id: raw.id.clone().unwrap_or_default(),
        start_date: raw.start_time.as_deref().and_then(offset_datetime),
        end_date: raw.end_time.as_deref().and_then(offset_datetime),
        headline: raw.title.clone(),
        description: raw.text.clone(),
        instruction: None,
        source: raw.sender.clone(),
        severity,
        color: severity.color(),
    }
}

/// Timestamps come without seconds ("2024-06-01T12:00+08:00").
fn offset_datetime(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M%z")
        .or_else(|_| DateTime::parse_from_rfc3339(s))
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// QWeather numeric icon codes (shipped as strings).
fn weather_code(icon: &str) -> Option<WeatherCode> {
    match icon.parse::<u32>().ok()? {
        100 | 150 => Some(WeatherCode::Clear),
        101..=103 | 151..=153 => Some(WeatherCode::PartlyCloudy),
        104 => Some(WeatherCode::Cloudy),
        304 => Some(WeatherCode::Hail),
        302 | 303 => Some(WeatherCode::Thunderstorm),
        300 | 301 | 305..=318 | 350 | 351 | 399 => Some(WeatherCode::Rain),
        404..=406 | 456 | 457 => Some(WeatherCode::Sleet),
        400..=403 | 407..=410 | 499 => Some(WeatherCode::Snow),
        500 | 501 | 509..=515 => Some(WeatherCode::Fog),
        502..=508 => Some(WeatherCode::Haze),
        _ => None,
    }
}

pub(crate) trait QwEnvelope {
    fn code(&self) -> Option<&str>;
}

macro_rules! qw_envelope {
    ($($ty:ty),+) => {
        $(impl QwEnvelope for $ty {
            fn code(&self) -> Option<&str> {
                self.code.as_deref()
            }
        })+
    };
}

qw_envelope!(
    QwDailyResult,
    QwHourlyResult,
    QwNowResult,
    QwAirResult,
    QwWarningResult,
    QwMinutelyResult
);

#[derive(Debug, Deserialize)]
pub(crate) struct QwDailyResult {
    pub(crate) code: Option<String>,
    #[serde(default)]
    pub(crate) daily: Vec<QwDaily>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QwDaily {
    pub(crate) fx_date: Option<String>,
    pub(crate) sunrise: Option<String>,
    pub(crate) sunset: Option<String>,
    pub(crate) temp_max: Option<String>,
    pub(crate) temp_min: Option<String>,
    pub(crate) icon_day: Option<String>,
    pub(crate) text_day: Option<String>,
    pub(crate) icon_night: Option<String>,
    pub(crate) text_night: Option<String>,
    #[serde(rename = "wind360Day")]
    pub(crate) wind360_day: Option<String>,
    pub(crate) wind_speed_day: Option<String>,
    #[serde(rename = "wind360Night")]
    pub(crate) wind360_night: Option<String>,
    pub(crate) wind_speed_night: Option<String>,
    pub(crate) precip: Option<String>,
    pub(crate) uv_index: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QwHourlyResult {
    pub(crate) code: Option<String>,
    #[serde(default)]
    pub(crate) hourly: Vec<QwHourly>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QwHourly {
    pub(crate) fx_time: Option<String>,
    pub(crate) temp: Option<String>,
    pub(crate) icon: Option<String>,
    pub(crate) text: Option<String>,
    #[serde(rename = "wind360")]
    pub(crate) wind360: Option<String>,
    pub(crate) wind_speed: Option<String>,
    pub(crate) humidity: Option<String>,
    pub(crate) pop: Option<String>,
    pub(crate) precip: Option<String>,
    pub(crate) pressure: Option<String>,
    pub(crate) cloud: Option<String>,
    pub(crate) dew: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QwNowResult {
    pub(crate) code: Option<String>,
    pub(crate) now: Option<QwNow>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QwNow {
    pub(crate) temp: Option<String>,
    pub(crate) feels_like: Option<String>,
    pub(crate) icon: Option<String>,
    pub(crate) text: Option<String>,
    #[serde(rename = "wind360")]
    pub(crate) wind360: Option<String>,
    pub(crate) wind_speed: Option<String>,
    pub(crate) humidity: Option<String>,
    pub(crate) pressure: Option<String>,
    pub(crate) vis: Option<String>,
    pub(crate) cloud: Option<String>,
    pub(crate) dew: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QwAirResult {
    pub(crate) code: Option<String>,
    pub(crate) now: Option<QwAirNow>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct QwAirNow {
    pub(crate) pm2p5: Option<String>,
    pub(crate) pm10: Option<String>,
    pub(crate) no2: Option<String>,
    pub(crate) so2: Option<String>,
    pub(crate) co: Option<String>,
    pub(crate) o3: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QwMinutelyResult {
    pub(crate) code: Option<String>,
    #[serde(default)]
    pub(crate) minutely: Vec<QwMinutely>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QwMinutely {
    pub(crate) fx_time: Option<String>,
    pub(crate) precip: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QwWarningResult {
    pub(crate) code: Option<String>,
    #[serde(default)]
    pub(crate) warning: Vec<QwWarning>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QwWarning {
    pub(crate) id: Option<String>,
    pub(crate) sender: Option<String>,
    pub(crate) title: Option<String>,
    pub(crate) start_time: Option<String>,
    pub(crate) end_time: Option<String>,
    pub(crate) severity: Option<String>,
    pub(crate) text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{PollutantConcentrationUnit, TemperatureUnit};

    fn tz() -> FixedOffset {
        FixedOffset::east_opt(8 * 3600).unwrap()
    }

    #[test]
    fn envelope_codes_map_to_errors() {
        assert!(check_code(Some("200")).is_ok());
        assert_eq!(check_code(Some("204")).unwrap_err(), SourceError::InvalidLocation);
        assert_eq!(check_code(Some("401")).unwrap_err(), SourceError::ApiKeyMissing);
        assert!(matches!(
            check_code(Some("429")).unwrap_err(),
            SourceError::Network(_)
        ));
    }

    #[test]
    fn string_typed_numbers_parse_into_units() {
        let daily: QwDailyResult = serde_json::from_str(
            r#"{"code": "200", "daily": [{"fxDate": "2024-06-01",
                 "tempMax": "31", "tempMin": "22",
                 "iconDay": "101", "textDay": "Cloudy intervals",
                 "iconNight": "305", "textNight": "Light rain",
                 "sunrise": "05:30", "sunset": "19:45"}]}"#,
        )
        .unwrap();
        let wrapper = convert(
            Some(daily),
            None,
            None,
            None,
            None,
            None,
            &[SourceFeature::Forecast],
            tz(),
        )
        .unwrap();
        let days = wrapper.daily_forecast.unwrap();
        let day = days[0].day.as_ref().unwrap();
        assert_eq!(day.weather_code, Some(WeatherCode::PartlyCloudy));
        assert_eq!(
            day.temperature.as_ref().unwrap().temperature.unwrap()
                .to_unit(TemperatureUnit::Celsius),
            31.0
        );
        assert_eq!(
            days[0].night.as_ref().unwrap().weather_code,
            Some(WeatherCode::Rain)
        );
        assert!(days[0].sun.as_ref().unwrap().rise_date.is_some());
    }

    #[test]
    fn carbon_monoxide_is_milligrams_per_cubic_meter() {
        let air: QwAirResult = serde_json::from_str(
            r#"{"code": "200", "now": {"pm2p5": "35", "co": "0.8"}}"#,
        )
        .unwrap();
        let wrapper = convert(
            None,
            None,
            None,
            Some(air),
            None,
            None,
            &[SourceFeature::AirQuality],
            tz(),
        )
        .unwrap();
        let aq = wrapper.air_quality.unwrap();
        let co = aq.co.unwrap();
        assert!(
            (co.to_unit(PollutantConcentrationUnit::MicrogramPerCubicMeter) - 800.0).abs() < 1e-9
        );
    }

    #[test]
    fn warning_times_without_seconds_parse() {
        let ts = offset_datetime("2024-06-01T12:00+08:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-06-01T04:00:00+00:00");
    }

    #[test]
    fn warnings_keep_native_ids() {
        let warnings: QwWarningResult = serde_json::from_str(
            r#"{"code": "200", "warning": [{"id": "10101010-2024-07",
                 "sender": "Beijing Meteorological Observatory",
                 "title": "Rainstorm Blue Warning", "severity": "Minor",
                 "startTime": "2024-06-01T12:00+08:00"}]}"#,
        )
        .unwrap();
        let wrapper = convert(
            None,
            None,
            None,
            None,
            Some(warnings),
            None,
            &[SourceFeature::Alert],
            tz(),
        )
        .unwrap();
        let alerts = wrapper.alert_list.unwrap();
        assert_eq!(alerts[0].alert_id, "10101010-2024-07");
        assert_eq!(alerts[0].severity, AlertSeverity::Minor);
    }

    #[test]
    fn both_series_empty_is_rejected() {
        let daily: QwDailyResult = serde_json::from_str(r#"{"code": "200", "daily": []}"#).unwrap();
        let hourly: QwHourlyResult =
            serde_json::from_str(r#"{"code": "200", "hourly": []}"#).unwrap();
        let err = convert(
            Some(daily),
            Some(hourly),
            None,
            None,
            None,
            None,
            &[SourceFeature::Forecast],
            tz(),
        )
        .unwrap_err();
        assert_eq!(err, SourceError::InvalidOrIncompleteData);
    }

    #[test]
    fn minutely_intervals_derive_from_timestamps() {
        let minutely: QwMinutelyResult = serde_json::from_str(
            r#"{"code": "200", "minutely": [
                 {"fxTime": "2024-06-01T12:00+08:00", "precip": "0.0"},
                 {"fxTime": "2024-06-01T12:05+08:00", "precip": "0.3"},
                 {"fxTime": "2024-06-01T12:10+08:00", "precip": "0.1"}]}"#,
        )
        .unwrap();
        let wrapper = convert(
            None,
            None,
            None,
            None,
            None,
            Some(minutely),
            &[SourceFeature::Minutely],
            tz(),
        )
        .unwrap();
        let points = wrapper.minutely_forecast.unwrap();
        assert_eq!(points.len(), 3);
        assert!(points.iter().all(|p| p.minute_interval == 5));
        assert!(points[1].precipitation_intensity.is_some());
    }
}
