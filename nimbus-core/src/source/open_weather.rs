//! OpenWeather (One Call API + air pollution endpoint).

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

use super::{SourceFeature, SourceId, WeatherSource, ensure_supported, get_json, is_requested, settle};
use crate::config::Config;
use crate::error::SourceError;
use crate::location::Location;
use crate::mapper;
use crate::model::weather::{Astro, Current, Daily, HalfDay, Minutely, MoonPhase, UV};
use crate::model::{Alert, AlertSeverity, HourlyWrapper, WeatherCode, WeatherWrapper, synthesized_alert_id};
use crate::units::{
    Distance, PollutantConcentration, Precipitation, PrecipitationIntensity, Pressure, Ratio,
    Speed, Temperature,
};

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data";
const DEFAULT_API_KEY: Option<&str> = None;

#[derive(Debug, Clone)]
pub struct OpenWeatherService {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherService {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url,
            http: Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let api_key = config.effective_api_key(SourceId::OpenWeather, DEFAULT_API_KEY)?;
        let base_url = config.effective_instance(SourceId::OpenWeather, DEFAULT_BASE_URL);
        Ok(Self::new(api_key, base_url))
    }

    async fn fetch_one_call(&self, location: &Location) -> Result<OwOneCallResult, SourceError> {
        let url = format!("{}/3.0/onecall", self.base_url);
        get_json(
            &self.http,
            &url,
            &[
                ("lat", location.latitude.to_string()),
                ("lon", location.longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ],
        )
        .await
    }

    async fn fetch_air_pollution(
        &self,
        location: &Location,
    ) -> Result<OwAirPollutionResult, SourceError> {
        let url = format!("{}/2.5/air_pollution", self.base_url);
        get_json(
            &self.http,
            &url,
            &[
                ("lat", location.latitude.to_string()),
                ("lon", location.longitude.to_string()),
                ("appid", self.api_key.clone()),
            ],
        )
        .await
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherService {
    fn id(&self) -> SourceId {
        SourceId::OpenWeather
    }

    fn supported_features(&self, _location: &Location) -> Vec<SourceFeature> {
        vec![
            SourceFeature::Forecast,
            SourceFeature::Current,
            SourceFeature::Alert,
            SourceFeature::Minutely,
            SourceFeature::AirQuality,
        ]
    }

    async fn fetch(
        &self,
        location: &Location,
        features: &[SourceFeature],
    ) -> Result<WeatherWrapper, SourceError> {
        ensure_supported(&self.supported_features(location), features)?;

        const ONE_CALL_FEATURES: [SourceFeature; 4] = [
            SourceFeature::Forecast,
            SourceFeature::Current,
            SourceFeature::Alert,
            SourceFeature::Minutely,
        ];
        let need_one_call = ONE_CALL_FEATURES.iter().any(|f| is_requested(features, *f));

        let one_call = async {
            if need_one_call {
                Some(self.fetch_one_call(location).await)
            } else {
                None
            }
        };
        let air = async {
            if is_requested(features, SourceFeature::AirQuality) {
                Some(self.fetch_air_pollution(location).await)
            } else {
                None
            }
        };
        let (one_call, air) = tokio::join!(one_call, air);

        let mut failed = HashMap::new();
        // A one-call failure fails every feature that was riding on it.
        let one_call = match one_call {
            Some(Err(err)) => {
                for feature in ONE_CALL_FEATURES {
                    if is_requested(features, feature) {
                        failed.insert(feature, err.clone());
                    }
                }
                None
            }
            Some(Ok(result)) => Some(result),
            None => None,
        };
        let air = settle(air, SourceFeature::AirQuality, &mut failed);

        let mut wrapper = convert(one_call, air, features)?;
        wrapper.failed_features = failed;
        Ok(wrapper)
    }
}

/// Pure mapping from One Call + air pollution payloads into the common
/// wrapper. Only fields for requested features are populated.
pub(crate) fn convert(
    one_call: Option<OwOneCallResult>,
    air: Option<OwAirPollutionResult>,
    features: &[SourceFeature],
) -> Result<WeatherWrapper, SourceError> {
    if is_requested(features, SourceFeature::Forecast)
        && let Some(result) = &one_call
    {
        // Both series missing means the payload is garbage; refuse it so
        // previously cached data survives.
        let daily_empty = result.daily.as_ref().is_none_or(Vec::is_empty);
        let hourly_empty = result.hourly.as_ref().is_none_or(Vec::is_empty);
        if daily_empty && hourly_empty {
            return Err(SourceError::InvalidOrIncompleteData);
        }
    }

    let mut wrapper = WeatherWrapper::default();

    if let Some(result) = one_call {
        if is_requested(features, SourceFeature::Forecast) {
            wrapper.daily_forecast = result
                .daily
                .map(|days| days.iter().map(convert_daily).collect());
            wrapper.hourly_forecast = result
                .hourly
                .map(|hours| hours.iter().map(convert_hourly).collect());
        }
        if is_requested(features, SourceFeature::Current) {
            wrapper.current = result.current.as_ref().map(convert_current);
        }
        if is_requested(features, SourceFeature::Minutely) {
            wrapper.minutely_forecast = result.minutely.map(|m| convert_minutely(&m));
        }
        if is_requested(features, SourceFeature::Alert) {
            wrapper.alert_list = result
                .alerts
                .map(|alerts| Alert::deduplicate(alerts.iter().map(convert_alert).collect()));
        }
    }

    if is_requested(features, SourceFeature::AirQuality) {
        wrapper.air_quality = air.and_then(|result| {
            let components = result.list.into_iter().next()?.components;
            mapper::air_quality(
                components.pm2_5.and_then(|v| PollutantConcentration::micrograms_per_cubic_meter(v).ok()),
                components.pm10.and_then(|v| PollutantConcentration::micrograms_per_cubic_meter(v).ok()),
                components.so2.and_then(|v| PollutantConcentration::micrograms_per_cubic_meter(v).ok()),
                components.no2.and_then(|v| PollutantConcentration::micrograms_per_cubic_meter(v).ok()),
                components.o3.and_then(|v| PollutantConcentration::micrograms_per_cubic_meter(v).ok()),
                components.co.and_then(|v| PollutantConcentration::micrograms_per_cubic_meter(v).ok()),
            )
        });
    }

    Ok(wrapper)
}

fn convert_current(raw: &OwCurrent) -> Current {
    Current {
        weather_text: raw.weather.first().and_then(|w| w.description.clone()),
        weather_code: raw.weather.first().and_then(|w| w.id).and_then(weather_code),
        temperature: mapper::temperature(
            raw.temp.and_then(|v| Temperature::celsius(v).ok()),
            raw.feels_like.and_then(|v| Temperature::celsius(v).ok()),
            None,
            None,
            None,
        ),
        wind: mapper::wind(
            raw.wind_deg,
            raw.wind_speed.and_then(|v| Speed::meters_per_second(v).ok()),
            raw.wind_gust.and_then(|v| Speed::meters_per_second(v).ok()),
        ),
        uv: raw.uvi.map(|index| UV { index: Some(index) }),
        relative_humidity: raw.humidity.and_then(|v| Ratio::percent(v).ok()),
        dew_point: raw.dew_point.and_then(|v| Temperature::celsius(v).ok()),
        pressure: raw.pressure.and_then(|v| Pressure::hectopascals(v).ok()),
        cloud_cover: raw.clouds.and_then(|v| Ratio::percent(v).ok()),
        visibility: raw
            .visibility
            .and_then(|v| Distance::meters(v).ok())
            .and_then(Distance::validate_non_negative),
        ..Default::default()
    }
}

fn convert_daily(raw: &OwDaily) -> Daily {
    let date = DateTime::from_timestamp(raw.dt, 0).unwrap_or_default();
    let day_code = raw.weather.first().and_then(|w| w.id).and_then(weather_code);
    let day_text = raw.weather.first().and_then(|w| w.description.clone());

    Daily {
        date,
        day: Some(HalfDay {
            weather_text: day_text.clone(),
            weather_code: day_code,
            temperature: mapper::temperature(
                raw.temp.as_ref().and_then(|t| t.day).and_then(|v| Temperature::celsius(v).ok()),
                raw.feels_like.as_ref().and_then(|t| t.day).and_then(|v| Temperature::celsius(v).ok()),
                None,
                None,
                None,
            ),
            precipitation: mapper::precipitation(
                raw.rain
                    .map(|r| r + raw.snow.unwrap_or(0.0))
                    .or(raw.snow)
                    .and_then(|v| Precipitation::millimeters(v).ok()),
                None,
                raw.rain.and_then(|v| Precipitation::millimeters(v).ok()),
                raw.snow.and_then(|v| Precipitation::millimeters(v).ok()),
                None,
            ),
            precipitation_probability: mapper::precipitation_probability(
                raw.pop.and_then(|v| Ratio::fraction(v).ok()),
                None,
                None,
                None,
                None,
            ),
            precipitation_duration: None,
            wind: mapper::wind(
                raw.wind_deg,
                raw.wind_speed.and_then(|v| Speed::meters_per_second(v).ok()),
                raw.wind_gust.and_then(|v| Speed::meters_per_second(v).ok()),
            ),
            cloud_cover: raw.clouds.and_then(|v| Ratio::percent(v).ok()),
        }),
        night: Some(HalfDay {
            weather_text: day_text,
            weather_code: day_code,
            temperature: mapper::temperature(
                raw.temp.as_ref().and_then(|t| t.night).and_then(|v| Temperature::celsius(v).ok()),
                raw.feels_like.as_ref().and_then(|t| t.night).and_then(|v| Temperature::celsius(v).ok()),
                None,
                None,
                None,
            ),
            ..Default::default()
        }),
        sun: Some(Astro {
            rise_date: raw.sunrise.and_then(|t| DateTime::from_timestamp(t, 0)),
            set_date: raw.sunset.and_then(|t| DateTime::from_timestamp(t, 0)),
        }),
        moon: Some(Astro {
            rise_date: raw.moonrise.and_then(|t| DateTime::from_timestamp(t, 0)),
            set_date: raw.moonset.and_then(|t| DateTime::from_timestamp(t, 0)),
        }),
        // Upstream reports the lunation fraction [0, 1]; phase angle is
        // that fraction around the full circle.
        moon_phase: raw.moon_phase.map(|phase| MoonPhase {
            angle: Some((phase * 360.0).round() as i32),
        }),
        uv: raw.uvi.map(|index| UV { index: Some(index) }),
        ..Default::default()
    }
}

fn convert_hourly(raw: &OwHourly) -> HourlyWrapper {
    HourlyWrapper {
        date: DateTime::from_timestamp(raw.dt, 0).unwrap_or_default(),
        weather_text: raw.weather.first().and_then(|w| w.description.clone()),
        weather_code: raw.weather.first().and_then(|w| w.id).and_then(weather_code),
        temperature: mapper::temperature(
            raw.temp.and_then(|v| Temperature::celsius(v).ok()),
            raw.feels_like.and_then(|v| Temperature::celsius(v).ok()),
            None,
            None,
            None,
        ),
        precipitation: mapper::precipitation(
            None,
            None,
            raw.rain.as_ref().and_then(|r| r.one_hour).and_then(|v| Precipitation::millimeters(v).ok()),
            raw.snow.as_ref().and_then(|s| s.one_hour).and_then(|v| Precipitation::millimeters(v).ok()),
            None,
        ),
        precipitation_probability: mapper::precipitation_probability(
            raw.pop.and_then(|v| Ratio::fraction(v).ok()),
            None,
            None,
            None,
            None,
        ),
        wind: mapper::wind(
            raw.wind_deg,
            raw.wind_speed.and_then(|v| Speed::meters_per_second(v).ok()),
            raw.wind_gust.and_then(|v| Speed::meters_per_second(v).ok()),
        ),
        uv: raw.uvi.map(|index| UV { index: Some(index) }),
        relative_humidity: raw.humidity.and_then(|v| Ratio::percent(v).ok()),
        dew_point: raw.dew_point.and_then(|v| Temperature::celsius(v).ok()),
        pressure: raw.pressure.and_then(|v| Pressure::hectopascals(v).ok()),
        cloud_cover: raw.clouds.and_then(|v| Ratio::percent(v).ok()),
        visibility: raw
            .visibility
            .and_then(|v| Distance::meters(v).ok())
            .and_then(Distance::validate_non_negative),
        ..Default::default()
    }
}

/// Interval between minutely points is derived from timestamp deltas:
/// the next point for all but the last, the previous point for the last.
pub(crate) fn convert_minutely(raw: &[OwMinutely]) -> Vec<Minutely> {
    raw.iter()
        .enumerate()
        .map(|(i, point)| {
            let minute_interval = if i + 1 < raw.len() {
                (raw[i + 1].dt - point.dt) / 60
            } else if i > 0 {
                (point.dt - raw[i - 1].dt) / 60
            } else {
                1
            };
            Minutely {
                date: DateTime::from_timestamp(point.dt, 0).unwrap_or_default(),
                minute_interval,
                precipitation_intensity: point
                    .precipitation
                    .and_then(|v| PrecipitationIntensity::millimeters_per_hour(v).ok()),
            }
        })
        .collect()
}

fn convert_alert(raw: &OwAlert) -> Alert {
    let severity = AlertSeverity::Unknown;
    let start = raw.start.map(|s| s.to_string()).unwrap_or_default();
    Alert {
        // No native alert id; hash the stable fields so repeated polls of
        // an unchanged alert produce the same id.
        alert_id: synthesized_alert_id(&[
            raw.event.as_deref().unwrap_or_default(),
            &start,
        ]),
        start_date: raw.start.and_then(|t| DateTime::from_timestamp(t, 0)),
        end_date: raw.end.and_then(|t| DateTime::from_timestamp(t, 0)),
        headline: raw.event.clone(),
        description: raw.description.clone(),
        instruction: None,
        source: raw.sender_name.clone(),
        severity,
        color: severity.color(),
    }
}

/// OpenWeather condition ids -> common vocabulary. Unknown ids stay
/// unmapped.
fn weather_code(id: i64) -> Option<WeatherCode> {
    match id {
        200..=202 | 210..=221 | 230..=232 => Some(WeatherCode::Thunderstorm),
        300..=321 | 500..=531 => Some(WeatherCode::Rain),
        600..=602 | 620..=622 => Some(WeatherCode::Snow),
        611..=616 => Some(WeatherCode::Sleet),
        701 | 741 => Some(WeatherCode::Fog),
        711 | 721 | 731 | 751 | 761 | 762 => Some(WeatherCode::Haze),
        771 | 781 => Some(WeatherCode::Wind),
        800 => Some(WeatherCode::Clear),
        801 | 802 => Some(WeatherCode::PartlyCloudy),
        803 | 804 => Some(WeatherCode::Cloudy),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwOneCallResult {
    pub(crate) current: Option<OwCurrent>,
    pub(crate) minutely: Option<Vec<OwMinutely>>,
    pub(crate) hourly: Option<Vec<OwHourly>>,
    pub(crate) daily: Option<Vec<OwDaily>>,
    pub(crate) alerts: Option<Vec<OwAlert>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwWeather {
    pub(crate) id: Option<i64>,
    pub(crate) description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwCurrent {
    pub(crate) temp: Option<f64>,
    pub(crate) feels_like: Option<f64>,
    pub(crate) pressure: Option<f64>,
    pub(crate) humidity: Option<f64>,
    pub(crate) dew_point: Option<f64>,
    pub(crate) uvi: Option<f64>,
    pub(crate) clouds: Option<f64>,
    pub(crate) visibility: Option<f64>,
    pub(crate) wind_speed: Option<f64>,
    pub(crate) wind_deg: Option<f64>,
    pub(crate) wind_gust: Option<f64>,
    #[serde(default)]
    pub(crate) weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwMinutely {
    pub(crate) dt: i64,
    pub(crate) precipitation: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwPrecipitationVolume {
    #[serde(rename = "1h")]
    pub(crate) one_hour: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwHourly {
    pub(crate) dt: i64,
    pub(crate) temp: Option<f64>,
    pub(crate) feels_like: Option<f64>,
    pub(crate) pressure: Option<f64>,
    pub(crate) humidity: Option<f64>,
    pub(crate) dew_point: Option<f64>,
    pub(crate) uvi: Option<f64>,
    pub(crate) clouds: Option<f64>,
    pub(crate) visibility: Option<f64>,
    pub(crate) wind_speed: Option<f64>,
    pub(crate) wind_deg: Option<f64>,
    pub(crate) wind_gust: Option<f64>,
    pub(crate) pop: Option<f64>,
    pub(crate) rain: Option<OwPrecipitationVolume>,
    pub(crate) snow: Option<OwPrecipitationVolume>,
    #[serde(default)]
    pub(crate) weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwDailyTemperature {
    pub(crate) day: Option<f64>,
    pub(crate) night: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwDaily {
    pub(crate) dt: i64,
    pub(crate) sunrise: Option<i64>,
    pub(crate) sunset: Option<i64>,
    pub(crate) moonrise: Option<i64>,
    pub(crate) moonset: Option<i64>,
    pub(crate) moon_phase: Option<f64>,
    pub(crate) temp: Option<OwDailyTemperature>,
    pub(crate) feels_like: Option<OwDailyTemperature>,
    pub(crate) wind_speed: Option<f64>,
    pub(crate) wind_deg: Option<f64>,
    pub(crate) wind_gust: Option<f64>,
    pub(crate) clouds: Option<f64>,
    pub(crate) pop: Option<f64>,
    pub(crate) rain: Option<f64>,
    pub(crate) snow: Option<f64>,
    pub(crate) uvi: Option<f64>,
    #[serde(default)]
    pub(crate) weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwAlert {
    pub(crate) sender_name: Option<String>,
    pub(crate) event: Option<String>,
    pub(crate) start: Option<i64>,
    pub(crate) end: Option<i64>,
    pub(crate) description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwAirPollutionResult {
    #[serde(default)]
    pub(crate) list: Vec<OwAirPollutionEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwAirPollutionEntry {
    pub(crate) components: OwAirComponents,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwAirComponents {
    pub(crate) co: Option<f64>,
    pub(crate) no2: Option<f64>,
    pub(crate) o3: Option<f64>,
    pub(crate) so2: Option<f64>,
    pub(crate) pm2_5: Option<f64>,
    pub(crate) pm10: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::TemperatureUnit;

    fn one_call(json: &str) -> OwOneCallResult {
        serde_json::from_str(json).expect("test payload must parse")
    }

    #[test]
    fn garbage_payload_is_rejected() {
        let result = one_call(r#"{"daily": [], "hourly": []}"#);
        let err = convert(Some(result), None, &[SourceFeature::Forecast]).unwrap_err();
        assert_eq!(err, SourceError::InvalidOrIncompleteData);

        let result = one_call(r#"{}"#);
        let err = convert(Some(result), None, &[SourceFeature::Forecast]).unwrap_err();
        assert_eq!(err, SourceError::InvalidOrIncompleteData);
    }

    #[test]
    fn hourly_only_payload_is_accepted() {
        let result = one_call(
            r#"{"hourly": [{"dt": 1700000000, "temp": 4.2, "weather": [{"id": 800, "description": "clear sky"}]}]}"#,
        );
        let wrapper = convert(Some(result), None, &[SourceFeature::Forecast]).unwrap();
        let hourly = wrapper.hourly_forecast.unwrap();
        assert_eq!(hourly.len(), 1);
        assert_eq!(hourly[0].weather_code, Some(WeatherCode::Clear));
        let temp = hourly[0].temperature.as_ref().unwrap().temperature.unwrap();
        assert!((temp.to_unit(TemperatureUnit::Celsius) - 4.2).abs() < 1e-9);
    }

    #[test]
    fn absent_alerts_stay_null_but_empty_alerts_stay_empty() {
        // Payload without the alerts key: the source returned nothing.
        let result = one_call(r#"{"hourly": [{"dt": 1700000000}]}"#);
        let wrapper =
            convert(Some(result), None, &[SourceFeature::Forecast, SourceFeature::Alert]).unwrap();
        assert!(wrapper.alert_list.is_none());

        // Explicit empty list: the source confirmed zero alerts.
        let result = one_call(r#"{"hourly": [{"dt": 1700000000}], "alerts": []}"#);
        let wrapper =
            convert(Some(result), None, &[SourceFeature::Forecast, SourceFeature::Alert]).unwrap();
        assert_eq!(wrapper.alert_list.unwrap().len(), 0);
    }

    #[test]
    fn unrequested_features_stay_null() {
        let result = one_call(
            r#"{"hourly": [{"dt": 1700000000}], "current": {"temp": 3.0}, "alerts": [{"event": "storm"}]}"#,
        );
        let wrapper = convert(Some(result), None, &[SourceFeature::Forecast]).unwrap();
        assert!(wrapper.current.is_none());
        assert!(wrapper.alert_list.is_none());
        assert!(wrapper.minutely_forecast.is_none());
    }

    #[test]
    fn minutely_intervals_derive_from_timestamp_deltas() {
        let points: Vec<OwMinutely> = serde_json::from_str(
            r#"[{"dt": 0, "precipitation": 0.0},
                {"dt": 300, "precipitation": 1.2},
                {"dt": 900, "precipitation": 0.4}]"#,
        )
        .unwrap();
        let minutely = convert_minutely(&points);
        assert_eq!(minutely[0].minute_interval, 5);
        assert_eq!(minutely[1].minute_interval, 10);
        // Last point derives backward from its predecessor.
        assert_eq!(minutely[2].minute_interval, 10);
    }

    #[test]
    fn alert_ids_are_stable_across_polls() {
        let raw: OwAlert = serde_json::from_str(
            r#"{"event": "Gale warning", "start": 1700000000, "description": "strong winds"}"#,
        )
        .unwrap();
        let a = convert_alert(&raw);
        let b = convert_alert(&raw);
        assert_eq!(a.alert_id, b.alert_id);
    }

    #[test]
    fn unknown_condition_code_maps_to_none() {
        assert_eq!(weather_code(999), None);
        assert_eq!(weather_code(803), Some(WeatherCode::Cloudy));
        assert_eq!(weather_code(615), Some(WeatherCode::Sleet));
    }

    mod service {
        use super::*;
        use chrono::FixedOffset;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        #[tokio::test]
        async fn partial_batch_failure_keeps_sibling_features() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/3.0/onecall"))
                .respond_with(ResponseTemplate::new(200).set_body_raw(
                    r#"{"hourly": [{"dt": 1700000000, "temp": 4.2}], "daily": [{"dt": 1700000000}]}"#,
                    "application/json",
                ))
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/2.5/air_pollution"))
                .respond_with(ResponseTemplate::new(500))
                .mount(&server)
                .await;

            let service = OpenWeatherService::new("KEY".into(), server.uri());
            let location = Location::new(48.8, 2.3, FixedOffset::east_opt(3600).unwrap());
            let wrapper = service
                .fetch(
                    &location,
                    &[SourceFeature::Forecast, SourceFeature::AirQuality],
                )
                .await
                .unwrap();

            assert!(wrapper.hourly_forecast.is_some());
            assert!(wrapper.daily_forecast.is_some());
            assert!(wrapper.air_quality.is_none());
            assert_eq!(wrapper.failed_features.len(), 1);
            assert!(wrapper.failed_features.contains_key(&SourceFeature::AirQuality));
        }

        #[tokio::test]
        async fn unsupported_feature_is_rejected_before_any_request() {
            let service = OpenWeatherService::new("KEY".into(), "http://localhost:9".into());
            let location = Location::new(0.0, 0.0, FixedOffset::east_opt(0).unwrap());
            let err = service
                .fetch(&location, &[SourceFeature::Normals])
                .await
                .unwrap_err();
            assert_eq!(err, SourceError::UnsupportedFeature(SourceFeature::Normals));
        }
    }
}
