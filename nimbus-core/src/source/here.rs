//! HERE Destination Weather. Key required; daily forecast and current
//! observation.
//!
//! The daily feed reports one low temperature per record, valid for the
//! night leading into the NEXT day, so day N's night part is built from
//! record N + 1.

use async_trait::async_trait;
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
use crate::model::weather::{Current, Daily, HalfDay, UV};
use crate::model::{WeatherCode, WeatherWrapper};
use crate::units::{Distance, Pressure, Ratio, Speed, Temperature};

const DEFAULT_BASE_URL: &str = "https://weather.hereapi.com/v3";
const DEFAULT_API_KEY: Option<&str> = None;

#[derive(Debug, Clone)]
pub struct HereService {
    api_key: String,
    base_url: String,
    http: Client,
}

impl HereService {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url,
            http: Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let api_key = config.effective_api_key(SourceId::Here, DEFAULT_API_KEY)?;
        let base_url = config.effective_instance(SourceId::Here, DEFAULT_BASE_URL);
        Ok(Self::new(api_key, base_url))
    }

    async fn fetch_report(
        &self,
        location: &Location,
        products: &str,
    ) -> Result<HereReport, SourceError> {
        let url = format!("{}/report", self.base_url);
        get_json(
            &self.http,
            &url,
            &[
                ("products", products.to_string()),
                ("location", format!("{},{}", location.latitude, location.longitude)),
                ("apiKey", self.api_key.clone()),
                ("units", "metric".to_string()),
            ],
        )
        .await
    }
}

#[async_trait]
impl WeatherSource for HereService {
    fn id(&self) -> SourceId {
        SourceId::Here
    }

    fn supported_features(&self, _location: &Location) -> Vec<SourceFeature> {
        vec![SourceFeature::Forecast, SourceFeature::Current]
    }

    async fn fetch(
        &self,
        location: &Location,
        features: &[SourceFeature],
    ) -> Result<WeatherWrapper, SourceError> {
        ensure_supported(&self.supported_features(location), features)?;

        let forecast = async {
            if is_requested(features, SourceFeature::Forecast) {
                Some(self.fetch_report(location, "forecast7days").await)
            } else {
                None
            }
        };
        let observation = async {
            if is_requested(features, SourceFeature::Current) {
                Some(self.fetch_report(location, "observation").await)
            } else {
                None
            }
        };
        let (forecast, observation) = tokio::join!(forecast, observation);

        let mut failed = HashMap::new();
        let forecast = settle(forecast, SourceFeature::Forecast, &mut failed);
        let observation = settle(observation, SourceFeature::Current, &mut failed);

        let mut wrapper = convert(forecast, observation)?;
        wrapper.failed_features = failed;
        Ok(wrapper)
    }
}

pub(crate) fn convert(
    forecast: Option<HereReport>,
    observation: Option<HereReport>,
) -> Result<WeatherWrapper, SourceError> {
    let daily_records = forecast.as_ref().map(|report| {
        report
            .places
            .iter()
            .flat_map(|p| &p.daily_forecasts)
            .flat_map(|block| &block.forecasts)
            .collect::<Vec<_>>()
    });

    // Daily-only source; an empty daily series is a garbage payload.
    if let Some(records) = &daily_records
        && records.is_empty()
    {
        return Err(SourceError::InvalidOrIncompleteData);
    }

    Ok(WeatherWrapper {
        daily_forecast: daily_records.map(|records| convert_daily(&records)),
        current: observation.and_then(|report| {
            report
                .places
                .into_iter()
                .flat_map(|p| p.observations)
                .next()
                .map(|o| convert_current(&o))
        }),
        ..Default::default()
    })
}

pub(crate) fn convert_daily(records: &[&HereForecast]) -> Vec<Daily> {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| Daily {
            date: record
                .time
                .as_deref()
                .and_then(rfc3339_to_utc)
                .unwrap_or_default(),
            day: Some(HalfDay {
                weather_text: record.description.clone(),
                weather_code: record.icon_name.as_deref().and_then(weather_code),
                temperature: mapper::temperature(
                    record.high_temperature.and_then(|v| Temperature::celsius(v).ok()),
                    None,
                    None,
                    None,
                    None,
                ),
                precipitation_probability: mapper::precipitation_probability(
                    record
                        .precipitation_probability
                        .and_then(|v| Ratio::percent(v).ok()),
                    None,
                    None,
                    None,
                    None,
                ),
                wind: mapper::wind(
                    record.wind_direction,
                    record.wind_speed.and_then(|v| Speed::kilometers_per_hour(v).ok()),
                    None,
                ),
                ..Default::default()
            }),
            night: Some(HalfDay {
                temperature: mapper::temperature(
                    records
                        .get(i + 1)
                        .and_then(|next| next.low_temperature)
                        .and_then(|v| Temperature::celsius(v).ok()),
                    None,
                    None,
                    None,
                    None,
                ),
                ..Default::default()
            }),
            uv: record.uv_index.map(|index| UV { index: Some(index) }),
            ..Default::default()
        })
        .collect()
}

fn convert_current(raw: &HereObservation) -> Current {
    Current {
        weather_text: raw.description.clone(),
        weather_code: raw.icon_name.as_deref().and_then(weather_code),
        temperature: mapper::temperature(
            raw.temperature.and_then(|v| Temperature::celsius(v).ok()),
            raw.comfort
                .as_deref()
                .and_then(|v| v.parse().ok())
                .and_then(|v| Temperature::celsius(v).ok()),
            None,
            None,
            None,
        ),
        wind: mapper::wind(
            raw.wind_direction,
            raw.wind_speed.and_then(|v| Speed::kilometers_per_hour(v).ok()),
            None,
        ),
        relative_humidity: raw.humidity.and_then(|v| Ratio::percent(v).ok()),
        dew_point: raw.dew_point.and_then(|v| Temperature::celsius(v).ok()),
        pressure: raw.barometer_pressure.and_then(|v| Pressure::hectopascals(v).ok()),
        visibility: raw
            .visibility
            .and_then(|v| Distance::kilometers(v).ok())
            .and_then(Distance::validate_non_negative),
        ..Default::default()
    }
}

fn weather_code(icon: &str) -> Option<WeatherCode> {
    match icon {
        "sunny" | "clear" | "mostly_sunny" => Some(WeatherCode::Clear),
        "partly_cloudy" | "passing_clouds" | "more_sun_than_clouds"
        | "scattered_clouds" | "decreasing_cloudiness" | "increasing_cloudiness" => {
            Some(WeatherCode::PartlyCloudy)
        }
        "cloudy" | "overcast" | "mostly_cloudy" | "broken_clouds" => Some(WeatherCode::Cloudy),
        "fog" | "dense_fog" | "early_fog" | "low_clouds" => Some(WeatherCode::Fog),
        "haze" | "smoke" | "dust" | "sandstorm" => Some(WeatherCode::Haze),
        "rain" | "drizzle" | "light_rain" | "heavy_rain" | "rain_showers" | "showers" => {
            Some(WeatherCode::Rain)
        }
        "sleet" | "freezing_rain" | "mixture_of_snow_and_rain" | "ice" => Some(WeatherCode::Sleet),
        "snow" | "light_snow" | "heavy_snow" | "snow_showers" | "snowstorm" | "flurries" => {
            Some(WeatherCode::Snow)
        }
        "hail" => Some(WeatherCode::Hail),
        "thunderstorms" | "severe_thunderstorms" | "isolated_tstorms"
        | "scattered_tstorms" | "tstorms" => Some(WeatherCode::Thunderstorm),
        "windy" | "squalls" => Some(WeatherCode::Wind),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct HereReport {
    #[serde(default)]
    pub(crate) places: Vec<HerePlace>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HerePlace {
    #[serde(rename = "dailyForecasts", default)]
    pub(crate) daily_forecasts: Vec<HereDailyBlock>,
    #[serde(default)]
    pub(crate) observations: Vec<HereObservation>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HereDailyBlock {
    #[serde(default)]
    pub(crate) forecasts: Vec<HereForecast>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HereForecast {
    pub(crate) time: Option<String>,
    pub(crate) description: Option<String>,
    #[serde(rename = "iconName")]
    pub(crate) icon_name: Option<String>,
    #[serde(rename = "highTemperature")]
    pub(crate) high_temperature: Option<f64>,
    #[serde(rename = "lowTemperature")]
    pub(crate) low_temperature: Option<f64>,
    #[serde(rename = "precipitationProbability")]
    pub(crate) precipitation_probability: Option<f64>,
    #[serde(rename = "windSpeed")]
    pub(crate) wind_speed: Option<f64>,
    #[serde(rename = "windDirection")]
    pub(crate) wind_direction: Option<f64>,
    #[serde(rename = "uvIndex")]
    pub(crate) uv_index: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HereObservation {
    pub(crate) description: Option<String>,
    #[serde(rename = "iconName")]
    pub(crate) icon_name: Option<String>,
    pub(crate) temperature: Option<f64>,
    /// Feels-like figure, shipped as a string.
    pub(crate) comfort: Option<String>,
    pub(crate) humidity: Option<f64>,
    #[serde(rename = "dewPoint")]
    pub(crate) dew_point: Option<f64>,
    #[serde(rename = "barometerPressure")]
    pub(crate) barometer_pressure: Option<f64>,
    pub(crate) visibility: Option<f64>,
    #[serde(rename = "windSpeed")]
    pub(crate) wind_speed: Option<f64>,
    #[serde(rename = "windDirection")]
    pub(crate) wind_direction: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::TemperatureUnit;

    fn report(json: &str) -> HereReport {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn empty_daily_forecast_is_rejected() {
        let forecast = report(r#"{"places": [{"dailyForecasts": [{"forecasts": []}]}]}"#);
        let err = convert(Some(forecast), None).unwrap_err();
        assert_eq!(err, SourceError::InvalidOrIncompleteData);
    }

    #[test]
    fn night_low_comes_from_the_next_record() {
        let forecast = report(
            r#"{"places": [{"dailyForecasts": [{"forecasts": [
                 {"time": "2024-06-01T00:00:00+00:00", "highTemperature": 22.0, "lowTemperature": 12.0},
                 {"time": "2024-06-02T00:00:00+00:00", "highTemperature": 24.0, "lowTemperature": 14.0}
               ]}]}]}"#,
        );
        let wrapper = convert(Some(forecast), None).unwrap();
        let days = wrapper.daily_forecast.unwrap();
        assert_eq!(days.len(), 2);

        let first_night = days[0].night.as_ref().unwrap().temperature.as_ref().unwrap();
        assert_eq!(
            first_night.temperature.unwrap().to_unit(TemperatureUnit::Celsius),
            14.0
        );
        // The last record has no successor, so its night stays empty.
        assert!(days[1].night.as_ref().unwrap().temperature.is_none());
    }

    #[test]
    fn observation_maps_feels_like_from_comfort_string() {
        let observation = report(
            r#"{"places": [{"observations": [
                 {"description": "Sunny", "iconName": "sunny",
                  "temperature": 19.0, "comfort": "17.5"}]}]}"#,
        );
        let wrapper = convert(None, Some(observation)).unwrap();
        let current = wrapper.current.unwrap();
        assert_eq!(current.weather_code, Some(WeatherCode::Clear));
        let t = current.temperature.unwrap();
        assert_eq!(t.feels_like().unwrap().to_unit(TemperatureUnit::Celsius), 17.5);
    }

    #[test]
    fn icon_vocabulary_maps_to_common_codes() {
        assert_eq!(weather_code("scattered_tstorms"), Some(WeatherCode::Thunderstorm));
        assert_eq!(weather_code("mixture_of_snow_and_rain"), Some(WeatherCode::Sleet));
        assert_eq!(weather_code("no_such_icon"), None);
    }
}
