//! Weather sources: the capability trait, the source catalog, and one
//! converter + orchestrator module per upstream provider.
//!
//! Source quirks (day/night realignment, alert id synthesis, condition
//! code tables) stay local to each module; only the orchestration contract
//! is shared: per-feature requests run concurrently, each failure is
//! captured into `failed_features` without cancelling siblings, and the
//! merge step waits for all requested features.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;

use crate::config::Config;
use crate::error::SourceError;
use crate::location::Location;
use crate::model::{SecondaryWeatherWrapper, WeatherWrapper};

pub mod bmd;
pub mod bright_sky;
pub mod eccc;
pub mod here;
pub mod met_ie;
pub mod open_weather;
pub mod pirate_weather;
pub mod qweather;
pub mod weatherbit;
pub mod wmo_severe;

/// One independently requestable weather data category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceFeature {
    Forecast,
    Current,
    Alert,
    AirQuality,
    Pollen,
    Minutely,
    Normals,
}

impl std::fmt::Display for SourceFeature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SourceFeature::Forecast => "forecast",
            SourceFeature::Current => "current",
            SourceFeature::Alert => "alert",
            SourceFeature::AirQuality => "air-quality",
            SourceFeature::Pollen => "pollen",
            SourceFeature::Minutely => "minutely",
            SourceFeature::Normals => "normals",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceId {
    OpenWeather,
    BrightSky,
    Eccc,
    Here,
    PirateWeather,
    MetIe,
    Weatherbit,
    QWeather,
    Bmd,
    WmoSevereWeather,
}

impl SourceId {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::OpenWeather => "openweather",
            SourceId::BrightSky => "brightsky",
            SourceId::Eccc => "eccc",
            SourceId::Here => "here",
            SourceId::PirateWeather => "pirateweather",
            SourceId::MetIe => "metie",
            SourceId::Weatherbit => "weatherbit",
            SourceId::QWeather => "qweather",
            SourceId::Bmd => "bmd",
            SourceId::WmoSevereWeather => "wmosevereweather",
        }
    }

    /// Secondary sources can only supplement a primary source's features
    /// (alerts, air quality, normals); they never serve a main forecast.
    pub fn is_secondary_only(&self) -> bool {
        matches!(self, SourceId::WmoSevereWeather)
    }

    pub const fn all() -> &'static [SourceId] {
        &[
            SourceId::OpenWeather,
            SourceId::BrightSky,
            SourceId::Eccc,
            SourceId::Here,
            SourceId::PirateWeather,
            SourceId::MetIe,
            SourceId::Weatherbit,
            SourceId::QWeather,
            SourceId::Bmd,
            SourceId::WmoSevereWeather,
        ]
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SourceId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        SourceId::all()
            .iter()
            .find(|id| id.as_str() == lower)
            .copied()
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown source '{value}'. Supported sources: {}.",
                    SourceId::all()
                        .iter()
                        .map(|id| id.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
    }
}

/// A primary weather source.
///
/// `fetch` issues one concurrent request per requested feature and merges
/// the settled results into a single wrapper. Per-feature failures land in
/// `failed_features`; only structural failures (missing credentials,
/// unsupported feature, garbage main forecast) fail the whole call.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    fn id(&self) -> SourceId;

    /// Features this source supports at the given location. Some sources
    /// are country-restricted and report fewer (or no) features elsewhere.
    fn supported_features(&self, location: &Location) -> Vec<SourceFeature>;

    async fn fetch(
        &self,
        location: &Location,
        features: &[SourceFeature],
    ) -> Result<WeatherWrapper, SourceError>;
}

/// A secondary source supplementing specific features of a primary one.
#[async_trait]
pub trait SecondaryWeatherSource: Send + Sync + Debug {
    fn id(&self) -> SourceId;

    fn supported_features(&self, location: &Location) -> Vec<SourceFeature>;

    async fn fetch(
        &self,
        location: &Location,
        features: &[SourceFeature],
    ) -> Result<SecondaryWeatherWrapper, SourceError>;
}

/// Construct a primary source from config and explicit SourceId.
/// Secondary-only ids are rejected: they cannot serve a main forecast.
pub fn source_from_config(
    id: SourceId,
    config: &Config,
) -> Result<Box<dyn WeatherSource>, SourceError> {
    let boxed: Box<dyn WeatherSource> = match id {
        SourceId::OpenWeather => Box::new(open_weather::OpenWeatherService::from_config(config)?),
        SourceId::BrightSky => Box::new(bright_sky::BrightSkyService::from_config(config)),
        SourceId::Eccc => Box::new(eccc::EcccService::from_config(config)),
        SourceId::Here => Box::new(here::HereService::from_config(config)?),
        SourceId::PirateWeather => {
            Box::new(pirate_weather::PirateWeatherService::from_config(config)?)
        }
        SourceId::MetIe => Box::new(met_ie::MetIeService::from_config(config)),
        SourceId::Weatherbit => Box::new(weatherbit::WeatherbitService::from_config(config)?),
        SourceId::QWeather => Box::new(qweather::QWeatherService::from_config(config)?),
        SourceId::Bmd => Box::new(bmd::BmdService::from_config(config)),
        SourceId::WmoSevereWeather => {
            return Err(SourceError::UnsupportedFeature(SourceFeature::Forecast));
        }
    };

    Ok(boxed)
}

/// Construct a secondary source from config.
pub fn secondary_source_from_config(
    id: SourceId,
    config: &Config,
) -> Result<Box<dyn SecondaryWeatherSource>, SourceError> {
    match id {
        SourceId::WmoSevereWeather => Ok(Box::new(
            wmo_severe::WmoSevereWeatherService::from_config(config),
        )),
        other => Err(SourceError::Parsing(format!(
            "{other} is not a secondary source"
        ))),
    }
}

pub(crate) fn is_requested(features: &[SourceFeature], feature: SourceFeature) -> bool {
    features.contains(&feature)
}

/// Reject the call when any requested feature is unsupported at this
/// location; requesting one is a caller error, not a silent no-op.
pub(crate) fn ensure_supported(
    supported: &[SourceFeature],
    requested: &[SourceFeature],
) -> Result<(), SourceError> {
    match requested.iter().find(|f| !supported.contains(f)) {
        Some(&feature) => Err(SourceError::UnsupportedFeature(feature)),
        None => Ok(()),
    }
}

/// Settle one per-feature slot: `None` means the feature was not
/// requested; an error is recorded against the feature and converted to
/// absence so sibling features still merge.
pub(crate) fn settle<T>(
    slot: Option<Result<T, SourceError>>,
    feature: SourceFeature,
    failed: &mut HashMap<SourceFeature, SourceError>,
) -> Option<T> {
    match slot {
        None => None,
        Some(Ok(value)) => Some(value),
        Some(Err(err)) => {
            tracing::debug!(feature = %feature, error = %err, "feature request failed");
            failed.insert(feature, err);
            None
        }
    }
}

/// GET + status mapping + JSON decode shared by all source modules.
/// 400/404 map to invalid-location, 401/403 to missing credentials.
pub(crate) async fn get_json<T: serde::de::DeserializeOwned>(
    http: &Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<T, SourceError> {
    let res = http.get(url).query(query).send().await?;
    let status = res.status();
    let body = res.text().await?;

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SourceError::ApiKeyMissing),
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => Err(SourceError::InvalidLocation),
        s if !s.is_success() => Err(SourceError::Network(format!(
            "request failed with status {s}: {}",
            truncate_body(&body)
        ))),
        _ => serde_json::from_str(&body).map_err(|e| SourceError::Parsing(e.to_string())),
    }
}

/// Parse an RFC 3339 timestamp into UTC.
pub(crate) fn rfc3339_to_utc(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|d| d.with_timezone(&chrono::Utc))
}

/// Interpret a bare `YYYY-MM-DD` as midnight in the location's timezone.
pub(crate) fn local_date_to_utc(
    date: &str,
    timezone: chrono::FixedOffset,
) -> Option<chrono::DateTime<chrono::Utc>> {
    use chrono::TimeZone;
    let naive = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)?;
    timezone
        .from_local_datetime(&naive)
        .single()
        .map(|d| d.with_timezone(&chrono::Utc))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        format!("{}...", &body[..MAX])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_id_as_str_roundtrip() {
        for id in SourceId::all() {
            let parsed = SourceId::try_from(id.as_str()).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn unknown_source_error() {
        let err = SourceId::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown source"));
    }

    #[test]
    fn settle_records_failures_per_feature() {
        let mut failed = HashMap::new();
        let ok: Option<Result<u32, SourceError>> = Some(Ok(5));
        let err: Option<Result<u32, SourceError>> =
            Some(Err(SourceError::Network("boom".into())));
        let skipped: Option<Result<u32, SourceError>> = None;

        assert_eq!(settle(ok, SourceFeature::Forecast, &mut failed), Some(5));
        assert_eq!(settle(err, SourceFeature::Alert, &mut failed), None);
        assert_eq!(settle(skipped, SourceFeature::Minutely, &mut failed), None);

        assert_eq!(failed.len(), 1);
        assert!(failed.contains_key(&SourceFeature::Alert));
    }

    #[test]
    fn unsupported_feature_is_a_caller_error() {
        let supported = [SourceFeature::Forecast, SourceFeature::Current];
        let err = ensure_supported(&supported, &[SourceFeature::Forecast, SourceFeature::Alert])
            .unwrap_err();
        assert_eq!(err, SourceError::UnsupportedFeature(SourceFeature::Alert));
    }
}
