//! WMO Severe Weather Information Centre. Key-free, alerts only; used as
//! a secondary source supplementing whichever primary serves the
//! forecast.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

use super::{
    SecondaryWeatherSource, SourceFeature, SourceId, ensure_supported, get_json, rfc3339_to_utc,
};
use crate::config::Config;
use crate::error::SourceError;
use crate::location::Location;
use crate::model::{Alert, AlertSeverity, SecondaryWeatherWrapper};

const DEFAULT_BASE_URL: &str = "https://severeweather.wmo.int";

#[derive(Debug, Clone)]
pub struct WmoSevereWeatherService {
    base_url: String,
    http: Client,
}

impl WmoSevereWeatherService {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            http: Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.effective_instance(SourceId::WmoSevereWeather, DEFAULT_BASE_URL))
    }

    async fn fetch_alerts(&self, location: &Location) -> Result<WmoAlertsResult, SourceError> {
        let url = format!("{}/json/alerts.json", self.base_url);
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
impl SecondaryWeatherSource for WmoSevereWeatherService {
    fn id(&self) -> SourceId {
        SourceId::WmoSevereWeather
    }

    fn supported_features(&self, _location: &Location) -> Vec<SourceFeature> {
        vec![SourceFeature::Alert]
    }

    async fn fetch(
        &self,
        location: &Location,
        features: &[SourceFeature],
    ) -> Result<SecondaryWeatherWrapper, SourceError> {
        ensure_supported(&self.supported_features(location), features)?;

        let alerts = match self.fetch_alerts(location).await {
            Ok(alerts) => alerts,
            Err(err) => {
                return Ok(SecondaryWeatherWrapper {
                    failed_features: HashMap::from([(SourceFeature::Alert, err)]),
                    ..Default::default()
                });
            }
        };

        Ok(convert(Some(alerts)))
    }
}

pub(crate) fn convert(alerts: Option<WmoAlertsResult>) -> SecondaryWeatherWrapper {
    SecondaryWeatherWrapper {
        alert_list: alerts
            .map(|r| Alert::deduplicate(r.alerts.iter().map(convert_alert).collect())),
        ..Default::default()
    }
}

fn convert_alert(raw: &WmoAlert) -> Alert {
    let severity = match raw.severity.as_deref() {
        Some("Minor") => AlertSeverity::Minor,
        Some("Moderate") => AlertSeverity::Moderate,
        Some("Severe") => AlertSeverity::Severe,
        Some("Extreme") => AlertSeverity::Extreme,
        _ => AlertSeverity::Unknown,
    };
    Alert {
        alert_id: raw.identifier.clone().unwrap_or_default(),
        start_date: raw.onset.as_deref().and_then(rfc3339_to_utc),
        end_date: raw.expires.as_deref().and_then(rfc3339_to_utc),
        headline: raw.headline.clone().or_else(|| raw.event.clone()),
        description: raw.description.clone(),
        instruction: raw.instruction.clone(),
        source: raw.sender.clone(),
        severity,
        // Issuing authorities ship their own display color; the severity
        // fallback applies only when they don't.
        color: raw
            .color
            .as_deref()
            .and_then(parse_hex_color)
            .unwrap_or_else(|| severity.color()),
    }
}

/// Parse "#RRGGBB" (or bare "RRGGBB") into opaque ARGB.
fn parse_hex_color(hex: &str) -> Option<u32> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 {
        return None;
    }
    u32::from_str_radix(digits, 16).ok().map(|rgb| 0xFF00_0000 | rgb)
}

#[derive(Debug, Deserialize)]
pub(crate) struct WmoAlertsResult {
    #[serde(default)]
    pub(crate) alerts: Vec<WmoAlert>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WmoAlert {
    pub(crate) identifier: Option<String>,
    pub(crate) event: Option<String>,
    pub(crate) headline: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) instruction: Option<String>,
    pub(crate) severity: Option<String>,
    pub(crate) color: Option<String>,
    pub(crate) onset: Option<String>,
    pub(crate) expires: Option<String>,
    pub(crate) sender: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_color_wins_over_severity_fallback() {
        let alerts: WmoAlertsResult = serde_json::from_str(
            r##"{"alerts": [
                 {"identifier": "WMO-1", "severity": "Severe", "color": "#FF5733"},
                 {"identifier": "WMO-2", "severity": "Severe"}]}"##,
        )
        .unwrap();
        let wrapper = convert(Some(alerts));
        let list = wrapper.alert_list.unwrap();
        assert_eq!(list[0].color, 0xFFFF5733);
        assert_eq!(list[1].color, AlertSeverity::Severe.color());
    }

    #[test]
    fn malformed_colors_fall_back() {
        assert_eq!(parse_hex_color("#F573"), None);
        assert_eq!(parse_hex_color("ZZZZZZ"), None);
        assert_eq!(parse_hex_color("00FF00"), Some(0xFF00FF00));
    }

    #[test]
    fn event_substitutes_for_missing_headline() {
        let alerts: WmoAlertsResult = serde_json::from_str(
            r#"{"alerts": [{"identifier": "WMO-3", "event": "Tropical cyclone"}]}"#,
        )
        .unwrap();
        let wrapper = convert(Some(alerts));
        let list = wrapper.alert_list.unwrap();
        assert_eq!(list[0].headline.as_deref(), Some("Tropical cyclone"));
        assert_eq!(list[0].severity, AlertSeverity::Unknown);
    }
}
