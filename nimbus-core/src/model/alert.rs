use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::hash::{DefaultHasher, Hash, Hasher};

/// Severe weather notice.
///
/// `alert_id` must be stable across polls: the same logical alert fetched
/// twice resolves to the same id so duplicate notifications are suppressed.
/// Sources without a native id synthesize one via [`synthesized_alert_id`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub alert_id: String,
    pub start_date: Option<DateTime<Utc>>,
    /// `None` means the alert is in force indefinitely.
    pub end_date: Option<DateTime<Utc>>,
    pub headline: Option<String>,
    pub description: Option<String>,
    pub instruction: Option<String>,
    /// Issuing authority, when the source names one.
    pub source: Option<String>,
    pub severity: AlertSeverity,
    /// ARGB display color: source-supplied when available, otherwise
    /// derived deterministically from the severity.
    pub color: u32,
}

impl Alert {
    /// Drop alerts that appear in overlapping upstream lists (e.g. both
    /// warnings and watches), keyed by (description, start, end).
    pub fn deduplicate(alerts: Vec<Alert>) -> Vec<Alert> {
        let mut seen: Vec<(Option<String>, Option<DateTime<Utc>>, Option<DateTime<Utc>>)> =
            Vec::new();
        alerts
            .into_iter()
            .filter(|alert| {
                let key = (alert.description.clone(), alert.start_date, alert.end_date);
                if seen.contains(&key) {
                    false
                } else {
                    seen.push(key);
                    true
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AlertSeverity {
    Unknown,
    Minor,
    Moderate,
    Severe,
    Extreme,
}

impl AlertSeverity {
    /// Deterministic fallback color when the source supplies none.
    pub fn color(self) -> u32 {
        match self {
            AlertSeverity::Extreme => 0xFFD32F2F,
            AlertSeverity::Severe => 0xFFF57C00,
            AlertSeverity::Moderate => 0xFFFBC02D,
            AlertSeverity::Minor => 0xFF388E3C,
            AlertSeverity::Unknown => 0xFF757575,
        }
    }
}

/// Deterministic id from stable alert fields (title/description, severity,
/// start time). SipHash with zeroed keys, so repeated polls of an
/// unchanged alert hash identically.
pub fn synthesized_alert_id(fields: &[&str]) -> String {
    let mut hasher = DefaultHasher::new();
    for field in fields {
        field.hash(&mut hasher);
    }
    format!("{:016x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert(description: &str, start: Option<i64>) -> Alert {
        Alert {
            alert_id: synthesized_alert_id(&[description]),
            start_date: start.and_then(|s| DateTime::from_timestamp(s, 0)),
            end_date: None,
            headline: Some(description.to_string()),
            description: Some(description.to_string()),
            instruction: None,
            source: None,
            severity: AlertSeverity::Moderate,
            color: AlertSeverity::Moderate.color(),
        }
    }

    #[test]
    fn synthesized_ids_are_stable() {
        let a = synthesized_alert_id(&["Wind warning", "severe", "1700000000"]);
        let b = synthesized_alert_id(&["Wind warning", "severe", "1700000000"]);
        assert_eq!(a, b);
        let c = synthesized_alert_id(&["Wind warning", "severe", "1700000001"]);
        assert_ne!(a, c);
    }

    #[test]
    fn duplicate_alerts_collapse_by_description_and_dates() {
        let alerts = vec![
            alert("Flood watch", Some(1_700_000_000)),
            alert("Flood watch", Some(1_700_000_000)),
            alert("Flood watch", Some(1_700_003_600)),
        ];
        let deduped = Alert::deduplicate(alerts);
        assert_eq!(deduped.len(), 2);
    }

    #[test]
    fn severity_colors_are_deterministic() {
        assert_eq!(AlertSeverity::Extreme.color(), 0xFFD32F2F);
        assert_ne!(AlertSeverity::Minor.color(), AlertSeverity::Severe.color());
    }
}
