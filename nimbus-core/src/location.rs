//! The location value consumed by sources and the mapper, as produced by
//! the out-of-scope location/search layer.

use chrono::FixedOffset;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// Already-resolved UTC offset of the location's timezone.
    pub timezone: FixedOffset,
    /// ISO 3166-1 alpha-2, uppercase, when known.
    pub country_code: Option<String>,
    pub admin_code: Option<String>,
    /// Per-source persisted parameters (resolved station ids, grid ids).
    pub parameters: HashMap<String, String>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64, timezone: FixedOffset) -> Self {
        Self {
            latitude,
            longitude,
            timezone,
            country_code: None,
            admin_code: None,
            parameters: HashMap::new(),
        }
    }

    pub fn with_country(mut self, country_code: &str) -> Self {
        self.country_code = Some(country_code.to_uppercase());
        self
    }

    pub fn is_in_country(&self, country_code: &str) -> bool {
        self.country_code
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case(country_code))
    }

    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }
}
