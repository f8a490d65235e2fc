//! Speed, stored in meters per second.

use serde::{Deserialize, Serialize};

use super::format::{self, FormattingCapabilities, Locale, UnitWidth};
use super::{WeatherUnit, guard_nan};
use crate::error::UnitError;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Speed(f64);

impl Speed {
    pub fn new(value: f64, unit: SpeedUnit) -> Result<Self, UnitError> {
        Ok(Self(unit.to_reference(guard_nan(value)?)))
    }

    pub fn meters_per_second(value: f64) -> Result<Self, UnitError> {
        Self::new(value, SpeedUnit::MeterPerSecond)
    }

    pub fn kilometers_per_hour(value: f64) -> Result<Self, UnitError> {
        Self::new(value, SpeedUnit::KilometerPerHour)
    }

    pub fn miles_per_hour(value: f64) -> Result<Self, UnitError> {
        Self::new(value, SpeedUnit::MilePerHour)
    }

    pub fn knots(value: f64) -> Result<Self, UnitError> {
        Self::new(value, SpeedUnit::Knot)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn to_unit(&self, unit: SpeedUnit) -> f64 {
        unit.from_reference(self.0)
    }

    pub fn to_string_in(&self, unit: SpeedUnit, decimals: usize) -> String {
        format!("{}{}", format::format_fixed(self.to_unit(unit), decimals), unit.id())
    }

    pub fn format(
        &self,
        unit: SpeedUnit,
        width: UnitWidth,
        locale: &Locale,
        caps: FormattingCapabilities,
    ) -> String {
        format::format_unit_value(self.to_unit(unit), unit, width, locale, caps, false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpeedUnit {
    MeterPerSecond,
    KilometerPerHour,
    MilePerHour,
    Knot,
    FootPerSecond,
}

impl SpeedUnit {
    pub fn default_for_country(country_code: &str) -> Self {
        match country_code.to_uppercase().as_str() {
            "US" | "GB" => SpeedUnit::MilePerHour,
            _ => SpeedUnit::KilometerPerHour,
        }
    }
}

impl WeatherUnit for SpeedUnit {
    fn id(self) -> &'static str {
        match self {
            SpeedUnit::MeterPerSecond => "m/s",
            SpeedUnit::KilometerPerHour => "km/h",
            SpeedUnit::MilePerHour => "mph",
            SpeedUnit::Knot => "kn",
            SpeedUnit::FootPerSecond => "ft/s",
        }
    }

    fn from_id(id: &str) -> Result<Self, UnitError> {
        match id {
            "m/s" => Ok(SpeedUnit::MeterPerSecond),
            "km/h" => Ok(SpeedUnit::KilometerPerHour),
            "mph" => Ok(SpeedUnit::MilePerHour),
            "kn" => Ok(SpeedUnit::Knot),
            "ft/s" => Ok(SpeedUnit::FootPerSecond),
            other => Err(UnitError::UnknownUnit(other.to_string())),
        }
    }

    fn icu_id(self) -> Option<&'static str> {
        match self {
            SpeedUnit::MeterPerSecond => Some("speed-meter-per-second"),
            SpeedUnit::KilometerPerHour => Some("speed-kilometer-per-hour"),
            SpeedUnit::MilePerHour => Some("speed-mile-per-hour"),
            SpeedUnit::Knot => Some("speed-knot"),
            // No platform handle; always rendered via the manual template.
            SpeedUnit::FootPerSecond => None,
        }
    }

    fn to_reference(self, value: f64) -> f64 {
        match self {
            SpeedUnit::MeterPerSecond => value,
            SpeedUnit::KilometerPerHour => value / 3.6,
            SpeedUnit::MilePerHour => value * 0.44704,
            SpeedUnit::Knot => value * 1852.0 / 3600.0,
            SpeedUnit::FootPerSecond => value * 0.3048,
        }
    }

    fn from_reference(self, value: f64) -> f64 {
        match self {
            SpeedUnit::MeterPerSecond => value,
            SpeedUnit::KilometerPerHour => value * 3.6,
            SpeedUnit::MilePerHour => value / 0.44704,
            SpeedUnit::Knot => value * 3600.0 / 1852.0,
            SpeedUnit::FootPerSecond => value / 0.3048,
        }
    }

    fn precision(self, width: UnitWidth) -> usize {
        match width {
            UnitWidth::Narrow => 0,
            UnitWidth::Short => 1,
            UnitWidth::Long => 1,
        }
    }

    fn chart_step(self) -> f64 {
        match self {
            SpeedUnit::MeterPerSecond => 5.0,
            SpeedUnit::KilometerPerHour => 15.0,
            SpeedUnit::MilePerHour => 10.0,
            SpeedUnit::Knot => 10.0,
            SpeedUnit::FootPerSecond => 15.0,
        }
    }

    fn name(self, locale: &Locale, width: UnitWidth) -> &'static str {
        match width {
            UnitWidth::Narrow | UnitWidth::Short => self.id(),
            UnitWidth::Long => match (self, locale.language.as_str()) {
                (SpeedUnit::MeterPerSecond, "de") => "Meter pro Sekunde",
                (SpeedUnit::MeterPerSecond, "fr") => "mètres par seconde",
                (SpeedUnit::MeterPerSecond, _) => "meters per second",
                (SpeedUnit::KilometerPerHour, "de") => "Kilometer pro Stunde",
                (SpeedUnit::KilometerPerHour, "fr") => "kilomètres par heure",
                (SpeedUnit::KilometerPerHour, "zh") => "公里每小时",
                (SpeedUnit::KilometerPerHour, _) => "kilometers per hour",
                (SpeedUnit::MilePerHour, "de") => "Meilen pro Stunde",
                (SpeedUnit::MilePerHour, "fr") => "milles par heure",
                (SpeedUnit::MilePerHour, _) => "miles per hour",
                (SpeedUnit::Knot, "de") => "Knoten",
                (SpeedUnit::Knot, "fr") => "nœuds",
                (SpeedUnit::Knot, _) => "knots",
                (SpeedUnit::FootPerSecond, _) => "feet per second",
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_round_trip() {
        for unit in [
            SpeedUnit::MeterPerSecond,
            SpeedUnit::KilometerPerHour,
            SpeedUnit::MilePerHour,
            SpeedUnit::Knot,
            SpeedUnit::FootPerSecond,
        ] {
            for value in [0.0, 3.6, 27.8, 120.0] {
                let s = Speed::new(value, unit).unwrap();
                assert!((s.to_unit(unit) - value).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn kmh_is_stored_as_mps() {
        let s = Speed::kilometers_per_hour(36.0).unwrap();
        assert!((s.value() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn missing_icu_handle_forces_manual_template() {
        let s = Speed::new(10.0, SpeedUnit::FootPerSecond).unwrap();
        let out = s.format(
            SpeedUnit::FootPerSecond,
            UnitWidth::Short,
            &Locale::english(),
            FormattingCapabilities::MODERN,
        );
        // Manual template joins with a plain space, not the narrow nbsp.
        assert_eq!(out, "10 ft/s");
    }
}
