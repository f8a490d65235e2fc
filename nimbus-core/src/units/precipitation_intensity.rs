//! Precipitation intensity (amount per hour), stored in mm/h.
//!
//! Both units are "per" composites: the platform can only compose them on
//! newer versions, which is why [`WeatherUnit::is_per_composite`] returns
//! true and the formatting engine checks `supports_per_unit`.

use serde::{Deserialize, Serialize};

use super::format::{self, FormattingCapabilities, Locale, UnitWidth};
use super::{WeatherUnit, guard_nan};
use crate::error::UnitError;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct PrecipitationIntensity(f64);

impl PrecipitationIntensity {
    pub fn new(value: f64, unit: PrecipitationIntensityUnit) -> Result<Self, UnitError> {
        Ok(Self(unit.to_reference(guard_nan(value)?)))
    }

    pub fn millimeters_per_hour(value: f64) -> Result<Self, UnitError> {
        guard_nan(value).map(Self)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn to_unit(&self, unit: PrecipitationIntensityUnit) -> f64 {
        unit.from_reference(self.0)
    }

    pub fn to_string_in(&self, unit: PrecipitationIntensityUnit, decimals: usize) -> String {
        format!("{}{}", format::format_fixed(self.to_unit(unit), decimals), unit.id())
    }

    pub fn format(
        &self,
        unit: PrecipitationIntensityUnit,
        width: UnitWidth,
        locale: &Locale,
        caps: FormattingCapabilities,
    ) -> String {
        format::format_unit_value(self.to_unit(unit), unit, width, locale, caps, false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrecipitationIntensityUnit {
    MillimeterPerHour,
    InchPerHour,
}

impl WeatherUnit for PrecipitationIntensityUnit {
    fn id(self) -> &'static str {
        match self {
            PrecipitationIntensityUnit::MillimeterPerHour => "mm/h",
            PrecipitationIntensityUnit::InchPerHour => "in/h",
        }
    }

    fn from_id(id: &str) -> Result<Self, UnitError> {
        match id {
            "mm/h" => Ok(PrecipitationIntensityUnit::MillimeterPerHour),
            "in/h" => Ok(PrecipitationIntensityUnit::InchPerHour),
            other => Err(UnitError::UnknownUnit(other.to_string())),
        }
    }

    fn icu_id(self) -> Option<&'static str> {
        match self {
            PrecipitationIntensityUnit::MillimeterPerHour => Some("length-millimeter-per-hour"),
            PrecipitationIntensityUnit::InchPerHour => Some("length-inch-per-hour"),
        }
    }

    fn is_per_composite(self) -> bool {
        true
    }

    fn to_reference(self, value: f64) -> f64 {
        match self {
            PrecipitationIntensityUnit::MillimeterPerHour => value,
            PrecipitationIntensityUnit::InchPerHour => value * 25.4,
        }
    }

    fn from_reference(self, value: f64) -> f64 {
        match self {
            PrecipitationIntensityUnit::MillimeterPerHour => value,
            PrecipitationIntensityUnit::InchPerHour => value / 25.4,
        }
    }

    fn precision(self, width: UnitWidth) -> usize {
        match width {
            UnitWidth::Narrow | UnitWidth::Short => 1,
            UnitWidth::Long => 2,
        }
    }

    fn chart_step(self) -> f64 {
        match self {
            PrecipitationIntensityUnit::MillimeterPerHour => 5.0,
            PrecipitationIntensityUnit::InchPerHour => 0.2,
        }
    }

    fn name(self, locale: &Locale, width: UnitWidth) -> &'static str {
        match width {
            UnitWidth::Narrow | UnitWidth::Short => self.id(),
            UnitWidth::Long => match (self, locale.language.as_str()) {
                (PrecipitationIntensityUnit::MillimeterPerHour, "de") => "Millimeter pro Stunde",
                (PrecipitationIntensityUnit::MillimeterPerHour, "fr") => "millimètres par heure",
                (PrecipitationIntensityUnit::MillimeterPerHour, _) => "millimeters per hour",
                (PrecipitationIntensityUnit::InchPerHour, _) => "inches per hour",
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
            PrecipitationIntensityUnit::MillimeterPerHour,
            PrecipitationIntensityUnit::InchPerHour,
        ] {
            let i = PrecipitationIntensity::new(2.5, unit).unwrap();
            assert!((i.to_unit(unit) - 2.5).abs() < 1e-9);
        }
    }

    #[test]
    fn per_composite_flag_is_set() {
        assert!(PrecipitationIntensityUnit::MillimeterPerHour.is_per_composite());
        assert!(PrecipitationIntensityUnit::InchPerHour.is_per_composite());
    }
}
