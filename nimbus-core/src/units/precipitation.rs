//! Precipitation amount, stored in millimeters.

use serde::{Deserialize, Serialize};

use super::format::{self, FormattingCapabilities, Locale, UnitWidth};
use super::{WeatherUnit, guard_nan};
use crate::error::UnitError;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Precipitation(f64);

impl Precipitation {
    pub fn new(value: f64, unit: PrecipitationUnit) -> Result<Self, UnitError> {
        Ok(Self(unit.to_reference(guard_nan(value)?)))
    }

    pub fn millimeters(value: f64) -> Result<Self, UnitError> {
        guard_nan(value).map(Self)
    }

    pub fn centimeters(value: f64) -> Result<Self, UnitError> {
        Self::new(value, PrecipitationUnit::Centimeter)
    }

    pub fn inches(value: f64) -> Result<Self, UnitError> {
        Self::new(value, PrecipitationUnit::Inch)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn to_unit(&self, unit: PrecipitationUnit) -> f64 {
        unit.from_reference(self.0)
    }

    pub fn to_string_in(&self, unit: PrecipitationUnit, decimals: usize) -> String {
        format!("{}{}", format::format_fixed(self.to_unit(unit), decimals), unit.id())
    }

    pub fn format(
        &self,
        unit: PrecipitationUnit,
        width: UnitWidth,
        locale: &Locale,
        caps: FormattingCapabilities,
    ) -> String {
        format::format_unit_value(self.to_unit(unit), unit, width, locale, caps, false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrecipitationUnit {
    Millimeter,
    Centimeter,
    Inch,
    /// Equivalent to millimeters; kept as a separate display preference.
    LiterPerSquareMeter,
}

impl PrecipitationUnit {
    pub fn default_for_country(country_code: &str) -> Self {
        match country_code.to_uppercase().as_str() {
            "US" => PrecipitationUnit::Inch,
            _ => PrecipitationUnit::Millimeter,
        }
    }
}

impl WeatherUnit for PrecipitationUnit {
    fn id(self) -> &'static str {
        match self {
            PrecipitationUnit::Millimeter => "mm",
            PrecipitationUnit::Centimeter => "cm",
            PrecipitationUnit::Inch => "in",
            PrecipitationUnit::LiterPerSquareMeter => "l/m²",
        }
    }

    fn from_id(id: &str) -> Result<Self, UnitError> {
        match id {
            "mm" => Ok(PrecipitationUnit::Millimeter),
            "cm" => Ok(PrecipitationUnit::Centimeter),
            "in" => Ok(PrecipitationUnit::Inch),
            "l/m²" | "l/m2" => Ok(PrecipitationUnit::LiterPerSquareMeter),
            other => Err(UnitError::UnknownUnit(other.to_string())),
        }
    }

    fn icu_id(self) -> Option<&'static str> {
        match self {
            PrecipitationUnit::Millimeter => Some("length-millimeter"),
            PrecipitationUnit::Centimeter => Some("length-centimeter"),
            PrecipitationUnit::Inch => Some("length-inch"),
            // The platform has no liter-per-square-meter unit.
            PrecipitationUnit::LiterPerSquareMeter => None,
        }
    }

    fn to_reference(self, value: f64) -> f64 {
        match self {
            PrecipitationUnit::Millimeter | PrecipitationUnit::LiterPerSquareMeter => value,
            PrecipitationUnit::Centimeter => value * 10.0,
            PrecipitationUnit::Inch => value * 25.4,
        }
    }

    fn from_reference(self, value: f64) -> f64 {
        match self {
            PrecipitationUnit::Millimeter | PrecipitationUnit::LiterPerSquareMeter => value,
            PrecipitationUnit::Centimeter => value / 10.0,
            PrecipitationUnit::Inch => value / 25.4,
        }
    }

    fn precision(self, width: UnitWidth) -> usize {
        match (self, width) {
            (PrecipitationUnit::Inch, UnitWidth::Narrow) => 1,
            (PrecipitationUnit::Inch, _) => 2,
            (_, UnitWidth::Narrow) => 0,
            (_, _) => 1,
        }
    }

    fn chart_step(self) -> f64 {
        match self {
            PrecipitationUnit::Millimeter | PrecipitationUnit::LiterPerSquareMeter => 5.0,
            PrecipitationUnit::Centimeter => 0.5,
            PrecipitationUnit::Inch => 0.2,
        }
    }

    fn name(self, locale: &Locale, width: UnitWidth) -> &'static str {
        match width {
            UnitWidth::Narrow | UnitWidth::Short => self.id(),
            UnitWidth::Long => match (self, locale.language.as_str()) {
                (PrecipitationUnit::Millimeter, "de") => "Millimeter",
                (PrecipitationUnit::Millimeter, "fr") => "millimètres",
                (PrecipitationUnit::Millimeter, "zh") => "毫米",
                (PrecipitationUnit::Millimeter, _) => "millimeters",
                (PrecipitationUnit::Centimeter, _) => "centimeters",
                (PrecipitationUnit::Inch, "de") => "Zoll",
                (PrecipitationUnit::Inch, "fr") => "pouces",
                (PrecipitationUnit::Inch, _) => "inches",
                (PrecipitationUnit::LiterPerSquareMeter, "de") => "Liter pro Quadratmeter",
                (PrecipitationUnit::LiterPerSquareMeter, _) => "liters per square meter",
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
            PrecipitationUnit::Millimeter,
            PrecipitationUnit::Centimeter,
            PrecipitationUnit::Inch,
            PrecipitationUnit::LiterPerSquareMeter,
        ] {
            for value in [0.0, 0.3, 12.7, 100.0] {
                let p = Precipitation::new(value, unit).unwrap();
                assert!((p.to_unit(unit) - value).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn inch_is_25_4_mm() {
        let p = Precipitation::inches(1.0).unwrap();
        assert!((p.value() - 25.4).abs() < 1e-9);
    }

    #[test]
    fn liter_per_square_meter_equals_millimeter() {
        let p = Precipitation::millimeters(7.0).unwrap();
        assert_eq!(p.to_unit(PrecipitationUnit::LiterPerSquareMeter), 7.0);
    }
}
