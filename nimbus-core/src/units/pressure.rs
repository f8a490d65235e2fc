//! Atmospheric pressure, stored in pascals.

use serde::{Deserialize, Serialize};

use super::format::{self, FormattingCapabilities, Locale, UnitWidth};
use super::{WeatherUnit, guard_nan};
use crate::error::UnitError;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Pressure(f64);

impl Pressure {
    pub fn new(value: f64, unit: PressureUnit) -> Result<Self, UnitError> {
        Ok(Self(unit.to_reference(guard_nan(value)?)))
    }

    pub fn pascals(value: f64) -> Result<Self, UnitError> {
        guard_nan(value).map(Self)
    }

    pub fn hectopascals(value: f64) -> Result<Self, UnitError> {
        Self::new(value, PressureUnit::Hectopascal)
    }

    pub fn inches_of_mercury(value: f64) -> Result<Self, UnitError> {
        Self::new(value, PressureUnit::InchOfMercury)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn to_unit(&self, unit: PressureUnit) -> f64 {
        unit.from_reference(self.0)
    }

    pub fn to_string_in(&self, unit: PressureUnit, decimals: usize) -> String {
        format!("{}{}", format::format_fixed(self.to_unit(unit), decimals), unit.id())
    }

    pub fn format(
        &self,
        unit: PressureUnit,
        width: UnitWidth,
        locale: &Locale,
        caps: FormattingCapabilities,
    ) -> String {
        format::format_unit_value(self.to_unit(unit), unit, width, locale, caps, false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PressureUnit {
    Hectopascal,
    Kilopascal,
    Millibar,
    InchOfMercury,
    MillimeterOfMercury,
}

impl PressureUnit {
    pub fn default_for_country(country_code: &str) -> Self {
        match country_code.to_uppercase().as_str() {
            "US" => PressureUnit::InchOfMercury,
            _ => PressureUnit::Hectopascal,
        }
    }
}

impl WeatherUnit for PressureUnit {
    fn id(self) -> &'static str {
        match self {
            PressureUnit::Hectopascal => "hPa",
            PressureUnit::Kilopascal => "kPa",
            PressureUnit::Millibar => "mb",
            PressureUnit::InchOfMercury => "inHg",
            PressureUnit::MillimeterOfMercury => "mmHg",
        }
    }

    fn from_id(id: &str) -> Result<Self, UnitError> {
        match id {
            "hPa" => Ok(PressureUnit::Hectopascal),
            "kPa" => Ok(PressureUnit::Kilopascal),
            "mb" => Ok(PressureUnit::Millibar),
            "inHg" => Ok(PressureUnit::InchOfMercury),
            "mmHg" => Ok(PressureUnit::MillimeterOfMercury),
            other => Err(UnitError::UnknownUnit(other.to_string())),
        }
    }

    fn icu_id(self) -> Option<&'static str> {
        match self {
            PressureUnit::Hectopascal => Some("pressure-hectopascal"),
            PressureUnit::Kilopascal => Some("pressure-kilopascal"),
            PressureUnit::Millibar => Some("pressure-millibar"),
            PressureUnit::InchOfMercury => Some("pressure-inch-ofhg"),
            PressureUnit::MillimeterOfMercury => Some("pressure-millimeter-ofhg"),
        }
    }

    fn to_reference(self, value: f64) -> f64 {
        match self {
            PressureUnit::Hectopascal | PressureUnit::Millibar => value * 100.0,
            PressureUnit::Kilopascal => value * 1000.0,
            PressureUnit::InchOfMercury => value * 3386.39,
            PressureUnit::MillimeterOfMercury => value * 133.322,
        }
    }

    fn from_reference(self, value: f64) -> f64 {
        match self {
            PressureUnit::Hectopascal | PressureUnit::Millibar => value / 100.0,
            PressureUnit::Kilopascal => value / 1000.0,
            PressureUnit::InchOfMercury => value / 3386.39,
            PressureUnit::MillimeterOfMercury => value / 133.322,
        }
    }

    fn precision(self, width: UnitWidth) -> usize {
        match (self, width) {
            (PressureUnit::InchOfMercury, UnitWidth::Narrow) => 1,
            (PressureUnit::InchOfMercury, _) => 2,
            (PressureUnit::Kilopascal, UnitWidth::Narrow | UnitWidth::Short) => 1,
            (PressureUnit::Kilopascal, UnitWidth::Long) => 2,
            (_, UnitWidth::Narrow | UnitWidth::Short) => 0,
            (_, UnitWidth::Long) => 1,
        }
    }

    fn chart_step(self) -> f64 {
        match self {
            PressureUnit::Hectopascal | PressureUnit::Millibar => 15.0,
            PressureUnit::Kilopascal => 1.5,
            PressureUnit::InchOfMercury => 0.5,
            PressureUnit::MillimeterOfMercury => 10.0,
        }
    }

    fn name(self, locale: &Locale, width: UnitWidth) -> &'static str {
        match width {
            UnitWidth::Narrow | UnitWidth::Short => self.id(),
            UnitWidth::Long => match (self, locale.language.as_str()) {
                (PressureUnit::Hectopascal, "zh") => "百帕",
                (PressureUnit::Hectopascal, _) => "hectopascals",
                (PressureUnit::Kilopascal, _) => "kilopascals",
                (PressureUnit::Millibar, _) => "millibars",
                (PressureUnit::InchOfMercury, "de") => "Zoll Quecksilbersäule",
                (PressureUnit::InchOfMercury, _) => "inches of mercury",
                (PressureUnit::MillimeterOfMercury, _) => "millimeters of mercury",
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
            PressureUnit::Hectopascal,
            PressureUnit::Kilopascal,
            PressureUnit::Millibar,
            PressureUnit::InchOfMercury,
            PressureUnit::MillimeterOfMercury,
        ] {
            for value in [870.0, 1013.25, 29.92] {
                let p = Pressure::new(value, unit).unwrap();
                assert!((p.to_unit(unit) - value).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn standard_atmosphere() {
        let p = Pressure::hectopascals(1013.25).unwrap();
        assert!((p.value() - 101_325.0).abs() < 1e-6);
        assert!((p.to_unit(PressureUnit::InchOfMercury) - 29.92).abs() < 0.01);
    }

    #[test]
    fn millibar_and_hectopascal_are_equivalent() {
        let a = Pressure::new(1000.0, PressureUnit::Millibar).unwrap();
        let b = Pressure::hectopascals(1000.0).unwrap();
        assert_eq!(a.value(), b.value());
    }
}
