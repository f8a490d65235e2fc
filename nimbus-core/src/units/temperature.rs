//! Temperature, stored in degrees Celsius.

use serde::{Deserialize, Serialize};

use super::format::{self, FormattingCapabilities, Locale, UnitWidth};
use super::{WeatherUnit, guard_nan};
use crate::error::UnitError;

/// Reference unit: degrees Celsius.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Temperature(f64);

impl Temperature {
    pub fn new(value: f64, unit: TemperatureUnit) -> Result<Self, UnitError> {
        Ok(Self(unit.to_reference(guard_nan(value)?)))
    }

    pub fn celsius(value: f64) -> Result<Self, UnitError> {
        Self::new(value, TemperatureUnit::Celsius)
    }

    pub fn fahrenheit(value: f64) -> Result<Self, UnitError> {
        Self::new(value, TemperatureUnit::Fahrenheit)
    }

    pub fn kelvin(value: f64) -> Result<Self, UnitError> {
        Self::new(value, TemperatureUnit::Kelvin)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn to_unit(&self, unit: TemperatureUnit) -> f64 {
        unit.from_reference(self.0)
    }

    pub fn to_string_in(&self, unit: TemperatureUnit, decimals: usize) -> String {
        format!("{}{}", format::format_fixed(self.to_unit(unit), decimals), unit.id())
    }

    /// `show_sign` is used for deltas (degree days, temperature trends).
    pub fn format(
        &self,
        unit: TemperatureUnit,
        width: UnitWidth,
        locale: &Locale,
        caps: FormattingCapabilities,
        show_sign: bool,
    ) -> String {
        format::format_unit_value(self.to_unit(unit), unit, width, locale, caps, show_sign)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
    Kelvin,
}

impl TemperatureUnit {
    /// Fahrenheit countries per upstream policy; everyone else Celsius.
    pub fn default_for_country(country_code: &str) -> Self {
        match country_code.to_uppercase().as_str() {
            "US" | "BS" | "BZ" | "KY" | "PW" => TemperatureUnit::Fahrenheit,
            _ => TemperatureUnit::Celsius,
        }
    }
}

impl WeatherUnit for TemperatureUnit {
    fn id(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
            TemperatureUnit::Kelvin => "K",
        }
    }

    fn from_id(id: &str) -> Result<Self, UnitError> {
        match id {
            "°C" | "C" => Ok(TemperatureUnit::Celsius),
            "°F" | "F" => Ok(TemperatureUnit::Fahrenheit),
            "K" => Ok(TemperatureUnit::Kelvin),
            other => Err(UnitError::UnknownUnit(other.to_string())),
        }
    }

    fn icu_id(self) -> Option<&'static str> {
        Some(match self {
            TemperatureUnit::Celsius => "temperature-celsius",
            TemperatureUnit::Fahrenheit => "temperature-fahrenheit",
            TemperatureUnit::Kelvin => "temperature-kelvin",
        })
    }

    fn to_reference(self, value: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => value,
            TemperatureUnit::Fahrenheit => (value - 32.0) / 1.8,
            TemperatureUnit::Kelvin => value - 273.15,
        }
    }

    fn from_reference(self, value: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => value,
            TemperatureUnit::Fahrenheit => value * 1.8 + 32.0,
            TemperatureUnit::Kelvin => value + 273.15,
        }
    }

    fn precision(self, width: UnitWidth) -> usize {
        match width {
            UnitWidth::Narrow | UnitWidth::Short => 0,
            UnitWidth::Long => 1,
        }
    }

    fn chart_step(self) -> f64 {
        5.0
    }

    fn name(self, locale: &Locale, width: UnitWidth) -> &'static str {
        match width {
            UnitWidth::Narrow => match self {
                TemperatureUnit::Celsius | TemperatureUnit::Fahrenheit => "°",
                TemperatureUnit::Kelvin => "K",
            },
            UnitWidth::Short => self.id(),
            UnitWidth::Long => match (self, locale.language.as_str()) {
                (TemperatureUnit::Celsius, "de") => "Grad Celsius",
                (TemperatureUnit::Celsius, "fr") => "degrés Celsius",
                (TemperatureUnit::Celsius, "zh") => "摄氏度",
                (TemperatureUnit::Celsius, _) => "degrees Celsius",
                (TemperatureUnit::Fahrenheit, "de") => "Grad Fahrenheit",
                (TemperatureUnit::Fahrenheit, "fr") => "degrés Fahrenheit",
                (TemperatureUnit::Fahrenheit, "zh") => "华氏度",
                (TemperatureUnit::Fahrenheit, _) => "degrees Fahrenheit",
                (TemperatureUnit::Kelvin, _) => "kelvin",
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
            TemperatureUnit::Celsius,
            TemperatureUnit::Fahrenheit,
            TemperatureUnit::Kelvin,
        ] {
            for value in [-40.0, 0.0, 21.5, 100.0] {
                let t = Temperature::new(value, unit).unwrap();
                assert!((t.to_unit(unit) - value).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn fahrenheit_reference_points() {
        let freezing = Temperature::fahrenheit(32.0).unwrap();
        assert!((freezing.value() - 0.0).abs() < 1e-9);
        let boiling = Temperature::celsius(100.0).unwrap();
        assert!((boiling.to_unit(TemperatureUnit::Fahrenheit) - 212.0).abs() < 1e-9);
        // -40 is the same in both scales.
        let cold = Temperature::celsius(-40.0).unwrap();
        assert!((cold.to_unit(TemperatureUnit::Fahrenheit) + 40.0).abs() < 1e-9);
    }

    #[test]
    fn integral_collapse_in_display() {
        let t = Temperature::celsius(21.0).unwrap();
        assert_eq!(t.to_string_in(TemperatureUnit::Celsius, 1), "21°C");
    }

    #[test]
    fn delta_formatting_forces_sign() {
        let t = Temperature::celsius(2.0).unwrap();
        let out = t.format(
            TemperatureUnit::Celsius,
            UnitWidth::Short,
            &Locale::english(),
            FormattingCapabilities::MODERN,
            true,
        );
        assert!(out.starts_with('+'));
    }

    #[test]
    fn nan_is_rejected() {
        assert!(Temperature::celsius(f64::NAN).is_err());
    }
}
