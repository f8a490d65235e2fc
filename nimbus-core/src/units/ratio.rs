//! Dimensionless ratio (humidity, cloud cover, probability), stored as a
//! fraction in [0, 1].

use serde::{Deserialize, Serialize};

use super::format::{self, FormattingCapabilities, Locale, UnitWidth};
use super::{WeatherUnit, guard_nan};
use crate::error::UnitError;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Ratio(f64);

impl Ratio {
    pub fn new(value: f64, unit: RatioUnit) -> Result<Self, UnitError> {
        Ok(Self(unit.to_reference(guard_nan(value)?)))
    }

    pub fn fraction(value: f64) -> Result<Self, UnitError> {
        guard_nan(value).map(Self)
    }

    pub fn percent(value: f64) -> Result<Self, UnitError> {
        Self::new(value, RatioUnit::Percent)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn to_unit(&self, unit: RatioUnit) -> f64 {
        unit.from_reference(self.0)
    }

    pub fn to_string_in(&self, unit: RatioUnit, decimals: usize) -> String {
        format!("{}{}", format::format_fixed(self.to_unit(unit), decimals), unit.id())
    }

    pub fn format(
        &self,
        unit: RatioUnit,
        width: UnitWidth,
        locale: &Locale,
        caps: FormattingCapabilities,
    ) -> String {
        format::format_unit_value(self.to_unit(unit), unit, width, locale, caps, false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RatioUnit {
    Fraction,
    Percent,
}

impl WeatherUnit for RatioUnit {
    fn id(self) -> &'static str {
        match self {
            RatioUnit::Fraction => "",
            RatioUnit::Percent => "%",
        }
    }

    fn from_id(id: &str) -> Result<Self, UnitError> {
        match id {
            "" => Ok(RatioUnit::Fraction),
            "%" => Ok(RatioUnit::Percent),
            other => Err(UnitError::UnknownUnit(other.to_string())),
        }
    }

    fn icu_id(self) -> Option<&'static str> {
        match self {
            RatioUnit::Fraction => None,
            RatioUnit::Percent => Some("concentr-percent"),
        }
    }

    fn to_reference(self, value: f64) -> f64 {
        match self {
            RatioUnit::Fraction => value,
            RatioUnit::Percent => value / 100.0,
        }
    }

    fn from_reference(self, value: f64) -> f64 {
        match self {
            RatioUnit::Fraction => value,
            RatioUnit::Percent => value * 100.0,
        }
    }

    fn precision(self, width: UnitWidth) -> usize {
        match (self, width) {
            (RatioUnit::Percent, UnitWidth::Long) => 1,
            (RatioUnit::Percent, _) => 0,
            (RatioUnit::Fraction, _) => 2,
        }
    }

    fn chart_step(self) -> f64 {
        match self {
            RatioUnit::Fraction => 0.1,
            RatioUnit::Percent => 10.0,
        }
    }

    fn name(self, _locale: &Locale, _width: UnitWidth) -> &'static str {
        match self {
            RatioUnit::Fraction => "",
            RatioUnit::Percent => "%",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_round_trips_through_fraction() {
        let r = Ratio::percent(85.0).unwrap();
        assert!((r.value() - 0.85).abs() < 1e-9);
        assert!((r.to_unit(RatioUnit::Percent) - 85.0).abs() < 1e-9);
    }

    #[test]
    fn integral_collapse() {
        let r = Ratio::fraction(0.5).unwrap();
        assert_eq!(r.to_string_in(RatioUnit::Percent, 1), "50%");
    }
}
