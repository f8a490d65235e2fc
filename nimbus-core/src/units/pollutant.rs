//! Pollutant concentration, stored in micrograms per cubic meter.

use serde::{Deserialize, Serialize};

use super::format::{self, FormattingCapabilities, Locale, UnitWidth};
use super::{WeatherUnit, guard_nan};
use crate::error::UnitError;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct PollutantConcentration(f64);

impl PollutantConcentration {
    pub fn new(value: f64, unit: PollutantConcentrationUnit) -> Result<Self, UnitError> {
        Ok(Self(unit.to_reference(guard_nan(value)?)))
    }

    pub fn micrograms_per_cubic_meter(value: f64) -> Result<Self, UnitError> {
        guard_nan(value).map(Self)
    }

    pub fn milligrams_per_cubic_meter(value: f64) -> Result<Self, UnitError> {
        Self::new(value, PollutantConcentrationUnit::MilligramPerCubicMeter)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn to_unit(&self, unit: PollutantConcentrationUnit) -> f64 {
        unit.from_reference(self.0)
    }

    pub fn to_string_in(&self, unit: PollutantConcentrationUnit, decimals: usize) -> String {
        format!("{}{}", format::format_fixed(self.to_unit(unit), decimals), unit.id())
    }

    pub fn format(
        &self,
        unit: PollutantConcentrationUnit,
        width: UnitWidth,
        locale: &Locale,
        caps: FormattingCapabilities,
    ) -> String {
        format::format_unit_value(self.to_unit(unit), unit, width, locale, caps, false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PollutantConcentrationUnit {
    MicrogramPerCubicMeter,
    MilligramPerCubicMeter,
}

impl WeatherUnit for PollutantConcentrationUnit {
    fn id(self) -> &'static str {
        match self {
            PollutantConcentrationUnit::MicrogramPerCubicMeter => "µg/m³",
            PollutantConcentrationUnit::MilligramPerCubicMeter => "mg/m³",
        }
    }

    fn from_id(id: &str) -> Result<Self, UnitError> {
        match id {
            "µg/m³" | "ug/m3" => Ok(PollutantConcentrationUnit::MicrogramPerCubicMeter),
            "mg/m³" | "mg/m3" => Ok(PollutantConcentrationUnit::MilligramPerCubicMeter),
            other => Err(UnitError::UnknownUnit(other.to_string())),
        }
    }

    fn icu_id(self) -> Option<&'static str> {
        match self {
            PollutantConcentrationUnit::MicrogramPerCubicMeter => {
                Some("concentr-microgram-per-cubic-meter")
            }
            // No platform mapping; manual fallback only.
            PollutantConcentrationUnit::MilligramPerCubicMeter => None,
        }
    }

    fn to_reference(self, value: f64) -> f64 {
        match self {
            PollutantConcentrationUnit::MicrogramPerCubicMeter => value,
            PollutantConcentrationUnit::MilligramPerCubicMeter => value * 1000.0,
        }
    }

    fn from_reference(self, value: f64) -> f64 {
        match self {
            PollutantConcentrationUnit::MicrogramPerCubicMeter => value,
            PollutantConcentrationUnit::MilligramPerCubicMeter => value / 1000.0,
        }
    }

    fn precision(self, width: UnitWidth) -> usize {
        match (self, width) {
            (PollutantConcentrationUnit::MicrogramPerCubicMeter, _) => 0,
            (PollutantConcentrationUnit::MilligramPerCubicMeter, UnitWidth::Long) => 2,
            (PollutantConcentrationUnit::MilligramPerCubicMeter, _) => 1,
        }
    }

    fn chart_step(self) -> f64 {
        match self {
            PollutantConcentrationUnit::MicrogramPerCubicMeter => 25.0,
            PollutantConcentrationUnit::MilligramPerCubicMeter => 0.025,
        }
    }

    fn name(self, locale: &Locale, width: UnitWidth) -> &'static str {
        match width {
            UnitWidth::Narrow | UnitWidth::Short => self.id(),
            UnitWidth::Long => match (self, locale.language.as_str()) {
                (PollutantConcentrationUnit::MicrogramPerCubicMeter, "de") => {
                    "Mikrogramm pro Kubikmeter"
                }
                (PollutantConcentrationUnit::MicrogramPerCubicMeter, _) => {
                    "micrograms per cubic meter"
                }
                (PollutantConcentrationUnit::MilligramPerCubicMeter, _) => {
                    "milligrams per cubic meter"
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_round_trip() {
        let c = PollutantConcentration::milligrams_per_cubic_meter(0.4).unwrap();
        assert!((c.value() - 400.0).abs() < 1e-9);
        assert!((c.to_unit(PollutantConcentrationUnit::MilligramPerCubicMeter) - 0.4).abs() < 1e-9);
    }
}
