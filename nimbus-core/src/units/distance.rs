//! Distance, stored in meters.

use serde::{Deserialize, Serialize};

use super::format::{self, FormattingCapabilities, Locale, UnitWidth};
use super::{WeatherUnit, guard_nan};
use crate::error::UnitError;

/// A distance (visibility, ceiling, ...). Reference unit: meters.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Distance(f64);

impl Distance {
    pub fn new(value: f64, unit: DistanceUnit) -> Result<Self, UnitError> {
        Ok(Self(unit.to_reference(guard_nan(value)?)))
    }

    pub fn meters(value: f64) -> Result<Self, UnitError> {
        Self::new(value, DistanceUnit::Meter)
    }

    pub fn kilometers(value: f64) -> Result<Self, UnitError> {
        Self::new(value, DistanceUnit::Kilometer)
    }

    pub fn miles(value: f64) -> Result<Self, UnitError> {
        Self::new(value, DistanceUnit::Mile)
    }

    pub fn feet(value: f64) -> Result<Self, UnitError> {
        Self::new(value, DistanceUnit::Foot)
    }

    /// Raw value in the reference unit (meters).
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Conversion is computed fresh on every call, never cached.
    pub fn to_unit(&self, unit: DistanceUnit) -> f64 {
        unit.from_reference(self.0)
    }

    /// Visibility and ceiling define a negative distance as "absent"
    /// rather than an error; the call sites owning that semantic use this.
    pub fn validate_non_negative(self) -> Option<Self> {
        (self.0 >= 0.0).then_some(self)
    }

    /// Fixed-decimals rendering with integral collapse and the unit id
    /// appended, e.g. `"3.1mi"`, `"5km"`.
    pub fn to_string_in(&self, unit: DistanceUnit, decimals: usize) -> String {
        format!("{}{}", format::format_fixed(self.to_unit(unit), decimals), unit.id())
    }

    pub fn format(
        &self,
        unit: DistanceUnit,
        width: UnitWidth,
        locale: &Locale,
        caps: FormattingCapabilities,
    ) -> String {
        format::format_unit_value(self.to_unit(unit), unit, width, locale, caps, false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistanceUnit {
    Meter,
    Kilometer,
    Mile,
    NauticalMile,
    Foot,
}

impl DistanceUnit {
    /// Unit to show when the user has no explicit preference. The
    /// country table is business policy, preserved precisely: US/GB show
    /// miles, DE/NL meters, everyone else kilometers.
    pub fn default_for_country(country_code: &str) -> Self {
        match country_code.to_uppercase().as_str() {
            "US" | "GB" => DistanceUnit::Mile,
            "DE" | "NL" => DistanceUnit::Meter,
            _ => DistanceUnit::Kilometer,
        }
    }
}

impl WeatherUnit for DistanceUnit {
    fn id(self) -> &'static str {
        match self {
            DistanceUnit::Meter => "m",
            DistanceUnit::Kilometer => "km",
            DistanceUnit::Mile => "mi",
            DistanceUnit::NauticalMile => "nmi",
            DistanceUnit::Foot => "ft",
        }
    }

    fn from_id(id: &str) -> Result<Self, UnitError> {
        match id {
            "m" => Ok(DistanceUnit::Meter),
            "km" => Ok(DistanceUnit::Kilometer),
            "mi" => Ok(DistanceUnit::Mile),
            "nmi" => Ok(DistanceUnit::NauticalMile),
            "ft" => Ok(DistanceUnit::Foot),
            other => Err(UnitError::UnknownUnit(other.to_string())),
        }
    }

    fn icu_id(self) -> Option<&'static str> {
        Some(match self {
            DistanceUnit::Meter => "length-meter",
            DistanceUnit::Kilometer => "length-kilometer",
            DistanceUnit::Mile => "length-mile",
            DistanceUnit::NauticalMile => "length-nautical-mile",
            DistanceUnit::Foot => "length-foot",
        })
    }

    fn to_reference(self, value: f64) -> f64 {
        match self {
            DistanceUnit::Meter => value,
            DistanceUnit::Kilometer => value * 1000.0,
            DistanceUnit::Mile => value * 1609.344,
            DistanceUnit::NauticalMile => value * 1852.0,
            DistanceUnit::Foot => value * 0.3048,
        }
    }

    fn from_reference(self, value: f64) -> f64 {
        match self {
            DistanceUnit::Meter => value,
            DistanceUnit::Kilometer => value / 1000.0,
            DistanceUnit::Mile => value / 1609.344,
            DistanceUnit::NauticalMile => value / 1852.0,
            DistanceUnit::Foot => value / 0.3048,
        }
    }

    fn precision(self, width: UnitWidth) -> usize {
        match (self, width) {
            (DistanceUnit::Meter | DistanceUnit::Foot, _) => 0,
            (_, UnitWidth::Narrow) => 0,
            (_, UnitWidth::Short) => 1,
            (_, UnitWidth::Long) => 2,
        }
    }

    fn chart_step(self) -> f64 {
        match self {
            DistanceUnit::Meter => 5000.0,
            DistanceUnit::Kilometer => 5.0,
            DistanceUnit::Mile => 3.0,
            DistanceUnit::NauticalMile => 3.0,
            DistanceUnit::Foot => 15000.0,
        }
    }

    fn name(self, locale: &Locale, width: UnitWidth) -> &'static str {
        match width {
            UnitWidth::Narrow | UnitWidth::Short => match (self, locale.language.as_str()) {
                (DistanceUnit::Meter, "zh") => "米",
                (DistanceUnit::Meter, _) => "m",
                (DistanceUnit::Kilometer, "zh") => "公里",
                (DistanceUnit::Kilometer, _) => "km",
                (DistanceUnit::Mile, "zh") => "英里",
                (DistanceUnit::Mile, _) => "mi",
                (DistanceUnit::NauticalMile, _) => "nmi",
                (DistanceUnit::Foot, "zh") => "英尺",
                (DistanceUnit::Foot, _) => "ft",
            },
            UnitWidth::Long => match (self, locale.language.as_str()) {
                (DistanceUnit::Meter, "de") => "Meter",
                (DistanceUnit::Meter, "fr") => "mètres",
                (DistanceUnit::Meter, "zh") => "米",
                (DistanceUnit::Meter, _) => "meters",
                (DistanceUnit::Kilometer, "de") => "Kilometer",
                (DistanceUnit::Kilometer, "fr") => "kilomètres",
                (DistanceUnit::Kilometer, "zh") => "公里",
                (DistanceUnit::Kilometer, _) => "kilometers",
                (DistanceUnit::Mile, "de") => "Meilen",
                (DistanceUnit::Mile, "fr") => "milles",
                (DistanceUnit::Mile, "zh") => "英里",
                (DistanceUnit::Mile, _) => "miles",
                (DistanceUnit::NauticalMile, "zh") => "海里",
                (DistanceUnit::NauticalMile, _) => "nautical miles",
                (DistanceUnit::Foot, "de") => "Fuß",
                (DistanceUnit::Foot, "fr") => "pieds",
                (DistanceUnit::Foot, "zh") => "英尺",
                (DistanceUnit::Foot, _) => "feet",
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNITS: [DistanceUnit; 5] = [
        DistanceUnit::Meter,
        DistanceUnit::Kilometer,
        DistanceUnit::Mile,
        DistanceUnit::NauticalMile,
        DistanceUnit::Foot,
    ];

    #[test]
    fn conversions_round_trip() {
        for unit in UNITS {
            for value in [0.0, 0.5, 5.0, 12345.678] {
                let distance = Distance::new(value, unit).unwrap();
                assert!(
                    (distance.to_unit(unit) - value).abs() < 1e-9,
                    "{unit:?} does not round-trip {value}"
                );
            }
        }
    }

    #[test]
    fn unit_ids_round_trip() {
        for unit in UNITS {
            assert_eq!(DistanceUnit::from_id(unit.id()).unwrap(), unit);
        }
        assert!(DistanceUnit::from_id("furlong").is_err());
    }

    #[test]
    fn reference_unit_invariance() {
        let a = Distance::kilometers(5.0).unwrap();
        let b = Distance::meters(5000.0).unwrap();
        assert!((a.to_unit(DistanceUnit::Mile) - b.to_unit(DistanceUnit::Mile)).abs() < 1e-9);
    }

    #[test]
    fn five_kilometers_in_miles() {
        let d = Distance::kilometers(5.0).unwrap();
        assert!((d.to_unit(DistanceUnit::Mile) - 3.10686).abs() < 1e-4);
        assert_eq!(d.to_string_in(DistanceUnit::Mile, 1), "3.1mi");
        assert_eq!(d.to_string_in(DistanceUnit::Kilometer, 1), "5km");
    }

    #[test]
    fn nan_is_rejected_at_construction() {
        assert_eq!(Distance::meters(f64::NAN).unwrap_err(), UnitError::NotANumber);
    }

    #[test]
    fn negative_distance_validates_to_absent() {
        assert!(Distance::meters(-1.0).unwrap().validate_non_negative().is_none());
        assert!(Distance::meters(0.0).unwrap().validate_non_negative().is_some());
    }

    #[test]
    fn country_defaults() {
        assert_eq!(DistanceUnit::default_for_country("US"), DistanceUnit::Mile);
        assert_eq!(DistanceUnit::default_for_country("gb"), DistanceUnit::Mile);
        assert_eq!(DistanceUnit::default_for_country("DE"), DistanceUnit::Meter);
        assert_eq!(DistanceUnit::default_for_country("NL"), DistanceUnit::Meter);
        assert_eq!(DistanceUnit::default_for_country("FR"), DistanceUnit::Kilometer);
    }
}
