//! Strongly-typed physical quantities and their unit catalogs.
//!
//! Every quantity stores a single raw `f64` in one fixed reference unit
//! (meters, degrees Celsius, m/s, pascals, millimeters, mm/h, µg/m³,
//! fraction). Conversions pivot through the reference unit and are computed
//! fresh on every call, never cached. Unit catalogs are immutable lookup
//! tables shared read-only across refreshes.

use crate::error::UnitError;

pub mod distance;
pub mod format;
pub mod pollutant;
pub mod precipitation;
pub mod precipitation_intensity;
pub mod pressure;
pub mod ratio;
pub mod speed;
pub mod temperature;

pub use distance::{Distance, DistanceUnit};
pub use format::{FormattingCapabilities, Locale, UnitWidth};
pub use pollutant::{PollutantConcentration, PollutantConcentrationUnit};
pub use precipitation::{Precipitation, PrecipitationUnit};
pub use precipitation_intensity::{PrecipitationIntensity, PrecipitationIntensityUnit};
pub use pressure::{Pressure, PressureUnit};
pub use ratio::{Ratio, RatioUnit};
pub use speed::{Speed, SpeedUnit};
pub use temperature::{Temperature, TemperatureUnit};

/// One selectable unit of a physical quantity.
///
/// Implementations are fieldless enums acting as fixed catalogs: identifier
/// strings for persistence roundtrips, bidirectional conversions to the
/// quantity's reference unit, display precision per width, and optional
/// ICU-style unit handles consumed by the formatting engine.
pub trait WeatherUnit: Copy + Eq + std::fmt::Debug {
    /// Stable identifier used in persisted preferences ("km", "mi", ...).
    fn id(self) -> &'static str;

    /// Resolve a persisted identifier back to a unit.
    fn from_id(id: &str) -> Result<Self, UnitError>;

    /// ICU unit handle for the platform formatters. Absent for units the
    /// platform has no mapping for, which forces the manual fallback.
    fn icu_id(self) -> Option<&'static str>;

    /// Composite "per" units (e.g. mm/h) need a newer formatter than
    /// simple units; gated separately in [`FormattingCapabilities`].
    fn is_per_composite(self) -> bool {
        false
    }

    /// Convert a value expressed in this unit into the reference unit.
    fn to_reference(self, value: f64) -> f64;

    /// Convert a reference-unit value into this unit.
    fn from_reference(self, value: f64) -> f64;

    /// Display precision (decimal places) per formatting width.
    fn precision(self, width: UnitWidth) -> usize;

    /// Axis gridline bucket size for charts, in this unit.
    fn chart_step(self) -> f64;

    /// Localized unit name at the given width. English is the fallback
    /// for locales without an entry.
    fn name(self, locale: &Locale, width: UnitWidth) -> &'static str;
}

/// Reject NaN at construction time so a corrupt value can never enter a
/// weather aggregate.
pub(crate) fn guard_nan(value: f64) -> Result<f64, UnitError> {
    if value.is_nan() {
        Err(UnitError::NotANumber)
    } else {
        Ok(value)
    }
}
