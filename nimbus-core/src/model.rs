//! Canonical weather aggregates.
//!
//! All aggregates are immutable value objects assembled once per refresh by
//! the mapper; a new `Weather` replaces the old one atomically. A `None`
//! field always means "this source never supplied this metric" and must
//! stay distinguishable from zero or from an empty collection.

pub mod air_quality;
pub mod alert;
pub mod code;
pub mod pollen;
pub mod weather;
pub mod wrapper;

pub use air_quality::AirQuality;
pub use alert::{Alert, AlertSeverity, synthesized_alert_id};
pub use code::WeatherCode;
pub use pollen::Pollen;
pub use weather::{
    Astro, Base, Current, Daily, DailyStat, DegreeDay, HalfDay, Hourly, Minutely, MoonPhase,
    Normals, Precipitation, PrecipitationDuration, PrecipitationProbability, Temperature, UV,
    Weather, Wind,
};
pub use wrapper::{HourlyWrapper, SecondaryWeatherWrapper, WeatherWrapper};
