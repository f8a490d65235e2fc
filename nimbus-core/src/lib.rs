//! Core library for the `nimbus` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Abstraction over weather sources and their converters
//! - The canonical weather model shared by all sources
//! - Unit-typed quantities with locale-aware formatting
//!
//! It is used by `nimbus-cli`, but can also be reused by other binaries or
//! services.

pub mod config;
pub mod error;
pub mod location;
pub mod mapper;
pub mod model;
pub mod source;
pub mod units;

pub use config::{Config, SourceConfig};
pub use error::{SourceError, UnitError};
pub use location::Location;
pub use model::{Weather, WeatherWrapper};
pub use source::{SecondaryWeatherSource, SourceFeature, SourceId, WeatherSource};
