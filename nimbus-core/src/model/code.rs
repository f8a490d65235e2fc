use serde::{Deserialize, Serialize};

/// Shared weather-condition vocabulary all source-specific codes map into.
///
/// Converters resolve unmapped upstream codes to `None`, never to a guessed
/// default; callers must treat a missing code as "unknown", not "clear".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeatherCode {
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Wind,
    Rain,
    Sleet,
    Snow,
    Hail,
    Thunderstorm,
    Haze,
    Thunder,
}

impl WeatherCode {
    pub fn is_precipitation(self) -> bool {
        matches!(
            self,
            WeatherCode::Rain
                | WeatherCode::Sleet
                | WeatherCode::Snow
                | WeatherCode::Hail
                | WeatherCode::Thunderstorm
        )
    }
}
