use serde::{Deserialize, Serialize};

use crate::units::PollutantConcentration;

/// Per-substance pollutant concentrations.
///
/// An instance is only meaningful if at least one constituent is present;
/// an all-`None` instance must be mapped to `None` by callers so a source
/// that returns nothing is not mistaken for one reporting clean air.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AirQuality {
    pub pm25: Option<PollutantConcentration>,
    pub pm10: Option<PollutantConcentration>,
    pub so2: Option<PollutantConcentration>,
    pub no2: Option<PollutantConcentration>,
    pub o3: Option<PollutantConcentration>,
    pub co: Option<PollutantConcentration>,
}

impl AirQuality {
    pub fn is_valid(&self) -> bool {
        self.pm25.is_some()
            || self.pm10.is_some()
            || self.so2.is_some()
            || self.no2.is_some()
            || self.o3.is_some()
            || self.co.is_some()
    }

    /// Collapse an all-`None` instance to absence.
    pub fn validate(self) -> Option<Self> {
        self.is_valid().then_some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_null_instance_is_absent() {
        assert!(AirQuality::default().validate().is_none());
    }

    #[test]
    fn single_field_makes_instance_valid() {
        let aq = AirQuality {
            pm25: PollutantConcentration::micrograms_per_cubic_meter(12.0).ok(),
            ..Default::default()
        };
        assert!(aq.validate().is_some());
    }
}
