use serde::{Deserialize, Serialize};

/// Per-species pollen concentrations (grains/m³).
///
/// Same validity rule as [`crate::model::AirQuality`]: all-`None` means
/// absent, never a zero-filled reading.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pollen {
    pub alder: Option<u32>,
    pub birch: Option<u32>,
    pub grass: Option<u32>,
    pub mugwort: Option<u32>,
    pub olive: Option<u32>,
    pub ragweed: Option<u32>,
    pub tree: Option<u32>,
    pub mold: Option<u32>,
}

impl Pollen {
    pub fn is_valid(&self) -> bool {
        self.alder.is_some()
            || self.birch.is_some()
            || self.grass.is_some()
            || self.mugwort.is_some()
            || self.olive.is_some()
            || self.ragweed.is_some()
            || self.tree.is_some()
            || self.mold.is_some()
    }

    pub fn validate(self) -> Option<Self> {
        self.is_valid().then_some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_null_instance_is_absent() {
        assert!(Pollen::default().validate().is_none());
    }
}
