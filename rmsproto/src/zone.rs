//! Motion zones (blending tolerances)
//!
//! A zone is `[pzone_tcp, pzone_ori, zone_ori]`: the radius in mm around a
//! target where the TCP is not rigidly constrained, the same radius for tool
//! orientation, and the reorientation zone in degrees. Presets follow the
//! controller handbook and are expressed in controller units.

use serde::{Deserialize, Serialize};

use crate::types::{Refusal, UnitScale};

/// Zone key used when none is given
pub const DEFAULT_ZONE: &str = "z1";

const PRESETS: [(&str, [f64; 3]); 10] = [
    ("z0", [0.3, 0.3, 0.03]),
    ("z1", [1.0, 1.0, 0.1]),
    ("z5", [5.0, 8.0, 0.8]),
    ("z10", [10.0, 15.0, 1.5]),
    ("z15", [15.0, 23.0, 2.3]),
    ("z20", [20.0, 30.0, 3.0]),
    ("z30", [30.0, 45.0, 4.5]),
    ("z50", [50.0, 75.0, 7.5]),
    ("z100", [100.0, 150.0, 15.0]),
    ("z200", [200.0, 300.0, 30.0]),
];

/// Look up a preset by key
pub fn preset(key: &str) -> Option<[f64; 3]> {
    PRESETS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, tolerances)| *tolerances)
}

/// Requested zone, resolved with precedence exact stop, then manual, then preset
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ZoneRequest {
    pub key: String,
    #[serde(default)]
    pub exact: bool,
    /// Used only when it holds exactly three values
    #[serde(default)]
    pub manual: Vec<f64>,
}

impl Default for ZoneRequest {
    fn default() -> Self {
        Self::preset(DEFAULT_ZONE)
    }
}

impl ZoneRequest {
    pub fn preset(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            exact: false,
            manual: Vec::new(),
        }
    }

    /// Go to the point exactly and stop briefly
    pub fn exact() -> Self {
        Self {
            exact: true,
            ..Self::default()
        }
    }

    pub fn manual(tolerances: [f64; 3]) -> Self {
        Self::default().with_manual(tolerances.to_vec())
    }

    pub fn with_manual(mut self, manual: Vec<f64>) -> Self {
        self.manual = manual;
        self
    }

    /// Resolve to controller-unit tolerances. Manual zones are in caller
    /// units and get scaled; presets are already in controller units.
    pub fn resolve(&self, scale: &UnitScale) -> Result<ZoneTolerance, Refusal> {
        if self.exact {
            return Ok(ZoneTolerance {
                exact: true,
                values: [0.0; 3],
            });
        }
        if let [tcp, ori, angle] = self.manual[..] {
            return Ok(ZoneTolerance {
                exact: false,
                values: [scale.length_out(tcp), scale.length_out(ori), scale.angle_out(angle)],
            });
        }
        preset(&self.key)
            .map(|values| ZoneTolerance { exact: false, values })
            .ok_or_else(|| Refusal::UnknownZone(self.key.clone()))
    }
}

/// Resolved zone in controller units
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ZoneTolerance {
    pub exact: bool,
    pub values: [f64; 3],
}
