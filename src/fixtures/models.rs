use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Calibration of one motorized axis (pan or tilt).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct AxisCalibration {
    /// Total physical travel in degrees, mapped over the full 0-255 range.
    pub range_deg: u16,
    /// DMX value that points the axis at 0 degrees.
    pub center_dmx: u8,
    #[serde(default)]
    pub min_dmx: u8,
    #[serde(default = "default_max_dmx")]
    pub max_dmx: u8,
}

fn default_max_dmx() -> u8 {
    255
}

impl AxisCalibration {
    pub fn pan_default() -> Self {
        Self {
            range_deg: 540,
            center_dmx: 128,
            min_dmx: 0,
            max_dmx: 255,
        }
    }

    pub fn tilt_default() -> Self {
        Self {
            range_deg: 270,
            center_dmx: 128,
            min_dmx: 0,
            max_dmx: 255,
        }
    }

    pub fn limits(&self) -> ChannelLimits {
        ChannelLimits {
            min: self.min_dmx.min(self.max_dmx),
            max: self.max_dmx.max(self.min_dmx),
        }
    }

    pub fn dmx_per_degree(&self) -> f32 {
        255.0 / (self.range_deg.max(1) as f32)
    }
}

/// Configured DMX window a channel may move within.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelLimits {
    pub min: u8,
    pub max: u8,
}

impl ChannelLimits {
    pub const FULL: ChannelLimits = ChannelLimits { min: 0, max: 255 };

    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min as f32, self.max as f32)
    }

    pub fn span(&self) -> f32 {
        (self.max as f32 - self.min as f32).max(0.0)
    }
}

impl Default for ChannelLimits {
    fn default() -> Self {
        Self::FULL
    }
}

/// DMX channel numbers (1-based, relative to the fixture's start address).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelMap {
    pub pan: u16,
    pub tilt: u16,
    pub dimmer: u16,
    #[serde(default)]
    pub shutter: Option<u16>,
    #[serde(default)]
    pub color: Option<u16>,
    #[serde(default)]
    pub gobo: Option<u16>,
    #[serde(default)]
    pub red: Option<u16>,
    #[serde(default)]
    pub green: Option<u16>,
    #[serde(default)]
    pub blue: Option<u16>,
}

impl Default for ChannelMap {
    fn default() -> Self {
        Self {
            pan: 1,
            tilt: 3,
            dimmer: 6,
            shutter: Some(7),
            color: Some(8),
            gobo: Some(9),
            red: None,
            green: None,
            blue: None,
        }
    }
}

/// Pan/tilt pose in degrees.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PoseDeg {
    pub pan_deg: f32,
    pub tilt_deg: f32,
}

impl PoseDeg {
    pub fn new(pan_deg: f32, tilt_deg: f32) -> Self {
        Self { pan_deg, tilt_deg }
    }
}

/// One patched moving head.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FixtureConfig {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default = "AxisCalibration::pan_default")]
    pub pan: AxisCalibration,
    #[serde(default = "AxisCalibration::tilt_default")]
    pub tilt: AxisCalibration,
    #[serde(default)]
    pub dimmer: ChannelLimits,
    #[serde(default)]
    pub channels: ChannelMap,
    /// Resting position used as soft home; the render settings supply one otherwise.
    #[serde(default)]
    pub resting: Option<PoseDeg>,
}

impl FixtureConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            pan: AxisCalibration::pan_default(),
            tilt: AxisCalibration::tilt_default(),
            dimmer: ChannelLimits::FULL,
            channels: ChannelMap::default(),
            resting: None,
        }
    }

    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

/// The ordered (left to right) set of fixtures a plan renders onto.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct FixtureGroup {
    pub fixtures: Vec<FixtureConfig>,
    /// Semantic groups, e.g. `left` -> ["MH1", "MH2"]. Built-in groups are
    /// added for any name not configured explicitly.
    #[serde(default)]
    pub groups: HashMap<String, Vec<String>>,
}

impl FixtureGroup {
    pub fn new(fixtures: Vec<FixtureConfig>) -> Self {
        let mut group = Self {
            fixtures,
            groups: HashMap::new(),
        };
        group.fill_semantic_groups();
        group
    }

    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }

    pub fn ids(&self) -> Vec<String> {
        self.fixtures.iter().map(|f| f.id.clone()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&FixtureConfig> {
        self.fixtures.iter().find(|f| f.id == id)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.fixtures.iter().position(|f| f.id == id)
    }

    /// Precompute left/right/center/odd/even/inner/outer membership.
    pub fn fill_semantic_groups(&mut self) {
        let ids = self.ids();
        let n = ids.len();
        let half = n / 2;

        let mut builtin: Vec<(&str, Vec<String>)> = vec![
            ("left", ids[..half].to_vec()),
            ("right", ids[n - half..].to_vec()),
            // 1-based numbering: the first fixture is "odd".
            (
                "odd",
                ids.iter().step_by(2).cloned().collect::<Vec<String>>(),
            ),
            (
                "even",
                ids.iter().skip(1).step_by(2).cloned().collect::<Vec<String>>(),
            ),
        ];

        let center: Vec<String> = if n == 0 {
            Vec::new()
        } else if n % 2 == 1 {
            vec![ids[n / 2].clone()]
        } else {
            ids[half - 1..=half].to_vec()
        };
        let outer: Vec<String> = match n {
            0 => Vec::new(),
            1 => ids.clone(),
            _ => vec![ids[0].clone(), ids[n - 1].clone()],
        };
        let inner: Vec<String> = ids
            .iter()
            .filter(|id| !outer.contains(id))
            .cloned()
            .collect();
        builtin.push(("center", center));
        builtin.push(("outer", outer));
        builtin.push(("inner", inner));

        for (name, members) in builtin {
            self.groups.entry(name.to_string()).or_insert(members);
        }
    }
}
