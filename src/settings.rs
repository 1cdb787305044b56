use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{RenderError, RenderResult};
use crate::fixtures::models::PoseDeg;

/// Share of a large gap spent in each gap-fill phase.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GapSplit {
    pub ramp_out: f32,
    pub hold: f32,
    pub ramp_in: f32,
}

impl GapSplit {
    /// Fractions rescaled to sum to one; falls back to the default split.
    pub fn normalized(&self) -> GapSplit {
        let parts = [self.ramp_out, self.hold, self.ramp_in];
        let total: f32 = parts.iter().sum();
        if parts.iter().any(|p| !p.is_finite() || *p < 0.0) || total <= f32::EPSILON {
            return GapSplit::default();
        }
        GapSplit {
            ramp_out: self.ramp_out / total,
            hold: self.hold / total,
            ramp_in: self.ramp_in / total,
        }
    }
}

impl Default for GapSplit {
    fn default() -> Self {
        Self {
            ramp_out: 0.4,
            hold: 0.2,
            ramp_in: 0.4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderSettings {
    pub large_gap_threshold_ms: u64,
    pub min_gap_ms: u64,
    /// Resting pose for idle fixtures without their own resting position.
    pub soft_home: PoseDeg,
    pub curve_points: usize,
    /// Blend length when a crossfade does not request one.
    pub default_blend_ms: u64,
    /// Largest share of either neighbouring effect a blend may cover.
    pub blend_window_fraction: f32,
    pub gap_split: GapSplit,
    pub shutter_open: u8,
    pub shutter_closed: u8,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            large_gap_threshold_ms: 5000,
            min_gap_ms: 100,
            soft_home: PoseDeg::new(0.0, 0.0),
            curve_points: 25,
            default_blend_ms: 500,
            blend_window_fraction: 0.3,
            gap_split: GapSplit::default(),
            shutter_open: 255,
            shutter_closed: 0,
        }
    }
}

impl RenderSettings {
    pub fn load(path: &Path) -> RenderResult<RenderSettings> {
        let content = fs::read_to_string(path).map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Build from flat string key/value pairs. Unknown keys are ignored and
    /// unparsable values keep their defaults.
    pub fn from_map(map: &HashMap<String, String>) -> RenderSettings {
        let defaults = RenderSettings::default();
        let parse_f32 = |key: &str, default: f32| {
            map.get(key)
                .and_then(|v| v.trim().parse::<f32>().ok())
                .filter(|v| v.is_finite())
                .unwrap_or(default)
        };

        RenderSettings {
            large_gap_threshold_ms: map
                .get("large_gap_threshold_ms")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.large_gap_threshold_ms),
            min_gap_ms: map
                .get("min_gap_ms")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.min_gap_ms),
            soft_home: PoseDeg::new(
                parse_f32("soft_home_pan_deg", defaults.soft_home.pan_deg),
                parse_f32("soft_home_tilt_deg", defaults.soft_home.tilt_deg),
            ),
            curve_points: map
                .get("curve_points")
                .and_then(|v| v.trim().parse::<usize>().ok())
                .map(|v| v.max(2))
                .unwrap_or(defaults.curve_points),
            default_blend_ms: map
                .get("default_blend_ms")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.default_blend_ms),
            blend_window_fraction: parse_f32("blend_window_fraction", defaults.blend_window_fraction)
                .clamp(0.0, 0.5),
            gap_split: GapSplit {
                ramp_out: parse_f32("gap_ramp_out", defaults.gap_split.ramp_out),
                hold: parse_f32("gap_hold", defaults.gap_split.hold),
                ramp_in: parse_f32("gap_ramp_in", defaults.gap_split.ramp_in),
            }
            .normalized(),
            shutter_open: map
                .get("shutter_open")
                .and_then(|v| v.trim().parse::<u8>().ok())
                .unwrap_or(defaults.shutter_open),
            shutter_closed: map
                .get("shutter_closed")
                .and_then(|v| v.trim().parse::<u8>().ok())
                .unwrap_or(defaults.shutter_closed),
        }
    }
}
