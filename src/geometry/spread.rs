//! Transforms that spread fixtures with static pan/tilt offsets.

use super::{GeometryParams, GeometryTransform, Symmetry};
use crate::fixtures::layout::{interpolate_preset, FixtureSlot};
use crate::models::MovementSpec;

const AUDIENCE_NARROW: [f32; 4] = [-15.0, -5.0, 5.0, 15.0];
const AUDIENCE_MEDIUM: [f32; 4] = [-30.0, -10.0, 10.0, 30.0];
const AUDIENCE_WIDE: [f32; 4] = [-45.0, -15.0, 15.0, 45.0];
const AUDIENCE_FULL: [f32; 4] = [-60.0, -20.0, 20.0, 60.0];

const WASH_TIGHT: [f32; 4] = [0.0, 0.0, 0.0, 0.0];
const WASH_MEDIUM: [f32; 4] = [-15.0, -5.0, 5.0, 15.0];
const WASH_WIDE: [f32; 4] = [-30.0, -10.0, 10.0, 30.0];

/// Inner fixtures closer than this to the centre get the chevron tilt lift.
const CHEVRON_INNER_DISTANCE: f32 = 0.6;

fn offset(base: &MovementSpec, pan: f32, tilt: f32) -> MovementSpec {
    base.clone()
        .with_pan_offset_deg(base.pan_offset_deg() + pan)
        .with_tilt_offset_deg(base.tilt_offset_deg() + tilt)
}

pub struct MirrorLr;

impl GeometryTransform for MirrorLr {
    fn id(&self) -> &'static str {
        "mirror_lr"
    }

    fn symmetry(&self) -> Symmetry {
        Symmetry::Symmetric
    }

    fn distribute(
        &self,
        _targets: &[String],
        slots: &[FixtureSlot],
        base: &MovementSpec,
        params: &GeometryParams,
    ) -> Vec<MovementSpec> {
        let pan_spread = params.f32_or("pan_spread_deg", 30.0);
        let tilt_shared = params.f32_or("tilt_offset_deg", 0.0);
        let tilt_spread = params.f32_or("tilt_spread_deg", 0.0);

        slots
            .iter()
            .map(|slot| {
                let tilt = tilt_shared + slot.distance_from_center() * tilt_spread;
                offset(base, slot.signed_distance * pan_spread, tilt)
            })
            .collect()
    }
}

pub struct Fan;

impl GeometryTransform for Fan {
    fn id(&self) -> &'static str {
        "fan"
    }

    fn symmetry(&self) -> Symmetry {
        Symmetry::Symmetric
    }

    fn distribute(
        &self,
        _targets: &[String],
        slots: &[FixtureSlot],
        base: &MovementSpec,
        params: &GeometryParams,
    ) -> Vec<MovementSpec> {
        let spread = params.f32_or("pan_spread_deg", 60.0);
        let center = params.f32_or("center_offset_deg", 0.0);
        slots
            .iter()
            .map(|slot| offset(base, (slot.position - 0.5) * spread + center, 0.0))
            .collect()
    }
}

pub struct ChevronV;

impl GeometryTransform for ChevronV {
    fn id(&self) -> &'static str {
        "chevron_v"
    }

    fn symmetry(&self) -> Symmetry {
        Symmetry::Symmetric
    }

    fn distribute(
        &self,
        _targets: &[String],
        slots: &[FixtureSlot],
        base: &MovementSpec,
        params: &GeometryParams,
    ) -> Vec<MovementSpec> {
        let spread = params.f32_or("pan_spread_deg", 40.0);
        let tightness = params.f32_or("tightness", 0.5).clamp(0.0, 1.0);
        let lift = params.f32_or("tilt_lift_deg", 10.0);
        // shallow (0.35) .. sharp (1.0)
        let factor = 0.35 + 0.65 * tightness;

        slots
            .iter()
            .map(|slot| {
                let magnitude = slot.distance_from_center() * spread * factor;
                let tilt = if slot.distance_from_center() < CHEVRON_INNER_DISTANCE {
                    lift
                } else {
                    0.0
                };
                offset(base, slot.side() * magnitude, tilt)
            })
            .collect()
    }
}

pub struct AudienceScan;

impl GeometryTransform for AudienceScan {
    fn id(&self) -> &'static str {
        "audience_scan"
    }

    fn symmetry(&self) -> Symmetry {
        Symmetry::Asymmetric
    }

    fn distribute(
        &self,
        _targets: &[String],
        slots: &[FixtureSlot],
        base: &MovementSpec,
        params: &GeometryParams,
    ) -> Vec<MovementSpec> {
        let preset: &[f32] = match params.str_or("coverage", "medium") {
            "narrow" => &AUDIENCE_NARROW,
            "wide" => &AUDIENCE_WIDE,
            "full" => &AUDIENCE_FULL,
            "medium" => &AUDIENCE_MEDIUM,
            other => {
                log::warn!("[geometry] audience_scan: unknown coverage '{}', using medium", other);
                &AUDIENCE_MEDIUM
            }
        };
        slots
            .iter()
            .map(|slot| offset(base, interpolate_preset(preset, slot.position), 0.0))
            .collect()
    }
}

pub struct RainbowArc;

impl GeometryTransform for RainbowArc {
    fn id(&self) -> &'static str {
        "rainbow_arc"
    }

    fn symmetry(&self) -> Symmetry {
        Symmetry::Symmetric
    }

    fn distribute(
        &self,
        _targets: &[String],
        slots: &[FixtureSlot],
        base: &MovementSpec,
        params: &GeometryParams,
    ) -> Vec<MovementSpec> {
        let arc = params.f32_or("arc_width_deg", 90.0);
        let curved = params.bool_or("curved", true);
        let lift = params.f32_or("tilt_lift_deg", 15.0);

        slots
            .iter()
            .map(|slot| {
                let pan = -arc / 2.0 + slot.position * arc;
                let tilt = if curved {
                    let edge = 2.0 * (slot.position - 0.5).abs();
                    lift * (1.0 - edge * edge)
                } else {
                    0.0
                };
                offset(base, pan, tilt)
            })
            .collect()
    }
}

pub struct SpotlightCluster;

impl GeometryTransform for SpotlightCluster {
    fn id(&self) -> &'static str {
        "spotlight_cluster"
    }

    fn symmetry(&self) -> Symmetry {
        Symmetry::Symmetric
    }

    fn distribute(
        &self,
        _targets: &[String],
        slots: &[FixtureSlot],
        base: &MovementSpec,
        params: &GeometryParams,
    ) -> Vec<MovementSpec> {
        let target_pan = params.f32_or("target_pan_deg", 0.0);
        let target_tilt = params.f32_or("target_tilt_deg", 0.0);
        let natural_spacing = params.f32_or("natural_spacing_deg", 30.0);
        // 0 = every beam on the target, 1 = natural spacing around it
        let spread = params.f32_or("spread", 0.3).clamp(0.0, 1.0);

        slots
            .iter()
            .map(|slot| {
                let natural = slot.signed_distance * natural_spacing;
                offset(base, target_pan + natural * spread, target_tilt)
            })
            .collect()
    }
}

pub struct WallWash;

impl GeometryTransform for WallWash {
    fn id(&self) -> &'static str {
        "wall_wash"
    }

    fn symmetry(&self) -> Symmetry {
        Symmetry::Asymmetric
    }

    fn distribute(
        &self,
        _targets: &[String],
        slots: &[FixtureSlot],
        base: &MovementSpec,
        params: &GeometryParams,
    ) -> Vec<MovementSpec> {
        let preset: &[f32] = match params.str_or("spacing", "medium") {
            "tight" => &WASH_TIGHT,
            "wide" => &WASH_WIDE,
            "medium" => &WASH_MEDIUM,
            other => {
                log::warn!("[geometry] wall_wash: unknown spacing '{}', using medium", other);
                &WASH_MEDIUM
            }
        };
        slots
            .iter()
            .map(|slot| offset(base, interpolate_preset(preset, slot.position), 0.0))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::layout::compute_slots;
    use serde_json::{json, Map, Value};

    fn run(t: &dyn GeometryTransform, n: usize, p: Value) -> Vec<MovementSpec> {
        let targets: Vec<String> = (0..n).map(|i| format!("F{}", i)).collect();
        let map: Map<String, Value> = p.as_object().cloned().unwrap_or_default();
        t.distribute(&targets, &compute_slots(n), &MovementSpec::hold(), &GeometryParams::new(&map))
    }

    #[test]
    fn chevron_factor_scales_with_tightness() {
        let shallow = run(&ChevronV, 4, json!({"pan_spread_deg": 40, "tightness": 0.0}));
        let sharp = run(&ChevronV, 4, json!({"pan_spread_deg": 40, "tightness": 1.0}));
        assert!((shallow[0].pan_offset_deg() + 14.0).abs() < 1e-3);
        assert!((sharp[0].pan_offset_deg() + 40.0).abs() < 1e-3);
        assert!((sharp[3].pan_offset_deg() - 40.0).abs() < 1e-3);
        // inner pair is lifted, outer pair is not
        assert_eq!(sharp[1].tilt_offset_deg(), 10.0);
        assert_eq!(sharp[0].tilt_offset_deg(), 0.0);
    }

    #[test]
    fn audience_scan_interpolates_presets() {
        let four = run(&AudienceScan, 4, json!({"coverage": "wide"}));
        for (spec, expected) in four.iter().zip([-45.0, -15.0, 15.0, 45.0]) {
            assert!((spec.pan_offset_deg() - expected).abs() < 1e-3);
        }

        let seven = run(&AudienceScan, 7, json!({"coverage": "full"}));
        assert!((seven[0].pan_offset_deg() + 60.0).abs() < 1e-3);
        assert!(seven[3].pan_offset_deg().abs() < 1e-3);
        assert!((seven[6].pan_offset_deg() - 60.0).abs() < 1e-3);
    }

    #[test]
    fn rainbow_arc_peaks_in_the_middle() {
        let specs = run(&RainbowArc, 5, json!({"arc_width_deg": 100, "tilt_lift_deg": 20}));
        assert_eq!(specs[0].pan_offset_deg(), -50.0);
        assert_eq!(specs[4].pan_offset_deg(), 50.0);
        assert_eq!(specs[2].tilt_offset_deg(), 20.0);
        assert!(specs[0].tilt_offset_deg().abs() < 1e-4);

        let flat = run(&RainbowArc, 5, json!({"curved": false}));
        assert!(flat.iter().all(|m| m.tilt_offset_deg() == 0.0));
    }

    #[test]
    fn spotlight_zero_spread_converges() {
        let specs = run(&SpotlightCluster, 6, json!({"spread": 0, "target_pan_deg": 12}));
        assert!(specs.iter().all(|m| m.pan_offset_deg() == 12.0));
    }

    #[test]
    fn wall_wash_subsets_for_other_counts() {
        let two = run(&WallWash, 2, json!({"spacing": "medium"}));
        assert_eq!(two[0].pan_offset_deg(), -15.0);
        assert_eq!(two[1].pan_offset_deg(), 15.0);
        let tight = run(&WallWash, 6, json!({"spacing": "tight"}));
        assert!(tight.iter().all(|m| m.pan_offset_deg() == 0.0));
    }

    #[test]
    fn offsets_accumulate_on_the_base() {
        let targets = vec!["A".to_string(), "B".to_string()];
        let base = MovementSpec::hold().with_pan_offset_deg(5.0);
        let map = Map::new();
        let specs = Fan.distribute(&targets, &compute_slots(2), &base, &GeometryParams::new(&map));
        assert_eq!(specs[0].pan_offset_deg(), -25.0);
        assert_eq!(specs[1].pan_offset_deg(), 35.0);
    }
}
