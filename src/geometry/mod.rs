//! Geometry Engine
//!
//! Distributes one movement instruction across an ordered set of fixtures.
//! Every transform is a pure function of (targets, base movement, params) and
//! returns a fresh `MovementSpec` per fixture; the base is never touched.

use once_cell::sync::Lazy;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::fixtures::layout::{compute_slots, FixtureSlot};
use crate::models::MovementSpec;

mod chaos;
mod formation;
mod phase;
mod spread;

/// Whether a transform can share one curve across fixtures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symmetry {
    /// Static per-fixture offsets on a shared curve.
    Symmetric,
    /// Per-fixture curves are required (phase, roles, irregular offsets).
    Asymmetric,
}

pub trait GeometryTransform: Send + Sync {
    fn id(&self) -> &'static str;

    fn symmetry(&self) -> Symmetry;

    /// One spec per slot, in slot order.
    fn distribute(
        &self,
        targets: &[String],
        slots: &[FixtureSlot],
        base: &MovementSpec,
        params: &GeometryParams,
    ) -> Vec<MovementSpec>;
}

/// Typed accessors over the loosely-typed parameter map from the plan.
#[derive(Debug, Clone, Copy)]
pub struct GeometryParams<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> GeometryParams<'a> {
    pub fn new(map: &'a Map<String, Value>) -> Self {
        Self { map }
    }

    pub fn f32_or(&self, key: &str, default: f32) -> f32 {
        self.opt_f32(key).unwrap_or(default)
    }

    /// A finite number, given either as a JSON number or a numeric string.
    pub fn opt_f32(&self, key: &str) -> Option<f32> {
        self.map
            .get(key)
            .and_then(|v| {
                v.as_f64()
                    .or_else(|| v.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
            })
            .map(|v| v as f32)
            .filter(|v| v.is_finite())
    }

    pub fn str_or(&self, key: &str, default: &'a str) -> &'a str {
        self.map
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or(default)
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        match self.map.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().map(|v| v > 0.5).unwrap_or(default),
            Some(Value::String(s)) => matches!(s.as_str(), "true" | "yes" | "1"),
            _ => default,
        }
    }

    pub fn u64_opt(&self, key: &str) -> Option<u64> {
        self.map.get(key).and_then(|v| {
            v.as_u64()
                .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }
}

static REGISTRY: Lazy<HashMap<&'static str, Box<dyn GeometryTransform>>> = Lazy::new(|| {
    let transforms: Vec<Box<dyn GeometryTransform>> = vec![
        Box::new(spread::MirrorLr),
        Box::new(phase::WaveLr),
        Box::new(spread::Fan),
        Box::new(spread::ChevronV),
        Box::new(spread::AudienceScan),
        Box::new(spread::RainbowArc),
        Box::new(spread::SpotlightCluster),
        Box::new(phase::TunnelCone),
        Box::new(spread::WallWash),
        Box::new(formation::XCross),
        Box::new(formation::CenterOut),
        Box::new(formation::OutsideIn),
        Box::new(chaos::ScatteredChaos),
        Box::new(formation::AlternatingUpDown),
    ];
    transforms.into_iter().map(|t| (t.id(), t)).collect()
});

/// Synthetic group sizes tried when checking whether parameters produce offsets.
/// Several transforms lay fixtures out differently for odd and even counts.
const CHECK_GROUP_SIZES: [usize; 3] = [2, 3, 4];

pub struct GeometryEngine;

impl GeometryEngine {
    pub fn transform(geometry_type: &str) -> Option<&'static dyn GeometryTransform> {
        REGISTRY.get(geometry_type).map(|t| t.as_ref())
    }

    pub fn known_types() -> Vec<&'static str> {
        let mut ids: Vec<&'static str> = REGISTRY.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn symmetry(geometry_type: &str) -> Option<Symmetry> {
        Self::transform(geometry_type).map(|t| t.symmetry())
    }

    /// Per-fixture movement for every target. Absent or unknown geometry
    /// yields an identical copy of `base` for each target.
    pub fn apply(
        geometry_type: Option<&str>,
        targets: &[String],
        base: &MovementSpec,
        params: &Map<String, Value>,
    ) -> HashMap<String, MovementSpec> {
        let identity = || {
            targets
                .iter()
                .map(|id| (id.clone(), base.clone()))
                .collect::<HashMap<_, _>>()
        };

        let Some(kind) = geometry_type else {
            return identity();
        };
        let Some(transform) = Self::transform(kind) else {
            log::warn!(
                "[geometry] unknown geometry type '{}'; using base movement for {} fixtures",
                kind,
                targets.len()
            );
            return identity();
        };

        let slots = compute_slots(targets.len());
        let specs = transform.distribute(targets, &slots, base, &GeometryParams::new(params));
        targets.iter().cloned().zip(specs).collect()
    }

    /// False for a single fixture or no geometry; otherwise the transform's
    /// classification decides.
    pub fn should_use_per_fixture_curves(geometry_type: Option<&str>, fixture_count: usize) -> bool {
        if fixture_count <= 1 {
            return false;
        }
        geometry_type
            .and_then(Self::symmetry)
            .map(|s| s == Symmetry::Asymmetric)
            .unwrap_or(false)
    }

    /// Whether these parameters actually give fixtures differing values.
    ///
    /// Checked on synthetic groups of two, three and four fixtures; any size
    /// that yields a difference counts.
    pub fn contains_offsets(geometry_type: Option<&str>, params: &Map<String, Value>) -> bool {
        let Some(transform) = geometry_type.and_then(Self::transform) else {
            return false;
        };
        let base = MovementSpec::hold();
        let params = GeometryParams::new(params);
        CHECK_GROUP_SIZES.iter().any(|&n| {
            let targets: Vec<String> = (1..=n).map(|i| format!("synthetic{}", i)).collect();
            let specs = transform.distribute(&targets, &compute_slots(n), &base, &params);
            match specs.split_first() {
                Some((first, rest)) => rest.iter().any(|s| s.differs_spatially(first)),
                None => false,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Intensity, TiltRole};
    use serde_json::json;

    fn ids(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("MH{}", i)).collect()
    }

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    fn pan_offsets(kind: &str, n: usize, p: Value) -> Vec<f32> {
        let targets = ids(n);
        let out = GeometryEngine::apply(Some(kind), &targets, &MovementSpec::hold(), &params(p));
        targets.iter().map(|id| out[id].pan_offset_deg()).collect()
    }

    fn assert_close(actual: &[f32], expected: &[f32]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-3, "{:?} != {:?}", actual, expected);
        }
    }

    #[test]
    fn registry_holds_every_transform() {
        assert_eq!(GeometryEngine::known_types().len(), 14);
        assert_eq!(
            GeometryEngine::symmetry("mirror_lr"),
            Some(Symmetry::Symmetric)
        );
        assert_eq!(
            GeometryEngine::symmetry("alternating_updown"),
            Some(Symmetry::Asymmetric)
        );
    }

    #[test]
    fn absent_or_unknown_geometry_copies_base() {
        let base = MovementSpec::new("sweep_lr", Intensity::Fast);
        let targets = ids(3);
        for kind in [None, Some("does_not_exist")] {
            let out = GeometryEngine::apply(kind, &targets, &base, &Map::new());
            assert_eq!(out.len(), 3);
            assert!(out.values().all(|m| m == &base));
        }
    }

    #[test]
    fn mirror_lr_scenario_and_antisymmetry() {
        let offsets = pan_offsets("mirror_lr", 4, json!({"pan_spread_deg": 30}));
        assert_close(&offsets, &[-30.0, -10.0, 10.0, 30.0]);

        for n in 2..9 {
            let offsets = pan_offsets("mirror_lr", n, json!({"pan_spread_deg": 40}));
            for i in 0..n {
                assert!((offsets[i] + offsets[n - 1 - i]).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn wave_lr_auto_spacing_is_even() {
        let targets = ids(4);
        let out = GeometryEngine::apply(
            Some("wave_lr"),
            &targets,
            &MovementSpec::hold(),
            &params(json!({"phase_spacing": "auto"})),
        );
        let phases: Vec<f32> = targets.iter().map(|id| out[id].phase_deg()).collect();
        assert_close(&phases, &[0.0, 90.0, 180.0, 270.0]);

        for n in 2..10 {
            let targets = ids(n);
            let out = GeometryEngine::apply(
                Some("wave_lr"),
                &targets,
                &MovementSpec::hold(),
                &params(json!({"direction": "forward"})),
            );
            let phases: Vec<f32> = targets.iter().map(|id| out[id].phase_deg()).collect();
            for pair in phases.windows(2) {
                assert!(pair[1] > pair[0]);
                assert!((pair[1] - pair[0] - 360.0 / n as f32).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn fan_is_strictly_increasing() {
        for n in 2..9 {
            let offsets = pan_offsets("fan", n, json!({"pan_spread_deg": 50, "center_offset_deg": 5}));
            assert!(offsets.windows(2).all(|w| w[1] > w[0]), "{:?}", offsets);
        }
    }

    #[test]
    fn tunnel_cone_first_fixture_sits_at_half_spread() {
        let offsets = pan_offsets(
            "tunnel_cone",
            4,
            json!({"pan_spread_deg": 90, "center_pan_deg": 0}),
        );
        assert!((offsets[0] - 45.0).abs() < 1e-3);
        assert!((offsets[2] + 45.0).abs() < 1e-3);
    }

    #[test]
    fn base_movement_is_never_mutated() {
        let base = MovementSpec::new("circle", Intensity::Slow).with_pan_offset_deg(3.0);
        let snapshot = base.clone();
        for kind in GeometryEngine::known_types() {
            let _ = GeometryEngine::apply(Some(kind), &ids(5), &base, &Map::new());
        }
        assert_eq!(base, snapshot);
    }

    #[test]
    fn offset_check_tracks_parameters() {
        assert!(!GeometryEngine::contains_offsets(
            Some("wall_wash"),
            &params(json!({"spacing": "tight"}))
        ));
        assert!(GeometryEngine::contains_offsets(
            Some("wall_wash"),
            &params(json!({"spacing": "wide"}))
        ));
        assert!(GeometryEngine::contains_offsets(
            Some("alternating_updown"),
            &Map::new()
        ));
        assert!(!GeometryEngine::contains_offsets(
            Some("spotlight_cluster"),
            &params(json!({"spread": 0}))
        ));
        assert!(!GeometryEngine::contains_offsets(None, &Map::new()));
    }

    #[test]
    fn offset_check_agrees_with_small_groups() {
        for kind in ["mirror_lr", "fan", "x_cross", "wave_lr", "alternating_updown"] {
            assert!(GeometryEngine::contains_offsets(Some(kind), &Map::new()), "{}", kind);
            for n in [2, 3] {
                let targets = ids(n);
                let out = GeometryEngine::apply(Some(kind), &targets, &MovementSpec::hold(), &Map::new());
                let first = &out[&targets[0]];
                assert!(
                    targets[1..].iter().any(|id| out[id].differs_spatially(first)),
                    "{} with {} fixtures",
                    kind,
                    n
                );
            }
        }
        let tight = params(json!({"spacing": "tight"}));
        assert!(!GeometryEngine::contains_offsets(Some("wall_wash"), &tight));
        for n in [2, 3] {
            let targets = ids(n);
            let out = GeometryEngine::apply(Some("wall_wash"), &targets, &MovementSpec::hold(), &tight);
            assert!(targets.iter().all(|id| out[id].pan_offset_deg() == 0.0));
        }
    }

    #[test]
    fn per_fixture_curve_query() {
        assert!(!GeometryEngine::should_use_per_fixture_curves(Some("wave_lr"), 1));
        assert!(!GeometryEngine::should_use_per_fixture_curves(None, 8));
        assert!(GeometryEngine::should_use_per_fixture_curves(Some("wave_lr"), 4));
        assert!(!GeometryEngine::should_use_per_fixture_curves(Some("fan"), 4));
        assert!(!GeometryEngine::should_use_per_fixture_curves(Some("nope"), 4));
    }

    #[test]
    fn alternating_roles_follow_parity() {
        let targets = ids(4);
        let every_other = GeometryEngine::apply(
            Some("alternating_updown"),
            &targets,
            &MovementSpec::hold(),
            &Map::new(),
        );
        let roles: Vec<_> = targets.iter().map(|id| every_other[id].tilt_role()).collect();
        assert_eq!(
            roles,
            vec![
                Some(TiltRole::Up),
                Some(TiltRole::Down),
                Some(TiltRole::Up),
                Some(TiltRole::Down)
            ]
        );

        let pairs = GeometryEngine::apply(
            Some("alternating_updown"),
            &targets,
            &MovementSpec::hold(),
            &params(json!({"pattern": "pairs"})),
        );
        let roles: Vec<_> = targets.iter().map(|id| pairs[id].tilt_role()).collect();
        assert_eq!(
            roles,
            vec![
                Some(TiltRole::Up),
                Some(TiltRole::Up),
                Some(TiltRole::Down),
                Some(TiltRole::Down)
            ]
        );
    }
}
