use super::{GeometryParams, GeometryTransform, Symmetry};
use crate::fixtures::layout::FixtureSlot;
use crate::models::MovementSpec;

/// Degrees of tilt per unit of cone radius.
const CONE_TILT_PER_RADIUS: f32 = 10.0;

/// Travelling wave: same movement, phase advancing across the rig.
pub struct WaveLr;

impl GeometryTransform for WaveLr {
    fn id(&self) -> &'static str {
        "wave_lr"
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
        let n = slots.len().max(1);
        let auto = 360.0 / n as f32;
        let spacing = match params.opt_f32("phase_spacing") {
            Some(deg) => deg,
            None => {
                let raw = params.str_or("phase_spacing", "auto");
                if raw.trim() != "auto" {
                    log::warn!(
                        "[geometry] wave_lr: unreadable phase_spacing '{}', using auto",
                        raw
                    );
                }
                auto
            }
        };
        let reverse = params.str_or("direction", "forward") == "reverse";

        slots
            .iter()
            .map(|slot| {
                let step = if reverse {
                    n - 1 - slot.index
                } else {
                    slot.index
                };
                base.clone()
                    .with_phase_deg(base.phase_deg() + step as f32 * spacing)
            })
            .collect()
    }
}

/// Fixtures distributed around a circle, projected onto pan and tilt.
pub struct TunnelCone;

impl GeometryTransform for TunnelCone {
    fn id(&self) -> &'static str {
        "tunnel_cone"
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
        let center = params.f32_or("center_pan_deg", 0.0);
        let spread = params.f32_or("pan_spread_deg", 60.0);
        let radius = params.f32_or("radius", 1.0);
        let n = slots.len().max(1);

        slots
            .iter()
            .map(|slot| {
                let angle = (slot.index as f32 * 360.0 / n as f32).to_radians();
                let pan = center + angle.cos() * spread / 2.0;
                let tilt = angle.sin() * radius * CONE_TILT_PER_RADIUS;
                base.clone()
                    .with_pan_offset_deg(base.pan_offset_deg() + pan)
                    .with_tilt_offset_deg(base.tilt_offset_deg() + tilt)
            })
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
    fn reverse_wave_runs_right_to_left() {
        let specs = run(&WaveLr, 4, json!({"direction": "reverse"}));
        let phases: Vec<f32> = specs.iter().map(|m| m.phase_deg()).collect();
        assert_eq!(phases, vec![270.0, 180.0, 90.0, 0.0]);
    }

    #[test]
    fn explicit_spacing_wraps_around() {
        let specs = run(&WaveLr, 3, json!({"phase_spacing": 200}));
        let phases: Vec<f32> = specs.iter().map(|m| m.phase_deg()).collect();
        assert_eq!(phases, vec![0.0, 200.0, 40.0]);
    }

    #[test]
    fn numeric_string_spacing_is_honoured() {
        let specs = run(&WaveLr, 3, json!({"phase_spacing": "90"}));
        let phases: Vec<f32> = specs.iter().map(|m| m.phase_deg()).collect();
        assert_eq!(phases, vec![0.0, 90.0, 180.0]);

        let specs = run(&WaveLr, 3, json!({"phase_spacing": "auto"}));
        let phases: Vec<f32> = specs.iter().map(|m| m.phase_deg()).collect();
        assert_eq!(phases, vec![0.0, 120.0, 240.0]);
    }

    #[test]
    fn tunnel_cone_tilt_follows_sine() {
        let specs = run(&TunnelCone, 4, json!({"radius": 2.0}));
        assert!(specs[0].tilt_offset_deg().abs() < 1e-3);
        assert!((specs[1].tilt_offset_deg() - 20.0).abs() < 1e-3);
        assert!((specs[3].tilt_offset_deg() + 20.0).abs() < 1e-3);
        assert!(specs[1].pan_offset_deg().abs() < 1e-3);
    }
}
