use super::{GeometryParams, GeometryTransform, Symmetry};
use crate::fixtures::layout::FixtureSlot;
use crate::models::{MovementSpec, TiltRole};

fn offset(base: &MovementSpec, pan: f32, tilt: f32) -> MovementSpec {
    base.clone()
        .with_pan_offset_deg(base.pan_offset_deg() + pan)
        .with_tilt_offset_deg(base.tilt_offset_deg() + tilt)
}

/// Two halves aiming along crossing diagonals.
pub struct XCross;

impl GeometryTransform for XCross {
    fn id(&self) -> &'static str {
        "x_cross"
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
        let pan_spread = params.f32_or("pan_spread_deg", 30.0);
        let tilt_spread = params.f32_or("tilt_spread_deg", 15.0);
        let swapped = params.u64_opt("swap_phase").unwrap_or(0) % 2 == 1;
        let direction = if swapped { -1.0 } else { 1.0 };

        let n = slots.len();
        // Odd counts put the middle fixture in the right half.
        let left_len = n / 2;
        let right_len = n - left_len;

        slots
            .iter()
            .map(|slot| {
                // Outer fixtures get the full spread.
                let (scale, pan_sign, tilt_sign) = if slot.index < left_len {
                    let scale = (left_len - slot.index) as f32 / left_len as f32;
                    (scale, 1.0, 1.0)
                } else {
                    let in_group = slot.index - left_len;
                    let scale = (in_group + 1) as f32 / right_len as f32;
                    (scale, -1.0, -1.0)
                };
                offset(
                    base,
                    direction * pan_sign * pan_spread * scale,
                    direction * tilt_sign * tilt_spread * scale,
                )
            })
            .collect()
    }
}

/// Normalized [0, 1] progress from either `progress` or `step` / `steps`.
fn step_progress(params: &GeometryParams) -> f32 {
    if let Some(progress) = params.opt_f32("progress") {
        return progress.clamp(0.0, 1.0);
    }
    let steps = params.u64_opt("steps").unwrap_or(4).max(1);
    let step = params.u64_opt("step").unwrap_or(0).min(steps - 1);
    if steps == 1 {
        1.0
    } else {
        step as f32 / (steps - 1) as f32
    }
}

fn radiate(slots: &[FixtureSlot], base: &MovementSpec, max_spread: f32, progress: f32) -> Vec<MovementSpec> {
    slots
        .iter()
        .map(|slot| offset(base, (slot.position - 0.5) * 2.0 * max_spread * progress, 0.0))
        .collect()
}

pub struct CenterOut;

impl GeometryTransform for CenterOut {
    fn id(&self) -> &'static str {
        "center_out"
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
        let max_spread = params.f32_or("max_spread_deg", 45.0);
        radiate(slots, base, max_spread, step_progress(params))
    }
}

pub struct OutsideIn;

impl GeometryTransform for OutsideIn {
    fn id(&self) -> &'static str {
        "outside_in"
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
        let max_spread = params.f32_or("max_spread_deg", 45.0);
        radiate(slots, base, max_spread, 1.0 - step_progress(params))
    }
}

/// Alternating tilt roles, by fixture or by pair.
pub struct AlternatingUpDown;

impl GeometryTransform for AlternatingUpDown {
    fn id(&self) -> &'static str {
        "alternating_updown"
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
        let pairs = match params.str_or("pattern", "every_other") {
            "pairs" => true,
            "every_other" => false,
            other => {
                log::warn!(
                    "[geometry] alternating_updown: unknown pattern '{}', using every_other",
                    other
                );
                false
            }
        };
        let amplitude = params.f32_or("tilt_amplitude_deg", 20.0);

        slots
            .iter()
            .map(|slot| {
                let group = if pairs { slot.index / 2 } else { slot.index };
                let (role, sign) = if group % 2 == 0 {
                    (TiltRole::Up, 1.0)
                } else {
                    (TiltRole::Down, -1.0)
                };
                base.clone()
                    .with_tilt_role(Some(role))
                    .with_tilt_offset_deg(base.tilt_offset_deg() + sign * amplitude)
            })
            .collect()
    }
}
