//! Curve Library
//!
//! Maps a pattern id and a categorical intensity tier onto concrete channel
//! values for one fixture. Tables are immutable and shared by every worker.

use once_cell::sync::Lazy;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::str::FromStr;

use crate::fixtures::engine::percent_to_dmx;
use crate::fixtures::models::ChannelLimits;
use crate::models::{to_dmx, ChannelValue, CurvePoint, CustomCurve, Intensity, MovementSpec, NativeCurve, NativeKind};

/// Full DMX span a movement amplitude fraction refers to.
const PHYSICAL_RANGE: f32 = 255.0;

/// Raw point count of generated custom dimmer curves (smoothed later).
const FLICKER_POINTS: usize = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRole {
    Pan,
    Tilt,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementTier {
    /// Fraction of the physical channel range covered peak to peak.
    pub amplitude: f32,
    /// Cycles per effect.
    pub cycles: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DimmerTier {
    pub min_pct: f32,
    pub max_pct: f32,
    pub cycles: f32,
}

pub fn movement_tier(intensity: Intensity) -> MovementTier {
    let (amplitude, cycles) = match intensity {
        Intensity::Smooth => (0.08, 0.5),
        Intensity::Slow => (0.12, 1.0),
        Intensity::Moderate => (0.2, 2.0),
        Intensity::Fast => (0.3, 4.0),
        Intensity::Dramatic => (0.4, 6.0),
    };
    MovementTier { amplitude, cycles }
}

pub fn dimmer_tier(intensity: Intensity) -> DimmerTier {
    let (min_pct, max_pct, cycles) = match intensity {
        Intensity::Smooth => (40.0, 80.0, 0.5),
        Intensity::Slow => (30.0, 90.0, 1.0),
        Intensity::Moderate => (20.0, 100.0, 2.0),
        Intensity::Fast => (10.0, 100.0, 4.0),
        Intensity::Dramatic => (0.0, 100.0, 8.0),
    };
    DimmerTier {
        min_pct,
        max_pct,
        cycles,
    }
}

#[derive(Debug, Clone, Copy)]
enum AxisShape {
    Hold,
    Wave {
        kind: NativeKind,
        cycle_mul: f32,
        phase_pct: f32,
        amp_mul: f32,
    },
    Ramp,
}

#[derive(Debug, Clone, Copy)]
struct MovementPattern {
    pan: AxisShape,
    tilt: AxisShape,
}

const fn wave(kind: NativeKind, cycle_mul: f32, phase_pct: f32, amp_mul: f32) -> AxisShape {
    AxisShape::Wave {
        kind,
        cycle_mul,
        phase_pct,
        amp_mul,
    }
}

static MOVEMENT_PATTERNS: Lazy<HashMap<&'static str, MovementPattern>> = Lazy::new(|| {
    HashMap::from([
        (
            "sweep_lr",
            MovementPattern {
                pan: wave(NativeKind::Sine, 1.0, 0.0, 1.0),
                tilt: AxisShape::Hold,
            },
        ),
        (
            "tilt_bob",
            MovementPattern {
                pan: AxisShape::Hold,
                tilt: wave(NativeKind::Sine, 1.0, 0.0, 1.0),
            },
        ),
        (
            "circle",
            MovementPattern {
                pan: wave(NativeKind::Sine, 1.0, 0.0, 1.0),
                tilt: wave(NativeKind::Sine, 1.0, 25.0, 1.0),
            },
        ),
        (
            "figure_eight",
            MovementPattern {
                pan: wave(NativeKind::Sine, 1.0, 0.0, 1.0),
                tilt: wave(NativeKind::Sine, 2.0, 0.0, 0.5),
            },
        ),
        (
            "pendulum",
            MovementPattern {
                pan: wave(NativeKind::Sine, 1.0, 0.0, 1.0),
                tilt: wave(NativeKind::AbsSine, 2.0, 0.0, 0.25),
            },
        ),
        (
            "ramp_lr",
            MovementPattern {
                pan: AxisShape::Ramp,
                tilt: AxisShape::Hold,
            },
        ),
        (
            "zigzag",
            MovementPattern {
                pan: wave(NativeKind::SawTooth, 1.0, 0.0, 1.0),
                tilt: wave(NativeKind::Square, 2.0, 0.0, 0.5),
            },
        ),
    ])
});

#[derive(Debug, Clone, Copy)]
enum DimmerShape {
    Wave { kind: NativeKind, cycle_mul: f32 },
    Ramp { rising: bool },
    Swell,
    Flicker,
}

static DIMMER_PATTERNS: Lazy<HashMap<&'static str, DimmerShape>> = Lazy::new(|| {
    HashMap::from([
        (
            "pulse",
            DimmerShape::Wave {
                kind: NativeKind::Sine,
                cycle_mul: 1.0,
            },
        ),
        (
            "breathe",
            DimmerShape::Wave {
                kind: NativeKind::Sine,
                cycle_mul: 0.5,
            },
        ),
        (
            "strobe",
            DimmerShape::Wave {
                kind: NativeKind::Square,
                cycle_mul: 4.0,
            },
        ),
        ("fade_in", DimmerShape::Ramp { rising: true }),
        ("fade_out", DimmerShape::Ramp { rising: false }),
        ("swell", DimmerShape::Swell),
        ("flicker", DimmerShape::Flicker),
    ])
});

fn is_static_pattern(pattern: &str) -> bool {
    matches!(pattern, "hold" | "static" | "full")
}

pub struct CurveLibrary;

impl CurveLibrary {
    /// Parse a tier name, warning on anything unknown.
    pub fn parse_intensity(tier: &str) -> Option<Intensity> {
        match Intensity::from_str(tier) {
            Ok(intensity) => Some(intensity),
            Err(e) => {
                log::warn!("[curves] {}", e);
                None
            }
        }
    }

    /// Movement curve for one axis around `center` (calibrated DMX).
    pub fn resolve(
        pattern: &str,
        role: ChannelRole,
        intensity: &str,
        center: f32,
        limits: ChannelLimits,
    ) -> ChannelValue {
        if is_static_pattern(pattern) {
            return ChannelValue::Static(to_dmx(limits.clamp(center)));
        }
        let Some(intensity) = Self::parse_intensity(intensity) else {
            return ChannelValue::Static(to_dmx(limits.clamp(center)));
        };
        Self::resolve_movement(
            &MovementSpec::new(pattern, intensity),
            role,
            center,
            limits,
        )
    }

    /// Movement curve honouring the movement's amplitude/frequency overrides.
    pub fn resolve_movement(
        movement: &MovementSpec,
        role: ChannelRole,
        center: f32,
        limits: ChannelLimits,
    ) -> ChannelValue {
        let center = limits.clamp(center);
        let fallback = ChannelValue::Static(to_dmx(center));
        if movement.is_static() {
            return fallback;
        }

        let Some(pattern) = MOVEMENT_PATTERNS.get(movement.pattern()) else {
            log::warn!(
                "[curves] unknown movement pattern '{}'; holding at {}",
                movement.pattern(),
                to_dmx(center)
            );
            return fallback;
        };

        let tier = movement_tier(movement.intensity());
        let amplitude = movement.amplitude().unwrap_or(tier.amplitude).max(0.0);
        let cycles = movement.frequency().unwrap_or(tier.cycles).max(0.0);
        let half_width = amplitude * PHYSICAL_RANGE / 2.0;

        let shape = match role {
            ChannelRole::Pan => pattern.pan,
            ChannelRole::Tilt => pattern.tilt,
        };
        match shape {
            AxisShape::Hold => fallback,
            AxisShape::Ramp => {
                let low = limits.clamp(center - half_width);
                let high = limits.clamp(center + half_width);
                ChannelValue::Native(NativeCurve::ramp(low, high))
            }
            AxisShape::Wave {
                kind,
                cycle_mul,
                phase_pct,
                amp_mul,
            } => {
                let hw = half_width * amp_mul;
                let low = limits.clamp(center - hw);
                let high = limits.clamp(center + hw);
                if (high - low).abs() < f32::EPSILON {
                    return fallback;
                }
                let mut curve = NativeCurve::periodic(kind, low, high, cycles * cycle_mul);
                curve.p1 = phase_pct;
                ChannelValue::Native(curve)
            }
        }
    }

    /// Dimmer curve; static patterns use `level_pct` (default 100%).
    pub fn resolve_dimmer(
        pattern: &str,
        intensity: &str,
        level_pct: Option<f32>,
        limits: ChannelLimits,
    ) -> ChannelValue {
        let level = level_pct.unwrap_or(100.0);
        let fallback = ChannelValue::Static(to_dmx(percent_to_dmx(&limits, level)));
        match pattern {
            "full" => return ChannelValue::Static(to_dmx(percent_to_dmx(&limits, 100.0))),
            "off" | "blackout" => return ChannelValue::Static(to_dmx(percent_to_dmx(&limits, 0.0))),
            p if is_static_pattern(p) => return fallback,
            _ => {}
        }

        let Some(shape) = DIMMER_PATTERNS.get(pattern) else {
            log::warn!("[curves] unknown dimmer pattern '{}'; holding at {}%", pattern, level);
            return fallback;
        };
        let Some(intensity) = Self::parse_intensity(intensity) else {
            return fallback;
        };

        let tier = dimmer_tier(intensity);
        let low = percent_to_dmx(&limits, tier.min_pct);
        let high = percent_to_dmx(&limits, tier.max_pct);

        match *shape {
            DimmerShape::Wave { kind, cycle_mul } => ChannelValue::Native(NativeCurve::periodic(
                kind,
                low,
                high,
                tier.cycles * cycle_mul,
            )),
            DimmerShape::Ramp { rising: true } => ChannelValue::Native(NativeCurve::ramp(low, high)),
            DimmerShape::Ramp { rising: false } => ChannelValue::Native(NativeCurve::ramp(high, low)),
            DimmerShape::Swell => ChannelValue::Native(NativeCurve::periodic(
                NativeKind::ParabolicDown,
                low,
                high,
                1.0,
            )),
            DimmerShape::Flicker => {
                // Seeded per tier so identical plans render identical curves.
                let mut rng = ChaCha8Rng::seed_from_u64(intensity as u64 + 1);
                let points = (0..FLICKER_POINTS)
                    .map(|i| {
                        let t = i as f32 / (FLICKER_POINTS - 1) as f32;
                        CurvePoint::new(t, rng.gen_range(low..=high.max(low)))
                    })
                    .collect();
                ChannelValue::Custom(CustomCurve::new(points))
            }
        }
    }

    /// Bake a per-fixture phase and/or inversion into explicit points.
    ///
    /// Inversion mirrors the curve around the midpoint of its own value range.
    pub fn specialize(value: &ChannelValue, phase_deg: f32, invert: bool, count: usize) -> ChannelValue {
        let phase_deg = phase_deg.rem_euclid(360.0);
        if phase_deg.abs() < 1e-4 && !invert {
            return value.clone();
        }

        match value {
            ChannelValue::Static(_) => value.clone(),
            ChannelValue::Native(curve) => {
                let mid = (curve.min + curve.max) / 2.0;
                ChannelValue::Custom(CustomCurve::sampled(count, |t| {
                    let v = curve.sample_with_phase(t, phase_deg);
                    if invert {
                        (2.0 * mid - v).clamp(0.0, 255.0)
                    } else {
                        v
                    }
                }))
            }
            ChannelValue::Custom(curve) => {
                let (lo, hi) = curve
                    .points
                    .iter()
                    .fold((f32::MAX, f32::MIN), |(lo, hi), p| (lo.min(p.value), hi.max(p.value)));
                let mid = (lo + hi) / 2.0;
                let shift = phase_deg / 360.0;
                ChannelValue::Custom(CustomCurve::sampled(count, |t| {
                    let v = curve.value_at((t + shift).rem_euclid(1.0)).unwrap_or(0.0);
                    if invert {
                        (2.0 * mid - v).clamp(0.0, 255.0)
                    } else {
                        v
                    }
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAN_LIMITS: ChannelLimits = ChannelLimits::FULL;

    #[test]
    fn static_patterns_resolve_to_center() {
        assert_eq!(
            CurveLibrary::resolve("hold", ChannelRole::Pan, "fast", 128.4, PAN_LIMITS),
            ChannelValue::Static(128)
        );
        assert_eq!(
            CurveLibrary::resolve_dimmer("full", "moderate", None, ChannelLimits::FULL),
            ChannelValue::Static(255)
        );
        assert_eq!(
            CurveLibrary::resolve_dimmer("static", "moderate", Some(50.0), ChannelLimits::FULL),
            ChannelValue::Static(128)
        );
    }

    #[test]
    fn static_movement_holds_the_clamped_pose() {
        let hold = MovementSpec::new("static", Intensity::Dramatic).with_amplitude(Some(0.5));
        let limits = ChannelLimits { min: 0, max: 100 };
        assert_eq!(
            CurveLibrary::resolve_movement(&hold, ChannelRole::Pan, 180.0, limits),
            ChannelValue::Static(100)
        );
    }

    #[test]
    fn unknown_pattern_or_tier_falls_back_to_center() {
        assert_eq!(
            CurveLibrary::resolve("moonwalk", ChannelRole::Pan, "fast", 100.0, PAN_LIMITS),
            ChannelValue::Static(100)
        );
        assert_eq!(
            CurveLibrary::resolve("sweep_lr", ChannelRole::Pan, "ludicrous", 100.0, PAN_LIMITS),
            ChannelValue::Static(100)
        );
        assert_eq!(
            CurveLibrary::resolve_dimmer("sparkle", "fast", Some(40.0), ChannelLimits::FULL),
            ChannelValue::Static(102)
        );
    }

    #[test]
    fn sweep_amplitude_scales_with_tier() {
        let ChannelValue::Native(slow) =
            CurveLibrary::resolve("sweep_lr", ChannelRole::Pan, "slow", 128.0, PAN_LIMITS)
        else {
            panic!("expected native curve");
        };
        let ChannelValue::Native(dramatic) =
            CurveLibrary::resolve("sweep_lr", ChannelRole::Pan, "dramatic", 128.0, PAN_LIMITS)
        else {
            panic!("expected native curve");
        };
        assert_eq!(slow.kind, NativeKind::Sine);
        assert!((slow.max - slow.min - 0.12 * 255.0).abs() < 1e-3);
        assert!((dramatic.max - dramatic.min - 0.4 * 255.0).abs() < 1e-3);
        assert_eq!(dramatic.cycles(), 6.0);
    }

    #[test]
    fn amplitude_clamps_to_fixture_limits() {
        let limits = ChannelLimits { min: 100, max: 150 };
        let ChannelValue::Native(curve) =
            CurveLibrary::resolve("sweep_lr", ChannelRole::Pan, "dramatic", 128.0, limits)
        else {
            panic!("expected native curve");
        };
        assert_eq!(curve.min, 100.0);
        assert_eq!(curve.max, 150.0);
    }

    #[test]
    fn sweep_holds_tilt() {
        assert_eq!(
            CurveLibrary::resolve("sweep_lr", ChannelRole::Tilt, "fast", 90.0, PAN_LIMITS),
            ChannelValue::Static(90)
        );
    }

    #[test]
    fn overrides_beat_the_tier_table() {
        let movement = MovementSpec::new("sweep_lr", Intensity::Smooth)
            .with_amplitude(Some(0.5))
            .with_frequency(Some(3.0));
        let ChannelValue::Native(curve) =
            CurveLibrary::resolve_movement(&movement, ChannelRole::Pan, 128.0, PAN_LIMITS)
        else {
            panic!("expected native curve");
        };
        assert!((curve.max - curve.min - 127.5).abs() < 1e-3);
        assert_eq!(curve.cycles(), 3.0);
    }

    #[test]
    fn flicker_is_custom_and_deterministic() {
        let a = CurveLibrary::resolve_dimmer("flicker", "fast", None, ChannelLimits::FULL);
        let b = CurveLibrary::resolve_dimmer("flicker", "fast", None, ChannelLimits::FULL);
        assert_eq!(a, b);
        let ChannelValue::Custom(curve) = a else {
            panic!("expected custom curve");
        };
        assert_eq!(curve.points.len(), FLICKER_POINTS);
        assert!(curve.points.iter().all(|p| p.value >= 25.5 - 1e-3 && p.value <= 255.0));
    }

    #[test]
    fn fade_out_ramps_down() {
        let value = CurveLibrary::resolve_dimmer("fade_out", "dramatic", None, ChannelLimits::FULL);
        assert!((value.start_value() - 255.0).abs() < 1e-3);
        assert!(value.end_value().abs() < 1e-3);
    }

    #[test]
    fn specialize_bakes_phase_and_inversion() {
        let sine = ChannelValue::Native(NativeCurve::periodic(NativeKind::Sine, 100.0, 160.0, 1.0));
        assert_eq!(CurveLibrary::specialize(&sine, 0.0, false, 25), sine);

        let shifted = CurveLibrary::specialize(&sine, 90.0, false, 25);
        let ChannelValue::Custom(curve) = &shifted else {
            panic!("expected custom curve");
        };
        assert_eq!(curve.points.len(), 25);
        assert!((shifted.start_value() - 160.0).abs() < 1e-3);

        let inverted = CurveLibrary::specialize(&sine, 90.0, true, 25);
        assert!((inverted.start_value() - 100.0).abs() < 1e-3);
    }
}
