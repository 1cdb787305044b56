use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Parametric curve families understood by the sequence consumer.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NativeKind {
    Flat,
    Ramp,
    RampUpDown,
    Sine,
    AbsSine,
    SawTooth,
    Square,
    ParabolicDown,
    ParabolicUp,
}

impl NativeKind {
    /// Name written into the value-curve descriptor.
    pub fn descriptor_name(&self) -> &'static str {
        match self {
            NativeKind::Flat => "Flat",
            NativeKind::Ramp => "Ramp",
            NativeKind::RampUpDown => "Ramp Up/Down",
            NativeKind::Sine => "Sine",
            NativeKind::AbsSine => "Abs Sine",
            NativeKind::SawTooth => "Saw Tooth",
            NativeKind::Square => "Square",
            NativeKind::ParabolicDown => "Parabolic Down",
            NativeKind::ParabolicUp => "Parabolic Up",
        }
    }
}

/// A curve described by type and bounds, rendered by the consumer.
///
/// `min`/`max` are absolute DMX bounds. The meaning of `p1..p4` follows the
/// consumer's value-curve parameters (0–100 scale):
/// - `p1`: start level (ramps) or phase in percent of a cycle (periodic kinds)
/// - `p2`: end level (ramps) or amplitude percent (periodic kinds)
/// - `p3`: cycles per effect, times ten
/// - `p4`: vertical centre percent
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NativeCurve {
    pub kind: NativeKind,
    pub min: f32,
    pub max: f32,
    pub p1: f32,
    pub p2: f32,
    pub p3: f32,
    pub p4: f32,
}

impl NativeCurve {
    /// Periodic curve spanning `[low, high]` with `cycles` repetitions per effect.
    pub fn periodic(kind: NativeKind, low: f32, high: f32, cycles: f32) -> Self {
        Self {
            kind,
            min: low.min(high),
            max: low.max(high),
            p1: 0.0,
            p2: 100.0,
            p3: (cycles * 10.0).max(0.0),
            p4: 50.0,
        }
    }

    /// Linear ramp from `from` to `to` over the effect.
    pub fn ramp(from: f32, to: f32) -> Self {
        let min = from.min(to);
        let max = from.max(to);
        let span = (max - min).max(f32::EPSILON);
        Self {
            kind: NativeKind::Ramp,
            min,
            max,
            p1: (from - min) / span * 100.0,
            p2: (to - min) / span * 100.0,
            p3: 0.0,
            p4: 50.0,
        }
    }

    pub fn cycles(&self) -> f32 {
        self.p3 / 10.0
    }

    /// Preview evaluation at normalized time `t`, used for anchors and for
    /// converting to custom points when a per-fixture phase is required.
    pub fn sample(&self, t: f32) -> f32 {
        self.sample_with_phase(t, 0.0)
    }

    pub fn sample_with_phase(&self, t: f32, phase_deg: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        let span = self.max - self.min;
        let cycle_pos = self.cycles() * t + self.p1 / 100.0 + phase_deg / 360.0;
        let unit = match self.kind {
            NativeKind::Flat => self.p4 / 100.0,
            NativeKind::Ramp => {
                let start = self.p1 / 100.0;
                let end = self.p2 / 100.0;
                start + (end - start) * t
            }
            NativeKind::RampUpDown => 1.0 - (2.0 * t - 1.0).abs(),
            NativeKind::Sine => {
                let amp = self.p2 / 100.0;
                let centre = self.p4 / 100.0;
                centre + 0.5 * amp * (2.0 * PI * cycle_pos).sin()
            }
            NativeKind::AbsSine => (PI * cycle_pos).sin().abs(),
            NativeKind::SawTooth => cycle_pos.rem_euclid(1.0),
            NativeKind::Square => {
                if cycle_pos.rem_euclid(1.0) < 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
            NativeKind::ParabolicDown => 1.0 - (2.0 * t - 1.0).powi(2),
            NativeKind::ParabolicUp => (2.0 * t - 1.0).powi(2),
        };
        self.min + unit.clamp(0.0, 1.0) * span
    }
}

/// One sample of a custom curve: `t` in `[0, 1]`, value in DMX units.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct CurvePoint {
    pub t: f32,
    pub value: f32,
}

impl CurvePoint {
    pub fn new(t: f32, value: f32) -> Self {
        Self { t, value }
    }
}

/// Explicit sample list owned and smoothed by the pipeline.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct CustomCurve {
    pub points: Vec<CurvePoint>,
}

impl CustomCurve {
    pub fn new(points: Vec<CurvePoint>) -> Self {
        Self { points }
    }

    pub fn flat(value: f32, count: usize) -> Self {
        let count = count.max(2);
        let points = (0..count)
            .map(|i| CurvePoint::new(i as f32 / (count - 1) as f32, value))
            .collect();
        Self { points }
    }

    pub fn linear(from: f32, to: f32) -> Self {
        Self {
            points: vec![CurvePoint::new(0.0, from), CurvePoint::new(1.0, to)],
        }
    }

    /// Sample `f` at `count` evenly spaced times.
    pub fn sampled(count: usize, f: impl Fn(f32) -> f32) -> Self {
        let count = count.max(2);
        let points = (0..count)
            .map(|i| {
                let t = i as f32 / (count - 1) as f32;
                CurvePoint::new(t, f(t))
            })
            .collect();
        Self { points }
    }

    pub fn first_value(&self) -> Option<f32> {
        self.points.first().map(|p| p.value)
    }

    pub fn last_value(&self) -> Option<f32> {
        self.points.last().map(|p| p.value)
    }

    /// Linear interpolation between the surrounding points.
    pub fn value_at(&self, t: f32) -> Option<f32> {
        let first = self.points.first()?;
        if t <= first.t {
            return Some(first.value);
        }
        for pair in self.points.windows(2) {
            let (p, n) = (pair[0], pair[1]);
            if t <= n.t {
                if (n.t - p.t).abs() < 1e-6 {
                    return Some(n.value);
                }
                let u = ((t - p.t) / (n.t - p.t)).clamp(0.0, 1.0);
                return Some(p.value + (n.value - p.value) * u);
            }
        }
        self.last_value()
    }
}

/// Value of one channel within one effect.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase", tag = "type", content = "value")]
pub enum ChannelValue {
    Static(u8),
    Native(NativeCurve),
    Custom(CustomCurve),
}

impl ChannelValue {
    pub fn is_native(&self) -> bool {
        matches!(self, ChannelValue::Native(_))
    }

    /// Value at the very start of the effect.
    pub fn start_value(&self) -> f32 {
        self.value_at(0.0)
    }

    /// Value at the very end of the effect.
    pub fn end_value(&self) -> f32 {
        self.value_at(1.0)
    }

    pub fn value_at(&self, t: f32) -> f32 {
        match self {
            ChannelValue::Static(v) => *v as f32,
            ChannelValue::Native(curve) => curve.sample(t),
            ChannelValue::Custom(curve) => curve.value_at(t).unwrap_or(0.0),
        }
    }

    /// The leading `ratio` of this value stretched back over `[0, 1]`, for
    /// an effect whose end was cut short.
    ///
    /// Custom points inside the kept range are retained and a point is added
    /// at the cut; native curves are sampled into `count` custom points.
    pub fn truncated(&self, ratio: f32, count: usize) -> ChannelValue {
        let ratio = ratio.clamp(0.0, 1.0);
        if ratio >= 1.0 - 1e-6 {
            return self.clone();
        }
        match self {
            ChannelValue::Static(_) => self.clone(),
            ChannelValue::Native(curve) => {
                ChannelValue::Custom(CustomCurve::sampled(count, |t| curve.sample(t * ratio)))
            }
            ChannelValue::Custom(curve) => {
                let Some(cut) = curve.value_at(ratio) else {
                    return self.clone();
                };
                if ratio <= f32::EPSILON {
                    return ChannelValue::Custom(CustomCurve::flat(cut, 2));
                }
                let mut points: Vec<CurvePoint> = curve
                    .points
                    .iter()
                    .filter(|p| p.t < ratio)
                    .map(|p| CurvePoint::new(p.t / ratio, p.value))
                    .collect();
                points.push(CurvePoint::new(1.0, cut));
                ChannelValue::Custom(CustomCurve::new(points))
            }
        }
    }
}

/// Round and clamp a float into a DMX byte.
pub fn to_dmx(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase", tag = "type", content = "value")]
pub enum ColorValue {
    Wheel(ChannelValue),
    Rgb([u8; 3]),
}

/// Every channel of one fixture for the span of one effect.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSet {
    pub pan: ChannelValue,
    pub tilt: ChannelValue,
    pub dimmer: ChannelValue,
    #[serde(default)]
    pub shutter: Option<ChannelValue>,
    #[serde(default)]
    pub color: Option<ColorValue>,
    #[serde(default)]
    pub gobo: Option<ChannelValue>,
}

impl ChannelSet {
    pub fn new(pan: ChannelValue, tilt: ChannelValue, dimmer: ChannelValue) -> Self {
        Self {
            pan,
            tilt,
            dimmer,
            shutter: None,
            color: None,
            gobo: None,
        }
    }

    pub fn has_native(&self) -> bool {
        let color_native = matches!(&self.color, Some(ColorValue::Wheel(v)) if v.is_native());
        self.pan.is_native()
            || self.tilt.is_native()
            || self.dimmer.is_native()
            || self.shutter.as_ref().is_some_and(|v| v.is_native())
            || self.gobo.as_ref().is_some_and(|v| v.is_native())
            || color_native
    }

    /// Every channel cut to its leading `ratio`; see [`ChannelValue::truncated`].
    pub fn truncated(&self, ratio: f32, count: usize) -> Self {
        let cut = |v: &ChannelValue| v.truncated(ratio, count);
        Self {
            pan: cut(&self.pan),
            tilt: cut(&self.tilt),
            dimmer: cut(&self.dimmer),
            shutter: self.shutter.as_ref().map(cut),
            color: self.color.as_ref().map(|c| match c {
                ColorValue::Wheel(v) => ColorValue::Wheel(cut(v)),
                ColorValue::Rgb(rgb) => ColorValue::Rgb(*rgb),
            }),
            gobo: self.gobo.as_ref().map(cut),
        }
    }
}
