//! Curve Pipeline
//!
//! Two ordered passes over one fixture's effect list:
//! 1. render: custom curves are smoothed to the fixed output point count,
//!    native and static values pass through untouched
//! 2. blend: crossfade boundaries pull the samples next to the boundary
//!    toward the neighbouring effect's boundary value

use crate::curves::smoothing::smooth;
use crate::models::{
    ChannelSet, ChannelValue, ColorValue, CustomCurve, RenderedEffect, SequencedEffect,
    TransitionMode,
};
use crate::settings::RenderSettings;

fn render_value(value: &ChannelValue, count: usize, fixture_id: &str, channel: &str) -> ChannelValue {
    match value {
        ChannelValue::Static(_) | ChannelValue::Native(_) => value.clone(),
        ChannelValue::Custom(curve) => match smooth(curve, count) {
            Some(smoothed) => ChannelValue::Custom(smoothed),
            None => {
                log::error!(
                    "[curves] {}: {} curve has no usable points; substituting flat zero",
                    fixture_id,
                    channel
                );
                ChannelValue::Custom(CustomCurve::flat(0.0, count))
            }
        },
    }
}

fn render_channels(channels: &ChannelSet, count: usize, fixture_id: &str) -> ChannelSet {
    ChannelSet {
        pan: render_value(&channels.pan, count, fixture_id, "pan"),
        tilt: render_value(&channels.tilt, count, fixture_id, "tilt"),
        dimmer: render_value(&channels.dimmer, count, fixture_id, "dimmer"),
        shutter: channels
            .shutter
            .as_ref()
            .map(|v| render_value(v, count, fixture_id, "shutter")),
        color: channels.color.as_ref().map(|c| match c {
            ColorValue::Wheel(v) => ColorValue::Wheel(render_value(v, count, fixture_id, "color")),
            ColorValue::Rgb(rgb) => ColorValue::Rgb(*rgb),
        }),
        gobo: channels
            .gobo
            .as_ref()
            .map(|v| render_value(v, count, fixture_id, "gobo")),
    }
}

pub fn render_effect(effect: SequencedEffect, count: usize) -> RenderedEffect {
    let channels = render_channels(&effect.channels, count, &effect.fixture_id);
    RenderedEffect {
        fixture_id: effect.fixture_id,
        start_ms: effect.start_ms,
        end_ms: effect.end_ms,
        channels,
        boundary: effect.boundary,
        label: effect.label,
        metadata: effect.metadata,
    }
}

pub fn render_effects(effects: Vec<SequencedEffect>, count: usize) -> Vec<RenderedEffect> {
    effects
        .into_iter()
        .map(|effect| render_effect(effect, count))
        .collect()
}

/// Mode and requested length governing the boundary between two effects.
pub fn boundary_transition(
    current: &RenderedEffect,
    next: &RenderedEffect,
    default_blend_ms: u64,
) -> (TransitionMode, u64) {
    let spec = current.boundary.exit.or(next.boundary.entry);
    match spec {
        Some(spec) if spec.duration_ms > 0 => (spec.mode, spec.duration_ms),
        Some(spec) => (spec.mode, default_blend_ms),
        None => (TransitionMode::Snap, 0),
    }
}

/// Which side of the boundary a sample list belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Tail,
    Head,
}

fn promote(value: &ChannelValue, count: usize) -> Option<CustomCurve> {
    match value {
        ChannelValue::Static(v) => Some(CustomCurve::flat(*v as f32, count)),
        ChannelValue::Custom(curve) => Some(curve.clone()),
        ChannelValue::Native(_) => None,
    }
}

/// Pull the samples inside the blend window toward `anchor`; the sample on
/// the boundary itself lands exactly on it.
fn blend_side(curve: &mut CustomCurve, side: Side, duration_ms: u64, blend_ms: f32, anchor: f32) {
    let duration = duration_ms as f32;
    for point in curve.points.iter_mut() {
        let time_ms = point.t * duration;
        let weight = match side {
            Side::Tail => (time_ms - (duration - blend_ms)) / blend_ms,
            Side::Head => 1.0 - time_ms / blend_ms,
        };
        if weight <= 0.0 {
            continue;
        }
        let weight = weight.min(1.0);
        point.value = (1.0 - weight) * point.value + weight * anchor;
    }
}

fn blend_pair(
    current: &mut ChannelValue,
    next: &mut ChannelValue,
    current_ms: u64,
    next_ms: u64,
    blend_ms: f32,
    count: usize,
) {
    // Anchors come from the unblended neighbours.
    let current_end = current.end_value();
    let next_start = next.start_value();
    if let (ChannelValue::Static(a), ChannelValue::Static(b)) = (&*current, &*next) {
        if a == b {
            return;
        }
    }

    let (Some(mut tail), Some(mut head)) = (promote(current, count), promote(next, count)) else {
        return;
    };
    blend_side(&mut tail, Side::Tail, current_ms, blend_ms, next_start);
    blend_side(&mut head, Side::Head, next_ms, blend_ms, current_end);
    *current = ChannelValue::Custom(tail);
    *next = ChannelValue::Custom(head);
}

/// Blend every crossfade boundary of one fixture's effects, sorted by start.
pub fn blend_boundaries(effects: &mut [RenderedEffect], settings: &RenderSettings) {
    if effects.iter().any(|e| e.channels.has_native()) {
        if let Some(first) = effects.first() {
            log::debug!(
                "[curves] {}: native curves present, all boundaries snap",
                first.fixture_id
            );
        }
        return;
    }

    let count = settings.curve_points.max(2);
    for i in 1..effects.len() {
        let (before, after) = effects.split_at_mut(i);
        let current = &mut before[i - 1];
        let next = &mut after[0];

        if next.start_ms > current.end_ms {
            continue;
        }
        let (mode, requested_ms) = boundary_transition(current, next, settings.default_blend_ms);
        if mode != TransitionMode::Crossfade {
            continue;
        }

        let current_ms = current.duration_ms();
        let next_ms = next.duration_ms();
        let fraction = settings.blend_window_fraction;
        let blend_ms = (requested_ms as f32)
            .min(fraction * current_ms as f32)
            .min(fraction * next_ms as f32);
        if blend_ms <= 0.0 {
            continue;
        }

        let (cur, nxt) = (&mut current.channels, &mut next.channels);
        blend_pair(&mut cur.pan, &mut nxt.pan, current_ms, next_ms, blend_ms, count);
        blend_pair(&mut cur.tilt, &mut nxt.tilt, current_ms, next_ms, blend_ms, count);
        blend_pair(&mut cur.dimmer, &mut nxt.dimmer, current_ms, next_ms, blend_ms, count);
        if let (Some(a), Some(b)) = (cur.shutter.as_mut(), nxt.shutter.as_mut()) {
            blend_pair(a, b, current_ms, next_ms, blend_ms, count);
        }
    }
}

/// Render then blend one fixture's effects.
pub fn process_fixture(
    mut effects: Vec<SequencedEffect>,
    settings: &RenderSettings,
) -> Vec<RenderedEffect> {
    effects.sort_by_key(|e| e.start_ms);
    let mut rendered = render_effects(effects, settings.curve_points.max(2));
    blend_boundaries(&mut rendered, settings);
    rendered
}
