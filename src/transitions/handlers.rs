use once_cell::sync::Lazy;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};

use crate::models::{
    to_dmx, BoundaryInfo, ChannelSet, ChannelValue, ColorValue, CustomCurve, GapType,
    SequencedEffect, TransitionMode,
};
use crate::settings::GapSplit;

/// Channel values at one edge of a transition, in DMX units.
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    pub pan: f32,
    pub tilt: f32,
    pub dimmer: f32,
    pub shutter: Option<f32>,
    pub color: Option<ColorValue>,
    pub gobo: Option<u8>,
}

impl Anchor {
    fn snapshot_color(color: &ColorValue, t: f32) -> ColorValue {
        match color {
            ColorValue::Wheel(v) => ColorValue::Wheel(ChannelValue::Static(to_dmx(v.value_at(t)))),
            ColorValue::Rgb(rgb) => ColorValue::Rgb(*rgb),
        }
    }

    fn at(channels: &ChannelSet, t: f32) -> Anchor {
        Anchor {
            pan: channels.pan.value_at(t),
            tilt: channels.tilt.value_at(t),
            dimmer: channels.dimmer.value_at(t),
            shutter: channels.shutter.as_ref().map(|v| v.value_at(t)),
            color: channels.color.as_ref().map(|c| Self::snapshot_color(c, t)),
            gobo: channels.gobo.as_ref().map(|v| to_dmx(v.value_at(t))),
        }
    }

    /// Where an effect ends.
    pub fn end_of(channels: &ChannelSet) -> Anchor {
        Self::at(channels, 1.0)
    }

    /// Where an effect begins.
    pub fn start_of(channels: &ChannelSet) -> Anchor {
        Self::at(channels, 0.0)
    }

    /// Same position, light off.
    pub fn dark(&self, shutter_closed: u8) -> Anchor {
        Anchor {
            dimmer: 0.0,
            shutter: self.shutter.map(|_| shutter_closed as f32),
            color: None,
            gobo: None,
            ..self.clone()
        }
    }
}

/// Everything a handler needs to synthesize effects for one interval.
#[derive(Debug, Clone)]
pub struct TransitionContext<'a> {
    pub fixture_id: &'a str,
    pub section_id: &'a str,
    pub gap_type: Option<GapType>,
    pub start_ms: u64,
    pub end_ms: u64,
    pub from: Anchor,
    pub to: Anchor,
    /// Dark resting anchor used by the composite gap fill.
    pub home: Anchor,
    pub split: GapSplit,
    pub shutter_closed: u8,
}

impl<'a> TransitionContext<'a> {
    fn with_span(&self, start_ms: u64, end_ms: u64, from: Anchor, to: Anchor) -> TransitionContext<'a> {
        TransitionContext {
            start_ms,
            end_ms,
            from,
            to,
            ..self.clone()
        }
    }

    /// Phase boundaries for a three-way split of [start, end].
    fn split_points(&self) -> (u64, u64) {
        let split = self.split.normalized();
        let duration = self.end_ms.saturating_sub(self.start_ms) as f32;
        let first = self.start_ms + (duration * split.ramp_out).round() as u64;
        let second = first + (duration * split.hold).round() as u64;
        (first.min(self.end_ms), second.min(self.end_ms))
    }
}

pub trait TransitionHandler: Send + Sync {
    fn mode(&self) -> TransitionMode;

    /// Effects covering exactly [ctx.start_ms, ctx.end_ms], in order.
    fn synthesize(&self, ctx: &TransitionContext) -> Vec<SequencedEffect>;
}

fn ramp(from: f32, to: f32) -> ChannelValue {
    if (from - to).abs() < 0.5 {
        ChannelValue::Static(to_dmx(to))
    } else {
        ChannelValue::Custom(CustomCurve::linear(from.clamp(0.0, 255.0), to.clamp(0.0, 255.0)))
    }
}

fn gap_effect(ctx: &TransitionContext, phase: &str, channels: ChannelSet) -> SequencedEffect {
    let mut metadata = BTreeMap::new();
    metadata.insert("phase".to_string(), json!(phase));
    SequencedEffect {
        fixture_id: ctx.fixture_id.to_string(),
        start_ms: ctx.start_ms,
        end_ms: ctx.end_ms,
        channels,
        boundary: BoundaryInfo {
            section_id: ctx.section_id.to_string(),
            is_gap_fill: true,
            gap_type: ctx.gap_type,
            ..BoundaryInfo::default()
        },
        label: format!("gap_fill:{}", phase),
        metadata,
    }
}

/// Linear blend of every continuous channel from `from` to `to`.
fn crossfade_effect(ctx: &TransitionContext, phase: &str) -> Option<SequencedEffect> {
    if ctx.end_ms <= ctx.start_ms {
        return None;
    }
    let shutter = match (ctx.from.shutter, ctx.to.shutter) {
        (Some(a), Some(b)) => Some(ramp(a, b)),
        (Some(v), None) | (None, Some(v)) => Some(ChannelValue::Static(to_dmx(v))),
        (None, None) => None,
    };
    let channels = ChannelSet {
        pan: ramp(ctx.from.pan, ctx.to.pan),
        tilt: ramp(ctx.from.tilt, ctx.to.tilt),
        dimmer: ramp(ctx.from.dimmer, ctx.to.dimmer),
        shutter,
        color: ctx.from.color.clone().or_else(|| ctx.to.color.clone()),
        gobo: ctx.from.gobo.or(ctx.to.gobo).map(ChannelValue::Static),
    };
    Some(gap_effect(ctx, phase, channels))
}

pub struct Snap;

impl TransitionHandler for Snap {
    fn mode(&self) -> TransitionMode {
        TransitionMode::Snap
    }

    fn synthesize(&self, _ctx: &TransitionContext) -> Vec<SequencedEffect> {
        Vec::new()
    }
}

pub struct Crossfade;

impl TransitionHandler for Crossfade {
    fn mode(&self) -> TransitionMode {
        TransitionMode::Crossfade
    }

    fn synthesize(&self, ctx: &TransitionContext) -> Vec<SequencedEffect> {
        crossfade_effect(ctx, "crossfade").into_iter().collect()
    }
}

/// Dimmer down, snap position while dark, dimmer up.
pub struct FadeThroughBlack;

impl TransitionHandler for FadeThroughBlack {
    fn mode(&self) -> TransitionMode {
        TransitionMode::FadeThroughBlack
    }

    fn synthesize(&self, ctx: &TransitionContext) -> Vec<SequencedEffect> {
        let (a, b) = ctx.split_points();
        let dark_from = ctx.from.dark(ctx.shutter_closed);
        let dark_to = ctx.to.dark(ctx.shutter_closed);

        let phases = [
            ("fade_out", ctx.with_span(ctx.start_ms, a, ctx.from.clone(), dark_from)),
            ("blackout", ctx.with_span(a, b, dark_to.clone(), dark_to.clone())),
            ("fade_in", ctx.with_span(b, ctx.end_ms, dark_to, ctx.to.clone())),
        ];
        phases
            .iter()
            .filter_map(|(phase, span)| crossfade_effect(span, phase))
            .collect()
    }
}

/// Ramp to the resting pose, hold dark, ramp to the next start.
pub struct GapFillComposite;

impl TransitionHandler for GapFillComposite {
    fn mode(&self) -> TransitionMode {
        TransitionMode::GapFill
    }

    fn synthesize(&self, ctx: &TransitionContext) -> Vec<SequencedEffect> {
        let (a, b) = ctx.split_points();
        let crossfade = handler(TransitionMode::Crossfade);

        let mut out = Vec::with_capacity(3);
        for (phase, span) in [
            ("ramp_to_home", ctx.with_span(ctx.start_ms, a, ctx.from.clone(), ctx.home.clone())),
            ("hold", ctx.with_span(a, b, ctx.home.clone(), ctx.home.clone())),
            ("ramp_to_next", ctx.with_span(b, ctx.end_ms, ctx.home.clone(), ctx.to.clone())),
        ] {
            for mut effect in crossfade.synthesize(&span) {
                effect.label = format!("gap_fill:{}", phase);
                effect.metadata.insert("phase".to_string(), json!(phase));
                out.push(effect);
            }
        }
        out
    }
}

static HANDLERS: Lazy<HashMap<TransitionMode, Box<dyn TransitionHandler>>> = Lazy::new(|| {
    let handlers: Vec<Box<dyn TransitionHandler>> = vec![
        Box::new(Snap),
        Box::new(Crossfade),
        Box::new(FadeThroughBlack),
        Box::new(GapFillComposite),
    ];
    handlers.into_iter().map(|h| (h.mode(), h)).collect()
});

pub fn handler(mode: TransitionMode) -> &'static dyn TransitionHandler {
    match HANDLERS.get(&mode) {
        Some(h) => h.as_ref(),
        None => &Snap,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor(pan: f32, dimmer: f32) -> Anchor {
        Anchor {
            pan,
            tilt: 100.0,
            dimmer,
            shutter: Some(255.0),
            color: None,
            gobo: None,
        }
    }

    fn ctx(start: u64, end: u64) -> TransitionContext<'static> {
        TransitionContext {
            fixture_id: "MH1",
            section_id: "verse",
            gap_type: Some(GapType::InterSection),
            start_ms: start,
            end_ms: end,
            from: anchor(40.0, 255.0),
            to: anchor(200.0, 180.0),
            home: anchor(128.0, 255.0).dark(0),
            split: GapSplit::default(),
            shutter_closed: 0,
        }
    }

    fn covers(effects: &[SequencedEffect], start: u64, end: u64) {
        assert_eq!(effects.first().map(|e| e.start_ms), Some(start));
        assert_eq!(effects.last().map(|e| e.end_ms), Some(end));
        for pair in effects.windows(2) {
            assert_eq!(pair[0].end_ms, pair[1].start_ms);
        }
    }

    #[test]
    fn snap_is_a_no_op() {
        assert!(handler(TransitionMode::Snap).synthesize(&ctx(0, 1000)).is_empty());
    }

    #[test]
    fn crossfade_runs_anchor_to_anchor() {
        let out = handler(TransitionMode::Crossfade).synthesize(&ctx(1000, 3000));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].channels.pan.start_value(), 40.0);
        assert_eq!(out[0].channels.pan.end_value(), 200.0);
        assert_eq!(out[0].channels.tilt, ChannelValue::Static(100));
        assert!(out[0].boundary.is_gap_fill);
    }

    #[test]
    fn gap_fill_is_forty_twenty_forty() {
        let out = handler(TransitionMode::GapFill).synthesize(&ctx(4000, 10_000));
        assert_eq!(out.len(), 3);
        covers(&out, 4000, 10_000);
        assert_eq!((out[0].end_ms, out[1].end_ms), (6400, 7600));

        let hold = &out[1];
        assert_eq!(hold.label, "gap_fill:hold");
        assert_eq!(hold.channels.dimmer, ChannelValue::Static(0));
        assert_eq!(hold.channels.shutter, Some(ChannelValue::Static(0)));
        assert_eq!(hold.channels.pan, ChannelValue::Static(128));
        assert_eq!(out[2].channels.pan.end_value(), 200.0);
    }

    #[test]
    fn fade_through_black_snaps_while_dark() {
        let out = handler(TransitionMode::FadeThroughBlack).synthesize(&ctx(0, 1000));
        assert_eq!(out.len(), 3);
        covers(&out, 0, 1000);
        assert_eq!(out[0].channels.pan, ChannelValue::Static(40));
        assert_eq!(out[0].channels.dimmer.end_value(), 0.0);
        assert_eq!(out[1].channels.pan, ChannelValue::Static(200));
        assert_eq!(out[1].channels.dimmer, ChannelValue::Static(0));
        assert_eq!(out[2].channels.dimmer.end_value(), 180.0);
    }
}
