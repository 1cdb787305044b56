use crate::fixtures::models::{AxisCalibration, ChannelLimits, FixtureConfig};
use crate::models::{ChannelSet, ChannelValue, ColorValue};

/// Degrees relative to the axis zero point -> calibrated DMX (unrounded).
pub fn degrees_to_dmx(axis: &AxisCalibration, degrees: f32) -> f32 {
    let raw = axis.center_dmx as f32 + degrees * axis.dmx_per_degree();
    axis.limits().clamp(raw)
}

/// Calibrated DMX -> degrees relative to the axis zero point.
pub fn dmx_to_degrees(axis: &AxisCalibration, dmx: f32) -> f32 {
    (dmx - axis.center_dmx as f32) / axis.dmx_per_degree()
}

/// Percentage (0-100) -> DMX within the channel's configured window.
pub fn percent_to_dmx(limits: &ChannelLimits, percent: f32) -> f32 {
    let unit = (percent / 100.0).clamp(0.0, 1.0);
    limits.min as f32 + unit * limits.span()
}

pub fn pan_dmx(fixture: &FixtureConfig, degrees: f32) -> f32 {
    degrees_to_dmx(&fixture.pan, degrees)
}

pub fn tilt_dmx(fixture: &FixtureConfig, degrees: f32) -> f32 {
    degrees_to_dmx(&fixture.tilt, degrees)
}

/// What ends up on one physical DMX channel within one effect.
#[derive(Debug, Clone, PartialEq)]
pub enum DmxAssignment<'a> {
    Value(&'a ChannelValue),
    Byte(u8),
}

/// Map a channel set onto the fixture's DMX channel numbers, sorted by channel.
///
/// Channels the fixture does not patch are dropped. RGB colours go to the
/// red/green/blue channels when present; a wheel value needs the colour channel.
pub fn assign_channels<'a>(
    fixture: &FixtureConfig,
    channels: &'a ChannelSet,
) -> Vec<(u16, DmxAssignment<'a>)> {
    let map = &fixture.channels;
    let mut out = vec![
        (map.pan, DmxAssignment::Value(&channels.pan)),
        (map.tilt, DmxAssignment::Value(&channels.tilt)),
        (map.dimmer, DmxAssignment::Value(&channels.dimmer)),
    ];

    if let (Some(ch), Some(value)) = (map.shutter, channels.shutter.as_ref()) {
        out.push((ch, DmxAssignment::Value(value)));
    }
    if let (Some(ch), Some(value)) = (map.gobo, channels.gobo.as_ref()) {
        out.push((ch, DmxAssignment::Value(value)));
    }

    match &channels.color {
        Some(ColorValue::Wheel(value)) => {
            if let Some(ch) = map.color {
                out.push((ch, DmxAssignment::Value(value)));
            }
        }
        Some(ColorValue::Rgb([r, g, b])) => {
            if let (Some(rc), Some(gc), Some(bc)) = (map.red, map.green, map.blue) {
                out.push((rc, DmxAssignment::Byte(*r)));
                out.push((gc, DmxAssignment::Byte(*g)));
                out.push((bc, DmxAssignment::Byte(*b)));
            } else {
                log::warn!(
                    "[fixtures] {} has no RGB channels; dropping rgb({}, {}, {})",
                    fixture.id,
                    r,
                    g,
                    b
                );
            }
        }
        None => {}
    }

    out.sort_by_key(|(ch, _)| *ch);
    out.dedup_by_key(|(ch, _)| *ch);
    out
}
