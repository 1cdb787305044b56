//! Effect table export
//!
//! Rendered effects become DMX effect settings strings for the sequence
//! file: every patched channel carries either a slider value or a value
//! curve, never both. Identical settings are stored once and referenced by
//! index from the placements.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::fixtures::engine::{assign_channels, DmxAssignment};
use crate::fixtures::models::{FixtureConfig, FixtureGroup};
use crate::models::{ChannelValue, CustomCurve, NativeCurve, RenderedEffect};
use crate::pipeline::RenderOutput;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelSetting {
    Slider(u8),
    /// Value-curve descriptor without the key.
    Curve(String),
}

/// Settings of one DMX effect, keyed by DMX channel number.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EffectSettings {
    pub channels: BTreeMap<u16, ChannelSetting>,
}

impl EffectSettings {
    /// The comma separated settings string, in channel order.
    pub fn encode(&self) -> String {
        self.channels
            .iter()
            .map(|(ch, setting)| match setting {
                ChannelSetting::Slider(v) => format!("E_SLIDER_DMX{}={}", ch, v),
                ChannelSetting::Curve(descriptor) => {
                    format!("E_VALUECURVE_DMX{}={}", ch, descriptor)
                }
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn native_descriptor(channel: u16, curve: &NativeCurve) -> String {
    format!(
        "Active=TRUE|Id=ID_VALUECURVE_DMX{}|Type={}|Min={:.2}|Max={:.2}|P1={:.2}|P2={:.2}|P3={:.2}|P4={:.2}|RV=TRUE|",
        channel,
        curve.kind.descriptor_name(),
        curve.min,
        curve.max,
        curve.p1,
        curve.p2,
        curve.p3,
        curve.p4
    )
}

fn custom_descriptor(channel: u16, curve: &CustomCurve) -> String {
    let values = curve
        .points
        .iter()
        .map(|point| {
            format!(
                "{:.3}:{:.3}",
                point.t.clamp(0.0, 1.0),
                (point.value / 255.0).clamp(0.0, 1.0)
            )
        })
        .collect::<Vec<_>>()
        .join(";");
    format!(
        "Active=TRUE|Id=ID_VALUECURVE_DMX{}|Type=Custom|Min=0.00|Max=255.00|RV=TRUE|Values={}|",
        channel, values
    )
}

fn channel_setting(channel: u16, assignment: &DmxAssignment) -> ChannelSetting {
    match assignment {
        DmxAssignment::Byte(v) => ChannelSetting::Slider(*v),
        DmxAssignment::Value(ChannelValue::Static(v)) => ChannelSetting::Slider(*v),
        DmxAssignment::Value(ChannelValue::Native(curve)) => {
            ChannelSetting::Curve(native_descriptor(channel, curve))
        }
        DmxAssignment::Value(ChannelValue::Custom(curve)) => {
            ChannelSetting::Curve(custom_descriptor(channel, curve))
        }
    }
}

pub fn encode_effect(effect: &RenderedEffect, fixture: &FixtureConfig) -> EffectSettings {
    let channels = assign_channels(fixture, &effect.channels)
        .iter()
        .map(|(ch, assignment)| (*ch, channel_setting(*ch, assignment)))
        .collect();
    EffectSettings { channels }
}

/// One effect instance on the sequence timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectPlacement {
    pub element: String,
    pub layer: usize,
    pub start_ms: u64,
    pub end_ms: u64,
    pub label: String,
    /// Index into `EffectTable::settings`.
    pub settings_ref: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectTable {
    /// Distinct settings strings, in first-use order.
    pub settings: Vec<String>,
    pub placements: Vec<EffectPlacement>,
}

impl EffectTable {
    pub fn settings_for(&self, placement: &EffectPlacement) -> Option<&str> {
        self.settings.get(placement.settings_ref).map(String::as_str)
    }
}

/// First layer whose last effect ends by `start_ms`.
fn pick_layer(layer_ends: &mut Vec<u64>, start_ms: u64, end_ms: u64) -> usize {
    match layer_ends.iter().position(|end| *end <= start_ms) {
        Some(layer) => {
            layer_ends[layer] = end_ms;
            layer
        }
        None => {
            layer_ends.push(end_ms);
            layer_ends.len() - 1
        }
    }
}

pub fn build_effect_table(output: &RenderOutput, fixtures: &FixtureGroup) -> EffectTable {
    let mut table = EffectTable::default();
    let mut index: HashMap<String, usize> = HashMap::new();

    for timeline in &output.timelines {
        let Some(fixture) = fixtures.get(&timeline.fixture_id) else {
            log::warn!(
                "[export] no fixture '{}' in group, dropping {} effects",
                timeline.fixture_id,
                timeline.effects.len()
            );
            continue;
        };

        let mut layer_ends = Vec::new();
        for effect in &timeline.effects {
            let encoded = encode_effect(effect, fixture).encode();
            let settings_ref = match index.get(&encoded) {
                Some(i) => *i,
                None => {
                    table.settings.push(encoded.clone());
                    index.insert(encoded, table.settings.len() - 1);
                    table.settings.len() - 1
                }
            };
            table.placements.push(EffectPlacement {
                element: fixture.display_name().to_string(),
                layer: pick_layer(&mut layer_ends, effect.start_ms, effect.end_ms),
                start_ms: effect.start_ms,
                end_ms: effect.end_ms,
                label: effect.label.clone(),
                settings_ref,
            });
        }
    }

    log::debug!(
        "[export] {} placements, {} distinct settings",
        table.placements.len(),
        table.settings.len()
    );
    table
}
