//! Segment Renderer
//!
//! Expands one template step into one fully channeled `SequencedEffect` per
//! resolved fixture. Geometry is applied to the base movement before any
//! curve is resolved; appearance channels come from the section overlay.

use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};

use crate::curves::{ChannelRole, CurveLibrary};
use crate::error::RenderResult;
use crate::fixtures::engine::{pan_dmx, tilt_dmx};
use crate::fixtures::models::{AxisCalibration, ChannelLimits, FixtureConfig, FixtureGroup};
use crate::fixtures::parser::resolve_targets;
use crate::geometry::GeometryEngine;
use crate::models::{
    BoundaryInfo, ChannelSet, ChannelValue, MovementSpec, SequencedEffect, TemplateStep, TiltRole,
    TransitionSpec,
};
use crate::settings::RenderSettings;

pub mod overlay;
pub mod poses;

pub use overlay::{resolve_overlay, ResolvedOverlay};
pub use poses::{named_pose, resolve_pose};

/// Time range and transitions of the section a step renders into.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionBounds {
    pub id: String,
    pub start_ms: u64,
    pub end_ms: u64,
    pub transition_in: Option<TransitionSpec>,
    pub transition_out: Option<TransitionSpec>,
}

impl SectionBounds {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// Fixtures with identical calibration can share one resolved channel set.
type CalibrationKey = (
    AxisCalibration,
    AxisCalibration,
    ChannelLimits,
    bool,
    Option<(u32, u32)>,
);

fn calibration_key(fixture: &FixtureConfig) -> CalibrationKey {
    (
        fixture.pan,
        fixture.tilt,
        fixture.dimmer,
        fixture.channels.shutter.is_some(),
        fixture
            .resting
            .map(|p| (p.pan_deg.to_bits(), p.tilt_deg.to_bits())),
    )
}

pub struct SegmentRenderer<'a> {
    fixtures: &'a FixtureGroup,
    settings: &'a RenderSettings,
}

impl<'a> SegmentRenderer<'a> {
    pub fn new(fixtures: &'a FixtureGroup, settings: &'a RenderSettings) -> Self {
        Self { fixtures, settings }
    }

    /// Absolute [start, end) of a step inside its section.
    pub fn step_window(step: &TemplateStep, section: &SectionBounds) -> (u64, u64) {
        let duration = section.duration_ms() as f64;
        let from = step.start.clamp(0.0, 1.0) as f64;
        let to = step.end.clamp(0.0, 1.0) as f64;
        let start = section.start_ms + (from * duration).round() as u64;
        let end = section.start_ms + (to * duration).round() as u64;
        (start, end.max(start))
    }

    fn base_movement(step: &TemplateStep) -> MovementSpec {
        let Some(instruction) = &step.movement else {
            return MovementSpec::hold();
        };
        match CurveLibrary::parse_intensity(&instruction.intensity) {
            Some(intensity) => MovementSpec::new(instruction.pattern.clone(), intensity)
                .with_amplitude(instruction.amplitude)
                .with_frequency(instruction.frequency),
            // unknown tier: hold the static centre
            None => MovementSpec::hold(),
        }
    }

    fn dimmer_value(&self, step: &TemplateStep, fixture: &FixtureConfig) -> ChannelValue {
        match &step.dimmer {
            Some(d) => CurveLibrary::resolve_dimmer(&d.pattern, &d.intensity, d.level_pct, fixture.dimmer),
            None => CurveLibrary::resolve_dimmer("full", "moderate", None, fixture.dimmer),
        }
    }

    fn channels_for(
        &self,
        step: &TemplateStep,
        fixture: &FixtureConfig,
        movement: &MovementSpec,
        per_fixture_curves: bool,
        overlay: &ResolvedOverlay,
    ) -> ChannelSet {
        let resting = fixture.resting.unwrap_or(self.settings.soft_home);
        let pose = resolve_pose(step.base_pose.as_ref(), resting);
        let pan_center = pan_dmx(fixture, pose.pan_deg + movement.pan_offset_deg());
        let tilt_center = tilt_dmx(fixture, pose.tilt_deg + movement.tilt_offset_deg());

        let mut pan =
            CurveLibrary::resolve_movement(movement, ChannelRole::Pan, pan_center, fixture.pan.limits());
        let mut tilt = CurveLibrary::resolve_movement(
            movement,
            ChannelRole::Tilt,
            tilt_center,
            fixture.tilt.limits(),
        );
        if per_fixture_curves {
            let points = self.settings.curve_points;
            let invert = movement.tilt_role() == Some(TiltRole::Down);
            pan = CurveLibrary::specialize(&pan, movement.phase_deg(), false, points);
            tilt = CurveLibrary::specialize(&tilt, movement.phase_deg(), invert, points);
        }

        let shutter = overlay.shutter.clone().or_else(|| {
            fixture
                .channels
                .shutter
                .map(|_| ChannelValue::Static(self.settings.shutter_open))
        });

        ChannelSet {
            pan,
            tilt,
            dimmer: self.dimmer_value(step, fixture),
            shutter,
            color: overlay.color.clone(),
            gobo: overlay.gobo.clone(),
        }
    }

    /// One effect per resolved fixture; an unresolvable target is an error
    /// for this step only.
    pub fn render(
        &self,
        step: &TemplateStep,
        section: &SectionBounds,
        overlay: &ResolvedOverlay,
    ) -> RenderResult<Vec<SequencedEffect>> {
        let (start_ms, end_ms) = Self::step_window(step, section);
        if end_ms <= start_ms {
            log::warn!(
                "[renderer] section {}: step '{}' has no duration, skipping",
                section.id,
                step.id
            );
            return Ok(Vec::new());
        }

        let targets = resolve_targets(&step.target, self.fixtures)?;
        let base = Self::base_movement(step);
        let empty = Map::new();
        let (geometry_type, params) = match &step.geometry {
            Some(g) => (Some(g.geometry_type.as_str()), &g.params),
            None => (None, &empty),
        };

        let movements = GeometryEngine::apply(geometry_type, &targets, &base, params);
        let per_fixture_curves =
            GeometryEngine::should_use_per_fixture_curves(geometry_type, targets.len());
        let shared = !GeometryEngine::contains_offsets(geometry_type, params);

        let mut cache: HashMap<CalibrationKey, ChannelSet> = HashMap::new();
        let mut effects = Vec::with_capacity(targets.len());
        for id in &targets {
            let Some(fixture) = self.fixtures.get(id) else {
                continue;
            };
            let movement = movements.get(id).unwrap_or(&base);

            let channels = if shared {
                cache
                    .entry(calibration_key(fixture))
                    .or_insert_with(|| {
                        self.channels_for(step, fixture, movement, per_fixture_curves, overlay)
                    })
                    .clone()
            } else {
                self.channels_for(step, fixture, movement, per_fixture_curves, overlay)
            };

            let mut metadata = BTreeMap::new();
            metadata.insert("pattern".to_string(), json!(base.pattern()));
            metadata.insert("intensity".to_string(), json!(base.intensity().as_str()));
            if let Some(kind) = geometry_type {
                metadata.insert("geometry".to_string(), json!(kind));
            }
            if !step.id.is_empty() {
                metadata.insert("step".to_string(), Value::String(step.id.clone()));
            }

            effects.push(SequencedEffect {
                fixture_id: id.clone(),
                start_ms,
                end_ms,
                channels,
                boundary: BoundaryInfo {
                    section_id: section.id.clone(),
                    ..BoundaryInfo::default()
                },
                label: format!("{}:{}", section.id, base.pattern()),
                metadata,
            });
        }

        log::debug!(
            "[renderer] section {}: step '{}' -> {} effects ({})",
            section.id,
            step.id,
            effects.len(),
            if shared { "shared curves" } else { "per-fixture curves" }
        );
        Ok(effects)
    }
}

/// Mark the first/last segments of every section and attach its transitions.
///
/// A segment is first (last) when its start (end) equals the minimum start
/// (maximum end) over all segments with the same section id.
pub fn tag_section_boundaries(effects: &mut [SequencedEffect], sections: &[SectionBounds]) {
    let mut extents: HashMap<String, (u64, u64)> = HashMap::new();
    for effect in effects.iter() {
        let entry = extents
            .entry(effect.boundary.section_id.clone())
            .or_insert((effect.start_ms, effect.end_ms));
        entry.0 = entry.0.min(effect.start_ms);
        entry.1 = entry.1.max(effect.end_ms);
    }

    for effect in effects.iter_mut() {
        let Some((first, last)) = extents.get(&effect.boundary.section_id).copied() else {
            continue;
        };
        let section = sections.iter().find(|s| s.id == effect.boundary.section_id);
        effect.boundary.is_section_start = effect.start_ms == first;
        effect.boundary.is_section_end = effect.end_ms == last;
        if effect.boundary.is_section_start {
            effect.boundary.entry = section.and_then(|s| s.transition_in);
        }
        if effect.boundary.is_section_end {
            effect.boundary.exit = section.and_then(|s| s.transition_out);
        }
    }
}
