//! Gap-Fill / Transition state machine
//!
//! Every fixture is handled on its own: idle intervals are detected on its
//! sorted timeline, classified, and filled with synthesized effects built by
//! the transition-handler registry.

use crate::fixtures::engine::{pan_dmx, tilt_dmx};
use crate::fixtures::models::FixtureConfig;
use crate::models::{GapSegment, GapType, SequencedEffect, TransitionMode};
use crate::settings::RenderSettings;

pub mod gaps;
pub mod handlers;

pub use gaps::{detect_gaps, resolve_overlaps};
pub use handlers::{handler, Anchor, TransitionContext, TransitionHandler};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapState {
    /// Nothing before the gap.
    SequenceStart,
    /// Nothing after the gap.
    SequenceEnd,
    LargeGap,
    SmallGap,
}

pub fn classify(
    gap: &GapSegment,
    previous: Option<&SequencedEffect>,
    next: Option<&SequencedEffect>,
    large_gap_threshold_ms: u64,
) -> GapState {
    match (previous, next) {
        (None, _) => GapState::SequenceStart,
        (_, None) => GapState::SequenceEnd,
        _ if gap.duration_ms() >= large_gap_threshold_ms => GapState::LargeGap,
        _ => GapState::SmallGap,
    }
}

pub struct GapFiller<'a> {
    settings: &'a RenderSettings,
}

impl<'a> GapFiller<'a> {
    pub fn new(settings: &'a RenderSettings) -> Self {
        Self { settings }
    }

    /// Resting pose in DMX with the light off.
    pub fn soft_home(&self, fixture: &FixtureConfig) -> Anchor {
        let pose = fixture.resting.unwrap_or(self.settings.soft_home);
        Anchor {
            pan: pan_dmx(fixture, pose.pan_deg),
            tilt: tilt_dmx(fixture, pose.tilt_deg),
            dimmer: 0.0,
            shutter: fixture
                .channels
                .shutter
                .map(|_| self.settings.shutter_closed as f32),
            color: None,
            gobo: None,
        }
    }

    fn small_gap_mode(previous: &SequencedEffect, next: &SequencedEffect) -> TransitionMode {
        let requested = previous
            .boundary
            .exit
            .or(next.boundary.entry)
            .map(|t| t.mode);
        match requested {
            Some(TransitionMode::FadeThroughBlack) => TransitionMode::FadeThroughBlack,
            _ => TransitionMode::Crossfade,
        }
    }

    /// The fixture's effects plus synthesized gap effects, sorted and
    /// covering [0, song_duration_ms] up to gaps below the minimum.
    pub fn fill(
        &self,
        fixture: &FixtureConfig,
        effects: Vec<SequencedEffect>,
        song_duration_ms: u64,
    ) -> Vec<SequencedEffect> {
        let mut effects = resolve_overlaps(effects, self.settings.curve_points);
        let gaps = detect_gaps(&effects, song_duration_ms, self.settings.min_gap_ms);
        if gaps.is_empty() {
            return effects;
        }

        let home = self.soft_home(fixture);
        let mut synthesized = Vec::new();
        for gap in &gaps {
            let previous = effects.iter().rev().find(|e| e.end_ms <= gap.start_ms);
            let next = effects.iter().find(|e| e.start_ms >= gap.end_ms);
            let state = classify(gap, previous, next, self.settings.large_gap_threshold_ms);

            let (mode, from, to, gap_type) = match (state, previous, next) {
                (GapState::SequenceStart, _, _) => (
                    TransitionMode::Crossfade,
                    home.clone(),
                    home.clone(),
                    GapType::Start,
                ),
                (GapState::SequenceEnd, _, _) => (
                    TransitionMode::Crossfade,
                    home.clone(),
                    home.clone(),
                    GapType::End,
                ),
                (GapState::LargeGap, Some(p), Some(n)) => (
                    TransitionMode::GapFill,
                    Anchor::end_of(&p.channels),
                    Anchor::start_of(&n.channels),
                    GapType::InterSection,
                ),
                (GapState::SmallGap, Some(p), Some(n)) => (
                    Self::small_gap_mode(p, n),
                    Anchor::end_of(&p.channels),
                    Anchor::start_of(&n.channels),
                    GapType::InterSection,
                ),
                _ => continue,
            };

            let ctx = TransitionContext {
                fixture_id: &fixture.id,
                section_id: &gap.section_id,
                gap_type: Some(gap_type),
                start_ms: gap.start_ms,
                end_ms: gap.end_ms,
                from,
                to,
                home: home.clone(),
                split: self.settings.gap_split,
                shutter_closed: self.settings.shutter_closed,
            };
            let filled = handler(mode).synthesize(&ctx);
            log::debug!(
                "[transitions] {}: {:?} {}..{} ms -> {} effects",
                fixture.id,
                state,
                gap.start_ms,
                gap.end_ms,
                filled.len()
            );
            synthesized.extend(filled);
        }

        effects.extend(synthesized);
        effects.sort_by_key(|e| e.start_ms);
        effects
    }
}
