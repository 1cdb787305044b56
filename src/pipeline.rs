//! Plan orchestration: sections are expanded into per-fixture effect buffers,
//! then every fixture is gap filled and run through the curve pipeline on
//! its own rayon task.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Instant;

use crate::curves::process_fixture;
use crate::error::{RenderError, RenderResult};
use crate::fixtures::models::FixtureGroup;
use crate::models::{ImplementationPlan, PlanSection, RenderedEffect, SequencedEffect, TemplateStep};
use crate::renderer::{resolve_overlay, tag_section_boundaries, SectionBounds, SegmentRenderer};
use crate::settings::RenderSettings;
use crate::transitions::GapFiller;

/// Every rendered effect of one fixture, sorted by start.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FixtureTimeline {
    pub fixture_id: String,
    pub effects: Vec<RenderedEffect>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RenderOutput {
    pub song_duration_ms: u64,
    /// One timeline per fixture, in fixture group order.
    pub timelines: Vec<FixtureTimeline>,
    /// Section ids dropped for structural problems.
    pub skipped_sections: Vec<String>,
}

impl RenderOutput {
    pub fn timeline(&self, fixture_id: &str) -> Option<&FixtureTimeline> {
        self.timelines.iter().find(|t| t.fixture_id == fixture_id)
    }

    pub fn effect_count(&self) -> usize {
        self.timelines.iter().map(|t| t.effects.len()).sum()
    }

    pub fn gap_fill_count(&self) -> usize {
        self.timelines
            .iter()
            .flat_map(|t| t.effects.iter())
            .filter(|e| e.boundary.is_gap_fill)
            .count()
    }
}

pub fn load_plan(path: &Path) -> RenderResult<ImplementationPlan> {
    let content = fs::read_to_string(path).map_err(|source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

/// Steps to render for one section, or `None` when the section is unusable.
fn section_steps(plan: &ImplementationPlan, section: &PlanSection) -> Option<Vec<TemplateStep>> {
    let template_steps = match section.template.as_deref() {
        Some(id) => match plan.template(id) {
            Some(template) => template.steps.clone(),
            None => {
                log::warn!(
                    "[pipeline] section {}: unknown template '{}', skipping",
                    section.id,
                    id
                );
                return None;
            }
        },
        None if !section.instructions.is_empty() => vec![TemplateStep::full_section()],
        None => {
            log::warn!(
                "[pipeline] section {}: no template and no instructions, skipping",
                section.id
            );
            return None;
        }
    };

    if section.instructions.is_empty() {
        return Some(template_steps);
    }
    Some(
        template_steps
            .iter()
            .flat_map(|step| {
                section
                    .instructions
                    .iter()
                    .map(move |instruction| step.with_instruction(instruction))
            })
            .collect(),
    )
}

fn section_bounds(section: &PlanSection) -> SectionBounds {
    SectionBounds {
        id: section.id.clone(),
        start_ms: section.start_ms,
        end_ms: section.end_ms,
        transition_in: section.transition_in,
        transition_out: section.transition_out,
    }
}

/// Render a whole plan for a fixture group.
///
/// Only a missing fixture group or a plan without a single usable section is
/// fatal; bad sections and bad steps are logged and skipped.
pub fn render_plan(
    plan: &ImplementationPlan,
    fixtures: &FixtureGroup,
    settings: &RenderSettings,
) -> RenderResult<RenderOutput> {
    if fixtures.is_empty() {
        return Err(RenderError::NoFixtures);
    }
    if plan.sections.is_empty() {
        return Err(RenderError::EmptyPlan);
    }

    let started = Instant::now();
    let song_duration_ms = plan.song_duration_ms();
    let renderer = SegmentRenderer::new(fixtures, settings);

    let mut bounds = Vec::new();
    let mut skipped_sections = Vec::new();
    let mut sequenced: Vec<SequencedEffect> = Vec::new();

    for section in &plan.sections {
        if section.end_ms <= section.start_ms {
            log::warn!(
                "[pipeline] section {}: non-positive duration ({}..{} ms), skipping",
                section.id,
                section.start_ms,
                section.end_ms
            );
            skipped_sections.push(section.id.clone());
            continue;
        }
        let Some(steps) = section_steps(plan, section) else {
            skipped_sections.push(section.id.clone());
            continue;
        };

        let section_bounds = section_bounds(section);
        let overlay = resolve_overlay(&section.id, plan.overlays.get(&section.id));
        let before = sequenced.len();
        for step in &steps {
            match renderer.render(step, &section_bounds, &overlay) {
                Ok(effects) => sequenced.extend(effects),
                Err(err) => log::error!(
                    "[pipeline] section {}: step '{}' (target '{}', pattern '{}') failed: {}",
                    section.id,
                    step.id,
                    step.target,
                    step.movement
                        .as_ref()
                        .map(|m| m.pattern.as_str())
                        .unwrap_or("hold"),
                    err
                ),
            }
        }
        log::debug!(
            "[pipeline] section {}: {} steps -> {} effects",
            section.id,
            steps.len(),
            sequenced.len() - before
        );
        bounds.push(section_bounds);
    }

    if bounds.is_empty() {
        return Err(RenderError::EmptyPlan);
    }

    tag_section_boundaries(&mut sequenced, &bounds);

    let mut buffers: HashMap<String, Vec<SequencedEffect>> = HashMap::new();
    for effect in sequenced {
        buffers
            .entry(effect.fixture_id.clone())
            .or_default()
            .push(effect);
    }
    let work: Vec<_> = fixtures
        .fixtures
        .iter()
        .map(|fixture| (fixture, buffers.remove(&fixture.id).unwrap_or_default()))
        .collect();

    let filler = GapFiller::new(settings);
    let timelines: Vec<FixtureTimeline> = work
        .into_par_iter()
        .map(|(fixture, effects)| {
            let filled = filler.fill(fixture, effects, song_duration_ms);
            FixtureTimeline {
                fixture_id: fixture.id.clone(),
                effects: process_fixture(filled, settings),
            }
        })
        .collect();

    let output = RenderOutput {
        song_duration_ms,
        timelines,
        skipped_sections,
    };
    log::info!(
        "[pipeline] rendered {} sections for {} fixtures: {} effects ({} gap fill) in {:.1}ms",
        bounds.len(),
        fixtures.len(),
        output.effect_count(),
        output.gap_fill_count(),
        started.elapsed().as_secs_f64() * 1000.0
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::models::FixtureConfig;
    use crate::models::{MovementInstruction, Template, TargetInstruction};

    fn group(n: usize) -> FixtureGroup {
        FixtureGroup::new((1..=n).map(|i| FixtureConfig::new(format!("MH{}", i))).collect())
    }

    fn section(id: &str, start: u64, end: u64, template: Option<&str>) -> PlanSection {
        PlanSection {
            id: id.into(),
            start_ms: start,
            end_ms: end,
            template: template.map(str::to_string),
            transition_in: None,
            transition_out: None,
            instructions: Vec::new(),
        }
    }

    fn template(id: &str, pattern: &str) -> Template {
        Template {
            id: id.into(),
            steps: vec![TemplateStep {
                movement: Some(MovementInstruction {
                    pattern: pattern.into(),
                    intensity: "slow".into(),
                    amplitude: None,
                    frequency: None,
                }),
                ..TemplateStep::full_section()
            }],
        }
    }

    #[test]
    fn missing_fixtures_and_empty_plans_are_fatal() {
        let plan = ImplementationPlan::default();
        assert!(matches!(
            render_plan(&plan, &group(0), &RenderSettings::default()),
            Err(RenderError::NoFixtures)
        ));
        assert!(matches!(
            render_plan(&plan, &group(2), &RenderSettings::default()),
            Err(RenderError::EmptyPlan)
        ));

        let plan = ImplementationPlan {
            sections: vec![section("a", 1000, 1000, Some("t"))],
            templates: vec![template("t", "sweep_lr")],
            ..ImplementationPlan::default()
        };
        assert!(matches!(
            render_plan(&plan, &group(2), &RenderSettings::default()),
            Err(RenderError::EmptyPlan)
        ));
    }

    #[test]
    fn bad_sections_are_skipped_and_the_rest_renders() {
        let plan = ImplementationPlan {
            song_duration_ms: Some(20_000),
            sections: vec![
                section("intro", 0, 10_000, Some("t")),
                section("broken", 10_000, 12_000, Some("nope")),
                section("empty", 12_000, 12_000, Some("t")),
            ],
            templates: vec![template("t", "sweep_lr")],
            ..ImplementationPlan::default()
        };
        let output = render_plan(&plan, &group(3), &RenderSettings::default()).unwrap();
        assert_eq!(output.skipped_sections, vec!["broken", "empty"]);
        assert_eq!(output.timelines.len(), 3);
        for timeline in &output.timelines {
            let spans: Vec<(u64, u64)> =
                timeline.effects.iter().map(|e| (e.start_ms, e.end_ms)).collect();
            assert_eq!(spans, vec![(0, 10_000), (10_000, 20_000)]);
            assert!(timeline.effects[1].boundary.is_gap_fill);
        }
    }

    #[test]
    fn instructions_override_template_targets() {
        let mut s = section("verse", 0, 8000, Some("t"));
        s.instructions = vec![
            TargetInstruction {
                target: "MH1".into(),
                base_pose: None,
                movement: None,
                dimmer: None,
                geometry: None,
            },
            TargetInstruction {
                target: "MH9".into(),
                base_pose: None,
                movement: None,
                dimmer: None,
                geometry: None,
            },
        ];
        let plan = ImplementationPlan {
            sections: vec![s],
            templates: vec![template("t", "circle")],
            ..ImplementationPlan::default()
        };
        let output = render_plan(&plan, &group(2), &RenderSettings::default()).unwrap();

        let mh1 = output.timeline("MH1").unwrap();
        assert_eq!(mh1.effects.len(), 1);
        assert!(!mh1.effects[0].boundary.is_gap_fill);
        assert!(mh1.effects[0].boundary.is_section_start);

        // MH2 was never targeted; the unknown MH9 step is skipped.
        let mh2 = output.timeline("MH2").unwrap();
        assert_eq!(mh2.effects.len(), 1);
        assert!(mh2.effects[0].boundary.is_gap_fill);
    }

    #[test]
    fn loads_plan_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        fs::write(
            &path,
            r#"{"sections":[{"id":"a","startMs":0,"endMs":4000,"template":"t"}],
                "templates":[{"id":"t","steps":[{"target":"ALL"}]}]}"#,
        )
        .unwrap();
        let plan = load_plan(&path).unwrap();
        assert_eq!(plan.sections.len(), 1);
        assert_eq!(plan.song_duration_ms(), 4000);

        let missing = load_plan(&dir.path().join("missing.json"));
        assert!(matches!(missing, Err(RenderError::Io { .. })));
    }
}
