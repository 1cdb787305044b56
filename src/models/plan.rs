use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use super::channels::{CurvePoint, NativeKind};
use super::effects::TransitionSpec;

/// The implementation plan handed over by the planner.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ImplementationPlan {
    /// Full song length; falls back to the last section end.
    #[serde(default)]
    pub song_duration_ms: Option<u64>,
    pub sections: Vec<PlanSection>,
    #[serde(default)]
    pub templates: Vec<Template>,
    /// Appearance overlays keyed by section id.
    #[serde(default)]
    pub overlays: HashMap<String, SectionOverlay>,
}

impl ImplementationPlan {
    pub fn template(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn song_duration_ms(&self) -> u64 {
        self.song_duration_ms
            .unwrap_or_else(|| self.sections.iter().map(|s| s.end_ms).max().unwrap_or(0))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PlanSection {
    pub id: String,
    pub start_ms: u64,
    pub end_ms: u64,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub transition_in: Option<TransitionSpec>,
    #[serde(default)]
    pub transition_out: Option<TransitionSpec>,
    #[serde(default)]
    pub instructions: Vec<TargetInstruction>,
}

impl PlanSection {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// A reusable sequence of steps, timed as fractions of the section.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub steps: Vec<TemplateStep>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TemplateStep {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub start: f32,
    #[serde(default = "default_step_end")]
    pub end: f32,
    #[serde(default = "default_target")]
    pub target: String,
    #[serde(default)]
    pub base_pose: Option<PoseRef>,
    #[serde(default)]
    pub movement: Option<MovementInstruction>,
    #[serde(default)]
    pub dimmer: Option<DimmerInstruction>,
    #[serde(default)]
    pub geometry: Option<GeometryInstruction>,
}

fn default_step_end() -> f32 {
    1.0
}

fn default_target() -> String {
    "ALL".to_string()
}

/// Per-target overrides applied on top of every template step.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TargetInstruction {
    pub target: String,
    #[serde(default)]
    pub base_pose: Option<PoseRef>,
    #[serde(default)]
    pub movement: Option<MovementInstruction>,
    #[serde(default)]
    pub dimmer: Option<DimmerInstruction>,
    #[serde(default)]
    pub geometry: Option<GeometryInstruction>,
}

impl TemplateStep {
    /// A step spanning the whole section, targeting every fixture.
    pub fn full_section() -> TemplateStep {
        TemplateStep {
            id: String::new(),
            start: 0.0,
            end: default_step_end(),
            target: default_target(),
            base_pose: None,
            movement: None,
            dimmer: None,
            geometry: None,
        }
    }

    /// This step with the instruction's fields layered on top.
    pub fn with_instruction(&self, instruction: &TargetInstruction) -> TemplateStep {
        TemplateStep {
            id: self.id.clone(),
            start: self.start,
            end: self.end,
            target: instruction.target.clone(),
            base_pose: instruction
                .base_pose
                .clone()
                .or_else(|| self.base_pose.clone()),
            movement: instruction
                .movement
                .clone()
                .or_else(|| self.movement.clone()),
            dimmer: instruction.dimmer.clone().or_else(|| self.dimmer.clone()),
            geometry: instruction
                .geometry
                .clone()
                .or_else(|| self.geometry.clone()),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MovementInstruction {
    pub pattern: String,
    #[serde(default = "default_intensity")]
    pub intensity: String,
    #[serde(default)]
    pub amplitude: Option<f32>,
    #[serde(default)]
    pub frequency: Option<f32>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DimmerInstruction {
    pub pattern: String,
    #[serde(default = "default_intensity")]
    pub intensity: String,
    /// Static level in percent for `static`/`full`/`hold`.
    #[serde(default)]
    pub level_pct: Option<f32>,
}

fn default_intensity() -> String {
    "moderate".to_string()
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GeometryInstruction {
    #[serde(rename = "type")]
    pub geometry_type: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

/// Named pose or explicit pan/tilt degrees.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum PoseRef {
    Named(String),
    #[serde(rename_all = "camelCase")]
    Explicit { pan_deg: f32, tilt_deg: f32 },
}

/// Appearance channels shared by every segment of a section.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct SectionOverlay {
    #[serde(default)]
    pub shutter: Option<OverlayValue>,
    #[serde(default)]
    pub color: Option<OverlayValue>,
    #[serde(default)]
    pub gobo: Option<OverlayValue>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum OverlayValue {
    Static(u8),
    Rgb([u8; 3]),
    Curve(CurveSpec),
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum CurveSpec {
    Points {
        points: Vec<CurvePoint>,
    },
    Native {
        kind: NativeKind,
        min: f32,
        max: f32,
        #[serde(default = "default_cycles")]
        cycles: f32,
    },
}

fn default_cycles() -> f32 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plan_deserializes_with_defaults() {
        let plan: ImplementationPlan = serde_json::from_value(json!({
            "sections": [
                { "id": "intro", "startMs": 0, "endMs": 8000, "template": "sweep" }
            ],
            "templates": [
                { "id": "sweep", "steps": [ { "movement": { "pattern": "sweep_lr" } } ] }
            ],
            "overlays": {
                "intro": { "shutter": 255, "color": [255, 0, 64], "gobo": { "kind": "ramp", "min": 0, "max": 40 } }
            }
        }))
        .unwrap();

        assert_eq!(plan.song_duration_ms(), 8000);
        let step = &plan.template("sweep").unwrap().steps[0];
        assert_eq!(step.target, "ALL");
        assert_eq!(step.end, 1.0);
        assert_eq!(step.movement.as_ref().unwrap().intensity, "moderate");

        let overlay = &plan.overlays["intro"];
        assert_eq!(overlay.shutter, Some(OverlayValue::Static(255)));
        assert_eq!(overlay.color, Some(OverlayValue::Rgb([255, 0, 64])));
        assert!(matches!(
            overlay.gobo,
            Some(OverlayValue::Curve(CurveSpec::Native { kind: NativeKind::Ramp, .. }))
        ));
    }

    #[test]
    fn pose_refs_accept_names_and_degrees() {
        let named: PoseRef = serde_json::from_value(json!("audience")).unwrap();
        assert_eq!(named, PoseRef::Named("audience".into()));
        let explicit: PoseRef =
            serde_json::from_value(json!({ "panDeg": -30.0, "tiltDeg": 15.0 })).unwrap();
        assert_eq!(
            explicit,
            PoseRef::Explicit {
                pan_deg: -30.0,
                tilt_deg: 15.0
            }
        );
    }

    #[test]
    fn instructions_override_step_fields() {
        let step = TemplateStep {
            id: "a".into(),
            start: 0.0,
            end: 0.5,
            target: "ALL".into(),
            base_pose: Some(PoseRef::Named("forward".into())),
            movement: None,
            dimmer: None,
            geometry: None,
        };
        let instruction = TargetInstruction {
            target: "left".into(),
            base_pose: None,
            movement: Some(MovementInstruction {
                pattern: "circle".into(),
                intensity: "fast".into(),
                amplitude: None,
                frequency: None,
            }),
            dimmer: None,
            geometry: None,
        };

        let merged = step.with_instruction(&instruction);
        assert_eq!(merged.target, "left");
        assert_eq!(merged.base_pose, Some(PoseRef::Named("forward".into())));
        assert_eq!(merged.movement.unwrap().pattern, "circle");
        assert_eq!(merged.end, 0.5);
    }
}
