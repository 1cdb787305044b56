use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Categorical intensity tier chosen by the planner.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Intensity {
    Smooth,
    Slow,
    #[default]
    Moderate,
    Fast,
    Dramatic,
}

impl Intensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intensity::Smooth => "smooth",
            Intensity::Slow => "slow",
            Intensity::Moderate => "moderate",
            Intensity::Fast => "fast",
            Intensity::Dramatic => "dramatic",
        }
    }
}

impl FromStr for Intensity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "smooth" => Ok(Intensity::Smooth),
            "slow" => Ok(Intensity::Slow),
            "moderate" | "medium" => Ok(Intensity::Moderate),
            "fast" => Ok(Intensity::Fast),
            "dramatic" | "intense" => Ok(Intensity::Dramatic),
            other => Err(format!("unknown intensity tier '{}'", other)),
        }
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which half of an alternating pair a fixture's tilt follows.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TiltRole {
    Up,
    Down,
}

/// One movement instruction, possibly specialised for a single fixture.
///
/// The record is immutable: every `with_*` call consumes and returns a new
/// value, so geometry transforms can never alias the base movement.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MovementSpec {
    pattern: String,
    #[serde(default)]
    intensity: Intensity,
    #[serde(default)]
    amplitude: Option<f32>,
    #[serde(default)]
    frequency: Option<f32>,
    #[serde(default)]
    phase_deg: f32,
    #[serde(default)]
    tilt_role: Option<TiltRole>,
    #[serde(default)]
    pan_offset_deg: f32,
    #[serde(default)]
    tilt_offset_deg: f32,
}

impl MovementSpec {
    pub fn new(pattern: impl Into<String>, intensity: Intensity) -> Self {
        Self {
            pattern: pattern.into(),
            intensity,
            amplitude: None,
            frequency: None,
            phase_deg: 0.0,
            tilt_role: None,
            pan_offset_deg: 0.0,
            tilt_offset_deg: 0.0,
        }
    }

    pub fn hold() -> Self {
        Self::new("hold", Intensity::default())
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn intensity(&self) -> Intensity {
        self.intensity
    }

    /// Amplitude override as a fraction of the physical channel range.
    pub fn amplitude(&self) -> Option<f32> {
        self.amplitude
    }

    /// Frequency override in cycles per effect.
    pub fn frequency(&self) -> Option<f32> {
        self.frequency
    }

    pub fn phase_deg(&self) -> f32 {
        self.phase_deg
    }

    pub fn tilt_role(&self) -> Option<TiltRole> {
        self.tilt_role
    }

    pub fn pan_offset_deg(&self) -> f32 {
        self.pan_offset_deg
    }

    pub fn tilt_offset_deg(&self) -> f32 {
        self.tilt_offset_deg
    }

    pub fn is_static(&self) -> bool {
        matches!(self.pattern.as_str(), "hold" | "static" | "full")
    }

    pub fn with_amplitude(mut self, amplitude: Option<f32>) -> Self {
        self.amplitude = amplitude;
        self
    }

    pub fn with_frequency(mut self, frequency: Option<f32>) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_phase_deg(mut self, phase_deg: f32) -> Self {
        self.phase_deg = phase_deg.rem_euclid(360.0);
        self
    }

    pub fn with_tilt_role(mut self, role: Option<TiltRole>) -> Self {
        self.tilt_role = role;
        self
    }

    pub fn with_pan_offset_deg(mut self, offset: f32) -> Self {
        self.pan_offset_deg = offset;
        self
    }

    pub fn with_tilt_offset_deg(mut self, offset: f32) -> Self {
        self.tilt_offset_deg = offset;
        self
    }

    /// True when two specs would render to different per-fixture values.
    pub fn differs_spatially(&self, other: &MovementSpec) -> bool {
        const EPS: f32 = 1e-4;
        (self.pan_offset_deg - other.pan_offset_deg).abs() > EPS
            || (self.tilt_offset_deg - other.tilt_offset_deg).abs() > EPS
            || (self.phase_deg - other.phase_deg).abs() > EPS
            || self.tilt_role != other.tilt_role
    }
}
