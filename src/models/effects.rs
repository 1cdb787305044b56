use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::channels::ChannelSet;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransitionMode {
    #[default]
    Snap,
    Crossfade,
    FadeThroughBlack,
    GapFill,
}

impl TransitionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionMode::Snap => "snap",
            TransitionMode::Crossfade => "crossfade",
            TransitionMode::FadeThroughBlack => "fade_through_black",
            TransitionMode::GapFill => "gap_fill",
        }
    }
}

impl FromStr for TransitionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "snap" | "cut" => Ok(TransitionMode::Snap),
            "crossfade" | "fade" => Ok(TransitionMode::Crossfade),
            "fade_through_black" | "blackout" => Ok(TransitionMode::FadeThroughBlack),
            "gap_fill" => Ok(TransitionMode::GapFill),
            other => Err(format!("unknown transition mode '{}'", other)),
        }
    }
}

impl fmt::Display for TransitionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an effect enters or leaves its neighbour.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransitionSpec {
    pub mode: TransitionMode,
    #[serde(default)]
    pub duration_ms: u64,
}

impl TransitionSpec {
    pub fn new(mode: TransitionMode, duration_ms: u64) -> Self {
        Self { mode, duration_ms }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GapType {
    Start,
    InterSection,
    End,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryInfo {
    pub is_section_start: bool,
    pub is_section_end: bool,
    pub section_id: String,
    pub entry: Option<TransitionSpec>,
    pub exit: Option<TransitionSpec>,
    pub is_gap_fill: bool,
    pub gap_type: Option<GapType>,
}

/// One effect for one fixture, before curves are rendered.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SequencedEffect {
    pub fixture_id: String,
    pub start_ms: u64,
    pub end_ms: u64,
    pub channels: ChannelSet,
    pub boundary: BoundaryInfo,
    pub label: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl SequencedEffect {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// An effect after the curve pipeline: every custom curve holds the fixed
/// output point count and boundary blending has been applied.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RenderedEffect {
    pub fixture_id: String,
    pub start_ms: u64,
    pub end_ms: u64,
    pub channels: ChannelSet,
    pub boundary: BoundaryInfo,
    pub label: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl RenderedEffect {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// An idle interval on one fixture's timeline.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GapSegment {
    pub start_ms: u64,
    pub end_ms: u64,
    pub section_id: String,
    pub gap_type: GapType,
}

impl GapSegment {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_mode_parses_aliases() {
        assert_eq!("Cut".parse::<TransitionMode>(), Ok(TransitionMode::Snap));
        assert_eq!(
            "blackout".parse::<TransitionMode>(),
            Ok(TransitionMode::FadeThroughBlack)
        );
        assert!("wipe".parse::<TransitionMode>().is_err());
    }

    #[test]
    fn transition_spec_deserializes_snake_case_modes() {
        let spec: TransitionSpec =
            serde_json::from_str(r#"{"mode":"fade_through_black","durationMs":750}"#).unwrap();
        assert_eq!(spec, TransitionSpec::new(TransitionMode::FadeThroughBlack, 750));
    }
}
