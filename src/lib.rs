pub mod curves;
pub mod error;
pub mod export;
pub mod fixtures;
pub mod geometry;
pub mod models;
pub mod pipeline;
pub mod renderer;
pub mod settings;
pub mod transitions;

pub use error::{RenderError, RenderResult};
pub use export::{build_effect_table, encode_effect, EffectSettings, EffectTable};
pub use fixtures::{load_fixture_group, resolve_targets, FixtureConfig, FixtureGroup};
pub use geometry::GeometryEngine;
pub use pipeline::{load_plan, render_plan, FixtureTimeline, RenderOutput};
pub use settings::RenderSettings;
