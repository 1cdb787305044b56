pub mod engine;
pub mod layout;
pub mod models;
pub mod parser;

pub use models::{
    AxisCalibration, ChannelLimits, ChannelMap, FixtureConfig, FixtureGroup, PoseDeg,
};
pub use parser::{load_fixture_group, resolve_targets};
