pub mod library;
pub mod pipeline;
pub mod smoothing;

pub use library::{ChannelRole, CurveLibrary};
pub use pipeline::{blend_boundaries, process_fixture, render_effects};
pub use smoothing::{smooth, Pchip};
