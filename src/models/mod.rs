pub mod channels;
pub mod effects;
pub mod movement;
pub mod plan;

pub use channels::{
    to_dmx, ChannelSet, ChannelValue, ColorValue, CurvePoint, CustomCurve, NativeCurve, NativeKind,
};
pub use effects::{
    BoundaryInfo, GapSegment, GapType, RenderedEffect, SequencedEffect, TransitionMode,
    TransitionSpec,
};
pub use movement::{Intensity, MovementSpec, TiltRole};
pub use plan::{
    CurveSpec, DimmerInstruction, GeometryInstruction, ImplementationPlan, MovementInstruction,
    OverlayValue, PlanSection, PoseRef, SectionOverlay, TargetInstruction, Template, TemplateStep,
};
