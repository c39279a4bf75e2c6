//! Paint orchestration: plan color groups, map pixels to the screen, and
//! drive the palette and canvas through an input backend.

pub mod control;
pub mod engine;
pub mod mapper;
pub mod navigator;
pub mod planner;
pub mod probe;

pub use control::{PaintHandle, PaintState};
pub use engine::{EngineTiming, PaintEngine, PaintOptions, PaintReport, Progress, ProgressFn};
pub use mapper::{CanvasCalibration, CoordinateMapper};
pub use navigator::{NavigatorTiming, PaletteCalibration, PaletteNavigator};
pub use planner::{build_plan, Bounds, ColorGroup, Plan, Region};
pub use probe::{click_reference_points, reference_points, ReferencePoint};
