use thiserror::Error;

use crate::paint::PaintState;

/// Failures reported by an input backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InputError {
    /// A synthetic click or cursor move was rejected. Non-fatal.
    #[error("input injection failed: {0}")]
    Injection(String),
    /// The target window is gone; nothing further can land where intended.
    #[error("target window lost: {0}")]
    WindowLost(String),
    #[error("unsupported by this backend: {0}")]
    Unsupported(String),
}

impl InputError {
    /// Whether the paint loop must abort instead of counting the failure.
    pub fn is_fatal(&self) -> bool {
        matches!(self, InputError::WindowLost(_))
    }
}

/// Errors raised by the paint core.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PaintError {
    #[error("not calibrated: {0} is missing")]
    NotCalibrated(&'static str),

    #[error("invalid calibration: {0}")]
    InvalidCalibration(String),

    #[error("palette slot {index} is out of range ({slots} slot positions calibrated)")]
    SlotOutOfRange { index: usize, slots: usize },

    #[error("invalid region: {0}")]
    InvalidRegion(String),

    #[error("nothing to paint: the plan is empty")]
    EmptyPlan,

    #[error("palette catalog is empty")]
    EmptyCatalog,

    #[error("pixel ({row}, {col}) lies outside the {width}x{height} image")]
    PixelOutOfBounds {
        row: usize,
        col: usize,
        width: usize,
        height: usize,
    },

    #[error("engine cannot be started again (state: {0})")]
    EngineSpent(PaintState),

    #[error(transparent)]
    Input(#[from] InputError),
}
