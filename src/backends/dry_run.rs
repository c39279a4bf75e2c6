use std::sync::{Arc, Mutex};

use log::debug;

use crate::error::InputError;
use crate::geometry::ScreenPoint;

use super::InputBackend;

/// What a dry-run backend was asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordedInput {
    Focus,
    Click(ScreenPoint),
    DoubleClick(ScreenPoint),
}

/// Backend that logs input instead of injecting it.
///
/// The record is shared, so a clone of [`DryRunBackend::log`] can be
/// inspected after the backend has been moved into a worker.
#[derive(Debug, Clone, Default)]
pub struct DryRunBackend {
    log: Arc<Mutex<Vec<RecordedInput>>>,
}

impl DryRunBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to everything recorded so far.
    pub fn log(&self) -> Arc<Mutex<Vec<RecordedInput>>> {
        Arc::clone(&self.log)
    }

    fn record(&self, input: RecordedInput) {
        if let Ok(mut log) = self.log.lock() {
            log.push(input);
        }
    }
}

impl InputBackend for DryRunBackend {
    fn name(&self) -> &str {
        "dry-run"
    }

    fn focus(&mut self) -> Result<(), InputError> {
        self.record(RecordedInput::Focus);
        Ok(())
    }

    fn click(&mut self, point: ScreenPoint) -> Result<(), InputError> {
        debug!("dry-run click at {point}");
        self.record(RecordedInput::Click(point));
        Ok(())
    }

    fn double_click(&mut self, point: ScreenPoint) -> Result<(), InputError> {
        debug!("dry-run double click at {point}");
        self.record(RecordedInput::DoubleClick(point));
        Ok(())
    }
}
