use std::io::{BufRead, Write};

use anyhow::{bail, Context, Result};
use log::info;

use crate::backends::InputBackend;
use crate::config::Config;
use crate::geometry::ScreenPoint;

/// Which part of the calibration to (re)capture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum CalibrationScope {
    #[default]
    All,
    Canvas,
    Palette,
}

/// One point the user is asked to hover over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationStep {
    CanvasTopLeft,
    CanvasBottomRight,
    PrevPage,
    NextPage,
    /// 0-based palette slot.
    Slot(usize),
}

impl std::fmt::Display for CalibrationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalibrationStep::CanvasTopLeft => f.write_str("top-left corner of the canvas"),
            CalibrationStep::CanvasBottomRight => f.write_str("bottom-right corner of the canvas"),
            CalibrationStep::PrevPage => f.write_str("previous palette page button"),
            CalibrationStep::NextPage => f.write_str("next palette page button"),
            CalibrationStep::Slot(i) => write!(f, "palette slot {}", i + 1),
        }
    }
}

/// The full capture sequence for `scope`, in order.
pub fn steps(scope: CalibrationScope, slots: usize) -> Vec<CalibrationStep> {
    let mut steps = Vec::new();
    if matches!(scope, CalibrationScope::All | CalibrationScope::Canvas) {
        steps.push(CalibrationStep::CanvasTopLeft);
        steps.push(CalibrationStep::CanvasBottomRight);
    }
    if matches!(scope, CalibrationScope::All | CalibrationScope::Palette) {
        steps.push(CalibrationStep::PrevPage);
        steps.push(CalibrationStep::NextPage);
        steps.extend((0..slots).map(CalibrationStep::Slot));
    }
    steps
}

/// Record a captured point.
///
/// Slots are captured in order, so capturing slot `i` discards any stored
/// slots after it.
pub fn apply(step: CalibrationStep, point: ScreenPoint, config: &mut Config) {
    match step {
        CalibrationStep::CanvasTopLeft => config.grid_start = Some(point),
        CalibrationStep::CanvasBottomRight => config.grid_end = Some(point),
        CalibrationStep::PrevPage => config.color_left_btn = Some(point),
        CalibrationStep::NextPage => config.color_right_btn = Some(point),
        CalibrationStep::Slot(i) => {
            config.color_positions.truncate(i);
            config.color_positions.push(point);
        }
    }
}

/// Walk `steps`, reading the cursor each time the user presses Enter.
///
/// Returns the number of captured points. Input ending early is an error
/// and leaves `config` partially updated.
pub fn capture<R: BufRead, W: Write>(
    input: &dyn InputBackend,
    steps: &[CalibrationStep],
    mut prompts: R,
    mut out: W,
    config: &mut Config,
) -> Result<usize> {
    for (n, &step) in steps.iter().enumerate() {
        write!(
            out,
            "[{}/{}] Hover over the {step} and press Enter: ",
            n + 1,
            steps.len()
        )?;
        out.flush()?;

        let mut line = String::new();
        if prompts.read_line(&mut line)? == 0 {
            bail!("calibration aborted at step {} ({step})", n + 1);
        }
        let point = input
            .cursor_position()
            .with_context(|| format!("could not read the cursor for the {step}"))?;
        apply(step, point, config);
        writeln!(out, "  -> {point}")?;
        info!("calibrated {step} at {point}");
    }
    Ok(steps.len())
}
