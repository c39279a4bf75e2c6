use std::thread;
use std::time::Duration;

use log::info;

use crate::backends::InputBackend;
use crate::error::PaintError;
use crate::geometry::ScreenPoint;

use super::mapper::CoordinateMapper;

/// A labelled cell used to check canvas calibration by eye.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferencePoint {
    pub label: &'static str,
    pub row: usize,
    pub col: usize,
}

/// Center and the four corner cells of a `width` x `height` image.
pub fn reference_points(width: usize, height: usize) -> [ReferencePoint; 5] {
    let last_row = height.saturating_sub(1);
    let last_col = width.saturating_sub(1);
    [
        ReferencePoint {
            label: "center",
            row: height / 2,
            col: width / 2,
        },
        ReferencePoint {
            label: "top-left",
            row: 0,
            col: 0,
        },
        ReferencePoint {
            label: "top-right",
            row: 0,
            col: last_col,
        },
        ReferencePoint {
            label: "bottom-left",
            row: last_row,
            col: 0,
        },
        ReferencePoint {
            label: "bottom-right",
            row: last_row,
            col: last_col,
        },
    ]
}

/// Click each reference cell once, `gap` apart. Returns the points clicked.
pub fn click_reference_points(
    input: &mut dyn InputBackend,
    mapper: &CoordinateMapper,
    width: usize,
    height: usize,
    gap: Duration,
) -> Result<Vec<(ReferencePoint, ScreenPoint)>, PaintError> {
    // Map everything first so a calibration error clicks nothing.
    let targets = reference_points(width, height)
        .into_iter()
        .map(|p| -> Result<_, PaintError> {
            Ok((p, mapper.map_pixel(p.row, p.col, width, height)?))
        })
        .collect::<Result<Vec<_>, _>>()?;

    for (reference, point) in &targets {
        info!(
            "{}: pixel ({}, {}) -> screen {point}",
            reference.label, reference.row, reference.col
        );
        input.click(*point)?;
        thread::sleep(gap);
    }
    Ok(targets)
}
