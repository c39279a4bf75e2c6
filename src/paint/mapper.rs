use crate::error::PaintError;
use crate::geometry::ScreenPoint;

/// Screen rectangle the image is projected onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasCalibration {
    pub top_left: ScreenPoint,
    pub bottom_right: ScreenPoint,
}

impl CanvasCalibration {
    /// Validate that the corners span a non-empty rectangle.
    pub fn new(top_left: ScreenPoint, bottom_right: ScreenPoint) -> Result<Self, PaintError> {
        if bottom_right.x <= top_left.x || bottom_right.y <= top_left.y {
            return Err(PaintError::InvalidCalibration(format!(
                "canvas corners {top_left} and {bottom_right} do not span a rectangle"
            )));
        }
        // `width` and `height` rely on this.
        if bottom_right.x.checked_sub(top_left.x).is_none()
            || bottom_right.y.checked_sub(top_left.y).is_none()
        {
            return Err(PaintError::InvalidCalibration(format!(
                "canvas corners {top_left} and {bottom_right} are too far apart"
            )));
        }
        Ok(Self {
            top_left,
            bottom_right,
        })
    }

    /// Build from optional persisted corners.
    pub fn from_corners(
        top_left: Option<ScreenPoint>,
        bottom_right: Option<ScreenPoint>,
    ) -> Result<Self, PaintError> {
        match (top_left, bottom_right) {
            (Some(tl), Some(br)) => Self::new(tl, br),
            _ => Err(PaintError::NotCalibrated("canvas corners (grid_start/grid_end)")),
        }
    }

    pub fn width(&self) -> i32 {
        self.bottom_right.x - self.top_left.x
    }

    pub fn height(&self) -> i32 {
        self.bottom_right.y - self.top_left.y
    }
}

/// Projects pixel indices onto the calibrated canvas.
///
/// The target point is the top-left corner of each cell, floored. This
/// matches the reference application; cell centers would be
/// `(col + 0.5) * pixel_width`.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateMapper {
    calibration: Option<CanvasCalibration>,
}

impl CoordinateMapper {
    pub fn new(calibration: CanvasCalibration) -> Self {
        Self {
            calibration: Some(calibration),
        }
    }

    /// A mapper that refuses to map until calibrated.
    pub fn uncalibrated() -> Self {
        Self { calibration: None }
    }

    pub fn calibration(&self) -> Option<&CanvasCalibration> {
        self.calibration.as_ref()
    }

    pub fn require_calibration(&self) -> Result<&CanvasCalibration, PaintError> {
        self.calibration
            .as_ref()
            .ok_or(PaintError::NotCalibrated("canvas corners (grid_start/grid_end)"))
    }

    /// Screen point for pixel `(row, col)` of an `image_width` x `image_height` image.
    pub fn map_pixel(
        &self,
        row: usize,
        col: usize,
        image_width: usize,
        image_height: usize,
    ) -> Result<ScreenPoint, PaintError> {
        let calib = self.require_calibration()?;
        if row >= image_height || col >= image_width {
            return Err(PaintError::PixelOutOfBounds {
                row,
                col,
                width: image_width,
                height: image_height,
            });
        }

        let pixel_width = f64::from(calib.width()) / image_width as f64;
        let pixel_height = f64::from(calib.height()) / image_height as f64;

        let x = (f64::from(calib.top_left.x) + col as f64 * pixel_width).floor();
        let y = (f64::from(calib.top_left.y) + row as f64 * pixel_height).floor();
        Ok(ScreenPoint::new(x as i32, y as i32))
    }
}
