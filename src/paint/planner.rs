use std::collections::HashMap;

use log::{debug, warn};

use crate::color::Color;
use crate::error::PaintError;
use crate::pixmap::PixelImage;

/// A square sub-grid of the image selected for painting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub start_row: usize,
    pub start_col: usize,
    pub size: usize,
}

impl Region {
    pub fn new(start_row: usize, start_col: usize, size: usize) -> Self {
        Self {
            start_row,
            start_col,
            size,
        }
    }

    /// Clip to an image of `width` x `height`.
    ///
    /// A region hanging over the edge is trimmed; one with no area left is
    /// an [`PaintError::InvalidRegion`].
    pub fn clip(&self, width: usize, height: usize) -> Result<Bounds, PaintError> {
        if self.size == 0 {
            return Err(PaintError::InvalidRegion("region size must be positive".into()));
        }
        let end_row = self.start_row.saturating_add(self.size).min(height);
        let end_col = self.start_col.saturating_add(self.size).min(width);
        if self.start_row >= end_row || self.start_col >= end_col {
            return Err(PaintError::InvalidRegion(format!(
                "region at [{}, {}] lies outside the {width}x{height} image",
                self.start_row, self.start_col
            )));
        }
        Ok(Bounds {
            row: self.start_row,
            col: self.start_col,
            height: end_row - self.start_row,
            width: end_col - self.start_col,
        })
    }
}

impl std::str::FromStr for Region {
    type Err = anyhow::Error;

    /// Parse `ROW,COL,SIZE`.
    fn from_str(s: &str) -> anyhow::Result<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let [row, col, size] = parts.as_slice() else {
            anyhow::bail!("region must be ROW,COL,SIZE, got '{s}'");
        };
        Ok(Self::new(row.parse()?, col.parse()?, size.parse()?))
    }
}

/// Effective rectangle of a clipped region, in source image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub row: usize,
    pub col: usize,
    pub width: usize,
    pub height: usize,
}

impl Bounds {
    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

/// All pixels of one color, in row-major scan order.
///
/// Pixel coordinates are relative to the planned area (the region, if one
/// was given); add [`Plan::offset`] for source image coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorGroup {
    pub color: Color,
    pub pixels: Vec<(usize, usize)>,
}

impl ColorGroup {
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

/// Ordered color groups plus the geometry needed to place them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub groups: Vec<ColorGroup>,
    /// `(row, col)` of the planned area inside the source image.
    pub offset: (usize, usize),
    pub image_width: usize,
    pub image_height: usize,
}

impl Plan {
    fn empty(image: &PixelImage) -> Self {
        Self {
            groups: Vec::new(),
            offset: (0, 0),
            image_width: image.width(),
            image_height: image.height(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Pixels across all groups; background colors are already excluded.
    pub fn total_pixels(&self) -> usize {
        self.groups.iter().map(ColorGroup::len).sum()
    }

    /// Source image coordinates of a group pixel.
    pub fn absolute(&self, (row, col): (usize, usize)) -> (usize, usize) {
        (row + self.offset.0, col + self.offset.1)
    }
}

/// Group an image's pixels by color for sequential painting.
///
/// Groups appear in order of each color's first occurrence in a row-major
/// scan, and each group keeps scan order. Groups whose color is in
/// `background` are dropped. An invalid region yields an empty plan.
pub fn build_plan(image: &PixelImage, region: Option<Region>, background: &[Color]) -> Plan {
    let bounds = match region {
        Some(region) => match region.clip(image.width(), image.height()) {
            Ok(bounds) => bounds,
            Err(err) => {
                warn!("{err}; nothing to plan");
                return Plan::empty(image);
            }
        },
        None => Bounds {
            row: 0,
            col: 0,
            width: image.width(),
            height: image.height(),
        },
    };

    let mut index: HashMap<Color, usize> = HashMap::new();
    let mut groups: Vec<ColorGroup> = Vec::new();
    for row in 0..bounds.height {
        for col in 0..bounds.width {
            let color = image.get(bounds.row + row, bounds.col + col);
            let slot = *index.entry(color).or_insert_with(|| {
                groups.push(ColorGroup {
                    color,
                    pixels: Vec::new(),
                });
                groups.len() - 1
            });
            groups[slot].pixels.push((row, col));
        }
    }

    let before = groups.len();
    groups.retain(|group| !background.contains(&group.color));
    if groups.len() < before {
        debug!("dropped {} background color group(s)", before - groups.len());
    }

    Plan {
        groups,
        offset: (bounds.row, bounds.col),
        image_width: image.width(),
        image_height: image.height(),
    }
}
