use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::color::Color;

/// Immutable pixel grid to reproduce, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelImage {
    width: usize,
    height: usize,
    pixels: Vec<Color>,
}

/// On-disk JSON layout: `pixels[row][col]` hex strings.
#[derive(Debug, Deserialize)]
struct JsonImage {
    width: usize,
    height: usize,
    pixels: Vec<Vec<String>>,
}

impl PixelImage {
    /// Build from rows of colors; every row must have the same length.
    pub fn from_rows(rows: Vec<Vec<Color>>) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if width == 0 || height == 0 {
            bail!("image must have at least one pixel");
        }
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            bail!("row {row} has {} pixels, expected {width}", r.len());
        }
        Ok(Self {
            width,
            height,
            pixels: rows.into_iter().flatten().collect(),
        })
    }

    /// Build from rows of hex strings.
    pub fn from_hex_rows<S: AsRef<str>>(rows: &[Vec<S>]) -> Result<Self> {
        let rows = rows
            .iter()
            .enumerate()
            .map(|(row, cells)| {
                cells
                    .iter()
                    .enumerate()
                    .map(|(col, hex)| {
                        Color::from_hex(hex.as_ref())
                            .with_context(|| format!("pixel ({row}, {col})"))
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_rows(rows)
    }

    /// Parse the `{width, height, pixels}` JSON format.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let raw: JsonImage = serde_json::from_str(text).context("malformed image JSON")?;
        let image = Self::from_hex_rows(&raw.pixels)?;
        if image.width != raw.width || image.height != raw.height {
            bail!(
                "declared size {}x{} does not match pixel grid {}x{}",
                raw.width,
                raw.height,
                image.width,
                image.height
            );
        }
        Ok(image)
    }

    /// Load a `.json` pixel file or any raster format the `image` crate reads.
    ///
    /// Fully transparent raster pixels become `transparent`.
    pub fn load(path: &Path, transparent: Color) -> Result<Self> {
        if !path.exists() {
            bail!("file not found: {}", path.display());
        }
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            return Self::from_json_str(&text)
                .with_context(|| format!("invalid pixel file: {}", path.display()));
        }

        let img = image::open(path).with_context(|| {
            format!(
                "unsupported or corrupt image: {}. Supported formats: JSON, PNG, JPEG, WebP, BMP, TIFF, GIF",
                path.display()
            )
        })?;
        let rgba = img.to_rgba8();
        let rows: Vec<Vec<Color>> = rgba
            .rows()
            .map(|row| {
                row.map(|p| {
                    if p[3] == 0 {
                        transparent
                    } else {
                        Color::new(p[0], p[1], p[2])
                    }
                })
                .collect::<Vec<_>>()
            })
            .collect();
        Self::from_rows(rows)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Color at `(row, col)`. Panics when out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Color {
        assert!(row < self.height && col < self.width, "pixel ({row}, {col}) out of bounds");
        self.pixels[row * self.width + col]
    }

    /// Number of distinct colors.
    pub fn distinct_colors(&self) -> usize {
        self.pixels.iter().collect::<HashSet<_>>().len()
    }
}
