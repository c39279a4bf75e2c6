use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::PaintError;

/// Where a color lives in the paged palette widget.
///
/// `category` is the 1-based palette page, `index` the 0-based slot on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PalettePosition {
    pub category: u32,
    pub index: usize,
}

/// Distance used when a color has no exact catalog entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Euclidean distance over sRGB components.
    #[default]
    Rgb,
    /// CIE76 ΔE in CIELAB.
    Lab,
}

/// Result of resolving a color against the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub position: PalettePosition,
    /// The catalog color actually selected.
    pub color: Color,
    pub exact: bool,
}

/// Fixed mapping from palette page to its ordered swatches.
///
/// Iteration order is canonical: pages ascending, slots ascending. Nearest
/// color ties are broken by that order (first minimum wins), and an exact
/// color listed twice resolves to its first occurrence.
#[derive(Debug, Clone)]
pub struct PaletteCatalog {
    categories: Vec<Vec<Color>>,
    mode: MatchMode,
}

const REFERENCE_PALETTE: [&[&str]; 13] = [
    &["#051616", "#414545", "#808282", "#BEBFBF", "#FEFFFF", "#F9F6E9"],
    &[
        "#CF354D", "#EE6F72", "#A6263D", "#F5ACA6", "#C98483", "#A35D5E", "#69313B", "#E7D5D5",
        "#C0ACAB", "#755E5E",
    ],
    &[
        "#E95E2B", "#F98358", "#AB4226", "#FEBA9F", "#D9937C", "#AF6C58", "#753B31", "#E9D5D0",
        "#C1ACA6", "#755E59",
    ],
    &[
        "#F49E16", "#FEAE3B", "#B16F16", "#FECE92", "#DAA76D", "#B3814B", "#795126", "#F5E4CE",
        "#CDBCA9", "#806F5E",
    ],
    &[
        "#EDCA16", "#F9D838", "#B39416", "#FAE791", "#D3BE6F", "#AB954B", "#756326", "#EEE7C7",
        "#C6BFA2", "#787259",
    ],
    &[
        "#A8BC16", "#B6C931", "#758616", "#D8DF93", "#ADB76D", "#85914B", "#535E2B", "#E6E9C7",
        "#BCC2A3", "#6E745D",
    ],
    &[
        "#05A25D", "#41B97B", "#057447", "#9CDAAD", "#76B28B", "#4F8969", "#245640", "#C3E0CC",
        "#9DB7A6", "#53695D",
    ],
    &[
        "#058781", "#05ABA0", "#056966", "#7ECDC2", "#55A49C", "#2B7E78", "#054B4B", "#BEE0DA",
        "#98B7B2", "#4E6B66",
    ],
    &[
        "#05729C", "#0599BA", "#055878", "#79BBCA", "#5193A5", "#246D7F", "#05495B", "#C6DDE2",
        "#9EB5BA", "#4F676F",
    ],
    &[
        "#055EA6", "#2B83C1", "#054782", "#83A8C9", "#5D80A1", "#365B7F", "#193B56", "#C1CDD5",
        "#9BA6B0", "#4C5967",
    ],
    &[
        "#534DA1", "#7577BD", "#3E387E", "#A2A0C7", "#787AA1", "#55567E", "#333555", "#C9CAD5",
        "#A2A3B0", "#565869",
    ],
    &[
        "#813D8B", "#A167A9", "#602B6C", "#B89BB9", "#907395", "#6C4D73", "#432E4B", "#CFC9D1",
        "#ABA1AC", "#605665",
    ],
    &[
        "#AD356F", "#CF6B8F", "#862658", "#D9A1B4", "#B47A8C", "#8B5367", "#60354B", "#E4D5DA",
        "#BCADB1", "#725E66",
    ],
];

impl PaletteCatalog {
    /// Build a catalog from pages in order; page `i` of the vector is category `i + 1`.
    pub fn new(categories: Vec<Vec<Color>>) -> Result<Self, PaintError> {
        if categories.iter().all(Vec::is_empty) {
            return Err(PaintError::EmptyCatalog);
        }
        Ok(Self {
            categories,
            mode: MatchMode::Rgb,
        })
    }

    /// The 13-page palette of the reference application.
    pub fn reference() -> Self {
        let categories = REFERENCE_PALETTE
            .iter()
            .map(|page| {
                page.iter()
                    .filter_map(|hex| Color::from_hex(hex).ok())
                    .collect()
            })
            .collect();
        Self {
            categories,
            mode: MatchMode::Rgb,
        }
    }

    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn match_mode(&self) -> MatchMode {
        self.mode
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    /// Number of swatches on a 1-based page; 0 for unknown pages.
    pub fn category_len(&self, category: u32) -> usize {
        (category as usize)
            .checked_sub(1)
            .and_then(|i| self.categories.get(i))
            .map_or(0, Vec::len)
    }

    /// Largest page size; the number of slot positions worth calibrating.
    pub fn max_category_len(&self) -> usize {
        self.categories.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// All entries in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (PalettePosition, Color)> + '_ {
        self.categories
            .iter()
            .enumerate()
            .flat_map(|(page, colors)| {
                colors.iter().enumerate().map(move |(index, &color)| {
                    (
                        PalettePosition {
                            category: page as u32 + 1,
                            index,
                        },
                        color,
                    )
                })
            })
    }

    /// Exact catalog entry for `color`, if any.
    pub fn exact(&self, color: Color) -> Option<PalettePosition> {
        self.iter()
            .find(|&(_, candidate)| candidate == color)
            .map(|(position, _)| position)
    }

    /// Closest catalog entry under the catalog's match mode.
    pub fn nearest(&self, color: Color) -> Resolved {
        match self.mode {
            MatchMode::Rgb => self.nearest_by(|c| f64::from(c.distance_sq_rgb(color))),
            MatchMode::Lab => self.nearest_by(|c| f64::from(c.distance_lab(color))),
        }
    }

    fn nearest_by(&self, distance: impl Fn(Color) -> f64) -> Resolved {
        let mut best: Option<(f64, PalettePosition, Color)> = None;
        for (position, candidate) in self.iter() {
            let d = distance(candidate);
            // Strict comparison keeps the first minimum.
            if best.map_or(true, |(min, _, _)| d < min) {
                best = Some((d, position, candidate));
            }
        }
        // Construction guarantees at least one entry.
        let (_, position, color) = best.unwrap_or((
            0.0,
            PalettePosition {
                category: 1,
                index: 0,
            },
            Color::new(0, 0, 0),
        ));
        Resolved {
            position,
            color,
            exact: false,
        }
    }

    /// Exact match, else nearest color.
    pub fn resolve(&self, color: Color) -> Resolved {
        match self.exact(color) {
            Some(position) => Resolved {
                position,
                color,
                exact: true,
            },
            None => self.nearest(color),
        }
    }

    /// Palette position for `color`. Never fails.
    pub fn lookup(&self, color: Color) -> PalettePosition {
        self.resolve(color).position
    }
}

impl Default for PaletteCatalog {
    fn default() -> Self {
        Self::reference()
    }
}
