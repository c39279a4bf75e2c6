use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Deserializer, Serialize};

use crate::backends::InputBackend;
use crate::catalog::{MatchMode, PaletteCatalog};
use crate::color::Color;
use crate::error::PaintError;
use crate::geometry::ScreenPoint;
use crate::paint::{
    CanvasCalibration, CoordinateMapper, EngineTiming, NavigatorTiming, PaintEngine,
    PaletteCalibration, PaletteNavigator,
};

pub const DEFAULT_CONFIG_FILE: &str = "painter_config.json";

/// Background swatch of the reference canvas.
pub const DEFAULT_BACKGROUND: Color = Color::new(0xF9, 0xF6, 0xE9);

/// Delays and cadences, in milliseconds where applicable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    pub page_settle_ms: u64,
    pub slot_settle_ms: u64,
    pub pause_poll_ms: u64,
    /// Gap between reference-point clicks.
    pub reference_gap_ms: u64,
    /// Report progress every N pixels; `null` reports about ten times per color.
    pub progress_interval: Option<usize>,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            page_settle_ms: 500,
            slot_settle_ms: 20,
            pause_poll_ms: 10,
            reference_gap_ms: 300,
            progress_interval: None,
        }
    }
}

impl Timing {
    pub fn navigator(&self) -> NavigatorTiming {
        NavigatorTiming {
            page_settle: Duration::from_millis(self.page_settle_ms),
            slot_settle: Duration::from_millis(self.slot_settle_ms),
        }
    }

    pub fn engine(&self) -> EngineTiming {
        EngineTiming {
            pause_poll: Duration::from_millis(self.pause_poll_ms),
            progress_interval: self.progress_interval,
        }
    }

    pub fn reference_gap(&self) -> Duration {
        Duration::from_millis(self.reference_gap_ms)
    }
}

/// Persisted calibration and settings.
///
/// Every calibration point may be absent; the gap only surfaces as
/// [`PaintError::NotCalibrated`] when something needs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(alias = "gridStart")]
    pub grid_start: Option<ScreenPoint>,
    #[serde(alias = "gridEnd")]
    pub grid_end: Option<ScreenPoint>,
    #[serde(alias = "colorLeftBtn")]
    pub color_left_btn: Option<ScreenPoint>,
    #[serde(alias = "colorRightBtn")]
    pub color_right_btn: Option<ScreenPoint>,
    #[serde(alias = "colorPositions", deserialize_with = "nullable_vec")]
    pub color_positions: Vec<ScreenPoint>,
    /// Linear display scale; stored points are divided by it.
    pub scale: f64,
    pub background_colors: Vec<Color>,
    pub match_mode: MatchMode,
    pub timing: Timing,
    /// `env_logger` filter, e.g. "debug" or "pixel_painter=trace".
    pub log_filter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grid_start: None,
            grid_end: None,
            color_left_btn: None,
            color_right_btn: None,
            color_positions: Vec::new(),
            scale: 1.0,
            background_colors: vec![DEFAULT_BACKGROUND],
            match_mode: MatchMode::Rgb,
            timing: Timing::default(),
            log_filter: None,
        }
    }
}

fn nullable_vec<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("invalid config file: {}", path.display()))
    }

    /// Load `path`, or start from defaults when it does not exist yet.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)
            .with_context(|| format!("failed to write config {}", path.display()))?;
        info!("saved calibration to {}", path.display());
        Ok(())
    }

    fn checked_scale(&self) -> Result<f64, PaintError> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(PaintError::InvalidCalibration(format!(
                "scale must be positive, got {}",
                self.scale
            )));
        }
        Ok(self.scale)
    }

    fn scaled(&self, point: Option<ScreenPoint>, scale: f64) -> Option<ScreenPoint> {
        point.map(|p| p.unscaled(scale))
    }

    pub fn canvas(&self) -> Result<CanvasCalibration, PaintError> {
        let scale = self.checked_scale()?;
        CanvasCalibration::from_corners(
            self.scaled(self.grid_start, scale),
            self.scaled(self.grid_end, scale),
        )
    }

    pub fn palette(&self) -> Result<PaletteCalibration, PaintError> {
        let scale = self.checked_scale()?;
        PaletteCalibration::from_parts(
            self.scaled(self.color_left_btn, scale),
            self.scaled(self.color_right_btn, scale),
            self.color_positions
                .iter()
                .map(|p| p.unscaled(scale))
                .collect(),
        )
    }

    /// Mapper for the stored canvas; uncalibrated when corners are missing.
    pub fn mapper(&self) -> Result<CoordinateMapper, PaintError> {
        match self.canvas() {
            Ok(canvas) => Ok(CoordinateMapper::new(canvas)),
            Err(PaintError::NotCalibrated(_)) => Ok(CoordinateMapper::uncalibrated()),
            Err(err) => Err(err),
        }
    }

    /// Navigator for the stored palette; `None` when points are missing.
    pub fn navigator(&self, catalog: PaletteCatalog) -> Result<Option<PaletteNavigator>, PaintError> {
        match self.palette() {
            Ok(palette) => Ok(Some(PaletteNavigator::new(
                catalog.with_match_mode(self.match_mode),
                palette,
                self.timing.navigator(),
            ))),
            Err(PaintError::NotCalibrated(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Assemble an engine from this configuration.
    pub fn engine<B: InputBackend>(
        &self,
        input: B,
        catalog: PaletteCatalog,
    ) -> Result<PaintEngine<B>, PaintError> {
        Ok(PaintEngine::new(input, self.mapper()?, self.navigator(catalog)?)
            .with_timing(self.timing.engine()))
    }
}
