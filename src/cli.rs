use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use crate::calibrate::CalibrationScope;
use crate::color::Color;
use crate::config::DEFAULT_CONFIG_FILE;
use crate::paint::Region;

/// Reproduce pixel art by clicking it into a drawing application.
#[derive(Parser, Debug)]
#[command(name = "pixel-painter", version, about)]
pub struct Args {
    /// Calibration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Paint an image onto the calibrated canvas
    Paint(PaintArgs),

    /// Print the color groups an image would be painted in
    Plan(PlanArgs),

    /// Click the center and corner cells to check the canvas calibration
    TestPoints {
        /// Image whose dimensions define the grid
        image: PathBuf,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// Look up a list of colors in the palette, optionally selecting each
    Colors {
        /// JSON array or comma separated list; a bracketed list that is not
        /// valid JSON is scanned for #RRGGBB codes
        list: String,

        /// Select each color in the palette widget in turn
        #[arg(long)]
        apply: bool,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// Capture calibration points from the cursor position
    Calibrate {
        /// Number of palette slots per page to capture
        #[arg(long, default_value_t = 10)]
        slots: usize,

        /// Only recapture part of the calibration
        #[arg(long, value_enum, default_value_t = CalibrationScope::All)]
        only: CalibrationScope,

        /// Window to read the cursor against (defaults to the foreground one)
        #[arg(long)]
        window: Option<String>,
    },

    /// Print the palette catalog
    Palette,
}

/// Where synthetic input goes.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Log clicks instead of sending them
    #[arg(long)]
    pub dry_run: bool,

    /// Title of the drawing application's window
    #[arg(long)]
    pub window: Option<String>,
}

/// Image selection shared by `paint` and `plan`.
#[derive(ClapArgs, Debug, Clone)]
pub struct ImageArgs {
    /// Pixel file (.json) or raster image
    pub image: PathBuf,

    /// Only paint a square sub-grid: ROW,COL,SIZE
    #[arg(long)]
    pub region: Option<Region>,

    /// Colors already on the canvas (repeatable; overrides the config)
    #[arg(long = "background", value_name = "HEX")]
    pub background: Vec<Color>,
}

#[derive(ClapArgs, Debug)]
pub struct PaintArgs {
    #[command(flatten)]
    pub image: ImageArgs,

    /// 1-based color group to start from, to resume an earlier run
    #[arg(long, default_value_t = 1)]
    pub start_color: usize,

    #[command(flatten)]
    pub target: TargetArgs,

    /// Print progress as log lines instead of the terminal monitor
    #[arg(long)]
    pub no_tui: bool,

    /// Seconds to wait before the first click
    #[arg(long, default_value_t = 3)]
    pub countdown: u64,
}

#[derive(ClapArgs, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub image: ImageArgs,
}
