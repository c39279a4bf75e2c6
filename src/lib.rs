//! Reproduce pixel art inside a drawing application by synthesizing mouse
//! clicks: select each color in a paged palette, then click every pixel of
//! that color onto a calibrated canvas.

pub mod backends;
pub mod calibrate;
pub mod catalog;
pub mod cli;
pub mod color;
pub mod config;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod paint;
pub mod pixmap;
pub mod tui;
