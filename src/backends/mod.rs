pub mod dry_run;
#[cfg(windows)]
pub mod win32;

use std::time::Duration;

use crate::error::InputError;
use crate::geometry::{ScreenPoint, ScreenRect};

pub use dry_run::DryRunBackend;

/// Synthetic mouse input into the target application.
///
/// Input is strictly sequential: a backend is driven by one thread at a time.
pub trait InputBackend: Send {
    /// Display name for this backend (e.g. "Win32").
    fn name(&self) -> &str;

    /// Bring the target window to the foreground. Idempotent.
    fn focus(&mut self) -> Result<(), InputError> {
        Ok(())
    }

    /// Single left click at an absolute screen point.
    fn click(&mut self, point: ScreenPoint) -> Result<(), InputError>;

    /// Double left click at an absolute screen point.
    fn double_click(&mut self, point: ScreenPoint) -> Result<(), InputError> {
        self.click(point)?;
        std::thread::sleep(Duration::from_millis(50));
        self.click(point)
    }

    /// Screen rectangle of the target window, if one is attached.
    fn window_rect(&self) -> Option<ScreenRect> {
        None
    }

    /// Current cursor position, used while capturing calibration points.
    fn cursor_position(&self) -> Result<ScreenPoint, InputError> {
        Err(InputError::Unsupported(format!(
            "{} cannot read the cursor position",
            self.name()
        )))
    }
}

impl<T: InputBackend + ?Sized> InputBackend for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn focus(&mut self) -> Result<(), InputError> {
        (**self).focus()
    }

    fn click(&mut self, point: ScreenPoint) -> Result<(), InputError> {
        (**self).click(point)
    }

    fn double_click(&mut self, point: ScreenPoint) -> Result<(), InputError> {
        (**self).double_click(point)
    }

    fn window_rect(&self) -> Option<ScreenRect> {
        (**self).window_rect()
    }

    fn cursor_position(&self) -> Result<ScreenPoint, InputError> {
        (**self).cursor_position()
    }
}

/// Pick the backend for this platform.
///
/// `window` optionally names the target window by title.
pub fn select_backend(
    dry_run: bool,
    window: Option<&str>,
) -> anyhow::Result<Box<dyn InputBackend>> {
    if dry_run {
        return Ok(Box::new(DryRunBackend::new()));
    }
    native_backend(window)
}

#[cfg(windows)]
fn native_backend(window: Option<&str>) -> anyhow::Result<Box<dyn InputBackend>> {
    let backend = match window {
        Some(title) => win32::Win32Backend::attach(title)?,
        None => win32::Win32Backend::foreground(),
    };
    Ok(Box::new(backend))
}

#[cfg(not(windows))]
fn native_backend(_window: Option<&str>) -> anyhow::Result<Box<dyn InputBackend>> {
    anyhow::bail!("live input injection is only available on Windows; pass --dry-run")
}
