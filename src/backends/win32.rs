use std::ffi::c_void;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info};
use windows::core::{HSTRING, PCWSTR};
use windows::Win32::Foundation::{HWND, POINT, RECT};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_MOUSE, MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP,
    MOUSEINPUT, MOUSE_EVENT_FLAGS,
};
use windows::Win32::UI::WindowsAndMessaging::{
    FindWindowW, GetCursorPos, GetForegroundWindow, GetWindowRect, IsWindow, SetCursorPos,
    SetForegroundWindow, ShowWindow, SW_RESTORE,
};

use crate::error::InputError;
use crate::geometry::{ScreenPoint, ScreenRect};

use super::InputBackend;

const MOVE_SETTLE: Duration = Duration::from_millis(10);
const BUTTON_SETTLE: Duration = Duration::from_millis(20);
const DOUBLE_CLICK_GAP: Duration = Duration::from_millis(50);
const FOCUS_SETTLE: Duration = Duration::from_millis(50);

/// Win32 `SendInput` backend.
///
/// The window handle is kept as a raw integer so the backend can move to
/// the paint worker thread.
pub struct Win32Backend {
    hwnd: Option<isize>,
}

impl Win32Backend {
    /// Attach to the first top-level window whose title matches exactly.
    pub fn attach(title: &str) -> Result<Self> {
        let hwnd = unsafe { FindWindowW(PCWSTR::null(), &HSTRING::from(title)) }
            .with_context(|| format!("window not found: '{title}'"))?;
        info!("attached to window '{title}' ({:?})", hwnd.0);
        Ok(Self {
            hwnd: Some(hwnd.0 as isize),
        })
    }

    /// Inject into whatever window has focus; no focus management.
    pub fn foreground() -> Self {
        Self { hwnd: None }
    }

    fn handle(&self) -> Option<HWND> {
        self.hwnd.map(|raw| HWND(raw as *mut c_void))
    }

    fn ensure_window(&self) -> Result<(), InputError> {
        if let Some(hwnd) = self.handle() {
            if !unsafe { IsWindow(hwnd) }.as_bool() {
                return Err(InputError::WindowLost(format!("{:?} no longer exists", hwnd.0)));
            }
        }
        Ok(())
    }

    fn button(&self, flags: MOUSE_EVENT_FLAGS) -> Result<(), InputError> {
        let input = INPUT {
            r#type: INPUT_MOUSE,
            Anonymous: INPUT_0 {
                mi: MOUSEINPUT {
                    dx: 0,
                    dy: 0,
                    mouseData: 0,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        };
        let sent = unsafe { SendInput(&[input], std::mem::size_of::<INPUT>() as i32) };
        if sent != 1 {
            return Err(InputError::Injection(format!(
                "SendInput accepted {sent} of 1 events"
            )));
        }
        thread::sleep(BUTTON_SETTLE);
        Ok(())
    }

    fn move_to(&self, point: ScreenPoint) -> Result<(), InputError> {
        unsafe { SetCursorPos(point.x, point.y) }
            .map_err(|e| InputError::Injection(format!("SetCursorPos{point}: {e}")))?;
        thread::sleep(MOVE_SETTLE);
        Ok(())
    }

    fn press_release(&self) -> Result<(), InputError> {
        self.button(MOUSEEVENTF_LEFTDOWN)?;
        self.button(MOUSEEVENTF_LEFTUP)
    }
}

impl InputBackend for Win32Backend {
    fn name(&self) -> &str {
        "Win32"
    }

    fn focus(&mut self) -> Result<(), InputError> {
        self.ensure_window()?;
        let Some(hwnd) = self.handle() else {
            return Ok(());
        };
        if unsafe { GetForegroundWindow() } == hwnd {
            return Ok(());
        }
        debug!("restoring target window to the foreground");
        unsafe {
            let _ = ShowWindow(hwnd, SW_RESTORE);
            thread::sleep(FOCUS_SETTLE);
            let _ = SetForegroundWindow(hwnd);
        }
        thread::sleep(FOCUS_SETTLE);
        Ok(())
    }

    fn click(&mut self, point: ScreenPoint) -> Result<(), InputError> {
        self.focus()?;
        self.move_to(point)?;
        self.press_release()
    }

    fn double_click(&mut self, point: ScreenPoint) -> Result<(), InputError> {
        self.focus()?;
        self.move_to(point)?;
        self.press_release()?;
        thread::sleep(DOUBLE_CLICK_GAP);
        self.press_release()
    }

    fn window_rect(&self) -> Option<ScreenRect> {
        let hwnd = self.handle()?;
        let mut rect = RECT::default();
        unsafe { GetWindowRect(hwnd, &mut rect) }.ok()?;
        Some(ScreenRect {
            left: rect.left,
            top: rect.top,
            right: rect.right,
            bottom: rect.bottom,
        })
    }

    fn cursor_position(&self) -> Result<ScreenPoint, InputError> {
        let mut point = POINT::default();
        unsafe { GetCursorPos(&mut point) }
            .map_err(|e| InputError::Injection(format!("GetCursorPos: {e}")))?;
        Ok(ScreenPoint::new(point.x, point.y))
    }
}
