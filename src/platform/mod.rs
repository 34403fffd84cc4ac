#[cfg(windows)]
pub mod win32;

use thiserror::Error;

/// Opaque identity of a desktop window. Only compared for equality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WindowHandle(usize);

impl WindowHandle {
    /// No window (nothing focused, or a window we ignore).
    pub const NONE: WindowHandle = WindowHandle(0);

    pub fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> usize {
        self.0
    }

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

/// Window rectangle in physical screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("native window handle unavailable: {0}")]
    #[cfg_attr(not(windows), allow(dead_code))]
    NoWindowHandle(String),
    #[error("window rectangle query failed for {handle:?}: {message}")]
    WindowRect {
        handle: WindowHandle,
        message: String,
    },
}

/// Desktop queries the pet controller needs from the OS.
pub trait Desktop {
    /// Currently focused top-level window, or `WindowHandle::NONE`.
    fn foreground_window(&self) -> WindowHandle;

    fn window_rect(&self, handle: WindowHandle) -> Result<ScreenRect, PlatformError>;

    /// Global cursor position in screen pixels, if the platform can report it.
    fn cursor_position(&self) -> Option<(i32, i32)>;
}

/// Desktop with no window manager access. The pet only wanders on its own.
#[derive(Debug, Default)]
pub struct NullDesktop;

impl Desktop for NullDesktop {
    fn foreground_window(&self) -> WindowHandle {
        WindowHandle::NONE
    }

    fn window_rect(&self, handle: WindowHandle) -> Result<ScreenRect, PlatformError> {
        Err(PlatformError::WindowRect {
            handle,
            message: "no desktop window access on this platform".into(),
        })
    }

    fn cursor_position(&self) -> Option<(i32, i32)> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_handle_is_default() {
        assert!(WindowHandle::default().is_none());
        assert!(!WindowHandle::from_raw(0x1234).is_none());
        assert_eq!(WindowHandle::from_raw(7), WindowHandle::from_raw(7));
    }

    #[test]
    fn null_desktop_reports_nothing() {
        let desktop = NullDesktop;
        assert!(desktop.foreground_window().is_none());
        assert!(desktop.cursor_position().is_none());
        assert!(desktop.window_rect(WindowHandle::from_raw(1)).is_err());
    }
}
