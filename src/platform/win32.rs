use raw_window_handle::{HasWindowHandle, RawWindowHandle};
use windows::Win32::Foundation::{HWND, POINT, RECT};
use windows::Win32::Graphics::Dwm::{DwmSetWindowAttribute, DWMWINDOWATTRIBUTE};
use windows::Win32::UI::WindowsAndMessaging::{
    GetCursorPos, GetForegroundWindow, GetWindowLongPtrW, GetWindowRect, SetWindowLongPtrW,
    SetWindowPos, GWL_EXSTYLE, SWP_FRAMECHANGED, SWP_NOACTIVATE, SWP_NOMOVE, SWP_NOSIZE,
    SWP_NOZORDER, WS_EX_TRANSPARENT,
};

use super::{Desktop, PlatformError, ScreenRect, WindowHandle};

/// Extract the Win32 HWND from a winit window.
pub fn get_hwnd(window: &winit::window::Window) -> Result<HWND, PlatformError> {
    let handle = window
        .window_handle()
        .map_err(|e| PlatformError::NoWindowHandle(e.to_string()))?;
    match handle.as_raw() {
        RawWindowHandle::Win32(h) => Ok(HWND(h.hwnd.get() as *mut core::ffi::c_void)),
        other => Err(PlatformError::NoWindowHandle(format!(
            "expected Win32 window handle, got {other:?}"
        ))),
    }
}

fn to_hwnd(handle: WindowHandle) -> HWND {
    HWND(handle.raw() as *mut core::ffi::c_void)
}

fn to_handle(hwnd: HWND) -> WindowHandle {
    WindowHandle::from_raw(hwnd.0 as usize)
}

/// Make the overlay click-through so input reaches the windows beneath it.
pub unsafe fn make_click_through(hwnd: HWND) {
    let style = GetWindowLongPtrW(hwnd, GWL_EXSTYLE);
    log::info!("Window ex-style before: 0x{:08X}", style);

    // WS_EX_LAYERED would give DWM a GDI redirection surface that fights the
    // DirectComposition visual wgpu presents through, so only TRANSPARENT is
    // kept. Per-pixel alpha comes from the swapchain.
    const WS_EX_LAYERED: isize = 0x00080000;
    const WS_EX_NOREDIRECTIONBITMAP: isize = 0x00200000;

    let new_style =
        (style & !WS_EX_LAYERED) | WS_EX_TRANSPARENT.0 as isize | WS_EX_NOREDIRECTIONBITMAP;
    SetWindowLongPtrW(hwnd, GWL_EXSTYLE, new_style);

    log::info!("Window ex-style after:  0x{:08X}", new_style);

    // DWM caches frame info until told the styles changed.
    let _ = SetWindowPos(
        hwnd,
        HWND::default(),
        0,
        0,
        0,
        0,
        SWP_FRAMECHANGED | SWP_NOMOVE | SWP_NOSIZE | SWP_NOZORDER | SWP_NOACTIVATE,
    );

    // DWMWA_NCRENDERING_POLICY(2) = DWMNCRP_DISABLED(2): no 1px border.
    let policy = 2u32;
    let _ = DwmSetWindowAttribute(
        hwnd,
        DWMWINDOWATTRIBUTE(2),
        &policy as *const u32 as *const core::ffi::c_void,
        4,
    );

    // DWMWA_SYSTEMBACKDROP_TYPE(38) = DWMSBT_NONE(1)
    let backdrop = 1u32;
    let _ = DwmSetWindowAttribute(
        hwnd,
        DWMWINDOWATTRIBUTE(38),
        &backdrop as *const u32 as *const core::ffi::c_void,
        4,
    );
}

/// Set up the window as a transparent, click-through overlay.
pub fn setup_overlay(window: &winit::window::Window) -> Result<HWND, PlatformError> {
    if let Err(e) = window.set_cursor_hittest(false) {
        log::warn!("Cursor hittest not supported: {e}");
    }

    let hwnd = get_hwnd(window)?;
    unsafe {
        make_click_through(hwnd);
    }

    log::info!("Win32 overlay setup complete (click-through + DirectComposition)");
    Ok(hwnd)
}

/// Live Win32 desktop. The overlay's own window never counts as foreground.
pub struct Win32Desktop {
    own: WindowHandle,
}

impl Win32Desktop {
    pub fn new(own_hwnd: HWND) -> Self {
        Self {
            own: to_handle(own_hwnd),
        }
    }
}

impl Desktop for Win32Desktop {
    fn foreground_window(&self) -> WindowHandle {
        let handle = to_handle(unsafe { GetForegroundWindow() });
        if handle == self.own {
            WindowHandle::NONE
        } else {
            handle
        }
    }

    fn window_rect(&self, handle: WindowHandle) -> Result<ScreenRect, PlatformError> {
        let mut rect = RECT::default();
        unsafe { GetWindowRect(to_hwnd(handle), &mut rect) }.map_err(|e| {
            PlatformError::WindowRect {
                handle,
                message: e.to_string(),
            }
        })?;
        Ok(ScreenRect {
            left: rect.left,
            top: rect.top,
            right: rect.right,
            bottom: rect.bottom,
        })
    }

    fn cursor_position(&self) -> Option<(i32, i32)> {
        let mut point = POINT::default();
        unsafe { GetCursorPos(&mut point) }.ok()?;
        Some((point.x, point.y))
    }
}
