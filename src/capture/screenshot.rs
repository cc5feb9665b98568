//! Full-screen capture using GDI.
//!
//! Copies the primary display into a memory bitmap with `BitBlt`, reads the
//! pixels back with `GetDIBits` and converts BGRA to RGBA.
//!
//! Call [`enable_dpi_awareness`] before anything else touches the screen:
//! otherwise a scaled display reports and captures logical pixels, and
//! regions given in physical pixels no longer line up.

use std::ffi::c_void;

use image::{ImageBuffer, Rgba, RgbaImage};

use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Gdi::{
    BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject, GetDC, GetDIBits,
    ReleaseDC, SelectObject, BITMAPINFO, BITMAPINFOHEADER, BI_RGB, CAPTUREBLT, DIB_RGB_COLORS,
    HGDIOBJ, SRCCOPY,
};
use windows::Win32::UI::HiDpi::{
    SetProcessDpiAwarenessContext, DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2,
};
use windows::Win32::UI::WindowsAndMessaging::{GetSystemMetrics, SM_CXSCREEN, SM_CYSCREEN};

use crate::capture::capturer::ScreenSource;
use crate::error::CaptureError;

/// Makes screen metrics and captures use physical pixels.
///
/// Fails harmlessly when the awareness was already set (by a manifest or an
/// earlier call); the error is only logged.
pub fn enable_dpi_awareness() {
    if let Err(e) = unsafe { SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2) } {
        log::debug!("SetProcessDpiAwarenessContext failed: {}", e);
    }
}

/// The primary display, captured through GDI.
#[derive(Debug, Default)]
pub struct GdiScreen;

impl GdiScreen {
    pub fn new() -> Self {
        Self
    }
}

impl ScreenSource for GdiScreen {
    fn dimensions(&self) -> Result<(u32, u32), CaptureError> {
        let width = unsafe { GetSystemMetrics(SM_CXSCREEN) };
        let height = unsafe { GetSystemMetrics(SM_CYSCREEN) };
        if width <= 0 || height <= 0 {
            return Err(CaptureError::Acquisition(format!(
                "GetSystemMetrics reported a {}x{} screen",
                width, height
            )));
        }
        Ok((width as u32, height as u32))
    }

    fn grab(&mut self) -> Result<RgbaImage, CaptureError> {
        let (width, height) = self.dimensions()?;
        let bgra = unsafe { copy_screen_bgra(width as i32, height as i32)? };

        let mut img: RgbaImage = ImageBuffer::new(width, height);
        for (pixel, src) in img.pixels_mut().zip(bgra.chunks_exact(4)) {
            // BGRA -> RGBA
            *pixel = Rgba([src[2], src[1], src[0], 255]);
        }
        Ok(img)
    }
}

/// Copies the screen into a top-down 32-bit BGRA buffer.
unsafe fn copy_screen_bgra(width: i32, height: i32) -> Result<Vec<u8>, CaptureError> {
    unsafe {
        let screen_dc = GetDC(HWND::default());
        if screen_dc.is_invalid() {
            return Err(CaptureError::Acquisition("GetDC failed".to_string()));
        }

        let mem_dc = CreateCompatibleDC(screen_dc);
        let bitmap = CreateCompatibleBitmap(screen_dc, width, height);
        if mem_dc.is_invalid() || bitmap.is_invalid() {
            let _ = DeleteObject(HGDIOBJ(bitmap.0));
            let _ = DeleteDC(mem_dc);
            let _ = ReleaseDC(HWND::default(), screen_dc);
            return Err(CaptureError::Acquisition(
                "failed to create compatible bitmap".to_string(),
            ));
        }
        let previous = SelectObject(mem_dc, HGDIOBJ(bitmap.0));

        let blit = BitBlt(
            mem_dc,
            0,
            0,
            width,
            height,
            screen_dc,
            0,
            0,
            SRCCOPY | CAPTUREBLT,
        );

        let mut info = BITMAPINFO {
            bmiHeader: BITMAPINFOHEADER {
                biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: width,
                // Negative height requests top-down rows
                biHeight: -height,
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut buffer = vec![0u8; width as usize * height as usize * 4];
        let lines = if blit.is_ok() {
            GetDIBits(
                mem_dc,
                bitmap,
                0,
                height as u32,
                Some(buffer.as_mut_ptr() as *mut c_void),
                &mut info,
                DIB_RGB_COLORS,
            )
        } else {
            0
        };

        let _ = SelectObject(mem_dc, previous);
        let _ = DeleteObject(HGDIOBJ(bitmap.0));
        let _ = DeleteDC(mem_dc);
        let _ = ReleaseDC(HWND::default(), screen_dc);

        if let Err(e) = blit {
            return Err(CaptureError::Acquisition(format!("BitBlt failed: {}", e)));
        }
        if lines != height {
            return Err(CaptureError::Acquisition(format!(
                "GetDIBits copied {} of {} rows",
                lines, height
            )));
        }
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use windows::Win32::Graphics::Gdi::{GetDeviceCaps, DESKTOPHORZRES, DESKTOPVERTRES};

    #[test]
    fn test_dimensions_are_physical_pixels() {
        enable_dpi_awareness();
        // A second call is rejected by Windows and must stay harmless
        enable_dpi_awareness();

        let (physical_w, physical_h) = unsafe {
            let dc = GetDC(HWND::default());
            let size = (GetDeviceCaps(dc, DESKTOPHORZRES), GetDeviceCaps(dc, DESKTOPVERTRES));
            let _ = ReleaseDC(HWND::default(), dc);
            size
        };

        let mut screen = GdiScreen::new();
        let dims = screen.dimensions().unwrap();
        assert_eq!(dims, (physical_w as u32, physical_h as u32));
        assert_eq!(screen.grab().unwrap().dimensions(), dims);
    }
}
