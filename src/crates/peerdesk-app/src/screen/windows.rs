//! Windows screen capture via GDI BitBlt.
//!
//! Copies the primary display (the monitor at origin `(0, 0)`, which is
//! what the screen DC covers) into a compatible bitmap, reads the pixels
//! out with `GetDIBits` as top-down 32-bit BGRA, and JPEG-encodes them at
//! the fixed quality.  The blit and the encode together are milliseconds
//! of blocking work per frame, so they run on the blocking pool.

#![cfg(target_os = "windows")]

use std::io::Cursor;

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use windows::Win32::Graphics::Gdi::{
    BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject, GetDC,
    GetDIBits, ReleaseDC, SelectObject, BITMAPINFO, BITMAPINFOHEADER, BI_RGB, DIB_RGB_COLORS,
    HBITMAP, HDC, HGDIOBJ, SRCCOPY,
};
use windows::Win32::UI::WindowsAndMessaging::{GetSystemMetrics, SM_CXSCREEN, SM_CYSCREEN};

use super::{ScreenCapture, ScreenError, JPEG_QUALITY};

/// GDI-based capture of the primary display.
pub struct GdiScreenCapture;

impl GdiScreenCapture {
    pub fn new() -> Result<Self, ScreenError> {
        Ok(Self)
    }
}

#[async_trait]
impl ScreenCapture for GdiScreenCapture {
    async fn capture_jpeg(&mut self) -> Result<Vec<u8>, ScreenError> {
        tokio::task::spawn_blocking(capture_once)
            .await
            .map_err(|e| ScreenError::Capture(format!("capture task failed: {e}")))?
    }
}

fn capture_once() -> Result<Vec<u8>, ScreenError> {
    // SAFETY: GetSystemMetrics takes no pointers.
    let (width, height) = unsafe {
        (
            GetSystemMetrics(SM_CXSCREEN),
            GetSystemMetrics(SM_CYSCREEN),
        )
    };
    if width <= 0 || height <= 0 {
        return Err(ScreenError::Capture("no primary display metrics".into()));
    }

    let bgra = grab_screen(width, height)?;
    encode_jpeg(&bgra, width as u32, height as u32)
}

/// Copies the screen into a top-down BGRA buffer.
fn grab_screen(width: i32, height: i32) -> Result<Vec<u8>, ScreenError> {
    // SAFETY: standard GDI capture sequence; every handle acquired here is
    // released on all paths before returning.
    unsafe {
        let screen_dc: HDC = GetDC(None);
        if screen_dc.is_invalid() {
            return Err(ScreenError::Capture("GetDC failed".into()));
        }

        let mem_dc = CreateCompatibleDC(Some(screen_dc));
        let bitmap: HBITMAP = CreateCompatibleBitmap(screen_dc, width, height);
        let bitmap_obj: HGDIOBJ = bitmap.into();
        let previous = SelectObject(mem_dc, bitmap_obj);

        let blit = BitBlt(mem_dc, 0, 0, width, height, Some(screen_dc), 0, 0, SRCCOPY);

        let mut info = BITMAPINFO {
            bmiHeader: BITMAPINFOHEADER {
                biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: width,
                // Negative height requests a top-down DIB.
                biHeight: -height,
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut pixels = vec![0u8; (width as usize) * (height as usize) * 4];
        let copied = GetDIBits(
            mem_dc,
            bitmap,
            0,
            height as u32,
            Some(pixels.as_mut_ptr().cast()),
            &mut info,
            DIB_RGB_COLORS,
        );

        SelectObject(mem_dc, previous);
        let _ = DeleteObject(bitmap_obj);
        let _ = DeleteDC(mem_dc);
        ReleaseDC(None, screen_dc);

        if blit.is_err() {
            return Err(ScreenError::Capture("BitBlt failed".into()));
        }
        if copied == 0 {
            return Err(ScreenError::Capture("GetDIBits copied no scanlines".into()));
        }
        Ok(pixels)
    }
}

/// Encodes a BGRA buffer as quality-60 JPEG.
fn encode_jpeg(bgra: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ScreenError> {
    // JPEG has no alpha; swizzle BGRA to packed RGB.
    let mut rgb = Vec::with_capacity((width as usize) * (height as usize) * 3);
    for px in bgra.chunks_exact(4) {
        rgb.extend_from_slice(&[px[2], px[1], px[0]]);
    }

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(Cursor::new(&mut jpeg), JPEG_QUALITY)
        .encode(&rgb, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| ScreenError::Capture(format!("JPEG encode: {e}")))?;
    Ok(jpeg)
}
