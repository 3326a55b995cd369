//! Screen capture: the primary display as JPEG bytes.
//!
//! The primary display is the one whose origin is `(0, 0)`; quality is
//! fixed at 60, the point on the curve where a desktop still reads cleanly
//! and a frame stays small enough for a 20 fps LAN stream.  Pacing belongs
//! to the session's frame ticker, not here – each call captures exactly
//! once.
//!
//! The trait is async: the Linux backend awaits an ImageMagick subprocess
//! per frame, and the 50 ms tick cadence must not park a runtime worker
//! thread for that long.

use async_trait::async_trait;

pub mod mock;

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "windows")]
pub mod windows;

/// JPEG encode quality for every frame.
pub const JPEG_QUALITY: u8 = 60;

/// Error type for screen capture.
#[derive(Debug, thiserror::Error)]
pub enum ScreenError {
    /// A required capture tool or API is missing on this host.
    #[error("screen capture unavailable: {0}")]
    Unavailable(String),

    /// A single capture attempt failed; the next tick may succeed.
    #[error("capture failed: {0}")]
    Capture(String),

    /// Subprocess plumbing failed.
    #[error("capture I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No capture backend exists for this OS.
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(&'static str),
}

/// Trait abstracting display capture.
#[async_trait]
pub trait ScreenCapture: Send {
    /// Captures the primary display and returns owned JPEG bytes.
    async fn capture_jpeg(&mut self) -> Result<Vec<u8>, ScreenError>;
}

/// Constructs the capture backend for the current OS.
///
/// # Errors
///
/// [`ScreenError::Unavailable`] when a prerequisite is missing,
/// [`ScreenError::UnsupportedPlatform`] elsewhere.
pub fn new_platform_capture() -> Result<Box<dyn ScreenCapture>, ScreenError> {
    #[cfg(target_os = "windows")]
    {
        Ok(Box::new(windows::GdiScreenCapture::new()?))
    }

    #[cfg(target_os = "linux")]
    {
        Ok(Box::new(linux::ImportScreenCapture::new()?))
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux")))]
    {
        Err(ScreenError::UnsupportedPlatform(std::env::consts::OS))
    }
}
