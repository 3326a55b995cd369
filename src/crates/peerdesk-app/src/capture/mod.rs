//! Input capture infrastructure.
//!
//! A capture implementation watches the local keyboard and mouse and feeds
//! normalized [`EventBody`] values into a bounded channel until the stop
//! token fires.  The channel blocks the producer when full – capture floods
//! back-pressure naturally instead of ballooning memory.
//!
//! On Windows the poller runs on dedicated threads (`GetAsyncKeyState` and
//! `GetCursorPos` every 10 ms); on Linux it parses `xinput` subprocesses.
//! The `InputCapture` trait lets tests substitute a scripted source.

use peerdesk_core::EventBody;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub mod clicks;
pub mod mock;

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "windows")]
pub mod windows;

/// Bound on in-flight captured events; producers block when it is reached.
pub const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Poll interval of the state-polling capture backends.
pub const POLL_INTERVAL_MS: u64 = 10;

/// Error type for capture construction and startup.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// A required capture tool or API is missing on this host.
    #[error("input capture unavailable: {0}")]
    Unavailable(String),

    /// No capture backend exists for this OS.
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(&'static str),
}

/// Trait abstracting input event production.
pub trait InputCapture: Send {
    /// Starts the background capture work.  Events flow into `events` until
    /// `stop` is cancelled; the implementation then releases its OS handles
    /// and lets the sender drop.
    fn start(
        &mut self,
        events: mpsc::Sender<EventBody>,
        stop: CancellationToken,
    ) -> Result<(), CaptureError>;
}

/// Constructs the capture backend for the current OS.
///
/// # Errors
///
/// [`CaptureError::Unavailable`] when a prerequisite tool is missing,
/// [`CaptureError::UnsupportedPlatform`] elsewhere.
pub fn new_platform_capture() -> Result<Box<dyn InputCapture>, CaptureError> {
    #[cfg(target_os = "windows")]
    {
        Ok(Box::new(windows::WindowsInputCapture::new()))
    }

    #[cfg(target_os = "linux")]
    {
        Ok(Box::new(linux::LinuxInputCapture::new()?))
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux")))]
    {
        Err(CaptureError::UnsupportedPlatform(std::env::consts::OS))
    }
}
