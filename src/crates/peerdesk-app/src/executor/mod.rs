//! Input injection infrastructure.
//!
//! An executor applies received events to the local OS.  The stream must
//! keep flowing no matter what a single event does: unknown keys and
//! buttons are logged and swallowed, OS-level failures bubble up so the
//! session loop can log them, and nothing short of a missing platform
//! capability terminates anything.
//!
//! The ordering contract matters more than raw speed here – a single
//! executor instance is driven by a single dispatch loop, which together
//! with TCP gives the wire's FIFO guarantee.
//!
//! The trait is async so backends that shell out (the `xdotool` path) can
//! await the subprocess instead of parking a runtime worker thread for a
//! whole process lifetime; the `SendInput` backend completes immediately.

use async_trait::async_trait;
use peerdesk_core::{KeyboardEvent, MouseClickEvent, MouseMoveEvent, MouseScrollEvent};

pub mod mock;

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "windows")]
pub mod windows;

/// Error type for injection.
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    /// A required injection tool or API is missing on this host.
    #[error("input executor unavailable: {0}")]
    Unavailable(String),

    /// The OS rejected an injection call.
    #[error("injection failed: {0}")]
    Injection(String),

    /// Subprocess plumbing failed.
    #[error("injection I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No executor backend exists for this OS.
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(&'static str),
}

/// Trait abstracting OS input injection.
///
/// Implementations must never emit a release for a key or button they were
/// not asked to press: modifier bracketing and double-click synthesis rely
/// on the executor producing exactly the transitions the event describes.
#[async_trait]
pub trait InputExecutor: Send {
    async fn keyboard(&mut self, event: &KeyboardEvent) -> Result<(), ExecuteError>;
    async fn mouse_move(&mut self, event: &MouseMoveEvent) -> Result<(), ExecuteError>;
    async fn mouse_click(&mut self, event: &MouseClickEvent) -> Result<(), ExecuteError>;
    async fn mouse_scroll(&mut self, event: &MouseScrollEvent) -> Result<(), ExecuteError>;
}

/// Constructs the injection backend for the current OS.
///
/// # Errors
///
/// [`ExecuteError::Unavailable`] when a prerequisite is missing,
/// [`ExecuteError::UnsupportedPlatform`] elsewhere.
pub fn new_platform_executor() -> Result<Box<dyn InputExecutor>, ExecuteError> {
    #[cfg(target_os = "windows")]
    {
        Ok(Box::new(windows::WindowsInputExecutor::new()))
    }

    #[cfg(target_os = "linux")]
    {
        Ok(Box::new(linux::LinuxInputExecutor::new()?))
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux")))]
    {
        Err(ExecuteError::UnsupportedPlatform(std::env::consts::OS))
    }
}
