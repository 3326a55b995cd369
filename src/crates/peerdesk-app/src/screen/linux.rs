//! Linux screen capture via ImageMagick `import`.
//!
//! The Linux side of this tool leans on the X11 user-space utilities
//! (`xinput`, `xdotool`); screen capture follows suit with `import`, which
//! grabs the root window and writes JPEG straight to stdout, quality
//! included – no second encode pass needed.  The subprocess is awaited
//! through `tokio::process`, so a slow grab delays only this session's
//! ticker (which skips the missed ticks), never the runtime.

#![cfg(target_os = "linux")]

use async_trait::async_trait;
use tokio::process::Command;

use super::{ScreenCapture, ScreenError, JPEG_QUALITY};

/// `import -window root` based capture.
pub struct ImportScreenCapture {
    quality: String,
}

impl ImportScreenCapture {
    /// Verifies `import` exists.
    ///
    /// # Errors
    ///
    /// [`ScreenError::Unavailable`] when it does not.
    pub fn new() -> Result<Self, ScreenError> {
        let found = std::env::var_os("PATH")
            .map(|path| std::env::split_paths(&path).any(|dir| dir.join("import").is_file()))
            .unwrap_or(false);
        if !found {
            return Err(ScreenError::Unavailable(
                "ImageMagick `import` not found in PATH (install imagemagick)".into(),
            ));
        }
        Ok(Self {
            quality: JPEG_QUALITY.to_string(),
        })
    }
}

#[async_trait]
impl ScreenCapture for ImportScreenCapture {
    async fn capture_jpeg(&mut self) -> Result<Vec<u8>, ScreenError> {
        let output = Command::new("import")
            .args([
                "-window",
                "root",
                "-silent",
                "-quality",
                &self.quality,
                "jpeg:-",
            ])
            .output()
            .await?;

        if !output.status.success() {
            return Err(ScreenError::Capture(format!(
                "import exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        if output.stdout.is_empty() {
            return Err(ScreenError::Capture("import produced no output".into()));
        }
        Ok(output.stdout)
    }
}
