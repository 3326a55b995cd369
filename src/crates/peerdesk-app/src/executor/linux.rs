//! Linux input injection via `xdotool`.
//!
//! Every event maps to one `xdotool` invocation: `key`/`keyup` for the
//! keyboard (modifiers joined with `+` into a single chord), `mousemove`,
//! `mousedown`/`mouseup` with the X11 button numbering, and wheel clicks as
//! buttons 4/5.  The subprocess is awaited through `tokio::process` so the
//! dispatch loop's worker thread stays free while `xdotool` runs.

#![cfg(target_os = "linux")]

use async_trait::async_trait;
use peerdesk_core::keymap::is_modifier_name;
use peerdesk_core::{
    ClickAction, KeyAction, KeyboardEvent, Modifier, MouseButton, MouseClickEvent,
    MouseMoveEvent, MouseScrollEvent,
};
use tokio::process::Command;
use tracing::warn;

use super::{ExecuteError, InputExecutor};

/// Linux implementation of [`InputExecutor`] shelling out to `xdotool`.
pub struct LinuxInputExecutor;

impl LinuxInputExecutor {
    /// Verifies `xdotool` exists.
    ///
    /// # Errors
    ///
    /// [`ExecuteError::Unavailable`] when it does not.
    pub fn new() -> Result<Self, ExecuteError> {
        let found = std::env::var_os("PATH")
            .map(|path| std::env::split_paths(&path).any(|dir| dir.join("xdotool").is_file()))
            .unwrap_or(false);
        if !found {
            return Err(ExecuteError::Unavailable(
                "xdotool not found in PATH (install it, e.g. apt-get install xdotool)".into(),
            ));
        }
        Ok(Self)
    }
}

#[async_trait]
impl InputExecutor for LinuxInputExecutor {
    async fn keyboard(&mut self, event: &KeyboardEvent) -> Result<(), ExecuteError> {
        if is_modifier_name(&event.key) {
            return Ok(());
        }

        match event.action {
            KeyAction::Press => {
                let chord = key_chord(&event.modifiers, &event.key);
                run_xdotool(&["key", &chord]).await
            }
            KeyAction::Release => run_xdotool(&["keyup", &event.key]).await,
        }
    }

    async fn mouse_move(&mut self, event: &MouseMoveEvent) -> Result<(), ExecuteError> {
        run_xdotool(&["mousemove", &event.x.to_string(), &event.y.to_string()]).await
    }

    async fn mouse_click(&mut self, event: &MouseClickEvent) -> Result<(), ExecuteError> {
        run_xdotool(&["mousemove", &event.x.to_string(), &event.y.to_string()]).await?;

        let button = button_number(event.button);
        if event.action == ClickAction::Double || event.is_double {
            return run_xdotool(&["click", "--repeat", "2", button]).await;
        }
        match event.action {
            ClickAction::Press => run_xdotool(&["mousedown", button]).await,
            ClickAction::Release => run_xdotool(&["mouseup", button]).await,
            ClickAction::Double => unreachable!("handled above"),
        }
    }

    async fn mouse_scroll(&mut self, event: &MouseScrollEvent) -> Result<(), ExecuteError> {
        // X11 maps the wheel to buttons 4 (up) and 5 (down).
        if event.delta_y > 0 {
            run_xdotool(&["click", "4"]).await
        } else if event.delta_y < 0 {
            run_xdotool(&["click", "5"]).await
        } else {
            Ok(())
        }
    }
}

/// Formats the `xdotool key` chord, e.g. `ctrl+shift+c`.
fn key_chord(modifiers: &[Modifier], key: &str) -> String {
    let mut parts: Vec<&str> = modifiers
        .iter()
        .map(|m| match m {
            Modifier::Ctrl => "ctrl",
            Modifier::Shift => "shift",
            Modifier::Alt => "alt",
        })
        .collect();
    parts.push(key);
    parts.join("+")
}

fn button_number(button: MouseButton) -> &'static str {
    match button {
        MouseButton::Left => "1",
        MouseButton::Middle => "2",
        MouseButton::Right => "3",
    }
}

async fn run_xdotool(args: &[&str]) -> Result<(), ExecuteError> {
    let status = Command::new("xdotool").args(args).status().await?;
    if !status.success() {
        // A bad key name makes xdotool exit non-zero; that is an input
        // problem, not a session problem.
        warn!("xdotool {args:?} exited with {status}");
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
