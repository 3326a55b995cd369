//! Windows input injection via SendInput.
//!
//! Keyboard events are submitted as a single batch so the modifier
//! bracketing is atomic from the OS's point of view: modifiers go down in
//! Ctrl, Shift, Alt order before the key, and come up after it in the
//! reverse order.  Double clicks are one four-record batch – Windows infers
//! double-click semantics from its own timing, so the records just need to
//! arrive together.

#![cfg(target_os = "windows")]

use async_trait::async_trait;
use peerdesk_core::keymap::windows_vk::{VK_CONTROL, VK_MENU, VK_SHIFT};
use peerdesk_core::keymap::{is_modifier_name, KeyMapper};
use peerdesk_core::{
    ClickAction, KeyAction, KeyboardEvent, Modifier, MouseButton, MouseClickEvent,
    MouseMoveEvent, MouseScrollEvent,
};
use tracing::warn;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    mouse_event, SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, INPUT_MOUSE, KEYBDINPUT,
    KEYBD_EVENT_FLAGS, KEYEVENTF_KEYUP, MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP,
    MOUSEEVENTF_MIDDLEDOWN, MOUSEEVENTF_MIDDLEUP, MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP,
    MOUSEEVENTF_WHEEL, MOUSEINPUT, MOUSE_EVENT_FLAGS, VIRTUAL_KEY,
};
use windows::Win32::UI::WindowsAndMessaging::SetCursorPos;

use super::{ExecuteError, InputExecutor};

/// One wheel notch in Windows wheel-delta units.
const WHEEL_DELTA: i32 = 120;

/// Windows implementation of [`InputExecutor`].
pub struct WindowsInputExecutor;

impl WindowsInputExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WindowsInputExecutor {
    fn default() -> Self {
        Self::new()
    }
}

// SendInput completes synchronously; the async signatures exist for the
// subprocess-backed platforms.
#[async_trait]
impl InputExecutor for WindowsInputExecutor {
    async fn keyboard(&mut self, event: &KeyboardEvent) -> Result<(), ExecuteError> {
        // Modifier keys never execute directly; they arrive as `modifiers`
        // on the key they decorate.
        if is_modifier_name(&event.key) {
            return Ok(());
        }

        let Some(vk) = KeyMapper::name_to_windows_vk(&event.key) else {
            warn!("unknown key {:?}, dropping event", event.key);
            return Ok(());
        };

        let mut inputs: Vec<INPUT> = Vec::with_capacity(event.modifiers.len() + 1);
        match event.action {
            KeyAction::Press => {
                // Modifiers down in canonical order, then the key.
                for modifier in ordered(&event.modifiers) {
                    inputs.push(key_input(modifier_vk(modifier), false));
                }
                inputs.push(key_input(vk, false));
            }
            KeyAction::Release => {
                // Mirror image: the key first, then modifiers in reverse.
                inputs.push(key_input(vk, true));
                for modifier in ordered(&event.modifiers).into_iter().rev() {
                    inputs.push(key_input(modifier_vk(modifier), true));
                }
            }
        }
        send_batch(&inputs)
    }

    async fn mouse_move(&mut self, event: &MouseMoveEvent) -> Result<(), ExecuteError> {
        set_cursor(event.x, event.y)
    }

    async fn mouse_click(&mut self, event: &MouseClickEvent) -> Result<(), ExecuteError> {
        set_cursor(event.x, event.y)?;

        let (down, up) = match event.button {
            MouseButton::Left => (MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP),
            MouseButton::Right => (MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP),
            MouseButton::Middle => (MOUSEEVENTF_MIDDLEDOWN, MOUSEEVENTF_MIDDLEUP),
        };

        let inputs: Vec<INPUT> = if event.action == ClickAction::Double || event.is_double {
            // Full down-up-down-up; the OS supplies double-click timing.
            vec![
                mouse_input(down),
                mouse_input(up),
                mouse_input(down),
                mouse_input(up),
            ]
        } else {
            let flag = match event.action {
                ClickAction::Press => down,
                ClickAction::Release => up,
                ClickAction::Double => unreachable!("handled above"),
            };
            vec![mouse_input(flag)]
        };
        send_batch(&inputs)
    }

    async fn mouse_scroll(&mut self, event: &MouseScrollEvent) -> Result<(), ExecuteError> {
        // SAFETY: mouse_event with MOUSEEVENTF_WHEEL only reads its scalar
        // arguments.
        unsafe {
            mouse_event(
                MOUSEEVENTF_WHEEL,
                0,
                0,
                event.delta_y * WHEEL_DELTA,
                0,
            );
        }
        Ok(())
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Canonical Ctrl, Shift, Alt ordering over whatever subset is held.
fn ordered(modifiers: &[Modifier]) -> Vec<Modifier> {
    let mut mods: Vec<Modifier> = modifiers.to_vec();
    mods.sort_by_key(|m| match m {
        Modifier::Ctrl => 0,
        Modifier::Shift => 1,
        Modifier::Alt => 2,
    });
    mods.dedup();
    mods
}

fn modifier_vk(modifier: Modifier) -> u16 {
    match modifier {
        Modifier::Ctrl => VK_CONTROL,
        Modifier::Shift => VK_SHIFT,
        Modifier::Alt => VK_MENU,
    }
}

fn key_input(vk: u16, key_up: bool) -> INPUT {
    let flags = if key_up {
        KEYEVENTF_KEYUP
    } else {
        KEYBD_EVENT_FLAGS(0)
    };
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY(vk),
                wScan: 0,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

fn mouse_input(flags: MOUSE_EVENT_FLAGS) -> INPUT {
    INPUT {
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
    }
}

fn set_cursor(x: i32, y: i32) -> Result<(), ExecuteError> {
    // SAFETY: SetCursorPos takes two scalars.
    unsafe { SetCursorPos(x, y) }
        .map_err(|e| ExecuteError::Injection(format!("SetCursorPos({x}, {y}): {e}")))
}

fn send_batch(inputs: &[INPUT]) -> Result<(), ExecuteError> {
    if inputs.is_empty() {
        return Ok(());
    }
    // SAFETY: inputs is a valid slice of correctly sized INPUT records.
    let sent = unsafe { SendInput(inputs, std::mem::size_of::<INPUT>() as i32) };
    if sent as usize != inputs.len() {
        return Err(ExecuteError::Injection(format!(
            "SendInput accepted {sent} of {} records",
            inputs.len()
        )));
    }
    Ok(())
}
