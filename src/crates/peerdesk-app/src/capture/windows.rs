//! Windows input capture by state polling.
//!
//! Two dedicated threads poll the OS every 10 ms: one diffs
//! `GetAsyncKeyState` over the watched key set, the other tracks
//! `GetCursorPos` and the three mouse buttons.  Dedicated threads keep the
//! Win32 polling cadence independent of the async runtime; events cross
//! into it through the bounded channel's `blocking_send`.
//!
//! Modifier keys are polled for *state* but never emitted as events of
//! their own – each emitted key event carries the modifier set sampled at
//! its transition instant.

#![cfg(target_os = "windows")]

use std::collections::HashMap;
use std::time::{Duration, Instant};

use peerdesk_core::keymap::windows_vk::{
    name_from_vk, VK_CONTROL, VK_LBUTTON, VK_MBUTTON, VK_MENU, VK_RBUTTON, VK_SHIFT,
};
use peerdesk_core::{
    ClickAction, EventBody, KeyAction, KeyboardEvent, Modifier, MouseButton, MouseClickEvent,
    MouseMoveEvent,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use windows::Win32::Foundation::POINT;
use windows::Win32::UI::Input::KeyboardAndMouse::GetAsyncKeyState;
use windows::Win32::UI::WindowsAndMessaging::GetCursorPos;

use super::clicks::{ClickTracker, PressKind};
use super::{CaptureError, InputCapture, POLL_INTERVAL_MS};

/// Non-modifier keys the poller watches: the alphabet plus the named
/// editing keys of the wire key set.
fn watched_keys() -> Vec<(u16, &'static str)> {
    let mut keys: Vec<(u16, &'static str)> = (0x41..=0x5A)
        .map(|vk| (vk, name_from_vk(vk).expect("letter VK in table")))
        .collect();
    keys.extend([
        (0x0D, "Return"),
        (0x1B, "Escape"),
        (0x09, "Tab"),
        (0x20, "space"),
        (0x08, "BackSpace"),
    ]);
    keys
}

/// High bit of the `GetAsyncKeyState` result: the key is currently down.
fn key_down(vk: u16) -> bool {
    // SAFETY: GetAsyncKeyState has no preconditions.
    let state = unsafe { GetAsyncKeyState(vk as i32) };
    (state as u16 & 0x8000) != 0
}

/// Samples the current modifier state in the canonical Ctrl, Shift, Alt order.
fn current_modifiers() -> Vec<Modifier> {
    let mut mods = Vec::new();
    if key_down(VK_CONTROL) {
        mods.push(Modifier::Ctrl);
    }
    if key_down(VK_SHIFT) {
        mods.push(Modifier::Shift);
    }
    if key_down(VK_MENU) {
        mods.push(Modifier::Alt);
    }
    mods
}

/// Windows polling capture backend.
pub struct WindowsInputCapture;

impl WindowsInputCapture {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WindowsInputCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl InputCapture for WindowsInputCapture {
    fn start(
        &mut self,
        events: mpsc::Sender<EventBody>,
        stop: CancellationToken,
    ) -> Result<(), CaptureError> {
        let keyboard_tx = events.clone();
        let keyboard_stop = stop.clone();
        std::thread::Builder::new()
            .name("capture-keyboard".to_string())
            .spawn(move || keyboard_loop(keyboard_tx, keyboard_stop))
            .map_err(|e| CaptureError::Unavailable(format!("keyboard thread: {e}")))?;

        std::thread::Builder::new()
            .name("capture-mouse".to_string())
            .spawn(move || mouse_loop(events, stop))
            .map_err(|e| CaptureError::Unavailable(format!("mouse thread: {e}")))?;

        Ok(())
    }
}

fn keyboard_loop(events: mpsc::Sender<EventBody>, stop: CancellationToken) {
    let keys = watched_keys();
    let mut down: HashMap<u16, bool> = HashMap::new();

    while !stop.is_cancelled() {
        for &(vk, name) in &keys {
            let is_down = key_down(vk);
            let was_down = down.insert(vk, is_down).unwrap_or(false);
            if is_down == was_down {
                continue;
            }

            let event = EventBody::Keyboard(KeyboardEvent {
                key: name.to_string(),
                action: if is_down {
                    KeyAction::Press
                } else {
                    KeyAction::Release
                },
                modifiers: current_modifiers(),
            });
            if events.blocking_send(event).is_err() {
                return; // session gone
            }
        }
        std::thread::sleep(Duration::from_millis(POLL_INTERVAL_MS));
    }
}

fn mouse_loop(events: mpsc::Sender<EventBody>, stop: CancellationToken) {
    const BUTTONS: [(u16, MouseButton); 3] = [
        (VK_LBUTTON, MouseButton::Left),
        (VK_RBUTTON, MouseButton::Right),
        (VK_MBUTTON, MouseButton::Middle),
    ];

    let mut last_pos: Option<(i32, i32)> = None;
    let mut down: HashMap<u16, bool> = HashMap::new();
    let mut tracker = ClickTracker::new();

    while !stop.is_cancelled() {
        let mut pt = POINT::default();
        // SAFETY: pt is a valid out-pointer for the duration of the call.
        if unsafe { GetCursorPos(&mut pt) }.is_err() {
            debug!("GetCursorPos failed, skipping poll");
            std::thread::sleep(Duration::from_millis(POLL_INTERVAL_MS));
            continue;
        }
        let (x, y) = (pt.x, pt.y);

        if last_pos != Some((x, y)) {
            last_pos = Some((x, y));
            let event = EventBody::MouseMove(MouseMoveEvent { x, y });
            if events.blocking_send(event).is_err() {
                return;
            }
        }

        for (vk, button) in BUTTONS {
            let is_down = key_down(vk);
            let was_down = down.insert(vk, is_down).unwrap_or(false);
            if is_down == was_down {
                continue;
            }

            let click = if is_down {
                match tracker.classify_press(button, x, y, Instant::now()) {
                    PressKind::Double => MouseClickEvent {
                        button,
                        action: ClickAction::Double,
                        x,
                        y,
                        is_double: true,
                    },
                    PressKind::Single => MouseClickEvent {
                        button,
                        action: ClickAction::Press,
                        x,
                        y,
                        is_double: false,
                    },
                }
            } else {
                if !tracker.should_emit_release(button) {
                    continue; // the double click already carries this release
                }
                MouseClickEvent {
                    button,
                    action: ClickAction::Release,
                    x,
                    y,
                    is_double: false,
                }
            };
            if events.blocking_send(EventBody::MouseClick(click)).is_err() {
                return;
            }
        }

        std::thread::sleep(Duration::from_millis(POLL_INTERVAL_MS));
    }
}
