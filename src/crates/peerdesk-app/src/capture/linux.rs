//! Linux input capture via the X11 user-space tools.
//!
//! Keyboard events come from `xinput test <device>` and pointer events from
//! `xinput test-xi2 --root`; the cursor position is refreshed with
//! `xdotool getmouselocation --shell` whenever the pointer stream reports
//! activity.  Both prerequisites are checked up front.
//!
//! `xinput` only observes the current X session – activity on another VT or
//! a Wayland compositor is invisible to it.
//!
//! Unlike the Windows poller, `xinput test` does not report modifier state
//! alongside a key, so the parser tracks modifier keys' own press/release
//! transitions and stamps the current set onto each non-modifier event.

#![cfg(target_os = "linux")]

use std::process::Stdio;
use std::time::Instant;

use peerdesk_core::keymap::{is_modifier_name, KeyMapper};
use peerdesk_core::{
    ClickAction, EventBody, KeyAction, KeyboardEvent, Modifier, MouseButton, MouseClickEvent,
    MouseMoveEvent, MouseScrollEvent,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::clicks::{ClickTracker, PressKind};
use super::{CaptureError, InputCapture};

/// Linux capture backend driving the `xinput` subprocesses.
pub struct LinuxInputCapture;

impl LinuxInputCapture {
    /// Verifies the required tools exist.
    ///
    /// # Errors
    ///
    /// [`CaptureError::Unavailable`] naming the missing binary.
    pub fn new() -> Result<Self, CaptureError> {
        for tool in ["xinput", "xdotool"] {
            if !binary_on_path(tool) {
                return Err(CaptureError::Unavailable(format!(
                    "{tool} not found in PATH (install it, e.g. apt-get install {tool})"
                )));
            }
        }
        Ok(Self)
    }
}

impl InputCapture for LinuxInputCapture {
    fn start(
        &mut self,
        events: mpsc::Sender<EventBody>,
        stop: CancellationToken,
    ) -> Result<(), CaptureError> {
        let keyboard_tx = events.clone();
        let keyboard_stop = stop.clone();
        tokio::spawn(async move {
            match find_keyboard_device().await {
                Some(device) => keyboard_loop(&device, keyboard_tx, keyboard_stop).await,
                None => warn!("no keyboard device found, keyboard capture disabled"),
            }
        });

        tokio::spawn(async move {
            pointer_loop(events, stop).await;
        });

        Ok(())
    }
}

fn binary_on_path(name: &str) -> bool {
    let Some(path) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&path).any(|dir| dir.join(name).is_file())
}

/// Picks the first real keyboard from `xinput list`.
async fn find_keyboard_device() -> Option<String> {
    let output = Command::new("xinput").arg("list").output().await.ok()?;
    let listing = String::from_utf8_lossy(&output.stdout).into_owned();
    keyboard_id_from_listing(&listing)
}

/// Extracts the `id=<n>` of the first non-virtual keyboard line.
fn keyboard_id_from_listing(listing: &str) -> Option<String> {
    listing
        .lines()
        .filter(|line| {
            let lower = line.to_lowercase();
            lower.contains("keyboard") && !lower.contains("virtual")
        })
        .find_map(device_id_from_line)
}

fn device_id_from_line(line: &str) -> Option<String> {
    line.split_whitespace()
        .find_map(|tok| tok.strip_prefix("id="))
        .map(|id| id.to_string())
}

// ── Keyboard stream ───────────────────────────────────────────────────────────

/// Parsed `xinput test` line: `key press   38` / `key release 38`.
fn parse_key_line(line: &str) -> Option<(KeyAction, u32)> {
    let mut fields = line.split_whitespace();
    if fields.next()? != "key" {
        return None;
    }
    let action = match fields.next()? {
        "press" => KeyAction::Press,
        "release" => KeyAction::Release,
        _ => return None,
    };
    let code: u32 = fields.next()?.parse().ok()?;
    Some((action, code))
}

async fn keyboard_loop(
    device: &str,
    events: mpsc::Sender<EventBody>,
    stop: CancellationToken,
) {
    let mut child = match Command::new("xinput")
        .args(["test", device])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            warn!("failed to start xinput test: {e}");
            return;
        }
    };
    let stdout = child.stdout.take().expect("stdout piped");
    let mut lines = BufReader::new(stdout).lines();

    // Held modifiers, maintained from the modifier keys' own transitions.
    let mut held: Vec<Modifier> = Vec::new();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = stop.cancelled() => break,
        };
        let Ok(Some(line)) = line else { break };

        let Some((action, code)) = parse_key_line(&line) else {
            continue;
        };
        let key = KeyMapper::x11_keycode_to_name(code);

        if is_modifier_name(&key) {
            update_held_modifiers(&mut held, &key, action);
            continue; // modifier state rides on the next regular key
        }

        let event = EventBody::Keyboard(KeyboardEvent {
            key,
            action,
            modifiers: held.clone(),
        });
        if events.send(event).await.is_err() {
            break;
        }
    }

    let _ = child.kill().await;
    debug!("keyboard capture loop ended");
}

fn update_held_modifiers(held: &mut Vec<Modifier>, key: &str, action: KeyAction) {
    let modifier = match key {
        "Control_L" => Modifier::Ctrl,
        "Shift_L" => Modifier::Shift,
        "Alt_L" => Modifier::Alt,
        _ => return,
    };
    match action {
        KeyAction::Press if !held.contains(&modifier) => held.push(modifier),
        KeyAction::Release => held.retain(|m| *m != modifier),
        _ => {}
    }
    // Canonical Ctrl, Shift, Alt order regardless of press order.
    held.sort_by_key(|m| match m {
        Modifier::Ctrl => 0,
        Modifier::Shift => 1,
        Modifier::Alt => 2,
    });
}

// ── Pointer stream ────────────────────────────────────────────────────────────

/// One decoded pointer observation from the `test-xi2` stream.
#[derive(Debug, PartialEq, Eq)]
enum PointerEvent {
    Motion,
    Button { number: u32, action: KeyAction },
}

/// Incremental parser over `xinput test-xi2 --root` output.
///
/// The stream interleaves `EVENT type <n> (<name>)` headers with indented
/// field lines; the button number arrives on a later `detail:` line, so the
/// parser remembers which header it is inside.
#[derive(Debug, Default)]
struct Xi2Parser {
    pending: Option<KeyAction>,
}

impl Xi2Parser {
    fn feed(&mut self, line: &str) -> Option<PointerEvent> {
        if line.starts_with("EVENT type") {
            if line.contains("(ButtonPress)") {
                self.pending = Some(KeyAction::Press);
            } else if line.contains("(ButtonRelease)") {
                self.pending = Some(KeyAction::Release);
            } else {
                self.pending = None;
                if line.contains("(Motion)") {
                    return Some(PointerEvent::Motion);
                }
            }
            return None;
        }

        if let Some(action) = self.pending {
            if let Some(rest) = line.trim().strip_prefix("detail:") {
                self.pending = None;
                let number: u32 = rest.trim().parse().ok()?;
                return Some(PointerEvent::Button { number, action });
            }
        }
        None
    }
}

async fn pointer_loop(events: mpsc::Sender<EventBody>, stop: CancellationToken) {
    let mut child = match Command::new("xinput")
        .args(["test-xi2", "--root"])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            warn!("failed to start xinput test-xi2: {e}");
            return;
        }
    };
    let stdout = child.stdout.take().expect("stdout piped");
    let mut lines = BufReader::new(stdout).lines();

    let mut parser = Xi2Parser::default();
    let mut tracker = ClickTracker::new();
    let mut last_pos: Option<(i32, i32)> = None;

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = stop.cancelled() => break,
        };
        let Ok(Some(line)) = line else { break };

        let Some(event) = parser.feed(&line) else {
            continue;
        };
        let Some((x, y)) = mouse_position().await else {
            continue;
        };

        match event {
            PointerEvent::Motion => {
                if last_pos != Some((x, y)) {
                    last_pos = Some((x, y));
                    let event = EventBody::MouseMove(MouseMoveEvent { x, y });
                    if events.send(event).await.is_err() {
                        break;
                    }
                }
            }
            PointerEvent::Button { number, action } => {
                let Some(body) = button_event(number, action, x, y, &mut tracker) else {
                    continue;
                };
                if events.send(body).await.is_err() {
                    break;
                }
            }
        }
    }

    let _ = child.kill().await;
    debug!("pointer capture loop ended");
}

/// Maps an XI2 button number to a wire event.  Buttons 4/5 are the wheel;
/// their release carries no information.
fn button_event(
    number: u32,
    action: KeyAction,
    x: i32,
    y: i32,
    tracker: &mut ClickTracker,
) -> Option<EventBody> {
    let button = match number {
        1 => MouseButton::Left,
        2 => MouseButton::Middle,
        3 => MouseButton::Right,
        4 | 5 => {
            if action != KeyAction::Press {
                return None;
            }
            let delta_y = if number == 4 { 1 } else { -1 };
            return Some(EventBody::MouseScroll(MouseScrollEvent {
                delta_x: 0,
                delta_y,
            }));
        }
        other => {
            debug!("ignoring pointer button {other}");
            return None;
        }
    };

    let click = match action {
        KeyAction::Press => match tracker.classify_press(button, x, y, Instant::now()) {
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
        },
        KeyAction::Release => {
            if !tracker.should_emit_release(button) {
                return None;
            }
            MouseClickEvent {
                button,
                action: ClickAction::Release,
                x,
                y,
                is_double: false,
            }
        }
    };
    Some(EventBody::MouseClick(click))
}

/// Queries the pointer position: `xdotool getmouselocation --shell` prints
/// `X=`, `Y=`, `SCREEN=`, `WINDOW=` lines.
async fn mouse_position() -> Option<(i32, i32)> {
    let output = Command::new("xdotool")
        .args(["getmouselocation", "--shell"])
        .output()
        .await
        .ok()?;
    parse_mouse_location(&String::from_utf8_lossy(&output.stdout))
}

fn parse_mouse_location(text: &str) -> Option<(i32, i32)> {
    let mut x = None;
    let mut y = None;
    for line in text.lines() {
        if let Some(v) = line.strip_prefix("X=") {
            x = v.trim().parse().ok();
        } else if let Some(v) = line.strip_prefix("Y=") {
            y = v.trim().parse().ok();
        }
    }
    Some((x?, y?))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_line_press_and_release() {
        assert_eq!(parse_key_line("key press   38"), Some((KeyAction::Press, 38)));
        assert_eq!(
            parse_key_line("key release 36"),
            Some((KeyAction::Release, 36))
        );
    }

    #[test]
    fn test_parse_key_line_rejects_noise() {
        assert_eq!(parse_key_line(""), None);
        assert_eq!(parse_key_line("button press 1"), None);
        assert_eq!(parse_key_line("key press abc"), None);
    }

    #[test]
    fn test_keyboard_id_from_listing_prefers_real_keyboard() {
        let listing = "\
⎡ Virtual core pointer                    \tid=2\t[master pointer  (3)]
⎜   ↳ Logitech USB Receiver Mouse         \tid=10\t[slave  pointer  (2)]
⎣ Virtual core keyboard                   \tid=3\t[master keyboard (2)]
    ↳ AT Translated Set 2 keyboard        \tid=12\t[slave  keyboard (3)]
";
        assert_eq!(keyboard_id_from_listing(listing), Some("12".to_string()));
    }

    #[test]
    fn test_keyboard_id_missing_when_only_virtual() {
        let listing = "⎣ Virtual core keyboard    \tid=3\t[master keyboard (2)]\n";
        assert_eq!(keyboard_id_from_listing(listing), None);
    }

    #[test]
    fn test_xi2_parser_pairs_header_with_detail() {
        let mut parser = Xi2Parser::default();
        assert_eq!(parser.feed("EVENT type 4 (ButtonPress)"), None);
        assert_eq!(parser.feed("    device: 11 (11)"), None);
        assert_eq!(
            parser.feed("    detail: 1"),
            Some(PointerEvent::Button {
                number: 1,
                action: KeyAction::Press
            })
        );
        // Detail outside a button header is ignored.
        assert_eq!(parser.feed("    detail: 1"), None);
    }

    #[test]
    fn test_xi2_parser_motion_is_immediate() {
        let mut parser = Xi2Parser::default();
        assert_eq!(
            parser.feed("EVENT type 6 (Motion)"),
            Some(PointerEvent::Motion)
        );
    }

    #[test]
    fn test_xi2_parser_release_detail() {
        let mut parser = Xi2Parser::default();
        parser.feed("EVENT type 5 (ButtonRelease)");
        assert_eq!(
            parser.feed("    detail: 3"),
            Some(PointerEvent::Button {
                number: 3,
                action: KeyAction::Release
            })
        );
    }

    #[test]
    fn test_parse_mouse_location_shell_output() {
        let text = "X=640\nY=512\nSCREEN=0\nWINDOW=58720259\n";
        assert_eq!(parse_mouse_location(text), Some((640, 512)));
    }

    #[test]
    fn test_parse_mouse_location_rejects_partial_output() {
        assert_eq!(parse_mouse_location("X=640\n"), None);
        assert_eq!(parse_mouse_location(""), None);
    }

    #[test]
    fn test_wheel_buttons_become_scroll_events() {
        let mut tracker = ClickTracker::new();
        let up = button_event(4, KeyAction::Press, 0, 0, &mut tracker);
        assert_eq!(
            up,
            Some(EventBody::MouseScroll(MouseScrollEvent {
                delta_x: 0,
                delta_y: 1
            }))
        );
        let down = button_event(5, KeyAction::Press, 0, 0, &mut tracker);
        assert_eq!(
            down,
            Some(EventBody::MouseScroll(MouseScrollEvent {
                delta_x: 0,
                delta_y: -1
            }))
        );
        // Wheel releases are noise.
        assert_eq!(button_event(4, KeyAction::Release, 0, 0, &mut tracker), None);
    }

    #[test]
    fn test_modifier_tracking_orders_ctrl_shift_alt() {
        let mut held = Vec::new();
        update_held_modifiers(&mut held, "Shift_L", KeyAction::Press);
        update_held_modifiers(&mut held, "Control_L", KeyAction::Press);
        assert_eq!(held, vec![Modifier::Ctrl, Modifier::Shift]);
        update_held_modifiers(&mut held, "Shift_L", KeyAction::Release);
        assert_eq!(held, vec![Modifier::Ctrl]);
    }
}
