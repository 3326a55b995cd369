//! Message envelopes and typed input event bodies.
//!
//! Wire format (inside the length frame, see [`crate::protocol::wire`]):
//!
//! ```text
//! {"Type": "<kind>", "Data": "<payload>"}
//! ```
//!
//! `Data` is a *string*: for `input_event` it holds a second JSON envelope
//! `{"type": "<event kind>", "data": "<body JSON>"}`, and for `screen_frame`
//! it holds base64-encoded JPEG bytes.  The double-stringly nesting is an
//! inherited format decision that peers on the wire depend on; the typed
//! [`EventBody`] union below serializes to exactly those bytes.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

// ── Outer envelope ────────────────────────────────────────────────────────────

/// Kind tag of a top-level [`Message`].
///
/// Unknown tags deserialize to [`MessageKind::Other`] instead of failing:
/// a peer speaking a newer protocol revision must be logged and skipped,
/// not treated as a corrupt stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    /// Controller → controlled: open a control session.
    ControlStart,
    /// Controlled → controller: session accepted.
    ControlAck,
    /// Controller → controlled: one captured input event.
    InputEvent,
    /// Controlled → controller: one base64 JPEG frame.
    ScreenFrame,
    /// Any tag this revision does not know.
    Other(String),
}

impl MessageKind {
    /// The tag string written on the wire.
    pub fn as_str(&self) -> &str {
        match self {
            MessageKind::ControlStart => "control_start",
            MessageKind::ControlAck => "control_ack",
            MessageKind::InputEvent => "input_event",
            MessageKind::ScreenFrame => "screen_frame",
            MessageKind::Other(s) => s,
        }
    }

    fn from_tag(tag: &str) -> Self {
        match tag {
            "control_start" => MessageKind::ControlStart,
            "control_ack" => MessageKind::ControlAck,
            "input_event" => MessageKind::InputEvent,
            "screen_frame" => MessageKind::ScreenFrame,
            other => MessageKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MessageKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MessageKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TagVisitor;

        impl<'de> Visitor<'de> for TagVisitor {
            type Value = MessageKind;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a message kind string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<MessageKind, E> {
                Ok(MessageKind::from_tag(v))
            }
        }

        deserializer.deserialize_str(TagVisitor)
    }
}

/// Top-level message exchanged between peers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "Type")]
    pub kind: MessageKind,
    #[serde(rename = "Data")]
    pub data: String,
}

impl Message {
    /// Builds the session-opening greeting sent by the controller.
    pub fn control_start(greeting: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::ControlStart,
            data: greeting.into(),
        }
    }

    /// Builds the acknowledgement the controlled side replies with.
    pub fn control_ack(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::ControlAck,
            data: text.into(),
        }
    }

    /// Wraps a typed input event into the nested wire envelope.
    pub fn input_event(body: &EventBody) -> Result<Self, serde_json::Error> {
        let event = InputEvent::encode(body)?;
        Ok(Self {
            kind: MessageKind::InputEvent,
            data: serde_json::to_string(&event)?,
        })
    }

    /// Wraps raw JPEG bytes as a base64 screen frame message.
    pub fn screen_frame(jpeg: &[u8]) -> Self {
        Self {
            kind: MessageKind::ScreenFrame,
            data: crate::protocol::frame::encode_frame(jpeg),
        }
    }
}

// ── Inner input event envelope ────────────────────────────────────────────────

/// Kind tag of an [`InputEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Keyboard,
    MouseMove,
    MouseClick,
    MouseScroll,
    Other(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Keyboard => "keyboard",
            EventKind::MouseMove => "mouse_move",
            EventKind::MouseClick => "mouse_click",
            EventKind::MouseScroll => "mouse_scroll",
            EventKind::Other(s) => s,
        }
    }

    fn from_tag(tag: &str) -> Self {
        match tag {
            "keyboard" => EventKind::Keyboard,
            "mouse_move" => EventKind::MouseMove,
            "mouse_click" => EventKind::MouseClick,
            "mouse_scroll" => EventKind::MouseScroll,
            other => EventKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EventKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TagVisitor;

        impl<'de> Visitor<'de> for TagVisitor {
            type Value = EventKind;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an event kind string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<EventKind, E> {
                Ok(EventKind::from_tag(v))
            }
        }

        deserializer.deserialize_str(TagVisitor)
    }
}

/// The nested `{"type", "data"}` envelope carried inside an `input_event`
/// message.  `data` is the JSON of the typed body for `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub data: String,
}

/// Failure to turn an [`InputEvent`] envelope back into a typed body.
#[derive(Debug, Error)]
pub enum EventDecodeError {
    /// The event kind is not one this revision dispatches.
    #[error("unknown input event kind: {0}")]
    UnknownKind(String),
    /// The `data` field is not valid JSON for the tagged kind.
    #[error("malformed {kind} body: {source}")]
    BadBody {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl InputEvent {
    /// Serializes a typed body into the nested envelope.
    pub fn encode(body: &EventBody) -> Result<Self, serde_json::Error> {
        let (kind, data) = match body {
            EventBody::Keyboard(e) => (EventKind::Keyboard, serde_json::to_string(e)?),
            EventBody::MouseMove(e) => (EventKind::MouseMove, serde_json::to_string(e)?),
            EventBody::MouseClick(e) => (EventKind::MouseClick, serde_json::to_string(e)?),
            EventBody::MouseScroll(e) => (EventKind::MouseScroll, serde_json::to_string(e)?),
        };
        Ok(Self { kind, data })
    }

    /// Parses the nested `data` JSON into the typed body for this kind.
    pub fn body(&self) -> Result<EventBody, EventDecodeError> {
        fn parse<T: serde::de::DeserializeOwned>(
            kind: &'static str,
            data: &str,
        ) -> Result<T, EventDecodeError> {
            serde_json::from_str(data).map_err(|source| EventDecodeError::BadBody { kind, source })
        }

        match &self.kind {
            EventKind::Keyboard => Ok(EventBody::Keyboard(parse("keyboard", &self.data)?)),
            EventKind::MouseMove => Ok(EventBody::MouseMove(parse("mouse_move", &self.data)?)),
            EventKind::MouseClick => Ok(EventBody::MouseClick(parse("mouse_click", &self.data)?)),
            EventKind::MouseScroll => {
                Ok(EventBody::MouseScroll(parse("mouse_scroll", &self.data)?))
            }
            EventKind::Other(tag) => Err(EventDecodeError::UnknownKind(tag.clone())),
        }
    }
}

/// Typed union over all input event bodies.
#[derive(Debug, Clone, PartialEq)]
pub enum EventBody {
    Keyboard(KeyboardEvent),
    MouseMove(MouseMoveEvent),
    MouseClick(MouseClickEvent),
    MouseScroll(MouseScrollEvent),
}

// ── Typed event bodies ────────────────────────────────────────────────────────

/// Press or release of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyAction {
    Press,
    Release,
}

/// A modifier held while a non-modifier key transitioned.
///
/// Modifier keys never travel as `keyboard` events of their own; their state
/// rides along on the key that changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    Ctrl,
    Shift,
    Alt,
}

/// A keyboard key transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyboardEvent {
    /// Stable symbolic name (`"a"`..`"z"`, `"Return"`, `"space"`, …).
    pub key: String,
    pub action: KeyAction,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
}

impl KeyboardEvent {
    /// True when `m` is among the held modifiers.
    pub fn has_modifier(&self, m: Modifier) -> bool {
        self.modifiers.contains(&m)
    }
}

/// Absolute cursor position in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MouseMoveEvent {
    pub x: i32,
    pub y: i32,
}

/// A mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// What a [`MouseClickEvent`] does to its button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClickAction {
    Press,
    Release,
    /// A complete double click; the receiver synthesizes all four button
    /// transitions and the sender suppresses the trailing release.
    Double,
}

/// A mouse button transition at a screen position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MouseClickEvent {
    pub button: MouseButton,
    pub action: ClickAction,
    pub x: i32,
    pub y: i32,
    #[serde(rename = "isDouble", default)]
    pub is_double: bool,
}

/// Wheel motion in notches; positive `delta_y` scrolls up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MouseScrollEvent {
    #[serde(rename = "deltaX")]
    pub delta_x: i32,
    #[serde(rename = "deltaY")]
    pub delta_y: i32,
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_envelope_uses_capitalized_field_names() {
        let msg = Message::control_start("hello");
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"Type":"control_start","Data":"hello"}"#);
    }

    #[test]
    fn test_unknown_message_kind_survives_decode() {
        let json = r#"{"Type":"file_transfer","Data":"x"}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.kind, MessageKind::Other("file_transfer".to_string()));
        assert_eq!(msg.kind.as_str(), "file_transfer");
    }

    #[test]
    fn test_input_event_envelope_is_nested_json_string() {
        let body = EventBody::Keyboard(KeyboardEvent {
            key: "c".to_string(),
            action: KeyAction::Press,
            modifiers: vec![Modifier::Ctrl],
        });
        let msg = Message::input_event(&body).unwrap();
        assert_eq!(msg.kind, MessageKind::InputEvent);

        // The outer Data must itself be parseable as the inner envelope,
        // whose data is a third JSON document.
        let inner: InputEvent = serde_json::from_str(&msg.data).unwrap();
        assert_eq!(inner.kind, EventKind::Keyboard);
        assert!(inner.data.contains(r#""key":"c""#));
        assert_eq!(inner.body().unwrap(), body);
    }

    #[test]
    fn test_keyboard_event_round_trip() {
        let event = KeyboardEvent {
            key: "Return".to_string(),
            action: KeyAction::Release,
            modifiers: vec![Modifier::Ctrl, Modifier::Shift],
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""action":"release""#));
        assert!(json.contains(r#""modifiers":["ctrl","shift"]"#));
        let back: KeyboardEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_mouse_click_serializes_is_double_in_camel_case() {
        let event = MouseClickEvent {
            button: MouseButton::Left,
            action: ClickAction::Double,
            x: 10,
            y: 20,
            is_double: true,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""isDouble":true"#));
        assert!(json.contains(r#""action":"double""#));
        let back: MouseClickEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_mouse_click_is_double_defaults_to_false() {
        let json = r#"{"button":"right","action":"press","x":1,"y":2}"#;
        let event: MouseClickEvent = serde_json::from_str(json).unwrap();
        assert!(!event.is_double);
        assert_eq!(event.button, MouseButton::Right);
    }

    #[test]
    fn test_mouse_scroll_uses_camel_case_deltas() {
        let event = MouseScrollEvent {
            delta_x: 0,
            delta_y: 3,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"deltaX":0,"deltaY":3}"#);
    }

    #[test]
    fn test_unknown_event_kind_is_reported_not_fatal() {
        let event = InputEvent {
            kind: EventKind::Other("touch".to_string()),
            data: "{}".to_string(),
        };
        assert!(matches!(
            event.body(),
            Err(EventDecodeError::UnknownKind(tag)) if tag == "touch"
        ));
    }

    #[test]
    fn test_malformed_body_names_the_kind() {
        let event = InputEvent {
            kind: EventKind::MouseMove,
            data: "not json".to_string(),
        };
        let err = event.body().unwrap_err();
        assert!(err.to_string().contains("mouse_move"));
    }

    #[test]
    fn test_screen_frame_data_is_base64() {
        let msg = Message::screen_frame(&[0xFF, 0xD8, 0xFF, 0xE0]);
        assert_eq!(msg.kind, MessageKind::ScreenFrame);
        assert_eq!(msg.data, "/9j/4A==");
    }

    #[test]
    fn test_all_event_bodies_round_trip_through_the_envelope() {
        let bodies = [
            EventBody::Keyboard(KeyboardEvent {
                key: "z".to_string(),
                action: KeyAction::Press,
                modifiers: vec![],
            }),
            EventBody::MouseMove(MouseMoveEvent { x: -1, y: 2048 }),
            EventBody::MouseClick(MouseClickEvent {
                button: MouseButton::Middle,
                action: ClickAction::Release,
                x: 0,
                y: 0,
                is_double: false,
            }),
            EventBody::MouseScroll(MouseScrollEvent {
                delta_x: -2,
                delta_y: 1,
            }),
        ];
        for body in bodies {
            let envelope = InputEvent::encode(&body).unwrap();
            assert_eq!(envelope.body().unwrap(), body);
        }
    }
}
