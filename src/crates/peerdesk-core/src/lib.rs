//! # peerdesk-core
//!
//! Shared library for peerdesk containing the network protocol codec, the
//! input event model, key code translation tables, and session domain types.
//!
//! This crate is used by both roles of a control session (the controller and
//! the controlled host – the roles are symmetric, every peer can play
//! either).  It has zero dependencies on OS APIs, UI frameworks, or network
//! sockets; the only async surface is the generic byte-stream codec.
//!
//! The crate defines:
//!
//! - **`protocol`** – How bytes travel over the network.  Every message is a
//!   `{"Type", "Data"}` JSON envelope framed by a 4-byte big-endian length
//!   prefix.  Input events nest a second `{"type", "data"}` envelope inside
//!   `Data`; screen frames carry base64-encoded JPEG bytes.
//!
//! - **`keymap`** – Translation tables between the symbolic key names used
//!   on the wire (`"a"`, `"Return"`, `"Control_L"`, …) and platform key
//!   codes: Windows virtual-key codes and X11 keycodes.
//!
//! - **`session`** – The per-connection session record and its one-way
//!   state machine.

pub mod keymap;
pub mod protocol;
pub mod session;

pub use protocol::envelope::{
    ClickAction, EventBody, InputEvent, KeyAction, KeyboardEvent, Message, MessageKind, Modifier,
    MouseButton, MouseClickEvent, MouseMoveEvent, MouseScrollEvent,
};
pub use protocol::frame::{decode_frame, encode_frame};
pub use protocol::wire::{read_message, send_message, WireError, MAX_MESSAGE_LEN};
pub use session::{Role, Session, SessionState};

/// Default TCP port a peer listens on and dials.
pub const DEFAULT_PORT: u16 = 8080;
