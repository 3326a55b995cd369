//! # peerdesk-app
//!
//! The peerdesk application: a symmetric LAN remote-control peer.  Every
//! instance listens for inbound control sessions (the *controlled* role)
//! while its CLI lets the user pick a discovered peer and take control of
//! it (the *controller* role).
//!
//! Module map:
//!
//! - **`capture`** – turns local keyboard/mouse activity into the wire
//!   event model, per platform.
//! - **`executor`** – injects received events into the local OS, per
//!   platform.
//! - **`screen`** – captures the primary display as JPEG.
//! - **`sink`** – the display-sink contract the controller pushes inbound
//!   frames to, and receives hotkey/wheel signals from.
//! - **`session`** – the orchestrator: controller and responder sides of
//!   the protocol, state machine, channel plumbing, wind-down.
//! - **`cli`** – the interactive peer-selection prompt.
//! - **`config`** – TOML configuration.

pub mod capture;
pub mod cli;
pub mod config;
pub mod executor;
pub mod screen;
pub mod session;
pub mod sink;
