//! Session orchestration: the controller and responder sides of the
//! protocol, their channel plumbing, and shared wind-down.
//!
//! A session spawns several concurrent tasks (capture, frame receiver or
//! ticker, socket writer, the main select loop) that all share one
//! cancellation token.  Cancelling the token is the single stop signal:
//! every task selects on it, and the teardown path waits for each task
//! within a bounded budget before abandoning it.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use peerdesk_core::WireError;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::capture::CaptureError;
use crate::executor::ExecuteError;
use crate::screen::ScreenError;

pub mod controller;
pub mod responder;

/// Interval of the controlled side's frame ticker (~20 fps).  A tick whose
/// capture or send overruns is skipped, never caught up.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(50);

/// Inbound frame buffer on the controller; the newest frame is dropped on
/// overflow so latency stays bounded.
pub const FRAME_CHANNEL_CAPACITY: usize = 60;

/// Outbound message queue between producers and the socket writer task.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 8;

/// How long teardown waits for each spawned task before abandoning it.
pub const WIND_DOWN_BUDGET: Duration = Duration::from_secs(2);

/// Why a controller session ended normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The user pressed the stop hotkey (Ctrl+Shift+B).
    Hotkey,
    /// The caller's stop token fired.
    StopSignal,
    /// The peer closed the connection or the stream broke.
    ConnectionClosed,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Hotkey => f.write_str("stop hotkey"),
            StopReason::StopSignal => f.write_str("stop signal"),
            StopReason::ConnectionClosed => f.write_str("connection closed"),
        }
    }
}

/// Error type for session orchestration.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error("event serialization failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Executor(#[from] ExecuteError),

    #[error(transparent)]
    Screen(#[from] ScreenError),
}

/// Awaits each named task up to [`WIND_DOWN_BUDGET`], aborting stragglers.
pub(crate) async fn wind_down(tasks: Vec<(&'static str, JoinHandle<()>)>) {
    for (name, mut handle) in tasks {
        match tokio::time::timeout(WIND_DOWN_BUDGET, &mut handle).await {
            Ok(_) => {}
            Err(_) => {
                warn!("{name} task did not wind down in time, aborting");
                handle.abort();
            }
        }
    }
}
