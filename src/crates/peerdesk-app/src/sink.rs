//! The display sink: where inbound frames go and where hotkey/wheel
//! signals come from.
//!
//! The orchestrator is agnostic to what actually renders frames – a native
//! fullscreen window, a web view, or nothing at all.  The contract is
//! narrow: frames are pushed without blocking (a slow renderer loses
//! frames, never stalls the session), and the sink may expose two small
//! signal streams back into the session: the stop hotkey and wheel events
//! observed at the window level.
//!
//! When a sink exposes no hotkey stream, the controller watches for the
//! hotkey inline in the captured key events instead.

use peerdesk_core::MouseScrollEvent;
use tokio::sync::mpsc;
use tracing::trace;

/// Sink-side frame queue depth; the newest frame is dropped on overflow.
pub const SINK_FRAME_CAPACITY: usize = 2;

/// Hotkey signal queue depth; the signal is idempotent so one slot is enough.
pub const HOTKEY_CAPACITY: usize = 1;

/// Wheel event queue depth.
pub const WHEEL_CAPACITY: usize = 10;

/// Contract between the session orchestrator and a frame renderer.
pub trait DisplaySink: Send {
    /// Puts the sink's surface up (fullscreen on graphical sinks).
    fn show_fullscreen(&mut self);

    /// Tears the surface down again.
    fn hide(&mut self);

    /// Hands the sink one decoded JPEG frame.  Never blocks; the sink drops
    /// the frame if its queue is full.
    fn push_frame(&mut self, jpeg: Vec<u8>);

    /// The stop-hotkey stream, if this sink observes the hotkey itself.
    /// Callable once; subsequent calls return `None`.
    fn take_hotkey_signal(&mut self) -> Option<mpsc::Receiver<()>>;

    /// The wheel event stream, if this sink observes wheel input.
    /// Callable once; subsequent calls return `None`.
    fn take_wheel_events(&mut self) -> Option<mpsc::Receiver<MouseScrollEvent>>;
}

// ── Headless sink ─────────────────────────────────────────────────────────────

/// Sink for running without any viewer: frames are discarded and no
/// signals are produced, which makes the controller fall back to inline
/// hotkey detection.
#[derive(Default)]
pub struct HeadlessSink {
    frames_dropped: u64,
}

impl HeadlessSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DisplaySink for HeadlessSink {
    fn show_fullscreen(&mut self) {}

    fn hide(&mut self) {
        if self.frames_dropped > 0 {
            trace!("headless sink discarded {} frames", self.frames_dropped);
        }
    }

    fn push_frame(&mut self, _jpeg: Vec<u8>) {
        self.frames_dropped += 1;
    }

    fn take_hotkey_signal(&mut self) -> Option<mpsc::Receiver<()>> {
        None
    }

    fn take_wheel_events(&mut self) -> Option<mpsc::Receiver<MouseScrollEvent>> {
        None
    }
}

// ── Channel sink ──────────────────────────────────────────────────────────────

/// Test/embedding handles for a [`ChannelSink`].
pub struct ChannelSinkHandles {
    /// Frames the sink accepted (bounded at [`SINK_FRAME_CAPACITY`]).
    pub frames: mpsc::Receiver<Vec<u8>>,
    /// Inject a hotkey signal.
    pub hotkey: mpsc::Sender<()>,
    /// Inject wheel events.
    pub wheel: mpsc::Sender<MouseScrollEvent>,
}

/// Sink backed by plain channels: what a graphical shell builds on, and
/// what the integration tests observe the session through.
pub struct ChannelSink {
    frames: mpsc::Sender<Vec<u8>>,
    hotkey: Option<mpsc::Receiver<()>>,
    wheel: Option<mpsc::Receiver<MouseScrollEvent>>,
    visible: bool,
}

impl ChannelSink {
    pub fn new() -> (Self, ChannelSinkHandles) {
        let (frames_tx, frames_rx) = mpsc::channel(SINK_FRAME_CAPACITY);
        let (hotkey_tx, hotkey_rx) = mpsc::channel(HOTKEY_CAPACITY);
        let (wheel_tx, wheel_rx) = mpsc::channel(WHEEL_CAPACITY);
        (
            Self {
                frames: frames_tx,
                hotkey: Some(hotkey_rx),
                wheel: Some(wheel_rx),
                visible: false,
            },
            ChannelSinkHandles {
                frames: frames_rx,
                hotkey: hotkey_tx,
                wheel: wheel_tx,
            },
        )
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

impl DisplaySink for ChannelSink {
    fn show_fullscreen(&mut self) {
        self.visible = true;
    }

    fn hide(&mut self) {
        self.visible = false;
    }

    fn push_frame(&mut self, jpeg: Vec<u8>) {
        // Latest-wins under backpressure: a full queue loses this frame.
        if self.frames.try_send(jpeg).is_err() {
            trace!("sink queue full, frame dropped");
        }
    }

    fn take_hotkey_signal(&mut self) -> Option<mpsc::Receiver<()>> {
        self.hotkey.take()
    }

    fn take_wheel_events(&mut self) -> Option<mpsc::Receiver<MouseScrollEvent>> {
        self.wheel.take()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
