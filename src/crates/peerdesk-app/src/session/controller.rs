//! The controller side of a session: capture local input, forward it, and
//! feed inbound frames to the display sink.
//!
//! Task layout per session:
//!
//! ```text
//! capture backend ──events──▶ ┐
//! frame receiver ──frames──▶  ├─ main select loop ──messages──▶ socket
//! display sink ──hotkey/wheel▶┘
//! ```
//!
//! The main loop owns the socket write half; the frame receiver owns the
//! read half.  The inbound frame channel is bounded at 60 with newest-drop
//! overflow, so a stalled sink costs frames, never memory or latency.

use std::net::SocketAddr;

use peerdesk_core::{
    decode_frame, read_message, send_message, EventBody, KeyAction, Message, MessageKind,
    Modifier, MouseScrollEvent, Role, Session, SessionState,
};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::capture::{InputCapture, EVENT_CHANNEL_CAPACITY};
use crate::sink::{DisplaySink, HOTKEY_CAPACITY, WHEEL_CAPACITY};

use super::{wind_down, SessionError, StopReason, FRAME_CHANNEL_CAPACITY};

/// Greeting payload of the `control_start` message.
const CONTROL_GREETING: &str = "Control session started";

/// True for the key transition that terminates a session: Ctrl+Shift+B,
/// on the press.
pub fn is_stop_hotkey(body: &EventBody) -> bool {
    match body {
        EventBody::Keyboard(k) => {
            k.key == "b"
                && k.action == KeyAction::Press
                && k.has_modifier(Modifier::Ctrl)
                && k.has_modifier(Modifier::Shift)
        }
        _ => false,
    }
}

/// The sink's signal streams, normalized so the select loop always has a
/// receiver to poll.  A sink without a stream gets a placeholder channel
/// whose sender lives here – it stays silent and open for the session.
struct SinkSignals {
    hotkey: mpsc::Receiver<()>,
    wheel: mpsc::Receiver<MouseScrollEvent>,
    inline_hotkey: bool,
    _hotkey_keepalive: Option<mpsc::Sender<()>>,
    _wheel_keepalive: Option<mpsc::Sender<MouseScrollEvent>>,
}

impl SinkSignals {
    fn from_sink(sink: &mut dyn DisplaySink) -> Self {
        let (hotkey, inline_hotkey, _hotkey_keepalive) = match sink.take_hotkey_signal() {
            Some(rx) => (rx, false, None),
            None => {
                let (tx, rx) = mpsc::channel(HOTKEY_CAPACITY);
                (rx, true, Some(tx))
            }
        };
        let (wheel, _wheel_keepalive) = match sink.take_wheel_events() {
            Some(rx) => (rx, None),
            None => {
                let (tx, rx) = mpsc::channel(WHEEL_CAPACITY);
                (rx, Some(tx))
            }
        };
        Self {
            hotkey,
            wheel,
            inline_hotkey,
            _hotkey_keepalive,
            _wheel_keepalive,
        }
    }
}

/// Dials `peer` and runs a full controller session until the hotkey, the
/// stop token, or the connection ends it.
///
/// # Errors
///
/// Connection and handshake failures, and send errors while the session is
/// active.  A peer-initiated close is a normal end
/// ([`StopReason::ConnectionClosed`]), not an error.
pub async fn run_controller(
    peer: SocketAddr,
    mut capture: Box<dyn InputCapture>,
    mut sink: Box<dyn DisplaySink>,
    stop: CancellationToken,
) -> Result<StopReason, SessionError> {
    let stream = TcpStream::connect(peer)
        .await
        .map_err(|source| SessionError::Connect { addr: peer, source })?;
    let mut session = Session::new(Role::Controller, peer);
    info!(session = %session.id, "connected to {peer}, taking control");

    let (read_half, mut write_half) = stream.into_split();
    let token = stop.child_token();

    send_message(&mut write_half, &Message::control_start(CONTROL_GREETING)).await?;

    let (event_tx, mut event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    capture.start(event_tx, token.clone())?;

    let (frame_tx, mut frame_rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
    let receiver = tokio::spawn(frame_receiver(read_half, frame_tx, token.clone()));

    sink.show_fullscreen();
    let mut signals = SinkSignals::from_sink(sink.as_mut());

    session.advance(SessionState::Active);

    let outcome = loop {
        tokio::select! {
            maybe_event = event_rx.recv() => match maybe_event {
                Some(body) => {
                    if signals.inline_hotkey && is_stop_hotkey(&body) {
                        // The chord stops the session and is never forwarded.
                        break Ok(StopReason::Hotkey);
                    }
                    let msg = match Message::input_event(&body) {
                        Ok(msg) => msg,
                        Err(e) => break Err(SessionError::Encode(e)),
                    };
                    if let Err(e) = send_message(&mut write_half, &msg).await {
                        warn!("failed to send input event: {e}");
                        break Err(SessionError::Wire(e));
                    }
                }
                None => break Ok(StopReason::StopSignal),
            },

            maybe_frame = frame_rx.recv() => match maybe_frame {
                Some(jpeg) => sink.push_frame(jpeg),
                // The receiver task ended: EOF or a corrupt stream.
                None => break Ok(StopReason::ConnectionClosed),
            },

            maybe_hotkey = signals.hotkey.recv() => match maybe_hotkey {
                Some(()) => break Ok(StopReason::Hotkey),
                // The sink dropped its end: the viewer went away.
                None => break Ok(StopReason::StopSignal),
            },

            maybe_wheel = signals.wheel.recv() => match maybe_wheel {
                Some(scroll) => {
                    let msg = match Message::input_event(&EventBody::MouseScroll(scroll)) {
                        Ok(msg) => msg,
                        Err(e) => break Err(SessionError::Encode(e)),
                    };
                    if let Err(e) = send_message(&mut write_half, &msg).await {
                        warn!("failed to send wheel event: {e}");
                        break Err(SessionError::Wire(e));
                    }
                }
                None => break Ok(StopReason::StopSignal),
            },

            _ = token.cancelled() => break Ok(StopReason::StopSignal),
        }
    };

    session.advance(SessionState::Stopping);
    token.cancel();
    sink.hide();
    drop(write_half); // closes the socket together with the read half
    wind_down(vec![("frame receiver", receiver)]).await;
    session.advance(SessionState::Terminated);

    match &outcome {
        Ok(reason) => info!(session = %session.id, "control session ended: {reason}"),
        Err(e) => warn!(session = %session.id, "control session failed: {e}"),
    }
    outcome
}

/// Reads messages off the socket, decoding frames into the bounded frame
/// channel.  Exits on EOF, stream corruption, or cancellation; dropping the
/// frame sender is how the main loop learns the stream is gone.
async fn frame_receiver(
    mut read_half: OwnedReadHalf,
    frames: mpsc::Sender<Vec<u8>>,
    stop: CancellationToken,
) {
    loop {
        let result = tokio::select! {
            _ = stop.cancelled() => return,
            result = read_message(&mut read_half) => result,
        };

        let msg = match result {
            Ok(msg) => msg,
            Err(peerdesk_core::WireError::ConnectionClosed) => {
                debug!("peer closed the stream");
                return;
            }
            Err(e) => {
                warn!("failed to read message: {e}");
                return;
            }
        };

        match msg.kind {
            MessageKind::ScreenFrame => match decode_frame(&msg.data) {
                Ok(jpeg) => {
                    // try_send drops this newest frame when the buffer is
                    // full; a closed channel means the session is gone.
                    if let Err(mpsc::error::TrySendError::Closed(_)) = frames.try_send(jpeg) {
                        return;
                    }
                }
                Err(e) => {
                    warn!("corrupt frame payload: {e}");
                    return;
                }
            },
            MessageKind::ControlAck => debug!("control acknowledged by peer"),
            other => debug!("unexpected message kind {other}"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
