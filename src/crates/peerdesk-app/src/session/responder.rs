//! The controlled side of a session: accept connections, inject received
//! input, and stream the screen back.
//!
//! The listener accepts any number of connections; each gets an
//! independent handler task with its own executor, ticker, and stop token.
//! Within one connection the socket write side is owned by a dedicated
//! writer task – both the acknowledgement and the frame stream go through
//! its queue, so no two tasks ever interleave a frame mid-write.

use std::net::SocketAddr;
use std::sync::Arc;

use peerdesk_core::{
    read_message, send_message, EventBody, InputEvent, Message, MessageKind, Role, Session,
    SessionState, WireError,
};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::executor::{ExecuteError, InputExecutor};
use crate::screen::{ScreenCapture, ScreenError};

use super::{wind_down, SessionError, FRAME_INTERVAL, OUTBOUND_QUEUE_CAPACITY};

/// Acknowledgement payload replied to `control_start`.
const CONTROL_ACK: &str = "Control session acknowledged";

/// Produces a fresh executor per connection.
pub type ExecutorFactory =
    Arc<dyn Fn() -> Result<Box<dyn InputExecutor>, ExecuteError> + Send + Sync>;

/// Produces a fresh screen capture per session.
pub type ScreenFactory =
    Arc<dyn Fn() -> Result<Box<dyn ScreenCapture>, ScreenError> + Send + Sync>;

/// Accept loop: every inbound connection gets an independent handler.
/// Runs until `stop` fires.
pub async fn run_listener(
    listener: TcpListener,
    executors: ExecutorFactory,
    screens: ScreenFactory,
    stop: CancellationToken,
) {
    loop {
        let accepted = tokio::select! {
            _ = stop.cancelled() => break,
            accepted = listener.accept() => accepted,
        };
        let (stream, peer) = match accepted {
            Ok(pair) => pair,
            Err(e) => {
                warn!("accept failed: {e}");
                continue;
            }
        };

        info!("connection accepted from {peer}, remote peer is taking control");
        let executors = Arc::clone(&executors);
        let screens = Arc::clone(&screens);
        let token = stop.child_token();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer, executors, screens, token).await {
                warn!("session with {peer} failed: {e}");
            }
            info!("connection closed with {peer}, control session ended");
        });
    }
}

/// Runs one controlled session over an accepted connection.
///
/// # Errors
///
/// A missing platform capability (no executor, no screen capture) and
/// stream corruption are session-fatal; a peer hang-up is a normal end.
pub async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    executors: ExecutorFactory,
    screens: ScreenFactory,
    stop: CancellationToken,
) -> Result<(), SessionError> {
    let mut executor = match executors() {
        Ok(executor) => executor,
        Err(e) => {
            error!("cannot create input executor: {e}");
            return Err(e.into());
        }
    };

    let mut session = Session::new(Role::Controlled, peer);
    let (mut read_half, write_half) = stream.into_split();
    let token = stop.child_token();

    let (out_tx, out_rx) = mpsc::channel::<Message>(OUTBOUND_QUEUE_CAPACITY);
    let writer = tokio::spawn(writer_loop(write_half, out_rx, token.clone()));
    let mut ticker: Option<JoinHandle<()>> = None;

    let outcome = loop {
        let result = tokio::select! {
            _ = token.cancelled() => break Ok(()),
            result = read_message(&mut read_half) => result,
        };

        let msg = match result {
            Ok(msg) => msg,
            Err(WireError::ConnectionClosed) => break Ok(()),
            Err(e) => break Err(SessionError::Wire(e)),
        };

        match msg.kind {
            MessageKind::ControlStart => {
                info!(session = %session.id, "control session started by {peer}");
                session.advance(SessionState::Active);
                if out_tx.send(Message::control_ack(CONTROL_ACK)).await.is_err() {
                    break Ok(()); // writer already gone
                }
                if ticker.is_none() {
                    let capture = match screens() {
                        Ok(capture) => capture,
                        Err(e) => {
                            error!("cannot start screen capture: {e}");
                            break Err(SessionError::Screen(e));
                        }
                    };
                    ticker = Some(tokio::spawn(frame_ticker(
                        capture,
                        out_tx.clone(),
                        token.clone(),
                    )));
                }
            }
            MessageKind::InputEvent => dispatch_input(&msg.data, executor.as_mut()).await,
            other => warn!("unknown message kind {other} from {peer}"),
        }
    };

    session.advance(SessionState::Stopping);
    token.cancel();
    drop(out_tx);
    let mut tasks = vec![("socket writer", writer)];
    if let Some(ticker) = ticker {
        tasks.push(("frame ticker", ticker));
    }
    wind_down(tasks).await;
    session.advance(SessionState::Terminated);
    outcome
}

/// Decodes one `input_event` payload and applies it.  Nothing here ends
/// the session: bad payloads and injection failures are logged and the
/// stream keeps flowing.
async fn dispatch_input(data: &str, executor: &mut dyn InputExecutor) {
    let envelope: InputEvent = match serde_json::from_str(data) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!("undecodable input event envelope: {e}");
            return;
        }
    };

    let body = match envelope.body() {
        Ok(body) => body,
        Err(e) => {
            warn!("{e}");
            return;
        }
    };

    let applied = match &body {
        EventBody::Keyboard(event) => executor.keyboard(event).await,
        EventBody::MouseMove(event) => executor.mouse_move(event).await,
        EventBody::MouseClick(event) => executor.mouse_click(event).await,
        EventBody::MouseScroll(event) => executor.mouse_scroll(event).await,
    };
    if let Err(e) = applied {
        warn!("failed to apply {} event: {e}", envelope.kind);
    }
}

/// Streams frames at the fixed cadence.  Capture overruns skip ticks
/// instead of catching up; capture failures are per-frame, send failures
/// end the session via the writer.
async fn frame_ticker(
    mut capture: Box<dyn ScreenCapture>,
    out: mpsc::Sender<Message>,
    stop: CancellationToken,
) {
    let mut ticks = tokio::time::interval(FRAME_INTERVAL);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
    debug!("frame ticker started at {FRAME_INTERVAL:?}");

    loop {
        tokio::select! {
            _ = stop.cancelled() => return,
            _ = ticks.tick() => {}
        }

        match capture.capture_jpeg().await {
            Ok(jpeg) => {
                if out.send(Message::screen_frame(&jpeg)).await.is_err() {
                    return; // writer gone, session is over
                }
            }
            Err(e) => warn!("screen capture failed: {e}"),
        }
    }
}

/// Owns the socket write half.  A send error terminates the whole session
/// by cancelling the shared token.
async fn writer_loop(
    mut write_half: OwnedWriteHalf,
    mut out: mpsc::Receiver<Message>,
    stop: CancellationToken,
) {
    loop {
        let msg = tokio::select! {
            _ = stop.cancelled() => return,
            msg = out.recv() => match msg {
                Some(msg) => msg,
                None => return,
            },
        };
        if let Err(e) = send_message(&mut write_half, &msg).await {
            warn!("send failed, ending session: {e}");
            stop.cancel();
            return;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
