//! End-to-end session tests over localhost TCP.
//!
//! These exercise the controller and responder through their public entry
//! points with the OS surfaces mocked out: a scripted input source, a
//! recording executor, and a canned screen source.  What they verify:
//!
//! - the `control_start` → `control_ack` handshake and the frame stream it
//!   starts;
//! - input events arriving at the executor in FIFO order;
//! - the stop hotkey ending the session without being forwarded;
//! - frame flooding being absorbed by bounded, newest-drop queues;
//! - all session tasks winding down once either end hangs up.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use peerdesk_app::capture::mock::MockInputCapture;
use peerdesk_app::executor::mock::{AppliedEvents, MockInputExecutor};
use peerdesk_app::screen::mock::MockScreenCapture;
use peerdesk_app::session::controller::run_controller;
use peerdesk_app::session::responder::{run_listener, ExecutorFactory, ScreenFactory};
use peerdesk_app::session::StopReason;
use peerdesk_app::sink::{ChannelSink, HeadlessSink};
use peerdesk_core::{
    decode_frame, read_message, send_message, ClickAction, EventBody, KeyAction, KeyboardEvent,
    Message, MessageKind, Modifier, MouseButton, MouseClickEvent, MouseMoveEvent,
};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

const TEST_FRAME: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46];

/// Starts a responder with mock OS surfaces; returns its address, the
/// shared executor record, the shared capture counter, and the stop token.
async fn spawn_responder() -> (SocketAddr, AppliedEvents, Arc<AtomicUsize>, CancellationToken) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");

    let applied: AppliedEvents = Arc::new(Mutex::new(Vec::new()));
    let captures = Arc::new(AtomicUsize::new(0));

    let applied_for_factory = Arc::clone(&applied);
    let executors: ExecutorFactory = Arc::new(move || {
        Ok(Box::new(MockInputExecutor::with_record(Arc::clone(
            &applied_for_factory,
        ))))
    });
    let captures_for_factory = Arc::clone(&captures);
    let screens: ScreenFactory = Arc::new(move || {
        Ok(Box::new(MockScreenCapture::with_counter(
            TEST_FRAME.to_vec(),
            Arc::clone(&captures_for_factory),
        )))
    });

    let stop = CancellationToken::new();
    tokio::spawn(run_listener(listener, executors, screens, stop.clone()));
    (addr, applied, captures, stop)
}

fn hotkey() -> EventBody {
    EventBody::Keyboard(KeyboardEvent {
        key: "b".to_string(),
        action: KeyAction::Press,
        modifiers: vec![Modifier::Ctrl, Modifier::Shift],
    })
}

async fn wait_for<F: Fn() -> bool>(what: &str, condition: F) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {what}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

// ── Handshake and frame stream ────────────────────────────────────────────────

#[tokio::test]
async fn test_handshake_acks_and_streams_frames() {
    let (addr, _applied, _captures, _stop) = spawn_responder().await;

    let mut stream = TcpStream::connect(addr).await.expect("connect");
    send_message(&mut stream, &Message::control_start("hello"))
        .await
        .expect("send control_start");

    // First reply is the acknowledgement.
    let ack = tokio::time::timeout(Duration::from_secs(1), read_message(&mut stream))
        .await
        .expect("ack within a second")
        .expect("read ack");
    assert_eq!(ack.kind, MessageKind::ControlAck);
    assert_eq!(ack.data, "Control session acknowledged");

    // Then frames start arriving at the tick cadence.
    let frame = tokio::time::timeout(Duration::from_secs(1), read_message(&mut stream))
        .await
        .expect("frame within a second")
        .expect("read frame");
    assert_eq!(frame.kind, MessageKind::ScreenFrame);
    assert_eq!(decode_frame(&frame.data).expect("valid base64"), TEST_FRAME);
}

#[tokio::test]
async fn test_input_events_reach_executor_in_order() {
    let (addr, applied, _captures, _stop) = spawn_responder().await;

    let mut stream = TcpStream::connect(addr).await.expect("connect");
    send_message(&mut stream, &Message::control_start("hello"))
        .await
        .expect("handshake");

    let script = [
        EventBody::Keyboard(KeyboardEvent {
            key: "c".to_string(),
            action: KeyAction::Press,
            modifiers: vec![Modifier::Ctrl],
        }),
        EventBody::Keyboard(KeyboardEvent {
            key: "c".to_string(),
            action: KeyAction::Release,
            modifiers: vec![Modifier::Ctrl],
        }),
        EventBody::MouseMove(MouseMoveEvent { x: 100, y: 200 }),
        EventBody::MouseClick(MouseClickEvent {
            button: MouseButton::Left,
            action: ClickAction::Double,
            x: 100,
            y: 200,
            is_double: true,
        }),
    ];
    for body in &script {
        let msg = Message::input_event(body).expect("encode");
        send_message(&mut stream, &msg).await.expect("send event");
    }

    let applied_check = Arc::clone(&applied);
    let script_len = script.len();
    wait_for("all events to apply", move || {
        applied_check.lock().unwrap().len() == script_len
    })
    .await;
    assert_eq!(applied.lock().unwrap().as_slice(), &script);
}

#[tokio::test]
async fn test_unknown_message_kinds_do_not_end_the_session() {
    let (addr, applied, _captures, _stop) = spawn_responder().await;

    let mut stream = TcpStream::connect(addr).await.expect("connect");
    send_message(&mut stream, &Message::control_start("hello"))
        .await
        .expect("handshake");

    // A kind from some future revision...
    let unknown = Message {
        kind: peerdesk_core::MessageKind::Other("clipboard_sync".to_string()),
        data: "{}".to_string(),
    };
    send_message(&mut stream, &unknown).await.expect("send");

    // ...does not stop the responder from applying the next real event.
    let event = EventBody::MouseMove(MouseMoveEvent { x: 5, y: 5 });
    let msg = Message::input_event(&event).expect("encode");
    send_message(&mut stream, &msg).await.expect("send event");

    let applied_check = Arc::clone(&applied);
    wait_for("event after unknown kind", move || {
        !applied_check.lock().unwrap().is_empty()
    })
    .await;
    assert_eq!(applied.lock().unwrap().as_slice(), &[event]);
}

// ── Controller behaviour ──────────────────────────────────────────────────────

/// A fake controlled peer that records every message it receives and
/// streams `frames` back after acknowledging the handshake.
async fn spawn_fake_peer(
    frames: Vec<Vec<u8>>,
) -> (SocketAddr, Arc<Mutex<Vec<Message>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let received: Arc<Mutex<Vec<Message>>> = Arc::new(Mutex::new(Vec::new()));

    let record = Arc::clone(&received);
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let (mut read_half, mut write_half) = stream.into_split();
        loop {
            let msg = match read_message(&mut read_half).await {
                Ok(msg) => msg,
                Err(_) => return,
            };
            let is_start = msg.kind == MessageKind::ControlStart;
            record.lock().unwrap().push(msg);
            if is_start {
                let ack = Message::control_ack("Control session acknowledged");
                if send_message(&mut write_half, &ack).await.is_err() {
                    return;
                }
                for frame in &frames {
                    if send_message(&mut write_half, &Message::screen_frame(frame))
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
            }
        }
    });

    (addr, received)
}

#[tokio::test]
async fn test_hotkey_stops_session_and_is_not_forwarded() {
    let (addr, received) = spawn_fake_peer(Vec::new()).await;

    let script = vec![
        EventBody::MouseMove(MouseMoveEvent { x: 10, y: 10 }),
        hotkey(),
        // Anything after the chord must never leave the controller.
        EventBody::MouseMove(MouseMoveEvent { x: 99, y: 99 }),
    ];
    let capture = Box::new(MockInputCapture::new(script));

    let reason = tokio::time::timeout(
        Duration::from_secs(5),
        run_controller(
            addr,
            capture,
            Box::new(HeadlessSink::new()),
            CancellationToken::new(),
        ),
    )
    .await
    .expect("session ends promptly")
    .expect("session ends cleanly");
    assert_eq!(reason, StopReason::Hotkey);

    // Let the fake peer drain whatever the controller flushed before the
    // socket closed, then inspect the record.
    let record = Arc::clone(&received);
    wait_for("the pre-hotkey event to arrive", move || {
        record
            .lock()
            .unwrap()
            .iter()
            .any(|m| m.kind == MessageKind::InputEvent)
    })
    .await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let messages = received.lock().unwrap();
    assert_eq!(messages[0].kind, MessageKind::ControlStart);

    let forwarded: Vec<&Message> = messages
        .iter()
        .filter(|m| m.kind == MessageKind::InputEvent)
        .collect();
    // Exactly the one pre-hotkey event was forwarded.
    assert_eq!(forwarded.len(), 1);
    assert!(forwarded[0].data.contains("mouse_move"));
    assert!(!messages.iter().any(|m| m.data.contains(r#""key":"b""#)));
}

#[tokio::test]
async fn test_wheel_events_from_sink_are_forwarded() {
    let (addr, received) = spawn_fake_peer(Vec::new()).await;

    let (sink, handles) = ChannelSink::new();
    let capture = Box::new(MockInputCapture::new(Vec::new()));

    let session = tokio::spawn(run_controller(
        addr,
        capture,
        Box::new(sink),
        CancellationToken::new(),
    ));

    handles
        .wheel
        .send(peerdesk_core::MouseScrollEvent {
            delta_x: 0,
            delta_y: -2,
        })
        .await
        .expect("inject wheel");

    let record = Arc::clone(&received);
    wait_for("wheel event on the wire", move || {
        record
            .lock()
            .unwrap()
            .iter()
            .any(|m| m.kind == MessageKind::InputEvent && m.data.contains("mouse_scroll"))
    })
    .await;

    // The sink-observed hotkey ends the session.
    handles.hotkey.send(()).await.expect("inject hotkey");
    let reason = tokio::time::timeout(Duration::from_secs(2), session)
        .await
        .expect("session ends")
        .expect("task joins")
        .expect("session ok");
    assert_eq!(reason, StopReason::Hotkey);
}

#[tokio::test]
async fn test_frame_flood_is_bounded_and_oldest_wins() {
    // 100 numbered frames blasted at the controller while the sink drains
    // slowly through its 2-slot queue.
    let frames: Vec<Vec<u8>> = (0u8..100).map(|n| vec![n]).collect();
    let (addr, _received) = spawn_fake_peer(frames).await;

    let (sink, mut handles) = ChannelSink::new();
    let capture = Box::new(MockInputCapture::new(Vec::new()));

    let session = tokio::spawn(run_controller(
        addr,
        capture,
        Box::new(sink),
        CancellationToken::new(),
    ));

    // Drain slowly; once the flood has passed through, the queue goes
    // quiet (the session itself stays up until the hotkey below).
    let mut seen: Vec<u8> = Vec::new();
    loop {
        match tokio::time::timeout(Duration::from_millis(300), handles.frames.recv()).await {
            Ok(Some(frame)) => {
                seen.push(frame[0]);
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            _ => break,
        }
    }

    // Bounded queues shed load by dropping the newest at overflow, so what
    // survives is in order, starts at the oldest frame, and is incomplete.
    assert!(!seen.is_empty());
    assert_eq!(seen[0], 0, "the oldest queued frame survives");
    assert!(seen.windows(2).all(|w| w[0] < w[1]), "order is preserved");
    assert!(seen.len() < 100, "flood must shed frames, got {}", seen.len());

    handles.hotkey.send(()).await.expect("stop session");
    let _ = tokio::time::timeout(Duration::from_secs(2), session)
        .await
        .expect("session winds down");
}

// ── Wind-down ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_responder_stops_capturing_after_peer_disconnects() {
    let (addr, _applied, captures, _stop) = spawn_responder().await;

    let mut stream = TcpStream::connect(addr).await.expect("connect");
    send_message(&mut stream, &Message::control_start("hello"))
        .await
        .expect("handshake");

    let captures_check = Arc::clone(&captures);
    wait_for("frame ticker to start", move || {
        captures_check.load(Ordering::Relaxed) > 0
    })
    .await;

    drop(stream);

    // Within the wind-down budget the ticker must stop capturing.
    tokio::time::sleep(Duration::from_millis(500)).await;
    let settled = captures.load(Ordering::Relaxed);
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(
        captures.load(Ordering::Relaxed),
        settled,
        "capture must stop after the peer disconnects"
    );
}

#[tokio::test]
async fn test_end_to_end_controller_against_responder() {
    let (addr, applied, _captures, _stop) = spawn_responder().await;

    let script = vec![
        EventBody::Keyboard(KeyboardEvent {
            key: "a".to_string(),
            action: KeyAction::Press,
            modifiers: vec![],
        }),
        EventBody::Keyboard(KeyboardEvent {
            key: "a".to_string(),
            action: KeyAction::Release,
            modifiers: vec![],
        }),
        hotkey(),
    ];
    let expected: Vec<EventBody> = script[..2].to_vec();
    let capture = Box::new(MockInputCapture::new(script));

    let reason = tokio::time::timeout(
        Duration::from_secs(5),
        run_controller(
            addr,
            capture,
            Box::new(HeadlessSink::new()),
            CancellationToken::new(),
        ),
    )
    .await
    .expect("session ends promptly")
    .expect("session ends cleanly");
    assert_eq!(reason, StopReason::Hotkey);

    let applied_check = Arc::clone(&applied);
    wait_for("events to reach the far executor", move || {
        applied_check.lock().unwrap().len() == 2
    })
    .await;
    assert_eq!(applied.lock().unwrap().as_slice(), &expected);
}
