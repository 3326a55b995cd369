//! Length-framed transport for [`Message`] values.
//!
//! Wire format:
//! ```text
//! [length:4, big-endian][body:N]
//! ```
//! where `body` is the UTF-8 JSON of the `{"Type", "Data"}` envelope.  The
//! frame is self-delimiting; a reader either yields a whole message or an
//! error, never a partial one.
//!
//! The functions are generic over tokio byte streams so the same codec runs
//! against a `TcpStream` half in production and a `duplex` pipe in tests.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::protocol::envelope::Message;

/// Ceiling on a single frame body.  A quality-60 JPEG of a large desktop is
/// a few MB after base64; anything near this limit is a corrupt length
/// prefix, not a real message.
pub const MAX_MESSAGE_LEN: usize = 32 * 1024 * 1024;

/// Errors surfaced by the framed codec.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The stream ended inside a length prefix or body.
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// The body was not valid JSON for the envelope.
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The length prefix exceeds [`MAX_MESSAGE_LEN`].
    #[error("frame of {len} bytes exceeds the {max} byte ceiling")]
    Oversize { len: usize, max: usize },

    /// Any other socket failure.
    #[error("stream error: {0}")]
    Io(std::io::Error),
}

impl From<std::io::Error> for WireError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            WireError::ConnectionClosed
        } else {
            WireError::Io(e)
        }
    }
}

/// Writes one framed message: length prefix, then body.
///
/// Returns once both writes have been accepted by the stream.
///
/// # Errors
///
/// [`WireError::Malformed`] if the envelope fails to serialize (should not
/// happen for well-formed messages), otherwise the underlying I/O error.
pub async fn send_message<W>(stream: &mut W, msg: &Message) -> Result<(), WireError>
where
    W: AsyncWrite + Unpin,
{
    let body = serde_json::to_vec(msg)?;
    if body.len() > MAX_MESSAGE_LEN {
        return Err(WireError::Oversize {
            len: body.len(),
            max: MAX_MESSAGE_LEN,
        });
    }

    let len = (body.len() as u32).to_be_bytes();
    stream.write_all(&len).await?;
    stream.write_all(&body).await?;
    Ok(())
}

/// Reads exactly one framed message.
///
/// # Errors
///
/// - [`WireError::ConnectionClosed`] when the peer closes mid-frame (or
///   before one starts),
/// - [`WireError::Oversize`] for an implausible length prefix,
/// - [`WireError::Malformed`] when the body is not envelope JSON.
pub async fn read_message<R>(stream: &mut R) -> Result<Message, WireError>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf).await?;

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_LEN {
        return Err(WireError::Oversize {
            len,
            max: MAX_MESSAGE_LEN,
        });
    }

    let mut body = vec![0u8; len];
    stream.read_exact(&mut body).await?;

    Ok(serde_json::from_slice(&body)?)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::envelope::{EventBody, MouseMoveEvent};

    async fn round_trip(msg: &Message) -> Message {
        let (mut client, mut server) = tokio::io::duplex(MAX_MESSAGE_LEN + 64);
        send_message(&mut client, msg).await.expect("send");
        read_message(&mut server).await.expect("receive")
    }

    #[tokio::test]
    async fn test_control_start_round_trip() {
        let msg = Message::control_start("Control session started");
        assert_eq!(round_trip(&msg).await, msg);
    }

    #[tokio::test]
    async fn test_input_event_round_trip() {
        let msg =
            Message::input_event(&EventBody::MouseMove(MouseMoveEvent { x: 800, y: 600 }))
                .unwrap();
        assert_eq!(round_trip(&msg).await, msg);
    }

    #[tokio::test]
    async fn test_screen_frame_round_trip() {
        let msg = Message::screen_frame(&[0u8; 4096]);
        assert_eq!(round_trip(&msg).await, msg);
    }

    #[tokio::test]
    async fn test_length_prefix_matches_body_length() {
        let msg = Message::control_ack("ok");
        let mut buf = Vec::new();
        send_message(&mut buf, &msg).await.unwrap();

        let declared = u32::from_be_bytes(buf[..4].try_into().unwrap()) as usize;
        assert_eq!(declared, buf.len() - 4);

        // And the body is plain UTF-8 JSON.
        let body: Message = serde_json::from_slice(&buf[4..]).unwrap();
        assert_eq!(body, msg);
    }

    #[tokio::test]
    async fn test_messages_arrive_in_fifo_order() {
        let (mut client, mut server) = tokio::io::duplex(1 << 16);
        for i in 0..10 {
            send_message(&mut client, &Message::control_start(format!("m{i}")))
                .await
                .unwrap();
        }
        for i in 0..10 {
            let msg = read_message(&mut server).await.unwrap();
            assert_eq!(msg.data, format!("m{i}"));
        }
    }

    #[tokio::test]
    async fn test_eof_before_any_frame_is_connection_closed() {
        let (client, mut server) = tokio::io::duplex(64);
        drop(client);
        let err = read_message(&mut server).await.unwrap_err();
        assert!(matches!(err, WireError::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_eof_inside_body_is_connection_closed() {
        let (mut client, mut server) = tokio::io::duplex(64);
        // Declare 100 bytes, deliver 3, then hang up.
        client.write_all(&100u32.to_be_bytes()).await.unwrap();
        client.write_all(b"abc").await.unwrap();
        drop(client);

        let err = read_message(&mut server).await.unwrap_err();
        assert!(matches!(err, WireError::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_non_json_body_is_malformed() {
        let (mut client, mut server) = tokio::io::duplex(64);
        let body = b"not json at all";
        client
            .write_all(&(body.len() as u32).to_be_bytes())
            .await
            .unwrap();
        client.write_all(body).await.unwrap();

        let err = read_message(&mut server).await.unwrap_err();
        assert!(matches!(err, WireError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_implausible_length_prefix_is_oversize() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client
            .write_all(&(u32::MAX).to_be_bytes())
            .await
            .unwrap();

        let err = read_message(&mut server).await.unwrap_err();
        assert!(matches!(err, WireError::Oversize { .. }));
    }
}
