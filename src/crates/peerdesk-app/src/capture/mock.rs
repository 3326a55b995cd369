//! Scripted input source for tests.
//!
//! Plays back a fixed list of events with an optional gap between them,
//! then keeps the channel open until the stop token fires – a real capture
//! backend goes quiet when the user's hands rest, it does not hang up.

use std::time::Duration;

use peerdesk_core::EventBody;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{CaptureError, InputCapture};

/// Replays `events` in order, then idles until cancelled.
pub struct MockInputCapture {
    events: Vec<EventBody>,
    gap: Duration,
}

impl MockInputCapture {
    pub fn new(events: Vec<EventBody>) -> Self {
        Self {
            events,
            gap: Duration::from_millis(1),
        }
    }

    /// Overrides the pause between replayed events.
    pub fn with_gap(mut self, gap: Duration) -> Self {
        self.gap = gap;
        self
    }
}

impl InputCapture for MockInputCapture {
    fn start(
        &mut self,
        events: mpsc::Sender<EventBody>,
        stop: CancellationToken,
    ) -> Result<(), CaptureError> {
        let script = std::mem::take(&mut self.events);
        let gap = self.gap;
        tokio::spawn(async move {
            for event in script {
                if stop.is_cancelled() {
                    return;
                }
                if events.send(event).await.is_err() {
                    return;
                }
                tokio::time::sleep(gap).await;
            }
            // Hold the sender open so the consumer sees an idle stream,
            // not a closed one.
            stop.cancelled().await;
        });
        Ok(())
    }
}
