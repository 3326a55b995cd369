//! Recording executor for tests.
//!
//! Captures every applied event in a shared vector so assertions can check
//! what reached "the OS", in what order.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use peerdesk_core::{
    EventBody, KeyboardEvent, MouseClickEvent, MouseMoveEvent, MouseScrollEvent,
};

use super::{ExecuteError, InputExecutor};

/// Shared record of applied events.
pub type AppliedEvents = Arc<Mutex<Vec<EventBody>>>;

/// Executor that records instead of injecting.
#[derive(Default)]
pub struct MockInputExecutor {
    applied: AppliedEvents,
}

impl MockInputExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Executor writing into an existing record, so a factory can hand the
    /// same record to every session it creates.
    pub fn with_record(applied: AppliedEvents) -> Self {
        Self { applied }
    }

    /// Handle for inspecting what was applied.
    pub fn applied(&self) -> AppliedEvents {
        Arc::clone(&self.applied)
    }

    fn push(&self, event: EventBody) {
        self.applied.lock().expect("mock poisoned").push(event);
    }
}

#[async_trait]
impl InputExecutor for MockInputExecutor {
    async fn keyboard(&mut self, event: &KeyboardEvent) -> Result<(), ExecuteError> {
        self.push(EventBody::Keyboard(event.clone()));
        Ok(())
    }

    async fn mouse_move(&mut self, event: &MouseMoveEvent) -> Result<(), ExecuteError> {
        self.push(EventBody::MouseMove(*event));
        Ok(())
    }

    async fn mouse_click(&mut self, event: &MouseClickEvent) -> Result<(), ExecuteError> {
        self.push(EventBody::MouseClick(*event));
        Ok(())
    }

    async fn mouse_scroll(&mut self, event: &MouseScrollEvent) -> Result<(), ExecuteError> {
        self.push(EventBody::MouseScroll(*event));
        Ok(())
    }
}
