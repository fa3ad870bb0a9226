//! Push-only, ordered channel from a generation session to its caller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::progress::event::ProgressEvent;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EmitError {
    #[error("stream already ended with a terminal event")]
    Terminated,
    #[error("receiver disconnected")]
    Disconnected,
}

/// Sending half of a progress stream. Clones share the terminal and cancellation state.
///
/// Events are delivered immediately in the order they are emitted. Once a terminal event
/// (`result` or `error`) has been sent, every further emit is refused.
#[derive(Clone)]
pub struct ProgressEmitter {
    sender: UnboundedSender<ProgressEvent>,
    terminated: Arc<AtomicBool>,
    cancelled: Arc<AtomicBool>,
}

impl ProgressEmitter {
    pub fn channel() -> (Self, UnboundedReceiver<ProgressEvent>) {
        let (sender, receiver) = unbounded_channel();
        (
            Self {
                sender,
                terminated: Arc::new(AtomicBool::new(false)),
                cancelled: Arc::new(AtomicBool::new(false)),
            },
            receiver,
        )
    }

    pub fn emit(&self, event: ProgressEvent) -> Result<(), EmitError> {
        let terminal = event.is_terminal();
        if terminal {
            if self.terminated.swap(true, Ordering::SeqCst) {
                warn!(kind = event.kind(), "dropping event after terminal event");
                return Err(EmitError::Terminated);
            }
        } else if self.terminated.load(Ordering::SeqCst) {
            warn!(kind = event.kind(), "dropping event after terminal event");
            return Err(EmitError::Terminated);
        }
        debug!(kind = event.kind(), "progress event");
        self.sender
            .send(event)
            .map_err(|_| EmitError::Disconnected)
    }

    /// Emit and log instead of failing; the session keeps going until its next checkpoint.
    pub fn emit_best_effort(&self, event: ProgressEvent) {
        if let Err(err) = self.emit(event) {
            debug!(error = %err, "progress event not delivered");
        }
    }

    pub fn status(&self, message: impl Into<String>) {
        self.emit_best_effort(ProgressEvent::status(message));
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// True once the caller cancelled or dropped the receiving half.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst) || self.sender.is_closed()
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }
}

/// Drain everything currently buffered in a receiver.
pub fn drain(receiver: &mut UnboundedReceiver<ProgressEvent>) -> Vec<ProgressEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}
