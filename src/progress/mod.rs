//! Progress stream primitives.

pub mod emitter;
pub mod event;
pub mod session;

pub use emitter::{drain, EmitError, ProgressEmitter};
pub use event::ProgressEvent;
pub use session::{new_session_id, now_millis, SessionStatus};
