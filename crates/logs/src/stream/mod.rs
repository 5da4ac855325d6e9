//! Stream module — live log streaming over WebSocket: connect, dispatch,
//! keep-alive, cancellation.

pub mod connect;
pub mod dispatch;
pub mod keepalive;
pub mod listener;
pub mod session;

pub use connect::{EventStream, LogStreamConnector, StreamKind};
pub use listener::{LogListener, SessionEvent};
pub use session::{SessionState, StreamingSession};
