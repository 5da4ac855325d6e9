//! Listener — the callback surface a streaming session delivers to.

use tokio::sync::mpsc;

use crate::error::LogError;
use crate::model::LogEntry;

/// Receives the entries and signals of one streaming session.
///
/// The session's dispatch task is the only caller, so implementations never
/// see concurrent calls. Exactly one of `on_error`/`on_complete` is delivered
/// as the terminal signal; `on_error(LogError::Protocol)` for a single bad
/// frame is not terminal.
pub trait LogListener: Send + 'static {
    fn on_message(&mut self, entry: LogEntry);
    fn on_error(&mut self, error: LogError);
    fn on_complete(&mut self);
}

/// Listener callbacks as values, for consumers that prefer a channel.
#[derive(Debug)]
pub enum SessionEvent {
    Message(LogEntry),
    Error(LogError),
    Complete,
}

impl SessionEvent {
    pub fn is_terminal(&self) -> bool {
        match self {
            SessionEvent::Message(_) => false,
            SessionEvent::Error(LogError::Protocol(_)) => false,
            SessionEvent::Error(_) | SessionEvent::Complete => true,
        }
    }
}

// A dropped receiver just means nobody is listening any more.
impl LogListener for mpsc::UnboundedSender<SessionEvent> {
    fn on_message(&mut self, entry: LogEntry) {
        let _ = self.send(SessionEvent::Message(entry));
    }

    fn on_error(&mut self, error: LogError) {
        let _ = self.send(SessionEvent::Error(error));
    }

    fn on_complete(&mut self) {
        let _ = self.send(SessionEvent::Complete);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::parse_frame;
    use crate::model::MessageType;

    #[test]
    fn test_channel_listener_forwards_events() {
        let (mut tx, mut rx) = mpsc::unbounded_channel();
        tx.on_message(LogEntry::new("app", "x", 1, MessageType::Stdout, "APP", "0"));
        tx.on_complete();

        assert!(matches!(rx.try_recv(), Ok(SessionEvent::Message(_))));
        assert!(matches!(rx.try_recv(), Ok(SessionEvent::Complete)));
    }

    #[test]
    fn test_channel_listener_ignores_dropped_receiver() {
        let (mut tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        tx.on_complete();
    }

    #[test]
    fn test_protocol_error_is_not_terminal() {
        let frame_err = parse_frame(&[0xff, 0xff, 0xff]).unwrap_err();
        let event = SessionEvent::Error(LogError::Protocol(frame_err));
        assert!(!event.is_terminal());
        assert!(SessionEvent::Complete.is_terminal());
        assert!(SessionEvent::Error(LogError::Connection("x".into())).is_terminal());
    }
}
