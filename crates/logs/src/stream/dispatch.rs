//! Dispatch — turn inbound WebSocket messages into listener callbacks.
//!
//! The dispatcher owns the listener and guards the terminal signal, so a
//! session can report completion or failure at most once no matter which
//! path (close frame, transport error, cancellation) gets there first.

use std::sync::Arc;

use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, info, trace, warn};

use super::listener::LogListener;
use crate::error::LogError;
use crate::frame::parse_frame;
use crate::metrics::StreamMetrics;

/// Close code used when the peer vanished without a close handshake.
pub const ABNORMAL_CLOSURE: u16 = 1006;

/// Whether the dispatch loop should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

pub struct Dispatcher<L: LogListener> {
    listener: L,
    metrics: Arc<StreamMetrics>,
    terminated: bool,
}

impl<L: LogListener> Dispatcher<L> {
    pub fn new(listener: L, metrics: Arc<StreamMetrics>) -> Self {
        Self {
            listener,
            metrics,
            terminated: false,
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Handle one inbound message.
    pub fn handle(&mut self, message: Message) -> Flow {
        if self.terminated {
            return Flow::Stop;
        }
        match message {
            Message::Binary(bytes) => {
                self.on_binary(&bytes);
                Flow::Continue
            }
            Message::Close(frame) => {
                self.on_close(frame);
                Flow::Stop
            }
            Message::Text(_) | Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {
                trace!("Ignoring non-payload WebSocket message");
                Flow::Continue
            }
        }
    }

    fn on_binary(&mut self, bytes: &[u8]) {
        self.metrics.record_frame(bytes.len());
        match parse_frame(bytes) {
            Ok(entry) => {
                debug!(
                    app_id = entry.app_id(),
                    source = entry.source_label(),
                    "Delivering log entry"
                );
                self.metrics.record_entry();
                self.listener.on_message(entry);
            }
            Err(e) => {
                debug!("Dropping malformed frame ({} bytes): {}", bytes.len(), e);
                self.metrics.record_protocol_error();
                self.listener.on_error(LogError::Protocol(e));
            }
        }
    }

    fn on_close(&mut self, frame: Option<CloseFrame<'static>>) {
        match frame {
            None => {
                info!("Log stream closed by server");
                self.complete();
            }
            Some(frame) if matches!(frame.code, CloseCode::Normal | CloseCode::Away) => {
                info!("Log stream closed by server ({})", frame.code);
                self.complete();
            }
            Some(frame) => {
                let code = u16::from(frame.code);
                warn!("Log stream closed abnormally: code={}, reason={}", code, frame.reason);
                self.fail(LogError::AbnormalClosure {
                    code,
                    reason: frame.reason.into_owned(),
                });
            }
        }
    }

    /// The transport failed outside a close handshake.
    pub fn transport_error(&mut self, err: WsError) {
        match err {
            WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake) => self.stream_ended(),
            other => {
                warn!("Log stream transport error: {}", other);
                self.fail(LogError::from(other));
            }
        }
    }

    /// The inbound stream ended without a close frame.
    pub fn stream_ended(&mut self) {
        warn!("Log stream ended without a close frame");
        self.fail(LogError::AbnormalClosure {
            code: ABNORMAL_CLOSURE,
            reason: "connection dropped without close frame".to_string(),
        });
    }

    /// Deliver `on_complete` unless a terminal signal already went out.
    pub fn complete(&mut self) {
        if !self.terminated {
            self.terminated = true;
            self.listener.on_complete();
        }
    }

    fn fail(&mut self, err: LogError) {
        if !self.terminated {
            self.terminated = true;
            self.listener.on_error(err);
        }
    }
}
