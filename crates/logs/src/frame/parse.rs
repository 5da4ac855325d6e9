//! Dual-format frame parser.
//!
//! Try the new schema; accept it only when it names a source label. Otherwise
//! try the legacy schema. When both fail, the legacy error is the one
//! reported.

use prost::Message;
use tracing::trace;

use super::proto::{LegacyLogMessage, LogMessage};
use super::text::{TextLegacyLogMessage, TextLogMessage};
use crate::error::FrameError;
use crate::model::LogEntry;

/// Outcome of trying the new schema on a frame.
enum NewSchema {
    Accepted(LogEntry),
    Rejected,
}

fn decode_new(bytes: &[u8]) -> NewSchema {
    match LogMessage::decode(bytes) {
        Ok(msg) if !msg.source_type.is_empty() => NewSchema::Accepted(msg.into()),
        Ok(_) => {
            trace!("new-schema frame has no source label, trying legacy schema");
            NewSchema::Rejected
        }
        Err(e) => {
            trace!("new-schema decode failed ({}), trying legacy schema", e);
            NewSchema::Rejected
        }
    }
}

fn decode_legacy(bytes: &[u8]) -> Result<LogEntry, FrameError> {
    Ok(LegacyLogMessage::decode(bytes)?.into())
}

/// Decode one binary frame into a [`LogEntry`].
pub fn parse_frame(bytes: &[u8]) -> Result<LogEntry, FrameError> {
    match decode_new(bytes) {
        NewSchema::Accepted(entry) => Ok(entry),
        NewSchema::Rejected => decode_legacy(bytes),
    }
}

fn decode_new_text(text: &str) -> NewSchema {
    match TextLogMessage::decode(text) {
        Ok(msg) if !msg.source_label.is_empty() => NewSchema::Accepted(msg.into()),
        _ => NewSchema::Rejected,
    }
}

fn decode_legacy_text(text: &str) -> Result<LogEntry, FrameError> {
    Ok(TextLegacyLogMessage::decode(text)?.into())
}

/// Decode one textual (JSON) frame into a [`LogEntry`].
pub fn parse_text_frame(text: &str) -> Result<LogEntry, FrameError> {
    match decode_new_text(text) {
        NewSchema::Accepted(entry) => Ok(entry),
        NewSchema::Rejected => decode_legacy_text(text),
    }
}
