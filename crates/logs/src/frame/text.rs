//! Human-readable (JSON) rendering of both frame schemas.
//!
//! Used by diagnostic tooling. The shape mirrors the binary schemas:
//!
//! ```json
//! {"appId":"app-1","message":"hello","timestamp":2000000000,
//!  "messageType":"OUT","sourceLabel":"APP","sourceIndex":"0"}
//! ```
//!
//! Legacy documents use `sourceName` / `sourceId` instead. Unknown keys are
//! ignored, so a legacy document reads as a new-schema document with an
//! empty label, exactly like the binary layouts.

use serde::{Deserialize, Serialize};

use crate::error::FrameError;
use crate::model::{nanos_to_millis, LogEntry, MessageType};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextLogMessage {
    pub app_id: String,
    pub message: String,
    /// Nanoseconds since the epoch
    pub timestamp: i64,
    pub message_type: String,
    pub source_label: String,
    pub source_index: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextLegacyLogMessage {
    pub app_id: String,
    pub message: String,
    pub timestamp: i64,
    pub message_type: String,
    pub source_name: String,
    pub source_id: String,
}

fn text_message_type(value: &str) -> MessageType {
    if value.eq_ignore_ascii_case("OUT") {
        MessageType::Stdout
    } else {
        MessageType::Stderr
    }
}

impl TextLogMessage {
    pub fn decode(text: &str) -> Result<Self, FrameError> {
        Ok(serde_json::from_str(text)?)
    }
}

impl TextLegacyLogMessage {
    pub fn decode(text: &str) -> Result<Self, FrameError> {
        Ok(serde_json::from_str(text)?)
    }
}

impl From<TextLogMessage> for LogEntry {
    fn from(msg: TextLogMessage) -> Self {
        LogEntry::new(
            msg.app_id,
            msg.message,
            nanos_to_millis(msg.timestamp),
            text_message_type(&msg.message_type),
            msg.source_label,
            msg.source_index,
        )
    }
}

impl From<TextLegacyLogMessage> for LogEntry {
    fn from(msg: TextLegacyLogMessage) -> Self {
        LogEntry::new(
            msg.app_id,
            msg.message,
            nanos_to_millis(msg.timestamp),
            text_message_type(&msg.message_type),
            msg.source_name,
            msg.source_id,
        )
    }
}

/// Render an entry as a new-schema JSON document.
pub fn to_text_frame(entry: &LogEntry) -> String {
    let msg = TextLogMessage {
        app_id: entry.app_id().to_string(),
        message: entry.message_text(),
        timestamp: (entry.timestamp() as i64).saturating_mul(1_000_000),
        message_type: entry.message_type().as_str().to_string(),
        source_label: entry.source_label().to_string(),
        source_index: entry.source_index().to_string(),
    };
    // A struct of strings and integers always serializes.
    serde_json::to_string(&msg).unwrap_or_default()
}
