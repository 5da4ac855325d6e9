//! Protobuf layouts of the two log frame schemas.
//!
//! Both share tags 1–4. The new schema carries the emitting component in
//! `source_type` (tag 5); the legacy schema has no tag 5 and names the
//! component in `source_name` (tag 8). A legacy frame therefore decodes under
//! the new layout with an empty label, which is what drives the fallback.

use prost::Message;

use crate::model::{nanos_to_millis, LogEntry, MessageType};

#[derive(Clone, PartialEq, Message)]
pub struct LogMessage {
    #[prost(bytes = "vec", tag = "1")]
    pub message: Vec<u8>,
    /// `OUT = 1`, `ERR = 2`
    #[prost(int32, tag = "2")]
    pub message_type: i32,
    /// Nanoseconds since the epoch
    #[prost(int64, tag = "3")]
    pub timestamp: i64,
    #[prost(string, tag = "4")]
    pub app_id: String,
    #[prost(string, tag = "5")]
    pub source_type: String,
    #[prost(string, tag = "6")]
    pub source_instance: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct LegacyLogMessage {
    #[prost(bytes = "vec", tag = "1")]
    pub message: Vec<u8>,
    #[prost(int32, tag = "2")]
    pub message_type: i32,
    #[prost(sint64, tag = "3")]
    pub timestamp: i64,
    #[prost(string, tag = "4")]
    pub app_id: String,
    #[prost(string, tag = "6")]
    pub source_id: String,
    #[prost(string, repeated, tag = "7")]
    pub drain_urls: Vec<String>,
    #[prost(string, tag = "8")]
    pub source_name: String,
}

impl From<LogMessage> for LogEntry {
    fn from(msg: LogMessage) -> Self {
        LogEntry::new(
            msg.app_id,
            msg.message,
            nanos_to_millis(msg.timestamp),
            MessageType::from_wire(msg.message_type),
            msg.source_type,
            msg.source_instance,
        )
    }
}

impl From<LegacyLogMessage> for LogEntry {
    fn from(msg: LegacyLogMessage) -> Self {
        LogEntry::new(
            msg.app_id,
            msg.message,
            nanos_to_millis(msg.timestamp),
            MessageType::from_wire(msg.message_type),
            msg.source_name,
            msg.source_id,
        )
    }
}

impl From<&LogEntry> for LogMessage {
    fn from(entry: &LogEntry) -> Self {
        LogMessage {
            message: entry.message().to_vec(),
            message_type: entry.message_type().to_wire(),
            timestamp: (entry.timestamp() as i64).saturating_mul(1_000_000),
            app_id: entry.app_id().to_string(),
            source_type: entry.source_label().to_string(),
            source_instance: entry.source_index().to_string(),
        }
    }
}

/// Serialize an entry as a new-schema binary frame.
pub fn encode_frame(entry: &LogEntry) -> Vec<u8> {
    LogMessage::from(entry).encode_to_vec()
}
