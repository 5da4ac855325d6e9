//! Canonical log entry — the schema-independent form every frame decodes to.

use std::cmp::Ordering;
use std::fmt;

use bytes::Bytes;

/// Wire value of `OUT` in both frame schemas.
pub const WIRE_OUT: i32 = 1;
/// Wire value of `ERR` in both frame schemas.
pub const WIRE_ERR: i32 = 2;

const NANOS_PER_MILLI: i64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Stdout,
    Stderr,
}

impl MessageType {
    /// Total mapping from the wire enum: `OUT` is stdout, anything else stderr.
    pub fn from_wire(value: i32) -> Self {
        if value == WIRE_OUT {
            MessageType::Stdout
        } else {
            MessageType::Stderr
        }
    }

    pub fn to_wire(self) -> i32 {
        match self {
            MessageType::Stdout => WIRE_OUT,
            MessageType::Stderr => WIRE_ERR,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Stdout => "OUT",
            MessageType::Stderr => "ERR",
        }
    }
}

/// Convert a wire timestamp (nanoseconds) to milliseconds since the epoch.
///
/// Truncating division; pre-epoch values clamp to zero.
pub fn nanos_to_millis(nanos: i64) -> u64 {
    (nanos / NANOS_PER_MILLI).max(0) as u64
}

/// One application log line, normalized across wire schemas.
///
/// Fields are private so an entry cannot change after the parser builds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    app_id: String,
    message: Bytes,
    timestamp: u64,
    message_type: MessageType,
    source_label: String,
    source_index: String,
}

impl LogEntry {
    pub fn new(
        app_id: impl Into<String>,
        message: impl Into<Bytes>,
        timestamp: u64,
        message_type: MessageType,
        source_label: impl Into<String>,
        source_index: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            message: message.into(),
            timestamp,
            message_type,
            source_label: source_label.into(),
            source_index: source_index.into(),
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn message(&self) -> &Bytes {
        &self.message
    }

    /// Message payload as text; invalid UTF-8 is replaced, not rejected.
    pub fn message_text(&self) -> String {
        String::from_utf8_lossy(&self.message).into_owned()
    }

    /// Milliseconds since the epoch.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    pub fn source_label(&self) -> &str {
        &self.source_label
    }

    pub fn source_index(&self) -> &str {
        &self.source_index
    }
}

impl PartialOrd for LogEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Chronological first; the remaining fields only break ties so that `Ord`
// stays consistent with `Eq`.
impl Ord for LogEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| self.app_id.cmp(&other.app_id))
            .then_with(|| self.source_label.cmp(&other.source_label))
            .then_with(|| self.source_index.cmp(&other.source_index))
            .then_with(|| self.message.cmp(&other.message))
            .then_with(|| self.message_type.as_str().cmp(other.message_type.as_str()))
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}/{}] {} {}",
            self.timestamp,
            self.source_label,
            self.source_index,
            self.message_type.as_str(),
            String::from_utf8_lossy(&self.message).trim_end()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_out_is_stdout() {
        assert_eq!(MessageType::from_wire(WIRE_OUT), MessageType::Stdout);
    }

    #[test]
    fn test_message_type_everything_else_is_stderr() {
        for value in [WIRE_ERR, 0, 3, -1, i32::MAX, i32::MIN] {
            assert_eq!(MessageType::from_wire(value), MessageType::Stderr, "wire value {}", value);
        }
    }

    #[test]
    fn test_message_type_wire_round_trip() {
        assert_eq!(MessageType::from_wire(MessageType::Stdout.to_wire()), MessageType::Stdout);
        assert_eq!(MessageType::from_wire(MessageType::Stderr.to_wire()), MessageType::Stderr);
    }

    #[test]
    fn test_nanos_to_millis_truncates() {
        assert_eq!(nanos_to_millis(1_234_567_890_123), 1_234_567);
        assert_eq!(nanos_to_millis(2_000_000_000), 2000);
        assert_eq!(nanos_to_millis(999_999), 0);
    }

    #[test]
    fn test_nanos_to_millis_clamps_negative() {
        assert_eq!(nanos_to_millis(-5_000_000), 0);
    }

    #[test]
    fn test_entries_sort_chronologically() {
        let late = LogEntry::new("app", "b", 20, MessageType::Stdout, "APP", "0");
        let early = LogEntry::new("app", "a", 10, MessageType::Stdout, "APP", "0");
        let mut entries = vec![late.clone(), early.clone()];
        entries.sort();
        assert_eq!(entries, vec![early, late]);
    }

    #[test]
    fn test_display_format() {
        let entry = LogEntry::new("app", "hello\n", 2000, MessageType::Stderr, "STG", "1");
        assert_eq!(entry.to_string(), "2000 [STG/1] ERR hello");
    }

    #[test]
    fn test_message_text_lossy() {
        let entry = LogEntry::new("app", vec![0x68, 0xff], 0, MessageType::Stdout, "APP", "0");
        assert_eq!(entry.message_text(), "h\u{fffd}");
    }
}
