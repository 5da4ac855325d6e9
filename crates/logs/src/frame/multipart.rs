//! Legacy multipart batch parser.
//!
//! A single HTTP response carries many frames, one per multipart part:
//!
//! ```text
//! --BOUNDARY\r\n
//! \r\n
//! <frame bytes>\r\n
//! --BOUNDARY\r\n
//! \r\n
//! <frame bytes>\r\n
//! --BOUNDARY--\r\n
//! ```
//!
//! Unlike the streaming dispatcher, one malformed part fails the whole batch.

use tracing::debug;

use super::parse::parse_frame;
use crate::error::{LogError, Result};
use crate::model::LogEntry;

const CRLF: &[u8] = b"\r\n";
const DOUBLE_DASH: &[u8] = b"--";

/// Pull the `boundary` parameter out of a `multipart/*` content type.
pub fn extract_boundary(content_type: &str) -> Result<String> {
    let mut params = content_type.split(';');
    let media_type = params.next().unwrap_or_default().trim();
    if !media_type.to_ascii_lowercase().starts_with("multipart/") {
        return Err(LogError::InvalidMultipart(format!(
            "Content-Type {} is not multipart",
            content_type
        )));
    }

    params
        .filter_map(|param| {
            let (name, value) = param.split_once('=')?;
            name.trim()
                .eq_ignore_ascii_case("boundary")
                .then(|| value.trim().trim_matches('"').to_string())
        })
        .find(|boundary| !boundary.is_empty())
        .ok_or_else(|| {
            LogError::InvalidMultipart(format!(
                "Content-Type {} does not contain a valid multipart boundary",
                content_type
            ))
        })
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}

// Only CRLF is stripped: a bare `\n` is a valid first or last byte of a frame.
fn strip_line_break_prefix(part: &[u8]) -> &[u8] {
    part.strip_prefix(CRLF).unwrap_or(part)
}

fn strip_line_break_suffix(part: &[u8]) -> &[u8] {
    part.strip_suffix(CRLF).unwrap_or(part)
}

/// A header line looks like `Name: value` with a token-ish name.
fn starts_with_header(part: &[u8]) -> bool {
    let name_len = part
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || **b == b'-')
        .count();
    name_len > 0 && part.get(name_len) == Some(&b':')
}

/// Drop the part's header block, which ends with an empty line.
fn strip_headers(part: &[u8]) -> &[u8] {
    if let Some(body) = part.strip_prefix(CRLF) {
        return body;
    }
    if starts_with_header(part) {
        if let Some(end) = find(part, b"\r\n\r\n", 0) {
            return &part[end + 4..];
        }
    }
    part
}

/// Split a multipart body into the raw bytes of each non-empty part.
pub fn split_parts<'a>(body: &'a [u8], boundary: &str) -> Vec<&'a [u8]> {
    let mut delimiter = DOUBLE_DASH.to_vec();
    delimiter.extend_from_slice(boundary.as_bytes());

    let mut parts = Vec::new();
    let Some(first) = find(body, &delimiter, 0) else {
        return parts;
    };
    let mut cursor = first + delimiter.len();

    loop {
        if body[cursor..].starts_with(DOUBLE_DASH) {
            break;
        }
        let next = find(body, &delimiter, cursor);
        let end = next.unwrap_or(body.len());

        let part = strip_line_break_prefix(&body[cursor..end]);
        let part = strip_line_break_suffix(strip_headers(part));
        if !part.is_empty() {
            parts.push(part);
        }

        match next {
            Some(pos) => cursor = pos + delimiter.len(),
            None => break,
        }
    }
    parts
}

/// Parse every part of a multipart batch into entries, in order.
pub fn parse_multipart(content_type: &str, body: &[u8]) -> Result<Vec<LogEntry>> {
    let boundary = extract_boundary(content_type)?;
    let parts = split_parts(body, &boundary);
    debug!("Parsing multipart batch: {} parts, boundary={}", parts.len(), boundary);

    parts
        .into_iter()
        .map(|part| parse_frame(part).map_err(LogError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::proto::encode_frame;
    use crate::model::MessageType;

    const BOUNDARY: &str = "7ab3b2f6";

    fn entry(ts: u64, text: &str) -> LogEntry {
        LogEntry::new("app-1", text.to_string(), ts, MessageType::Stdout, "APP", "0")
    }

    fn batch(frames: &[Vec<u8>]) -> Vec<u8> {
        let mut body = Vec::new();
        for frame in frames {
            body.extend_from_slice(format!("--{}\r\n\r\n", BOUNDARY).as_bytes());
            body.extend_from_slice(frame);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn content_type() -> String {
        format!("multipart/x-protobuf; boundary={}", BOUNDARY)
    }

    #[test]
    fn test_extract_boundary() {
        assert_eq!(extract_boundary(&content_type()).unwrap(), BOUNDARY);
        assert_eq!(
            extract_boundary("multipart/mixed; charset=utf-8; boundary=\"abc\"").unwrap(),
            "abc"
        );
    }

    #[test]
    fn test_extract_boundary_missing() {
        assert!(matches!(
            extract_boundary("multipart/x-protobuf"),
            Err(LogError::InvalidMultipart(_))
        ));
        assert!(matches!(
            extract_boundary("application/json; boundary=abc"),
            Err(LogError::InvalidMultipart(_))
        ));
    }

    #[test]
    fn test_parse_batch_in_order() {
        let first = entry(10, "one");
        let second = entry(5, "two");
        let body = batch(&[encode_frame(&first), encode_frame(&second)]);

        let entries = parse_multipart(&content_type(), &body).unwrap();
        assert_eq!(entries, vec![first, second]);
    }

    #[test]
    fn test_parse_batch_with_part_headers() {
        let only = entry(1, "with headers");
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\nContent-Type: application/octet-stream\r\n\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(&encode_frame(&only));
        body.extend_from_slice(format!("\r\n--{}--", BOUNDARY).as_bytes());

        let entries = parse_multipart(&content_type(), &body).unwrap();
        assert_eq!(entries, vec![only]);
    }

    #[test]
    fn test_empty_batch() {
        let body = format!("--{}--\r\n", BOUNDARY);
        assert!(parse_multipart(&content_type(), body.as_bytes()).unwrap().is_empty());
        assert!(parse_multipart(&content_type(), b"").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_part_aborts_batch() {
        let good = encode_frame(&entry(1, "ok"));
        let body = batch(&[good.clone(), vec![0xff, 0xff, 0xff], good]);

        let err = parse_multipart(&content_type(), &body).unwrap_err();
        assert!(matches!(err, LogError::Protocol(_)));
    }

    #[test]
    fn test_split_parts_ignores_preamble() {
        let mut body = b"preamble text\r\n".to_vec();
        body.extend_from_slice(&batch(&[b"abc".to_vec()]));
        assert_eq!(split_parts(&body, BOUNDARY), vec![&b"abc"[..]]);
    }
}
