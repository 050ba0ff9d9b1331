//! Cursor-based pagination utilities for the activity feed.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Error type for cursor operations.
#[derive(Debug, Error)]
pub enum CursorError {
    #[error("Invalid cursor format")]
    InvalidFormat,
    #[error("Invalid cursor encoding")]
    InvalidEncoding,
    #[error("Invalid timestamp in cursor")]
    InvalidTimestamp,
    #[error("Invalid sequence in cursor")]
    InvalidSequence,
}

/// Encodes a cursor from a timestamp and a per-log sequence number.
///
/// The cursor format is: base64(RFC3339_timestamp:seq). The composite
/// cursor keeps ordering stable when snapshots share a timestamp.
pub fn encode_cursor(recorded_at: DateTime<Utc>, seq: u64) -> String {
    let raw = format!(
        "{}:{}",
        recorded_at.to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
        seq
    );
    URL_SAFE_NO_PAD.encode(raw.as_bytes())
}

/// Decodes a cursor into `(timestamp, seq)`.
pub fn decode_cursor(cursor: &str) -> Result<(DateTime<Utc>, u64), CursorError> {
    let decoded = URL_SAFE_NO_PAD
        .decode(cursor)
        .map_err(|_| CursorError::InvalidEncoding)?;

    let s = String::from_utf8(decoded).map_err(|_| CursorError::InvalidFormat)?;

    // Split on last colon; the timestamp itself contains colons
    let colon_pos = s.rfind(':').ok_or(CursorError::InvalidFormat)?;
    let timestamp_str = &s[..colon_pos];
    let seq_str = &s[colon_pos + 1..];

    let seq: u64 = seq_str.parse().map_err(|_| CursorError::InvalidSequence)?;

    let timestamp = DateTime::parse_from_rfc3339(timestamp_str)
        .map_err(|_| CursorError::InvalidTimestamp)?
        .with_timezone(&Utc);

    Ok((timestamp, seq))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_encode_decode_cursor_roundtrip() {
        let timestamp = Utc.with_ymd_and_hms(2025, 3, 15, 10, 30, 0).unwrap();
        let seq = 12345u64;

        let cursor = encode_cursor(timestamp, seq);
        let (decoded_ts, decoded_seq) = decode_cursor(&cursor).unwrap();

        assert_eq!(decoded_ts, timestamp);
        assert_eq!(decoded_seq, seq);
    }

    #[test]
    fn test_decode_invalid_base64() {
        let result = decode_cursor("not-valid-base64!!!");
        assert!(matches!(result, Err(CursorError::InvalidEncoding)));
    }

    #[test]
    fn test_decode_missing_colon() {
        let invalid = URL_SAFE_NO_PAD.encode(b"no-colon-here");
        let result = decode_cursor(&invalid);
        assert!(matches!(result, Err(CursorError::InvalidFormat)));
    }

    #[test]
    fn test_decode_invalid_sequence() {
        let invalid = URL_SAFE_NO_PAD.encode(b"2025-03-15T10:30:00Z:not-a-number");
        let result = decode_cursor(&invalid);
        assert!(matches!(result, Err(CursorError::InvalidSequence)));
    }

    #[test]
    fn test_decode_negative_sequence_rejected() {
        let invalid = URL_SAFE_NO_PAD.encode(b"2025-03-15T10:30:00Z:-4");
        let result = decode_cursor(&invalid);
        assert!(matches!(result, Err(CursorError::InvalidSequence)));
    }

    #[test]
    fn test_decode_invalid_timestamp() {
        let invalid = URL_SAFE_NO_PAD.encode(b"not-a-timestamp:12345");
        let result = decode_cursor(&invalid);
        assert!(matches!(result, Err(CursorError::InvalidTimestamp)));
    }

    #[test]
    fn test_cursor_is_url_safe() {
        let cursor = encode_cursor(Utc::now(), 42);
        assert!(!cursor.contains('+'));
        assert!(!cursor.contains('/'));
        assert!(!cursor.contains('='));
    }
}
