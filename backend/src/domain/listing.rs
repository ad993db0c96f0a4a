//! Shared keyset-cursor helpers for timestamp-ordered listings.

use chrono::{DateTime, Utc};
use pagination::Cursor;
use uuid::Uuid;

use super::error::Error;

/// Decode an opaque cursor into a (timestamp, id) keyset position.
pub(crate) fn decode_time_cursor(token: &str) -> Result<(DateTime<Utc>, Uuid), Error> {
    let cursor: Cursor<String> = Cursor::decode(token)
        .map_err(|err| Error::invalid_request(format!("invalid cursor: {err}")))?;
    let created_at = cursor
        .key
        .parse()
        .map_err(|_| Error::invalid_request("invalid cursor timestamp"))?;
    let id = Uuid::parse_str(&cursor.id)
        .map_err(|_| Error::invalid_request("invalid cursor id"))?;
    Ok((created_at, id))
}

/// Build the opaque cursor for a row's keyset position.
pub(crate) fn time_cursor(created_at: DateTime<Utc>, id: Uuid) -> Cursor<String> {
    Cursor::new(created_at.to_rfc3339(), id.to_string())
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn cursors_round_trip() {
        let at = Utc::now();
        let id = Uuid::new_v4();
        let token = time_cursor(at, id).encode().expect("encode");
        let (decoded_at, decoded_id) = decode_time_cursor(&token).expect("decode");
        assert_eq!(decoded_at, at);
        assert_eq!(decoded_id, id);
    }

    #[rstest]
    fn garbage_tokens_are_rejected() {
        assert!(decode_time_cursor("??").is_err());
    }
}
