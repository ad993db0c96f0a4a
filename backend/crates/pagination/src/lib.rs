//! Opaque cursor and pagination envelope primitives shared by list endpoints.
//!
//! Cursors encode the sort key and row identifier of the last item on a page
//! as URL-safe base64 over a small JSON document. Clients treat them as
//! opaque tokens; the backend decodes them to resume keyset pagination
//! without offset scans. Malformed tokens decode to a typed error so HTTP
//! adapters can answer with a stable `invalid_request` payload instead of a
//! 500.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Hard ceiling on page sizes, applied after client input is parsed.
pub const MAX_LIMIT: u32 = 100;

/// Page size used when the client does not send a `limit` parameter.
pub const DEFAULT_LIMIT: u32 = 20;

/// Errors produced while decoding a client-supplied cursor token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CursorError {
    /// The token is not valid URL-safe base64.
    #[error("cursor is not valid base64: {message}")]
    Encoding {
        /// Decoder failure detail, safe to echo to clients.
        message: String,
    },
    /// The decoded bytes are not the expected JSON document.
    #[error("cursor payload is malformed: {message}")]
    Payload {
        /// Parser failure detail, safe to echo to clients.
        message: String,
    },
}

/// Keyset cursor pointing just past the last row of a served page.
///
/// `key` carries the serialised sort key (a timestamp, a name, anything the
/// endpoint orders by) and `id` the row identifier used as a tiebreaker so
/// rows sharing a sort key are never skipped or repeated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor<K> {
    /// Sort key of the last row on the previous page.
    pub key: K,
    /// Identifier of the last row on the previous page (tiebreaker).
    pub id: String,
}

impl<K: Serialize + DeserializeOwned> Cursor<K> {
    /// Create a cursor from the last row of a page.
    pub fn new(key: K, id: impl Into<String>) -> Self {
        Self {
            key,
            id: id.into(),
        }
    }

    /// Encode the cursor as an opaque URL-safe token.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::Payload`] if the sort key cannot be serialised
    /// to JSON (which only happens for keys with non-string map types).
    pub fn encode(&self) -> Result<String, CursorError> {
        let json = serde_json::to_vec(self).map_err(|err| CursorError::Payload {
            message: err.to_string(),
        })?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    /// Decode a client-supplied token back into a cursor.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::Encoding`] for tokens that are not URL-safe
    /// base64 and [`CursorError::Payload`] for tokens whose decoded bytes do
    /// not parse as the expected JSON document.
    pub fn decode(token: &str) -> Result<Self, CursorError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|err| CursorError::Encoding {
                message: err.to_string(),
            })?;
        serde_json::from_slice(&bytes).map_err(|err| CursorError::Payload {
            message: err.to_string(),
        })
    }
}

/// Validated page size.
///
/// Construction clamps rather than rejects: out-of-range requests are a
/// client convenience issue, not an error worth failing a list call over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit(u32);

impl Limit {
    /// Clamp a client-supplied limit into `1..=`[`MAX_LIMIT`].
    #[must_use]
    pub const fn clamped(requested: u32) -> Self {
        if requested == 0 {
            Self(1)
        } else if requested > MAX_LIMIT {
            Self(MAX_LIMIT)
        } else {
            Self(requested)
        }
    }

    /// Resolve an optional query parameter, falling back to
    /// [`DEFAULT_LIMIT`].
    #[must_use]
    pub const fn from_query(requested: Option<u32>) -> Self {
        match requested {
            Some(value) => Self::clamped(value),
            None => Self(DEFAULT_LIMIT),
        }
    }

    /// Page size as a plain integer.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Page size widened for SQL `LIMIT` clauses.
    #[must_use]
    pub const fn as_sql(self) -> i64 {
        self.0 as i64
    }
}

impl Default for Limit {
    fn default() -> Self {
        Self(DEFAULT_LIMIT)
    }
}

/// Envelope returned by every paginated endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page, in endpoint order.
    pub items: Vec<T>,
    /// Token for the next page, absent when this page is the last.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// Build a page from one-more-than-requested rows.
    ///
    /// List queries fetch `limit + 1` rows; when the extra row is present it
    /// is dropped and its predecessor's cursor becomes `next_cursor`.
    ///
    /// # Errors
    ///
    /// Propagates [`CursorError`] from encoding the boundary cursor.
    pub fn from_rows<K, F>(
        mut rows: Vec<T>,
        limit: Limit,
        cursor_for: F,
    ) -> Result<Self, CursorError>
    where
        K: Serialize + DeserializeOwned,
        F: Fn(&T) -> Cursor<K>,
    {
        let limit = limit.get() as usize;
        let next_cursor = if rows.len() > limit {
            rows.truncate(limit);
            match rows.last() {
                Some(last) => Some(cursor_for(last).encode()?),
                None => None,
            }
        } else {
            None
        };
        Ok(Self { items: rows, next_cursor })
    }

    /// A page holding every remaining item, with no continuation.
    #[must_use]
    pub const fn complete(items: Vec<T>) -> Self {
        Self {
            items,
            next_cursor: None,
        }
    }

    /// Map the item type while preserving the continuation token.
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
        }
    }
}
