//! Ticket comments, optionally threaded via a parent reference.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserId;

/// Maximum accepted comment body length.
pub const COMMENT_BODY_MAX: usize = 4000;

/// Validation errors raised by comment constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentValidationError {
    /// Body was empty after trimming.
    EmptyBody,
    /// Body exceeded [`COMMENT_BODY_MAX`] characters.
    BodyTooLong {
        /// Maximum accepted length.
        max: usize,
    },
}

impl fmt::Display for CommentValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyBody => write!(f, "comment body must not be empty"),
            Self::BodyTooLong { max } => {
                write!(f, "comment body must be at most {max} characters")
            }
        }
    }
}

impl std::error::Error for CommentValidationError {}

/// Validate a comment body, returning the trimmed text.
pub fn validate_body(body: &str) -> Result<&str, CommentValidationError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(CommentValidationError::EmptyBody);
    }
    if trimmed.chars().count() > COMMENT_BODY_MAX {
        return Err(CommentValidationError::BodyTooLong {
            max: COMMENT_BODY_MAX,
        });
    }
    Ok(trimmed)
}

/// A ticket-scoped comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment identifier.
    pub id: Uuid,
    /// Ticket the comment belongs to.
    pub ticket_id: Uuid,
    /// Comment author.
    pub author_id: UserId,
    /// Comment text.
    pub body: String,
    /// Parent comment on the same ticket, when this is a reply.
    pub reply_to: Option<Uuid>,
    /// Set once the author has edited the body.
    pub edited: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last edit timestamp.
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn bodies_are_trimmed() {
        assert_eq!(validate_body("  hello  ").expect("valid"), "hello");
    }

    #[rstest]
    fn blank_bodies_are_rejected() {
        assert_eq!(
            validate_body("   ").unwrap_err(),
            CommentValidationError::EmptyBody
        );
    }

    #[rstest]
    fn overlong_bodies_are_rejected() {
        let body = "x".repeat(COMMENT_BODY_MAX + 1);
        assert!(matches!(
            validate_body(&body),
            Err(CommentValidationError::BodyTooLong { .. })
        ));
    }
}
